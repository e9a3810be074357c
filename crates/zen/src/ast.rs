//! The abstract syntax tree produced by the parser.
//!
//! The root exclusively owns its subtree; evaluation never takes ownership of
//! any fragment of it. Function bodies are cloned into the session's function
//! table when their definition executes.

use std::fmt::{self, Display, Write};

/// 1-based source position attached to every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Loc {
    pub line: u32,
    pub column: u32,
}

impl Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An ordered statement list (the body of a block or the whole program).
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Block {
    pub stmts: Vec<Stmt>,
}

/// The root of a parsed source unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Program {
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Stmt {
    Expr(Expr),
    VarDef {
        name: String,
        init: Option<Expr>,
        loc: Loc,
    },
    Assign {
        target: Expr,
        value: Expr,
        loc: Loc,
    },
    FuncDef {
        name: String,
        params: Vec<String>,
        body: Block,
        loc: Loc,
    },
    If {
        cond: Expr,
        then_body: Block,
        else_body: Option<Block>,
        loc: Loc,
    },
    While {
        cond: Expr,
        body: Block,
        loc: Loc,
    },
    For {
        var: String,
        iter: Expr,
        body: Block,
        loc: Loc,
    },
    Return {
        value: Option<Expr>,
        loc: Loc,
    },
    Break {
        loc: Loc,
    },
    Continue {
        loc: Loc,
    },
    /// Placeholder emitted during parser error recovery.
    NoOp,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Null {
        loc: Loc,
    },
    Bool {
        value: bool,
        loc: Loc,
    },
    Number {
        value: f64,
        loc: Loc,
    },
    Str {
        value: String,
        loc: Loc,
    },
    Ident {
        name: String,
        loc: Loc,
    },
    Array {
        items: Vec<Expr>,
        loc: Loc,
    },
    ObjectLit {
        entries: Vec<(String, Expr)>,
        loc: Loc,
    },
    Index {
        container: Box<Expr>,
        index: Box<Expr>,
        loc: Loc,
    },
    Member {
        object: Box<Expr>,
        name: String,
        loc: Loc,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        loc: Loc,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        loc: Loc,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        loc: Loc,
    },
    Ternary {
        cond: Box<Expr>,
        then_value: Box<Expr>,
        else_value: Box<Expr>,
        loc: Loc,
    },
}

impl Expr {
    pub fn loc(&self) -> Loc {
        match self {
            Self::Null { loc }
            | Self::Bool { loc, .. }
            | Self::Number { loc, .. }
            | Self::Str { loc, .. }
            | Self::Ident { loc, .. }
            | Self::Array { loc, .. }
            | Self::ObjectLit { loc, .. }
            | Self::Index { loc, .. }
            | Self::Member { loc, .. }
            | Self::Call { loc, .. }
            | Self::Unary { loc, .. }
            | Self::Binary { loc, .. }
            | Self::Ternary { loc, .. } => *loc,
        }
    }

    /// Whether this expression is a legal assignment target.
    pub fn is_assignable(&self) -> bool {
        matches!(self, Self::Ident { .. } | Self::Index { .. } | Self::Member { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Not,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Neg => f.write_str("-"),
            Self::Not => f.write_str("not"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "and",
            Self::Or => "or",
        };
        f.write_str(text)
    }
}

// Pretty-printing. The printed form re-lexes and re-parses to a structurally
// equivalent tree, which the parser round-trip tests rely on.

impl Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.body.stmts {
            write_stmt(f, stmt, 0)?;
        }
        Ok(())
    }
}

fn write_indent(f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    for _ in 0..indent {
        f.write_str("    ")?;
    }
    Ok(())
}

fn write_block(f: &mut fmt::Formatter<'_>, block: &Block, indent: usize) -> fmt::Result {
    f.write_str("{\n")?;
    for stmt in &block.stmts {
        write_stmt(f, stmt, indent + 1)?;
    }
    write_indent(f, indent)?;
    f.write_str("}")
}

fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt, indent: usize) -> fmt::Result {
    write_indent(f, indent)?;
    match stmt {
        Stmt::Expr(expr) => write!(f, "{expr}")?,
        Stmt::VarDef { name, init, .. } => {
            write!(f, "set {name}")?;
            if let Some(init) = init {
                write!(f, " = {init}")?;
            }
        }
        Stmt::Assign { target, value, .. } => write!(f, "{target} = {value}")?,
        Stmt::FuncDef { name, params, body, .. } => {
            write!(f, "function {name}({}) ", params.join(", "))?;
            write_block(f, body, indent)?;
        }
        Stmt::If {
            cond,
            then_body,
            else_body,
            ..
        } => {
            write!(f, "if {cond} ")?;
            write_block(f, then_body, indent)?;
            if let Some(else_body) = else_body {
                f.write_str(" else ")?;
                write_block(f, else_body, indent)?;
            }
        }
        Stmt::While { cond, body, .. } => {
            write!(f, "while {cond} ")?;
            write_block(f, body, indent)?;
        }
        Stmt::For { var, iter, body, .. } => {
            write!(f, "for {var} in {iter} ")?;
            write_block(f, body, indent)?;
        }
        Stmt::Return { value, .. } => {
            f.write_str("return")?;
            if let Some(value) = value {
                write!(f, " {value}")?;
            }
        }
        Stmt::Break { .. } => f.write_str("break")?,
        Stmt::Continue { .. } => f.write_str("continue")?,
        Stmt::NoOp => {}
    }
    f.write_char('\n')
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null { .. } => f.write_str("null"),
            Self::Bool { value, .. } => write!(f, "{value}"),
            Self::Number { value, .. } => f.write_str(&crate::value::format_number(*value)),
            Self::Str { value, .. } => {
                let mut quoted = String::new();
                crate::value::write_quoted(value, &mut quoted);
                f.write_str(&quoted)
            }
            Self::Ident { name, .. } => f.write_str(name),
            Self::Array { items, .. } => {
                f.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_char(']')
            }
            Self::ObjectLit { entries, .. } => {
                f.write_char('{')?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    let mut quoted = String::new();
                    crate::value::write_quoted(key, &mut quoted);
                    write!(f, "{quoted}: {value}")?;
                }
                f.write_char('}')
            }
            Self::Index { container, index, .. } => write!(f, "{container}[{index}]"),
            Self::Member { object, name, .. } => write!(f, "{object}.{name}"),
            Self::Call { callee, args, .. } => {
                write!(f, "{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_char(')')
            }
            Self::Unary { op: UnaryOp::Not, operand, .. } => write!(f, "(not {operand})"),
            Self::Unary { op, operand, .. } => write!(f, "({op}{operand})"),
            Self::Binary { op, left, right, .. } => write!(f, "({left} {op} {right})"),
            Self::Ternary {
                cond,
                then_value,
                else_value,
                ..
            } => write!(f, "({cond} ? {then_value} : {else_value})"),
        }
    }
}
