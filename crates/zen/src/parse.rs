//! Hand-written recursive-descent parser.
//!
//! Parsing is error-recovering: each syntax error is recorded with its source
//! location, the parser skips ahead to the next statement boundary, and a
//! `NoOp` placeholder keeps the surrounding tree intact. Callers decide what
//! to do with a partially parsed tree; the driver refuses to evaluate when any
//! error was recorded.

use std::{fmt, iter::Peekable};

use logos::Logos;

use crate::{
    ast::{BinaryOp, Block, Expr, Loc, Program, Stmt, UnaryOp},
    lexer::{Span, Token},
    line_map::LineMap,
};

/// Nesting bound for expressions, so degenerate input fails with a diagnostic
/// instead of exhausting the parser's stack.
const MAX_EXPR_DEPTH: u32 = 200;

/// A recorded syntax error with its 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

type PResult<T> = Result<T, SyntaxError>;

/// Parses a complete source buffer into a program plus the recorded errors.
pub(crate) fn parse(source: &str) -> (Program, Vec<SyntaxError>) {
    let mut parser = Parser::new(source);
    let program = parser.parse_program();
    (program, parser.errors)
}

struct Parser<'a> {
    source: &'a str,
    stream: Peekable<logos::SpannedIter<'a, Token>>,
    line_map: LineMap,
    errors: Vec<SyntaxError>,
    depth: u32,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            stream: Token::lexer(source).spanned().peekable(),
            line_map: LineMap::new(source),
            errors: Vec::new(),
            depth: 0,
        }
    }

    fn peek(&mut self) -> (Option<Token>, Span) {
        if let Some((token, span)) = self.stream.peek().cloned() {
            (Some(token), span)
        } else {
            (None, self.eof())
        }
    }

    fn consume(&mut self) -> Option<(Token, Span)> {
        self.stream.next()
    }

    fn eof(&self) -> Span {
        self.source.len()..self.source.len()
    }

    fn loc(&self, span: &Span) -> Loc {
        self.line_map.location(span.start)
    }

    fn error_at(&self, span: &Span, message: impl Into<String>) -> SyntaxError {
        let loc = self.loc(span);
        SyntaxError {
            message: message.into(),
            line: loc.line,
            column: loc.column,
        }
    }

    fn expected_but_got(&self, span: &Span, expected: &str, got: Option<Token>) -> SyntaxError {
        let got = got.map_or("end of input", Token::describe);
        let loc = self.loc(span);
        self.error_at(span, format!("expected {expected}, got {got} at {loc}"))
    }

    /// Consumes one token and checks it is the expected kind.
    fn expect(&mut self, expected: Token) -> PResult<Span> {
        match self.consume() {
            Some((token, span)) if token == expected => Ok(span),
            Some((token, span)) => Err(self.expected_but_got(&span, expected.describe(), Some(token))),
            None => Err(self.expected_but_got(&self.eof(), expected.describe(), None)),
        }
    }

    fn expect_ident(&mut self, what: &str) -> PResult<(String, Span)> {
        match self.consume() {
            Some((Token::Ident, span)) => Ok((self.source[span.clone()].to_owned(), span)),
            Some((token, span)) => Err(self.expected_but_got(&span, what, Some(token))),
            None => Err(self.expected_but_got(&self.eof(), what, None)),
        }
    }

    /// Skips ahead to a statement boundary after an error. Always consumes at
    /// least one token so recovery makes progress.
    fn synchronize(&mut self) {
        if let Some((Token::Semi, _)) = self.consume() {
            return;
        }
        loop {
            match self.peek().0 {
                None
                | Some(
                    Token::Set
                    | Token::Function
                    | Token::If
                    | Token::While
                    | Token::For
                    | Token::Return
                    | Token::Break
                    | Token::Continue
                    | Token::RBrace,
                ) => return,
                Some(Token::Semi) => {
                    self.consume();
                    return;
                }
                Some(_) => {
                    self.consume();
                }
            }
        }
    }

    fn parse_program(&mut self) -> Program {
        let mut stmts = Vec::new();
        loop {
            while let (Some(Token::Semi), _) = self.peek() {
                self.consume();
            }
            if self.peek().0.is_none() {
                break;
            }
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    log::debug!("parse error, recovering: {err}");
                    self.errors.push(err);
                    self.synchronize();
                    stmts.push(Stmt::NoOp);
                }
            }
        }
        Program {
            body: Block { stmts },
        }
    }

    fn parse_statement(&mut self) -> PResult<Stmt> {
        let (token, span) = self.peek();
        match token {
            Some(Token::Set) => self.parse_var_def(),
            Some(Token::Function) => self.parse_func_def(),
            Some(Token::If) => self.parse_if(),
            Some(Token::While) => self.parse_while(),
            Some(Token::For) => self.parse_for(),
            Some(Token::Return) => self.parse_return(),
            Some(Token::Break) => {
                self.consume();
                Ok(Stmt::Break { loc: self.loc(&span) })
            }
            Some(Token::Continue) => {
                self.consume();
                Ok(Stmt::Continue { loc: self.loc(&span) })
            }
            _ => self.parse_expr_or_assignment(),
        }
    }

    fn parse_var_def(&mut self) -> PResult<Stmt> {
        let span = self.expect(Token::Set)?;
        let (name, _) = self.expect_ident("variable name")?;
        let init = if let (Some(Token::Assign), _) = self.peek() {
            self.consume();
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(Stmt::VarDef {
            name,
            init,
            loc: self.loc(&span),
        })
    }

    fn parse_func_def(&mut self) -> PResult<Stmt> {
        let span = self.expect(Token::Function)?;
        let (name, _) = self.expect_ident("function name")?;
        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        if !matches!(self.peek().0, Some(Token::RParen)) {
            loop {
                let (param, _) = self.expect_ident("parameter name")?;
                params.push(param);
                match self.peek().0 {
                    Some(Token::Comma) => {
                        self.consume();
                    }
                    _ => break,
                }
            }
        }
        self.expect(Token::RParen)?;
        let body = self.parse_block()?;
        Ok(Stmt::FuncDef {
            name,
            params,
            body,
            loc: self.loc(&span),
        })
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        let span = self.expect(Token::If)?;
        let cond = self.parse_expression()?;
        let then_body = self.parse_block()?;
        let else_body = if let (Some(Token::Else), _) = self.peek() {
            self.consume();
            if let (Some(Token::If), _) = self.peek() {
                // `else if` chains desugar into a single-statement else block
                let nested = self.parse_if()?;
                Some(Block { stmts: vec![nested] })
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_body,
            else_body,
            loc: self.loc(&span),
        })
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        let span = self.expect(Token::While)?;
        let cond = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Stmt::While {
            cond,
            body,
            loc: self.loc(&span),
        })
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        let span = self.expect(Token::For)?;
        let (var, _) = self.expect_ident("loop variable")?;
        self.expect(Token::In)?;
        let iter = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Stmt::For {
            var,
            iter,
            body,
            loc: self.loc(&span),
        })
    }

    fn parse_return(&mut self) -> PResult<Stmt> {
        let span = self.expect(Token::Return)?;
        let value = if self.peek_starts_expression() {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(Stmt::Return {
            value,
            loc: self.loc(&span),
        })
    }

    fn peek_starts_expression(&mut self) -> bool {
        matches!(
            self.peek().0,
            Some(
                Token::Null
                    | Token::True
                    | Token::False
                    | Token::Number
                    | Token::Str
                    | Token::Ident
                    | Token::LParen
                    | Token::LBracket
                    | Token::LBrace
                    | Token::Minus
                    | Token::Not
            )
        )
    }

    fn parse_expr_or_assignment(&mut self) -> PResult<Stmt> {
        let expr = self.parse_expression()?;
        if let (Some(Token::Assign), span) = self.peek() {
            self.consume();
            if !expr.is_assignable() {
                return Err(self.error_at(
                    &span,
                    format!("invalid assignment target at {}", expr.loc()),
                ));
            }
            let loc = expr.loc();
            let value = self.parse_expression()?;
            return Ok(Stmt::Assign {
                target: expr,
                value,
                loc,
            });
        }
        Ok(Stmt::Expr(expr))
    }

    fn parse_block(&mut self) -> PResult<Block> {
        self.depth += 1;
        if self.depth > MAX_EXPR_DEPTH {
            self.depth -= 1;
            let span = self.peek().1;
            return Err(self.error_at(&span, "blocks nested too deeply"));
        }
        let result = self.parse_block_inner();
        self.depth -= 1;
        result
    }

    fn parse_block_inner(&mut self) -> PResult<Block> {
        self.expect(Token::LBrace)?;
        let mut stmts = Vec::new();
        loop {
            while let (Some(Token::Semi), _) = self.peek() {
                self.consume();
            }
            match self.peek().0 {
                Some(Token::RBrace) | None => break,
                _ => match self.parse_statement() {
                    Ok(stmt) => stmts.push(stmt),
                    Err(err) => {
                        log::debug!("parse error in block, recovering: {err}");
                        self.errors.push(err);
                        self.synchronize();
                        stmts.push(Stmt::NoOp);
                    }
                },
            }
        }
        self.expect(Token::RBrace)?;
        Ok(Block { stmts })
    }

    // Expressions, following the precedence ladder:
    // ternary < or < and < equality < comparison < additive < multiplicative
    // < unary < postfix < primary. All binary operators are left-associative.

    fn parse_expression(&mut self) -> PResult<Expr> {
        self.depth += 1;
        if self.depth > MAX_EXPR_DEPTH {
            self.depth -= 1;
            let span = self.peek().1;
            return Err(self.error_at(&span, "expression nesting too deep"));
        }
        let result = self.parse_ternary();
        self.depth -= 1;
        result
    }

    fn parse_ternary(&mut self) -> PResult<Expr> {
        let cond = self.parse_or()?;
        if let (Some(Token::Question), span) = self.peek() {
            self.consume();
            let then_value = self.parse_expression()?;
            self.expect(Token::Colon)?;
            let else_value = self.parse_expression()?;
            return Ok(Expr::Ternary {
                loc: self.loc(&span),
                cond: Box::new(cond),
                then_value: Box::new(then_value),
                else_value: Box::new(else_value),
            });
        }
        Ok(cond)
    }

    fn parse_or(&mut self) -> PResult<Expr> {
        let mut left = self.parse_and()?;
        while let (Some(Token::Or), span) = self.peek() {
            self.consume();
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right, self.loc(&span));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> PResult<Expr> {
        let mut left = self.parse_equality()?;
        while let (Some(Token::And), span) = self.peek() {
            self.consume();
            let right = self.parse_equality()?;
            left = binary(BinaryOp::And, left, right, self.loc(&span));
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> PResult<Expr> {
        let mut left = self.parse_comparison()?;
        loop {
            let (token, span) = self.peek();
            let op = match token {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::Ne,
                _ => break,
            };
            self.consume();
            let right = self.parse_comparison()?;
            left = binary(op, left, right, self.loc(&span));
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> PResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let (token, span) = self.peek();
            let op = match token {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.consume();
            let right = self.parse_additive()?;
            left = binary(op, left, right, self.loc(&span));
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> PResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let (token, span) = self.peek();
            let op = match token {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.consume();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right, self.loc(&span));
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let (token, span) = self.peek();
            let op = match token {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => break,
            };
            self.consume();
            let right = self.parse_unary()?;
            left = binary(op, left, right, self.loc(&span));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        let (token, span) = self.peek();
        let op = match token {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Not) => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        self.consume();
        self.depth += 1;
        if self.depth > MAX_EXPR_DEPTH {
            self.depth -= 1;
            return Err(self.error_at(&span, "expression nesting too deep"));
        }
        let operand = self.parse_unary();
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
            loc: self.loc(&span),
        })
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            let (token, span) = self.peek();
            expr = match token {
                Some(Token::LParen) => {
                    self.consume();
                    let mut args = Vec::new();
                    if !matches!(self.peek().0, Some(Token::RParen)) {
                        loop {
                            args.push(self.parse_expression()?);
                            match self.peek().0 {
                                Some(Token::Comma) => {
                                    self.consume();
                                }
                                _ => break,
                            }
                        }
                    }
                    self.expect(Token::RParen)?;
                    Expr::Call {
                        loc: expr.loc(),
                        callee: Box::new(expr),
                        args,
                    }
                }
                Some(Token::LBracket) => {
                    self.consume();
                    let index = self.parse_expression()?;
                    self.expect(Token::RBracket)?;
                    Expr::Index {
                        loc: self.loc(&span),
                        container: Box::new(expr),
                        index: Box::new(index),
                    }
                }
                Some(Token::Dot) => {
                    self.consume();
                    let (name, name_span) = self.expect_ident("member name")?;
                    Expr::Member {
                        loc: self.loc(&name_span),
                        object: Box::new(expr),
                        name,
                    }
                }
                _ => break,
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        match self.consume() {
            Some((Token::Null, span)) => Ok(Expr::Null { loc: self.loc(&span) }),
            Some((Token::True, span)) => Ok(Expr::Bool {
                value: true,
                loc: self.loc(&span),
            }),
            Some((Token::False, span)) => Ok(Expr::Bool {
                value: false,
                loc: self.loc(&span),
            }),
            Some((Token::Number, span)) => {
                let text = &self.source[span.clone()];
                match text.parse::<f64>() {
                    Ok(value) => Ok(Expr::Number {
                        value,
                        loc: self.loc(&span),
                    }),
                    Err(err) => Err(self.error_at(&span, format!("malformed number literal: {err}"))),
                }
            }
            Some((Token::Str, span)) => {
                let value = self.decode_string(&span)?;
                Ok(Expr::Str {
                    value,
                    loc: self.loc(&span),
                })
            }
            Some((Token::Ident, span)) => Ok(Expr::Ident {
                name: self.source[span.clone()].to_owned(),
                loc: self.loc(&span),
            }),
            Some((Token::LParen, _)) => {
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Some((Token::LBracket, span)) => {
                let mut items = Vec::new();
                if !matches!(self.peek().0, Some(Token::RBracket)) {
                    loop {
                        items.push(self.parse_expression()?);
                        match self.peek().0 {
                            Some(Token::Comma) => {
                                self.consume();
                            }
                            _ => break,
                        }
                    }
                }
                self.expect(Token::RBracket)?;
                Ok(Expr::Array {
                    items,
                    loc: self.loc(&span),
                })
            }
            Some((Token::LBrace, span)) => {
                let mut entries = Vec::new();
                if !matches!(self.peek().0, Some(Token::RBrace)) {
                    loop {
                        let key = self.parse_object_key()?;
                        self.expect(Token::Colon)?;
                        let value = self.parse_expression()?;
                        entries.push((key, value));
                        match self.peek().0 {
                            Some(Token::Comma) => {
                                self.consume();
                            }
                            _ => break,
                        }
                    }
                }
                self.expect(Token::RBrace)?;
                Ok(Expr::ObjectLit {
                    entries,
                    loc: self.loc(&span),
                })
            }
            Some((Token::Error, span)) => {
                let slice = &self.source[span.clone()];
                if slice.starts_with('"') {
                    Err(self.error_at(&span, "unterminated string literal"))
                } else {
                    Err(self.error_at(&span, format!("unrecognized character {slice:?}")))
                }
            }
            Some((token, span)) => Err(self.expected_but_got(&span, "an expression", Some(token))),
            None => Err(self.expected_but_got(&self.eof(), "an expression", None)),
        }
    }

    fn parse_object_key(&mut self) -> PResult<String> {
        match self.consume() {
            Some((Token::Str, span)) => self.decode_string(&span),
            Some((Token::Ident, span)) => Ok(self.source[span.clone()].to_owned()),
            Some((token, span)) => Err(self.expected_but_got(&span, "an object key", Some(token))),
            None => Err(self.expected_but_got(&self.eof(), "an object key", None)),
        }
    }

    /// Decodes a string literal, resolving escape sequences. `span` covers the
    /// literal including both quotes.
    fn decode_string(&self, span: &Span) -> PResult<String> {
        let full = &self.source[span.clone()];
        debug_assert!(full.len() >= 2, "lexer guarantees both quotes are present");
        let inner = &full[1..full.len() - 1];

        let mut data = String::with_capacity(inner.len());
        let mut chars = inner.char_indices();
        while let Some((index, ch)) = chars.next() {
            if ch != '\\' {
                data.push(ch);
                continue;
            }
            let escape_start = span.start + 1 + index;
            let Some((_, escaped)) = chars.next() else {
                return Err(self.error_at(&(escape_start..escape_start + 1), "unterminated escape sequence"));
            };
            match escaped {
                '"' => data.push('"'),
                '\\' => data.push('\\'),
                '/' => data.push('/'),
                'b' => data.push('\u{8}'),
                'f' => data.push('\u{c}'),
                'n' => data.push('\n'),
                'r' => data.push('\r'),
                't' => data.push('\t'),
                'u' => {
                    let mut code = 0u32;
                    for _ in 0..4 {
                        let Some((_, digit)) = chars.next() else {
                            return Err(self.error_at(
                                &(escape_start..escape_start + 2),
                                "\\u escape requires four hex digits",
                            ));
                        };
                        let Some(digit) = digit.to_digit(16) else {
                            return Err(self.error_at(
                                &(escape_start..escape_start + 2),
                                "\\u escape requires four hex digits",
                            ));
                        };
                        code = code * 16 + digit;
                    }
                    let Some(decoded) = char::from_u32(code) else {
                        return Err(self.error_at(
                            &(escape_start..escape_start + 6),
                            format!("\\u{code:04x} is not a valid character"),
                        ));
                    };
                    data.push(decoded);
                }
                other => {
                    return Err(self.error_at(
                        &(escape_start..escape_start + 1 + other.len_utf8()),
                        format!("unknown escape sequence \\{other}"),
                    ));
                }
            }
        }
        Ok(data)
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr, loc: Loc) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        loc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_ok(source: &str) -> Program {
        let (program, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        program
    }

    fn first_expr(source: &str) -> String {
        let program = parse_ok(source);
        match &program.body.stmts[0] {
            Stmt::Expr(expr) => expr.to_string(),
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn precedence_ladder() {
        assert_eq!(first_expr("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(first_expr("1 * 2 + 3"), "((1 * 2) + 3)");
        assert_eq!(first_expr("1 < 2 == true"), "((1 < 2) == true)");
        assert_eq!(first_expr("a or b and c"), "(a or (b and c))");
        assert_eq!(first_expr("not a or b"), "((not a) or b)");
        assert_eq!(first_expr("-2 * 3"), "((-2) * 3)");
        assert_eq!(first_expr("a ? b : c"), "(a ? b : c)");
    }

    #[test]
    fn left_associativity() {
        assert_eq!(first_expr("1 - 2 - 3"), "((1 - 2) - 3)");
        assert_eq!(first_expr("8 / 4 / 2"), "((8 / 4) / 2)");
    }

    #[test]
    fn postfix_chains() {
        assert_eq!(first_expr("a.b[0](1, 2)"), "a.b[0](1, 2)");
        assert_eq!(first_expr("f(1)(2)"), "f(1)(2)");
    }

    #[test]
    fn statements_parse() {
        let program = parse_ok(
            "set x = 1\n\
             x = x + 1\n\
             function add(a, b) { return a + b }\n\
             if x > 1 { print(x) } else if x < 0 { print(0) } else { print(1) }\n\
             while x < 10 { x = x + 1 }\n\
             for item in [1, 2] { print(item) }\n\
             return x",
        );
        assert_eq!(program.body.stmts.len(), 7);
    }

    #[test]
    fn string_escapes() {
        let program = parse_ok(r#"set s = "a\n\t\"\\A""#);
        match &program.body.stmts[0] {
            Stmt::VarDef {
                init: Some(Expr::Str { value, .. }),
                ..
            } => assert_eq!(value, "a\n\t\"\\A"),
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn object_keys_accept_strings_and_identifiers() {
        let program = parse_ok(r#"set o = {a: 1, "b c": 2}"#);
        match &program.body.stmts[0] {
            Stmt::VarDef {
                init: Some(Expr::ObjectLit { entries, .. }),
                ..
            } => {
                assert_eq!(entries[0].0, "a");
                assert_eq!(entries[1].0, "b c");
            }
            other => panic!("unexpected statement {other:?}"),
        }
    }

    #[test]
    fn errors_carry_locations() {
        let (_, errors) = parse("set = 5");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("variable name"));
        assert_eq!((errors[0].line, errors[0].column), (1, 5));
    }

    #[test]
    fn recovery_continues_after_errors() {
        let (program, errors) = parse("set = 1\nset x = 2\nset = 3\nset y = 4");
        assert_eq!(errors.len(), 2);
        let defined: Vec<_> = program
            .body
            .stmts
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::VarDef { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(defined, vec!["x", "y"]);
    }

    #[test]
    fn unterminated_string_reports_opening_quote() {
        let (_, errors) = parse("set s = \"oops");
        assert!(errors.iter().any(|e| e.message.contains("unterminated string")));
    }

    #[test]
    fn invalid_assignment_target() {
        let (_, errors) = parse("1 + 2 = 3");
        assert!(errors[0].message.contains("invalid assignment target"));
    }

    #[test]
    fn empty_program_is_valid() {
        let (program, errors) = parse("  # just a comment\n");
        assert!(errors.is_empty());
        assert!(program.body.stmts.is_empty());
    }

    #[test]
    fn pretty_print_round_trip() {
        let source = "set total = 0\n\
             function accumulate(values) {\n\
                 for v in values { total = total + v }\n\
                 return total\n\
             }\n\
             set data = {label: \"counts\", items: [1, 2, 3]}\n\
             if accumulate(data.items) > 5 { print(data[\"label\"]) }\n\
             set choice = total > 3 ? \"big\" : \"small\"";
        let first = parse_ok(source);
        let printed = first.to_string();
        let second = parse_ok(&printed);
        assert_eq!(printed, second.to_string());
    }

    #[test]
    fn nesting_bound() {
        let deep = format!("{}1{}", "(".repeat(300), ")".repeat(300));
        let (_, errors) = parse(&deep);
        assert!(errors.iter().any(|e| e.message.contains("nesting too deep")));
    }
}
