//! The tree-walking evaluator.
//!
//! Every visit returns a discriminated [`Flow`] outcome instead of encoding
//! `return`/`break`/`continue` as magic values, and the error channel rides on
//! `Result`. The enclosing construct unwraps the outcome it understands:
//! loops intercept `Break`/`Continue`, calls unwrap `Return`, and `set`/
//! assignment statements capture error outcomes as first-class Error values.

use indexmap::IndexMap;
use rand::rngs::StdRng;
use smallvec::SmallVec;

use crate::{
    ast::{BinaryOp, Block, Expr, Loc, Program, Stmt, UnaryOp},
    builtins::{Args, Builtins},
    error::{ErrorKind, RunError, RunResult},
    function::{Closure, Function, FunctionId, FunctionTable},
    heap::{Heap, HeapData, HeapId},
    io::PrintWriter,
    scope,
    types::{List, Object},
    value::{format_number, value_eq, Value},
};

/// Non-error outcome of evaluating a statement or block.
pub(crate) enum Flow {
    Value(Value),
    Return(Value),
    Break(Loc),
    Continue(Loc),
}

/// What a `for` loop walks over: arrays by index, strings and object keys via
/// an owned snapshot.
enum IterPlan {
    List(HeapId),
    Items(Vec<String>),
}

/// Walks an AST against a scope chain, producing one value per node.
///
/// The evaluator never owns AST nodes; results are either fresh values or
/// references held by a scope frame.
pub(crate) struct Evaluator<'a, W: PrintWriter> {
    pub heap: &'a mut Heap,
    pub functions: &'a mut FunctionTable,
    pub rng: &'a mut StdRng,
    pub print: &'a mut W,
    call_depth: usize,
    max_call_depth: usize,
}

impl<'a, W: PrintWriter> Evaluator<'a, W> {
    pub fn new(
        heap: &'a mut Heap,
        functions: &'a mut FunctionTable,
        rng: &'a mut StdRng,
        print: &'a mut W,
        max_call_depth: usize,
    ) -> Self {
        Self {
            heap,
            functions,
            rng,
            print,
            call_depth: 0,
            max_call_depth,
        }
    }

    /// Evaluates a whole program. The result is the value of the last
    /// expression statement, or the payload of a top-level `return`.
    pub fn eval_program(&mut self, program: &Program, frame: HeapId) -> RunResult<Value> {
        let mut last = Value::Null;
        for stmt in &program.body.stmts {
            let is_expr = matches!(stmt, Stmt::Expr(_));
            match self.eval_stmt(stmt, frame) {
                Ok(Flow::Value(value)) => {
                    if is_expr {
                        last.drop_with_heap(self.heap);
                        last = value;
                    } else {
                        value.drop_with_heap(self.heap);
                    }
                }
                Ok(Flow::Return(value)) => {
                    last.drop_with_heap(self.heap);
                    return Ok(value);
                }
                Ok(Flow::Break(loc)) => {
                    last.drop_with_heap(self.heap);
                    return Err(ErrorKind::Syntax.err(format!("break outside of a loop at {loc}")));
                }
                Ok(Flow::Continue(loc)) => {
                    last.drop_with_heap(self.heap);
                    return Err(ErrorKind::Syntax.err(format!("continue outside of a loop at {loc}")));
                }
                Err(err) => {
                    last.drop_with_heap(self.heap);
                    return Err(err);
                }
            }
        }
        Ok(last)
    }

    fn eval_block(&mut self, block: &Block, frame: HeapId) -> RunResult<Flow> {
        for stmt in &block.stmts {
            match self.eval_stmt(stmt, frame)? {
                Flow::Value(value) => value.drop_with_heap(self.heap),
                other => return Ok(other),
            }
        }
        Ok(Flow::Value(Value::Null))
    }

    fn eval_stmt(&mut self, stmt: &Stmt, frame: HeapId) -> RunResult<Flow> {
        match stmt {
            Stmt::Expr(expr) => Ok(Flow::Value(self.eval_expr(expr, frame)?)),
            Stmt::VarDef { name, init, .. } => {
                match init {
                    // `set x = v` writes like assignment: the nearest frame
                    // defining the name wins, so closures mutate their
                    // captured bindings
                    Some(expr) => {
                        let value = self.eval_capture(expr, frame)?;
                        self.assign_ident(name, value, frame);
                    }
                    // a bare `set x` is a declaration in this frame
                    None => scope::define_var(self.heap, frame, name.clone(), Value::Null),
                }
                Ok(Flow::Value(Value::Null))
            }
            Stmt::Assign { target, value, .. } => {
                let value = self.eval_capture(value, frame)?;
                self.assign(target, value, frame)?;
                Ok(Flow::Value(Value::Null))
            }
            Stmt::FuncDef { name, params, body, .. } => {
                let id = self.functions.define(Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                });
                scope::define_func(self.heap, frame, name.clone(), id);
                Ok(Flow::Value(Value::Null))
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
                ..
            } => {
                if self.eval_condition(cond, frame)? {
                    self.eval_block(then_body, frame)
                } else if let Some(else_body) = else_body {
                    self.eval_block(else_body, frame)
                } else {
                    Ok(Flow::Value(Value::Null))
                }
            }
            Stmt::While { cond, body, .. } => {
                loop {
                    if !self.eval_condition(cond, frame)? {
                        break;
                    }
                    match self.eval_block(body, frame)? {
                        Flow::Value(value) => value.drop_with_heap(self.heap),
                        Flow::Break(_) => break,
                        Flow::Continue(_) => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Value(Value::Null))
            }
            Stmt::For { var, iter, body, loc } => {
                let iter_value = self.eval_expr(iter, frame)?;
                if iter_value.is_error(self.heap) {
                    return Err(RunError::Raised(iter_value));
                }
                let result = self.run_for_loop(var, &iter_value, body, *loc, frame);
                iter_value.drop_with_heap(self.heap);
                result
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, frame)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Break { loc } => Ok(Flow::Break(*loc)),
            Stmt::Continue { loc } => Ok(Flow::Continue(*loc)),
            Stmt::NoOp => Ok(Flow::Value(Value::Null)),
        }
    }

    /// Evaluates a loop or branch condition. Error values propagate instead of
    /// coercing to a boolean.
    fn eval_condition(&mut self, cond: &Expr, frame: HeapId) -> RunResult<bool> {
        let value = self.eval_expr(cond, frame)?;
        if value.is_error(self.heap) {
            return Err(RunError::Raised(value));
        }
        let truthy = value.truthy(self.heap);
        value.drop_with_heap(self.heap);
        Ok(truthy)
    }

    /// Evaluates the right-hand side of a binding, materializing an error
    /// outcome as a stored Error value instead of propagating it.
    fn eval_capture(&mut self, expr: &Expr, frame: HeapId) -> RunResult<Value> {
        match self.eval_expr(expr, frame) {
            Ok(value) => Ok(value),
            Err(err) => err.into_value(self.heap),
        }
    }

    fn run_for_loop(
        &mut self,
        var: &str,
        iter_value: &Value,
        body: &Block,
        loc: Loc,
        frame: HeapId,
    ) -> RunResult<Flow> {
        let plan = match iter_value {
            Value::Ref(id) => match self.heap.get(*id) {
                HeapData::List(_) => Ok(IterPlan::List(*id)),
                // snapshot; strings are immutable anyway
                HeapData::Str(s) => Ok(IterPlan::Items(s.as_str().chars().map(String::from).collect())),
                // snapshot the keys so body mutation cannot invalidate iteration
                HeapData::Object(object) => Ok(IterPlan::Items(object.keys().cloned().collect())),
                other => Err(ErrorKind::TypeMismatch.err(format!("cannot iterate over {} at {loc}", other.type_name()))),
            },
            other => Err(ErrorKind::TypeMismatch.err(format!(
                "cannot iterate over {} at {loc}",
                other.type_name(self.heap)
            ))),
        };
        match plan? {
            IterPlan::List(id) => self.for_over_list(var, id, body, frame),
            IterPlan::Items(items) => self.for_over_strings(var, items, body, frame),
        }
    }

    /// Iterates by index with a fresh bounds check per step, so body code that
    /// mutates the array cannot crash the loop.
    fn for_over_list(&mut self, var: &str, list_id: HeapId, body: &Block, frame: HeapId) -> RunResult<Flow> {
        let mut index = 0;
        loop {
            let item = match self.heap.get(list_id) {
                HeapData::List(list) => match list.get(index) {
                    Some(item) => item.clone_with_heap(self.heap),
                    None => break,
                },
                _ => break,
            };
            scope::define_var(self.heap, frame, var.to_owned(), item);
            match self.eval_block(body, frame)? {
                Flow::Value(value) => value.drop_with_heap(self.heap),
                Flow::Break(_) => break,
                Flow::Continue(_) => {}
                ret @ Flow::Return(_) => return Ok(ret),
            }
            index += 1;
        }
        Ok(Flow::Value(Value::Null))
    }

    fn for_over_strings(&mut self, var: &str, items: Vec<String>, body: &Block, frame: HeapId) -> RunResult<Flow> {
        for item in items {
            let value = self.heap.alloc_str(item)?;
            scope::define_var(self.heap, frame, var.to_owned(), value);
            match self.eval_block(body, frame)? {
                Flow::Value(value) => value.drop_with_heap(self.heap),
                Flow::Break(_) => break,
                Flow::Continue(_) => {}
                ret @ Flow::Return(_) => return Ok(ret),
            }
        }
        Ok(Flow::Value(Value::Null))
    }

    /// Assigns to a name: the nearest frame in the chain that defines it wins,
    /// and an unknown name is created in the innermost frame.
    fn assign_ident(&mut self, name: &str, value: Value, frame: HeapId) {
        if let Some(value) = scope::assign_var(self.heap, frame, name, value) {
            scope::define_var(self.heap, frame, name.to_owned(), value);
        }
    }

    fn assign(&mut self, target: &Expr, value: Value, frame: HeapId) -> RunResult<()> {
        match target {
            Expr::Ident { name, .. } => {
                self.assign_ident(name, value, frame);
                Ok(())
            }
            Expr::Index { container, index, loc } => {
                let container_value = match self.eval_expr(container, frame) {
                    Ok(v) => v,
                    Err(err) => {
                        value.drop_with_heap(self.heap);
                        return Err(err);
                    }
                };
                let index_value = match self.eval_expr(index, frame) {
                    Ok(v) => v,
                    Err(err) => {
                        value.drop_with_heap(self.heap);
                        container_value.drop_with_heap(self.heap);
                        return Err(err);
                    }
                };
                let result = self.assign_into(&container_value, &index_value, value, *loc);
                container_value.drop_with_heap(self.heap);
                index_value.drop_with_heap(self.heap);
                result
            }
            Expr::Member { object, name, loc } => {
                let container_value = match self.eval_expr(object, frame) {
                    Ok(v) => v,
                    Err(err) => {
                        value.drop_with_heap(self.heap);
                        return Err(err);
                    }
                };
                let key = self.heap.alloc_str(name.as_str());
                let key = match key {
                    Ok(key) => key,
                    Err(err) => {
                        value.drop_with_heap(self.heap);
                        container_value.drop_with_heap(self.heap);
                        return Err(err);
                    }
                };
                let result = self.assign_into(&container_value, &key, value, *loc);
                container_value.drop_with_heap(self.heap);
                key.drop_with_heap(self.heap);
                result
            }
            _ => unreachable!("assignment targets are validated by the parser"),
        }
    }

    /// Writes `value` into `container[index]`. Arrays require an in-bounds
    /// integer index; objects create missing keys.
    fn assign_into(&mut self, container: &Value, index: &Value, value: Value, loc: Loc) -> RunResult<()> {
        if container.is_error(self.heap) {
            value.drop_with_heap(self.heap);
            return Err(RunError::Raised(container.clone_with_heap(self.heap)));
        }
        let Value::Ref(id) = container else {
            let type_name = container.type_name(self.heap);
            value.drop_with_heap(self.heap);
            return Err(ErrorKind::TypeMismatch.err(format!("cannot index into {type_name} at {loc}")));
        };
        let id = *id;
        enum Target {
            List(usize),
            Object,
        }
        let target = match self.heap.get(id) {
            HeapData::List(list) => Ok(Target::List(list.len())),
            HeapData::Object(_) => Ok(Target::Object),
            other => Err(ErrorKind::TypeMismatch.err(format!("cannot index into {} at {loc}", other.type_name()))),
        };
        let plan = target.and_then(|target| match target {
            Target::List(len) => match index {
                Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 && (*n as usize) < len => {
                    Ok(Target::List(*n as usize))
                }
                Value::Number(n) => Err(ErrorKind::Bounds.err(format!(
                    "array index {} out of bounds for length {len} at {loc}",
                    format_number(*n)
                ))),
                other => Err(ErrorKind::TypeMismatch.err(format!(
                    "array index must be a number, got {} at {loc}",
                    other.type_name(self.heap)
                ))),
            },
            Target::Object => match index.as_str(self.heap) {
                Some(_) => Ok(Target::Object),
                None => Err(ErrorKind::TypeMismatch.err(format!(
                    "object key must be a string, got {} at {loc}",
                    index.type_name(self.heap)
                ))),
            },
        });
        match plan {
            Ok(Target::List(slot)) => {
                let old = match self.heap.get_mut(id) {
                    HeapData::List(list) => list.set(slot, value),
                    _ => unreachable!("container kind checked above"),
                };
                old.drop_with_heap(self.heap);
                Ok(())
            }
            Ok(Target::Object) => {
                let key = index.as_str(self.heap).expect("key kind checked above").to_owned();
                let old = match self.heap.get_mut(id) {
                    HeapData::Object(object) => object.set(key, value),
                    _ => unreachable!("container kind checked above"),
                };
                if let Some(old) = old {
                    old.drop_with_heap(self.heap);
                }
                Ok(())
            }
            Err(err) => {
                value.drop_with_heap(self.heap);
                Err(err)
            }
        }
    }

    fn eval_expr(&mut self, expr: &Expr, frame: HeapId) -> RunResult<Value> {
        match expr {
            Expr::Null { .. } => Ok(Value::Null),
            Expr::Bool { value, .. } => Ok(Value::Bool(*value)),
            Expr::Number { value, .. } => Ok(Value::Number(*value)),
            Expr::Str { value, .. } => self.heap.alloc_str(value.as_str()),
            Expr::Ident { name, loc } => self.resolve_ident(name, *loc, frame),
            Expr::Array { items, .. } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match self.eval_expr(item, frame) {
                        Ok(value) => values.push(value),
                        Err(err) => {
                            for value in values {
                                value.drop_with_heap(self.heap);
                            }
                            return Err(err);
                        }
                    }
                }
                self.heap.alloc_value(HeapData::List(List::new(values)))
            }
            Expr::ObjectLit { entries, .. } => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, item) in entries {
                    match self.eval_expr(item, frame) {
                        Ok(value) => {
                            if let Some(old) = map.insert(key.clone(), value) {
                                old.drop_with_heap(self.heap);
                            }
                        }
                        Err(err) => {
                            for (_, value) in map {
                                value.drop_with_heap(self.heap);
                            }
                            return Err(err);
                        }
                    }
                }
                self.heap.alloc_value(HeapData::Object(Object::new(map)))
            }
            Expr::Index { container, index, loc } => self.eval_index(container, index, *loc, frame),
            Expr::Member { object, name, loc } => self.eval_member(object, name, *loc, frame),
            Expr::Call { callee, args, loc } => self.eval_call(callee, args, *loc, frame),
            Expr::Unary { op, operand, loc } => {
                let value = self.eval_expr(operand, frame)?;
                match op {
                    UnaryOp::Not => {
                        let truthy = value.truthy(self.heap);
                        value.drop_with_heap(self.heap);
                        Ok(Value::Bool(!truthy))
                    }
                    UnaryOp::Neg => {
                        if value.is_error(self.heap) {
                            return Err(RunError::Raised(value));
                        }
                        match &value {
                            Value::Number(n) => {
                                let n = *n;
                                value.drop_with_heap(self.heap);
                                Ok(Value::Number(-n))
                            }
                            other => {
                                let type_name = other.type_name(self.heap);
                                value.drop_with_heap(self.heap);
                                Err(ErrorKind::TypeMismatch.err(format!("cannot negate {type_name} at {loc}")))
                            }
                        }
                    }
                }
            }
            Expr::Binary { op, left, right, loc } => match op {
                BinaryOp::And | BinaryOp::Or => {
                    let left_value = self.eval_expr(left, frame)?;
                    if left_value.is_error(self.heap) {
                        return Err(RunError::Raised(left_value));
                    }
                    let truthy = left_value.truthy(self.heap);
                    let short_circuits = matches!(op, BinaryOp::Or) == truthy;
                    if short_circuits {
                        // the deciding operand is the result, uncoerced
                        return Ok(left_value);
                    }
                    left_value.drop_with_heap(self.heap);
                    self.eval_expr(right, frame)
                }
                _ => {
                    let left_value = self.eval_expr(left, frame)?;
                    let right_value = match self.eval_expr(right, frame) {
                        Ok(value) => value,
                        Err(err) => {
                            left_value.drop_with_heap(self.heap);
                            return Err(err);
                        }
                    };
                    self.apply_binary(*op, left_value, right_value, *loc)
                }
            },
            Expr::Ternary {
                cond,
                then_value,
                else_value,
                ..
            } => {
                if self.eval_condition(cond, frame)? {
                    self.eval_expr(then_value, frame)
                } else {
                    self.eval_expr(else_value, frame)
                }
            }
        }
    }

    fn resolve_ident(&mut self, name: &str, loc: Loc, frame: HeapId) -> RunResult<Value> {
        if let Some(value) = scope::lookup_var(self.heap, frame, name) {
            return Ok(value);
        }
        if let Some((function, def_frame)) = scope::lookup_func(self.heap, frame, name) {
            return self.make_closure(name, function, def_frame);
        }
        if let Some(builtin) = Builtins::lookup(name) {
            return Ok(Value::Builtin(builtin));
        }
        Err(ErrorKind::UndefinedSymbol.err(format!("undefined variable '{name}' at {loc}")))
    }

    /// Wraps a function definition into a Function value capturing the frame
    /// that holds the definition.
    fn make_closure(&mut self, name: &str, function: FunctionId, captured: HeapId) -> RunResult<Value> {
        self.heap.inc_ref(captured);
        match self.heap.alloc_value(HeapData::Closure(Closure {
            name: name.to_owned(),
            function,
            frame: captured,
        })) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.heap.dec_ref(captured);
                Err(err)
            }
        }
    }

    fn eval_index(&mut self, container: &Expr, index: &Expr, loc: Loc, frame: HeapId) -> RunResult<Value> {
        let container_value = self.eval_expr(container, frame)?;
        if container_value.is_error(self.heap) {
            return Err(RunError::Raised(container_value));
        }
        let index_value = match self.eval_expr(index, frame) {
            Ok(value) => value,
            Err(err) => {
                container_value.drop_with_heap(self.heap);
                return Err(err);
            }
        };
        if index_value.is_error(self.heap) {
            container_value.drop_with_heap(self.heap);
            return Err(RunError::Raised(index_value));
        }

        let result = self.read_index(&container_value, &index_value, loc);
        container_value.drop_with_heap(self.heap);
        index_value.drop_with_heap(self.heap);
        result
    }

    fn read_index(&mut self, container: &Value, index: &Value, loc: Loc) -> RunResult<Value> {
        let Value::Ref(id) = container else {
            let type_name = container.type_name(self.heap);
            return Err(ErrorKind::TypeMismatch.err(format!("cannot index into {type_name} at {loc}")));
        };
        // read under a shared borrow, allocate afterwards
        enum Read {
            Value(Value),
            NewStr(String),
        }
        let read = match self.heap.get(*id) {
            HeapData::List(list) => match index {
                Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 && (*n as usize) < list.len() => Ok(Read::Value(
                    list.get(*n as usize).expect("bounds checked").clone_with_heap(self.heap),
                )),
                Value::Number(n) => Err(ErrorKind::Bounds.err(format!(
                    "array index {} out of bounds for length {} at {loc}",
                    format_number(*n),
                    list.len()
                ))),
                other => Err(ErrorKind::TypeMismatch.err(format!(
                    "array index must be a number, got {} at {loc}",
                    other.type_name(self.heap)
                ))),
            },
            HeapData::Str(s) => match index {
                Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 => match s.as_str().chars().nth(*n as usize) {
                    Some(ch) => Ok(Read::NewStr(ch.to_string())),
                    None => Err(ErrorKind::Bounds.err(format!(
                        "string index {} out of bounds at {loc}",
                        format_number(*n)
                    ))),
                },
                Value::Number(n) => Err(ErrorKind::Bounds.err(format!(
                    "string index {} out of bounds at {loc}",
                    format_number(*n)
                ))),
                other => Err(ErrorKind::TypeMismatch.err(format!(
                    "string index must be a number, got {} at {loc}",
                    other.type_name(self.heap)
                ))),
            },
            HeapData::Object(object) => match index.as_str(self.heap) {
                // reading an absent key yields null
                Some(key) => Ok(Read::Value(
                    object.get(key).map_or(Value::Null, |v| v.clone_with_heap(self.heap)),
                )),
                None => Err(ErrorKind::TypeMismatch.err(format!(
                    "object key must be a string, got {} at {loc}",
                    index.type_name(self.heap)
                ))),
            },
            other => Err(ErrorKind::TypeMismatch.err(format!("cannot index into {} at {loc}", other.type_name()))),
        };
        match read? {
            Read::Value(value) => Ok(value),
            Read::NewStr(text) => self.heap.alloc_str(text),
        }
    }

    fn eval_member(&mut self, object: &Expr, name: &str, loc: Loc, frame: HeapId) -> RunResult<Value> {
        let object_value = self.eval_expr(object, frame)?;
        if object_value.is_error(self.heap) {
            return Err(RunError::Raised(object_value));
        }
        let result = match &object_value {
            Value::Ref(id) => match self.heap.get(*id) {
                HeapData::Object(entries) => {
                    Ok(entries.get(name).map_or(Value::Null, |v| v.clone_with_heap(self.heap)))
                }
                other => Err(ErrorKind::Bounds.err(format!(
                    "member access '.{name}' on non-object {} at {loc}",
                    other.type_name()
                ))),
            },
            other => Err(ErrorKind::Bounds.err(format!(
                "member access '.{name}' on non-object {} at {loc}",
                other.type_name(self.heap)
            ))),
        };
        object_value.drop_with_heap(self.heap);
        result
    }

    fn apply_binary(&mut self, op: BinaryOp, left: Value, right: Value, loc: Loc) -> RunResult<Value> {
        if left.is_error(self.heap) {
            right.drop_with_heap(self.heap);
            return Err(RunError::Raised(left));
        }
        if right.is_error(self.heap) {
            left.drop_with_heap(self.heap);
            return Err(RunError::Raised(right));
        }

        match op {
            BinaryOp::Eq | BinaryOp::Ne => {
                let equal = value_eq(&left, &right, self.heap);
                left.drop_with_heap(self.heap);
                right.drop_with_heap(self.heap);
                Ok(Value::Bool(if matches!(op, BinaryOp::Eq) { equal } else { !equal }))
            }
            BinaryOp::Add => self.apply_add(left, right, loc),
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                let numbers = match (&left, &right) {
                    (Value::Number(a), Value::Number(b)) => Some((*a, *b)),
                    _ => None,
                };
                let type_names = (left.type_name(self.heap), right.type_name(self.heap));
                left.drop_with_heap(self.heap);
                right.drop_with_heap(self.heap);
                let Some((a, b)) = numbers else {
                    return Err(ErrorKind::TypeMismatch.err(format!(
                        "cannot apply '{op}' to {} and {} at {loc}",
                        type_names.0, type_names.1
                    )));
                };
                match op {
                    BinaryOp::Sub => Ok(Value::Number(a - b)),
                    BinaryOp::Mul => Ok(Value::Number(a * b)),
                    BinaryOp::Div => {
                        if b == 0.0 {
                            Err(ErrorKind::Arithmetic.err(format!("division by zero at {loc}")))
                        } else {
                            Ok(Value::Number(a / b))
                        }
                    }
                    BinaryOp::Rem => {
                        if b == 0.0 {
                            Err(ErrorKind::Arithmetic.err(format!("modulo by zero at {loc}")))
                        } else {
                            Ok(Value::Number(a % b))
                        }
                    }
                    _ => unreachable!("operator filtered above"),
                }
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                enum Compared {
                    Numbers(f64, f64),
                    Texts(std::cmp::Ordering),
                }
                let compared = match (&left, &right) {
                    (Value::Number(a), Value::Number(b)) => Some(Compared::Numbers(*a, *b)),
                    _ => match (left.as_str(self.heap), right.as_str(self.heap)) {
                        // byte-wise lexicographic comparison
                        (Some(a), Some(b)) => Some(Compared::Texts(a.as_bytes().cmp(b.as_bytes()))),
                        _ => None,
                    },
                };
                let type_names = (left.type_name(self.heap), right.type_name(self.heap));
                left.drop_with_heap(self.heap);
                right.drop_with_heap(self.heap);
                let Some(compared) = compared else {
                    return Err(ErrorKind::TypeMismatch.err(format!(
                        "cannot compare {} and {} with '{op}' at {loc}",
                        type_names.0, type_names.1
                    )));
                };
                let result = match compared {
                    Compared::Numbers(a, b) => match op {
                        BinaryOp::Lt => a < b,
                        BinaryOp::Le => a <= b,
                        BinaryOp::Gt => a > b,
                        BinaryOp::Ge => a >= b,
                        _ => unreachable!("operator filtered above"),
                    },
                    Compared::Texts(ordering) => match op {
                        BinaryOp::Lt => ordering.is_lt(),
                        BinaryOp::Le => ordering.is_le(),
                        BinaryOp::Gt => ordering.is_gt(),
                        BinaryOp::Ge => ordering.is_ge(),
                        _ => unreachable!("operator filtered above"),
                    },
                };
                Ok(Value::Bool(result))
            }
            BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit operators handled by the caller"),
        }
    }

    fn apply_add(&mut self, left: Value, right: Value, loc: Loc) -> RunResult<Value> {
        enum Added {
            Numbers(f64, f64),
            Text(String),
        }
        let added = match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => Some(Added::Numbers(*a, *b)),
            (Value::Number(a), other) => other
                .as_str(self.heap)
                .map(|s| Added::Text(format!("{}{s}", format_number(*a)))),
            (other, Value::Number(b)) => other
                .as_str(self.heap)
                .map(|s| Added::Text(format!("{s}{}", format_number(*b)))),
            (a, b) => match (a.as_str(self.heap), b.as_str(self.heap)) {
                (Some(a), Some(b)) => Some(Added::Text(format!("{a}{b}"))),
                _ => None,
            },
        };
        let type_names = (left.type_name(self.heap), right.type_name(self.heap));
        left.drop_with_heap(self.heap);
        right.drop_with_heap(self.heap);
        match added {
            Some(Added::Numbers(a, b)) => Ok(Value::Number(a + b)),
            Some(Added::Text(text)) => self.heap.alloc_str(text),
            None => Err(ErrorKind::TypeMismatch.err(format!(
                "cannot add {} and {} at {loc}",
                type_names.0, type_names.1
            ))),
        }
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], loc: Loc, frame: HeapId) -> RunResult<Value> {
        if let Expr::Ident { name, .. } = callee {
            // resolution order: user function, then builtin, then a callable value
            if let Some((function, def_frame)) = scope::lookup_func(self.heap, frame, name) {
                let args = self.eval_args(args, frame)?;
                return self.call_function(function, def_frame, args, loc);
            }
            if let Some(builtin) = Builtins::lookup(name) {
                let args = self.eval_args(args, frame)?;
                return builtin.call(self.heap, self.rng, self.print, Args::new(args));
            }
            if let Some(value) = scope::lookup_var(self.heap, frame, name) {
                return self.call_value(value, args, loc, frame);
            }
            return Err(ErrorKind::UndefinedSymbol.err(format!("undefined function '{name}' at {loc}")));
        }
        let callee_value = self.eval_expr(callee, frame)?;
        self.call_value(callee_value, args, loc, frame)
    }

    fn call_value(&mut self, callee: Value, args: &[Expr], loc: Loc, frame: HeapId) -> RunResult<Value> {
        if callee.is_error(self.heap) {
            return Err(RunError::Raised(callee));
        }
        match &callee {
            Value::Builtin(builtin) => {
                let builtin = *builtin;
                callee.drop_with_heap(self.heap);
                let args = self.eval_args(args, frame)?;
                builtin.call(self.heap, self.rng, self.print, Args::new(args))
            }
            Value::Ref(id) => {
                let closure = match self.heap.get(*id) {
                    HeapData::Closure(closure) => Some((closure.function, closure.frame)),
                    _ => None,
                };
                match closure {
                    Some((function, captured)) => {
                        let args = match self.eval_args(args, frame) {
                            Ok(args) => args,
                            Err(err) => {
                                callee.drop_with_heap(self.heap);
                                return Err(err);
                            }
                        };
                        // the callee value keeps the captured frame alive for
                        // the duration of the call
                        let result = self.call_function(function, captured, args, loc);
                        callee.drop_with_heap(self.heap);
                        result
                    }
                    None => {
                        let type_name = callee.type_name(self.heap);
                        callee.drop_with_heap(self.heap);
                        Err(ErrorKind::UndefinedSymbol.err(format!("value of type {type_name} is not callable at {loc}")))
                    }
                }
            }
            other => {
                let type_name = other.type_name(self.heap);
                callee.drop_with_heap(self.heap);
                Err(ErrorKind::UndefinedSymbol.err(format!("value of type {type_name} is not callable at {loc}")))
            }
        }
    }

    /// Evaluates call arguments strictly left to right.
    fn eval_args(&mut self, args: &[Expr], frame: HeapId) -> RunResult<SmallVec<[Value; 4]>> {
        let mut values: SmallVec<[Value; 4]> = SmallVec::new();
        for arg in args {
            match self.eval_expr(arg, frame) {
                Ok(value) => values.push(value),
                Err(err) => {
                    for value in values {
                        value.drop_with_heap(self.heap);
                    }
                    return Err(err);
                }
            }
        }
        Ok(values)
    }

    /// Calls a user function: new frame parented on the captured scope,
    /// positional binding (missing parameters become null, extras are
    /// dropped), and a guaranteed frame pop on every exit path.
    fn call_function(
        &mut self,
        function: FunctionId,
        captured: HeapId,
        args: SmallVec<[Value; 4]>,
        loc: Loc,
    ) -> RunResult<Value> {
        if self.call_depth >= self.max_call_depth {
            for value in args {
                value.drop_with_heap(self.heap);
            }
            return Err(ErrorKind::Resource.err(format!(
                "maximum call depth of {} exceeded at {loc}",
                self.max_call_depth
            )));
        }
        let function = self.functions.get(function);
        let call_frame = match scope::push_frame(self.heap, Some(captured)) {
            Ok(frame) => frame,
            Err(err) => {
                for value in args {
                    value.drop_with_heap(self.heap);
                }
                return Err(err);
            }
        };

        let mut args = args.into_iter();
        for param in &function.params {
            let value = args.next().unwrap_or(Value::Null);
            scope::define_var(self.heap, call_frame, param.clone(), value);
        }
        for extra in args {
            extra.drop_with_heap(self.heap);
        }

        self.call_depth += 1;
        let outcome = self.eval_block(&function.body, call_frame);
        self.call_depth -= 1;
        scope::pop_frame(self.heap, call_frame);

        match outcome? {
            Flow::Return(value) | Flow::Value(value) => Ok(value),
            Flow::Break(loc) => Err(ErrorKind::Syntax.err(format!("break outside of a loop at {loc}"))),
            Flow::Continue(loc) => Err(ErrorKind::Syntax.err(format!("continue outside of a loop at {loc}"))),
        }
    }
}
