//! User-defined functions and closures.

use std::rc::Rc;

use crate::{ast::Block, heap::HeapId};

/// Identifier of a function definition inside the session's [`FunctionTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FunctionId(u32);

impl FunctionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A user-defined function: name, positional parameters, and the body copied
/// out of the defining AST.
///
/// Definitions are extracted into the session-lifetime table when the
/// `function` statement executes, which is what lets the REPL free each
/// line's AST while closures created from it live on.
#[derive(Debug)]
pub(crate) struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
}

/// Append-only registry of function definitions for one interpreter session.
#[derive(Debug, Default)]
pub(crate) struct FunctionTable {
    functions: Vec<Rc<Function>>,
}

impl FunctionTable {
    pub fn define(&mut self, function: Function) -> FunctionId {
        let id = FunctionId(u32::try_from(self.functions.len()).expect("function table overflow"));
        self.functions.push(Rc::new(function));
        id
    }

    /// Returns a shared handle to the definition; cheap to clone so the
    /// evaluator can hold it across the body evaluation.
    pub fn get(&self, id: FunctionId) -> Rc<Function> {
        Rc::clone(&self.functions[id.index()])
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }
}

/// A Function value: a definition plus the frame captured at definition time.
///
/// The closure owns one reference to the captured frame, which transitively
/// keeps the whole defining chain alive.
#[derive(Debug)]
pub(crate) struct Closure {
    pub name: String,
    pub function: FunctionId,
    pub frame: HeapId,
}

impl Closure {
    pub(crate) fn dec_ref_ids(&mut self, out: &mut Vec<HeapId>) {
        out.push(self.frame);
    }
}
