//! Persistent REPL session support.
//!
//! `ReplSession` keeps interpreter state across `execute()` calls so
//! interactive snippets share variables, functions, and heap objects. Each
//! input's lexer, parser, and AST are released after the call; values retained
//! in the global scope live on until the session is dropped.

use crate::{
    heap::HeapStats,
    interp::{ExecError, Interpreter},
    io::PrintWriter,
    object::Object,
};

/// A persistent interactive session.
pub struct ReplSession {
    interp: Interpreter,
}

impl ReplSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            interp: Interpreter::new(),
        }
    }

    /// Runs one input against the persistent global scope.
    ///
    /// A runtime error leaves the session usable; the global scope is never
    /// released between inputs.
    pub fn execute(&mut self, code: &str, print: &mut impl PrintWriter) -> Result<Object, ExecError> {
        log::trace!("repl input: {code:?}");
        self.interp.run(code, print)
    }

    /// Display rule for evaluation results: `null` is suppressed, everything
    /// else renders in canonical form on its own line.
    #[must_use]
    pub fn render_result(object: &Object) -> Option<String> {
        if object.is_null() {
            None
        } else {
            Some(object.to_string())
        }
    }

    #[must_use]
    pub fn heap_stats(&self) -> HeapStats {
        self.interp.heap_stats()
    }

    /// Name and rendered value of every session variable, in definition order.
    #[must_use]
    pub fn list_variables(&self) -> Vec<(String, String)> {
        self.interp.list_variables()
    }

    /// Ends the session, releasing the global scope, and reports what is left
    /// on the heap.
    #[must_use]
    pub fn into_heap_stats(self) -> HeapStats {
        self.interp.into_heap_stats()
    }
}

impl Default for ReplSession {
    fn default() -> Self {
        Self::new()
    }
}
