//! The interpreter context: one self-contained instance per `Interpreter`.
//!
//! All mutable state (heap, function table, global scope, RNG, limits) lives
//! here, so independent interpreters can coexist in one process and tests can
//! reset state by dropping the instance.

use std::fmt;

use rand::{rngs::StdRng, SeedableRng};

use crate::{
    error::ZenError,
    eval::Evaluator,
    function::FunctionTable,
    heap::{Heap, HeapId, HeapStats},
    io::PrintWriter,
    object::{self, Object},
    parse::{parse, SyntaxError},
    scope,
};

/// Default bound on user-function call nesting.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 512;

/// Failure surface of [`Interpreter::run`].
#[derive(Debug)]
pub enum ExecError {
    /// The parser recorded syntax errors; nothing was evaluated.
    Syntax(Vec<SyntaxError>),
    /// Evaluation produced an error outcome at the top level.
    Runtime(ZenError),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(errors) => {
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "syntax error: {err}")?;
                }
                Ok(())
            }
            Self::Runtime(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ExecError {}

/// A complete interpreter instance.
pub struct Interpreter {
    heap: Heap,
    functions: FunctionTable,
    globals: HeapId,
    rng: StdRng,
    max_call_depth: usize,
}

impl Interpreter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(None, DEFAULT_MAX_CALL_DEPTH)
    }

    /// Creates an interpreter with an optional heap entry bound and a call
    /// depth bound.
    #[must_use]
    pub fn with_limits(max_heap_entries: Option<usize>, max_call_depth: usize) -> Self {
        let mut heap = Heap::new(max_heap_entries);
        let globals = scope::push_frame(&mut heap, None).expect("a fresh heap always has room for the global frame");
        Self {
            heap,
            functions: FunctionTable::default(),
            globals,
            rng: StdRng::from_entropy(),
            max_call_depth,
        }
    }

    /// Lexes, parses, and evaluates `source` against the persistent global
    /// scope. Refuses to evaluate when the parser recorded any syntax error.
    pub fn run(&mut self, source: &str, print: &mut impl PrintWriter) -> Result<Object, ExecError> {
        let (program, errors) = parse(source);
        if !errors.is_empty() {
            log::debug!("refusing to evaluate: {} syntax error(s)", errors.len());
            return Err(ExecError::Syntax(errors));
        }
        let mut evaluator = Evaluator::new(
            &mut self.heap,
            &mut self.functions,
            &mut self.rng,
            print,
            self.max_call_depth,
        );
        match evaluator.eval_program(&program, self.globals) {
            Ok(value) => {
                let object = object::from_value(&self.heap, &value);
                value.drop_with_heap(&mut self.heap);
                Ok(object)
            }
            Err(err) => Err(ExecError::Runtime(err.into_error(&mut self.heap))),
        }
        // the per-run AST is dropped here; function bodies live on in the
        // session's function table
    }

    /// Snapshot of the current heap state.
    #[must_use]
    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats()
    }

    /// Name and rendered value of every global variable, in definition order.
    #[must_use]
    pub fn list_variables(&self) -> Vec<(String, String)> {
        scope::frame(&self.heap, self.globals)
            .vars()
            .iter()
            .map(|(name, value)| (name.clone(), value.display_string(&self.heap)))
            .collect()
    }

    /// Number of user-defined functions recorded this session.
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Releases the global scope and reports what is left on the heap.
    ///
    /// With no closure cycles, a finished program leaves zero live objects.
    #[must_use]
    pub fn into_heap_stats(mut self) -> HeapStats {
        scope::pop_frame(&mut self.heap, self.globals);
        self.heap.stats()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
