//! Zen: a small dynamically-typed scripting language.
//!
//! The crate provides the language core: lexer, recursive-descent parser,
//! reference-counted value arena, lexical scope chains, a tree-walking
//! evaluator, and the builtin registry. Hosts drive it through
//! [`Interpreter`] for one-shot programs or [`ReplSession`] for a persistent
//! interactive scope, and receive results as detached [`Object`] values.
//!
//! ```
//! use zen::{CollectStringPrint, Interpreter};
//!
//! let mut print = CollectStringPrint::new();
//! let mut interp = Interpreter::new();
//! interp.run("set x = 1 + 2 print(x)", &mut print).unwrap();
//! assert_eq!(print.output(), "3\n");
//! ```

mod ast;
mod builtins;
mod error;
mod eval;
mod function;
mod heap;
mod interp;
mod io;
mod lexer;
mod line_map;
mod object;
mod parse;
mod repl;
mod scope;
mod types;
mod value;

pub use crate::{
    builtins::{BuiltinFunction, Builtins},
    error::{ErrorKind, ZenError},
    heap::HeapStats,
    interp::{ExecError, Interpreter, DEFAULT_MAX_CALL_DEPTH},
    io::{CollectStringPrint, NoPrint, PrintWriter, StdPrint},
    object::Object,
    parse::SyntaxError,
    repl::ReplSession,
};
