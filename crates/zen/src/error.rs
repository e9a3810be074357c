use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString, IntoStaticStr};

use crate::{
    heap::{Heap, HeapData},
    value::Value,
};

/// Result type alias for operations that can produce a runtime error.
pub(crate) type RunResult<T> = Result<T, RunError>;

/// Error kinds recognized by the interpreter.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and `Into<&'static str>`
/// implementations. Every kind carries a stable numeric code that appears in the
/// canonical rendering `Error(<code>): <message>`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
pub enum ErrorKind {
    /// Malformed source rejected by the parser, or a control-flow statement
    /// used outside its legal context.
    Syntax,
    /// Variable or function name not found in the scope chain.
    UndefinedSymbol,
    /// Operator or builtin applied to incompatible value kinds.
    TypeMismatch,
    /// Division by zero and numeric domain errors.
    Arithmetic,
    /// Array index outside `0..len`, or member access on a non-object.
    Bounds,
    /// Wrong argument count or argument kind for a callable.
    ArgumentMismatch,
    /// Failures originating outside the evaluator (file I/O, JSON decoding).
    Io,
    /// Allocation or recursion limits exceeded.
    Resource,
}

impl ErrorKind {
    /// Stable numeric code for this kind, part of the language's error surface.
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::Syntax => 1,
            Self::UndefinedSymbol => 2,
            Self::TypeMismatch => 3,
            Self::Arithmetic => 4,
            Self::Bounds => 5,
            Self::ArgumentMismatch => 6,
            Self::Io => 7,
            Self::Resource => 8,
        }
    }

    /// Shorthand for building an error outcome of this kind.
    pub(crate) fn err(self, message: impl Into<String>) -> RunError {
        RunError::Fresh(ZenError::new(self, message))
    }
}

/// A first-class error value: kind, message, and an optional cause chain.
///
/// Errors flow through the language as ordinary values. They render as
/// `Error(<code>): <message>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZenError {
    kind: ErrorKind,
    message: String,
    cause: Option<Box<ZenError>>,
}

impl ZenError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    #[must_use]
    pub fn with_cause(kind: ErrorKind, message: impl Into<String>, cause: Self) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn code(&self) -> u32 {
        self.kind.code()
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn cause(&self) -> Option<&Self> {
        self.cause.as_deref()
    }
}

impl Display for ZenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error({}): {}", self.code(), self.message)
    }
}

impl std::error::Error for ZenError {}

/// The evaluator's error channel.
///
/// `Fresh` carries error data that has not been materialized on the heap yet;
/// `Raised` re-propagates an Error value that already lives there (the variant
/// owns one reference to it).
#[derive(Debug)]
pub(crate) enum RunError {
    Fresh(ZenError),
    Raised(Value),
}

impl RunError {
    /// Materializes this error as a first-class Error value on the heap.
    ///
    /// Used where the language captures an error outcome instead of
    /// propagating it (`set x = 1 / 0` stores the error).
    pub fn into_value(self, heap: &mut Heap) -> RunResult<Value> {
        match self {
            Self::Fresh(err) => heap.alloc_value(HeapData::Error(err)),
            Self::Raised(value) => Ok(value),
        }
    }

    /// Extracts plain error data, releasing any heap reference this error owns.
    pub fn into_error(self, heap: &mut Heap) -> ZenError {
        match self {
            Self::Fresh(err) => err,
            Self::Raised(value) => {
                let err = match &value {
                    Value::Ref(id) => match heap.get(*id) {
                        HeapData::Error(err) => err.clone(),
                        other => ZenError::new(
                            ErrorKind::TypeMismatch,
                            format!("raised a non-error value of type {}", other.type_name()),
                        ),
                    },
                    _ => ZenError::new(ErrorKind::TypeMismatch, "raised a non-error value"),
                };
                value.drop_with_heap(heap);
                err
            }
        }
    }

    /// Releases any heap reference held by this error without inspecting it.
    pub fn drop_with_heap(self, heap: &mut Heap) {
        if let Self::Raised(value) = self {
            value.drop_with_heap(heap);
        }
    }
}

impl From<ZenError> for RunError {
    fn from(err: ZenError) -> Self {
        Self::Fresh(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorKind::Syntax.code(), 1);
        assert_eq!(ErrorKind::UndefinedSymbol.code(), 2);
        assert_eq!(ErrorKind::TypeMismatch.code(), 3);
        assert_eq!(ErrorKind::Arithmetic.code(), 4);
        assert_eq!(ErrorKind::Bounds.code(), 5);
        assert_eq!(ErrorKind::ArgumentMismatch.code(), 6);
        assert_eq!(ErrorKind::Io.code(), 7);
        assert_eq!(ErrorKind::Resource.code(), 8);
    }

    #[test]
    fn renders_code_and_message() {
        let err = ZenError::new(ErrorKind::Arithmetic, "division by zero");
        assert_eq!(err.to_string(), "Error(4): division by zero");
    }

    #[test]
    fn cause_chain() {
        let inner = ZenError::new(ErrorKind::Io, "file not found");
        let outer = ZenError::with_cause(ErrorKind::Io, "config load failed", inner);
        assert_eq!(outer.cause().unwrap().message(), "file not found");
    }
}
