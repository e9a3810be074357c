//! The public, heap-independent value type.
//!
//! `Object` is what hosts see at the API boundary: it owns all its data and
//! can be freely cloned, serialized, or stored. The evaluator itself works
//! only with the internal `Value` type; conversion happens once per result.

use std::fmt::{self, Write};

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::{
    error::ZenError,
    heap::{Heap, HeapData, HeapId},
    value::{format_number, write_quoted, Value},
};

/// A Zen value detached from the interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Object {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Object>),
    /// Insertion-ordered key/value pairs.
    Dict(Vec<(String, Object)>),
    Error(ZenError),
    /// Output-only: values with no structural mapping (functions, sets,
    /// priority queues, cycles) carry their rendered form.
    Repr(String),
}

impl Object {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Converts a runtime value into a detached `Object`, replacing cycles with a
/// `[Circular Reference]` marker.
pub(crate) fn from_value(heap: &Heap, value: &Value) -> Object {
    let mut visited = AHashSet::new();
    convert(heap, value, &mut visited)
}

fn convert(heap: &Heap, value: &Value, visited: &mut AHashSet<HeapId>) -> Object {
    match value {
        Value::Null => Object::Null,
        Value::Bool(b) => Object::Bool(*b),
        Value::Number(n) => Object::Number(*n),
        Value::Builtin(_) => Object::Repr(value.display_string(heap)),
        Value::Ref(id) => match heap.get(*id) {
            HeapData::Str(s) => Object::String(s.as_str().to_owned()),
            HeapData::Error(err) => Object::Error(err.clone()),
            HeapData::List(list) => {
                if !visited.insert(*id) {
                    return Object::Repr("[Circular Reference]".to_owned());
                }
                let items = list.iter().map(|item| convert(heap, item, visited)).collect();
                visited.remove(id);
                Object::List(items)
            }
            HeapData::Object(object) => {
                if !visited.insert(*id) {
                    return Object::Repr("[Circular Reference]".to_owned());
                }
                let entries = object
                    .iter()
                    .map(|(key, item)| (key.clone(), convert(heap, item, visited)))
                    .collect();
                visited.remove(id);
                Object::Dict(entries)
            }
            _ => Object::Repr(value.display_string(heap)),
        },
        #[cfg(feature = "ref-count-panic")]
        Value::Dereferenced => panic!("cannot convert a dereferenced value"),
    }
}

impl fmt::Display for Object {
    /// Canonical to-string form: top-level strings print as their bytes,
    /// containers in a JSON-ish form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            other => {
                let mut out = String::new();
                write_nested(other, &mut out);
                f.write_str(&out)
            }
        }
    }
}

fn write_nested(object: &Object, out: &mut String) {
    match object {
        Object::Null => out.push_str("null"),
        Object::Bool(true) => out.push_str("true"),
        Object::Bool(false) => out.push_str("false"),
        Object::Number(n) => out.push_str(&format_number(*n)),
        Object::String(s) => write_quoted(s, out),
        Object::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_nested(item, out);
            }
            out.push(']');
        }
        Object::Dict(entries) => {
            out.push('{');
            for (i, (key, item)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_quoted(key, out);
                out.push_str(": ");
                write_nested(item, out);
            }
            out.push('}');
        }
        Object::Error(err) => {
            let _ = write!(out, "{err}");
        }
        Object::Repr(repr) => out.push_str(repr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(Object::Null.to_string(), "null");
        assert_eq!(Object::Number(3.0).to_string(), "3");
        assert_eq!(Object::String("hi".into()).to_string(), "hi");
        assert_eq!(
            Object::List(vec![Object::String("hi".into()), Object::Bool(false)]).to_string(),
            "[\"hi\", false]"
        );
        assert_eq!(
            Object::Dict(vec![("k".into(), Object::Number(0.5))]).to_string(),
            "{\"k\": 0.5}"
        );
    }
}
