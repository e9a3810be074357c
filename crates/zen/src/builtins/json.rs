//! JSON serialization builtins.
//!
//! `jsonStringify` walks the value graph with a visited set, so cyclic arrays
//! and objects serialize to the `"[Circular Reference]"` sentinel instead of
//! looping. `jsonParse` leans on serde_json (with insertion order preserved)
//! and converts the parsed tree into runtime values.

use ahash::AHashSet;
use indexmap::IndexMap;

use super::{as_string, Args};
use crate::{
    error::{ErrorKind, RunResult},
    heap::{Heap, HeapData, HeapId},
    types::{List, Object},
    value::{format_number, write_quoted, Value},
};

pub(super) fn stringify(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [value] = args.into_exact::<1>(heap, "jsonStringify")?;
    let rendered = to_json_string(heap, &value);
    value.drop_with_heap(heap);
    heap.alloc_str(rendered)
}

/// Serializes a value to JSON text. Exposed to the rest of the crate so hosts
/// can render values without calling through the registry.
pub(crate) fn to_json_string(heap: &Heap, value: &Value) -> String {
    let mut out = String::new();
    let mut visited = AHashSet::new();
    write_json(value, heap, &mut out, &mut visited);
    out
}

fn write_json(value: &Value, heap: &Heap, out: &mut String, visited: &mut AHashSet<HeapId>) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => {
            // JSON has no representation for non-finite numbers
            if n.is_finite() {
                out.push_str(&format_number(*n));
            } else {
                out.push_str("null");
            }
        }
        Value::Builtin(_) => write_quoted(&value.display_string(heap), out),
        Value::Ref(id) => match heap.get(*id) {
            HeapData::Str(s) => write_quoted(s.as_str(), out),
            HeapData::List(list) => {
                if !visited.insert(*id) {
                    write_quoted("[Circular Reference]", out);
                    return;
                }
                out.push('[');
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_json(item, heap, out, visited);
                }
                out.push(']');
                visited.remove(id);
            }
            HeapData::Object(object) => {
                if !visited.insert(*id) {
                    write_quoted("[Circular Reference]", out);
                    return;
                }
                out.push('{');
                for (i, (key, item)) in object.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_quoted(key, out);
                    out.push(':');
                    write_json(item, heap, out, visited);
                }
                out.push('}');
                visited.remove(id);
            }
            // everything else only has a descriptive string form
            _ => write_quoted(&value.display_string(heap), out),
        },
        #[cfg(feature = "ref-count-panic")]
        Value::Dereferenced => panic!("cannot serialize a dereferenced value"),
    }
}

pub(super) fn parse(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [value] = args.into_exact::<1>(heap, "jsonParse")?;
    let text = as_string(&value, heap, "jsonParse");
    value.drop_with_heap(heap);
    let text = text?;
    let parsed: serde_json::Value = serde_json::from_str(&text)
        .map_err(|err| ErrorKind::Io.err(format!("jsonParse: {err}")))?;
    from_json(heap, &parsed)
}

fn from_json(heap: &mut Heap, json: &serde_json::Value) -> RunResult<Value> {
    match json {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => Ok(Value::Number(n.as_f64().unwrap_or(f64::NAN))),
        serde_json::Value::String(s) => heap.alloc_str(s.as_str()),
        serde_json::Value::Array(items) => {
            let mut converted = Vec::with_capacity(items.len());
            for item in items {
                match from_json(heap, item) {
                    Ok(value) => converted.push(value),
                    Err(err) => {
                        for value in converted {
                            value.drop_with_heap(heap);
                        }
                        return Err(err);
                    }
                }
            }
            heap.alloc_value(HeapData::List(List::new(converted)))
        }
        serde_json::Value::Object(entries) => {
            let mut converted = IndexMap::with_capacity(entries.len());
            for (key, item) in entries {
                match from_json(heap, item) {
                    Ok(value) => {
                        if let Some(old) = converted.insert(key.clone(), value) {
                            old.drop_with_heap(heap);
                        }
                    }
                    Err(err) => {
                        for (_, value) in converted {
                            value.drop_with_heap(heap);
                        }
                        return Err(err);
                    }
                }
            }
            heap.alloc_value(HeapData::Object(Object::new(converted)))
        }
    }
}
