//! String builtins. Index-based operations are byte-indexed; `chars` and
//! `split` with an empty separator work per character.

use super::{as_int, as_string, Args};
use crate::{
    error::{ErrorKind, RunResult},
    heap::{Heap, HeapData},
    types::List,
    value::{value_eq, Value},
};

/// Maximum bytes a string-producing builtin may allocate at once.
const MAX_STRING_BYTES: usize = 64 * 1024 * 1024;

fn unary_string(heap: &mut Heap, args: Args, name: &str, apply: impl FnOnce(&str) -> String) -> RunResult<Value> {
    let [value] = args.into_exact::<1>(heap, name)?;
    let text = as_string(&value, heap, name);
    value.drop_with_heap(heap);
    heap.alloc_str(apply(&text?))
}

pub(super) fn upper(heap: &mut Heap, args: Args) -> RunResult<Value> {
    unary_string(heap, args, "upper", str::to_uppercase)
}

pub(super) fn lower(heap: &mut Heap, args: Args) -> RunResult<Value> {
    unary_string(heap, args, "lower", str::to_lowercase)
}

pub(super) fn trim(heap: &mut Heap, args: Args) -> RunResult<Value> {
    unary_string(heap, args, "trim", |s| s.trim().to_owned())
}

fn binary_strings(heap: &mut Heap, args: Args, name: &str) -> RunResult<(String, String)> {
    let [a, b] = args.into_exact::<2>(heap, name)?;
    let extracted = as_string(&a, heap, name).and_then(|first| as_string(&b, heap, name).map(|second| (first, second)));
    a.drop_with_heap(heap);
    b.drop_with_heap(heap);
    extracted
}

pub(super) fn split(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let (text, sep) = binary_strings(heap, args, "split")?;
    let pieces: Vec<String> = if sep.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        text.split(sep.as_str()).map(str::to_owned).collect()
    };
    let mut items = Vec::with_capacity(pieces.len());
    for piece in pieces {
        match heap.alloc_str(piece) {
            Ok(value) => items.push(value),
            Err(err) => {
                for value in items {
                    value.drop_with_heap(heap);
                }
                return Err(err);
            }
        }
    }
    heap.alloc_value(HeapData::List(List::new(items)))
}

pub(super) fn join(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [list_value, sep_value] = args.into_exact::<2>(heap, "join")?;
    let joined = as_string(&sep_value, heap, "join").and_then(|sep| match &list_value {
        Value::Ref(id) => match heap.get(*id) {
            HeapData::List(list) => {
                let mut out = String::new();
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        out.push_str(&sep);
                    }
                    out.push_str(&item.display_string(heap));
                }
                Ok(out)
            }
            other => Err(ErrorKind::ArgumentMismatch.err(format!("join() expected an array, got {}", other.type_name()))),
        },
        other => Err(ErrorKind::ArgumentMismatch.err(format!(
            "join() expected an array, got {}",
            other.type_name(heap)
        ))),
    });
    list_value.drop_with_heap(heap);
    sep_value.drop_with_heap(heap);
    heap.alloc_str(joined?)
}

/// Shared search logic for `contains` and `indexOf` over strings and arrays.
fn find_in(heap: &Heap, haystack: &Value, needle: &Value, name: &str) -> RunResult<Option<usize>> {
    match haystack {
        Value::Ref(id) => match heap.get(*id) {
            HeapData::Str(s) => match needle.as_str(heap) {
                Some(sub) => Ok(s.as_str().find(sub)),
                None => Err(ErrorKind::ArgumentMismatch.err(format!(
                    "{name}() expected a string to search for, got {}",
                    needle.type_name(heap)
                ))),
            },
            HeapData::List(list) => Ok(list.iter().position(|item| value_eq(item, needle, heap))),
            other => Err(ErrorKind::ArgumentMismatch.err(format!(
                "{name}() expected a string or array, got {}",
                other.type_name()
            ))),
        },
        other => Err(ErrorKind::ArgumentMismatch.err(format!(
            "{name}() expected a string or array, got {}",
            other.type_name(heap)
        ))),
    }
}

pub(super) fn contains(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [haystack, needle] = args.into_exact::<2>(heap, "contains")?;
    let found = find_in(heap, &haystack, &needle, "contains");
    haystack.drop_with_heap(heap);
    needle.drop_with_heap(heap);
    Ok(Value::Bool(found?.is_some()))
}

pub(super) fn index_of(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [haystack, needle] = args.into_exact::<2>(heap, "indexOf")?;
    let found = find_in(heap, &haystack, &needle, "indexOf");
    haystack.drop_with_heap(heap);
    needle.drop_with_heap(heap);
    Ok(Value::Number(found?.map_or(-1.0, |index| index as f64)))
}

pub(super) fn substring(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let mut values = args.into_between(heap, "substring", 2, 3)?;
    let end_value = if values.len() == 3 { values.pop() } else { None };
    let start_value = values.pop().expect("arity checked");
    let text_value = values.pop().expect("arity checked");

    let extracted = as_string(&text_value, heap, "substring").and_then(|text| {
        let start = as_int(&start_value, heap, "substring")?;
        let end = match &end_value {
            Some(value) => as_int(value, heap, "substring")?,
            None => text.len() as i64,
        };
        Ok((text, start, end))
    });
    text_value.drop_with_heap(heap);
    start_value.drop_with_heap(heap);
    if let Some(value) = end_value {
        value.drop_with_heap(heap);
    }

    let (text, start, end) = extracted?;
    let start = start.clamp(0, text.len() as i64) as usize;
    let end = end.clamp(start as i64, text.len() as i64) as usize;
    match text.get(start..end) {
        Some(slice) => heap.alloc_str(slice),
        None => Err(ErrorKind::Bounds.err(format!(
            "substring() range {start}..{end} does not fall on character boundaries"
        ))),
    }
}

pub(super) fn replace(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [text_value, from_value, to_value] = args.into_exact::<3>(heap, "replace")?;
    let extracted = as_string(&text_value, heap, "replace").and_then(|text| {
        let from = as_string(&from_value, heap, "replace")?;
        let to = as_string(&to_value, heap, "replace")?;
        Ok((text, from, to))
    });
    text_value.drop_with_heap(heap);
    from_value.drop_with_heap(heap);
    to_value.drop_with_heap(heap);

    let (text, from, to) = extracted?;
    if from.is_empty() {
        return heap.alloc_str(text);
    }
    heap.alloc_str(text.replace(&from, &to))
}

pub(super) fn starts_with(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let (text, prefix) = binary_strings(heap, args, "startsWith")?;
    Ok(Value::Bool(text.starts_with(&prefix)))
}

pub(super) fn ends_with(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let (text, suffix) = binary_strings(heap, args, "endsWith")?;
    Ok(Value::Bool(text.ends_with(&suffix)))
}

pub(super) fn repeat(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [text_value, count_value] = args.into_exact::<2>(heap, "repeat")?;
    let extracted = as_string(&text_value, heap, "repeat")
        .and_then(|text| as_int(&count_value, heap, "repeat").map(|count| (text, count)));
    text_value.drop_with_heap(heap);
    count_value.drop_with_heap(heap);

    let (text, count) = extracted?;
    if count < 0 {
        return Err(ErrorKind::ArgumentMismatch.err("repeat() count must not be negative"));
    }
    let total = text.len().saturating_mul(count as usize);
    if total > MAX_STRING_BYTES {
        return Err(ErrorKind::Resource.err(format!("repeat() result of {total} bytes is too large")));
    }
    heap.alloc_str(text.repeat(count as usize))
}

pub(super) fn chars(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [value] = args.into_exact::<1>(heap, "chars")?;
    let text = as_string(&value, heap, "chars");
    value.drop_with_heap(heap);
    let text = text?;
    let mut items = Vec::new();
    for ch in text.chars() {
        match heap.alloc_str(ch.to_string()) {
            Ok(value) => items.push(value),
            Err(err) => {
                for value in items {
                    value.drop_with_heap(heap);
                }
                return Err(err);
            }
        }
    }
    heap.alloc_value(HeapData::List(List::new(items)))
}
