//! Array and object builtins.

use super::{as_int, as_number, as_string, Args};
use crate::{
    error::{ErrorKind, RunResult},
    heap::{Heap, HeapData, HeapId},
    types::List,
    value::Value,
};

/// Bound on the number of elements `range()` may produce.
const MAX_RANGE_LEN: usize = 10_000_000;

fn list_id(value: &Value, heap: &Heap, name: &str) -> RunResult<HeapId> {
    match value {
        Value::Ref(id) if matches!(heap.get(*id), HeapData::List(_)) => Ok(*id),
        other => Err(ErrorKind::ArgumentMismatch.err(format!(
            "{name}() expected an array, got {}",
            other.type_name(heap)
        ))),
    }
}

fn object_id(value: &Value, heap: &Heap, name: &str) -> RunResult<HeapId> {
    match value {
        Value::Ref(id) if matches!(heap.get(*id), HeapData::Object(_)) => Ok(*id),
        other => Err(ErrorKind::ArgumentMismatch.err(format!(
            "{name}() expected an object, got {}",
            other.type_name(heap)
        ))),
    }
}

fn list_mut<'h>(heap: &'h mut Heap, id: HeapId) -> &'h mut List {
    match heap.get_mut(id) {
        HeapData::List(list) => list,
        other => panic!("expected an array, found {}", other.type_name()),
    }
}

pub(super) fn push(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [array, item] = args.into_exact::<2>(heap, "push")?;
    let id = match list_id(&array, heap, "push") {
        Ok(id) => id,
        Err(err) => {
            array.drop_with_heap(heap);
            item.drop_with_heap(heap);
            return Err(err);
        }
    };
    let list = list_mut(heap, id);
    list.push(item);
    let new_len = list.len();
    array.drop_with_heap(heap);
    Ok(Value::Number(new_len as f64))
}

pub(super) fn pop(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [array] = args.into_exact::<1>(heap, "pop")?;
    let id = match list_id(&array, heap, "pop") {
        Ok(id) => id,
        Err(err) => {
            array.drop_with_heap(heap);
            return Err(err);
        }
    };
    let popped = list_mut(heap, id).pop();
    array.drop_with_heap(heap);
    Ok(popped.unwrap_or(Value::Null))
}

pub(super) fn insert_at(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [array, index_value, item] = args.into_exact::<3>(heap, "insertAt")?;
    let checked = list_id(&array, heap, "insertAt").and_then(|id| {
        let index = as_int(&index_value, heap, "insertAt")?;
        let len = list_len(heap, id);
        if index < 0 || index as usize > len {
            return Err(ErrorKind::Bounds.err(format!("insertAt() index {index} out of bounds for length {len}")));
        }
        Ok((id, index as usize))
    });
    index_value.drop_with_heap(heap);
    match checked {
        Ok((id, index)) => {
            list_mut(heap, id).insert(index, item);
            array.drop_with_heap(heap);
            Ok(Value::Null)
        }
        Err(err) => {
            array.drop_with_heap(heap);
            item.drop_with_heap(heap);
            Err(err)
        }
    }
}

fn list_len(heap: &Heap, id: HeapId) -> usize {
    match heap.get(id) {
        HeapData::List(list) => list.len(),
        other => panic!("expected an array, found {}", other.type_name()),
    }
}

pub(super) fn remove_at(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [array, index_value] = args.into_exact::<2>(heap, "removeAt")?;
    let checked = list_id(&array, heap, "removeAt").and_then(|id| {
        let index = as_int(&index_value, heap, "removeAt")?;
        let len = list_len(heap, id);
        if index < 0 || index as usize >= len {
            return Err(ErrorKind::Bounds.err(format!("removeAt() index {index} out of bounds for length {len}")));
        }
        Ok((id, index as usize))
    });
    array.drop_with_heap(heap);
    index_value.drop_with_heap(heap);
    let (id, index) = checked?;
    Ok(list_mut(heap, id).remove(index))
}

pub(super) fn slice(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let mut values = args.into_between(heap, "slice", 2, 3)?;
    let end_value = if values.len() == 3 { values.pop() } else { None };
    let start_value = values.pop().expect("arity checked");
    let array = values.pop().expect("arity checked");

    let extracted = list_id(&array, heap, "slice").and_then(|id| {
        let start = as_int(&start_value, heap, "slice")?;
        let len = list_len(heap, id) as i64;
        let end = match &end_value {
            Some(value) => as_int(value, heap, "slice")?,
            None => len,
        };
        let start = start.clamp(0, len) as usize;
        let end = end.clamp(start as i64, len) as usize;
        let copied: Vec<Value> = match heap.get(id) {
            HeapData::List(list) => list.iter().skip(start).take(end - start).map(|v| v.clone_with_heap(heap)).collect(),
            _ => unreachable!("checked by list_id"),
        };
        Ok(copied)
    });
    array.drop_with_heap(heap);
    start_value.drop_with_heap(heap);
    if let Some(value) = end_value {
        value.drop_with_heap(heap);
    }
    heap.alloc_value(HeapData::List(List::new(extracted?)))
}

pub(super) fn concat(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [a, b] = args.into_exact::<2>(heap, "concat")?;
    let extracted = list_id(&a, heap, "concat").and_then(|a_id| {
        let b_id = list_id(&b, heap, "concat")?;
        let mut combined = Vec::new();
        for id in [a_id, b_id] {
            match heap.get(id) {
                HeapData::List(list) => combined.extend(list.iter().map(|v| v.clone_with_heap(heap))),
                _ => unreachable!("checked by list_id"),
            }
        }
        Ok(combined)
    });
    a.drop_with_heap(heap);
    b.drop_with_heap(heap);
    heap.alloc_value(HeapData::List(List::new(extracted?)))
}

pub(super) fn reverse(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [array] = args.into_exact::<1>(heap, "reverse")?;
    match list_id(&array, heap, "reverse") {
        Ok(id) => {
            list_mut(heap, id).reverse();
            // the reversed array is also the result
            Ok(array)
        }
        Err(err) => {
            array.drop_with_heap(heap);
            Err(err)
        }
    }
}

enum SortKey {
    Num(f64),
    Text(String),
}

pub(super) fn sort(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [array] = args.into_exact::<1>(heap, "sort")?;
    let id = match list_id(&array, heap, "sort") {
        Ok(id) => id,
        Err(err) => {
            array.drop_with_heap(heap);
            return Err(err);
        }
    };

    // decorate with owned keys first so the comparator never touches the heap
    let keys: RunResult<Vec<SortKey>> = match heap.get(id) {
        HeapData::List(list) => list
            .iter()
            .map(|item| match item {
                Value::Number(n) => Ok(SortKey::Num(*n)),
                other => match other.as_str(heap) {
                    Some(s) => Ok(SortKey::Text(s.to_owned())),
                    None => Err(ErrorKind::ArgumentMismatch.err(format!(
                        "sort() requires numbers or strings, got {}",
                        other.type_name(heap)
                    ))),
                },
            })
            .collect(),
        _ => unreachable!("checked by list_id"),
    };
    let keys = match keys {
        Ok(keys) => keys,
        Err(err) => {
            array.drop_with_heap(heap);
            return Err(err);
        }
    };
    let mixed = keys.iter().any(|k| matches!(k, SortKey::Num(_))) && keys.iter().any(|k| matches!(k, SortKey::Text(_)));
    if mixed {
        array.drop_with_heap(heap);
        return Err(ErrorKind::ArgumentMismatch.err("sort() requires all numbers or all strings"));
    }

    let items = std::mem::take(list_mut(heap, id).items_mut());
    let mut decorated: Vec<(SortKey, Value)> = keys.into_iter().zip(items).collect();
    decorated.sort_by(|(a, _), (b, _)| match (a, b) {
        (SortKey::Num(x), SortKey::Num(y)) => x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal),
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
        _ => std::cmp::Ordering::Equal,
    });
    *list_mut(heap, id).items_mut() = decorated.into_iter().map(|(_, value)| value).collect();
    Ok(array)
}

pub(super) fn range(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let values = args.into_between(heap, "range", 1, 3)?;
    let numbers: RunResult<Vec<f64>> = values.iter().map(|v| as_number(v, heap, "range")).collect();
    for value in values {
        value.drop_with_heap(heap);
    }
    let numbers = numbers?;

    let (start, end, step) = match numbers.as_slice() {
        [end] => (0.0, *end, 1.0),
        [start, end] => (*start, *end, 1.0),
        [start, end, step] => (*start, *end, *step),
        _ => unreachable!("arity checked"),
    };
    if step == 0.0 || !step.is_finite() {
        return Err(ErrorKind::ArgumentMismatch.err("range() step must be a nonzero finite number"));
    }
    let span = (end - start) / step;
    let count = if span <= 0.0 { 0 } else { span.ceil() as usize };
    if count > MAX_RANGE_LEN {
        return Err(ErrorKind::Resource.err(format!("range() of {count} elements is too large")));
    }
    let items = (0..count)
        .map(|i| Value::Number(start + step * i as f64))
        .collect();
    heap.alloc_value(HeapData::List(List::new(items)))
}

pub(super) fn keys(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [value] = args.into_exact::<1>(heap, "keys")?;
    let extracted = object_id(&value, heap, "keys").map(|id| match heap.get(id) {
        HeapData::Object(object) => object.keys().cloned().collect::<Vec<String>>(),
        _ => unreachable!("checked by object_id"),
    });
    value.drop_with_heap(heap);
    let names = extracted?;
    let mut items = Vec::with_capacity(names.len());
    for name in names {
        match heap.alloc_str(name) {
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

pub(super) fn values(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [value] = args.into_exact::<1>(heap, "values")?;
    let extracted = object_id(&value, heap, "values").map(|id| match heap.get(id) {
        HeapData::Object(object) => object.iter().map(|(_, v)| v.clone_with_heap(heap)).collect::<Vec<Value>>(),
        _ => unreachable!("checked by object_id"),
    });
    value.drop_with_heap(heap);
    heap.alloc_value(HeapData::List(List::new(extracted?)))
}

pub(super) fn delete(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [object_value, key_value] = args.into_exact::<2>(heap, "delete")?;
    let extracted = object_id(&object_value, heap, "delete")
        .and_then(|id| as_string(&key_value, heap, "delete").map(|key| (id, key)));
    key_value.drop_with_heap(heap);
    let result = match extracted {
        Ok((id, key)) => {
            let removed = match heap.get_mut(id) {
                HeapData::Object(object) => object.remove(&key),
                _ => unreachable!("checked by object_id"),
            };
            let was_present = removed.is_some();
            if let Some(old) = removed {
                old.drop_with_heap(heap);
            }
            Ok(Value::Bool(was_present))
        }
        Err(err) => Err(err),
    };
    object_value.drop_with_heap(heap);
    result
}
