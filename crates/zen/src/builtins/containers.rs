//! Set and priority-queue builtins. Both containers are opaque to the rest of
//! the language: values go in, values come out, nothing else observes them.

use super::{as_number, Args};
use crate::{
    error::{ErrorKind, RunResult},
    heap::{Heap, HeapData, HeapId},
    types::{PriorityQueue, Set},
    value::{structural_hash, value_eq, Value},
};

fn set_id(value: &Value, heap: &Heap, name: &str) -> RunResult<HeapId> {
    match value {
        Value::Ref(id) if matches!(heap.get(*id), HeapData::Set(_)) => Ok(*id),
        other => Err(ErrorKind::ArgumentMismatch.err(format!(
            "{name}() expected a set, got {}",
            other.type_name(heap)
        ))),
    }
}

fn queue_id(value: &Value, heap: &Heap, name: &str) -> RunResult<HeapId> {
    match value {
        Value::Ref(id) if matches!(heap.get(*id), HeapData::PriorityQueue(_)) => Ok(*id),
        other => Err(ErrorKind::ArgumentMismatch.err(format!(
            "{name}() expected a priority queue, got {}",
            other.type_name(heap)
        ))),
    }
}

/// Finds the bucket position of a structurally equal member, if present.
fn find_member(heap: &Heap, id: HeapId, hash: u64, needle: &Value) -> Option<usize> {
    match heap.get(id) {
        HeapData::Set(set) => set
            .bucket(hash)
            .and_then(|bucket| bucket.iter().position(|member| value_eq(member, needle, heap))),
        _ => unreachable!("checked by set_id"),
    }
}

pub(super) fn set_new(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [] = args.into_exact::<0>(heap, "setNew")?;
    heap.alloc_value(HeapData::Set(Set::default()))
}

pub(super) fn set_add(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [set_value, item] = args.into_exact::<2>(heap, "setAdd")?;
    let id = match set_id(&set_value, heap, "setAdd") {
        Ok(id) => id,
        Err(err) => {
            set_value.drop_with_heap(heap);
            item.drop_with_heap(heap);
            return Err(err);
        }
    };
    let hash = structural_hash(&item, heap);
    let added = if find_member(heap, id, hash, &item).is_some() {
        item.drop_with_heap(heap);
        false
    } else {
        match heap.get_mut(id) {
            HeapData::Set(set) => set.insert_unchecked(hash, item),
            _ => unreachable!("checked by set_id"),
        }
        true
    };
    set_value.drop_with_heap(heap);
    Ok(Value::Bool(added))
}

pub(super) fn set_has(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [set_value, item] = args.into_exact::<2>(heap, "setHas")?;
    let found = set_id(&set_value, heap, "setHas").map(|id| {
        let hash = structural_hash(&item, heap);
        find_member(heap, id, hash, &item).is_some()
    });
    set_value.drop_with_heap(heap);
    item.drop_with_heap(heap);
    Ok(Value::Bool(found?))
}

pub(super) fn set_remove(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [set_value, item] = args.into_exact::<2>(heap, "setRemove")?;
    let found = set_id(&set_value, heap, "setRemove").map(|id| {
        let hash = structural_hash(&item, heap);
        (id, hash, find_member(heap, id, hash, &item))
    });
    set_value.drop_with_heap(heap);
    item.drop_with_heap(heap);
    let (id, hash, position) = found?;
    match position {
        Some(index) => {
            let removed = match heap.get_mut(id) {
                HeapData::Set(set) => set.remove_at(hash, index),
                _ => unreachable!("checked by set_id"),
            };
            if let Some(removed) = removed {
                removed.drop_with_heap(heap);
            }
            Ok(Value::Bool(true))
        }
        None => Ok(Value::Bool(false)),
    }
}

pub(super) fn set_size(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [set_value] = args.into_exact::<1>(heap, "setSize")?;
    let size = set_id(&set_value, heap, "setSize").map(|id| match heap.get(id) {
        HeapData::Set(set) => set.len(),
        _ => unreachable!("checked by set_id"),
    });
    set_value.drop_with_heap(heap);
    Ok(Value::Number(size? as f64))
}

pub(super) fn pq_new(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [] = args.into_exact::<0>(heap, "pqNew")?;
    heap.alloc_value(HeapData::PriorityQueue(PriorityQueue::default()))
}

pub(super) fn pq_push(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [queue_value, priority_value, item] = args.into_exact::<3>(heap, "pqPush")?;
    let checked = queue_id(&queue_value, heap, "pqPush")
        .and_then(|id| as_number(&priority_value, heap, "pqPush").map(|priority| (id, priority)));
    queue_value.drop_with_heap(heap);
    priority_value.drop_with_heap(heap);
    match checked {
        Ok((id, priority)) => {
            match heap.get_mut(id) {
                HeapData::PriorityQueue(queue) => queue.push(priority, item),
                _ => unreachable!("checked by queue_id"),
            }
            Ok(Value::Null)
        }
        Err(err) => {
            item.drop_with_heap(heap);
            Err(err)
        }
    }
}

pub(super) fn pq_pop(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [queue_value] = args.into_exact::<1>(heap, "pqPop")?;
    let id = queue_id(&queue_value, heap, "pqPop");
    queue_value.drop_with_heap(heap);
    let popped = match heap.get_mut(id?) {
        HeapData::PriorityQueue(queue) => queue.pop(),
        _ => unreachable!("checked by queue_id"),
    };
    Ok(popped.map_or(Value::Null, |(_, value)| value))
}

pub(super) fn pq_peek(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [queue_value] = args.into_exact::<1>(heap, "pqPeek")?;
    let peeked = queue_id(&queue_value, heap, "pqPeek").map(|id| match heap.get(id) {
        HeapData::PriorityQueue(queue) => queue.peek().map(|(_, value)| value.clone_with_heap(heap)),
        _ => unreachable!("checked by queue_id"),
    });
    queue_value.drop_with_heap(heap);
    Ok(peeked?.unwrap_or(Value::Null))
}

pub(super) fn pq_size(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [queue_value] = args.into_exact::<1>(heap, "pqSize")?;
    let size = queue_id(&queue_value, heap, "pqSize").map(|id| match heap.get(id) {
        HeapData::PriorityQueue(queue) => queue.len(),
        _ => unreachable!("checked by queue_id"),
    });
    queue_value.drop_with_heap(heap);
    Ok(Value::Number(size? as f64))
}
