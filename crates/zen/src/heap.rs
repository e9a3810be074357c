//! Reference-counted arena backing all heap-only runtime values.

use std::{
    cell::Cell,
    collections::BTreeMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::{
    error::{ErrorKind, RunResult, ZenError},
    function::Closure,
    scope::Frame,
    types::{List, Object, PriorityQueue, Set, Str},
    value::Value,
};

/// Remaining-depth budget for data traversals (equality, display, hashing).
/// Keeps deeply nested or cyclic structures from blowing the call stack.
pub(crate) const MAX_DATA_DEPTH: u16 = 128;

/// Unique identifier for values stored inside the heap arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapId(usize);

impl HeapId {
    /// Returns the raw index value.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// HeapData captures every runtime value that must live in the arena.
#[derive(Debug)]
pub(crate) enum HeapData {
    Str(Str),
    List(List),
    Object(Object),
    Closure(Closure),
    Error(ZenError),
    Frame(Frame),
    Set(Set),
    PriorityQueue(PriorityQueue),
}

impl HeapData {
    /// Static variant name, used for heap stats and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::List(_) => "array",
            Self::Object(_) => "object",
            Self::Closure(_) => "function",
            Self::Error(_) => "error",
            Self::Frame(_) => "frame",
            Self::Set(_) => "set",
            Self::PriorityQueue(_) => "priorityqueue",
        }
    }

    /// Collects the heap ids of every child reference, clearing the payload.
    fn dec_ref_ids(&mut self, out: &mut Vec<HeapId>) {
        match self {
            Self::Str(_) | Self::Error(_) => {}
            Self::List(list) => list.dec_ref_ids(out),
            Self::Object(object) => object.dec_ref_ids(out),
            Self::Closure(closure) => closure.dec_ref_ids(out),
            Self::Frame(frame) => frame.dec_ref_ids(out),
            Self::Set(set) => set.dec_ref_ids(out),
            Self::PriorityQueue(queue) => queue.dec_ref_ids(out),
        }
    }
}

/// A single entry inside the heap arena, storing refcount and payload.
///
/// The `data` field is an `Option` so the final `dec_ref` can take the payload
/// out of the slot before recursively releasing children, without unsafe code.
#[derive(Debug)]
struct HeapValue {
    refcount: AtomicUsize,
    data: Option<HeapData>,
}

/// Snapshot of heap state at a point in time.
///
/// `objects_by_type` uses `BTreeMap` for deterministic iteration order, making
/// snapshots suitable for display and comparison without sort overhead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapStats {
    /// Total number of live objects on the heap.
    pub live_objects: usize,
    /// Number of free (recycled) slots available for reuse.
    pub free_slots: usize,
    /// Total heap capacity (live + free).
    pub total_slots: usize,
    /// Breakdown of live objects by variant name.
    pub objects_by_type: BTreeMap<&'static str, usize>,
}

/// Reference-counted arena that backs all heap-only runtime values.
///
/// Uses a free list to reuse slots from freed values, keeping memory usage
/// constant for long-running loops that repeatedly allocate and free values.
/// When a value is freed via `dec_ref`, its slot id is added to the free list;
/// new allocations pop from it when available, otherwise append.
///
/// Reference cycles are not collected while the interpreter runs; dropping the
/// arena reclaims them wholesale at shutdown.
#[derive(Debug)]
pub(crate) struct Heap {
    entries: Vec<Option<HeapValue>>,
    /// Ids of freed slots available for reuse. Populated by `dec_ref`, consumed by `allocate`.
    free_list: Vec<HeapId>,
    /// Upper bound on live entries; `None` means unlimited.
    max_entries: Option<usize>,
    live: usize,
    /// Remaining depth for data structure traversals (equality, display, hash).
    data_depth_remaining: Cell<u16>,
}

impl Heap {
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            max_entries,
            live: 0,
            data_depth_remaining: Cell::new(MAX_DATA_DEPTH),
        }
    }

    /// Allocates a new heap entry with refcount 1.
    pub fn allocate(&mut self, data: HeapData) -> RunResult<HeapId> {
        if let Some(max) = self.max_entries {
            if self.live >= max {
                return Err(ErrorKind::Resource.err(format!("heap limit of {max} values exceeded")));
            }
        }

        let new_entry = HeapValue {
            refcount: AtomicUsize::new(1),
            data: Some(data),
        };
        self.live += 1;

        let id = if let Some(id) = self.free_list.pop() {
            self.entries[id.index()] = Some(new_entry);
            id
        } else {
            let id = HeapId(self.entries.len());
            self.entries.push(Some(new_entry));
            id
        };
        Ok(id)
    }

    /// Allocates and wraps the id in a `Value::Ref`.
    pub fn alloc_value(&mut self, data: HeapData) -> RunResult<Value> {
        Ok(Value::Ref(self.allocate(data)?))
    }

    pub fn alloc_str(&mut self, data: impl Into<String>) -> RunResult<Value> {
        self.alloc_value(HeapData::Str(Str::new(data.into())))
    }

    /// Increments the reference count for an existing heap entry.
    ///
    /// Uses interior mutability for the refcount, so only shared access to the
    /// heap is required.
    ///
    /// # Panics
    /// Panics if the id is invalid or the value has already been freed.
    pub fn inc_ref(&self, id: HeapId) {
        let value = self
            .entries
            .get(id.index())
            .expect("Heap::inc_ref: slot missing")
            .as_ref()
            .expect("Heap::inc_ref: object already freed");
        value.refcount.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrements the reference count and frees the value (plus children) once
    /// it hits zero. Freed slot ids go on the free list for reuse.
    ///
    /// # Panics
    /// Panics if the id is invalid or the value has already been freed.
    pub fn dec_ref(&mut self, id: HeapId) {
        let value = {
            let slot = self.entries.get_mut(id.index()).expect("Heap::dec_ref: slot missing");
            let entry = slot.as_mut().expect("Heap::dec_ref: object already freed");
            let count = entry.refcount.load(Ordering::Relaxed);
            if count > 1 {
                entry.refcount.store(count - 1, Ordering::Relaxed);
                return;
            }
            slot.take().expect("Heap::dec_ref: object already freed")
        };

        self.free_list.push(id);
        self.live -= 1;

        if let Some(mut data) = value.data {
            let mut child_ids = Vec::new();
            data.dec_ref_ids(&mut child_ids);
            drop(data);
            for child_id in child_ids {
                self.dec_ref(child_id);
            }
        }
    }

    /// Returns an immutable reference to the heap data stored at the given id.
    ///
    /// # Panics
    /// Panics if the id is invalid or the value has already been freed.
    #[must_use]
    pub fn get(&self, id: HeapId) -> &HeapData {
        self.entries
            .get(id.index())
            .expect("Heap::get: slot missing")
            .as_ref()
            .expect("Heap::get: object already freed")
            .data
            .as_ref()
            .expect("Heap::get: data currently borrowed")
    }

    /// Mutable counterpart of [`Heap::get`].
    pub fn get_mut(&mut self, id: HeapId) -> &mut HeapData {
        self.entries
            .get_mut(id.index())
            .expect("Heap::get_mut: slot missing")
            .as_mut()
            .expect("Heap::get_mut: object already freed")
            .data
            .as_mut()
            .expect("Heap::get_mut: data currently borrowed")
    }

    /// Current refcount of a live entry, for tests and diagnostics.
    #[cfg(test)]
    pub fn refcount(&self, id: HeapId) -> usize {
        self.entries[id.index()]
            .as_ref()
            .expect("Heap::refcount: object already freed")
            .refcount
            .load(Ordering::Relaxed)
    }

    pub fn live_objects(&self) -> usize {
        self.live
    }

    pub fn stats(&self) -> HeapStats {
        let mut objects_by_type = BTreeMap::new();
        for entry in self.entries.iter().flatten() {
            if let Some(data) = &entry.data {
                *objects_by_type.entry(data.type_name()).or_insert(0) += 1;
            }
        }
        HeapStats {
            live_objects: self.live,
            free_slots: self.free_list.len(),
            total_slots: self.entries.len(),
            objects_by_type,
        }
    }

    /// Enters one level of data traversal, returning false when the budget is
    /// exhausted. Every successful enter must be paired with
    /// [`Heap::data_depth_exit`].
    pub fn data_depth_enter(&self) -> bool {
        let remaining = self.data_depth_remaining.get();
        if remaining == 0 {
            return false;
        }
        self.data_depth_remaining.set(remaining - 1);
        true
    }

    pub fn data_depth_exit(&self) {
        self.data_depth_remaining.set(self.data_depth_remaining.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_reuse_after_free() {
        let mut heap = Heap::new(None);
        let a = heap.allocate(HeapData::Str(Str::new("a".into()))).unwrap();
        heap.dec_ref(a);
        let b = heap.allocate(HeapData::Str(Str::new("b".into()))).unwrap();
        assert_eq!(a, b);
        assert_eq!(heap.live_objects(), 1);
        heap.dec_ref(b);
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn nested_release() {
        let mut heap = Heap::new(None);
        let inner = heap.alloc_str("inner").unwrap();
        let list = heap
            .allocate(HeapData::List(List::new(vec![inner])))
            .unwrap();
        assert_eq!(heap.live_objects(), 2);
        heap.dec_ref(list);
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn refcount_keeps_entry_alive() {
        let mut heap = Heap::new(None);
        let id = heap.allocate(HeapData::Str(Str::new("x".into()))).unwrap();
        heap.inc_ref(id);
        assert_eq!(heap.refcount(id), 2);
        heap.dec_ref(id);
        assert_eq!(heap.refcount(id), 1);
        assert_eq!(heap.live_objects(), 1);
        heap.dec_ref(id);
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn allocation_limit() {
        let mut heap = Heap::new(Some(1));
        let a = heap.alloc_str("a").unwrap();
        assert!(heap.alloc_str("b").is_err());
        a.drop_with_heap(&mut heap);
    }
}
