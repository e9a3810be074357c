//! Lexical scope frames.
//!
//! Frames live on the heap so a closure extends the lifetime of its whole
//! defining chain through plain reference counting: each frame owns its
//! bindings' values and one reference to its parent frame.

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::{
    error::RunResult,
    function::FunctionId,
    heap::{Heap, HeapData, HeapId},
    value::{forget_into_ref_ids, Value},
};

/// One level of the lexical binding chain: variables, user-defined functions,
/// and a strong parent reference.
#[derive(Debug)]
pub(crate) struct Frame {
    vars: IndexMap<String, Value>,
    funcs: AHashMap<String, FunctionId>,
    parent: Option<HeapId>,
}

impl Frame {
    pub fn new(parent: Option<HeapId>) -> Self {
        Self {
            vars: IndexMap::new(),
            funcs: AHashMap::new(),
            parent,
        }
    }

    pub fn parent(&self) -> Option<HeapId> {
        self.parent
    }

    pub fn vars(&self) -> &IndexMap<String, Value> {
        &self.vars
    }

    pub(crate) fn dec_ref_ids(&mut self, out: &mut Vec<HeapId>) {
        for (_, value) in self.vars.drain(..) {
            forget_into_ref_ids(value, out);
        }
        self.funcs.clear();
        if let Some(parent) = self.parent.take() {
            out.push(parent);
        }
    }
}

/// Borrows the frame stored at `id`.
///
/// # Panics
/// Panics if `id` does not refer to a frame; frame ids never escape the
/// evaluator, so a mismatch is an interpreter bug.
pub(crate) fn frame(heap: &Heap, id: HeapId) -> &Frame {
    match heap.get(id) {
        HeapData::Frame(frame) => frame,
        other => panic!("expected a scope frame, found {}", other.type_name()),
    }
}

fn frame_mut(heap: &mut Heap, id: HeapId) -> &mut Frame {
    match heap.get_mut(id) {
        HeapData::Frame(frame) => frame,
        other => panic!("expected a scope frame, found {}", other.type_name()),
    }
}

/// Allocates a fresh frame whose parent is `parent` (one reference is taken).
pub(crate) fn push_frame(heap: &mut Heap, parent: Option<HeapId>) -> RunResult<HeapId> {
    if let Some(parent_id) = parent {
        heap.inc_ref(parent_id);
    }
    match heap.allocate(HeapData::Frame(Frame::new(parent))) {
        Ok(id) => Ok(id),
        Err(err) => {
            if let Some(parent_id) = parent {
                heap.dec_ref(parent_id);
            }
            Err(err)
        }
    }
}

/// Releases one reference to the frame; the last release frees its bindings
/// and the reference it holds on its parent.
pub(crate) fn pop_frame(heap: &mut Heap, id: HeapId) {
    heap.dec_ref(id);
}

/// Defines `name` in exactly this frame, overwriting any existing binding.
pub(crate) fn define_var(heap: &mut Heap, frame_id: HeapId, name: impl Into<String>, value: Value) {
    let old = frame_mut(heap, frame_id).vars.insert(name.into(), value);
    if let Some(old) = old {
        old.drop_with_heap(heap);
    }
}

/// Assigns `name` in the nearest frame of the chain that defines it.
///
/// Returns ownership of `value` when no frame defines the name, so the caller
/// decides whether to create the binding.
pub(crate) fn assign_var(heap: &mut Heap, frame_id: HeapId, name: &str, value: Value) -> Option<Value> {
    let mut current = Some(frame_id);
    while let Some(id) = current {
        let fr = frame(heap, id);
        if fr.vars.contains_key(name) {
            let old = frame_mut(heap, id)
                .vars
                .insert(name.to_owned(), value)
                .expect("binding checked above");
            old.drop_with_heap(heap);
            return None;
        }
        current = fr.parent();
    }
    Some(value)
}

/// Looks `name` up along the chain, returning a fresh reference to the value.
pub(crate) fn lookup_var(heap: &Heap, frame_id: HeapId, name: &str) -> Option<Value> {
    let mut current = Some(frame_id);
    while let Some(id) = current {
        let fr = frame(heap, id);
        if let Some(value) = fr.vars.get(name) {
            return Some(value.clone_with_heap(heap));
        }
        current = fr.parent();
    }
    None
}

/// Records a user function definition in exactly this frame.
pub(crate) fn define_func(heap: &mut Heap, frame_id: HeapId, name: impl Into<String>, function: FunctionId) {
    frame_mut(heap, frame_id).funcs.insert(name.into(), function);
}

/// Finds a user function along the chain. Returns the function id together
/// with the id of the frame holding the definition (the closure's capture).
pub(crate) fn lookup_func(heap: &Heap, frame_id: HeapId, name: &str) -> Option<(FunctionId, HeapId)> {
    let mut current = Some(frame_id);
    while let Some(id) = current {
        let fr = frame(heap, id);
        if let Some(function) = fr.funcs.get(name) {
            return Some((*function, id));
        }
        current = fr.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_lookup_walks_chain() {
        let mut heap = Heap::new(None);
        let outer = push_frame(&mut heap, None).unwrap();
        let inner = push_frame(&mut heap, Some(outer)).unwrap();
        define_var(&mut heap, outer, "x", Value::Number(1.0));

        let found = lookup_var(&heap, inner, "x").unwrap();
        assert!(matches!(found, Value::Number(n) if n == 1.0));
        found.drop_with_heap(&mut heap);

        assert!(lookup_var(&heap, inner, "missing").is_none());
        pop_frame(&mut heap, inner);
        pop_frame(&mut heap, outer);
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn assignment_targets_defining_frame() {
        let mut heap = Heap::new(None);
        let outer = push_frame(&mut heap, None).unwrap();
        let inner = push_frame(&mut heap, Some(outer)).unwrap();
        define_var(&mut heap, outer, "n", Value::Number(0.0));

        assert!(assign_var(&mut heap, inner, "n", Value::Number(5.0)).is_none());
        let seen = lookup_var(&heap, outer, "n").unwrap();
        assert!(matches!(seen, Value::Number(n) if n == 5.0));
        seen.drop_with_heap(&mut heap);

        // unknown names come back to the caller
        let returned = assign_var(&mut heap, inner, "fresh", Value::Bool(true));
        assert!(returned.is_some());
        returned.unwrap().drop_with_heap(&mut heap);

        pop_frame(&mut heap, inner);
        pop_frame(&mut heap, outer);
        assert_eq!(heap.live_objects(), 0);
    }

    #[test]
    fn closure_reference_outlives_pop() {
        let mut heap = Heap::new(None);
        let outer = push_frame(&mut heap, None).unwrap();
        define_var(&mut heap, outer, "kept", Value::Number(7.0));

        // simulate a closure retaining the frame
        heap.inc_ref(outer);
        pop_frame(&mut heap, outer);
        let still = lookup_var(&heap, outer, "kept").unwrap();
        assert!(matches!(still, Value::Number(n) if n == 7.0));
        still.drop_with_heap(&mut heap);

        heap.dec_ref(outer);
        assert_eq!(heap.live_objects(), 0);
    }
}
