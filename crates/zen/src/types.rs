//! Container payloads stored in the heap arena.

use ahash::AHashMap;
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::{
    heap::HeapId,
    value::{forget_into_ref_ids, Value},
};

/// An immutable string. The byte length is cached by the backing `String`.
///
/// Strings are not revalidated as UTF-8 beyond what the host type enforces;
/// all index-based operations on them are byte-indexed.
#[derive(Debug)]
pub(crate) struct Str {
    data: String,
}

impl Str {
    pub fn new(data: String) -> Self {
        Self { data }
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    /// Byte length of the string.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A mutable ordered sequence of values. Growth is geometric via `Vec`.
#[derive(Debug, Default)]
pub(crate) struct List {
    items: Vec<Value>,
}

impl List {
    pub fn new(items: Vec<Value>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Replaces the element at `index`, returning the previous value.
    /// The caller must release the returned value.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds; callers bounds-check first.
    pub fn set(&mut self, index: usize, value: Value) -> Value {
        std::mem::replace(&mut self.items[index], value)
    }

    pub fn push(&mut self, value: Value) {
        self.items.push(value);
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.items.pop()
    }

    pub fn insert(&mut self, index: usize, value: Value) {
        self.items.insert(index, value);
    }

    pub fn remove(&mut self, index: usize) -> Value {
        self.items.remove(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn items_mut(&mut self) -> &mut Vec<Value> {
        &mut self.items
    }

    pub fn reverse(&mut self) {
        self.items.reverse();
    }

    pub(crate) fn dec_ref_ids(&mut self, out: &mut Vec<HeapId>) {
        for value in self.items.drain(..) {
            forget_into_ref_ids(value, out);
        }
    }
}

/// An insertion-ordered mapping with unique string keys.
#[derive(Debug, Default)]
pub(crate) struct Object {
    entries: IndexMap<String, Value>,
}

impl Object {
    pub fn new(entries: IndexMap<String, Value>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Inserts or updates a key, returning the previous value at that key.
    /// The caller must release the returned value.
    pub fn set(&mut self, key: String, value: Value) -> Option<Value> {
        self.entries.insert(key, value)
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    pub(crate) fn dec_ref_ids(&mut self, out: &mut Vec<HeapId>) {
        for (_, value) in self.entries.drain(..) {
            forget_into_ref_ids(value, out);
        }
    }
}

/// An opaque set keyed by structural hash, with equality-checked buckets.
///
/// Membership semantics follow structural equality, so collisions are resolved
/// at the call site (which has heap access) rather than here.
#[derive(Debug, Default)]
pub(crate) struct Set {
    buckets: AHashMap<u64, SmallVec<[Value; 1]>>,
    len: usize,
}

impl Set {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket(&self, hash: u64) -> Option<&SmallVec<[Value; 1]>> {
        self.buckets.get(&hash)
    }

    /// Appends to the bucket for `hash`. The caller has already verified the
    /// value is not structurally present.
    pub fn insert_unchecked(&mut self, hash: u64, value: Value) {
        self.buckets.entry(hash).or_default().push(value);
        self.len += 1;
    }

    /// Removes the bucket entry at `index`, returning the stored value.
    pub fn remove_at(&mut self, hash: u64, index: usize) -> Option<Value> {
        let bucket = self.buckets.get_mut(&hash)?;
        if index >= bucket.len() {
            return None;
        }
        let value = bucket.remove(index);
        if bucket.is_empty() {
            self.buckets.remove(&hash);
        }
        self.len -= 1;
        Some(value)
    }

    pub(crate) fn dec_ref_ids(&mut self, out: &mut Vec<HeapId>) {
        for (_, bucket) in self.buckets.drain() {
            for value in bucket {
                forget_into_ref_ids(value, out);
            }
        }
        self.len = 0;
    }
}

/// An opaque binary min-heap of `(priority, value)` pairs.
#[derive(Debug, Default)]
pub(crate) struct PriorityQueue {
    items: Vec<(f64, Value)>,
}

impl PriorityQueue {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, priority: f64, value: Value) {
        self.items.push((priority, value));
        self.sift_up(self.items.len() - 1);
    }

    /// Removes and returns the entry with the smallest priority.
    pub fn pop(&mut self) -> Option<(f64, Value)> {
        if self.items.is_empty() {
            return None;
        }
        let last = self.items.len() - 1;
        self.items.swap(0, last);
        let entry = self.items.pop();
        if !self.items.is_empty() {
            self.sift_down(0);
        }
        entry
    }

    pub fn peek(&self) -> Option<&(f64, Value)> {
        self.items.first()
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.items[index].0 >= self.items[parent].0 {
                break;
            }
            self.items.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.items.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;
            if left < len && self.items[left].0 < self.items[smallest].0 {
                smallest = left;
            }
            if right < len && self.items[right].0 < self.items[smallest].0 {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.items.swap(index, smallest);
            index = smallest;
        }
    }

    pub(crate) fn dec_ref_ids(&mut self, out: &mut Vec<HeapId>) {
        for (_, value) in self.items.drain(..) {
            forget_into_ref_ids(value, out);
        }
    }
}
