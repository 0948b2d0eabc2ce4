//! Binary min-heap keyed by any partially ordered key.
//!
//! Unlike [`std::collections::BinaryHeap`] the key is stored beside the value,
//! so floating-point priorities work without wrapper types. Keys that do not
//! compare (NaN) are treated as equal to everything.

use std::cmp::Ordering;

/// Array-backed binary min-heap.
#[derive(Debug, Clone)]
pub struct MinHeap<K, T> {
    items: Vec<(K, T)>,
}

impl<K, T> Default for MinHeap<K, T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<K: PartialOrd, T> MinHeap<K, T> {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty heap with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Insert `value` with priority `key`.
    pub fn push(&mut self, key: K, value: T) {
        self.items.push((key, value));
        self.sift_up(self.items.len() - 1);
    }

    /// Remove and return the entry with the smallest key.
    pub fn pop(&mut self) -> Option<(K, T)> {
        if self.items.is_empty() {
            return None;
        }
        let last = self.items.len() - 1;
        self.items.swap(0, last);
        let top = self.items.pop();
        if !self.items.is_empty() {
            self.sift_down(0);
        }
        top
    }

    /// Entry with the smallest key.
    pub fn peek(&self) -> Option<(&K, &T)> {
        self.items.first().map(|(k, v)| (k, v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the heap is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.items[a].0.partial_cmp(&self.items[b].0) == Some(Ordering::Less)
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if !self.less(idx, parent) {
                break;
            }
            self.items.swap(idx, parent);
            idx = parent;
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let len = self.items.len();
        loop {
            let left = 2 * idx + 1;
            let right = left + 1;
            let mut smallest = idx;
            if left < len && self.less(left, smallest) {
                smallest = left;
            }
            if right < len && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == idx {
                break;
            }
            self.items.swap(idx, smallest);
            idx = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pops_in_key_order() {
        let mut heap = MinHeap::new();
        heap.push(3.5_f32, "c");
        heap.push(1.0, "a");
        heap.push(2.0, "b");
        assert_eq!(heap.peek(), Some((&1.0, &"a")));
        assert_eq!(heap.pop(), Some((1.0, "a")));
        assert_eq!(heap.pop(), Some((2.0, "b")));
        assert_eq!(heap.pop(), Some((3.5, "c")));
        assert_eq!(heap.pop(), None);
        assert!(heap.is_empty());
    }

    #[test]
    fn tuple_keys_break_ties_lexicographically() {
        let mut heap = MinHeap::with_capacity(4);
        heap.push((5.0_f32, 2.0_f32), 'x');
        heap.push((5.0, 1.0), 'y');
        heap.push((4.0, 9.0), 'z');
        let order: Vec<char> = std::iter::from_fn(|| heap.pop().map(|(_, v)| v)).collect();
        assert_eq!(order, vec!['z', 'y', 'x']);
    }

    proptest! {
        /// Popping everything yields the keys in sorted order.
        #[test]
        fn drains_sorted(keys in proptest::collection::vec(-1000i32..1000, 0..200)) {
            let mut heap = MinHeap::new();
            for (i, k) in keys.iter().enumerate() {
                heap.push(*k, i);
            }
            prop_assert_eq!(heap.len(), keys.len());
            let mut drained = Vec::new();
            while let Some((k, _)) = heap.pop() {
                drained.push(k);
            }
            let mut sorted = keys.clone();
            sorted.sort();
            prop_assert_eq!(drained, sorted);
        }
    }
}
