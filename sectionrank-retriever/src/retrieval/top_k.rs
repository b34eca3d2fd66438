//! Bounded top-K selection.
//!
//! [`BoundedHeap`] keeps the `capacity` greatest items seen so far under a
//! caller-supplied comparator. It is a binary min-heap whose root is the
//! weakest retained item, so each push costs `O(log k)` and the full candidate
//! set is never sorted.

use std::cmp::Ordering;

pub struct BoundedHeap<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    capacity: usize,
    items: Vec<T>,
    compare: F,
}

impl<T, F> BoundedHeap<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    /// `compare(a, b) == Greater` means `a` ranks above `b`.
    pub fn new(capacity: usize, compare: F) -> Self {
        Self {
            capacity,
            items: Vec::with_capacity(capacity),
            compare,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The weakest retained item, the next one to be evicted.
    pub fn peek_min(&self) -> Option<&T> {
        self.items.first()
    }

    /// Offer an item. Returns `true` if it was retained.
    pub fn push(&mut self, item: T) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.items.len() < self.capacity {
            self.items.push(item);
            self.sift_up(self.items.len() - 1);
            return true;
        }
        if (self.compare)(&item, &self.items[0]) != Ordering::Greater {
            return false;
        }
        self.items[0] = item;
        self.sift_down(0);
        true
    }

    /// Consume the heap, returning retained items best first.
    pub fn into_sorted_vec(self) -> Vec<T> {
        let Self {
            mut items, compare, ..
        } = self;
        items.sort_by(|a, b| compare(b, a));
        items
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if (self.compare)(&self.items[index], &self.items[parent]) == Ordering::Less {
                self.items.swap(index, parent);
                index = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.items.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;
            if left < len
                && (self.compare)(&self.items[left], &self.items[smallest]) == Ordering::Less
            {
                smallest = left;
            }
            if right < len
                && (self.compare)(&self.items[right], &self.items[smallest]) == Ordering::Less
            {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.items.swap(index, smallest);
            index = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_greatest_items() {
        let mut heap = BoundedHeap::new(3, |a: &i32, b: &i32| a.cmp(b));
        for value in [5, 1, 9, 3, 7, 2, 8] {
            heap.push(value);
        }
        assert_eq!(heap.len(), 3);
        assert_eq!(heap.peek_min(), Some(&7));
        assert_eq!(heap.into_sorted_vec(), vec![9, 8, 7]);
    }

    #[test]
    fn test_fewer_items_than_capacity() {
        let mut heap = BoundedHeap::new(10, |a: &i32, b: &i32| a.cmp(b));
        heap.push(2);
        heap.push(4);
        assert_eq!(heap.into_sorted_vec(), vec![4, 2]);
    }

    #[test]
    fn test_zero_capacity_retains_nothing() {
        let mut heap = BoundedHeap::new(0, |a: &i32, b: &i32| a.cmp(b));
        assert!(!heap.push(1));
        assert!(heap.is_empty());
    }

    #[test]
    fn test_equal_items_do_not_evict() {
        // (score, label): only the score is compared
        let mut heap = BoundedHeap::new(1, |a: &(u8, char), b: &(u8, char)| a.0.cmp(&b.0));
        assert!(heap.push((5, 'a')));
        assert!(!heap.push((5, 'b')));
        assert_eq!(heap.into_sorted_vec(), vec![(5, 'a')]);
    }

    #[test]
    fn test_custom_comparator_reverses_order() {
        let mut heap = BoundedHeap::new(2, |a: &i32, b: &i32| b.cmp(a));
        for value in [5, 1, 9, 3] {
            heap.push(value);
        }
        assert_eq!(heap.into_sorted_vec(), vec![1, 3]);
    }

    #[test]
    fn test_matches_full_sort() {
        let values: Vec<i64> = (0..200).map(|i| (i * 7919) % 211).collect();
        for k in [1, 5, 17, 200, 300] {
            let mut heap = BoundedHeap::new(k, |a: &i64, b: &i64| a.cmp(b));
            for &value in &values {
                heap.push(value);
            }
            let mut expected = values.clone();
            expected.sort_by(|a, b| b.cmp(a));
            expected.truncate(k);
            assert_eq!(heap.into_sorted_vec(), expected);
        }
    }
}
