//! Property-based tests for the priority queue.

use git_utils::collections::PriorityQueue;
use proptest::prelude::*;

proptest! {
    /// Draining a heap yields a non-decreasing sequence; equal keys keep
    /// their insertion order.
    #[test]
    fn heap_drains_sorted_and_stable(keys in proptest::collection::vec(0u8..8, 0..64)) {
        let mut pq = PriorityQueue::new(|a: &(u8, usize), b: &(u8, usize)| a.0.cmp(&b.0));
        for (i, &k) in keys.iter().enumerate() {
            pq.put((k, i));
        }

        let mut drained = Vec::new();
        while let Some(item) = pq.get() {
            drained.push(item);
        }

        let mut expected: Vec<(u8, usize)> = keys.iter().copied().zip(0..).collect();
        expected.sort_by_key(|&(k, _)| k);
        prop_assert_eq!(drained, expected);
    }

    /// A stack drains in reverse insertion order, and `reverse()` flips it.
    #[test]
    fn stack_order_and_reverse(items in proptest::collection::vec(any::<i32>(), 0..32)) {
        let mut stack = PriorityQueue::new_lifo();
        for &x in &items {
            stack.put(x);
        }
        let mut drained = Vec::new();
        while let Some(x) = stack.get() {
            drained.push(x);
        }
        let mut reversed = items.clone();
        reversed.reverse();
        prop_assert_eq!(drained, reversed);

        for &x in &items {
            stack.put(x);
        }
        stack.reverse();
        let mut drained = Vec::new();
        while let Some(x) = stack.get() {
            drained.push(x);
        }
        prop_assert_eq!(drained, items);
    }

    /// `replace` behaves like `get` followed by `put`.
    #[test]
    fn replace_matches_get_then_put(
        keys in proptest::collection::vec(0u8..16, 1..32),
        extra in 0u8..16,
    ) {
        let cmp = |a: &(u8, usize), b: &(u8, usize)| a.0.cmp(&b.0);
        let mut replaced = PriorityQueue::new(cmp);
        let mut reference = PriorityQueue::new(cmp);
        for (i, &k) in keys.iter().enumerate() {
            replaced.put((k, i));
            reference.put((k, i));
        }

        let a = replaced.replace((extra, keys.len()));
        let b = reference.get();
        reference.put((extra, keys.len()));
        prop_assert_eq!(a, b);

        while let Some(x) = reference.get() {
            prop_assert_eq!(replaced.get(), Some(x));
        }
        prop_assert!(replaced.is_empty());
    }
}
