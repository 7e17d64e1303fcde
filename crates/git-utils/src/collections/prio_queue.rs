use std::cmp::Ordering;
use std::fmt;

type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering>;

/// An entry in the priority queue, tracking insertion order for stability.
#[derive(Debug)]
struct PrioQueueEntry<T> {
    ctr: u64,
    data: T,
}

/// A priority queue that can operate as either a min-heap (with a comparator)
/// or a LIFO stack (without a comparator).
///
/// Graph walks use the heap mode to visit commits newest-first and the stack
/// mode for depth-first sweeps. The queue is stable: items that compare equal
/// come out in insertion order.
pub struct PriorityQueue<T> {
    array: Vec<PrioQueueEntry<T>>,
    compare: Option<Comparator<T>>,
    insertion_ctr: u64,
}

impl<T> PriorityQueue<T> {
    /// Create a new priority queue with a comparison function (min-heap mode).
    /// Items that compare as `Less` are extracted first.
    pub fn new(compare: impl Fn(&T, &T) -> Ordering + 'static) -> Self {
        Self {
            array: Vec::new(),
            compare: Some(Box::new(compare)),
            insertion_ctr: 0,
        }
    }

    /// Create a new priority queue in LIFO (stack) mode.
    pub fn new_lifo() -> Self {
        Self {
            array: Vec::new(),
            compare: None,
            insertion_ctr: 0,
        }
    }

    /// Whether this queue orders by a comparator rather than as a stack.
    pub fn is_heap(&self) -> bool {
        self.compare.is_some()
    }

    /// Compare two slots; ties fall back to insertion order.
    fn compare_entries(&self, i: usize, j: usize) -> Ordering {
        match self.compare {
            Some(ref cmp) => cmp(&self.array[i].data, &self.array[j].data)
                .then_with(|| self.array[i].ctr.cmp(&self.array[j].ctr)),
            None => Ordering::Equal,
        }
    }

    fn next_entry(&mut self, data: T) -> PrioQueueEntry<T> {
        let ctr = self.insertion_ctr;
        self.insertion_ctr += 1;
        PrioQueueEntry { ctr, data }
    }

    /// Add an item to the queue.
    pub fn put(&mut self, thing: T) {
        let entry = self.next_entry(thing);
        self.array.push(entry);

        if self.compare.is_none() {
            return;
        }

        let mut ix = self.array.len() - 1;
        while ix > 0 {
            let parent = (ix - 1) / 2;
            if self.compare_entries(parent, ix) != Ordering::Greater {
                break;
            }
            self.array.swap(parent, ix);
            ix = parent;
        }
    }

    /// Extract the highest-priority item (smallest per comparator) or the
    /// most recently added item in LIFO mode.
    pub fn get(&mut self) -> Option<T> {
        if self.compare.is_none() || self.array.len() <= 1 {
            return self.array.pop().map(|entry| entry.data);
        }

        let last = self.array.len() - 1;
        self.array.swap(0, last);
        let result = self.array.pop().map(|entry| entry.data);
        self.sift_down_root();
        result
    }

    /// The item `get()` would return, without removing it.
    pub fn peek(&self) -> Option<&T> {
        if self.compare.is_none() {
            self.array.last().map(|entry| &entry.data)
        } else {
            self.array.first().map(|entry| &entry.data)
        }
    }

    /// Remove the item `get()` would return and insert `thing` in one pass.
    ///
    /// On an empty queue this is a plain `put` and returns `None`.
    pub fn replace(&mut self, thing: T) -> Option<T> {
        if self.array.is_empty() {
            self.put(thing);
            return None;
        }

        let entry = self.next_entry(thing);
        if self.compare.is_none() {
            let top = self.array.len() - 1;
            let old = std::mem::replace(&mut self.array[top], entry);
            return Some(old.data);
        }

        let old = std::mem::replace(&mut self.array[0], entry);
        self.sift_down_root();
        Some(old.data)
    }

    /// Sift the root element down to restore heap property.
    fn sift_down_root(&mut self) {
        let mut ix = 0;
        loop {
            let left = ix * 2 + 1;
            if left >= self.array.len() {
                break;
            }
            let right = left + 1;
            let child = if right < self.array.len()
                && self.compare_entries(left, right) != Ordering::Less
            {
                right
            } else {
                left
            };

            if self.compare_entries(ix, child) != Ordering::Greater {
                break;
            }

            self.array.swap(child, ix);
            ix = child;
        }
    }

    /// Reverse the order of a LIFO queue so the next `get()` calls return
    /// items in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the queue has a comparator.
    pub fn reverse(&mut self) {
        assert!(
            self.compare.is_none(),
            "reverse() only valid on LIFO queues"
        );
        self.array.reverse();
    }

    /// Iterate over queued items in storage order (not priority order).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.array.iter().map(|entry| &entry.data)
    }

    /// Get the number of items in the queue.
    pub fn len(&self) -> usize {
        self.array.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// Remove all items.
    pub fn clear(&mut self) {
        self.array.clear();
        self.insertion_ctr = 0;
    }
}

impl<T: fmt::Debug> fmt::Debug for PriorityQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityQueue")
            .field("heap", &self.is_heap())
            .field("len", &self.array.len())
            .finish()
    }
}
