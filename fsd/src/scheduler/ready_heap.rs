//! Virtual-runtime ordered ready pool

use thiserror::Error;

use super::JobId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeapError {
    #[error("ready heap is full")]
    Full,
}

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    job: JobId,
    vruntime: u64,
    seq: u64,
}

impl HeapEntry {
    /// Ordering key: vruntime first, ties break by arrival into the pool.
    fn key(&self) -> (u64, u64) {
        (self.vruntime, self.seq)
    }
}

/// Binary min-heap keyed by `vruntime`, with a fixed capacity.
///
/// The vruntime key is snapshotted at insert time. That is sound because
/// a job's vruntime only moves while the job is *outside* the heap:
/// eviction charges the running interval before reinsertion, and nothing
/// else touches it. Ties order by an insertion sequence number, so jobs
/// with equal vruntime leave the pool in the order they entered it.
#[derive(Debug)]
pub struct ReadyHeap {
    entries: Vec<HeapEntry>,
    capacity: usize,
    next_seq: u64,
}

impl ReadyHeap {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Place the job at the next free slot and sift it up. A full heap
    /// rejects the insert; the caller leaves the job unqueued so a later
    /// admission scan retries it.
    pub fn insert(&mut self, job: JobId, vruntime: u64) -> Result<(), HeapError> {
        if self.entries.len() >= self.capacity {
            return Err(HeapError::Full);
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(HeapEntry { job, vruntime, seq });
        self.sift_up(self.entries.len() - 1);
        Ok(())
    }

    /// Job with the smallest vruntime, without removing it.
    pub fn peek_min(&self) -> Option<JobId> {
        self.entries.first().map(|e| e.job)
    }

    /// Remove and return the job with the smallest vruntime.
    pub fn pop_min(&mut self) -> Option<JobId> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let min = self.entries.pop().map(|e| e.job);
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        min
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.entries[i].key() < self.entries[parent].key() {
                self.entries.swap(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * i + 1;
            let right = 2 * i + 2;
            let mut smallest = i;

            if left < len && self.entries[left].key() < self.entries[smallest].key() {
                smallest = left;
            }
            if right < len && self.entries[right].key() < self.entries[smallest].key() {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.entries.swap(i, smallest);
            i = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pop_returns_smallest_vruntime() {
        let mut heap = ReadyHeap::new(8);
        heap.insert(0, 300).unwrap();
        heap.insert(1, 100).unwrap();
        heap.insert(2, 200).unwrap();

        assert_eq!(heap.peek_min(), Some(1));
        assert_eq!(heap.pop_min(), Some(1));
        assert_eq!(heap.pop_min(), Some(2));
        assert_eq!(heap.pop_min(), Some(0));
        assert_eq!(heap.pop_min(), None);
    }

    #[test]
    fn test_ties_leave_in_arrival_order() {
        let mut heap = ReadyHeap::new(8);
        heap.insert(5, 42).unwrap();
        heap.insert(9, 42).unwrap();
        heap.insert(7, 42).unwrap();

        assert_eq!(heap.pop_min(), Some(5));
        assert_eq!(heap.pop_min(), Some(9));
        assert_eq!(heap.pop_min(), Some(7));
    }

    #[test]
    fn test_full_heap_rejects_insert() {
        let mut heap = ReadyHeap::new(2);
        heap.insert(0, 1).unwrap();
        heap.insert(1, 2).unwrap();
        assert_eq!(heap.insert(2, 3), Err(HeapError::Full));
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn test_reinsert_after_pop() {
        let mut heap = ReadyHeap::new(4);
        heap.insert(0, 10).unwrap();
        heap.insert(1, 20).unwrap();

        assert_eq!(heap.pop_min(), Some(0));
        // back with a larger key after running a while
        heap.insert(0, 35).unwrap();

        assert_eq!(heap.pop_min(), Some(1));
        assert_eq!(heap.pop_min(), Some(0));
    }

    proptest! {
        #[test]
        fn prop_pop_sequence_is_sorted(vruntimes in proptest::collection::vec(0u64..10_000, 0..32)) {
            let mut heap = ReadyHeap::new(32);
            for (job, &v) in vruntimes.iter().enumerate() {
                heap.insert(job, v).unwrap();
            }

            let mut popped = Vec::new();
            while let Some(job) = heap.pop_min() {
                popped.push(vruntimes[job]);
            }

            prop_assert_eq!(popped.len(), vruntimes.len());
            let mut sorted = popped.clone();
            sorted.sort_unstable();
            prop_assert_eq!(popped, sorted);
        }
    }
}
