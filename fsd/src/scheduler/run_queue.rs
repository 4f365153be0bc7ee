//! Bounded circular run queue

use thiserror::Error;

use super::JobId;

/// Queue misuse conditions. Reaching either inside a tick indicates an
/// internal invariant slipped; callers log and carry on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("run queue is full")]
    Full,

    #[error("run queue is empty")]
    Empty,
}

/// FIFO of the jobs currently occupying CPU slots, in admission order.
///
/// Storage is `ncpu + 1` slots: the one slack slot lets full and empty be
/// told apart from the head/tail indices alone, so the queue holds at
/// most `ncpu` jobs.
#[derive(Debug)]
pub struct RunQueue {
    slots: Vec<JobId>,
    head: usize,
    tail: usize,
}

impl RunQueue {
    /// Queue with room for `ncpu` running jobs.
    pub fn new(ncpu: usize) -> Self {
        Self {
            slots: vec![0; ncpu + 1],
            head: 0,
            tail: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn is_full(&self) -> bool {
        (self.tail + 1) % self.slots.len() == self.head
    }

    pub fn len(&self) -> usize {
        (self.tail + self.slots.len() - self.head) % self.slots.len()
    }

    /// Append at the tail, preserving admission order.
    pub fn enqueue(&mut self, job: JobId) -> Result<(), QueueError> {
        if self.is_full() {
            return Err(QueueError::Full);
        }
        self.slots[self.tail] = job;
        self.tail = (self.tail + 1) % self.slots.len();
        Ok(())
    }

    /// Remove and return the head.
    pub fn dequeue(&mut self) -> Result<JobId, QueueError> {
        if self.is_empty() {
            return Err(QueueError::Empty);
        }
        let job = self.slots[self.head];
        self.head = (self.head + 1) % self.slots.len();
        Ok(job)
    }
}
