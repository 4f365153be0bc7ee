//! Scheduler core: per-tick admission, eviction, promotion, and drain
//!
//! One pass runs once per quantum, entirely under the table lock:
//! admission first so new jobs compete on equal footing with resumed
//! ones, then eviction so vacated slots are visible to the ready pool
//! within the same tick, then promotion into the freed slots.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use jobtable::{JobTable, MAX_JOBS, TableView};
use tracing::{debug, info, warn};

use super::process::ProcessControl;
use super::ready_heap::{HeapError, ReadyHeap};
use super::run_queue::{QueueError, RunQueue};
use super::tick::TickDriver;
use crate::error::SchedError;

/// Counters for one scheduling pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub admitted: usize,
    pub evicted: usize,
    pub promoted: usize,
    pub dropped_completed: usize,
}

/// The scheduling state machine.
///
/// Owns the two slot-tracking structures; both hold table indices, never
/// record copies. The shared table stays the single owner of every job.
pub struct Scheduler {
    ncpu: usize,
    run_queue: RunQueue,
    ready_heap: ReadyHeap,
    control: Box<dyn ProcessControl>,
    shutdown: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(ncpu: u32, control: Box<dyn ProcessControl>, shutdown: Arc<AtomicBool>) -> Self {
        debug!(ncpu, "Scheduler::new: called");
        let ncpu = ncpu as usize;
        Self {
            ncpu,
            run_queue: RunQueue::new(ncpu),
            ready_heap: ReadyHeap::new(MAX_JOBS),
            control,
            shutdown,
        }
    }

    /// Jobs currently holding a CPU slot
    pub fn running_count(&self) -> usize {
        self.run_queue.len()
    }

    /// Jobs waiting in the ready pool
    pub fn ready_count(&self) -> usize {
        self.ready_heap.len()
    }

    /// Termination precondition: shutdown was requested and every job the
    /// scheduler took responsibility for has left both structures.
    pub fn drained(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst) && self.run_queue.is_empty() && self.ready_heap.is_empty()
    }

    /// The control loop. Returns `Ok(())` exactly once, when the drain
    /// precondition holds after a shutdown request; everything else is a
    /// fatal error. Teardown (unmap, close) happens when the caller drops
    /// the table.
    pub fn run(&mut self, table: &mut JobTable, ticker: &mut dyn TickDriver) -> Result<(), SchedError> {
        info!(ncpu = self.ncpu, table = table.name(), "scheduler loop starting");

        loop {
            ticker.wait()?;

            let drained = table.with_lock(|view| -> Result<bool, SchedError> {
                if self.drained() {
                    return Ok(true);
                }
                let now_ms = Utc::now().timestamp_millis();
                let outcome = self.tick(view, now_ms)?;
                debug!(
                    admitted = outcome.admitted,
                    evicted = outcome.evicted,
                    promoted = outcome.promoted,
                    dropped = outcome.dropped_completed,
                    running = self.run_queue.len(),
                    ready = self.ready_heap.len(),
                    "tick complete"
                );
                Ok(false)
            })??;

            if drained {
                info!("shutdown requested and all work drained, terminating");
                return Ok(());
            }
        }
    }

    /// One scheduling pass over the locked table.
    pub fn tick(&mut self, view: &mut TableView<'_>, now_ms: i64) -> Result<TickOutcome, SchedError> {
        let mut outcome = TickOutcome::default();

        // Admission, in submission order. The bound keeps ncpu + 1
        // entries of headroom so this tick's evictions always fit back
        // into the heap; the first record over the bound ends the scan
        // and waits for a later tick.
        for id in 0..view.job_count() {
            let job = view.jobs()[id];
            if !job.admissible() {
                continue;
            }
            if self.ready_heap.len() + self.ncpu >= self.ready_heap.capacity().saturating_sub(1) {
                debug!(job = id, "admission stopped: ready heap near capacity");
                break;
            }
            match self.ready_heap.insert(id, job.vruntime) {
                Ok(()) => {
                    view.jobs_mut()[id].queued = true;
                    outcome.admitted += 1;
                }
                Err(HeapError::Full) => {
                    // unreachable while the bound holds; the job stays
                    // unqueued and the next scan retries it
                    warn!(job = id, "ready heap full, retrying next tick");
                    break;
                }
            }
        }

        // Eviction: close out up to ncpu running intervals. Completed
        // jobs are dropped with no further accounting and never
        // reinserted.
        for _ in 0..self.ncpu {
            let id = match self.run_queue.dequeue() {
                Ok(id) => id,
                Err(QueueError::Empty) => break,
                Err(e) => {
                    warn!(error = %e, "run queue misbehaved during eviction");
                    break;
                }
            };

            let jobs = view.jobs_mut();
            if jobs[id].completed {
                jobs[id].queued = false;
                outcome.dropped_completed += 1;
                debug!(job = id, pid = jobs[id].pid, "completed job left the running set");
                continue;
            }

            jobs[id].charge_run(now_ms);
            let pid = jobs[id].pid;
            let vruntime = jobs[id].vruntime;

            self.control.suspend(pid)?;

            if let Err(HeapError::Full) = self.ready_heap.insert(id, vruntime) {
                warn!(job = id, "ready heap rejected an evicted job");
                view.jobs_mut()[id].queued = false;
            }
            outcome.evicted += 1;
        }

        // Promotion: fill up to ncpu slots with the lowest-vruntime jobs.
        for _ in 0..self.ncpu {
            let id = match self.ready_heap.pop_min() {
                Some(id) => id,
                None => break,
            };

            let jobs = view.jobs_mut();
            jobs[id].charge_wait(now_ms);
            let pid = jobs[id].pid;

            self.control.resume(pid)?;

            if let Err(QueueError::Full) = self.run_queue.enqueue(id) {
                warn!(job = id, "run queue rejected a promoted job");
                view.jobs_mut()[id].queued = false;
            }
            outcome.promoted += 1;
        }

        Ok(outcome)
    }
}
