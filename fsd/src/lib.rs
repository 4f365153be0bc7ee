//! Fairsched - weighted-fair fixed-slot job scheduler
//!
//! The daemon time-slices `ncpu` CPU slots among externally submitted
//! jobs, once per quantum, using a fairness key (`vruntime` = cumulative
//! execution time weighted by priority). Jobs live in a shared-memory
//! table owned by the [`jobtable`] crate; this crate owns the scheduling
//! state machine built on two private structures:
//!
//! - a bounded circular run queue tracking the jobs holding slots, and
//! - a fixed-capacity min-heap over `vruntime` forming the ready pool.
//!
//! Each tick, under the table lock: newly submitted jobs are admitted to
//! the pool, running jobs are suspended (SIGSTOP) and returned to it,
//! and the lowest-vruntime jobs are resumed (SIGCONT) into the freed
//! slots. Shutdown only raises a flag; the loop drains all admitted work
//! before tearing down.

pub mod cli;
pub mod daemon;
pub mod error;
pub mod scheduler;
pub mod signals;

pub use daemon::{DaemonManager, DaemonStatus};
pub use error::SchedError;
pub use scheduler::{
    HeapError, IntervalTicker, JobId, ManualTicker, ProcessControl, QueueError, ReadyHeap, RunQueue, Scheduler,
    SignalControl, TickDriver, TickOutcome,
};
pub use signals::install_shutdown_handler;
