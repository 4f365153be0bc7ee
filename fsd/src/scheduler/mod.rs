//! The scheduling loop and its supporting structures

mod core;
mod process;
mod ready_heap;
mod run_queue;
mod tick;

/// Stable index of a record inside the shared table. The heap and the
/// queue hold these, never record copies.
pub type JobId = usize;

pub use self::core::{Scheduler, TickOutcome};
pub use process::{ProcessControl, SignalControl};
pub use ready_heap::{HeapError, ReadyHeap};
pub use run_queue::{QueueError, RunQueue};
pub use tick::{IntervalTicker, ManualTicker, TickDriver};
