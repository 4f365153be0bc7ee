//! Job records stored in the shared table

use crate::error::TableError;

/// Maximum length of the stored command text, in bytes
pub const CMD_MAX: usize = 256;

/// One schedulable job inside the shared table.
///
/// Records live inside the memory-mapped table, so the layout is fixed
/// (`repr(C)`, plain old data) and every field access happens under the
/// table lock. The zeroed state left behind by `ftruncate` is a valid
/// "no job here" record (`submitted = false`).
///
/// `priority` is a cost weight: `vruntime` grows by `execution_delta *
/// priority`, so higher values are descheduled in favor of others more
/// often and receive *less* CPU share. `1` is the most favored value.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct JobRecord {
    /// OS process id of the job
    pub pid: i32,
    /// Cost weight, >= 1
    pub priority: u32,
    /// Set by the submitter once the record is valid
    pub submitted: bool,
    /// Present in the ready heap or the running queue
    pub queued: bool,
    /// Set by the child-exit watcher. Authoritative: may flip between any
    /// two lock acquisitions, and the scheduler must tolerate that.
    pub completed: bool,
    /// Start of the current running-or-waiting interval, wall-clock ms
    pub last_event_ms: i64,
    /// Cumulative ms actually running
    pub execution_ms: u64,
    /// Cumulative ms waiting in the ready pool
    pub wait_ms: u64,
    /// Cumulative execution time weighted by priority; the fairness key
    pub vruntime: u64,
    command_len: u32,
    command: [u8; CMD_MAX],
}

impl JobRecord {
    /// Create a fresh record for a just-submitted job.
    pub fn new(pid: i32, priority: u32, command: &str, now_ms: i64) -> Result<Self, TableError> {
        if priority == 0 {
            return Err(TableError::BadParams);
        }
        let bytes = command.as_bytes();
        if bytes.len() > CMD_MAX {
            return Err(TableError::CommandTooLong(bytes.len()));
        }

        let mut buf = [0u8; CMD_MAX];
        buf[..bytes.len()].copy_from_slice(bytes);

        Ok(Self {
            pid,
            priority,
            submitted: true,
            queued: false,
            completed: false,
            last_event_ms: now_ms,
            execution_ms: 0,
            wait_ms: 0,
            vruntime: 0,
            command_len: bytes.len() as u32,
            command: buf,
        })
    }

    /// The command text this job was submitted with.
    pub fn command(&self) -> String {
        let len = (self.command_len as usize).min(CMD_MAX);
        String::from_utf8_lossy(&self.command[..len]).into_owned()
    }

    /// Close out a running interval: charge the elapsed time to
    /// `execution_ms`, bump `vruntime` by the priority-weighted delta, and
    /// restart the interval clock. Called at eviction, never on a
    /// completed record.
    pub fn charge_run(&mut self, now_ms: i64) {
        let delta = self.elapsed_ms(now_ms);
        self.execution_ms += delta;
        self.vruntime += delta * self.priority as u64;
        self.last_event_ms = now_ms;
    }

    /// Close out a waiting interval: charge the elapsed time to `wait_ms`
    /// and restart the interval clock. Called at promotion.
    pub fn charge_wait(&mut self, now_ms: i64) {
        let delta = self.elapsed_ms(now_ms);
        self.wait_ms += delta;
        self.last_event_ms = now_ms;
    }

    /// Eligible for admission into the ready pool
    pub fn admissible(&self) -> bool {
        self.submitted && !self.completed && !self.queued
    }

    fn elapsed_ms(&self, now_ms: i64) -> u64 {
        // the two processes share one clock, but guard against skew anyway
        now_ms.saturating_sub(self.last_event_ms).max(0) as u64
    }
}
