//! Process control port: suspend and resume of job processes

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::error::SchedError;

/// Fire-and-forget suspend/resume over an OS process handle.
///
/// The scheduler never waits for the target to acknowledge a state
/// change; accounting timestamps are approximations bounded by signal
/// delivery latency. Behind a trait so the loop is testable with a fake.
pub trait ProcessControl {
    fn suspend(&self, pid: i32) -> Result<(), SchedError>;
    fn resume(&self, pid: i32) -> Result<(), SchedError>;
}

/// The real port: SIGSTOP to vacate a slot, SIGCONT to occupy one.
#[derive(Debug, Default)]
pub struct SignalControl;

impl SignalControl {
    fn send(&self, pid: i32, signal: Signal) -> Result<(), SchedError> {
        debug!(pid, ?signal, "SignalControl::send: called");
        match kill(Pid::from_raw(pid), signal) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => {
                // the job exited between ticks; the completed flag is
                // authoritative and will catch up at the next eviction
                warn!(pid, ?signal, "signal target is gone");
                Ok(())
            }
            Err(source) => Err(SchedError::Signal { pid, source }),
        }
    }
}

impl ProcessControl for SignalControl {
    fn suspend(&self, pid: i32) -> Result<(), SchedError> {
        self.send(pid, Signal::SIGSTOP)
    }

    fn resume(&self, pid: i32) -> Result<(), SchedError> {
        self.send(pid, Signal::SIGCONT)
    }
}
