//! Shutdown signal plumbing
//!
//! SIGINT and SIGTERM only set a flag; the loop observes it at the next
//! tick boundary and drains before exiting. SA_RESTART is deliberately
//! not set so the quantum sleep wakes with EINTR when shutdown arrives.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use tracing::debug;

use crate::error::SchedError;

static SHUTDOWN: OnceLock<Arc<AtomicBool>> = OnceLock::new();

extern "C" fn on_shutdown(_signum: i32) {
    // async-signal-safe: a single atomic store, nothing else
    if let Some(flag) = SHUTDOWN.get() {
        flag.store(true, Ordering::SeqCst);
    }
}

/// Install SIGINT/SIGTERM handlers that request a graceful drain and
/// return the flag the scheduler polls.
pub fn install_shutdown_handler() -> Result<Arc<AtomicBool>, SchedError> {
    debug!("install_shutdown_handler: called");
    let flag = SHUTDOWN.get_or_init(|| Arc::new(AtomicBool::new(false))).clone();

    let action = SigAction::new(SigHandler::Handler(on_shutdown), SaFlags::empty(), SigSet::empty());
    for sig in [Signal::SIGINT, Signal::SIGTERM] {
        unsafe { sigaction(sig, &action) }.map_err(SchedError::Handler)?;
    }

    Ok(flag)
}
