//! Scheduler error types

use jobtable::TableError;
use nix::errno::Errno;
use thiserror::Error;

/// Errors that can occur in the scheduler daemon.
///
/// Everything here is fatal to the loop: per-tick conditions like a full
/// heap or an empty queue are handled in place (logged, never retried
/// within the tick) and never surface as a `SchedError`.
#[derive(Debug, Error)]
pub enum SchedError {
    #[error("job table error: {0}")]
    Table(#[from] TableError),

    #[error("failed to signal pid {pid}: {source}")]
    Signal { pid: i32, source: Errno },

    #[error("failed to install signal handler: {0}")]
    Handler(#[source] Errno),

    #[error("quantum sleep interrupted: {0}")]
    TickInterrupted(#[source] Errno),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_error_converts() {
        let err: SchedError = TableError::NotFound("/gone".to_string()).into();
        assert!(matches!(err, SchedError::Table(_)));
        assert!(err.to_string().contains("/gone"));
    }
}
