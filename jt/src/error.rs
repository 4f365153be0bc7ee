//! Job table error types

use nix::errno::Errno;
use thiserror::Error;

/// Errors from the shared job table
#[derive(Debug, Error)]
pub enum TableError {
    #[error("job table '{0}' already exists")]
    AlreadyExists(String),

    #[error("job table '{0}' not found (create it with `jt create` first)")]
    NotFound(String),

    #[error("shared memory error: {0}")]
    Shm(#[source] Errno),

    #[error("failed to map job table: {0}")]
    Map(#[source] Errno),

    #[error("process-shared mutex error: {0}")]
    Lock(#[source] Errno),

    #[error("invalid parameters: ncpu, tslice and priority must be positive")]
    BadParams,

    #[error("job table is full ({0} records)")]
    TableFull(usize),

    #[error("command is {0} bytes, limit is {max}", max = crate::record::CMD_MAX)]
    CommandTooLong(usize),
}

impl TableError {
    /// Errors that leave the table itself in an unusable state, as opposed
    /// to a rejected single operation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TableError::Shm(_) | TableError::Map(_) | TableError::Lock(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(TableError::Lock(Errno::EINVAL).is_fatal());
        assert!(TableError::Map(Errno::ENOMEM).is_fatal());
        assert!(!TableError::TableFull(64).is_fatal());
        assert!(!TableError::CommandTooLong(300).is_fatal());
    }
}
