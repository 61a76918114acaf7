//! Crate-specific error types for copy-range.

use std::io;
use thiserror::Error;

/// Result alias for copy-range operations.
pub type Result<T> = std::result::Result<T, CopyRangeError>;

/// Error type covering I/O, mapping and flush failures of a range copy.
#[derive(Debug, Error)]
pub enum CopyRangeError {
    /// Wrapper for `std::io::Error`. Native primitive failures land here with the raw OS error intact.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A window of the source or destination could not be memory-mapped.
    #[error("mapping failed: offset={offset}, len={len}: {source}")]
    Map {
        /// Page-aligned file offset of the requested window.
        offset: u64,
        /// Length of the requested window.
        len: usize,
        /// Underlying OS error.
        source: io::Error,
    },

    /// Synchronous flush of a destination window failed.
    #[error("flush failed: {0}")]
    Flush(io::Error),
}

impl CopyRangeError {
    /// Kind of the underlying `io::Error`.
    #[must_use]
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::Io(e) | Self::Flush(e) => e.kind(),
            Self::Map { source, .. } => source.kind(),
        }
    }

    /// Whether a system call was interrupted before doing any work.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::Interrupted)
    }

    /// Whether resubmitting the same chunk right away may succeed:
    /// an interrupted call, or a call that would have blocked.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Io(e) if matches!(e.kind(), io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock)
        )
    }

    /// Raw OS error code, if the failure came straight from a system call.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Io(e) | Self::Flush(e) => e.raw_os_error(),
            Self::Map { source, .. } => source.raw_os_error(),
        }
    }
}

impl From<CopyRangeError> for io::Error {
    fn from(err: CopyRangeError) -> Self {
        match err {
            CopyRangeError::Io(e) => e,
            other => io::Error::new(other.kind(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_error_reports_window_and_kind() {
        let err = CopyRangeError::Map {
            offset: 4096,
            len: 128,
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        let msg = err.to_string();
        assert!(msg.contains("offset=4096"));
        assert!(msg.contains("len=128"));
    }

    #[test]
    fn only_plain_io_interruptions_are_transient() {
        let interrupted = CopyRangeError::Io(io::Error::from(io::ErrorKind::Interrupted));
        assert!(interrupted.is_interrupted());
        assert!(interrupted.is_transient());

        let would_block = CopyRangeError::Io(io::Error::from(io::ErrorKind::WouldBlock));
        assert!(!would_block.is_interrupted());
        assert!(would_block.is_transient());

        let flush = CopyRangeError::Flush(io::Error::from(io::ErrorKind::Interrupted));
        assert!(!flush.is_transient());
        let map = CopyRangeError::Map {
            offset: 0,
            len: 1,
            source: io::Error::from(io::ErrorKind::WouldBlock),
        };
        assert!(!map.is_transient());
    }

    #[cfg(unix)]
    #[test]
    fn io_error_round_trips_raw_code() {
        let err = CopyRangeError::from(io::Error::from_raw_os_error(libc::EXDEV));
        assert_eq!(err.raw_os_error(), Some(libc::EXDEV));
        let back: io::Error = err.into();
        assert_eq!(back.raw_os_error(), Some(libc::EXDEV));
    }
}
