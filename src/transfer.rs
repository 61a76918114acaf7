//! The chunking loop shared by every copy strategy.

use crate::errors::{CopyRangeError, Result};

/// Outcome of a range copy: bytes written plus the error that ended it early, if any.
///
/// When `error` is set, the first `written` bytes of the destination range are
/// correct; anything past that is undefined for this call.
#[derive(Debug)]
#[must_use]
pub struct TransferResult {
    /// Total bytes written to the destination.
    pub written: u64,
    /// Error that stopped the copy before `len` bytes were moved.
    pub error: Option<CopyRangeError>,
}

impl TransferResult {
    /// Whether the copy ended without an error.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Collapse into a `Result`, dropping the partial count on error.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the copy.
    pub fn into_result(self) -> Result<u64> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.written),
        }
    }
}

/// One bounded step of a copy.
///
/// Implementations move at most `len` bytes and keep their own view of both
/// positions up to date with what they actually moved.
pub(crate) trait ChunkTransfer {
    /// Largest `len` this strategy accepts per call.
    fn max_round(&self) -> usize;

    /// Move up to `len` bytes. `Ok(0)` means no further progress is possible.
    fn transfer(&mut self, len: usize) -> Result<usize>;

    /// Whether `err` should be resubmitted immediately with the same arguments.
    fn is_retryable(&self, err: &CopyRangeError) -> bool;
}

/// Run `chunk` until `len` bytes are moved, it stops making progress, or it fails.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn drive<T: ChunkTransfer + ?Sized>(chunk: &mut T, len: u64) -> TransferResult {
    let round = chunk.max_round().max(1) as u64;
    let mut remaining = len;
    let mut written = 0u64;
    while remaining > 0 {
        // Bounded by `round`, which came from a usize.
        let size = remaining.min(round) as usize;
        match chunk.transfer(size) {
            Ok(0) => break,
            Ok(n) => {
                log::trace!("chunk moved {n} of {size} bytes");
                written += n as u64;
                remaining -= n as u64;
            }
            Err(err) if chunk.is_retryable(&err) => {
                log::trace!("retrying chunk of {size} bytes after {:?}", err.kind());
            }
            Err(err) => {
                return TransferResult {
                    written,
                    error: Some(err),
                }
            }
        }
    }
    TransferResult {
        written,
        error: None,
    }
}
