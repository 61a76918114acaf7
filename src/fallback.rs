//! User-space copies for platforms or files without an in-kernel range copy.
//!
//! A request with an explicit source offset goes through
//! [`mapped`](crate::mapped) windows and never touches the source cursor.
//! A request that reads from the source cursor is copied through a pooled
//! buffer with ordinary read/write calls, which advance the cursor.

use std::fs::File;

use crate::buffered::copy_buffered;
use crate::errors::{CopyRangeError, Result};
use crate::mapped;
use crate::position::Position;
use crate::transfer::ChunkTransfer;

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        /// Largest chunk copied through one pair of mappings.
        pub const MAX_MAPPED_ROUND: usize = 1 << 30;
    } else if #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "dragonfly",
        target_os = "netbsd",
        target_os = "openbsd",
    ))] {
        /// Largest chunk copied through one pair of mappings.
        pub const MAX_MAPPED_ROUND: usize = 1 << 26;
    } else {
        /// Largest chunk copied through one pair of mappings.
        pub const MAX_MAPPED_ROUND: usize = 64 << 10;
    }
}

/// Largest chunk copied through one pooled buffer.
pub const MAX_BUFFERED_ROUND: usize = 64 << 10;

/// One request driven through the user-space fallback.
pub(crate) struct FallbackTransfer<'a> {
    src: &'a File,
    src_pos: &'a mut Position,
    dst: &'a File,
    dst_pos: &'a mut Position,
    round: usize,
}

impl<'a> FallbackTransfer<'a> {
    /// Pick the round size for the path the source position selects. `cap` lowers it further.
    pub(crate) fn new(
        src: &'a File,
        src_pos: &'a mut Position,
        dst: &'a File,
        dst_pos: &'a mut Position,
        cap: Option<usize>,
    ) -> Self {
        let platform = if src_pos.is_implicit() {
            MAX_BUFFERED_ROUND
        } else {
            MAX_MAPPED_ROUND
        };
        let round = cap.map_or(platform, |c| c.clamp(1, platform));
        log::trace!(
            "fallback copy: {} path, round {round}",
            if src_pos.is_implicit() { "buffered" } else { "mapped" }
        );
        Self {
            src,
            src_pos,
            dst,
            dst_pos,
            round,
        }
    }

    /// Bytes the source holds past `off`, bounded by `len`.
    #[allow(clippy::cast_possible_truncation)]
    fn available(&self, off: u64, len: usize) -> Result<usize> {
        let size = self.src.metadata()?.len();
        // Bounded by `len`.
        Ok(size.saturating_sub(off).min(len as u64) as usize)
    }
}

impl ChunkTransfer for FallbackTransfer<'_> {
    fn max_round(&self) -> usize {
        self.round
    }

    fn transfer(&mut self, len: usize) -> Result<usize> {
        let dst_off = self.dst_pos.offset();
        let n = match self.src_pos.offset() {
            Some(src_off) => {
                let len = self.available(src_off, len)?;
                if len == 0 {
                    return Ok(0);
                }
                match dst_off {
                    Some(dst_off) => mapped::copy_between(self.src, src_off, self.dst, dst_off, len)?,
                    None => mapped::copy_to_cursor(self.src, src_off, self.dst, len)?,
                }
            }
            None => copy_buffered(self.src, self.dst, dst_off, len)?,
        };
        let moved = n as u64;
        self.src_pos.advance(moved);
        self.dst_pos.advance(moved);
        Ok(n)
    }

    fn is_retryable(&self, err: &CopyRangeError) -> bool {
        err.is_transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::drive;
    use std::io::{self, Read, Seek, SeekFrom, Write};

    /// Delegates to the real fallback but fails on call `fail_at`.
    struct FailOnCall<'a> {
        inner: FallbackTransfer<'a>,
        calls: usize,
        fail_at: usize,
        error: fn() -> CopyRangeError,
    }

    impl ChunkTransfer for FailOnCall<'_> {
        fn max_round(&self) -> usize {
            self.inner.max_round()
        }

        fn transfer(&mut self, len: usize) -> Result<usize> {
            self.calls += 1;
            if self.calls == self.fail_at {
                return Err((self.error)());
            }
            self.inner.transfer(len)
        }

        fn is_retryable(&self, err: &CopyRangeError) -> bool {
            self.inner.is_retryable(err)
        }
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 253) as u8).collect()
    }

    fn file_with(data: &[u8]) -> File {
        let mut f = tempfile::tempfile().expect("tempfile");
        f.write_all(data).expect("fill");
        f
    }

    fn contents(mut f: &File) -> Vec<u8> {
        let mut out = Vec::new();
        f.seek(SeekFrom::Start(0)).expect("rewind");
        f.read_to_end(&mut out).expect("read");
        out
    }

    fn run_with_failure(error: fn() -> CopyRangeError) {
        let data = pattern(10_000);
        let src = file_with(&data);
        let dst = tempfile::tempfile().expect("dst");
        let mut sp = Position::Explicit(0);
        let mut dp = Position::Explicit(0);
        let res = {
            let inner = FallbackTransfer::new(&src, &mut sp, &dst, &mut dp, Some(1000));
            let mut chunk = FailOnCall {
                inner,
                calls: 0,
                fail_at: 4,
                error,
            };
            drive(&mut chunk, 10_000)
        };
        assert_eq!(res.written, 3000);
        assert!(res.error.is_some());
        assert_eq!(sp, Position::Explicit(3000));
        assert_eq!(dp, Position::Explicit(3000));
        assert_eq!(&contents(&dst)[..3000], &data[..3000]);
    }

    #[test]
    fn io_failure_after_progress_reports_exact_count() {
        run_with_failure(|| CopyRangeError::Io(io::Error::new(io::ErrorKind::Other, "injected")));
    }

    #[test]
    fn mapping_failure_after_progress_reports_exact_count() {
        run_with_failure(|| CopyRangeError::Map {
            offset: 0,
            len: 1000,
            source: io::Error::from(io::ErrorKind::OutOfMemory),
        });
    }

    #[test]
    fn implicit_source_failure_leaves_cursor_past_progress() {
        let data = pattern(10_000);
        let src = file_with(&data);
        let mut f = &src;
        f.seek(SeekFrom::Start(250)).expect("seek");
        let dst = tempfile::tempfile().expect("dst");
        let mut sp = Position::Implicit;
        let mut dp = Position::Explicit(0);
        let res = {
            let inner = FallbackTransfer::new(&src, &mut sp, &dst, &mut dp, Some(512));
            let mut chunk = FailOnCall {
                inner,
                calls: 0,
                fail_at: 5,
                error: || CopyRangeError::Io(io::Error::new(io::ErrorKind::Other, "injected")),
            };
            drive(&mut chunk, 5000)
        };
        assert_eq!(res.written, 2048);
        assert!(res.error.is_some());
        assert_eq!(f.stream_position().expect("tell"), 250 + 2048);
        assert_eq!(sp, Position::Implicit);
        assert_eq!(dp, Position::Explicit(2048));
        assert_eq!(&contents(&dst), &data[250..250 + 2048]);
    }

    #[test]
    fn buffered_rounds_are_capped() {
        let src = file_with(&pattern(8));
        let dst = tempfile::tempfile().expect("dst");
        let mut sp = Position::Explicit(0);
        let mut dp = Position::Explicit(0);
        let mapped = FallbackTransfer::new(&src, &mut sp, &dst, &mut dp, None);
        assert_eq!(mapped.max_round(), MAX_MAPPED_ROUND);
        let mut implicit = Position::Implicit;
        let buffered = FallbackTransfer::new(&src, &mut implicit, &dst, &mut dp, Some(usize::MAX));
        assert_eq!(buffered.max_round(), MAX_BUFFERED_ROUND);
        assert!(MAX_BUFFERED_ROUND <= MAX_MAPPED_ROUND);
        assert_eq!(MAX_BUFFERED_ROUND % crate::utils::page_size(), 0);
    }
}
