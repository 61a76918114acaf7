//! Strategy selection and the configurable entry point.

use std::fs::File;

use crate::fallback::FallbackTransfer;
use crate::position::Position;
use crate::transfer::{drive, TransferResult};

/// How a copy moves its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One `copy_file_range(2)` call per chunk; bytes never leave the kernel.
    #[cfg(target_os = "linux")]
    Native,
    /// Memory-mapped windows for an explicit source offset, a pooled buffer for the source cursor.
    Fallback,
}

impl Strategy {
    /// Strategy used when none is configured: native where the kernel has one.
    #[cfg(target_os = "linux")]
    #[must_use]
    pub const fn platform_default() -> Self {
        Self::Native
    }

    /// Strategy used when none is configured: native where the kernel has one.
    #[cfg(not(target_os = "linux"))]
    #[must_use]
    pub const fn platform_default() -> Self {
        Self::Fallback
    }

    /// Platform cap on the length of a single chunk for this strategy.
    ///
    /// For [`Strategy::Fallback`] this is the mapped cap; requests reading from
    /// the source cursor go through the buffered path and use
    /// [`MAX_BUFFERED_ROUND`](crate::MAX_BUFFERED_ROUND).
    #[must_use]
    pub const fn max_round(self) -> usize {
        match self {
            #[cfg(target_os = "linux")]
            Self::Native => crate::native::MAX_NATIVE_ROUND,
            Self::Fallback => crate::fallback::MAX_MAPPED_ROUND,
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Configured range copier.
///
/// # Examples
///
/// ```no_run
/// use std::fs::{File, OpenOptions};
/// use copy_range::{Position, RangeCopier, Strategy};
///
/// let src = File::open("in.bin")?;
/// let dst = OpenOptions::new().read(true).write(true).create(true).open("out.bin")?;
///
/// let copier = RangeCopier::new().strategy(Strategy::Fallback).max_round(1 << 20);
/// let mut from = Position::Explicit(0);
/// let mut to = Position::Explicit(512);
/// let written = copier.copy(&src, &mut from, &dst, &mut to, 4096, 0).into_result()?;
/// assert_eq!(to, Position::Explicit(512 + written));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeCopier {
    strategy: Strategy,
    max_round: Option<usize>,
}

impl RangeCopier {
    /// Copier with the platform default strategy and round sizes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Lower the per-call chunk length. Values above the platform cap are clamped to it.
    #[must_use]
    pub fn max_round(mut self, max_round: usize) -> Self {
        self.max_round = Some(max_round.max(1));
        self
    }

    /// Configured strategy.
    #[must_use]
    pub fn selected_strategy(&self) -> Strategy {
        self.strategy
    }

    /// Chunk length used for mapped or native rounds.
    #[must_use]
    pub fn round_size(&self) -> usize {
        let cap = self.strategy.max_round();
        self.max_round.map_or(cap, |r| r.min(cap))
    }

    /// Copy `len` bytes from `src` at `src_pos` to `dst` at `dst_pos`.
    ///
    /// Explicit positions are advanced by the bytes written; implicit ones
    /// advance the file cursors instead. `flags` is reserved: any value is
    /// accepted and currently has no effect.
    pub fn copy(
        &self,
        src: &File,
        src_pos: &mut Position,
        dst: &File,
        dst_pos: &mut Position,
        len: u64,
        _flags: u32,
    ) -> TransferResult {
        log::debug!(
            "copying {len} bytes ({src_pos:?} -> {dst_pos:?}) with {:?}",
            self.strategy
        );
        match self.strategy {
            #[cfg(target_os = "linux")]
            Strategy::Native => {
                let mut chunk = crate::native::NativeTransfer::new(
                    src,
                    src_pos,
                    dst,
                    dst_pos,
                    self.round_size(),
                );
                drive(&mut chunk, len)
            }
            Strategy::Fallback => {
                let mut chunk = FallbackTransfer::new(src, src_pos, dst, dst_pos, self.max_round);
                drive(&mut chunk, len)
            }
        }
    }
}
