//! # copy-range: portable `copy_file_range` for Rust
//!
//! Copies a byte range between two open files. On Linux the copy runs in the
//! kernel through `copy_file_range(2)`; elsewhere it goes through
//! memory-mapped windows, or a pooled buffer when the source start is unknown.
//!
//! ## Offset semantics
//!
//! Each side takes a [`Position`]:
//!
//! - [`Position::Explicit`] reads or writes at that offset and advances the
//!   value in place. The file's shared cursor is left alone.
//! - [`Position::Implicit`] uses the file's cursor and advances it by the bytes
//!   copied, exactly like a direct `read`/`write`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::fs::{File, OpenOptions};
//! use copy_range::{copy_file_range, Position};
//!
//! let src = File::open("in.bin")?;
//! let dst = OpenOptions::new().read(true).write(true).create(true).open("out.bin")?;
//!
//! let mut from = Position::Explicit(0);
//! let mut to = Position::Explicit(512);
//! let res = copy_file_range(&src, &mut from, &dst, &mut to, 4096, 0);
//! assert_eq!(res.into_result()?, 4096);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`errors`]: Error types for range copies
//! - [`pool`]: Process-wide buffer pool used by the buffered fallback
//! - [`utils`]: Page size and mapping-window helpers
//!
//! The memory-mapped fallback maps the destination read-write, so a
//! destination used with an explicit offset off Linux must be opened for
//! reading as well as writing.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![deny(missing_docs)]
#![doc(html_root_url = "https://docs.rs/copy-range")]

pub mod errors;
pub mod pool;
pub mod utils;

mod buffered;
mod copier;
mod fallback;
mod mapped;
#[cfg(target_os = "linux")]
mod native;
mod position;
mod transfer;

use std::fs::File;

pub use copier::{RangeCopier, Strategy};
pub use errors::{CopyRangeError, Result};
pub use fallback::{MAX_BUFFERED_ROUND, MAX_MAPPED_ROUND};
#[cfg(target_os = "linux")]
pub use native::MAX_NATIVE_ROUND;
pub use position::Position;
pub use transfer::TransferResult;

/// Copy `len` bytes from `src` at `src_pos` to `dst` at `dst_pos` with the
/// platform default strategy.
///
/// Returns the bytes written and, if the copy stopped early, the error that
/// stopped it. A short count without an error means the source ran out of
/// data. `src` and `dst` may be the same file as long as the ranges do not
/// overlap. `flags` is reserved; pass 0.
///
/// See [`RangeCopier`] to force a strategy or lower the chunk size.
pub fn copy_file_range(
    src: &File,
    src_pos: &mut Position,
    dst: &File,
    dst_pos: &mut Position,
    len: u64,
    flags: u32,
) -> TransferResult {
    RangeCopier::new().copy(src, src_pos, dst, dst_pos, len, flags)
}
