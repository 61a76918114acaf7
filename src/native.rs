//! In-kernel range copies through `copy_file_range(2)`.

use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;

use crate::errors::{CopyRangeError, Result};
use crate::position::Position;
use crate::transfer::ChunkTransfer;

/// Largest length handed to a single `copy_file_range(2)` call.
pub const MAX_NATIVE_ROUND: usize = 1 << 30;

/// One request driven through the kernel primitive.
pub(crate) struct NativeTransfer<'a> {
    src: &'a File,
    src_pos: &'a mut Position,
    dst: &'a File,
    dst_pos: &'a mut Position,
    round: usize,
}

impl<'a> NativeTransfer<'a> {
    pub(crate) fn new(
        src: &'a File,
        src_pos: &'a mut Position,
        dst: &'a File,
        dst_pos: &'a mut Position,
        round: usize,
    ) -> Self {
        Self {
            src,
            src_pos,
            dst,
            dst_pos,
            round,
        }
    }
}

#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn to_loff(pos: &Position) -> Option<libc::loff_t> {
    pos.offset().map(|off| off as libc::loff_t)
}

#[allow(clippy::cast_sign_loss)]
fn write_back(pos: &mut Position, off: Option<libc::loff_t>) {
    if let (Position::Explicit(slot), Some(off)) = (pos, off) {
        *slot = off as u64;
    }
}

impl ChunkTransfer for NativeTransfer<'_> {
    fn max_round(&self) -> usize {
        self.round
    }

    #[allow(clippy::cast_sign_loss)]
    fn transfer(&mut self, len: usize) -> Result<usize> {
        let mut off_in = to_loff(self.src_pos);
        let mut off_out = to_loff(self.dst_pos);
        let in_ptr = off_in
            .as_mut()
            .map_or(std::ptr::null_mut(), |o| o as *mut libc::loff_t);
        let out_ptr = off_out
            .as_mut()
            .map_or(std::ptr::null_mut(), |o| o as *mut libc::loff_t);
        // SAFETY: both descriptors are borrowed from live `File`s, and the offset
        // pointers are either null or point at locals that outlive the call.
        let n = unsafe {
            libc::syscall(
                libc::SYS_copy_file_range,
                self.src.as_raw_fd(),
                in_ptr,
                self.dst.as_raw_fd(),
                out_ptr,
                len,
                // The kernel defines no flags and rejects any other value.
                0u32,
            )
        };
        if n < 0 {
            return Err(CopyRangeError::Io(io::Error::last_os_error()));
        }
        // The kernel advanced the offsets it was given by exactly `n`.
        write_back(self.src_pos, off_in);
        write_back(self.dst_pos, off_out);
        Ok(n as usize)
    }

    fn is_retryable(&self, err: &CopyRangeError) -> bool {
        err.is_interrupted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::drive;
    use std::io::{Seek, SeekFrom, Write};

    #[test]
    fn explicit_offsets_are_written_back() {
        let mut src = tempfile::tempfile().expect("src");
        src.write_all(b"0123456789").expect("fill");
        let dst = tempfile::tempfile().expect("dst");
        let mut sp = Position::Explicit(2);
        let mut dp = Position::Explicit(0);
        let res = {
            let mut t = NativeTransfer::new(&src, &mut sp, &dst, &mut dp, 4);
            drive(&mut t, 6)
        };
        assert_eq!(res.into_result().expect("copy"), 6);
        assert_eq!(sp, Position::Explicit(8));
        assert_eq!(dp, Position::Explicit(6));
        // Explicit source never moved the shared cursor left at the end by write_all.
        assert_eq!(src.seek(SeekFrom::Current(0)).expect("tell"), 10);
    }

    #[test]
    fn bad_descriptor_surfaces_verbatim() {
        let src = tempfile::tempfile().expect("src");
        let dir = tempfile::tempdir().expect("dir");
        let path = dir.path().join("ro");
        std::fs::write(&path, b"x").expect("seed");
        let ro = File::open(&path).expect("open ro");
        let mut sp = Position::Explicit(0);
        let mut dp = Position::Explicit(0);
        let mut t = NativeTransfer::new(&src, &mut sp, &ro, &mut dp, MAX_NATIVE_ROUND);
        let res = drive(&mut t, 1);
        assert_eq!(res.written, 0);
        let err = res.error.expect("read-only destination must fail");
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }
}
