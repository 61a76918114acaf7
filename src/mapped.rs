//! Chunk copies through memory-mapped windows of the source and destination.

use std::fs::File;
use std::io::Write;

use memmap2::{Mmap, MmapMut, MmapOptions};

use crate::errors::{CopyRangeError, Result};
use crate::utils::Window;

fn map_ro(file: &File, window: &Window) -> Result<Mmap> {
    // SAFETY: the window lies inside the file; callers clamp `len` to the source size.
    unsafe {
        MmapOptions::new()
            .offset(window.offset)
            .len(window.map_len)
            .map(file)
    }
    .map_err(|source| CopyRangeError::Map {
        offset: window.offset,
        len: window.map_len,
        source,
    })
}

fn map_rw(file: &File, window: &Window) -> Result<MmapMut> {
    // SAFETY: callers grow the destination to cover the window before mapping it.
    unsafe {
        MmapOptions::new()
            .offset(window.offset)
            .len(window.map_len)
            .map_mut(file)
    }
    .map_err(|source| CopyRangeError::Map {
        offset: window.offset,
        len: window.map_len,
        source,
    })
}

/// Grow `file` so that `[0, end)` is backed by the file, leaving longer files alone.
pub(crate) fn ensure_len(file: &File, end: u64) -> Result<()> {
    if file.metadata()?.len() < end {
        file.set_len(end)?;
    }
    Ok(())
}

/// Copy `len` bytes from `src` at `src_off` to `dst` at `dst_off`, both through mappings.
///
/// The destination window is flushed synchronously before either mapping is dropped.
pub(crate) fn copy_between(
    src: &File,
    src_off: u64,
    dst: &File,
    dst_off: u64,
    len: usize,
) -> Result<usize> {
    let rw = Window::covering(src_off, len);
    let ww = Window::covering(dst_off, len);

    let rmap = map_ro(src, &rw)?;
    // The destination only grows once the source is mapped. `rmap` is
    // released by either early return below.
    ensure_len(dst, dst_off + len as u64)?;
    let mut wmap = map_rw(dst, &ww)?;
    wmap[ww.range()].copy_from_slice(&rmap[rw.range()]);
    wmap.flush().map_err(CopyRangeError::Flush)?;
    drop(wmap);
    drop(rmap);
    Ok(len)
}

/// Copy up to `len` bytes from `src` at `src_off` into `dst` through its own cursor.
pub(crate) fn copy_to_cursor(src: &File, src_off: u64, mut dst: &File, len: usize) -> Result<usize> {
    let rw = Window::covering(src_off, len);
    let rmap = map_ro(src, &rw)?;
    let n = dst.write(&rmap[rw.range()])?;
    Ok(n)
}
