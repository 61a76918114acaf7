//! Chunk copies through a pooled buffer and ordinary read/write calls.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use crate::errors::Result;
use crate::pool::PooledBuffer;

/// Read up to `len` bytes from the source cursor and write them all to `dst`.
///
/// With `dst_off` set the bytes go to that offset without moving the
/// destination cursor; otherwise they go through the destination cursor.
/// If the write fails the source cursor is moved back over the bytes read,
/// so it only ever advances by what reached the destination.
pub(crate) fn copy_buffered(
    mut src: &File,
    dst: &File,
    dst_off: Option<u64>,
    len: usize,
) -> Result<usize> {
    let mut buf = PooledBuffer::take(len);
    let n = src.read(&mut buf[..len])?;
    if n == 0 {
        return Ok(0);
    }
    let written = match dst_off {
        Some(off) => write_all_at(dst, &buf[..n], off),
        None => {
            let mut dst = dst;
            dst.write_all(&buf[..n])
        }
    };
    if let Err(err) = written {
        #[allow(clippy::cast_possible_wrap)]
        let back = -(n as i64);
        src.seek(SeekFrom::Current(back))?;
        return Err(err.into());
    }
    Ok(n)
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        fn write_all_at(file: &File, data: &[u8], off: u64) -> std::io::Result<()> {
            use std::os::unix::fs::FileExt;
            file.write_all_at(data, off)
        }
    } else if #[cfg(windows)] {
        fn write_all_at(file: &File, mut data: &[u8], mut off: u64) -> std::io::Result<()> {
            use std::os::windows::fs::FileExt;
            // seek_write moves the cursor on Windows; put it back afterwards.
            let mut f = file;
            let cursor = std::io::Seek::stream_position(&mut f)?;
            while !data.is_empty() {
                match file.seek_write(data, off) {
                    Ok(0) => return Err(std::io::ErrorKind::WriteZero.into()),
                    Ok(n) => {
                        data = &data[n..];
                        off += n as u64;
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                    Err(e) => return Err(e),
                }
            }
            std::io::Seek::seek(&mut f, std::io::SeekFrom::Start(cursor))?;
            Ok(())
        }
    } else {
        fn write_all_at(file: &File, data: &[u8], off: u64) -> std::io::Result<()> {
            use std::io::{Seek, SeekFrom};
            let mut f = file;
            let cursor = f.stream_position()?;
            f.seek(SeekFrom::Start(off))?;
            f.write_all(data)?;
            f.seek(SeekFrom::Start(cursor))?;
            Ok(())
        }
    }
}
