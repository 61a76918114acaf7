//! Utility helpers for page size and mapping-window alignment.

/// Get the system page size in bytes.
#[must_use]
pub fn page_size() -> usize {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "windows")] {
            windows_page_size()
        } else {
            unix_page_size()
        }
    }
}

#[cfg(target_os = "windows")]
fn windows_page_size() -> usize {
    use std::mem::MaybeUninit;
    #[allow(non_snake_case)]
    #[repr(C)]
    struct SYSTEM_INFO {
        wProcessorArchitecture: u16,
        wReserved: u16,
        dwPageSize: u32,
        lpMinimumApplicationAddress: *mut core::ffi::c_void,
        lpMaximumApplicationAddress: *mut core::ffi::c_void,
        dwActiveProcessorMask: usize,
        dwNumberOfProcessors: u32,
        dwProcessorType: u32,
        dwAllocationGranularity: u32,
        wProcessorLevel: u16,
        wProcessorRevision: u16,
    }
    extern "system" {
        fn GetSystemInfo(lpSystemInfo: *mut SYSTEM_INFO);
    }
    let mut sysinfo = MaybeUninit::<SYSTEM_INFO>::uninit();
    unsafe {
        GetSystemInfo(sysinfo.as_mut_ptr());
        let s = sysinfo.assume_init();
        s.dwPageSize as usize
    }
}

#[cfg(not(target_os = "windows"))]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unix_page_size() -> usize {
    // SAFETY: sysconf with _SC_PAGESIZE is safe to call.
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size <= 0 {
        4096
    } else {
        page_size as usize
    }
}

/// Align a value down to the nearest multiple of `alignment`.
#[must_use]
pub fn align_down(value: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return value;
    }
    if alignment.is_power_of_two() {
        value & !(alignment - 1)
    } else {
        value - value % alignment
    }
}

/// Page-aligned mapping window covering `[pos, pos + len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Page-aligned file offset the mapping starts at.
    pub offset: u64,
    /// Distance from `offset` to the first requested byte.
    pub rel: usize,
    /// Bytes to map: `rel + len`.
    pub map_len: usize,
}

impl Window {
    /// Compute the minimal page-aligned window for `len` bytes at `pos`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn covering(pos: u64, len: usize) -> Self {
        let offset = align_down(pos, page_size() as u64);
        // Always smaller than one page.
        let rel = (pos - offset) as usize;
        Self {
            offset,
            rel,
            map_len: rel + len,
        }
    }

    /// Range of the requested bytes inside the mapped window.
    #[must_use]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.rel..self.map_len
    }
}
