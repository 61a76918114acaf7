//! Process-wide registry of reusable byte buffers, keyed by buffer size.
//!
//! The buffered fallback copies through one buffer per chunk. Buffers come
//! from the pool for that chunk size so repeated copies do not allocate. The
//! registry lives for the whole process and is never torn down.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};

type Registry = RwLock<HashMap<usize, Arc<BufferPool>>>;

static POOLS: OnceLock<Registry> = OnceLock::new();
static ASSIGNING: AtomicBool = AtomicBool::new(false);

fn registry() -> &'static Registry {
    POOLS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Free list of buffers that are all exactly `size` bytes long.
#[derive(Debug)]
pub struct BufferPool {
    size: usize,
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    fn new(size: usize) -> Self {
        Self {
            size,
            free: Mutex::new(Vec::new()),
        }
    }

    /// Length of every buffer handed out by this pool.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of idle buffers currently held.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    /// Take a buffer, allocating a zeroed one if the pool is empty.
    #[must_use]
    pub fn get(&self) -> Vec<u8> {
        let reused = self.free.lock().pop();
        reused.unwrap_or_else(|| vec![0u8; self.size])
    }

    /// Give a buffer back. Buffers of a different length are dropped.
    pub fn put(&self, buf: Vec<u8>) {
        if buf.len() == self.size {
            self.free.lock().push(buf);
        }
    }
}

/// Return the pool for `size`, creating it on first use.
///
/// Exactly one pool is ever built per size: creation is serialized by a
/// compare-and-swap flag and callers that lose the race spin until the winner
/// has published its pool.
#[must_use]
pub fn pool_for(size: usize) -> Arc<BufferPool> {
    loop {
        if let Some(pool) = registry().read().get(&size) {
            return Arc::clone(pool);
        }
        if ASSIGNING
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            let pool = Arc::clone(
                registry()
                    .write()
                    .entry(size)
                    .or_insert_with(|| {
                        log::debug!("creating buffer pool for {size}-byte buffers");
                        Arc::new(BufferPool::new(size))
                    }),
            );
            ASSIGNING.store(false, Ordering::Release);
            return pool;
        }
        std::hint::spin_loop();
    }
}

/// Take a `size`-byte buffer from the shared pool.
#[must_use]
pub fn acquire(size: usize) -> Vec<u8> {
    pool_for(size).get()
}

/// Return a buffer previously obtained with [`acquire`] for the same `size`.
pub fn release(size: usize, buf: Vec<u8>) {
    pool_for(size).put(buf);
}

/// Number of distinct buffer sizes that have a pool.
#[must_use]
pub fn pool_count() -> usize {
    registry().read().len()
}

/// Buffer borrowed from a [`BufferPool`]; goes back to its pool on drop.
#[derive(Debug)]
pub struct PooledBuffer {
    pool: Arc<BufferPool>,
    buf: Option<Vec<u8>>,
}

impl PooledBuffer {
    /// Borrow a `size`-byte buffer from the shared pool.
    #[must_use]
    pub fn take(size: usize) -> Self {
        let pool = pool_for(size);
        let buf = Some(pool.get());
        Self { pool, buf }
    }
}

impl std::ops::Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or_default()
    }
}

impl std::ops::DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().unwrap_or_default()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.put(buf);
        }
    }
}
