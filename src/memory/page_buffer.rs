//! # Page Buffer Pool
//!
//! Pool of reusable byte buffers for page-cache loads.
//!
//! ## Usage
//!
//! ```ignore
//! let pool = BufferPool::new(16384, 4); // 4 buffers of 16KB capacity
//!
//! // Acquire a buffer (from pool or newly allocated if pool empty)
//! let mut buffer = pool.acquire();
//! buffer.resize(16384, 0);
//!
//! // Buffer automatically returns to pool when dropped
//! drop(buffer);
//! ```
//!
//! ## Design
//!
//! The pool uses lock sharding (16 shards) so that independent arrays sharing
//! one pool rarely contend. Buffers come back empty (`len == 0`) with their
//! capacity intact.
//!
//! `PooledBuffer` uses `ManuallyDrop` instead of `Option` to make invalid
//! states unrepresentable at the type level, eliminating potential panics.

use crate::config::BUFFER_POOL_SHARD_COUNT;
use parking_lot::Mutex;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A pool of reusable byte buffers.
///
/// Cloning the pool yields another handle to the same buffers.
pub struct BufferPool {
    inner: Arc<BufferPoolInner>,
}

struct BufferPoolInner {
    shards: [Mutex<Vec<Vec<u8>>>; BUFFER_POOL_SHARD_COUNT],
    /// Round-robin counter for distributing acquire requests across shards
    next_shard: AtomicUsize,
    /// Capacity of buffers allocated when a shard is empty
    buffer_capacity: usize,
}

impl BufferPool {
    /// Create a new pool with `initial_count` pre-allocated buffers, each with
    /// room for `buffer_capacity` bytes.
    ///
    /// Buffers are distributed evenly across shards.
    pub fn new(buffer_capacity: usize, initial_count: usize) -> Self {
        let shards: [Mutex<Vec<Vec<u8>>>; BUFFER_POOL_SHARD_COUNT] =
            std::array::from_fn(|_| Mutex::new(Vec::new()));

        let per_shard = initial_count / BUFFER_POOL_SHARD_COUNT;
        let remainder = initial_count % BUFFER_POOL_SHARD_COUNT;

        for (i, shard) in shards.iter().enumerate() {
            let count = per_shard + if i < remainder { 1 } else { 0 };
            let mut guard = shard.lock();
            for _ in 0..count {
                guard.push(Vec::with_capacity(buffer_capacity));
            }
        }

        Self {
            inner: Arc::new(BufferPoolInner {
                shards,
                next_shard: AtomicUsize::new(0),
                buffer_capacity,
            }),
        }
    }

    /// Acquire a buffer from the pool.
    ///
    /// Uses round-robin shard selection. If the selected shard is empty, a new
    /// buffer of the pool's configured capacity is allocated. The buffer is
    /// returned to its shard when dropped.
    pub fn acquire(&self) -> PooledBuffer {
        let shard_idx =
            self.inner.next_shard.fetch_add(1, Ordering::Relaxed) % BUFFER_POOL_SHARD_COUNT;

        let buffer = {
            let mut shard = self.inner.shards[shard_idx].lock();
            shard.pop()
        };

        let buffer = buffer.unwrap_or_else(|| Vec::with_capacity(self.inner.buffer_capacity));

        PooledBuffer {
            buffer: ManuallyDrop::new(buffer),
            pool: Arc::clone(&self.inner),
            shard_idx,
        }
    }

    /// Returns the current number of idle buffers in the pool (across all shards).
    pub fn available(&self) -> usize {
        self.inner.shards.iter().map(|s| s.lock().len()).sum()
    }

    pub fn buffer_capacity(&self) -> usize {
        self.inner.buffer_capacity
    }
}

impl Clone for BufferPool {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("buffer_capacity", &self.inner.buffer_capacity)
            .field("available", &self.available())
            .finish()
    }
}

/// A byte buffer that returns to its pool when dropped.
///
/// Derefs to the underlying `Vec<u8>`, so it can be resized and sliced like
/// any vector. Its contents are discarded on return.
pub struct PooledBuffer {
    /// The buffer itself. Always valid until Drop.
    buffer: ManuallyDrop<Vec<u8>>,
    pool: Arc<BufferPoolInner>,
    /// The shard index this buffer should return to
    shard_idx: usize,
}

impl std::fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("shard_idx", &self.shard_idx)
            .field("len", &self.buffer.len())
            .field("capacity", &self.buffer.capacity())
            .finish()
    }
}

impl Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        // SAFETY: drop() runs once and self.buffer is never touched afterwards.
        let mut buffer = unsafe { ManuallyDrop::take(&mut self.buffer) };
        buffer.clear();
        self.pool.shards[self.shard_idx].lock().push(buffer);
    }
}
