//! # Memory Module
//!
//! Buffer recycling for page-sized I/O buffers.
//!
//! Paged arrays load one page per cursor position. Sequential scans over huge
//! arrays would otherwise allocate and free a page buffer for every page they
//! cross. A [`BufferPool`] hands out reusable buffers instead, and may be
//! shared by any number of arrays (each array remains single-threaded; the
//! pool itself is `Send + Sync`).
//!
//! ## Configuration
//!
//! ```rust,ignore
//! let pool = BufferPool::new(16 * 1024, 8);
//! let config = ArrayConfig::new(1 << 30)
//!     .with_max_value(255)
//!     .with_pool(pool.clone());
//! ```

mod page_buffer;

pub use page_buffer::{BufferPool, PooledBuffer};
