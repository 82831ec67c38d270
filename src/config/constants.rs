//! # Configuration Constants
//!
//! This module centralizes all configuration constants, grouping interdependent
//! values together and documenting their relationships.
//!
//! ## Dependency Graph
//!
//! ```text
//! DEFAULT_PAGE_SIZE (16384 bytes)
//!       │
//!       ├─> MAX_WIDTH_BYTES (8, must divide the default page size)
//!       │     Pages are rounded down to a multiple of the element width, so
//!       │     the default must already be a multiple of every legal width.
//!       │
//!       └─> BufferPool buffer capacity
//!             Pooled buffers smaller than the array's page size are never
//!             carved into pages; they go straight back to the pool.
//!
//! DEFAULT_DISK_THRESHOLD (256 MiB)
//!       │
//!       └─> Arrays whose `len * width` reaches this are backed by a temp file
//!
//! BUFFER_POOL_SHARD_COUNT (16)
//!       │
//!       └─> Round-robin shards of the recycling pool
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use crate::config::{DEFAULT_PAGE_SIZE, NO_VALUE};
//! ```

// ============================================================================
// PAGE LAYOUT CONSTANTS
// ============================================================================

/// Default size of a disk page in bytes (16KB).
/// This is the unit of I/O for iterator-driven access to paged arrays.
pub const DEFAULT_PAGE_SIZE: usize = 16384;

/// Largest legal element width in bytes.
pub const MAX_WIDTH_BYTES: usize = 8;

const _: () = assert!(
    DEFAULT_PAGE_SIZE % MAX_WIDTH_BYTES == 0,
    "DEFAULT_PAGE_SIZE must be a multiple of every element width"
);

// ============================================================================
// BACKING SELECTION
// ============================================================================

/// Array byte size at or above which the facade backs the array with a
/// temporary file instead of memory (256 MiB).
pub const DEFAULT_DISK_THRESHOLD: u64 = 256 * 1024 * 1024;

// ============================================================================
// BUFFER POOL CONFIGURATION
// ============================================================================

/// Number of shards for the buffer pool.
pub const BUFFER_POOL_SHARD_COUNT: usize = 16;

// ============================================================================
// SENTINELS
// ============================================================================

/// Value reported by a cursor that is not positioned on an element.
pub const NO_VALUE: u64 = u64::MAX;
