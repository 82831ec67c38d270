//! # bigarray - Huge Arrays of Small Integers
//!
//! `bigarray` stores very long sequences of bounded unsigned integers packed
//! into 1, 2, 4 or 8 bytes per element. Arrays small enough to hold in memory
//! live in a typed vector; larger ones are paged over a file (or any
//! caller-supplied byte store) through a reference-counted page cache.
//!
//! ## Quick Start
//!
//! ```ignore
//! use bigarray::{ArrayConfig, BigArray};
//!
//! let array = BigArray::open(ArrayConfig::new(64).with_max_value(255))?;
//! array.set_value_at(42, 0xCC)?;
//!
//! {
//!     let mut iter = array.iterate(0, array.len());
//!     while iter.advance() {
//!         let i = iter.index();
//!         iter.set_value(i);
//!     }
//!     iter.close()?;
//! }
//! array.close()?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   BigArray  /  ArrayIter  (array,   │
//! │             cursor)                 │
//! ├──────────────────┬──────────────────┤
//! │  ResidentArray   │   PagedArray     │
//! │  Vec<uN>         │   PageCache      │
//! ├──────────────────┼──────────────────┤
//! │                  │   BackingStore   │
//! │                  │   BufferPool     │
//! ├──────────────────┴──────────────────┤
//! │    Value codec (encoding::Width)    │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## On-Disk Layout
//!
//! None beyond the values: a persisted array is `len` consecutive
//! little-endian cells of `width` bytes starting at offset 0. Length, width
//! and bound must be supplied again when reopening.
//!
//! ## Errors
//!
//! I/O failures and end-of-range reads are returned as `eyre::Result`;
//! conditions worth matching on are [`ArrayError`] variants. Misuse (writing a
//! frozen array, exceeding the bound, reading an unpositioned cursor) panics.
//!
//! ## Threading
//!
//! An array and its cursors belong to one thread. A [`BufferPool`] may be
//! shared between arrays on different threads.
//!
//! ## Module Overview
//!
//! - [`array`]: `BigArray`, both backings, configuration and traversal helpers
//! - [`cursor`]: the cursor protocol shared by both backings
//! - [`storage`]: backing stores and the page cache
//! - [`memory`]: page buffer recycling
//! - [`encoding`]: the fixed-width value codec
//! - [`config`]: numeric defaults

#[macro_use]
mod macros;

pub mod array;
pub mod config;
pub mod cursor;
pub mod encoding;
pub mod error;
pub mod memory;
pub mod storage;

pub use array::{for_each, reverse_for_each, ArrayConfig, Backing, BigArray, PagedArray, ResidentArray};
pub use cursor::{ArrayIter, Direction, PagedIter, ResidentIter};
pub use encoding::Width;
pub use error::ArrayError;
pub use memory::BufferPool;
pub use storage::{BackingStore, FileStore, ReadAt, ReadOnlyStore};
