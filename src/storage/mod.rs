//! # Storage Module
//!
//! This module provides the layer between paged arrays and the bytes that
//! back them.
//!
//! ## Architecture Overview
//!
//! ```text
//! PagedArray
//!     │
//!     ├── PageCache ───────────── BufferPool (optional)
//!     │      │ acquire / flush_page / release
//!     │      v
//!     └── Box<dyn BackingStore>
//!            ├── FileStore        read-write file, optionally temporary
//!            ├── ReadOnlyStore<R> any ReadAt source; mutation not implemented
//!            └── (caller-defined)
//! ```
//!
//! ## Backing Store Contract
//!
//! A store is a flat, headerless run of bytes addressed by offset. Reads may
//! come up short at the end of the store; writes are all-or-error. `flush` and
//! `sync` are optional capabilities: a store that lacks them returns `None`,
//! which callers surface as [`ArrayError::NotImplemented`](crate::error::ArrayError).
//!
//! ## Page Cache
//!
//! [`PageCache`] holds at most one page per offset, pinned by the cursors
//! positioned inside it. See the module docs of `cache` for the pin/unpin
//! protocol and the dirty-page invariant.

mod cache;
mod driver;
mod file;

pub use cache::{CachePage, PageCache};
pub use driver::{BackingStore, ReadAt, ReadOnlyStore};
pub use file::FileStore;

pub(crate) use driver::read_exact_at;
