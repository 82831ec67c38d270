//! # Reference-Counted Page Cache
//!
//! This module implements the page cache that sits between paged-array
//! cursors and the backing store. It never evicts on its own: a page is
//! resident exactly as long as at least one cursor is positioned inside it.
//!
//! ## Working Set
//!
//! Each cursor pins at most one page, so the memory held by an array is
//! bounded by its number of live cursors, not by the length of a scan.
//!
//! ## Memory Layout
//!
//! ```text
//! CachePage {
//!     offset: u64,          // page-aligned byte offset in the store
//!     refcount: u32,        // cursors currently positioned in this page
//!     dirty: bool,          // window holds writes not yet in the store
//!     data: PageBuffer,     // <= page_size bytes, pooled or owned
//! }
//! ```
//!
//! The window may be shorter than `page_size` only for the final page of a
//! store that ends mid-page.
//!
//! ## Pin/Unpin Protocol
//!
//! 1. `acquire(offset, load)` pins the page, loading it on first use
//! 2. The cursor reads/writes the window, marking it dirty on write
//! 3. The cursor writes dirty data back through `flush_page`
//! 4. `release(offset)` unpins; the last release evicts
//!
//! Releasing a dirty page is a contract violation and panics: eviction would
//! silently drop writes. `abandon(offset)` exists for the one path that must
//! unpin after a failed write-back.
//!
//! ## Buffer Recycling
//!
//! When a [`BufferPool`] is configured, page windows are carved from pooled
//! buffers whose capacity covers a full page; evicting the page returns the
//! buffer to the pool. A pool whose buffers are smaller than a page is never
//! drawn from, so it neither shrinks nor grows.
//!
//! ## Thread Safety
//!
//! None. The cache is owned by one array and accessed through `&mut self`.

use std::ops::{Deref, DerefMut};

use eyre::Result;
use hashbrown::HashMap;
use tracing::{trace, warn};

use crate::memory::{BufferPool, PooledBuffer};

#[derive(Debug)]
enum PageBuffer {
    Pooled(PooledBuffer),
    Owned(Vec<u8>),
}

impl Deref for PageBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        match self {
            PageBuffer::Pooled(buf) => buf,
            PageBuffer::Owned(buf) => buf,
        }
    }
}

impl DerefMut for PageBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            PageBuffer::Pooled(buf) => buf,
            PageBuffer::Owned(buf) => buf,
        }
    }
}

#[derive(Debug)]
pub struct CachePage {
    offset: u64,
    refcount: u32,
    dirty: bool,
    data: PageBuffer,
}

impl CachePage {
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable window; marks the page dirty.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.dirty = true;
        &mut self.data
    }

    /// Mutable window without touching the dirty flag.
    ///
    /// Used when the same bytes are being written through to the store.
    pub(crate) fn patch(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn refcount(&self) -> u32 {
        self.refcount
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_pooled(&self) -> bool {
        matches!(self.data, PageBuffer::Pooled(_))
    }
}

#[derive(Debug)]
pub struct PageCache {
    pages: HashMap<u64, CachePage>,
    page_size: usize,
    pool: Option<BufferPool>,
}

impl PageCache {
    pub fn new(page_size: usize, pool: Option<BufferPool>) -> Self {
        Self {
            pages: HashMap::new(),
            page_size,
            pool,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn get(&self, offset: u64) -> Option<&CachePage> {
        self.pages.get(&offset)
    }

    pub fn get_mut(&mut self, offset: u64) -> Option<&mut CachePage> {
        self.pages.get_mut(&offset)
    }

    /// Pins the page at `offset`, loading it with `load` if it is not resident.
    ///
    /// `load` receives a zeroed page-sized buffer and returns how many bytes it
    /// filled; the window is cut to that length.
    pub fn acquire<F>(&mut self, offset: u64, load: F) -> Result<&mut CachePage>
    where
        F: FnOnce(&mut [u8]) -> Result<usize>,
    {
        debug_assert!(offset % self.page_size as u64 == 0, "unaligned page offset {}", offset);

        if self.pages.contains_key(&offset) {
            let page = self
                .pages
                .get_mut(&offset)
                .expect("page present in cache"); // INVARIANT: checked by contains_key above
            page.refcount += 1;
            return Ok(page);
        }

        let mut data = self.allocate();
        data.resize(self.page_size, 0);
        let filled = load(data.as_mut_slice())?;
        data.truncate(filled);

        trace!(offset, bytes = filled, pooled = matches!(data, PageBuffer::Pooled(_)), "loaded page");

        let page = CachePage {
            offset,
            refcount: 1,
            dirty: false,
            data,
        };
        Ok(self.pages.entry(offset).or_insert(page))
    }

    fn allocate(&self) -> PageBuffer {
        let page_size = self.page_size;
        if let Some(pool) = self.pool.as_ref().filter(|p| p.buffer_capacity() >= page_size) {
            return PageBuffer::Pooled(pool.acquire());
        }
        PageBuffer::Owned(Vec::with_capacity(self.page_size))
    }

    /// Unpins the page at `offset`, evicting it when no cursor remains.
    ///
    /// Returns true if the page was evicted.
    ///
    /// # Panics
    ///
    /// If the page is dirty. Write it back with [`flush_page`](Self::flush_page) first.
    pub fn release(&mut self, offset: u64) -> bool {
        let Some(page) = self.pages.get_mut(&offset) else {
            return false;
        };
        assert!(
            !page.dirty,
            "cannot release dirty page at offset {}; flush it first",
            offset
        );
        self.unpin(offset)
    }

    /// Unpins the page at `offset` even if it is dirty.
    ///
    /// If this was the last pin the unwritten data is lost.
    pub fn abandon(&mut self, offset: u64) -> bool {
        let Some(page) = self.pages.get(&offset) else {
            return false;
        };
        if page.dirty && page.refcount == 1 {
            warn!(offset, "discarding dirty page after failed write-back");
        }
        self.unpin(offset)
    }

    fn unpin(&mut self, offset: u64) -> bool {
        let Some(page) = self.pages.get_mut(&offset) else {
            return false;
        };
        debug_assert!(page.refcount > 0, "unpin called on unpinned page");
        page.refcount -= 1;
        if page.refcount > 0 {
            return false;
        }
        self.pages.remove(&offset);
        trace!(offset, "evicted page");
        true
    }

    /// Writes the page back through `write` if it is dirty, then marks it clean.
    ///
    /// Returns true if anything was written.
    pub fn flush_page<F>(&mut self, offset: u64, write: F) -> Result<bool>
    where
        F: FnOnce(u64, &[u8]) -> Result<()>,
    {
        let Some(page) = self.pages.get_mut(&offset) else {
            return Ok(false);
        };
        if !page.dirty {
            return Ok(false);
        }
        write(page.offset, page.data.as_slice())?;
        page.dirty = false;
        trace!(offset, bytes = page.data.len(), "wrote back page");
        Ok(true)
    }

    /// Writes back every dirty page.
    ///
    /// All pages are attempted; the first error is returned.
    pub fn flush_dirty<F>(&mut self, mut write: F) -> Result<usize>
    where
        F: FnMut(u64, &[u8]) -> Result<()>,
    {
        let mut flushed = 0;
        let mut first_err = None;

        for page in self.pages.values_mut() {
            if !page.dirty {
                continue;
            }
            match write(page.offset, page.data.as_slice()) {
                Ok(()) => {
                    page.dirty = false;
                    flushed += 1;
                }
                Err(e) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(flushed),
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
