//! # Paged Disk Arrays
//!
//! A paged array keeps its elements in a [`BackingStore`] and touches memory
//! only through a [`PageCache`] window per live cursor.
//!
//! ## Access Paths
//!
//! ```text
//!                 ┌──────────────────────────────┐
//! value_at ──────>│ cached page? read it          │──> store.read_at (cell)
//! set_value_at ──>│ cached page? patch it         │──> store.write_at (cell)
//!                 └──────────────────────────────┘
//!
//! cursor.skip ───> PageCache::acquire(page) ──> store.read_at (page)
//! cursor.set ────> page window (dirty)
//! cursor leaves ─> flush_page ──> store.write_at (page), then release
//! ```
//!
//! Single-element access is the slow path: it never loads a page, and writes
//! always go through to the store. It does consult pages already pinned by
//! cursors so both paths observe the same bytes.
//!
//! ## Layout
//!
//! The store holds `len * width` bytes: element `i` is the little-endian
//! cell at byte `i * width`. Pages are `page_size` bytes (a multiple of the
//! width) starting at multiples of `page_size`, so cells never straddle pages.
//!
//! ## Lifetime Rules
//!
//! Cursors borrow the array, so `truncate`, `freeze` and `close` (which need
//! `&mut self` or `self`) cannot run while a cursor is alive. They still assert
//! the cache is empty, which catches cursors leaked with `mem::forget`.

use std::cell::RefCell;
use std::path::PathBuf;

use eyre::{ensure, Result};
use tracing::{debug, warn};

use crate::config::MAX_WIDTH_BYTES;
use crate::cursor::{Direction, PagedIter};
use crate::encoding::{decode, encode, Width};
use crate::error::ArrayError;
use crate::memory::BufferPool;
use crate::storage::{read_exact_at, BackingStore, PageCache};

pub struct PagedArray {
    store: RefCell<Box<dyn BackingStore>>,
    cache: RefCell<PageCache>,
    len: u64,
    max_value: u64,
    width: Width,
    page_size: usize,
    frozen: bool,
    closed: bool,
}

impl std::fmt::Debug for PagedArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedArray")
            .field("len", &self.len)
            .field("max_value", &self.max_value)
            .field("width", &self.width)
            .field("page_size", &self.page_size)
            .field("cached_pages", &self.cache.borrow().len())
            .field("frozen", &self.frozen)
            .finish()
    }
}

impl PagedArray {
    /// Wraps `store`, which must already hold `len * width` bytes.
    ///
    /// `page_size` is rounded down to a multiple of the width.
    pub fn new(
        store: Box<dyn BackingStore>,
        len: u64,
        width: Width,
        max_value: u64,
        page_size: usize,
        pool: Option<BufferPool>,
    ) -> Result<Self> {
        ensure!(
            max_value <= width.bound(),
            "max value {} is greater than {}, the upper limit for width {}",
            max_value,
            width.bound(),
            width
        );
        ensure!(
            page_size >= width.bytes(),
            "page size {} must be at least as large as a single value ({} bytes)",
            page_size,
            width.bytes()
        );
        ensure!(
            len.checked_mul(width.bytes() as u64).is_some(),
            "{} elements of {} bytes overflow the addressable store size",
            len,
            width.bytes()
        );
        let page_size = page_size / width.bytes() * width.bytes();

        Ok(Self {
            store: RefCell::new(store),
            cache: RefCell::new(PageCache::new(page_size, pool)),
            len,
            max_value,
            width,
            page_size,
            frozen: false,
            closed: false,
        })
    }

    /// Marks an array over a read-only store as frozen without flushing.
    pub(crate) fn into_read_only(mut self) -> Self {
        self.frozen = true;
        self
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn width(&self) -> Width {
        self.width
    }

    pub fn max_value(&self) -> u64 {
        self.max_value
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Pages currently pinned by live cursors.
    pub fn cached_pages(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn backing_path(&self) -> Option<PathBuf> {
        self.store.borrow().path().map(|p| p.to_path_buf())
    }

    /// Page-aligned byte offset of the page holding `index`, and the cell's
    /// byte offset within that page.
    pub(crate) fn locate(&self, index: u64) -> (u64, usize) {
        let page_size = self.page_size as u64;
        let offset = index * self.width.bytes() as u64;
        let page_offset = offset / page_size * page_size;
        (page_offset, (offset - page_offset) as usize)
    }

    pub fn value_at(&self, index: u64) -> Result<u64> {
        if index >= self.len {
            return Err(ArrayError::OutOfRange {
                index,
                len: self.len,
            }
            .into());
        }

        let w = self.width.bytes();
        let (page_offset, in_page) = self.locate(index);
        if let Some(page) = self.cache.borrow().get(page_offset) {
            if in_page + w <= page.len() {
                return Ok(decode(self.width, &page.data()[in_page..in_page + w]));
            }
        }

        let mut cell = [0u8; MAX_WIDTH_BYTES];
        let store = self.store.borrow();
        read_exact_at(&**store, &mut cell[..w], index * w as u64)?;
        Ok(decode(self.width, &cell[..w]))
    }

    /// Writes one element straight through to the store.
    ///
    /// # Panics
    ///
    /// If the array is frozen or `value` exceeds the bound.
    pub fn set_value_at(&self, index: u64, value: u64) -> Result<()> {
        assert!(!self.frozen, "array is read-only");
        assert!(
            value <= self.max_value,
            "value out of range: value {} vs max {}",
            value,
            self.max_value
        );
        if index >= self.len {
            return Err(ArrayError::OutOfRange {
                index,
                len: self.len,
            }
            .into());
        }

        let w = self.width.bytes();
        let mut cell = [0u8; MAX_WIDTH_BYTES];
        encode(self.width, value, &mut cell[..w]);

        let (page_offset, in_page) = self.locate(index);
        if let Some(page) = self.cache.borrow_mut().get_mut(page_offset) {
            if in_page + w <= page.len() {
                page.patch()[in_page..in_page + w].copy_from_slice(&cell[..w]);
            }
        }

        self.store.borrow_mut().write_at(&cell[..w], index * w as u64)
    }

    pub fn iterate(&self, start: u64, end: u64) -> PagedIter<'_> {
        PagedIter::new(self, start, end, Direction::Ascending)
    }

    pub fn reverse_iterate(&self, start: u64, end: u64) -> PagedIter<'_> {
        PagedIter::new(self, start, end, Direction::Descending)
    }

    /// Shrinks the array and its store to `len` elements.
    ///
    /// # Panics
    ///
    /// If the array is frozen, `len` exceeds the current length, or any page
    /// is still pinned.
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        assert!(!self.frozen, "array is read-only");
        assert!(len <= self.len, "cannot grow an array from {} to {}", self.len, len);
        let pinned = self.cache.get_mut().len();
        assert!(
            pinned == 0,
            "truncate called with {} pages still pinned by live iterators",
            pinned
        );

        debug!(from = self.len, to = len, "truncating paged array");
        self.len = len;
        self.store
            .get_mut()
            .truncate(len * self.width.bytes() as u64)
    }

    /// Makes the array read-only and flushes pending writes.
    pub fn freeze(&mut self) -> Result<()> {
        self.frozen = true;
        debug!(len = self.len, "froze paged array");
        self.flush()
    }

    /// Writes back every dirty page, then flushes the store if it can.
    ///
    /// Every page is attempted; the first error is returned.
    pub fn flush(&self) -> Result<()> {
        let mut store = self.store.borrow_mut();
        let mut first_err = self
            .cache
            .borrow_mut()
            .flush_dirty(|offset, data| store.write_at(data, offset))
            .err();

        if let Some(Err(e)) = store.flush() {
            if first_err.is_none() {
                first_err = Some(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Flushes, then asks the store to persist durably.
    pub fn sync(&self) -> Result<()> {
        self.flush()?;
        match self.store.borrow_mut().sync() {
            Some(result) => result,
            None => Err(ArrayError::not_implemented("sync").into()),
        }
    }

    /// Closes the store, removing it if it is a temporary file.
    ///
    /// # Panics
    ///
    /// If any page is still pinned.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        let pinned = self.cache.get_mut().len();
        assert!(
            pinned == 0,
            "close called with {} pages still pinned by live iterators",
            pinned
        );
        self.closed = true;
        debug!(len = self.len, path = ?self.store.get_mut().path(), "closing paged array");
        self.store.get_mut().close()
    }

    pub(crate) fn acquire_page(&self, offset: u64) -> Result<()> {
        let store = self.store.borrow();
        self.cache
            .borrow_mut()
            .acquire(offset, |buf| store.read_at(buf, offset))?;
        Ok(())
    }

    pub(crate) fn release_page(&self, offset: u64) {
        self.cache.borrow_mut().release(offset);
    }

    pub(crate) fn abandon_page(&self, offset: u64) {
        self.cache.borrow_mut().abandon(offset);
    }

    pub(crate) fn flush_page(&self, offset: u64) -> Result<()> {
        let mut store = self.store.borrow_mut();
        self.cache
            .borrow_mut()
            .flush_page(offset, |at, data| store.write_at(data, at))?;
        Ok(())
    }

    pub(crate) fn page_value(&self, page_offset: u64, in_page: usize) -> Result<u64> {
        let cache = self.cache.borrow();
        let page = cache
            .get(page_offset)
            .expect("attached page is resident"); // INVARIANT: cursors pin the page they read
        let w = self.width.bytes();
        if in_page + w > page.len() {
            return Err(ArrayError::ShortPage {
                offset: page_offset,
                available: page.len(),
            }
            .into());
        }
        Ok(decode(self.width, &page.data()[in_page..in_page + w]))
    }

    pub(crate) fn store_in_page(&self, page_offset: u64, in_page: usize, value: u64) {
        let mut cache = self.cache.borrow_mut();
        let page = cache
            .get_mut(page_offset)
            .expect("attached page is resident"); // INVARIANT: cursors pin the page they write
        let w = self.width.bytes();
        encode(self.width, value, &mut page.data_mut()[in_page..in_page + w]);
    }
}

impl Drop for PagedArray {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.store.get_mut().close() {
            warn!(error = %e, "failed to close backing store of dropped paged array");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStore;

    fn paged(len: u64, width: Width, page_size: usize) -> PagedArray {
        let store = FileStore::temporary(len * width.bytes() as u64).unwrap();
        PagedArray::new(Box::new(store), len, width, width.bound(), page_size, None).unwrap()
    }

    #[test]
    fn page_size_rounds_down_to_width() {
        let array = paged(16, Width::Eight, 30);
        assert_eq!(array.page_size(), 24);
        assert_eq!(array.locate(2), (0, 16));
        assert_eq!(array.locate(3), (24, 0));
    }

    #[test]
    fn locate_splits_offset() {
        let array = paged(100, Width::Four, 32);
        assert_eq!(array.locate(0), (0, 0));
        assert_eq!(array.locate(7), (0, 28));
        assert_eq!(array.locate(8), (32, 0));
        assert_eq!(array.locate(19), (64, 12));
    }

    #[test]
    fn page_smaller_than_value_rejected() {
        let store = FileStore::temporary(64).unwrap();
        let result = PagedArray::new(Box::new(store), 8, Width::Eight, u64::MAX, 4, None);
        assert!(result.is_err());
    }

    #[test]
    fn set_value_at_writes_through() {
        let array = paged(64, Width::Two, 32);
        array.set_value_at(17, 0xBEEF).unwrap();
        assert_eq!(array.value_at(17).unwrap(), 0xBEEF);
        assert_eq!(array.value_at(16).unwrap(), 0);
        assert_eq!(array.value_at(18).unwrap(), 0);
        assert_eq!(array.cached_pages(), 0);
    }

    #[test]
    fn value_at_past_end_is_out_of_range() {
        let array = paged(8, Width::One, 16);
        let err = array.value_at(8).unwrap_err();
        assert!(ArrayError::is_out_of_range(&err));
        let err = array.set_value_at(9, 1).unwrap_err();
        assert!(ArrayError::is_out_of_range(&err));
    }

    #[test]
    fn direct_write_patches_pinned_page() {
        let array = paged(32, Width::One, 16);
        let mut iter = array.iterate(0, 32);
        assert!(iter.advance());
        assert_eq!(array.cached_pages(), 1);

        array.set_value_at(5, 99).unwrap();
        assert!(iter.skip(5));
        assert_eq!(iter.index(), 5);
        assert_eq!(iter.value(), 99);
        iter.close().unwrap();
        assert_eq!(array.cached_pages(), 0);
    }

    #[test]
    fn truncate_shrinks_store() {
        let mut array = paged(32, Width::Four, 16);
        array.set_value_at(3, 77).unwrap();
        array.truncate(4).unwrap();
        assert_eq!(array.len(), 4);
        assert_eq!(array.value_at(3).unwrap(), 77);
        assert!(array.value_at(4).is_err());

        let path = array.backing_path().unwrap();
        assert_eq!(std::fs::metadata(path).unwrap().len(), 16);
    }

    #[test]
    #[should_panic(expected = "cannot grow")]
    fn truncate_cannot_grow() {
        let mut array = paged(4, Width::One, 16);
        let _ = array.truncate(5);
    }

    #[test]
    fn sync_reaches_file() {
        let array = paged(4, Width::One, 16);
        array.set_value_at(0, 1).unwrap();
        array.sync().unwrap();
    }

    #[test]
    fn close_removes_temporary_store() {
        let array = paged(4, Width::One, 16);
        let path = array.backing_path().unwrap();
        assert!(path.exists());
        array.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn drop_removes_temporary_store() {
        let array = paged(4, Width::One, 16);
        let path = array.backing_path().unwrap();
        drop(array);
        assert!(!path.exists());
    }
}
