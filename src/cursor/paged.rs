//! # Paged Cursor
//!
//! A cursor over a paged array pins exactly one page at a time: the page that
//! holds its current element. Moving within the page is free; moving across a
//! page boundary writes the old page back (if dirty), releases it, and pins the
//! next one.
//!
//! Writes through `set_value` land in the pinned page and mark it dirty. They
//! reach the store on the next page switch, `flush()`, `close()`, or when the
//! cursor is dropped.
//!
//! If writing back the old page fails during a switch, the error is latched
//! and the old page stays pinned, so its data is not lost before `close()`
//! gets a final chance to write it.

use eyre::{Report, Result};
use tracing::warn;

use super::{Cursor, Direction};
use crate::array::PagedArray;
use crate::error::ArrayError;

#[derive(Debug)]
pub struct PagedIter<'a> {
    array: &'a PagedArray,
    page: Option<u64>,
    cursor: Cursor,
}

impl<'a> PagedIter<'a> {
    pub(crate) fn new(array: &'a PagedArray, start: u64, end: u64, direction: Direction) -> Self {
        Self {
            array,
            page: None,
            cursor: Cursor::new(start, end, direction),
        }
    }

    pub fn advance(&mut self) -> bool {
        self.skip(1)
    }

    pub fn skip(&mut self, n: u64) -> bool {
        let Some(index) = self.cursor.step(n) else {
            return false;
        };
        let loaded = self.load(index);
        self.cursor.settle(loaded)
    }

    fn load(&mut self, index: u64) -> Result<u64> {
        let len = self.array.len();
        if index >= len {
            return Err(ArrayError::OutOfRange { index, len }.into());
        }

        let (page_offset, in_page) = self.array.locate(index);
        if let Some(current) = self.page {
            if current != page_offset {
                self.array.flush_page(current)?;
                self.array.release_page(current);
                self.page = None;
            }
        }
        if self.page.is_none() {
            self.array.acquire_page(page_offset)?;
            self.page = Some(page_offset);
        }
        self.array.page_value(page_offset, in_page)
    }

    pub fn index(&self) -> u64 {
        self.cursor.index()
    }

    pub fn value(&self) -> u64 {
        self.cursor.value()
    }

    /// Writes `value` into the pinned page.
    ///
    /// # Panics
    ///
    /// If the cursor is not positioned, the array is frozen, or `value`
    /// exceeds the bound.
    pub fn set_value(&mut self, value: u64) {
        let index = self.cursor.positioned("set_value");
        assert!(!self.array.is_frozen(), "array is read-only");
        assert!(
            value <= self.array.max_value(),
            "value out of range: value {} vs max {}",
            value,
            self.array.max_value()
        );

        let (page_offset, in_page) = self.array.locate(index);
        debug_assert_eq!(self.page, Some(page_offset), "cursor is not pinned to its page");
        self.array.store_in_page(page_offset, in_page, value);
        self.cursor.set_cached(value);
    }

    pub fn err(&self) -> Option<&Report> {
        self.cursor.err()
    }

    pub fn direction(&self) -> Direction {
        self.cursor.direction()
    }

    pub fn is_closed(&self) -> bool {
        self.cursor.is_closed()
    }

    /// Writes the pinned page back if it holds unflushed writes.
    pub fn flush(&mut self) -> Result<()> {
        match self.page {
            Some(offset) => self.array.flush_page(offset),
            None => Ok(()),
        }
    }

    /// Writes back and unpins the current page, then closes the cursor.
    ///
    /// A latched error takes precedence over a write-back failure.
    pub fn close(&mut self) -> Result<()> {
        if self.cursor.is_closed() {
            return Err(ArrayError::ClosedIterator.into());
        }
        let detached = self.detach();
        match self.cursor.shut() {
            Some(e) => Err(e),
            None => detached,
        }
    }

    fn detach(&mut self) -> Result<()> {
        let Some(offset) = self.page.take() else {
            return Ok(());
        };
        match self.array.flush_page(offset) {
            Ok(()) => {
                self.array.release_page(offset);
                Ok(())
            }
            Err(e) => {
                self.array.abandon_page(offset);
                Err(e)
            }
        }
    }
}

impl Drop for PagedIter<'_> {
    fn drop(&mut self) {
        if self.cursor.is_closed() {
            return;
        }
        if let Err(e) = self.detach() {
            warn!(error = %e, "dropped paged iterator failed to write back its page");
        }
    }
}
