//! # Big Arrays
//!
//! A [`BigArray`] is a fixed-length sequence of bounded unsigned integers
//! packed into 1, 2, 4 or 8 bytes each. It is one of two backings:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                       BigArray                         │
//! ├───────────────────────────┬────────────────────────────┤
//! │ Resident(ResidentArray)   │ Paged(PagedArray)          │
//! │   Vec<u8|u16|u32|u64>     │   PageCache                │
//! │                           │      │                     │
//! │                           │   BackingStore (file, ...) │
//! └───────────────────────────┴────────────────────────────┘
//! ```
//!
//! [`BigArray::open`] picks the backing from an [`ArrayConfig`]: small arrays
//! stay in memory, arrays at or above the disk threshold (or with a supplied
//! backing store) are paged.
//!
//! ## Access Patterns
//!
//! - `value_at` / `set_value_at` for incidental random access
//! - `iterate` / `reverse_iterate` for sequential scans; on paged arrays this
//!   is the fast path, one page read per page of elements
//! - [`for_each`] / [`reverse_for_each`] for whole-array traversal
//!
//! ## Mutation Rules
//!
//! Writing to a frozen array, writing a value above the bound, growing through
//! `truncate`, and copying between arrays of different lengths all panic.
//! Running past the end returns [`ArrayError::OutOfRange`](crate::error::ArrayError).

mod config;
mod copy;
mod paged;
pub(crate) mod resident;

pub use config::{ArrayConfig, Backing};
pub use copy::{for_each, reverse_for_each};
pub use paged::PagedArray;
pub use resident::ResidentArray;

use eyre::Result;
use tracing::debug;

use crate::cursor::ArrayIter;
use crate::encoding::Width;
use crate::error::ArrayError;
use crate::storage::{BackingStore, FileStore};

#[derive(Debug)]
pub enum BigArray {
    Resident(ResidentArray),
    Paged(PagedArray),
}

impl BigArray {
    /// Creates an array as described by `config`.
    ///
    /// Without a supplied backing, arrays whose byte size reaches
    /// `disk_threshold` are paged over a temporary file that is removed when
    /// the array is closed or dropped.
    pub fn open(config: ArrayConfig) -> Result<Self> {
        let config = config.resolve()?;

        if config.is_resident() {
            debug!(
                kind = "resident",
                len = config.num_values,
                width = %config.width,
                "opening big array"
            );
            let array = ResidentArray::new(config.num_values, config.max_value, config.width)?;
            return Ok(BigArray::Resident(array));
        }

        let (store, read_only): (Box<dyn BackingStore>, bool) = match config.backing {
            Some(backing) => {
                let read_only = backing.is_read_only();
                (backing.into_store(), read_only)
            }
            None => (Box::new(FileStore::temporary(config.num_bytes)?), false),
        };

        debug!(
            kind = "paged",
            len = config.num_values,
            width = %config.width,
            page_size = config.page_size,
            read_only,
            path = ?store.path(),
            "opening big array"
        );

        let array = PagedArray::new(
            store,
            config.num_values,
            config.width,
            config.max_value,
            config.page_size,
            config.pool,
        )?;
        Ok(BigArray::Paged(if read_only {
            array.into_read_only()
        } else {
            array
        }))
    }

    pub fn len(&self) -> u64 {
        on_backing!(self, array => array.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn width(&self) -> Width {
        on_backing!(self, array => array.width())
    }

    pub fn max_value(&self) -> u64 {
        on_backing!(self, array => array.max_value())
    }

    pub fn is_frozen(&self) -> bool {
        on_backing!(self, array => array.is_frozen())
    }

    pub fn is_paged(&self) -> bool {
        matches!(self, BigArray::Paged(_))
    }

    pub fn value_at(&self, index: u64) -> Result<u64> {
        on_backing!(self, array => array.value_at(index))
    }

    /// # Panics
    ///
    /// If the array is frozen or `value` exceeds [`max_value`](Self::max_value).
    pub fn set_value_at(&self, index: u64, value: u64) -> Result<()> {
        on_backing!(self, array => array.set_value_at(index, value))
    }

    /// Ascending cursor over `[start, end)`.
    ///
    /// # Panics
    ///
    /// If `start > end`.
    pub fn iterate(&self, start: u64, end: u64) -> ArrayIter<'_> {
        on_backing!(self, array => ArrayIter::from(array.iterate(start, end)))
    }

    /// Descending cursor over `[start, end)`, starting at `end - 1`.
    pub fn reverse_iterate(&self, start: u64, end: u64) -> ArrayIter<'_> {
        on_backing!(self, array => ArrayIter::from(array.reverse_iterate(start, end)))
    }

    /// Replaces every element with the matching element of `src`.
    ///
    /// Resident arrays of the same width copy in bulk; everything else goes
    /// through a pair of cursors, so `src` values must respect this array's
    /// bound.
    ///
    /// # Panics
    ///
    /// If this array is frozen or the lengths differ.
    pub fn copy_from(&mut self, src: &BigArray) -> Result<()> {
        assert!(!self.is_frozen(), "array is read-only");
        assert!(
            self.len() == src.len(),
            "big arrays are not equal in size: {} vs {}",
            self.len(),
            src.len()
        );

        if let (BigArray::Resident(dst), BigArray::Resident(src)) = (&mut *self, src) {
            if dst.copy_cells_from(src) {
                return Ok(());
            }
        }
        copy::copy_through_cursors(self, src)
    }

    /// # Panics
    ///
    /// If the array is frozen, `len` exceeds the current length, or a paged
    /// array still has pinned pages.
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        match self {
            BigArray::Resident(array) => {
                debug!(from = array.len(), to = len, "truncating resident array");
                array.truncate(len);
                Ok(())
            }
            BigArray::Paged(array) => array.truncate(len),
        }
    }

    /// Makes the array read-only. Irreversible.
    pub fn freeze(&mut self) -> Result<()> {
        match self {
            BigArray::Resident(array) => {
                array.freeze();
                Ok(())
            }
            BigArray::Paged(array) => array.freeze(),
        }
    }

    pub fn flush(&self) -> Result<()> {
        match self {
            BigArray::Resident(_) => Ok(()),
            BigArray::Paged(array) => array.flush(),
        }
    }

    /// Flushes and asks the backing store to persist durably.
    ///
    /// Resident arrays have nothing to persist and report not implemented.
    pub fn sync(&self) -> Result<()> {
        match self {
            BigArray::Resident(_) => Err(ArrayError::not_implemented("sync").into()),
            BigArray::Paged(array) => array.sync(),
        }
    }

    /// Releases the array, removing its backing file if it was temporary.
    pub fn close(self) -> Result<()> {
        match self {
            BigArray::Resident(array) => {
                debug!(len = array.len(), "closing resident array");
                Ok(())
            }
            BigArray::Paged(array) => array.close(),
        }
    }
}

impl From<ResidentArray> for BigArray {
    fn from(array: ResidentArray) -> Self {
        BigArray::Resident(array)
    }
}

impl From<PagedArray> for BigArray {
    fn from(array: PagedArray) -> Self {
        BigArray::Paged(array)
    }
}
