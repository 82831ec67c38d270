//! # Array Configuration
//!
//! [`ArrayConfig`] packages every tunable for [`BigArray::open`](super::BigArray::open):
//!
//! ```ignore
//! let array = BigArray::open(
//!     ArrayConfig::new(1 << 30)
//!         .with_max_value(1000)
//!         .with_page_size(64 * 1024)
//!         .with_pool(pool.clone()),
//! )?;
//! ```
//!
//! ## Width and Bound
//!
//! At least one of `max_value` and `width` is required:
//!
//! | max_value | width | result |
//! |-----------|-------|--------|
//! | none      | none  | error |
//! | none      | W     | bound = `W.bound()` |
//! | V         | none  | width = `Width::for_bound(V)` |
//! | V         | W     | error unless `V <= W.bound()` |
//!
//! ## Backing Choice
//!
//! Without a caller-supplied backing, arrays under `disk_threshold` bytes live
//! in memory; larger ones get a temporary file sized to `num_values * width`.
//! A supplied backing always produces a paged array. A read-only backing
//! produces a frozen array.

use std::fmt;

use eyre::{bail, ensure, eyre, Result};

use crate::config::{DEFAULT_DISK_THRESHOLD, DEFAULT_PAGE_SIZE};
use crate::encoding::Width;
use crate::memory::BufferPool;
use crate::storage::{BackingStore, ReadAt, ReadOnlyStore};

/// Caller-supplied storage for a paged array.
pub enum Backing {
    ReadWrite(Box<dyn BackingStore>),
    ReadOnly(Box<dyn BackingStore>),
}

impl Backing {
    pub fn read_write<S: BackingStore + 'static>(store: S) -> Self {
        Backing::ReadWrite(Box::new(store))
    }

    /// Wraps a read-at-offset source; every mutation reports not implemented.
    pub fn read_only<R: ReadAt + Send + 'static>(source: R) -> Self {
        Backing::ReadOnly(Box::new(ReadOnlyStore::new(source)))
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, Backing::ReadOnly(_))
    }

    pub(crate) fn into_store(self) -> Box<dyn BackingStore> {
        match self {
            Backing::ReadWrite(store) | Backing::ReadOnly(store) => store,
        }
    }
}

impl fmt::Debug for Backing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, store) = match self {
            Backing::ReadWrite(store) => ("ReadWrite", store),
            Backing::ReadOnly(store) => ("ReadOnly", store),
        };
        f.debug_tuple(kind).field(&store.path()).finish()
    }
}

#[derive(Debug)]
pub struct ArrayConfig {
    pub num_values: u64,
    pub max_value: Option<u64>,
    pub width: Option<Width>,
    /// Byte size at or above which the array is backed by a temporary file.
    pub disk_threshold: u64,
    pub page_size: usize,
    pub pool: Option<BufferPool>,
    pub backing: Option<Backing>,
}

impl ArrayConfig {
    pub fn new(num_values: u64) -> Self {
        Self {
            num_values,
            max_value: None,
            width: None,
            disk_threshold: DEFAULT_DISK_THRESHOLD,
            page_size: DEFAULT_PAGE_SIZE,
            pool: None,
            backing: None,
        }
    }

    pub fn with_max_value(mut self, max_value: u64) -> Self {
        self.max_value = Some(max_value);
        self
    }

    pub fn with_width(mut self, width: Width) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_disk_threshold(mut self, bytes: u64) -> Self {
        self.disk_threshold = bytes;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_pool(mut self, pool: BufferPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_backing(mut self, backing: Backing) -> Self {
        self.backing = Some(backing);
        self
    }

    /// Validates the options and fills in derived values.
    pub(crate) fn resolve(self) -> Result<ResolvedConfig> {
        let (width, max_value) = match (self.width, self.max_value) {
            (None, None) => bail!("must specify at least one of max_value or width"),
            (Some(width), None) => (width, width.bound()),
            (None, Some(max_value)) => (Width::for_bound(max_value), max_value),
            (Some(width), Some(max_value)) => {
                ensure!(
                    max_value <= width.bound(),
                    "max value {} is greater than {}, the upper limit for width {}",
                    max_value,
                    width.bound(),
                    width
                );
                (width, max_value)
            }
        };

        ensure!(
            self.page_size >= width.bytes(),
            "page size {} must be at least as large as a single value ({} bytes)",
            self.page_size,
            width.bytes()
        );
        let page_size = self.page_size / width.bytes() * width.bytes();
        ensure!(page_size > 0, "page size rounds down to zero");

        let num_bytes = self
            .num_values
            .checked_mul(width.bytes() as u64)
            .ok_or_else(|| eyre!("{} values of width {} overflow u64 bytes", self.num_values, width))?;

        Ok(ResolvedConfig {
            num_values: self.num_values,
            max_value,
            width,
            num_bytes,
            disk_threshold: self.disk_threshold,
            page_size,
            pool: self.pool,
            backing: self.backing,
        })
    }
}

#[derive(Debug)]
pub(crate) struct ResolvedConfig {
    pub num_values: u64,
    pub max_value: u64,
    pub width: Width,
    pub num_bytes: u64,
    pub disk_threshold: u64,
    pub page_size: usize,
    pub pool: Option<BufferPool>,
    pub backing: Option<Backing>,
}

impl ResolvedConfig {
    pub fn is_resident(&self) -> bool {
        self.backing.is_none() && self.num_bytes < self.disk_threshold
    }
}
