//! # Backing Store Abstraction
//!
//! This module provides the `BackingStore` trait, the copy-based boundary
//! between paged arrays and whatever holds their bytes (a file, a read-only
//! blob, a test double).
//!
//! ## Copy-Based Interface
//!
//! ```text
//! fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize>;
//! fn write_at(&mut self, data: &[u8], offset: u64) -> Result<()>;
//! fn truncate(&mut self, len: u64) -> Result<()>;
//! fn close(&mut self) -> Result<()>;
//! ```
//!
//! `read_at` may return fewer bytes than requested only when the store ends
//! before `offset + buf.len()`; that is not an error.
//!
//! ## Optional Capabilities
//!
//! Explicit flush and durable sync are optional. Stores that offer them
//! override `flush()` / `sync()` and return `Some(result)`; the default `None`
//! means the primitive does not exist. Paged arrays skip a missing flush and
//! report a missing sync as `ArrayError::NotImplemented`.
//!
//! ## Read-Only Sources
//!
//! [`ReadAt`] is the read-only counterpart: anything that can serve bytes at
//! an offset. `ReadOnlyStore` adapts it to `BackingStore`, reporting every
//! mutating call as not implemented.
//!
//! ## Thread Safety
//!
//! `BackingStore` requires `Send` so an array can move between threads. It is
//! never shared: each array owns its store exclusively.

use std::fs::File;
use std::io;
use std::path::Path;

use eyre::{Result, WrapErr};

use crate::error::ArrayError;

/// Random-access byte store backing a paged array.
pub trait BackingStore: Send {
    /// Reads up to `buf.len()` bytes at `offset`, returning how many were read.
    ///
    /// A short count means the store ended; it is not an error.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize>;

    /// Writes all of `data` at `offset`.
    fn write_at(&mut self, data: &[u8], offset: u64) -> Result<()>;

    /// Sets the store length to exactly `len` bytes.
    fn truncate(&mut self, len: u64) -> Result<()>;

    /// Releases the store. Called once, when the owning array closes.
    fn close(&mut self) -> Result<()>;

    /// Pushes buffered writes to the operating system, if the store buffers.
    fn flush(&mut self) -> Option<Result<()>> {
        None
    }

    /// Persists all writes durably, if the store supports it.
    fn sync(&mut self) -> Option<Result<()>> {
        None
    }

    /// Location of the store in the file system, if it has one.
    fn path(&self) -> Option<&Path> {
        None
    }
}

/// Read-only positional byte source.
pub trait ReadAt {
    /// Reads up to `buf.len()` bytes at `offset`. Returns 0 at end of source.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;
}

impl ReadAt for File {
    #[cfg(unix)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(self, buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(self, buf, offset)
    }
}

impl ReadAt for [u8] {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= self.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }
}

impl ReadAt for Vec<u8> {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.as_slice().read_at(buf, offset)
    }
}

impl<T: ReadAt + ?Sized> ReadAt for &T {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        (**self).read_at(buf, offset)
    }
}

impl<T: ReadAt + ?Sized> ReadAt for Box<T> {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        (**self).read_at(buf, offset)
    }
}

impl<T: ReadAt + ?Sized> ReadAt for std::sync::Arc<T> {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        (**self).read_at(buf, offset)
    }
}

/// Reads from `source` until `buf` is full or the source ends.
pub(crate) fn fill_at<R: ReadAt + ?Sized>(
    source: &R,
    buf: &mut [u8],
    offset: u64,
) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read_at(&mut buf[filled..], offset + filled as u64) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(e).wrap_err_with(|| {
                    format!(
                        "failed to read {} bytes at offset {}",
                        buf.len() - filled,
                        offset + filled as u64
                    )
                })
            }
        }
    }
    Ok(filled)
}

/// Reads exactly `buf.len()` bytes at `offset`, failing if the store ends first.
pub(crate) fn read_exact_at(store: &dyn BackingStore, buf: &mut [u8], offset: u64) -> Result<()> {
    let n = store.read_at(buf, offset)?;
    if n < buf.len() {
        let err = io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("store ended after {} of {} bytes", n, buf.len()),
        );
        return Err(err).wrap_err_with(|| format!("failed to read cell at offset {}", offset));
    }
    Ok(())
}

/// Adapts a [`ReadAt`] source into a [`BackingStore`] that rejects writes.
pub struct ReadOnlyStore<R> {
    source: R,
}

impl<R: ReadAt> ReadOnlyStore<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }
}

impl<R: ReadAt + Send> BackingStore for ReadOnlyStore<R> {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        fill_at(&self.source, buf, offset)
    }

    fn write_at(&mut self, _data: &[u8], _offset: u64) -> Result<()> {
        Err(ArrayError::not_implemented("write_at").into())
    }

    fn truncate(&mut self, _len: u64) -> Result<()> {
        Err(ArrayError::not_implemented("truncate").into())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Option<Result<()>> {
        Some(Ok(()))
    }
}
