//! # File-Backed Store
//!
//! `FileStore` serves a paged array from an ordinary file using positional
//! reads and writes (`pread`/`pwrite` on Unix, `seek_read`/`seek_write` on
//! Windows), so no shared cursor state exists on the handle.
//!
//! A store created by [`FileStore::temporary`] owns its path and deletes the
//! file when closed (or dropped). Stores opened on an existing file never
//! delete it.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use tempfile::{NamedTempFile, TempPath};
use tracing::debug;

use super::driver::{fill_at, BackingStore};

#[derive(Debug)]
pub struct FileStore {
    file: File,
    path: Option<PathBuf>,
    temp: Option<TempPath>,
}

impl FileStore {
    /// Wraps an already-open read-write handle.
    pub fn new(file: File) -> Self {
        Self {
            file,
            path: None,
            temp: None,
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .wrap_err_with(|| format!("failed to open backing file '{}'", path.display()))?;

        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
            temp: None,
        })
    }

    /// Creates (or truncates) `path` and sizes it to `len` zero bytes.
    pub fn create<P: AsRef<Path>>(path: P, len: u64) -> Result<Self> {
        let path = path.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .wrap_err_with(|| format!("failed to create backing file '{}'", path.display()))?;

        file.set_len(len)
            .wrap_err_with(|| format!("failed to set file size to {} bytes", len))?;

        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
            temp: None,
        })
    }

    /// Creates an anonymous temporary file of `len` zero bytes, removed on close.
    pub fn temporary(len: u64) -> Result<Self> {
        let (file, temp) = NamedTempFile::new()
            .wrap_err("failed to create temporary backing file")?
            .into_parts();

        file.set_len(len)
            .wrap_err_with(|| format!("failed to size temporary file to {} bytes", len))?;

        debug!(path = %temp.display(), len, "created temporary backing file");

        Ok(Self {
            file,
            path: Some(temp.to_path_buf()),
            temp: Some(temp),
        })
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    #[cfg(unix)]
    fn write_all_at(&self, data: &[u8], offset: u64) -> io::Result<()> {
        std::os::unix::fs::FileExt::write_all_at(&self.file, data, offset)
    }

    #[cfg(windows)]
    fn write_all_at(&self, mut data: &[u8], mut offset: u64) -> io::Result<()> {
        use std::os::windows::fs::FileExt;
        while !data.is_empty() {
            match self.file.seek_write(data, offset) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    data = &data[n..];
                    offset += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl BackingStore for FileStore {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        fill_at(&self.file, buf, offset)
    }

    fn write_at(&mut self, data: &[u8], offset: u64) -> Result<()> {
        self.write_all_at(data, offset)
            .wrap_err_with(|| format!("failed to write {} bytes at offset {}", data.len(), offset))
    }

    fn truncate(&mut self, len: u64) -> Result<()> {
        self.file
            .set_len(len)
            .wrap_err_with(|| format!("failed to truncate backing file to {} bytes", len))
    }

    fn close(&mut self) -> Result<()> {
        if let Some(temp) = self.temp.take() {
            let path = temp.to_path_buf();
            temp.close()
                .wrap_err_with(|| format!("failed to remove temporary file '{}'", path.display()))?;
            debug!(path = %path.display(), "removed temporary backing file");
        }
        Ok(())
    }

    fn flush(&mut self) -> Option<Result<()>> {
        Some(self.file.flush().wrap_err("failed to flush backing file"))
    }

    fn sync(&mut self) -> Option<Result<()>> {
        Some(self.file.sync_all().wrap_err("failed to sync backing file"))
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
