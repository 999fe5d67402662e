//! Image-file store.
//!
//! The store is a single host file holding the raw EEPROM image. Every write
//! goes through to the file before returning, so dropping the store and
//! opening the same path again shows exactly the bytes that were written.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{check_range, EepromError, Result};
use crate::traits::PersistentStore;
use crate::ERASED;

/// A store persisted to an image file on the host.
#[derive(Debug)]
pub struct FileEeprom {
    path: PathBuf,
    file: File,
    len: usize,
}

impl FileEeprom {
    /// Create a fresh, erased image of `size` bytes, replacing any file at `path`.
    pub fn create(path: impl AsRef<Path>, size: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        file.write_all(&vec![ERASED; size])?;
        file.sync_all()?;
        debug!(path = %path.display(), size, "created eeprom image");

        Ok(Self {
            path,
            file,
            len: size,
        })
    }

    /// Open an existing image. The store size is the file size.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let len = file.metadata()?.len() as usize;
        debug!(path = %path.display(), size = len, "opened eeprom image");

        Ok(Self { path, file, len })
    }

    /// Open the image at `path` if it exists, otherwise create an erased one.
    ///
    /// An existing image must be exactly `size` bytes.
    pub fn open_or_create(path: impl AsRef<Path>, size: usize) -> Result<Self> {
        let path = path.as_ref();
        match fs::metadata(path) {
            Ok(meta) if meta.len() == size as u64 => Self::open(path),
            Ok(meta) => Err(EepromError::ImageSize {
                expected: size,
                found: meta.len(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::create(path, size),
            Err(e) => Err(e.into()),
        }
    }

    /// Path of the backing image.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistentStore for FileEeprom {
    fn len(&self) -> usize {
        self.len
    }

    fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<()> {
        check_range(addr, buf.len(), self.len)?;
        self.file.seek(SeekFrom::Start(addr as u64))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn write(&mut self, addr: usize, data: &[u8]) -> Result<()> {
        check_range(addr, data.len(), self.len)?;
        self.file.seek(SeekFrom::Start(addr as u64))?;
        self.file.write_all(data)?;
        self.file.flush()?;
        Ok(())
    }
}
