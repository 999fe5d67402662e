//! Directory slots.

use std::ops::Range;

use zerocopy::byteorder::little_endian::U16;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::Result;
use crate::name::FileName;

/// Size of one persisted directory slot.
pub const RECORD_SIZE: usize = std::mem::size_of::<FileRecord>();

/// One file: its name and the byte range it owns in the store.
///
/// This is also the exact on-store layout of a directory slot.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq)]
#[derive(FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct FileRecord {
    name: FileName,
    start: U16,
    size: U16,
}

impl FileRecord {
    /// Build a record. `start` and `size` must fit the 16-bit slot fields,
    /// which [`FileTable`](crate::FileTable) guarantees by rejecting larger stores.
    pub fn new(name: &str, start: u16, size: u16) -> Result<Self> {
        Ok(Self {
            name: FileName::try_from(name)?,
            start: U16::new(start),
            size: U16::new(size),
        })
    }

    /// The file's name.
    pub fn name(&self) -> &str {
        self.name.as_str().unwrap_or_default()
    }

    /// Offset of the first data byte.
    pub fn start(&self) -> usize {
        self.start.get() as usize
    }

    /// Number of data bytes.
    pub fn size(&self) -> usize {
        self.size.get() as usize
    }

    /// One past the last data byte.
    pub fn end(&self) -> usize {
        self.start() + self.size()
    }

    /// The data range `[start, start + size)`.
    pub fn range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    /// Whether this slot holds a usable record for a data region.
    pub(crate) fn is_plausible(&self, data: &Range<usize>) -> bool {
        self.name.as_str().is_some() && self.start() >= data.start && self.end() <= data.end
    }

    pub(crate) fn file_name(&self) -> &FileName {
        &self.name
    }
}

impl std::fmt::Debug for FileRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRecord")
            .field("name", &self.name)
            .field("start", &self.start())
            .field("size", &self.size())
            .finish()
    }
}
