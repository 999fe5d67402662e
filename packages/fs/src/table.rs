//! The file table: directory, lifecycle, and file data access.

use std::ops::Range;

use arduinos_eeprom::{PersistentStore, ERASED};
use bytes::Bytes;
use tracing::{debug, warn};
use zerocopy::{FromBytes, IntoBytes};

use crate::alloc;
use crate::error::{FsError, Repair, Result};
use crate::name::FileName;
use crate::record::{FileRecord, RECORD_SIZE};
use crate::DEFAULT_SLOTS;

/// Largest store size; every offset and length fits the 16-bit slot fields.
const MAX_STORE: usize = u16::MAX as usize;

/// Configuration for a file table.
#[derive(Debug, Clone)]
pub struct FsConfig {
    /// Number of directory slots, and so the maximum number of files.
    ///
    /// Part of the persisted layout: a store must always be mounted with the
    /// slot count it was formatted with.
    pub slots: usize,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            slots: DEFAULT_SLOTS,
        }
    }
}

/// A flat filesystem mounted on a persistent store.
///
/// The live records are cached in memory and every mutation is written
/// through to the store before the call returns, so the cache and the store
/// never disagree between calls.
pub struct FileTable<S> {
    store: S,
    config: FsConfig,
    records: Vec<FileRecord>,
    mount_repair: Option<Repair>,
}

impl<S: PersistentStore> FileTable<S> {
    /// Mount `store` with the default configuration.
    pub fn mount(store: S) -> Result<Self> {
        Self::mount_with(store, FsConfig::default())
    }

    /// Mount `store`, loading the directory and repairing the file count
    /// if it disagrees with the slots.
    ///
    /// An erased store (count byte `0xFF`, no live slots) is initialised to
    /// an empty directory without being reported as a repair.
    pub fn mount_with(store: S, config: FsConfig) -> Result<Self> {
        let data_start = 1 + config.slots * RECORD_SIZE;
        if config.slots > u8::MAX as usize || store.len() <= data_start || store.len() > MAX_STORE
        {
            return Err(FsError::StoreSize(store.len()));
        }

        let mut table = Self {
            store,
            config,
            records: Vec::new(),
            mount_repair: None,
        };

        let recorded = table.store.read_byte(0)?;
        table.records = table.scan()?;
        if recorded == ERASED && table.records.is_empty() {
            table.persist_count()?;
            debug!("initialised blank directory");
        } else if recorded as usize != table.records.len() {
            table.mount_repair = Some(table.fix_count(recorded)?);
        }

        debug!(
            files = table.records.len(),
            free = table.free_space(),
            "mounted file table"
        );
        Ok(table)
    }

    /// The repair made while mounting, if any.
    pub fn mount_repair(&self) -> Option<Repair> {
        self.mount_repair
    }

    /// Index of the live record named `name`. Exact, case-sensitive match.
    pub fn locate(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|r| r.name() == name)
    }

    /// The live record at `index`.
    pub fn record(&self, index: usize) -> Option<&FileRecord> {
        self.records.get(index)
    }

    /// The live record named `name`.
    pub fn find(&self, name: &str) -> Result<&FileRecord> {
        self.locate(name)
            .map(|i| &self.records[i])
            .ok_or_else(|| FsError::NotFound(name.to_string()))
    }

    /// Every live record, in directory order.
    pub fn list(&self) -> &[FileRecord] {
        &self.records
    }

    /// Number of live files.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no live files.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of files.
    pub fn capacity(&self) -> usize {
        self.config.slots
    }

    /// First byte after the directory.
    pub fn data_start(&self) -> usize {
        1 + self.config.slots * RECORD_SIZE
    }

    /// Create a file of `size` bytes and write `content` at its start.
    ///
    /// Content shorter than `size` leaves the rest of the range as it was.
    /// Nothing is written unless every check passes.
    pub fn create(&mut self, name: &str, size: usize, content: &[u8]) -> Result<FileRecord> {
        FileName::try_from(name)?;
        if self.locate(name).is_some() {
            return Err(FsError::NameExists(name.to_string()));
        }
        if self.records.len() >= self.config.slots {
            return Err(FsError::TableFull(self.config.slots));
        }
        if content.len() > size {
            return Err(FsError::ContentTooLarge {
                size,
                len: content.len(),
            });
        }
        let start = alloc::first_fit(self.occupied(), self.data_region(), size)
            .ok_or(FsError::OutOfSpace(size))?;

        // Offsets are below MAX_STORE, checked at mount.
        let record = FileRecord::new(name, start as u16, size as u16)?;
        self.store.write(start, content)?;
        let slot = self.records.len();
        self.write_slot(slot, &record)?;
        self.records.push(record);
        self.persist_count()?;

        debug!(name, start, size, "created file");
        Ok(record)
    }

    /// Remove the file named `name`, shifting later slots down by one.
    ///
    /// The file's data bytes stay in the store and become free space.
    pub fn erase(&mut self, name: &str) -> Result<FileRecord> {
        let index = self
            .locate(name)
            .ok_or_else(|| FsError::NotFound(name.to_string()))?;

        let record = self.records.remove(index);
        self.persist_count()?;
        for slot in index..self.records.len() {
            let moved = self.records[slot];
            self.write_slot(slot, &moved)?;
        }
        self.clear_slot(self.records.len())?;

        debug!(name, start = record.start(), size = record.size(), "erased file");
        Ok(record)
    }

    /// The full contents of the file named `name`.
    pub fn read(&mut self, name: &str) -> Result<Bytes> {
        let record = *self.find(name)?;
        Ok(self.store.read_bytes(record.start(), record.size())?)
    }

    /// Fill `buf` from `record`'s data starting at `offset`.
    pub fn read_at(&mut self, record: &FileRecord, offset: usize, buf: &mut [u8]) -> Result<()> {
        check_bounds(record, offset, buf.len())?;
        Ok(self.store.read(record.start() + offset, buf)?)
    }

    /// Write `data` into `record`'s data starting at `offset`.
    pub fn write_at(&mut self, record: &FileRecord, offset: usize, data: &[u8]) -> Result<()> {
        check_bounds(record, offset, data.len())?;
        Ok(self.store.write(record.start() + offset, data)?)
    }

    /// Length of the largest contiguous free run in the data region.
    pub fn free_space(&self) -> usize {
        alloc::largest_run(self.occupied(), self.data_region())
    }

    /// Rescan the slots and rewrite the file count if it is wrong.
    ///
    /// Returns the correction that was made, if any.
    pub fn repair(&mut self) -> Result<Option<Repair>> {
        let recorded = self.store.read_byte(0)?;
        self.records = self.scan()?;
        if recorded as usize == self.records.len() {
            return Ok(None);
        }
        self.fix_count(recorded).map(Some)
    }

    /// Wipe the whole store and start with an empty directory.
    pub fn format(&mut self) -> Result<()> {
        self.store.fill(ERASED)?;
        self.records.clear();
        self.persist_count()?;
        debug!(size = self.store.len(), "formatted store");
        Ok(())
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutably borrow the underlying store.
    ///
    /// Writes through this handle bypass the directory; use them for file
    /// data only.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Unmount and return the store.
    pub fn into_store(self) -> S {
        self.store
    }

    fn data_region(&self) -> Range<usize> {
        self.data_start()..self.store.len()
    }

    fn occupied(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.records.iter().map(FileRecord::range)
    }

    /// Live slots from 0 up to the first unusable or duplicate one.
    fn scan(&mut self) -> Result<Vec<FileRecord>> {
        let data = self.data_region();
        let mut records: Vec<FileRecord> = Vec::new();
        let mut buf = [0u8; RECORD_SIZE];
        for slot in 0..self.config.slots {
            self.store.read(slot_addr(slot), &mut buf)?;
            let Ok(record) = FileRecord::read_from_bytes(&buf) else {
                break;
            };
            let duplicate = records.iter().any(|r| r.file_name() == record.file_name());
            if !record.is_plausible(&data) || duplicate {
                break;
            }
            records.push(record);
        }
        Ok(records)
    }

    fn fix_count(&mut self, recorded: u8) -> Result<Repair> {
        self.persist_count()?;
        let repair = Repair {
            recorded,
            actual: self.records.len() as u8,
        };
        warn!(recorded, actual = repair.actual, "directory correction made");
        Ok(repair)
    }

    fn persist_count(&mut self) -> Result<()> {
        Ok(self.store.write_byte(0, self.records.len() as u8)?)
    }

    fn write_slot(&mut self, slot: usize, record: &FileRecord) -> Result<()> {
        Ok(self.store.write(slot_addr(slot), record.as_bytes())?)
    }

    fn clear_slot(&mut self, slot: usize) -> Result<()> {
        Ok(self.store.write(slot_addr(slot), &[ERASED; RECORD_SIZE])?)
    }
}

fn slot_addr(slot: usize) -> usize {
    1 + slot * RECORD_SIZE
}

fn check_bounds(record: &FileRecord, offset: usize, len: usize) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= record.size() => Ok(()),
        _ => Err(FsError::OutOfBounds {
            name: record.name().to_string(),
            offset,
            len,
            size: record.size(),
        }),
    }
}
