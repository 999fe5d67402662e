//! In-memory store.

use crate::error::{check_range, Result};
use crate::traits::PersistentStore;
use crate::{DEFAULT_SIZE, ERASED};

/// A store backed by a `Vec<u8>`.
///
/// A new store reads as erased EEPROM: every cell is `0xFF`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEeprom {
    cells: Vec<u8>,
}

impl MemoryEeprom {
    /// Create an erased store of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![ERASED; size],
        }
    }

    /// Wrap an existing image.
    pub fn from_image(image: Vec<u8>) -> Self {
        Self { cells: image }
    }

    /// Borrow the raw image.
    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }

    /// Consume the store and return its image.
    pub fn into_image(self) -> Vec<u8> {
        self.cells
    }
}

impl Default for MemoryEeprom {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE)
    }
}

impl PersistentStore for MemoryEeprom {
    fn len(&self) -> usize {
        self.cells.len()
    }

    fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<()> {
        check_range(addr, buf.len(), self.cells.len())?;
        buf.copy_from_slice(&self.cells[addr..addr + buf.len()]);
        Ok(())
    }

    fn write(&mut self, addr: usize, data: &[u8]) -> Result<()> {
        check_range(addr, data.len(), self.cells.len())?;
        self.cells[addr..addr + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn fill(&mut self, value: u8) -> Result<()> {
        self.cells.fill(value);
        Ok(())
    }
}
