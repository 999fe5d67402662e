//! The store trait.

use bytes::Bytes;

use crate::error::Result;

/// A fixed-size array of durable, byte-addressable cells.
///
/// Reads take `&mut self` because file-backed stores move a cursor.
/// Writes are synchronous: once `write` returns `Ok`, the bytes are what the
/// next `read` sees, including after the store is reopened.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn PersistentStore>`.
pub trait PersistentStore {
    /// Size of the store in bytes.
    fn len(&self) -> usize;

    /// Fill `buf` with the bytes starting at `addr`.
    fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<()>;

    /// Write `data` starting at `addr`.
    fn write(&mut self, addr: usize, data: &[u8]) -> Result<()>;

    /// Whether the store has no addressable bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a single byte.
    fn read_byte(&mut self, addr: usize) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read(addr, &mut buf)?;
        Ok(buf[0])
    }

    /// Write a single byte.
    fn write_byte(&mut self, addr: usize, value: u8) -> Result<()> {
        self.write(addr, &[value])
    }

    /// Read `len` bytes starting at `addr` into an owned buffer.
    fn read_bytes(&mut self, addr: usize, len: usize) -> Result<Bytes> {
        let mut buf = vec![0u8; len];
        self.read(addr, &mut buf)?;
        Ok(Bytes::from(buf))
    }

    /// Set every cell in the store to `value`.
    fn fill(&mut self, value: u8) -> Result<()> {
        let chunk = [value; 64];
        let len = self.len();
        let mut addr = 0;
        while addr < len {
            let n = chunk.len().min(len - addr);
            self.write(addr, &chunk[..n])?;
            addr += n;
        }
        Ok(())
    }
}

// Blanket implementations for references and boxes

impl<T: PersistentStore + ?Sized> PersistentStore for &mut T {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<()> {
        (**self).read(addr, buf)
    }

    fn write(&mut self, addr: usize, data: &[u8]) -> Result<()> {
        (**self).write(addr, data)
    }
}

impl<T: PersistentStore + ?Sized> PersistentStore for Box<T> {
    fn len(&self) -> usize {
        self.as_ref().len()
    }

    fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<()> {
        self.as_mut().read(addr, buf)
    }

    fn write(&mut self, addr: usize, data: &[u8]) -> Result<()> {
        self.as_mut().write(addr, data)
    }
}
