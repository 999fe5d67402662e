//! # arduinos-eeprom
//!
//! The persistent byte store underneath the ArduinOS filesystem. Everything at
//! this level is pure bytes: no file table, no layout, no value semantics.
//! The store is a fixed-size array of addressable bytes with durable reads
//! and writes at byte granularity, modelled on a microcontroller EEPROM.
//!
//! Two implementations are provided:
//!
//! - [`MemoryEeprom`]: a `Vec<u8>` image, lost when dropped. Used by tests
//!   and by the shell when no image file is given.
//! - [`FileEeprom`]: an image file on the host. Every write goes straight to
//!   the file, so the contents survive a restart of the kernel.
//!
//! # Example
//!
//! ```rust
//! use arduinos_eeprom::{MemoryEeprom, PersistentStore};
//!
//! let mut eeprom = MemoryEeprom::new(64);
//! eeprom.write(10, b"hi").unwrap();
//!
//! let mut buf = [0u8; 2];
//! eeprom.read(10, &mut buf).unwrap();
//! assert_eq!(&buf, b"hi");
//! ```

pub use bytes::Bytes;

mod error;
mod file;
mod memory;
mod traits;

pub use error::{EepromError, Result};
pub use file::FileEeprom;
pub use memory::MemoryEeprom;
pub use traits::PersistentStore;

/// Default store size, matching the 1 KiB EEPROM of an ATmega328P.
pub const DEFAULT_SIZE: usize = 1024;

/// Value of an erased EEPROM cell.
pub const ERASED: u8 = 0xFF;
