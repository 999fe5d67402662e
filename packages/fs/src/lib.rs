//! # arduinos-fs
//!
//! A flat, persistent micro-filesystem over a [`PersistentStore`].
//!
//! The head of the store holds the directory: byte 0 is the live file
//! count, followed by a fixed number of 16-byte [`FileRecord`] slots. File
//! data lives after the directory, one contiguous range per file, placed
//! first-fit from the lowest free address.
//!
//! ```text
//! 0      1                                  data_start              len
//! ┌──────┬──────────┬──────────┬─────┬──────┬───────────────────────┐
//! │count │ slot 0   │ slot 1   │ ... │slot N│ file data ...         │
//! └──────┴──────────┴──────────┴─────┴──────┴───────────────────────┘
//!          name[12] start:u16le size:u16le
//! ```
//!
//! The directory is kept dense: erasing a file shifts every later slot down
//! by one. File data is never moved, so erased ranges simply become free
//! again. There is no defragmentation.
//!
//! # Example
//!
//! ```rust
//! use arduinos_eeprom::MemoryEeprom;
//! use arduinos_fs::FileTable;
//!
//! let mut fs = FileTable::mount(MemoryEeprom::default()).unwrap();
//! fs.create("a", 5, b"hello").unwrap();
//!
//! assert_eq!(fs.record(fs.locate("a").unwrap()).unwrap().size(), 5);
//! assert_eq!(&fs.read("a").unwrap()[..], b"hello");
//! ```

pub mod alloc;
mod error;
mod name;
mod record;
mod table;

pub use arduinos_eeprom::PersistentStore;
pub use error::{ErrorKind, FsError, Repair, Result};
pub use name::{FileName, NAME_MAX};
pub use record::{FileRecord, RECORD_SIZE};
pub use table::{FileTable, FsConfig};

/// Default number of directory slots.
pub const DEFAULT_SLOTS: usize = 10;
