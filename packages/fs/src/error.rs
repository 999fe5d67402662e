//! Error types for the filesystem, and the error taxonomy shared with the kernel.

use arduinos_eeprom::EepromError;
use thiserror::Error;

/// Coarse classification of every failure in the system.
///
/// Filesystem and kernel errors both map onto these kinds, so callers such
/// as the shell can decide how to report a failure without matching on
/// every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A name or id did not resolve.
    NotFound,
    /// A table, stack, or store is full. Nothing was changed.
    CapacityExceeded,
    /// The target exists but is in the wrong state for the operation.
    InvalidState,
    /// The directory count disagreed with its contents and was corrected.
    CorruptedDirectory,
    /// A running program did something illegal and was terminated.
    FaultedProgram,
    /// The caller passed a malformed argument.
    InvalidInput,
    /// The underlying store failed.
    Storage,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::CapacityExceeded => "capacity exceeded",
            ErrorKind::InvalidState => "invalid state",
            ErrorKind::CorruptedDirectory => "corrupted directory",
            ErrorKind::FaultedProgram => "faulted program",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Storage => "storage failure",
        };
        f.write_str(s)
    }
}

/// Errors from [`FileTable`](crate::FileTable) operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// No live record has this name.
    #[error("file not found: {0}")]
    NotFound(String),

    /// A live record already has this name.
    #[error("file already exists: {0}")]
    NameExists(String),

    /// Every directory slot is in use.
    #[error("file table full (max {0} files)")]
    TableFull(usize),

    /// No contiguous free run is large enough.
    #[error("not enough contiguous space for {0} byte(s)")]
    OutOfSpace(usize),

    /// The name is empty, too long, or has characters outside printable ASCII.
    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    /// More content than the requested file size.
    #[error("content is {len} byte(s) but the file is only {size}")]
    ContentTooLarge { size: usize, len: usize },

    /// A read or write inside a file ran past its end.
    #[error("access out of bounds: {len} byte(s) at offset {offset} of {name} ({size} bytes)")]
    OutOfBounds {
        name: String,
        offset: usize,
        len: usize,
        size: usize,
    },

    /// The persisted file count disagreed with the directory scan.
    ///
    /// By the time this is reported the count has already been rewritten.
    #[error("directory correction made: recorded {recorded} file(s), found {actual}")]
    CorruptedDirectory { recorded: u8, actual: u8 },

    /// The store is too small for the directory, or too large to address.
    #[error("store of {0} bytes cannot hold a file table")]
    StoreSize(usize),

    /// The underlying store failed.
    #[error("store error: {0}")]
    Store(#[from] EepromError),
}

impl FsError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::NotFound(_) => ErrorKind::NotFound,
            FsError::TableFull(_) | FsError::OutOfSpace(_) => ErrorKind::CapacityExceeded,
            FsError::NameExists(_)
            | FsError::InvalidName(_)
            | FsError::ContentTooLarge { .. }
            | FsError::OutOfBounds { .. }
            | FsError::StoreSize(_) => ErrorKind::InvalidInput,
            FsError::CorruptedDirectory { .. } => ErrorKind::CorruptedDirectory,
            FsError::Store(_) => ErrorKind::Storage,
        }
    }
}

/// Report of a directory repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repair {
    /// Count that was persisted before the repair.
    pub recorded: u8,
    /// Count found by scanning the slots, now persisted.
    pub actual: u8,
}

impl From<Repair> for FsError {
    fn from(repair: Repair) -> Self {
        FsError::CorruptedDirectory {
            recorded: repair.recorded,
            actual: repair.actual,
        }
    }
}

/// Result type alias for filesystem operations.
pub type Result<T> = std::result::Result<T, FsError>;
