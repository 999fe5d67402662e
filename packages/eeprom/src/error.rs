//! Error types for the store layer.
//!
//! Errors at this level are about addressing and transport only. Anything
//! that needs to know what the bytes mean belongs in the filesystem.

/// Errors raised by a [`PersistentStore`](crate::PersistentStore).
#[derive(Debug, thiserror::Error)]
pub enum EepromError {
    /// An access fell outside the store.
    #[error("access out of range: {len} byte(s) at {addr} (store is {size} bytes)")]
    OutOfRange {
        /// First byte of the access.
        addr: usize,
        /// Number of bytes requested.
        len: usize,
        /// Size of the store.
        size: usize,
    },

    /// An existing image file does not have the expected size.
    #[error("image size mismatch: expected {expected} bytes, found {found}")]
    ImageSize {
        /// Size the caller asked for.
        expected: usize,
        /// Size found on disk.
        found: u64,
    },

    /// Host I/O failed while touching an image file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, EepromError>;

/// Check that `len` bytes starting at `addr` fit in a store of `size` bytes.
pub(crate) fn check_range(addr: usize, len: usize, size: usize) -> Result<()> {
    match addr.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(EepromError::OutOfRange { addr, len, size }),
    }
}
