use arduinos_eeprom::EepromError;
use arduinos_fs::FsError;
use thiserror::Error;

use crate::io::IoError;

/// Errors that end a shell session.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The EEPROM image could not be opened.
    #[error(transparent)]
    Eeprom(#[from] EepromError),

    /// The filesystem could not be mounted.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// The terminal could not be set up.
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    #[error(transparent)]
    Io(#[from] IoError),
}
