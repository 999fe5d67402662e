//! The boundary between the shell core and whatever drives it.
//!
//! [`ShellCore`](crate::shell::ShellCore) only talks to an [`IoHost`]. The
//! terminal host backs it with reedline; tests use an in-memory host.

pub mod types;

#[cfg(test)]
pub mod test_host;

pub use types::*;

#[cfg(test)]
pub use test_host::TestHost;

/// Failure talking to the host.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(String),
}

/// What the shell core needs from its host.
pub trait IoHost {
    /// Block until a line or a signal is available.
    fn wait_for_input(&mut self) -> Result<(), IoError>;

    /// Take the pending input line, if any.
    fn read_input(&mut self) -> Result<Option<InputLine>, IoError>;

    /// Take the pending signal, if any. Checked before input.
    fn read_signal(&mut self) -> Result<Option<Signal>, IoError>;

    fn write_output(&mut self, output: Output) -> Result<(), IoError>;

    /// Update what the next prompt shows.
    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError>;

    fn flush(&mut self) -> Result<(), IoError> {
        Ok(())
    }
}
