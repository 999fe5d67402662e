//! Host implementations for the shell.
//!
//! The terminal host uses Reedline for interactive terminal I/O. Tests use
//! [`TestHost`](crate::io::TestHost) instead.

pub mod terminal;

pub use terminal::TerminalHost;
