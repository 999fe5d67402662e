//! Values exchanged between the shell core and its host.

use serde::{Deserialize, Serialize};

/// One line typed at the prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputLine {
    pub line: String,
}

/// Out-of-band input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "lowercase")]
pub enum Signal {
    /// Ctrl+C.
    Interrupt,
    /// Ctrl+D.
    Eof,
}

/// Text for the user, with a style hint for the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub text: String,
    #[serde(default)]
    pub style: OutputStyle,
}

impl Output {
    fn styled(text: impl Into<String>, style: OutputStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn normal(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Normal)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Error)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Info)
    }

    pub fn banner(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Banner)
    }

    /// Console output of running programs, passed through verbatim.
    pub fn program(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Program)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// Command output. May already contain ANSI codes.
    #[default]
    Normal,
    /// A failed command. The host may add a prefix.
    Error,
    Info,
    Banner,
    /// Raw text from PRINT and PRINTLN, which may not end in a newline.
    Program,
}

/// What the prompt shows.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptConfig {
    /// Processes currently RUNNING.
    pub running: usize,
    /// Largest free run in the filesystem, in bytes.
    pub free_space: usize,
}

/// Why the shell stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// `exit` was entered.
    UserExit,
    /// Ctrl+D.
    Eof,
}
