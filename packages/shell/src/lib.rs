//! # arduinos-shell
//!
//! An interactive shell for the ArduinOS kernel.
//!
//! The shell mounts a filesystem on an EEPROM image, boots a kernel on it and
//! reads commands from the terminal. Between commands the scheduler keeps
//! running, so programs started with `run` make progress while the shell
//! waits and their output appears after each command.
//!
//! ## Features
//!
//! - File commands: `store`, `retrieve`, `erase`, `files`, `freespace`, `wipe`
//! - `import` to copy a compiled program from the host into the filesystem
//! - Process commands: `run`, `list`, `suspend`, `resume`, `kill`, `tick`
//! - Tab completion and highlighting of command names
//! - Vi mode support (detected from EDITOR, .inputrc, or ARDUINOS_EDIT_MODE)
//! - Command history
//!
//! ## Usage
//!
//! ```bash
//! # Persistent image in the current directory
//! arduinos --image eeprom.bin
//!
//! # Inside the shell:
//! > import blink ./blink.bin
//! > run blink
//! > list
//! > kill 0
//! ```

pub mod commands;
pub mod completer;
pub mod error;
pub mod highlighter;
pub mod host;
pub mod io;
pub mod shell;

use std::path::PathBuf;

use arduinos_eeprom::{FileEeprom, MemoryEeprom, PersistentStore, DEFAULT_SIZE};
use arduinos_fs::FileTable;
use arduinos_kernel::{BufferConsole, Kernel, KernelConfig, SimulatedHal};
use tracing::info;

pub use error::ShellError;
pub use io::ExitReason;
pub use shell::ShellCore;

/// Line editing mode for the terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditPreference {
    /// Follow EDITOR, VISUAL, .inputrc and ARDUINOS_EDIT_MODE.
    #[default]
    Auto,
    Vi,
    Emacs,
}

/// How to boot the shell.
#[derive(Debug, Clone)]
pub struct ShellOptions {
    /// EEPROM image on the host. `None` keeps the store in memory.
    pub image: Option<PathBuf>,
    /// Store size in bytes, used when the image is created.
    pub size: usize,
    pub kernel: KernelConfig,
    pub edit_mode: EditPreference,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            image: None,
            size: DEFAULT_SIZE,
            kernel: KernelConfig::default(),
            edit_mode: EditPreference::default(),
        }
    }
}

/// Boot a kernel and run the interactive shell until the user leaves.
pub fn run(options: ShellOptions) -> Result<ExitReason, ShellError> {
    let store: Box<dyn PersistentStore> = match &options.image {
        Some(path) => {
            info!(path = %path.display(), size = options.size, "opening EEPROM image");
            Box::new(FileEeprom::open_or_create(path, options.size)?)
        }
        None => {
            info!(size = options.size, "using in-memory EEPROM");
            Box::new(MemoryEeprom::new(options.size))
        }
    };

    let fs = FileTable::mount(store)?;
    let kernel = Kernel::new(
        fs,
        SimulatedHal::new(),
        BufferConsole::new(),
        options.kernel,
    );

    let mut host = host::TerminalHost::new(options.edit_mode)?;
    Ok(ShellCore::new(kernel).run(&mut host)?)
}
