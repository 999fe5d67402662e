//! Platform-independent shell loop.
//!
//! The core reads a command from its [`IoHost`], executes it against the
//! kernel, then keeps the scheduler going for a configured number of passes
//! so that programs make progress between prompts. Whatever programs printed
//! is forwarded to the host after every command.

use arduinos_fs::{FsError, PersistentStore};
use arduinos_kernel::{BufferConsole, Hal, Kernel, ProcessState};
use tracing::debug;

use crate::commands::{self, CommandResult};
use crate::io::{ExitReason, IoError, IoHost, Output, PromptConfig, Signal};

/// The shell core, owning the kernel it drives.
pub struct ShellCore<S, H> {
    kernel: Kernel<S, H, BufferConsole>,
}

impl<S: PersistentStore, H: Hal> ShellCore<S, H> {
    pub fn new(kernel: Kernel<S, H, BufferConsole>) -> Self {
        Self { kernel }
    }

    /// Run until `exit` or end of input.
    pub fn run(&mut self, io: &mut impl IoHost) -> Result<ExitReason, IoError> {
        io.write_output(Output::banner(banner()))?;
        if let Some(repair) = self.kernel.fs().mount_repair() {
            io.write_output(Output::info(FsError::from(repair).to_string()))?;
        }

        loop {
            self.update_prompt(io)?;
            io.wait_for_input()?;

            if let Some(signal) = io.read_signal()? {
                match signal {
                    Signal::Eof => {
                        io.write_output(Output::info("Goodbye!"))?;
                        io.flush()?;
                        return Ok(ExitReason::Eof);
                    }
                    Signal::Interrupt => {
                        io.write_output(Output::info("^C (use 'exit' to quit)"))?;
                        continue;
                    }
                }
            }

            let Some(input) = io.read_input()? else {
                continue;
            };

            match commands::execute(&input.line, &mut self.kernel) {
                CommandResult::Ok { display: None } => {}
                CommandResult::Ok {
                    display: Some(output),
                } => io.write_output(Output::normal(output))?,
                CommandResult::Error(msg) => io.write_output(Output::error(msg))?,
                CommandResult::Help => io.write_output(Output::normal(commands::format_help()))?,
                CommandResult::Exit => {
                    io.write_output(Output::info("Goodbye!"))?;
                    io.flush()?;
                    return Ok(ExitReason::UserExit);
                }
            }

            self.drain_console(io)?;
            self.run_scheduler(io)?;
            io.flush()?;
        }
    }

    pub fn kernel(&self) -> &Kernel<S, H, BufferConsole> {
        &self.kernel
    }

    pub fn kernel_mut(&mut self) -> &mut Kernel<S, H, BufferConsole> {
        &mut self.kernel
    }

    /// Let programs run between commands.
    fn run_scheduler(&mut self, io: &mut impl IoHost) -> Result<(), IoError> {
        let passes = self.kernel.config().ticks_per_command;
        let report = self.kernel.run_ticks(passes);
        if report.executed > 0 {
            debug!(
                passes,
                executed = report.executed,
                faults = report.faults.len(),
                "scheduler ran"
            );
        }
        self.drain_console(io)
    }

    fn drain_console(&mut self, io: &mut impl IoHost) -> Result<(), IoError> {
        let text = self.kernel.console_mut().take();
        if text.is_empty() {
            return Ok(());
        }
        io.write_output(Output::program(text))
    }

    fn update_prompt(&self, io: &mut impl IoHost) -> Result<(), IoError> {
        let running = self
            .kernel
            .list()
            .iter()
            .filter(|p| p.state == ProcessState::Running)
            .count();
        io.write_prompt(PromptConfig {
            running,
            free_space: self.kernel.fs().free_space(),
        })
    }
}

fn banner() -> String {
    format!(
        "ArduinOS version {}\nStarted. Waiting for commands...\nEnter 'help' for help.",
        env!("CARGO_PKG_VERSION")
    )
}
