//! The kernel facade: file table, processes, variables and devices under
//! one owner, driven by [`Kernel::tick`].

use std::fmt;

use arduinos_fs::{FileRecord, FileTable, PersistentStore};
use tracing::{debug, warn};

use crate::console::Console;
use crate::error::{KernelError, Result};
use crate::hal::Hal;
use crate::machine::{Machine, Step};
use crate::process::{
    Process, ProcessId, ProcessInfo, ProcessState, ProcessTable, DEFAULT_MAX_PROCESSES,
};
use crate::stack::DEFAULT_STACK_SIZE;
use crate::value::Value;
use crate::variables::{VariableStore, DEFAULT_MAX_VARIABLES, DEFAULT_RAM_SIZE};

/// Default number of scheduler passes the shell runs after each command.
pub const DEFAULT_TICKS_PER_COMMAND: usize = 64;

/// Kernel sizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelConfig {
    /// Process table capacity.
    pub max_processes: usize,
    /// Operand stack bytes per process.
    pub stack_size: usize,
    /// Variable table capacity.
    pub max_variables: usize,
    /// Bytes of variable memory.
    pub ram_size: usize,
    /// Scheduler passes per shell command.
    pub ticks_per_command: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_processes: DEFAULT_MAX_PROCESSES,
            stack_size: DEFAULT_STACK_SIZE,
            max_variables: DEFAULT_MAX_VARIABLES,
            ram_size: DEFAULT_RAM_SIZE,
            ticks_per_command: DEFAULT_TICKS_PER_COMMAND,
        }
    }
}

/// A process killed by an error in its program.
#[derive(Debug)]
pub struct Fault {
    pub pid: ProcessId,
    pub name: String,
    /// Store offset of the faulting instruction.
    pub at: usize,
    pub error: KernelError,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "process {} ({}) faulted at {}: {}",
            self.pid, self.name, self.at, self.error
        )
    }
}

/// What one or more scheduler passes did.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Process steps taken, including faults and falling off the end.
    pub executed: usize,
    pub faults: Vec<Fault>,
}

impl TickReport {
    fn absorb(&mut self, other: TickReport) {
        self.executed += other.executed;
        self.faults.extend(other.faults);
    }
}

/// The kernel.
///
/// Owns the file table, the process table, variable memory, the board and
/// the console. Nothing runs unless [`tick`](Self::tick) is called.
pub struct Kernel<S, H, C> {
    fs: FileTable<S>,
    procs: ProcessTable,
    vars: VariableStore,
    hal: H,
    console: C,
    config: KernelConfig,
}

impl<S: PersistentStore, H: Hal, C: Console> Kernel<S, H, C> {
    pub fn new(fs: FileTable<S>, hal: H, console: C, config: KernelConfig) -> Self {
        Self {
            procs: ProcessTable::new(config.max_processes, config.stack_size),
            vars: VariableStore::new(config.max_variables, config.ram_size),
            fs,
            hal,
            console,
            config,
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn fs(&self) -> &FileTable<S> {
        &self.fs
    }

    pub fn fs_mut(&mut self) -> &mut FileTable<S> {
        &mut self.fs
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }

    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    pub fn processes(&self) -> &ProcessTable {
        &self.procs
    }

    pub fn variables(&self) -> &VariableStore {
        &self.vars
    }

    /// Start the program stored in `file`.
    pub fn spawn(&mut self, file: &str) -> Result<ProcessId> {
        let record = *self.fs.find(file)?;
        self.procs.spawn(record.name(), record.range())
    }

    pub fn suspend(&mut self, id: ProcessId) -> Result<()> {
        self.procs.suspend(id)
    }

    pub fn resume(&mut self, id: ProcessId) -> Result<()> {
        self.procs.resume(id)
    }

    /// Terminate a process from any state and drop its variables.
    pub fn kill(&mut self, id: ProcessId) -> Result<()> {
        if self.procs.terminate(id)? {
            self.vars.release_all(id);
        }
        Ok(())
    }

    pub fn list(&self) -> Vec<ProcessInfo> {
        self.procs.list()
    }

    /// Erase a file that no live process runs from or has open.
    pub fn erase(&mut self, name: &str) -> Result<FileRecord> {
        let record = *self.fs.find(name)?;
        if let Some(user) = self.procs.iter().find(|p| p.holds(&record)) {
            return Err(KernelError::FileInUse {
                name: name.to_string(),
                pid: user.id(),
            });
        }
        Ok(self.fs.erase(name)?)
    }

    /// Kill every live process, then format the filesystem.
    pub fn wipe(&mut self) -> Result<()> {
        let live: Vec<ProcessId> = self
            .procs
            .iter()
            .filter(|p| p.state() != ProcessState::Terminated)
            .map(|p| p.id())
            .collect();
        for pid in live {
            self.kill(pid)?;
        }
        self.fs.format()?;
        Ok(())
    }

    /// One scheduler pass: a single instruction for every process that was
    /// RUNNING when the pass began, in slot order.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        for pid in self.procs.running() {
            let Some(proc) = self.procs.get_mut(pid) else {
                continue;
            };
            if proc.state() != ProcessState::Running {
                continue;
            }

            let at = proc.program_counter();
            let outcome = Machine {
                fs: &mut self.fs,
                vars: &mut self.vars,
                hal: &mut self.hal,
                console: &mut self.console,
            }
            .step(proc);
            report.executed += 1;

            if let Err(error) = outcome.and_then(|step| self.trap(pid, at, step)) {
                let fault = self.fault(pid, at, error);
                report.faults.push(fault);
            }
        }

        report
    }

    /// Run `passes` scheduler passes.
    pub fn run_ticks(&mut self, passes: usize) -> TickReport {
        let mut report = TickReport::default();
        for _ in 0..passes {
            report.absorb(self.tick());
        }
        report
    }

    /// Carry out what an instruction asked of the process table.
    fn trap(&mut self, pid: ProcessId, at: usize, step: Step) -> Result<()> {
        match step {
            Step::Continue => Ok(()),
            Step::Stop => {
                debug!(pid = %pid, "process finished");
                self.kill(pid)
            }
            Step::Fork(name) => {
                let child = match self.spawn(&name) {
                    Ok(child) => child.0 as i16,
                    Err(error) => {
                        warn!(pid = %pid, file = %name, %error, "fork failed");
                        -1
                    }
                };
                self.process_mut(pid)?.stack.push(&Value::Int(child))
            }
            Step::Wait(target) => {
                let done = self
                    .procs
                    .get(target)
                    .map_or(true, |p| p.state() == ProcessState::Terminated);
                if !done {
                    let proc = self.process_mut(pid)?;
                    proc.stack.push(&Value::Int(target.0 as i16))?;
                    proc.pc = at;
                }
                Ok(())
            }
        }
    }

    /// Report a fault on the console and kill the process.
    fn fault(&mut self, pid: ProcessId, at: usize, error: KernelError) -> Fault {
        let name = self
            .procs
            .get(pid)
            .map(|p| p.name().to_string())
            .unwrap_or_default();
        let fault = Fault {
            pid,
            name,
            at,
            error,
        };
        warn!(pid = %pid, at, error = %fault.error, "process faulted");
        self.console.write_line(&fault.to_string());
        if let Err(error) = self.kill(pid) {
            warn!(pid = %pid, %error, "could not kill faulted process");
        }
        fault
    }

    fn process_mut(&mut self, pid: ProcessId) -> Result<&mut Process> {
        self.procs
            .get_mut(pid)
            .ok_or(KernelError::ProcessNotFound(pid))
    }
}
