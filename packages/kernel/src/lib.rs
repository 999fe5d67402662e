//! # arduinos-kernel
//!
//! A cooperative multi-process bytecode VM on top of [`arduinos_fs`].
//!
//! Programs are files in the filesystem. [`Kernel::spawn`] starts one as a
//! process with its own operand stack, and every call to [`Kernel::tick`]
//! runs exactly one instruction of each RUNNING process in slot order.
//! Nothing blocks: DELAY, DELAYUNTIL and WAITUNTILDONE re-execute on later
//! ticks until they are satisfied.
//!
//! Values on the operand stack are self-describing. Each value is pushed as
//! its payload followed by a one-byte type tag, so a pop reads the tag first
//! and then knows how many bytes belong to the value.
//!
//! A program that faults (unknown opcode, bad jump, type mismatch, stack
//! overflow, ...) is reported on the [`Console`] and killed. The kernel
//! itself keeps running.
//!
//! # Example
//!
//! ```rust
//! use arduinos_eeprom::MemoryEeprom;
//! use arduinos_fs::FileTable;
//! use arduinos_kernel::{BufferConsole, Kernel, KernelConfig, Opcode, SimulatedHal};
//!
//! let mut fs = FileTable::mount(MemoryEeprom::default()).unwrap();
//! let program = [
//!     Opcode::Int as u8, 0, 5,
//!     Opcode::Int as u8, 0, 3,
//!     Opcode::Plus as u8,
//!     Opcode::PrintLn as u8,
//! ];
//! fs.create("sum", program.len(), &program).unwrap();
//!
//! let mut kernel = Kernel::new(
//!     fs,
//!     SimulatedHal::new(),
//!     BufferConsole::new(),
//!     KernelConfig::default(),
//! );
//! kernel.spawn("sum").unwrap();
//! kernel.run_ticks(4);
//! assert_eq!(kernel.console().contents(), "8\n");
//! ```

mod console;
mod error;
mod hal;
mod kernel;
mod machine;
mod opcode;
mod ops;
mod process;
mod stack;
mod value;
mod variables;

pub use console::{BufferConsole, Console};
pub use error::{KernelError, Result};
pub use hal::{Hal, Pin, SimulatedHal};
pub use kernel::{Fault, Kernel, KernelConfig, TickReport, DEFAULT_TICKS_PER_COMMAND};
pub use opcode::Opcode;
pub use process::{
    OpenFile, Process, ProcessId, ProcessInfo, ProcessState, ProcessTable, DEFAULT_MAX_PROCESSES,
};
pub use stack::{OperandStack, DEFAULT_STACK_SIZE};
pub use value::{Value, ValueType};
pub use variables::{Variable, VariableStore, DEFAULT_MAX_VARIABLES, DEFAULT_RAM_SIZE};

pub use arduinos_fs::ErrorKind;
