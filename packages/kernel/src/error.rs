//! Error types for the kernel.

use arduinos_fs::{ErrorKind, FsError};
use thiserror::Error;

use crate::process::{ProcessId, ProcessState};
use crate::value::ValueType;

/// Errors raised by kernel operations and by running programs.
#[derive(Debug, Error)]
pub enum KernelError {
    /// A filesystem operation failed.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// No process has this id.
    #[error("process not found: {0}")]
    ProcessNotFound(ProcessId),

    /// Every process slot holds a live process.
    #[error("process table full (max {0} processes)")]
    ProcessTableFull(usize),

    /// The process is not in the state the transition starts from.
    #[error("process {id} is {state}, expected {expected}")]
    InvalidState {
        id: ProcessId,
        state: ProcessState,
        expected: ProcessState,
    },

    /// GET of a name the process never SET.
    #[error("variable '{name}' not found for process {pid}")]
    VariableNotFound { name: char, pid: ProcessId },

    /// Every variable slot is in use.
    #[error("variable table full (max {0} variables)")]
    VariableTableFull(usize),

    /// No contiguous run of variable memory is large enough.
    #[error("out of variable memory for {0} byte(s)")]
    OutOfMemory(usize),

    /// A push did not fit on the operand stack.
    #[error("operand stack overflow")]
    StackOverflow,

    /// A pop found fewer bytes than the value needs.
    #[error("operand stack underflow")]
    StackUnderflow,

    /// A type tag on the stack is not one of the four known types.
    #[error("unknown type tag {0}")]
    UnknownType(u8),

    /// An operand has the wrong type for the instruction.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: ValueType,
    },

    /// An operand has the right type but an unusable value.
    #[error("invalid operand: {0}")]
    InvalidOperand(&'static str),

    /// The byte at the program counter is not an instruction.
    #[error("unknown opcode 0x{0:02x}")]
    UnknownOpcode(u8),

    /// A jump left the program.
    #[error("invalid jump target {0}")]
    InvalidJump(usize),

    /// An instruction's inline operands run past the end of the program.
    #[error("truncated instruction")]
    TruncatedInstruction,

    /// Integer division or modulus by zero, or MAP over an empty range.
    #[error("division by zero")]
    DivisionByZero,

    /// A file instruction ran without an OPEN.
    #[error("no open file")]
    NoOpenFile,

    /// A file instruction reached past the end of the open file.
    #[error("access past end of file {name} at offset {offset}")]
    FileBounds { name: String, offset: usize },

    /// The open file was erased or replaced since OPEN.
    #[error("open file {0} no longer exists")]
    StaleFile(String),

    /// A live process runs from the file or has it open.
    #[error("file {name} is in use by process {pid}")]
    FileInUse { name: String, pid: ProcessId },
}

impl KernelError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            KernelError::Fs(e) => e.kind(),
            KernelError::ProcessNotFound(_) | KernelError::VariableNotFound { .. } => {
                ErrorKind::NotFound
            }
            KernelError::ProcessTableFull(_)
            | KernelError::VariableTableFull(_)
            | KernelError::OutOfMemory(_)
            | KernelError::StackOverflow => ErrorKind::CapacityExceeded,
            KernelError::InvalidState { .. } | KernelError::FileInUse { .. } => {
                ErrorKind::InvalidState
            }
            KernelError::StackUnderflow
            | KernelError::UnknownType(_)
            | KernelError::TypeMismatch { .. }
            | KernelError::InvalidOperand(_)
            | KernelError::UnknownOpcode(_)
            | KernelError::InvalidJump(_)
            | KernelError::TruncatedInstruction
            | KernelError::DivisionByZero
            | KernelError::NoOpenFile
            | KernelError::FileBounds { .. }
            | KernelError::StaleFile(_) => ErrorKind::FaultedProgram,
        }
    }
}

/// Result type alias for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
