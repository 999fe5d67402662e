//! Process control blocks and the process table.

use std::fmt;
use std::ops::Range;

use arduinos_fs::FileRecord;
use tracing::debug;

use crate::error::{KernelError, Result};
use crate::stack::OperandStack;

/// Default number of process slots.
pub const DEFAULT_MAX_PROCESSES: usize = 10;

/// Stable external handle for a process.
///
/// Ids are handed out in increasing order and are not reused, so an id seen
/// in `list` keeps naming the same process even after its slot is recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(pub u16);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Scheduling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessState {
    Running,
    Paused,
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessState::Running => "RUNNING",
            ProcessState::Paused => "PAUSED",
            ProcessState::Terminated => "TERMINATED",
        };
        f.write_str(s)
    }
}

/// A file opened by a running program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFile {
    pub record: FileRecord,
    pub cursor: usize,
}

/// A process control block.
#[derive(Debug, Clone)]
pub struct Process {
    id: ProcessId,
    name: String,
    state: ProcessState,
    pub(crate) pc: usize,
    pub(crate) code: Range<usize>,
    pub(crate) stack: OperandStack,
    pub(crate) loop_start: Option<usize>,
    pub(crate) wait_until: Option<u32>,
    pub(crate) file: Option<OpenFile>,
}

impl Process {
    fn new(id: ProcessId, name: &str, code: Range<usize>, stack_size: usize) -> Self {
        Self {
            id,
            name: name.to_string(),
            state: ProcessState::Running,
            pc: code.start,
            code,
            stack: OperandStack::new(stack_size),
            loop_start: None,
            wait_until: None,
            file: None,
        }
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Name of the file the program was loaded from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Store offset of the next instruction.
    pub fn program_counter(&self) -> usize {
        self.pc
    }

    /// Bytes in use on the operand stack.
    pub fn stack_pointer(&self) -> usize {
        self.stack.len()
    }

    /// Store range holding the program.
    pub fn code(&self) -> Range<usize> {
        self.code.clone()
    }

    pub fn stack(&self) -> &OperandStack {
        &self.stack
    }

    pub fn open_file(&self) -> Option<&OpenFile> {
        self.file.as_ref()
    }

    /// Whether this process is live and runs from `record` or has it open.
    pub fn holds(&self, record: &FileRecord) -> bool {
        if self.state == ProcessState::Terminated {
            return false;
        }
        let runs_from = self.name == record.name() && self.code == record.range();
        runs_from || self.file.as_ref().is_some_and(|f| f.record == *record)
    }

    /// Drop everything the process holds besides its table entry.
    fn terminate(&mut self) {
        self.state = ProcessState::Terminated;
        self.stack.clear();
        self.loop_start = None;
        self.wait_until = None;
        self.file = None;
    }
}

/// A row of `list` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub id: ProcessId,
    pub name: String,
    pub state: ProcessState,
}

/// Fixed-capacity table of process control blocks.
///
/// Terminated processes stay visible until every slot is used; after that a
/// new process takes over the lowest terminated slot.
#[derive(Debug)]
pub struct ProcessTable {
    slots: Vec<Process>,
    capacity: usize,
    stack_size: usize,
    next_id: u16,
}

impl ProcessTable {
    pub fn new(capacity: usize, stack_size: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            stack_size,
            next_id: 0,
        }
    }

    /// Start a process running the program stored in `code`.
    pub fn spawn(&mut self, name: &str, code: Range<usize>) -> Result<ProcessId> {
        let reuse = if self.slots.len() < self.capacity {
            None
        } else {
            let slot = self
                .slots
                .iter()
                .position(|p| p.state == ProcessState::Terminated)
                .ok_or(KernelError::ProcessTableFull(self.capacity))?;
            Some(slot)
        };

        let id = self.allocate_id();
        let process = Process::new(id, name, code, self.stack_size);
        match reuse {
            Some(slot) => {
                debug!(pid = %id, name, slot, old = %self.slots[slot].id, "reusing slot");
                self.slots[slot] = process;
            }
            None => self.slots.push(process),
        }
        debug!(pid = %id, name, "spawned process");
        Ok(id)
    }

    /// RUNNING to PAUSED.
    pub fn suspend(&mut self, id: ProcessId) -> Result<()> {
        self.transition(id, ProcessState::Running, ProcessState::Paused)
    }

    /// PAUSED to RUNNING.
    pub fn resume(&mut self, id: ProcessId) -> Result<()> {
        self.transition(id, ProcessState::Paused, ProcessState::Running)
    }

    /// Move a process to TERMINATED from any state.
    ///
    /// Returns `false` if it was already terminated.
    pub fn terminate(&mut self, id: ProcessId) -> Result<bool> {
        let process = self.get_mut(id).ok_or(KernelError::ProcessNotFound(id))?;
        if process.state == ProcessState::Terminated {
            return Ok(false);
        }
        process.terminate();
        debug!(pid = %id, "terminated process");
        Ok(true)
    }

    pub fn get(&self, id: ProcessId) -> Option<&Process> {
        self.slots.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: ProcessId) -> Option<&mut Process> {
        self.slots.iter_mut().find(|p| p.id == id)
    }

    /// Every slot in table order, terminated ones included.
    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.slots.iter()
    }

    /// `(id, name, state)` for every slot.
    pub fn list(&self) -> Vec<ProcessInfo> {
        self.slots
            .iter()
            .map(|p| ProcessInfo {
                id: p.id,
                name: p.name.clone(),
                state: p.state,
            })
            .collect()
    }

    /// Ids of RUNNING processes in slot order.
    pub fn running(&self) -> Vec<ProcessId> {
        self.slots
            .iter()
            .filter(|p| p.state == ProcessState::Running)
            .map(|p| p.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn transition(&mut self, id: ProcessId, from: ProcessState, to: ProcessState) -> Result<()> {
        let process = self.get_mut(id).ok_or(KernelError::ProcessNotFound(id))?;
        if process.state != from {
            return Err(KernelError::InvalidState {
                id,
                state: process.state,
                expected: from,
            });
        }
        process.state = to;
        debug!(pid = %id, %from, %to, "process state changed");
        Ok(())
    }

    fn allocate_id(&mut self) -> ProcessId {
        // Skip ids still held by a slot once the counter wraps.
        loop {
            let id = ProcessId(self.next_id);
            self.next_id = self.next_id.wrapping_add(1);
            if self.get(id).is_none() {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(capacity: usize) -> ProcessTable {
        ProcessTable::new(capacity, 32)
    }

    #[test]
    fn spawn_starts_running() {
        let mut procs = table(4);
        let id = procs.spawn("blink", 200..210).unwrap();

        let process = procs.get(id).unwrap();
        assert_eq!(process.state(), ProcessState::Running);
        assert_eq!(process.program_counter(), 200);
        assert_eq!(process.stack_pointer(), 0);
        assert_eq!(process.name(), "blink");
    }

    #[test]
    fn ids_increase() {
        let mut procs = table(4);
        assert_eq!(procs.spawn("a", 0..1).unwrap(), ProcessId(0));
        assert_eq!(procs.spawn("b", 0..1).unwrap(), ProcessId(1));
    }

    #[test]
    fn full_table_is_unchanged() {
        let mut procs = table(2);
        procs.spawn("a", 0..1).unwrap();
        procs.spawn("b", 0..1).unwrap();
        let before = procs.list();

        let err = procs.spawn("c", 0..1).unwrap_err();
        assert!(matches!(err, KernelError::ProcessTableFull(2)));
        assert_eq!(procs.list(), before);
    }

    #[test]
    fn terminated_slot_is_reused_when_full() {
        let mut procs = table(2);
        let a = procs.spawn("a", 0..1).unwrap();
        procs.spawn("b", 0..1).unwrap();
        procs.terminate(a).unwrap();

        let c = procs.spawn("c", 0..1).unwrap();
        assert_eq!(c, ProcessId(2));
        assert!(procs.get(a).is_none());
        let names: Vec<String> = procs.list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["c", "b"]);
    }

    #[test]
    fn terminated_slot_is_kept_while_room() {
        let mut procs = table(3);
        let a = procs.spawn("a", 0..1).unwrap();
        procs.terminate(a).unwrap();
        procs.spawn("b", 0..1).unwrap();

        assert_eq!(procs.len(), 2);
        assert_eq!(procs.get(a).unwrap().state(), ProcessState::Terminated);
    }

    #[test]
    fn suspend_resume_works() {
        let mut procs = table(2);
        let id = procs.spawn("a", 0..1).unwrap();

        procs.suspend(id).unwrap();
        assert_eq!(procs.get(id).unwrap().state(), ProcessState::Paused);
        assert!(procs.running().is_empty());

        procs.resume(id).unwrap();
        assert_eq!(procs.running(), vec![id]);
    }

    #[test]
    fn wrong_state_transitions_fail() {
        let mut procs = table(2);
        let id = procs.spawn("a", 0..1).unwrap();

        assert!(matches!(
            procs.resume(id),
            Err(KernelError::InvalidState { .. })
        ));
        procs.suspend(id).unwrap();
        assert!(matches!(
            procs.suspend(id),
            Err(KernelError::InvalidState {
                state: ProcessState::Paused,
                ..
            })
        ));

        procs.terminate(id).unwrap();
        assert!(procs.resume(id).is_err());
        assert!(procs.suspend(id).is_err());
    }

    #[test]
    fn terminate_is_idempotent() {
        let mut procs = table(2);
        let id = procs.spawn("a", 0..1).unwrap();
        assert!(procs.terminate(id).unwrap());
        assert!(!procs.terminate(id).unwrap());
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut procs = table(2);
        assert!(matches!(
            procs.suspend(ProcessId(9)),
            Err(KernelError::ProcessNotFound(ProcessId(9)))
        ));
        assert!(procs.terminate(ProcessId(9)).is_err());
    }
}
