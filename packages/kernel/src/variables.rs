//! Per-process variables in a small working-memory region.

use arduinos_fs::alloc;
use tracing::debug;

use crate::error::{KernelError, Result};
use crate::process::ProcessId;
use crate::value::{Value, ValueType};

/// Default number of variable slots.
pub const DEFAULT_MAX_VARIABLES: usize = 25;

/// Default size of variable memory in bytes.
pub const DEFAULT_RAM_SIZE: usize = 256;

/// A variable record. The value itself lives in variable memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variable {
    pub name: u8,
    pub owner: ProcessId,
    pub ty: ValueType,
    pub addr: usize,
    pub size: usize,
}

/// Variables keyed by `(name, owner)`.
///
/// Space is allocated first-fit over the memory not covered by any live
/// variable; releasing a variable just drops its record.
#[derive(Debug)]
pub struct VariableStore {
    vars: Vec<Variable>,
    capacity: usize,
    ram: Vec<u8>,
}

impl VariableStore {
    pub fn new(capacity: usize, ram_size: usize) -> Self {
        Self {
            vars: Vec::with_capacity(capacity),
            capacity,
            ram: vec![0; ram_size],
        }
    }

    /// Set `name` for `owner` to `value`, replacing any previous value.
    ///
    /// Fails without changing anything if the table is full or memory has
    /// no contiguous run for the value.
    pub fn declare(&mut self, name: u8, owner: ProcessId, value: &Value) -> Result<()> {
        let raw = value.to_raw();
        let existing = self.position(name, owner);
        if existing.is_none() && self.vars.len() >= self.capacity {
            return Err(KernelError::VariableTableFull(self.capacity));
        }

        let occupied = self
            .vars
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != existing)
            .map(|(_, v)| v.addr..v.addr + v.size);
        let addr = alloc::first_fit(occupied, 0..self.ram.len(), raw.len())
            .ok_or(KernelError::OutOfMemory(raw.len()))?;

        let var = Variable {
            name,
            owner,
            ty: value.ty(),
            addr,
            size: raw.len(),
        };
        self.ram[addr..addr + raw.len()].copy_from_slice(&raw);
        match existing {
            Some(i) => self.vars[i] = var,
            None => self.vars.push(var),
        }
        debug!(name = %(name as char), pid = %owner, addr, size = raw.len(), "set variable");
        Ok(())
    }

    /// The record for `name` owned by `owner`.
    pub fn lookup(&self, name: u8, owner: ProcessId) -> Result<&Variable> {
        self.position(name, owner)
            .map(|i| &self.vars[i])
            .ok_or(KernelError::VariableNotFound {
                name: name as char,
                pid: owner,
            })
    }

    /// The current value of `name` for `owner`.
    pub fn get(&self, name: u8, owner: ProcessId) -> Result<Value> {
        let var = self.lookup(name, owner)?;
        Value::from_raw(var.ty, &self.ram[var.addr..var.addr + var.size])
    }

    /// Drop every variable owned by `owner`. Returns how many were dropped.
    pub fn release_all(&mut self, owner: ProcessId) -> usize {
        let before = self.vars.len();
        self.vars.retain(|v| v.owner != owner);
        let released = before - self.vars.len();
        if released > 0 {
            debug!(pid = %owner, released, "released variables");
        }
        released
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Largest contiguous run of free variable memory.
    pub fn free_memory(&self) -> usize {
        alloc::largest_run(
            self.vars.iter().map(|v| v.addr..v.addr + v.size),
            0..self.ram.len(),
        )
    }

    fn position(&self, name: u8, owner: ProcessId) -> Option<usize> {
        self.vars
            .iter()
            .position(|v| v.name == name && v.owner == owner)
    }
}
