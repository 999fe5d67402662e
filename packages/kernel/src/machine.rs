//! The bytecode interpreter.
//!
//! [`Machine`] executes one instruction of one process against the shared
//! file table, variable store and devices. Instructions that need the
//! process table (FORK, WAITUNTILDONE) and process exit come back to the
//! caller as a [`Step`] instead of reaching into the table themselves.

use std::cmp::Ordering;

use arduinos_fs::{FileTable, FsError, PersistentStore};
use tracing::trace;

use crate::console::Console;
use crate::error::{KernelError, Result};
use crate::hal::Hal;
use crate::opcode::Opcode;
use crate::ops;
use crate::process::{OpenFile, Process, ProcessId};
use crate::value::{Value, ValueType};
use crate::variables::VariableStore;

/// Longest STRING literal, not counting its terminator.
const MAX_STRING: usize = 254;

/// What the scheduler must do after an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    /// Keep running.
    Continue,
    /// The process finished.
    Stop,
    /// Spawn the named file and push the result onto the caller's stack.
    Fork(String),
    /// Advance only once this process has terminated.
    Wait(ProcessId),
}

pub(crate) struct Machine<'a, S, H, C> {
    pub fs: &'a mut FileTable<S>,
    pub vars: &'a mut VariableStore,
    pub hal: &'a mut H,
    pub console: &'a mut C,
}

impl<S: PersistentStore, H: Hal, C: Console> Machine<'_, S, H, C> {
    /// Execute the instruction at the process's program counter.
    ///
    /// On error the program counter is left wherever decoding reached; the
    /// caller is expected to terminate the process.
    pub fn step(&mut self, proc: &mut Process) -> Result<Step> {
        if proc.pc >= proc.code.end {
            return Ok(Step::Stop);
        }

        let at = proc.pc;
        let op = Opcode::try_from(self.fetch(proc)?)?;
        trace!(pid = %proc.id(), at, op = op.mnemonic(), "exec");

        match op {
            Opcode::Char => {
                let c = self.fetch(proc)?;
                proc.stack.push(&Value::Char(c))?;
            }
            Opcode::Int => {
                let raw = self.fetch_array::<2>(proc)?;
                proc.stack.push(&Value::Int(i16::from_be_bytes(raw)))?;
            }
            Opcode::Float => {
                let raw = self.fetch_array::<4>(proc)?;
                proc.stack.push(&Value::Float(f32::from_be_bytes(raw)))?;
            }
            Opcode::String => {
                let mut text = Vec::new();
                loop {
                    match self.fetch(proc)? {
                        0 => break,
                        _ if text.len() == MAX_STRING => {
                            return Err(KernelError::InvalidOperand("string literal too long"));
                        }
                        b => text.push(b),
                    }
                }
                proc.stack.push(&Value::Str(text))?;
            }

            Opcode::Set => {
                let name = self.fetch(proc)?;
                let value = proc.stack.pop()?;
                self.vars.declare(name, proc.id(), &value)?;
            }
            Opcode::Get => {
                let name = self.fetch(proc)?;
                let value = self.vars.get(name, proc.id())?;
                proc.stack.push(&value)?;
            }

            Opcode::Increment => unary(proc, |a| ops::add(a, &Value::Char(1)))?,
            Opcode::Decrement => unary(proc, |a| ops::sub(a, &Value::Char(1)))?,
            Opcode::Plus => binary(proc, ops::add)?,
            Opcode::Minus => binary(proc, ops::sub)?,
            Opcode::Times => binary(proc, ops::mul)?,
            Opcode::DividedBy => binary(proc, ops::div)?,
            Opcode::Modulus => binary(proc, ops::rem)?,
            Opcode::UnaryMinus => unary(proc, ops::negate)?,

            Opcode::Equals => binary(proc, |a, b| ops::compare(a, b, Ordering::is_eq))?,
            Opcode::NotEquals => binary(proc, |a, b| ops::compare(a, b, Ordering::is_ne))?,
            Opcode::LessThan => binary(proc, |a, b| ops::compare(a, b, Ordering::is_lt))?,
            Opcode::LessThanOrEquals => binary(proc, |a, b| ops::compare(a, b, Ordering::is_le))?,
            Opcode::GreaterThan => binary(proc, |a, b| ops::compare(a, b, Ordering::is_gt))?,
            Opcode::GreaterThanOrEquals => {
                binary(proc, |a, b| ops::compare(a, b, Ordering::is_ge))?
            }

            Opcode::LogicalAnd => binary(proc, |a, b| ops::logical(a, b, |x, y| x && y))?,
            Opcode::LogicalOr => binary(proc, |a, b| ops::logical(a, b, |x, y| x || y))?,
            Opcode::LogicalXor => binary(proc, |a, b| ops::logical(a, b, |x, y| x != y))?,
            Opcode::LogicalNot => unary(proc, ops::not)?,
            Opcode::BitwiseAnd => binary(proc, |a, b| ops::bitwise(a, b, |x, y| x & y))?,
            Opcode::BitwiseOr => binary(proc, |a, b| ops::bitwise(a, b, |x, y| x | y))?,
            Opcode::BitwiseXor => binary(proc, |a, b| ops::bitwise(a, b, |x, y| x ^ y))?,
            Opcode::BitwiseNot => unary(proc, ops::bit_not)?,

            Opcode::ToChar => unary(proc, |a| ops::cast(a, ValueType::Char))?,
            Opcode::ToInt => unary(proc, |a| ops::cast(a, ValueType::Int))?,
            Opcode::ToFloat => unary(proc, |a| ops::cast(a, ValueType::Float))?,
            Opcode::Round => unary(proc, |a| ops::to_integral(a, f32::round))?,
            Opcode::Floor => unary(proc, |a| ops::to_integral(a, f32::floor))?,
            Opcode::Ceil => unary(proc, |a| ops::to_integral(a, f32::ceil))?,
            Opcode::Min => binary(proc, ops::min)?,
            Opcode::Max => binary(proc, ops::max)?,
            Opcode::Abs => unary(proc, ops::abs)?,
            Opcode::Constrain => {
                let hi = proc.stack.pop()?;
                let lo = proc.stack.pop()?;
                let x = proc.stack.pop()?;
                proc.stack.push(&ops::constrain(&x, &lo, &hi)?)?;
            }
            Opcode::Map => {
                let to_hi = proc.stack.pop()?;
                let to_lo = proc.stack.pop()?;
                let from_hi = proc.stack.pop()?;
                let from_lo = proc.stack.pop()?;
                let x = proc.stack.pop()?;
                let mapped = ops::map(&x, &from_lo, &from_hi, &to_lo, &to_hi)?;
                proc.stack.push(&mapped)?;
            }
            Opcode::Pow => binary(proc, ops::pow)?,
            Opcode::Sq => unary(proc, ops::sq)?,
            Opcode::Sqrt => unary(proc, ops::sqrt)?,

            Opcode::Delay | Opcode::DelayUntil => self.delay(proc, op, at)?,
            Opcode::Millis => {
                let now = self.hal.millis() as u16 as i16;
                proc.stack.push(&Value::Int(now))?;
            }

            Opcode::PinMode => {
                let mode = proc.stack.pop()?.as_i32()?;
                let pin = proc.stack.pop()?.as_i32()?;
                self.hal.pin_mode(pin as u8, mode as u8);
            }
            Opcode::AnalogRead => {
                let pin = proc.stack.pop()?.as_i32()?;
                let value = self.hal.analog_read(pin as u8);
                proc.stack.push(&Value::Int(value))?;
            }
            Opcode::AnalogWrite => {
                let value = proc.stack.pop()?.as_i32()?;
                let pin = proc.stack.pop()?.as_i32()?;
                self.hal.analog_write(pin as u8, value as i16);
            }
            Opcode::DigitalRead => {
                let pin = proc.stack.pop()?.as_i32()?;
                let value = self.hal.digital_read(pin as u8);
                proc.stack.push(&Value::Char(value))?;
            }
            Opcode::DigitalWrite => {
                let value = proc.stack.pop()?.as_i32()?;
                let pin = proc.stack.pop()?.as_i32()?;
                self.hal.digital_write(pin as u8, value as u8);
            }

            Opcode::Print => {
                let value = proc.stack.pop()?;
                self.console.write(&value.to_string());
            }
            Opcode::PrintLn => {
                let value = proc.stack.pop()?;
                self.console.write_line(&value.to_string());
            }

            Opcode::Open => self.open(proc)?,
            Opcode::Close => proc.file = None,
            Opcode::Write => {
                let raw = proc.stack.pop()?.to_raw();
                let file = self.open_file(proc)?;
                check_file_bounds(file, raw.len())?;
                self.fs.write_at(&file.record, file.cursor, &raw)?;
                file.cursor += raw.len();
            }
            Opcode::ReadInt => self.read_value(proc, ValueType::Int, 2)?,
            Opcode::ReadChar => self.read_value(proc, ValueType::Char, 1)?,
            Opcode::ReadFloat => self.read_value(proc, ValueType::Float, 4)?,
            Opcode::ReadString => {
                let file = self.open_file(proc)?;
                let mut text = Vec::new();
                while file.cursor < file.record.size() {
                    let mut byte = [0];
                    self.fs.read_at(&file.record, file.cursor, &mut byte)?;
                    file.cursor += 1;
                    if byte[0] == 0 {
                        break;
                    }
                    text.push(byte[0]);
                }
                proc.stack.push(&Value::Str(text))?;
            }

            Opcode::If => {
                let len = self.fetch(proc)? as usize;
                if !proc.stack.peek()?.is_truthy() {
                    let target = proc.pc + len;
                    jump(proc, target)?;
                }
            }
            Opcode::Else => {
                let len = self.fetch(proc)? as usize;
                if proc.stack.peek()?.is_truthy() {
                    let target = proc.pc + len;
                    jump(proc, target)?;
                }
            }
            Opcode::EndIf => {
                proc.stack.pop()?;
            }
            Opcode::While => {
                let cond_len = self.fetch(proc)? as i16;
                let repeat_len = self.fetch(proc)? as usize;
                if proc.stack.pop()?.is_truthy() {
                    let back = cond_len + repeat_len as i16 + 4;
                    proc.stack.push(&Value::Int(back))?;
                } else {
                    let target = proc.pc + repeat_len + 1;
                    jump(proc, target)?;
                }
            }
            Opcode::EndWhile => {
                let back = proc.stack.pop()?.as_i32()?;
                let target = usize::try_from(back)
                    .ok()
                    .and_then(|back| proc.pc.checked_sub(back))
                    .ok_or(KernelError::InvalidJump(at))?;
                jump(proc, target)?;
            }
            Opcode::Loop => proc.loop_start = Some(proc.pc),
            Opcode::EndLoop => {
                let target = proc.loop_start.ok_or(KernelError::InvalidJump(at))?;
                jump(proc, target)?;
            }
            Opcode::Stop => return Ok(Step::Stop),
            Opcode::Fork => {
                let value = proc.stack.pop()?;
                let name = String::from_utf8_lossy(value.as_str_bytes()?).into_owned();
                return Ok(Step::Fork(name));
            }
            Opcode::WaitUntilDone => {
                let pid = proc.stack.pop()?.as_i32()?;
                return Ok(Step::Wait(ProcessId(pid as u16)));
            }
        }

        Ok(Step::Continue)
    }

    fn fetch(&mut self, proc: &mut Process) -> Result<u8> {
        if proc.pc >= proc.code.end {
            return Err(KernelError::TruncatedInstruction);
        }
        let byte = self
            .fs
            .store_mut()
            .read_byte(proc.pc)
            .map_err(FsError::from)?;
        proc.pc += 1;
        Ok(byte)
    }

    fn fetch_array<const N: usize>(&mut self, proc: &mut Process) -> Result<[u8; N]> {
        let mut raw = [0; N];
        for byte in &mut raw {
            *byte = self.fetch(proc)?;
        }
        Ok(raw)
    }

    /// DELAY and DELAYUNTIL re-execute until their deadline passes.
    fn delay(&mut self, proc: &mut Process, op: Opcode, at: usize) -> Result<()> {
        let now = self.hal.millis();

        if let Some(deadline) = proc.wait_until {
            if now.wrapping_sub(deadline) as i32 >= 0 {
                proc.wait_until = None;
            } else {
                proc.pc = at;
            }
            return Ok(());
        }

        let arg = proc.stack.pop()?.as_i32()?;
        let wait = match op {
            Opcode::DelayUntil => (arg as u16).wrapping_sub(now as u16) as i16 as i32,
            _ => arg,
        };
        if wait > 0 {
            proc.wait_until = Some(now.wrapping_add(wait as u32));
            proc.pc = at;
        }
        Ok(())
    }

    fn open(&mut self, proc: &mut Process) -> Result<()> {
        let len = proc.stack.pop()?.as_i32()?;
        let len =
            usize::try_from(len).map_err(|_| KernelError::InvalidOperand("negative file size"))?;
        let value = proc.stack.pop()?;
        let name = std::str::from_utf8(value.as_str_bytes()?)
            .map_err(|_| KernelError::InvalidOperand("file name is not text"))?;

        let existing = self.fs.find(name).copied();
        let record = match existing {
            Ok(record) => record,
            Err(FsError::NotFound(_)) => self.fs.create(name, len, &vec![0; len])?,
            Err(e) => return Err(e.into()),
        };
        proc.file = Some(OpenFile { record, cursor: 0 });
        Ok(())
    }

    /// The process's open file, provided it is still in the directory as
    /// it was at OPEN.
    fn open_file<'p>(&self, proc: &'p mut Process) -> Result<&'p mut OpenFile> {
        let file = proc.file.as_mut().ok_or(KernelError::NoOpenFile)?;
        match self.fs.find(file.record.name()) {
            Ok(live) if *live == file.record => Ok(file),
            _ => Err(KernelError::StaleFile(file.record.name().to_string())),
        }
    }

    fn read_value(&mut self, proc: &mut Process, ty: ValueType, len: usize) -> Result<()> {
        let file = self.open_file(proc)?;
        check_file_bounds(file, len)?;
        let mut raw = vec![0; len];
        self.fs.read_at(&file.record, file.cursor, &mut raw)?;
        file.cursor += len;
        proc.stack.push(&Value::from_raw(ty, &raw)?)
    }
}

fn unary(proc: &mut Process, f: impl FnOnce(&Value) -> Result<Value>) -> Result<()> {
    let a = proc.stack.pop()?;
    proc.stack.push(&f(&a)?)
}

fn binary(proc: &mut Process, f: impl FnOnce(&Value, &Value) -> Result<Value>) -> Result<()> {
    let right = proc.stack.pop()?;
    let left = proc.stack.pop()?;
    proc.stack.push(&f(&left, &right)?)
}

/// Move the program counter, staying inside the program. Landing exactly
/// on the end is allowed and finishes the process on the next step.
fn jump(proc: &mut Process, target: usize) -> Result<()> {
    if target < proc.code.start || target > proc.code.end {
        return Err(KernelError::InvalidJump(target));
    }
    proc.pc = target;
    Ok(())
}

fn check_file_bounds(file: &OpenFile, len: usize) -> Result<()> {
    if file.cursor + len > file.record.size() {
        return Err(KernelError::FileBounds {
            name: file.record.name().to_string(),
            offset: file.cursor,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use arduinos_eeprom::MemoryEeprom;

    use super::*;
    use crate::console::BufferConsole;
    use crate::hal::{Pin, SimulatedHal};
    use crate::process::ProcessTable;
    use crate::stack::DEFAULT_STACK_SIZE;

    struct Rig {
        fs: FileTable<MemoryEeprom>,
        vars: VariableStore,
        hal: SimulatedHal,
        console: BufferConsole,
        procs: ProcessTable,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                fs: FileTable::mount(MemoryEeprom::default()).unwrap(),
                vars: VariableStore::new(25, 256),
                hal: SimulatedHal::with_manual_clock(),
                console: BufferConsole::new(),
                procs: ProcessTable::new(10, DEFAULT_STACK_SIZE),
            }
        }

        fn load(&mut self, name: &str, program: &[u8]) -> ProcessId {
            let record = self.fs.create(name, program.len(), program).unwrap();
            self.procs.spawn(name, record.range()).unwrap()
        }

        fn step(&mut self, pid: ProcessId) -> Result<Step> {
            let proc = self.procs.get_mut(pid).unwrap();
            Machine {
                fs: &mut self.fs,
                vars: &mut self.vars,
                hal: &mut self.hal,
                console: &mut self.console,
            }
            .step(proc)
        }

        /// Step until the program asks for something other than `Continue`.
        fn run(&mut self, pid: ProcessId) -> Result<Step> {
            for _ in 0..1000 {
                match self.step(pid)? {
                    Step::Continue => continue,
                    other => return Ok(other),
                }
            }
            panic!("program did not finish");
        }

        fn top(&self, pid: ProcessId) -> Value {
            self.procs.get(pid).unwrap().stack().peek().unwrap()
        }
    }

    fn int(n: i16) -> Vec<u8> {
        let [hi, lo] = n.to_be_bytes();
        vec![Opcode::Int as u8, hi, lo]
    }

    fn string(s: &str) -> Vec<u8> {
        let mut out = vec![Opcode::String as u8];
        out.extend_from_slice(s.as_bytes());
        out.push(0);
        out
    }

    fn program(parts: &[&[u8]]) -> Vec<u8> {
        parts.concat()
    }

    #[test]
    fn literals_push_values() {
        let mut rig = Rig::new();
        let mut float = vec![Opcode::Float as u8];
        float.extend_from_slice(&1.5f32.to_be_bytes());
        let code = program(&[&[Opcode::Char as u8, b'A'], &int(-2), &float, &string("hi")]);
        let pid = rig.load("lit", &code);

        assert_eq!(rig.run(pid).unwrap(), Step::Stop);
        let stack = &mut rig.procs.get_mut(pid).unwrap().stack;
        assert_eq!(stack.pop().unwrap(), Value::Str(b"hi".to_vec()));
        assert_eq!(stack.pop().unwrap(), Value::Float(1.5));
        assert_eq!(stack.pop().unwrap(), Value::Int(-2));
        assert_eq!(stack.pop().unwrap(), Value::Char(b'A'));
    }

    #[test]
    fn binary_ops_take_left_then_right() {
        let mut rig = Rig::new();
        let code = program(&[&int(10), &int(3), &[Opcode::Minus as u8]]);
        let pid = rig.load("sub", &code);

        rig.run(pid).unwrap();
        assert_eq!(rig.top(pid), Value::Int(7));
    }

    #[test]
    fn set_and_get_variables() {
        let mut rig = Rig::new();
        let code = program(&[
            &int(41),
            &[Opcode::Set as u8, b'x'],
            &[Opcode::Get as u8, b'x'],
            &[Opcode::Increment as u8],
        ]);
        let pid = rig.load("vars", &code);

        rig.run(pid).unwrap();
        assert_eq!(rig.top(pid), Value::Int(42));
        assert_eq!(rig.vars.get(b'x', pid).unwrap(), Value::Int(41));
    }

    #[test]
    fn get_unknown_variable_faults() {
        let mut rig = Rig::new();
        let pid = rig.load("noget", &[Opcode::Get as u8, b'q']);

        assert!(matches!(
            rig.step(pid),
            Err(KernelError::VariableNotFound { name: 'q', .. })
        ));
    }

    #[test]
    fn print_formats_by_type() {
        let mut rig = Rig::new();
        let mut float = vec![Opcode::Float as u8];
        float.extend_from_slice(&2.5f32.to_be_bytes());
        let code = program(&[
            &[Opcode::Char as u8, b'A', Opcode::Print as u8],
            &int(-12),
            &[Opcode::Print as u8],
            &float,
            &[Opcode::Print as u8],
            &string(" ok"),
            &[Opcode::PrintLn as u8],
        ]);
        let pid = rig.load("print", &code);

        rig.run(pid).unwrap();
        assert_eq!(rig.console.contents(), "A-122.50 ok\n");
    }

    #[test]
    fn if_else_runs_one_branch() {
        // CHAR cond, IF 3 [CHAR 'T' PRINT], ELSE 3 [CHAR 'F' PRINT], ENDIF
        fn build(cond: u8) -> Vec<u8> {
            vec![
                Opcode::Char as u8,
                cond,
                Opcode::If as u8,
                3,
                Opcode::Char as u8,
                b'T',
                Opcode::Print as u8,
                Opcode::Else as u8,
                3,
                Opcode::Char as u8,
                b'F',
                Opcode::Print as u8,
                Opcode::EndIf as u8,
            ]
        }

        let mut rig = Rig::new();
        let yes = rig.load("yes", &build(1));
        let no = rig.load("no", &build(0));

        rig.run(yes).unwrap();
        assert_eq!(rig.console.take(), "T");
        assert!(rig.procs.get(yes).unwrap().stack().is_empty());

        rig.run(no).unwrap();
        assert_eq!(rig.console.take(), "F");
        assert!(rig.procs.get(no).unwrap().stack().is_empty());
    }

    #[test]
    fn loop_repeats_forever() {
        let mut rig = Rig::new();
        let code = [
            Opcode::Loop as u8,
            Opcode::Char as u8,
            b'.',
            Opcode::Print as u8,
            Opcode::EndLoop as u8,
        ];
        let pid = rig.load("dots", &code);

        for _ in 0..13 {
            assert_eq!(rig.step(pid).unwrap(), Step::Continue);
        }
        assert_eq!(rig.console.contents(), "....");
    }

    #[test]
    fn endloop_without_loop_faults() {
        let mut rig = Rig::new();
        let pid = rig.load("bad", &[Opcode::EndLoop as u8]);

        assert!(matches!(rig.step(pid), Err(KernelError::InvalidJump(_))));
    }

    #[test]
    fn unknown_opcode_faults() {
        let mut rig = Rig::new();
        let pid = rig.load("junk", &[0x5c]);

        assert!(matches!(rig.step(pid), Err(KernelError::UnknownOpcode(0x5c))));
    }

    #[test]
    fn truncated_immediate_faults() {
        let mut rig = Rig::new();
        let pid = rig.load("short", &[Opcode::Int as u8, 1]);

        assert!(matches!(
            rig.step(pid),
            Err(KernelError::TruncatedInstruction)
        ));
    }

    #[test]
    fn delay_waits_for_clock() {
        let mut rig = Rig::new();
        let code = program(&[&int(100), &[Opcode::Delay as u8]]);
        let pid = rig.load("wait", &code);

        rig.step(pid).unwrap();
        rig.step(pid).unwrap();
        let parked = rig.procs.get(pid).unwrap().program_counter();

        rig.hal.advance(50);
        rig.step(pid).unwrap();
        assert_eq!(rig.procs.get(pid).unwrap().program_counter(), parked);

        rig.hal.advance(50);
        rig.step(pid).unwrap();
        assert_eq!(rig.procs.get(pid).unwrap().program_counter(), parked + 1);
        assert_eq!(rig.step(pid).unwrap(), Step::Stop);
    }

    #[test]
    fn delay_until_past_target_is_immediate() {
        let mut rig = Rig::new();
        rig.hal.advance(500);
        let code = program(&[&int(200), &[Opcode::DelayUntil as u8]]);
        let pid = rig.load("late", &code);

        rig.step(pid).unwrap();
        rig.step(pid).unwrap();
        assert_eq!(rig.step(pid).unwrap(), Step::Stop);
    }

    #[test]
    fn millis_pushes_low_bits() {
        let mut rig = Rig::new();
        rig.hal.advance(70_000);
        let pid = rig.load("clock", &[Opcode::Millis as u8]);

        rig.step(pid).unwrap();
        assert_eq!(rig.top(pid), Value::Int((70_000u32 as u16) as i16));
    }

    #[test]
    fn pins_pass_through() {
        let mut rig = Rig::new();
        rig.hal.set_analog_input(3, 512);
        let code = program(&[
            &int(13),
            &int(1),
            &[Opcode::DigitalWrite as u8],
            &int(3),
            &[Opcode::AnalogRead as u8],
        ]);
        let pid = rig.load("pins", &code);

        rig.run(pid).unwrap();
        assert_eq!(rig.hal.pin(13).digital, 1);
        assert_eq!(rig.top(pid), Value::Int(512));
    }

    #[test]
    fn fork_and_wait_are_trapped() {
        let mut rig = Rig::new();
        let code = program(&[&string("child"), &[Opcode::Fork as u8]]);
        let pid = rig.load("parent", &code);

        assert_eq!(rig.run(pid).unwrap(), Step::Fork("child".into()));

        let code = program(&[&int(7), &[Opcode::WaitUntilDone as u8]]);
        let waiter = rig.load("waiter", &code);
        assert_eq!(rig.run(waiter).unwrap(), Step::Wait(ProcessId(7)));
    }

    #[test]
    fn file_write_then_read() {
        let mut rig = Rig::new();
        let code = program(&[
            &string("data"),
            &int(8),
            &[Opcode::Open as u8],
            &int(0x1234),
            &[Opcode::Write as u8],
            &string("ab"),
            &[Opcode::Write as u8, Opcode::Close as u8],
            &string("data"),
            &int(0),
            &[Opcode::Open as u8, Opcode::ReadInt as u8, Opcode::ReadString as u8],
        ]);
        let pid = rig.load("files", &code);

        rig.run(pid).unwrap();
        assert_eq!(rig.fs.find("data").unwrap().size(), 8);
        assert_eq!(&rig.fs.read("data").unwrap()[..5], &[0x12, 0x34, b'a', b'b', 0]);

        let stack = &mut rig.procs.get_mut(pid).unwrap().stack;
        assert_eq!(stack.pop().unwrap(), Value::Str(b"ab".to_vec()));
        assert_eq!(stack.pop().unwrap(), Value::Int(0x1234));
    }

    #[test]
    fn read_past_end_faults() {
        let mut rig = Rig::new();
        let code = program(&[
            &string("tiny"),
            &int(1),
            &[Opcode::Open as u8, Opcode::ReadInt as u8],
        ]);
        let pid = rig.load("overrun", &code);

        assert!(matches!(
            rig.run(pid),
            Err(KernelError::FileBounds { offset: 0, .. })
        ));
    }

    #[test]
    fn file_ops_need_open() {
        let mut rig = Rig::new();
        let pid = rig.load("closed", &[Opcode::ReadChar as u8]);

        assert!(matches!(rig.step(pid), Err(KernelError::NoOpenFile)));
    }

    #[test]
    fn delay_until_future_target_waits() {
        let mut rig = Rig::new();
        let code = program(&[&int(300), &[Opcode::DelayUntil as u8]]);
        let pid = rig.load("alarm", &code);

        rig.step(pid).unwrap();
        rig.step(pid).unwrap();
        let parked = rig.procs.get(pid).unwrap().program_counter();

        rig.hal.advance(299);
        rig.step(pid).unwrap();
        assert_eq!(rig.procs.get(pid).unwrap().program_counter(), parked);

        rig.hal.advance(1);
        rig.step(pid).unwrap();
        assert_eq!(rig.procs.get(pid).unwrap().program_counter(), parked + 1);
        assert_eq!(rig.step(pid).unwrap(), Step::Stop);
    }

    #[test]
    fn pin_mode_and_analog_write_take_pin_first() {
        let mut rig = Rig::new();
        let code = program(&[
            &int(9),
            &int(1),
            &[Opcode::PinMode as u8],
            &int(5),
            &int(200),
            &[Opcode::AnalogWrite as u8],
        ]);
        let pid = rig.load("outputs", &code);

        rig.run(pid).unwrap();
        assert_eq!(rig.hal.pin(9).mode, 1);
        assert_eq!(rig.hal.pin(5).analog, 200);
        assert_eq!(rig.hal.pin(1), Pin::default());
        assert_eq!(rig.hal.pin(200), Pin::default());
    }

    #[test]
    fn constrain_clamps_to_range() {
        let mut rig = Rig::new();
        let code = program(&[&int(15), &int(0), &int(10), &[Opcode::Constrain as u8]]);
        let pid = rig.load("clamp", &code);

        rig.run(pid).unwrap();
        assert_eq!(rig.top(pid), Value::Int(10));
    }

    #[test]
    fn map_rescales_between_ranges() {
        let mut rig = Rig::new();
        let code = program(&[
            &int(5),
            &int(0),
            &int(10),
            &int(0),
            &int(100),
            &[Opcode::Map as u8],
        ]);
        let pid = rig.load("scale", &code);

        rig.run(pid).unwrap();
        let stack = &mut rig.procs.get_mut(pid).unwrap().stack;
        assert_eq!(stack.pop().unwrap(), Value::Int(50));
        assert!(stack.is_empty());
    }

    #[test]
    fn read_float_returns_written_float() {
        let mut rig = Rig::new();
        let mut float = vec![Opcode::Float as u8];
        float.extend_from_slice(&(-3.25f32).to_be_bytes());
        let code = program(&[
            &string("f"),
            &int(4),
            &[Opcode::Open as u8],
            &float,
            &[Opcode::Write as u8, Opcode::Close as u8],
            &string("f"),
            &int(0),
            &[Opcode::Open as u8, Opcode::ReadFloat as u8],
        ]);
        let pid = rig.load("floats", &code);

        rig.run(pid).unwrap();
        assert_eq!(rig.top(pid), Value::Float(-3.25));
    }

    #[test]
    fn if_else_inside_while_body() {
        // x = 3; while x { x = x - 1; if x print 'T' else print 'F' endif }
        let body: Vec<u8> = program(&[
            &[Opcode::Get as u8, b'x', Opcode::Decrement as u8, Opcode::Set as u8, b'x'],
            &[Opcode::Get as u8, b'x'],
            &[Opcode::If as u8, 3, Opcode::Char as u8, b'T', Opcode::Print as u8],
            &[Opcode::Else as u8, 3, Opcode::Char as u8, b'F', Opcode::Print as u8],
            &[Opcode::EndIf as u8],
        ]);
        let code = program(&[
            &int(3),
            &[Opcode::Set as u8, b'x'],
            &[Opcode::Get as u8, b'x'],
            &[Opcode::While as u8, 2, body.len() as u8],
            &body,
            &[Opcode::EndWhile as u8],
        ]);
        let mut rig = Rig::new();
        let pid = rig.load("countdown", &code);

        assert_eq!(rig.run(pid).unwrap(), Step::Stop);
        assert_eq!(rig.console.contents(), "TTF");
        assert!(rig.procs.get(pid).unwrap().stack().is_empty());
    }
}
