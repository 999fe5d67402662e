//! Per-process operand stacks.
//!
//! The stack holds raw bytes. Every value is pushed as its payload followed
//! by a one-byte type tag, so the top of the stack always says how many
//! bytes to pop next:
//!
//! ```text
//! CHAR    c                      1
//! INT     hi lo                  2
//! FLOAT   b3 b2 b1 b0            4
//! STRING  s0 .. sn 0  len        3      (len counts the terminator)
//! ```

use crate::error::{KernelError, Result};
use crate::value::{Value, ValueType};

/// Default operand stack capacity in bytes.
pub const DEFAULT_STACK_SIZE: usize = 64;

/// A bounded, self-describing byte stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperandStack {
    bytes: Vec<u8>,
    capacity: usize,
}

impl OperandStack {
    /// Create an empty stack holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// The stack pointer: number of bytes in use.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Maximum number of bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Raw contents, bottom first.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Push a value and its tag. Either the whole value fits or nothing is
    /// pushed.
    pub fn push(&mut self, value: &Value) -> Result<()> {
        let encoded = encode(value)?;
        if self.bytes.len() + encoded.len() > self.capacity {
            return Err(KernelError::StackOverflow);
        }
        self.bytes.extend_from_slice(&encoded);
        Ok(())
    }

    /// Pop the top value.
    pub fn pop(&mut self) -> Result<Value> {
        let (value, size) = self.decode_top()?;
        self.bytes.truncate(self.bytes.len() - size);
        Ok(value)
    }

    /// Copy of the top value, leaving the stack as it is.
    pub fn peek(&self) -> Result<Value> {
        self.decode_top().map(|(value, _)| value)
    }

    /// Decode the top value and report how many bytes it occupies.
    fn decode_top(&self) -> Result<(Value, usize)> {
        let n = self.bytes.len();
        let tag = *self.bytes.last().ok_or(KernelError::StackUnderflow)?;
        let need = |size: usize| {
            if n >= size {
                Ok(n - size)
            } else {
                Err(KernelError::StackUnderflow)
            }
        };

        match ValueType::try_from(tag)? {
            ValueType::Char => {
                let at = need(2)?;
                Ok((Value::Char(self.bytes[at]), 2))
            }
            ValueType::Int => {
                let at = need(3)?;
                let raw = [self.bytes[at], self.bytes[at + 1]];
                Ok((Value::Int(i16::from_be_bytes(raw)), 3))
            }
            ValueType::Float => {
                let at = need(5)?;
                let mut raw = [0u8; 4];
                raw.copy_from_slice(&self.bytes[at..at + 4]);
                Ok((Value::Float(f32::from_be_bytes(raw)), 5))
            }
            ValueType::String => {
                let len_at = need(2)?;
                let len = self.bytes[len_at] as usize;
                let at = need(len + 2)?;
                let value = Value::from_raw(ValueType::String, &self.bytes[at..at + len])?;
                Ok((value, len + 2))
            }
        }
    }
}

fn encode(value: &Value) -> Result<Vec<u8>> {
    let mut out = value.to_raw();
    if let Value::Str(_) = value {
        let len = u8::try_from(out.len())
            .map_err(|_| KernelError::InvalidOperand("string longer than 254 bytes"))?;
        out.push(len);
    }
    out.push(value.ty() as u8);
    Ok(out)
}
