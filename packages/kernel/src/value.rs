//! Typed values and their byte encodings.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{KernelError, Result};

/// The type tag that follows every value on an operand stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    Char = 1,
    Int = 2,
    String = 3,
    Float = 4,
}

impl ValueType {
    /// Promotion rank for numeric types. Strings have none.
    fn rank(self) -> Option<u8> {
        match self {
            ValueType::Char => Some(0),
            ValueType::Int => Some(1),
            ValueType::Float => Some(2),
            ValueType::String => None,
        }
    }

    /// The wider of two numeric types.
    pub fn wider(self, other: ValueType) -> Result<ValueType> {
        match (self.rank(), other.rank()) {
            (Some(a), Some(b)) => Ok(if a >= b { self } else { other }),
            _ => Err(KernelError::TypeMismatch {
                expected: "number",
                found: ValueType::String,
            }),
        }
    }
}

impl TryFrom<u8> for ValueType {
    type Error = KernelError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(ValueType::Char),
            2 => Ok(ValueType::Int),
            3 => Ok(ValueType::String),
            4 => Ok(ValueType::Float),
            other => Err(KernelError::UnknownType(other)),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Char => "CHAR",
            ValueType::Int => "INT",
            ValueType::String => "STRING",
            ValueType::Float => "FLOAT",
        };
        f.write_str(s)
    }
}

/// A value as seen by running programs.
///
/// CHAR is an unsigned byte and INT a 16-bit signed integer, matching the
/// AVR `char`/`int` the bytecode was designed for. Strings carry their
/// bytes without the terminator.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Char(u8),
    Int(i16),
    Float(f32),
    Str(Vec<u8>),
}

impl Value {
    /// The type tag of this value.
    pub fn ty(&self) -> ValueType {
        match self {
            Value::Char(_) => ValueType::Char,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Str(_) => ValueType::String,
        }
    }

    /// CHAR 1 or 0.
    pub fn from_bool(b: bool) -> Self {
        Value::Char(b as u8)
    }

    /// Narrow an integer result into `ty`, wrapping like the target would.
    pub fn from_i32(ty: ValueType, n: i32) -> Self {
        match ty {
            ValueType::Char => Value::Char(n as u8),
            ValueType::Float => Value::Float(n as f32),
            _ => Value::Int(n as i16),
        }
    }

    /// Numeric value as an integer. Floats truncate toward zero.
    pub fn as_i32(&self) -> Result<i32> {
        match self {
            Value::Char(c) => Ok(*c as i32),
            Value::Int(i) => Ok(*i as i32),
            Value::Float(f) => Ok(*f as i32),
            Value::Str(_) => Err(self.mismatch("number")),
        }
    }

    /// Numeric value as a float.
    pub fn as_f32(&self) -> Result<f32> {
        match self {
            Value::Char(c) => Ok(*c as f32),
            Value::Int(i) => Ok(*i as f32),
            Value::Float(f) => Ok(*f),
            Value::Str(_) => Err(self.mismatch("number")),
        }
    }

    /// Integer value for bitwise operators. Floats are rejected.
    pub fn as_bits(&self) -> Result<i32> {
        match self {
            Value::Char(c) => Ok(*c as i32),
            Value::Int(i) => Ok(*i as i32),
            _ => Err(self.mismatch("CHAR or INT")),
        }
    }

    /// String bytes.
    pub fn as_str_bytes(&self) -> Result<&[u8]> {
        match self {
            Value::Str(s) => Ok(s),
            _ => Err(self.mismatch("STRING")),
        }
    }

    /// Zero is false, anything else true. Strings are true when non-empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Char(c) => *c != 0,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
        }
    }

    /// Compare two values: numerically in the wider type, or bytewise when
    /// both are strings.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        if let (Value::Str(a), Value::Str(b)) = (self, other) {
            return Ok(a.cmp(b));
        }
        match self.ty().wider(other.ty())? {
            ValueType::Float => Ok(self
                .as_f32()?
                .partial_cmp(&other.as_f32()?)
                .unwrap_or(Ordering::Equal)),
            _ => Ok(self.as_i32()?.cmp(&other.as_i32()?)),
        }
    }

    /// Raw bytes as stored in variable memory or written to a file.
    ///
    /// Multi-byte numbers are big-endian; strings keep their terminator.
    pub fn to_raw(&self) -> Vec<u8> {
        match self {
            Value::Char(c) => vec![*c],
            Value::Int(i) => i.to_be_bytes().to_vec(),
            Value::Float(f) => f.to_be_bytes().to_vec(),
            Value::Str(s) => {
                let mut raw = Vec::with_capacity(s.len() + 1);
                raw.extend_from_slice(s);
                raw.push(0);
                raw
            }
        }
    }

    /// Decode bytes produced by [`to_raw`](Self::to_raw).
    pub fn from_raw(ty: ValueType, raw: &[u8]) -> Result<Self> {
        let malformed = || KernelError::InvalidOperand("malformed raw value");
        match ty {
            ValueType::Char => raw.first().map(|&c| Value::Char(c)).ok_or_else(malformed),
            ValueType::Int => raw
                .try_into()
                .map(|b| Value::Int(i16::from_be_bytes(b)))
                .map_err(|_| malformed()),
            ValueType::Float => raw
                .try_into()
                .map(|b| Value::Float(f32::from_be_bytes(b)))
                .map_err(|_| malformed()),
            ValueType::String => {
                let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                Ok(Value::Str(raw[..end].to_vec()))
            }
        }
    }

    pub(crate) fn mismatch(&self, expected: &'static str) -> KernelError {
        KernelError::TypeMismatch {
            expected,
            found: self.ty(),
        }
    }
}

/// Console rendering, as PRINT shows it.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Char(c) => write!(f, "{}", *c as char),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:.2}", x),
            Value::Str(s) => write!(f, "{}", String::from_utf8_lossy(s)),
        }
    }
}
