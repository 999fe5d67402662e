//! Operators over typed values.
//!
//! Numeric operators work in the widest operand type (CHAR < INT < FLOAT)
//! and wrap on overflow the way 8- and 16-bit registers do. Relational and
//! logical operators produce CHAR 1 or 0.

use std::cmp::Ordering;

use crate::error::{KernelError, Result};
use crate::value::{Value, ValueType};

fn arith(
    a: &Value,
    b: &Value,
    int: impl FnOnce(i32, i32) -> Option<i32>,
    float: impl FnOnce(f32, f32) -> f32,
) -> Result<Value> {
    match a.ty().wider(b.ty())? {
        ValueType::Float => Ok(Value::Float(float(a.as_f32()?, b.as_f32()?))),
        ty => int(a.as_i32()?, b.as_i32()?)
            .map(|n| Value::from_i32(ty, n))
            .ok_or(KernelError::DivisionByZero),
    }
}

pub fn add(a: &Value, b: &Value) -> Result<Value> {
    arith(a, b, |x, y| Some(x.wrapping_add(y)), |x, y| x + y)
}

pub fn sub(a: &Value, b: &Value) -> Result<Value> {
    arith(a, b, |x, y| Some(x.wrapping_sub(y)), |x, y| x - y)
}

pub fn mul(a: &Value, b: &Value) -> Result<Value> {
    arith(a, b, |x, y| Some(x.wrapping_mul(y)), |x, y| x * y)
}

pub fn div(a: &Value, b: &Value) -> Result<Value> {
    arith(a, b, |x, y| x.checked_div(y), |x, y| x / y)
}

pub fn rem(a: &Value, b: &Value) -> Result<Value> {
    arith(a, b, |x, y| x.checked_rem(y), |x, y| x % y)
}

pub fn compare(a: &Value, b: &Value, pred: fn(Ordering) -> bool) -> Result<Value> {
    Ok(Value::from_bool(pred(a.compare(b)?)))
}

pub fn logical(a: &Value, b: &Value, f: fn(bool, bool) -> bool) -> Result<Value> {
    Ok(Value::from_bool(f(a.is_truthy(), b.is_truthy())))
}

pub fn bitwise(a: &Value, b: &Value, f: fn(i32, i32) -> i32) -> Result<Value> {
    let (x, y) = (a.as_bits()?, b.as_bits()?);
    Ok(Value::from_i32(a.ty().wider(b.ty())?, f(x, y)))
}

pub fn min(a: &Value, b: &Value) -> Result<Value> {
    let pick = if a.compare(b)? == Ordering::Greater { b } else { a };
    cast(pick, a.ty().wider(b.ty())?)
}

pub fn max(a: &Value, b: &Value) -> Result<Value> {
    let pick = if a.compare(b)? == Ordering::Less { b } else { a };
    cast(pick, a.ty().wider(b.ty())?)
}

pub fn pow(a: &Value, b: &Value) -> Result<Value> {
    Ok(Value::Float(a.as_f32()?.powf(b.as_f32()?)))
}

pub fn negate(a: &Value) -> Result<Value> {
    match a {
        Value::Char(c) => Ok(Value::Char(c.wrapping_neg())),
        Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
        Value::Float(f) => Ok(Value::Float(-f)),
        Value::Str(_) => Err(a.mismatch("number")),
    }
}

pub fn not(a: &Value) -> Result<Value> {
    Ok(Value::from_bool(!a.is_truthy()))
}

pub fn bit_not(a: &Value) -> Result<Value> {
    Ok(Value::from_i32(a.ty(), !a.as_bits()?))
}

pub fn abs(a: &Value) -> Result<Value> {
    match a {
        Value::Int(i) => Ok(Value::Int(i.wrapping_abs())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        Value::Char(_) => Ok(a.clone()),
        Value::Str(_) => Err(a.mismatch("number")),
    }
}

pub fn sq(a: &Value) -> Result<Value> {
    mul(a, a)
}

pub fn sqrt(a: &Value) -> Result<Value> {
    Ok(Value::Float(a.as_f32()?.sqrt()))
}

/// ROUND, FLOOR and CEIL: FLOAT becomes INT, integers pass through.
pub fn to_integral(a: &Value, f: fn(f32) -> f32) -> Result<Value> {
    match a {
        Value::Float(x) => Ok(Value::Int(f(*x) as i16)),
        Value::Str(_) => Err(a.mismatch("number")),
        _ => Ok(a.clone()),
    }
}

/// Convert a value to another type, truncating or widening.
pub fn cast(a: &Value, ty: ValueType) -> Result<Value> {
    match ty {
        ValueType::Char => Ok(Value::Char(a.as_i32()? as u8)),
        ValueType::Int => Ok(Value::Int(a.as_i32()? as i16)),
        ValueType::Float => Ok(Value::Float(a.as_f32()?)),
        ValueType::String => a.as_str_bytes().map(|s| Value::Str(s.to_vec())),
    }
}

/// Clamp `x` into `[lo, hi]` in the widest of the three types.
pub fn constrain(x: &Value, lo: &Value, hi: &Value) -> Result<Value> {
    let ty = x.ty().wider(lo.ty())?.wider(hi.ty())?;
    let pick = if x.compare(lo)? == Ordering::Less {
        lo
    } else if x.compare(hi)? == Ordering::Greater {
        hi
    } else {
        x
    };
    cast(pick, ty)
}

/// Re-map `x` from one range onto another, like the Arduino `map()`.
pub fn map(
    x: &Value,
    from_lo: &Value,
    from_hi: &Value,
    to_lo: &Value,
    to_hi: &Value,
) -> Result<Value> {
    let ty = [from_lo, from_hi, to_lo, to_hi]
        .iter()
        .try_fold(x.ty(), |ty, v| ty.wider(v.ty()))?;

    if ty == ValueType::Float {
        let (x, fl, fh, tl, th) = (
            x.as_f32()?,
            from_lo.as_f32()?,
            from_hi.as_f32()?,
            to_lo.as_f32()?,
            to_hi.as_f32()?,
        );
        if fh == fl {
            return Err(KernelError::DivisionByZero);
        }
        return Ok(Value::Float((x - fl) * (th - tl) / (fh - fl) + tl));
    }

    let (x, fl, fh, tl, th) = (
        x.as_i32()? as i64,
        from_lo.as_i32()? as i64,
        from_hi.as_i32()? as i64,
        to_lo.as_i32()? as i64,
        to_hi.as_i32()? as i64,
    );
    if fh == fl {
        return Err(KernelError::DivisionByZero);
    }
    Ok(Value::from_i32(ty, ((x - fl) * (th - tl) / (fh - fl) + tl) as i32))
}
