//! Typed access to literal process arguments

use super::NodeContext;
use crate::error::{DriverError, Result};
use serde_json::Value;

pub fn required_i64(ctx: &NodeContext<'_>, name: &str) -> Result<i64> {
    match ctx.literal(name)? {
        Some(value) => as_i64(name, &value),
        None => Err(DriverError::missing_parameter(name)),
    }
}

pub fn optional_i64(ctx: &NodeContext<'_>, name: &str, default: i64) -> Result<i64> {
    match ctx.literal(name)? {
        Some(value) => as_i64(name, &value),
        None => Ok(default),
    }
}

pub fn optional_f64(ctx: &NodeContext<'_>, name: &str, default: f64) -> Result<f64> {
    match ctx.literal(name)? {
        Some(value) => value
            .as_f64()
            .ok_or_else(|| DriverError::invalid_parameter(name, "expected a number")),
        None => Ok(default),
    }
}

/// Booleans may also be given as the strings `"true"` and `"false"`
pub fn optional_bool(ctx: &NodeContext<'_>, name: &str, default: bool) -> Result<bool> {
    match ctx.literal(name)? {
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(true),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(false),
        Some(_) => Err(DriverError::invalid_parameter(name, "expected a boolean")),
        None => Ok(default),
    }
}

pub fn required_string(ctx: &NodeContext<'_>, name: &str) -> Result<String> {
    match ctx.literal(name)? {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(_) => Err(DriverError::invalid_parameter(
            name,
            "expected a non-empty string",
        )),
        None => Err(DriverError::missing_parameter(name)),
    }
}

fn as_i64(name: &str, value: &Value) -> Result<i64> {
    if let Some(i) = value.as_i64() {
        return Ok(i);
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err(DriverError::invalid_parameter(name, "expected an integer")),
    }
}
