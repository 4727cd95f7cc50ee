use crate::{amount::parse_sol_amount, errors::SwarmError};
use rust_decimal::Decimal;
use serde_json::Value;

fn field<'a>(args: &'a Value, key: &str) -> Option<&'a Value> {
    args.get(key).filter(|v| !v.is_null())
}

/// A 1-based account index. Agents send these as JSON integers or as numeric strings.
pub fn index(args: &Value, key: &str) -> Result<i64, SwarmError> {
    match field(args, key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| SwarmError::malformed(format!("{key} must be an integer, got {n}"))),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|e| {
            SwarmError::malformed(format!("{key} must be an integer, got {s:?} ({e})"))
        }),
        Some(other) => Err(SwarmError::malformed(format!(
            "{key} must be an integer, got {other}"
        ))),
        None => Err(SwarmError::malformed(format!("missing {key}"))),
    }
}

pub fn text(args: &Value, key: &str) -> Result<String, SwarmError> {
    match field(args, key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_owned()),
        Some(Value::String(_)) => Err(SwarmError::malformed(format!("{key} must not be empty"))),
        Some(other) => Err(SwarmError::malformed(format!(
            "{key} must be a string, got {other}"
        ))),
        None => Err(SwarmError::malformed(format!("missing {key}"))),
    }
}

pub fn sol_amount(args: &Value, key: &str) -> Result<Decimal, SwarmError> {
    field(args, key)
        .map_or_else(
            || Err(SwarmError::malformed(format!("missing {key}"))),
            parse_sol_amount,
        )
}
