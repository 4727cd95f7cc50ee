use crate::errors::SwarmError;
use rust_decimal::prelude::ToPrimitive as _;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr as _;

pub const SOL_DECIMALS: u32 = 9;
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Lamports to whole SOL, exact. `1_500_000_000` => `1.5`.
pub fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(lamports), SOL_DECIMALS).normalize()
}

/// Whole SOL to lamports. Rejects zero, negatives and sub-lamport precision instead of rounding.
pub fn sol_to_lamports(sol: Decimal) -> Result<u64, SwarmError> {
    if sol.is_zero() {
        return Err(SwarmError::malformed("amount must be greater than zero"));
    }
    if sol.is_sign_negative() {
        return Err(SwarmError::malformed("amount must be non-negative"));
    }
    if sol.normalize().scale() > SOL_DECIMALS {
        return Err(SwarmError::malformed(format!(
            "too many decimal places for SOL (max {SOL_DECIMALS})"
        )));
    }
    sol.checked_mul(Decimal::from(LAMPORTS_PER_SOL))
        .and_then(|l| l.to_u64())
        .ok_or_else(|| SwarmError::malformed("amount overflow"))
}

/// Accepts a JSON number or a numeric string, the two shapes agents send amounts in.
pub fn parse_sol_amount(v: &Value) -> Result<Decimal, SwarmError> {
    match v {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return Ok(Decimal::from(u));
            }
            if let Some(i) = n.as_i64() {
                return Ok(Decimal::from(i));
            }
            // f64 `Display` never uses exponent notation, so this round-trips through Decimal.
            let f = n
                .as_f64()
                .ok_or_else(|| SwarmError::malformed(format!("amount is not a number: {n}")))?;
            Decimal::from_str(&format!("{f}"))
                .map_err(|e| SwarmError::malformed(format!("amount {n} out of range: {e}")))
        }
        Value::String(s) => Decimal::from_str(s.trim())
            .map_err(|e| SwarmError::malformed(format!("amount {s:?} is not a decimal: {e}"))),
        Value::Null => Err(SwarmError::malformed("missing amount")),
        other => Err(SwarmError::malformed(format!(
            "amount must be a number, got {other}"
        ))),
    }
}
