use alloy_primitives::U256;

use crate::error::{InvalidDecimals, NormalizationOverflow, StrategyError};

/// Decimal precision of every amount held by the ledger and exchanged with the market.
const PRECISION_DECIMALS: u8 = 18;

/// One whole unit in 18-decimal fixed point.
pub const UNIT: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

fn scale_factor(decimals: u8) -> Result<U256, StrategyError> {
    if decimals > PRECISION_DECIMALS {
        return Err(StrategyError::InvalidDecimals(InvalidDecimals { decimals }));
    }

    let scale_exp = PRECISION_DECIMALS - decimals;
    U256::from(10)
        .checked_pow(U256::from(scale_exp))
        .ok_or(StrategyError::NormalizationOverflow(NormalizationOverflow {}))
}

/// Normalizes an amount from native token decimals to 18 decimals.
///
/// # Errors
/// - `InvalidDecimals`: If `from_decimals > 18`
/// - `NormalizationOverflow`: If multiplication would overflow U256
pub fn normalize_amount(amount: U256, from_decimals: u8) -> Result<U256, StrategyError> {
    amount
        .checked_mul(scale_factor(from_decimals)?)
        .ok_or(StrategyError::NormalizationOverflow(NormalizationOverflow {}))
}

/// Denormalizes an amount from 18 decimals to native token decimals, truncating.
///
/// Used for payouts leaving strategy custody so the strategy
/// never sends more than it holds.
///
/// # Errors
/// - `InvalidDecimals`: If `to_decimals > 18`
pub fn denormalize_amount(amount: U256, to_decimals: u8) -> Result<U256, StrategyError> {
    Ok(amount / scale_factor(to_decimals)?)
}

/// Denormalizes an amount from 18 decimals to native token decimals, rounding up.
///
/// Used for amounts pulled into strategy custody so a premium is never under-collected.
///
/// # Errors
/// - `InvalidDecimals`: If `to_decimals > 18`
pub fn denormalize_amount_up(amount: U256, to_decimals: u8) -> Result<U256, StrategyError> {
    let scale = scale_factor(to_decimals)?;
    let quotient = amount / scale;
    if amount % scale == U256::ZERO {
        Ok(quotient)
    } else {
        Ok(quotient + U256::from(1))
    }
}

/// `a * b / UNIT` with overflow checking, rounding down.
#[must_use]
pub fn mul_unit(a: U256, b: U256) -> Option<U256> {
    a.checked_mul(b).map(|product| product / UNIT)
}
