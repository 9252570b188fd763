//! Quote-asset custody: pulling premiums from callers, funding the market, paying out.
//!
//! The market prices premiums and payouts in 18 decimals but moves the token in its
//! native units. Conversion between the two happens here and nowhere else.

use alloy_primitives::{Address, U256};

use crate::error::{AllowanceExceeded, NormalizationOverflow, StrategyError};
use crate::fixed::{denormalize_amount, denormalize_amount_up, normalize_amount};
use crate::host::Environment;
use crate::market::OptionMarket;

/// ERC20-style quote asset as seen from the strategy contract.
///
/// Every method acts on the market's quote asset with the strategy as `msg.sender`.
/// Amounts are native units.
pub trait QuoteToken {
    /// # Errors
    /// `TransferFailed` when the token cannot be queried.
    fn decimals(&self) -> Result<u8, StrategyError>;

    /// # Errors
    /// `TransferFailed` when the token cannot be queried.
    fn balance_of(&self, account: Address) -> Result<U256, StrategyError>;

    /// # Errors
    /// `TransferFailed` when the token cannot be queried.
    fn allowance(&self, owner: Address, spender: Address) -> Result<U256, StrategyError>;

    /// Moves `amount` from `from` to `to` using the strategy's allowance.
    ///
    /// # Errors
    /// `TransferFailed` when the token returns `false` or reverts.
    fn transfer_from(&mut self, from: Address, to: Address, amount: U256)
        -> Result<(), StrategyError>;

    /// # Errors
    /// `TransferFailed` when the token returns `false` or reverts.
    fn transfer(&mut self, to: Address, amount: U256) -> Result<(), StrategyError>;

    /// # Errors
    /// `TransferFailed` when the token returns `false` or reverts.
    fn approve(&mut self, spender: Address, amount: U256) -> Result<(), StrategyError>;
}

/// Native units that cover every 18-decimal charge in `charges`.
///
/// Each charge is rounded up on its own, since the market takes each one separately.
///
/// # Errors
/// `InvalidDecimals`, `NormalizationOverflow`.
pub fn native_cover<H: QuoteToken>(host: &H, charges: &[U256]) -> Result<U256, StrategyError> {
    let decimals = host.decimals()?;
    charges.iter().try_fold(U256::ZERO, |total, &charge| {
        total
            .checked_add(denormalize_amount_up(charge, decimals)?)
            .ok_or(StrategyError::NormalizationOverflow(NormalizationOverflow {}))
    })
}

/// Pulls exactly `native` units of quote asset from `owner` into strategy custody.
///
/// Never caps the pull: an insufficient allowance is a hard failure.
///
/// # Errors
/// - `AllowanceExceeded` if the owner's allowance to the strategy is below the amount
/// - `TransferFailed` if the token refuses the transfer
pub fn pull<H>(host: &mut H, owner: Address, native: U256) -> Result<(), StrategyError>
where
    H: QuoteToken + Environment,
{
    if native == U256::ZERO {
        return Ok(());
    }

    let strategy = host.this();
    let allowance = host.allowance(owner, strategy)?;
    if allowance < native {
        return Err(StrategyError::AllowanceExceeded(AllowanceExceeded {
            owner,
            allowance,
            required: native,
        }));
    }

    host.transfer_from(owner, strategy, native)
}

/// Native units in strategy custody above `baseline`.
///
/// # Errors
/// `TransferFailed` when the balance cannot be read.
pub fn held<H>(host: &H, baseline: U256) -> Result<U256, StrategyError>
where
    H: QuoteToken + Environment,
{
    Ok(host.balance_of(host.this())?.saturating_sub(baseline))
}

/// [`held`] expressed in 18 decimals, for bounding what the market may charge.
///
/// # Errors
/// `TransferFailed`, `InvalidDecimals`, `NormalizationOverflow`.
pub fn spendable<H>(host: &H, baseline: U256) -> Result<U256, StrategyError>
where
    H: QuoteToken + Environment,
{
    normalize_amount(held(host, baseline)?, host.decimals()?)
}

/// Approves the option market to take up to `native` units from strategy custody.
///
/// # Errors
/// `NotInitialized`, `TransferFailed`.
pub fn fund_market<H>(host: &mut H, native: U256) -> Result<(), StrategyError>
where
    H: QuoteToken + OptionMarket,
{
    let market = host.market_address()?;
    host.approve(market, native)
}

/// Returns `native` units from strategy custody to `to`. Zero is a no-op.
///
/// # Errors
/// `TransferFailed`.
pub fn refund<H: QuoteToken>(host: &mut H, to: Address, native: U256) -> Result<(), StrategyError> {
    if native == U256::ZERO {
        return Ok(());
    }
    host.transfer(to, native)
}

/// Sends `amount` (18 decimals) from strategy custody to `to`, truncating dust.
///
/// # Errors
/// `TransferFailed`, `InvalidDecimals`.
pub fn release<H: QuoteToken>(host: &mut H, to: Address, amount: U256) -> Result<U256, StrategyError> {
    let native = denormalize_amount(amount, host.decimals()?)?;
    refund(host, to, native)?;
    Ok(native)
}
