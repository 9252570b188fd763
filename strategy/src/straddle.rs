//! Two-leg straddle execution.
//!
//! `buy_straddle` walks Start → CollateralPulled → CallLegOpened → PutLegOpened →
//! Recorded → Complete inside one unit of work. Any failure returns the host to Start:
//! no pulled funds, no open leg, no ledger entry, no event.

use alloc::vec::Vec;
use alloy_primitives::{Address, U256};

use crate::collateral;
use crate::config::require_adapter;
use crate::error::{CostExceeded, InvalidAmount, StrategyError, StrikeNotLive};
use crate::events::{StrategyEvent, Trade};
use crate::host::StrategyHost;
use crate::journal::atomically;
use crate::ledger::{self, Position};
use crate::market::{OpenPosition, OptionType, Strike, TradeResult};

/// The call and put legs opened by one `buy_straddle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StraddlePair {
    pub call: Position,
    pub put: Position,
}

impl StraddlePair {
    /// `(call_position_id, put_position_id)`.
    #[must_use]
    pub const fn ids(&self) -> (U256, U256) {
        (self.call.position_id, self.put.position_id)
    }
}

/// Premium quotes used to size the collateral pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Budget {
    call_quote: U256,
    put_quote: U256,
}

/// Buys one long call and one long put of `amount` on `strike_id` for `caller`.
///
/// Pulls the combined premium quote from the caller, bounded by `max_total_cost`,
/// opens the call leg then the put leg, refunds unspent collateral and records both
/// legs in that order.
///
/// The pull covers each quote rounded up to native units. The put leg may spend
/// whatever the call leg left of it, and anything left after both legs goes back to
/// the caller.
///
/// # Errors
/// - `InvalidAmount` for a zero amount
/// - `NotInitialized` before wiring
/// - `UnknownId` / `StrikeNotLive` for a strike that cannot be traded
/// - `CostExceeded` when the combined premium is above `max_total_cost`
/// - `AllowanceExceeded` when the caller has not approved the pull
/// - any market error raised while opening either leg
pub fn buy_straddle<H: StrategyHost>(
    host: &mut H,
    caller: Address,
    strike_id: U256,
    amount: U256,
    max_total_cost: U256,
) -> Result<StraddlePair, StrategyError> {
    if amount == U256::ZERO {
        return Err(StrategyError::InvalidAmount(InvalidAmount {}));
    }
    require_adapter(host)?;

    let strike = live_strike(host, strike_id)?;
    let budget = quote_budget(host, strike_id, amount, max_total_cost)?;

    atomically(host, |host| {
        let custody = host.balance_of(host.this())?;
        let native = collateral::native_cover(host, &[budget.call_quote, budget.put_quote])?;
        collateral::pull(host, caller, native)?;
        collateral::fund_market(host, native)?;

        let call = open_leg(host, strike_id, OptionType::LongCall, amount, budget.call_quote)?;
        let remaining = collateral::spendable(host, custody)?;
        let put = open_leg(host, strike_id, OptionType::LongPut, amount, remaining)?;

        collateral::fund_market(host, U256::ZERO)?;
        let unspent = collateral::held(host, custody)?;
        collateral::refund(host, caller, unspent)?;

        let call = Position::open(
            call.position_id,
            caller,
            strike_id,
            strike.board_id,
            OptionType::LongCall,
            amount,
        );
        let put = Position::open(
            put.position_id,
            caller,
            strike_id,
            strike.board_id,
            OptionType::LongPut,
            amount,
        );
        ledger::record(host, call)?;
        ledger::record(host, put)?;

        for leg in [&call, &put] {
            host.emit(StrategyEvent::Trade(Trade {
                user: leg.owner,
                strike_id: leg.strike_id,
                position_id: leg.position_id,
                option_type: leg.option_type.to_u8(),
                amount: leg.amount,
            }));
        }

        Ok(StraddlePair { call, put })
    })
}

/// Every position `owner` ever opened through the strategy, in creation order.
#[must_use]
pub fn get_positions<H: StrategyHost>(host: &H, owner: Address) -> Vec<Position> {
    ledger::positions(host, owner)
}

fn live_strike<H: StrategyHost>(host: &H, strike_id: U256) -> Result<Strike, StrategyError> {
    let strike = host.strike(strike_id)?;
    if !strike.live || host.now() >= strike.expiry {
        return Err(StrategyError::StrikeNotLive(StrikeNotLive { strike_id }));
    }
    Ok(strike)
}

fn quote_budget<H: StrategyHost>(
    host: &H,
    strike_id: U256,
    amount: U256,
    max_total_cost: U256,
) -> Result<Budget, StrategyError> {
    let call_quote = host.quote_premium(strike_id, OptionType::LongCall, amount)?;
    let put_quote = host.quote_premium(strike_id, OptionType::LongPut, amount)?;

    let total = call_quote.checked_add(put_quote).ok_or(StrategyError::CostExceeded(
        CostExceeded {
            cost: U256::MAX,
            max_cost: max_total_cost,
        },
    ))?;
    if total > max_total_cost {
        return Err(StrategyError::CostExceeded(CostExceeded {
            cost: total,
            max_cost: max_total_cost,
        }));
    }

    Ok(Budget {
        call_quote,
        put_quote,
    })
}

fn open_leg<H: StrategyHost>(
    host: &mut H,
    strike_id: U256,
    option_type: OptionType,
    amount: U256,
    max_total_cost: U256,
) -> Result<TradeResult, StrategyError> {
    let result = host.open_position(&OpenPosition {
        strike_id,
        option_type,
        amount,
        max_total_cost,
    })?;

    // The bound is the market's to enforce; a market that ignores it must not drain custody.
    if result.total_cost > max_total_cost {
        return Err(StrategyError::CostExceeded(CostExceeded {
            cost: result.total_cost,
            max_cost: max_total_cost,
        }));
    }
    Ok(result)
}
