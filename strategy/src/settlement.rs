//! Board expiry: fixing payouts on the ledger and handing them to owners.

use alloy_primitives::{Address, U256};

use crate::collateral;
use crate::config::require_adapter;
use crate::error::{
    BoardNotExpired, EmptyClaim, PayoutOverflow, SettlementMismatch, StrategyError,
};
use crate::events::{PositionSettled, SettlementClaimed, StrategyEvent};
use crate::host::StrategyHost;
use crate::journal::atomically;
use crate::ledger;

/// Settles `board_id` on the market and moves every open ledger position on it to
/// Settled with the market's payout.
///
/// Callable by anyone after expiry. A second call finds nothing open and changes
/// nothing. Returns how many positions this call settled.
///
/// # Errors
/// - `NotInitialized` before wiring
/// - `UnknownId` for an unknown board
/// - `BoardNotExpired` before the board's expiry
/// - `OracleUnavailable` when the market has no price at expiry
pub fn settle_expired<H: StrategyHost>(host: &mut H, board_id: U256) -> Result<usize, StrategyError> {
    require_adapter(host)?;

    let board = host.board(board_id)?;
    let now = host.now();
    if now < board.expiry {
        return Err(StrategyError::BoardNotExpired(BoardNotExpired {
            board_id,
            expiry: U256::from(board.expiry),
            timestamp: U256::from(now),
        }));
    }

    atomically(host, |host| {
        if !board.settled {
            host.settle_board(board_id)?;
        }

        let mut settled = 0;
        for position_id in host.board_position_ids(board_id) {
            let (_, position) = ledger::find(host, position_id)?;
            if position.status == ledger::PositionStatus::Settled {
                continue;
            }

            let payout = host.settlement_payout(position_id)?;
            if let Some(position) = ledger::mark_settled(host, position_id, payout)? {
                host.emit(StrategyEvent::PositionSettled(PositionSettled {
                    user: position.owner,
                    position_id,
                    board_id,
                    payout,
                }));
                settled += 1;
            }
        }
        Ok(settled)
    })
}

/// Collects the settled payouts of `position_ids` for `caller` and forwards them.
///
/// Every id must belong to `caller`, be settled and not yet claimed. The market must
/// pay exactly what the ledger recorded. Returns the 18-decimal amount paid.
///
/// # Errors
/// - `EmptyClaim` for an empty request
/// - `UnknownId`, `NotPositionOwner`, `NotSettled`, `AlreadyClaimed` per position
/// - `PayoutOverflow` when the recorded payouts do not sum within a uint256
/// - `SettlementMismatch` when the market pays a different total
pub fn claim_payout<H: StrategyHost>(
    host: &mut H,
    caller: Address,
    position_ids: &[U256],
) -> Result<U256, StrategyError> {
    if position_ids.is_empty() {
        return Err(StrategyError::EmptyClaim(EmptyClaim {}));
    }
    require_adapter(host)?;

    atomically(host, |host| {
        let mut expected = U256::ZERO;
        for &position_id in position_ids {
            let position = ledger::mark_claimed(host, position_id, caller)?;
            expected = expected
                .checked_add(position.payout)
                .ok_or(StrategyError::PayoutOverflow(PayoutOverflow {}))?;
        }

        let paid = host.claim_settlement(position_ids)?;
        if paid != expected {
            return Err(StrategyError::SettlementMismatch(SettlementMismatch {
                expected,
                paid,
            }));
        }

        collateral::release(host, caller, paid)?;
        host.emit(StrategyEvent::SettlementClaimed(SettlementClaimed {
            user: caller,
            positions: U256::from(position_ids.len()),
            paid,
        }));
        Ok(paid)
    })
}
