//! Per-owner record of every position the strategy opened.
//!
//! Entries are appended in creation order and never removed. `amount` is written once
//! at open; `status` only moves from Open to Settled; a position id is recorded at
//! most once.

use alloc::vec::Vec;
use alloy_primitives::{Address, U256};

use crate::error::{
    AlreadyClaimed, InvalidAmount, InvalidPositionId, NotPositionOwner, NotSettled,
    PositionIdReused, StrategyError, UnknownId,
};
use crate::market::OptionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionStatus {
    #[default]
    Open,
    Settled,
}

impl PositionStatus {
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Settled => 1,
        }
    }

    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Open),
            1 => Some(Self::Settled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Market-assigned id, never zero once recorded.
    pub position_id: U256,
    pub owner: Address,
    pub strike_id: U256,
    pub board_id: U256,
    pub option_type: OptionType,
    /// Notional size, 18 decimals.
    pub amount: U256,
    pub status: PositionStatus,
    /// Fixed at settlement; zero while open or when out of the money.
    pub payout: U256,
    pub claimed: bool,
}

impl Position {
    /// A freshly opened leg.
    #[must_use]
    pub const fn open(
        position_id: U256,
        owner: Address,
        strike_id: U256,
        board_id: U256,
        option_type: OptionType,
        amount: U256,
    ) -> Self {
        Self {
            position_id,
            owner,
            strike_id,
            board_id,
            option_type,
            amount,
            status: PositionStatus::Open,
            payout: U256::ZERO,
            claimed: false,
        }
    }
}

/// Raw persistence for the ledger. Invariants are enforced by the functions in this
/// module, not by implementations.
pub trait PositionStore {
    fn position_count(&self, owner: Address) -> usize;

    fn load_position(&self, owner: Address, index: usize) -> Option<Position>;

    /// Owner and per-owner index of a recorded position id.
    fn locate_position(&self, position_id: U256) -> Option<(Address, usize)>;

    /// Ids of every recorded position on a board, in creation order.
    fn board_position_ids(&self, board_id: U256) -> Vec<U256>;

    /// Appends to the owner's list and indexes the id and board.
    fn append_position(&mut self, position: &Position);

    fn store_settlement(&mut self, owner: Address, index: usize, payout: U256);

    fn store_claimed(&mut self, owner: Address, index: usize);
}

/// Appends a newly opened position to its owner's ledger and returns its index.
///
/// # Errors
/// - `InvalidPositionId` for the unassigned id
/// - `InvalidAmount` for a zero amount
/// - `PositionIdReused` if the id is already recorded
pub fn record<S: PositionStore>(store: &mut S, position: Position) -> Result<usize, StrategyError> {
    if position.position_id == U256::ZERO {
        return Err(StrategyError::InvalidPositionId(InvalidPositionId {}));
    }
    if position.amount == U256::ZERO {
        return Err(StrategyError::InvalidAmount(InvalidAmount {}));
    }
    if store.locate_position(position.position_id).is_some() {
        return Err(StrategyError::PositionIdReused(PositionIdReused {
            position_id: position.position_id,
        }));
    }

    let index = store.position_count(position.owner);
    store.append_position(&Position::open(
        position.position_id,
        position.owner,
        position.strike_id,
        position.board_id,
        position.option_type,
        position.amount,
    ));
    Ok(index)
}

/// Full history for `owner`, settled positions included, in creation order.
#[must_use]
pub fn positions<S: PositionStore>(store: &S, owner: Address) -> Vec<Position> {
    (0..store.position_count(owner))
        .filter_map(|index| store.load_position(owner, index))
        .collect()
}

/// Looks a position up by id.
///
/// # Errors
/// `UnknownId` if the ledger never recorded it.
pub fn find<S: PositionStore>(
    store: &S,
    position_id: U256,
) -> Result<(usize, Position), StrategyError> {
    store
        .locate_position(position_id)
        .and_then(|(owner, index)| store.load_position(owner, index).map(|p| (index, p)))
        .ok_or(StrategyError::UnknownId(UnknownId { id: position_id }))
}

/// Moves an open position to Settled with its payout.
///
/// Returns `None` when the position was already settled; its payout is left untouched.
///
/// # Errors
/// `UnknownId`.
pub fn mark_settled<S: PositionStore>(
    store: &mut S,
    position_id: U256,
    payout: U256,
) -> Result<Option<Position>, StrategyError> {
    let (index, position) = find(store, position_id)?;
    if position.status == PositionStatus::Settled {
        return Ok(None);
    }

    store.store_settlement(position.owner, index, payout);
    Ok(Some(Position {
        status: PositionStatus::Settled,
        payout,
        ..position
    }))
}

/// Flags a settled position's payout as collected by `caller`.
///
/// # Errors
/// - `UnknownId`
/// - `NotPositionOwner` if `caller` does not own the position
/// - `NotSettled` while the position is open
/// - `AlreadyClaimed` on a second claim
pub fn mark_claimed<S: PositionStore>(
    store: &mut S,
    position_id: U256,
    caller: Address,
) -> Result<Position, StrategyError> {
    let (index, position) = find(store, position_id)?;
    if position.owner != caller {
        return Err(StrategyError::NotPositionOwner(NotPositionOwner {
            position_id,
            caller,
        }));
    }
    if position.status != PositionStatus::Settled {
        return Err(StrategyError::NotSettled(NotSettled { position_id }));
    }
    if position.claimed {
        return Err(StrategyError::AlreadyClaimed(AlreadyClaimed { position_id }));
    }

    store.store_claimed(position.owner, index);
    Ok(Position {
        claimed: true,
        ..position
    })
}
