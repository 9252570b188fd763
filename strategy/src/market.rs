//! Typed façade over the external option market.
//!
//! The market owns pricing, liquidity and board settlement math. The strategy only
//! opens positions through it, reads boards and strikes, and collects payouts.

use alloc::vec::Vec;
use alloy_primitives::{Address, U256};

use crate::error::{InvalidOptionType, StrategyError};

/// Side and direction of an option position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionType {
    /// Right to buy the underlying at the strike price.
    #[default]
    LongCall,
    /// Right to sell the underlying at the strike price.
    LongPut,
    /// Obligation to sell the underlying at the strike price.
    ShortCall,
    /// Obligation to buy the underlying at the strike price.
    ShortPut,
}

impl OptionType {
    /// Converts option type to u8 for encoding.
    ///
    /// # Returns
    /// - `0` for LongCall
    /// - `1` for LongPut
    /// - `2` for ShortCall
    /// - `3` for ShortPut
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::LongCall => 0,
            Self::LongPut => 1,
            Self::ShortCall => 2,
            Self::ShortPut => 3,
        }
    }

    /// Converts a u8 to OptionType.
    ///
    /// # Errors
    /// Returns `InvalidOptionType` for values above 3.
    pub const fn from_u8(value: u8) -> Result<Self, StrategyError> {
        match value {
            0 => Ok(Self::LongCall),
            1 => Ok(Self::LongPut),
            2 => Ok(Self::ShortCall),
            3 => Ok(Self::ShortPut),
            _ => Err(StrategyError::InvalidOptionType(InvalidOptionType {
                value,
            })),
        }
    }

    #[must_use]
    pub const fn is_call(self) -> bool {
        matches!(self, Self::LongCall | Self::ShortCall)
    }
}

/// A tradable strike, owned by the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strike {
    pub id: U256,
    pub board_id: U256,
    /// Strike price, 18 decimals.
    pub strike_price: U256,
    /// Board expiry timestamp in seconds.
    pub expiry: u64,
    pub live: bool,
}

/// The set of strikes sharing one expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    pub expiry: u64,
    /// Whether the market has already run its expiry settlement for this board.
    pub settled: bool,
}

/// Parameters of a single open-position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenPosition {
    pub strike_id: U256,
    pub option_type: OptionType,
    /// Notional size, 18 decimals.
    pub amount: U256,
    /// Upper bound on the premium the market may charge for this request.
    pub max_total_cost: U256,
}

/// Outcome of a successful open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeResult {
    /// Market-assigned id; never zero on success.
    pub position_id: U256,
    /// Premium actually charged, 18 decimals.
    pub total_cost: U256,
}

/// The subset of the option market the strategy depends on.
///
/// Implementations map market reverts onto [`StrategyError`] without swallowing them.
pub trait OptionMarket {
    /// Address the market pulls premiums on behalf of; the strategy approves it.
    ///
    /// # Errors
    /// `NotInitialized` when no market has been wired.
    fn market_address(&self) -> Result<Address, StrategyError>;

    /// Quote asset the market settles premiums and payouts in.
    ///
    /// # Errors
    /// Propagates market call failures.
    fn quote_asset(&self) -> Result<Address, StrategyError>;

    /// Premium the market would currently charge for `amount` of `option_type`.
    ///
    /// # Errors
    /// `UnknownId`, `StrikeNotLive`.
    fn quote_premium(
        &self,
        strike_id: U256,
        option_type: OptionType,
        amount: U256,
    ) -> Result<U256, StrategyError>;

    /// Opens a position for the strategy, taking the premium from strategy custody.
    ///
    /// # Errors
    /// `InsufficientAllowance`, `CostExceeded`, `StrikeNotLive`.
    fn open_position(&mut self, request: &OpenPosition) -> Result<TradeResult, StrategyError>;

    /// # Errors
    /// Propagates market call failures.
    fn live_boards(&self) -> Result<Vec<U256>, StrategyError>;

    /// # Errors
    /// `UnknownId`.
    fn board_strikes(&self, board_id: U256) -> Result<Vec<U256>, StrategyError>;

    /// # Errors
    /// `UnknownId`.
    fn strike(&self, strike_id: U256) -> Result<Strike, StrategyError>;

    /// # Errors
    /// `UnknownId`.
    fn board(&self, board_id: U256) -> Result<Board, StrategyError>;

    /// Runs the market's expiry settlement for a board. Settling twice is a no-op.
    ///
    /// # Errors
    /// `OracleUnavailable` when no price at expiry is known.
    fn settle_board(&mut self, board_id: U256) -> Result<(), StrategyError>;

    /// Payout the market computed for a position at settlement; zero when out of the money.
    ///
    /// # Errors
    /// `NotSettled`, `UnknownId`.
    fn settlement_payout(&self, position_id: U256) -> Result<U256, StrategyError>;

    /// Transfers owed payouts for settled positions to the strategy.
    ///
    /// # Errors
    /// `NotSettled`, `AlreadyClaimed`.
    fn claim_settlement(&mut self, position_ids: &[U256]) -> Result<U256, StrategyError>;
}
