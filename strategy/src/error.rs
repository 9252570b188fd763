use alloy_primitives::Address;
use alloy_sol_types::{sol, SolError};
use stylus_sdk::prelude::*;

sol! {
    /// Errors that can occur in the straddle strategy contract.
    #[derive(Debug, PartialEq, Eq)]
    error InvalidAmount();
    #[derive(Debug, PartialEq, Eq)]
    error UnknownId(uint256 id);
    #[derive(Debug, PartialEq, Eq)]
    error StrikeNotLive(uint256 strike_id);
    #[derive(Debug, PartialEq, Eq)]
    error InsufficientAllowance(address owner, uint256 allowance, uint256 required);
    #[derive(Debug, PartialEq, Eq)]
    error AllowanceExceeded(address owner, uint256 allowance, uint256 required);
    #[derive(Debug, PartialEq, Eq)]
    error CostExceeded(uint256 cost, uint256 max_cost);
    #[derive(Debug, PartialEq, Eq)]
    error TransferFailed(address token);
    #[derive(Debug, PartialEq, Eq)]
    error NotInitialized();
    #[derive(Debug, PartialEq, Eq)]
    error AlreadyInitialized();
    #[derive(Debug, PartialEq, Eq)]
    error InvalidAddress();
    #[derive(Debug, PartialEq, Eq)]
    error BoardNotExpired(uint256 board_id, uint256 expiry, uint256 timestamp);
    #[derive(Debug, PartialEq, Eq)]
    error OracleUnavailable(uint256 board_id);
    #[derive(Debug, PartialEq, Eq)]
    error NotSettled(uint256 position_id);
    #[derive(Debug, PartialEq, Eq)]
    error AlreadyClaimed(uint256 position_id);
    #[derive(Debug, PartialEq, Eq)]
    error NotPositionOwner(uint256 position_id, address caller);
    #[derive(Debug, PartialEq, Eq)]
    error PositionIdReused(uint256 position_id);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidPositionId();
    #[derive(Debug, PartialEq, Eq)]
    error SettlementMismatch(uint256 expected, uint256 paid);
    #[derive(Debug, PartialEq, Eq)]
    error MarketCallFailed(address market);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidDecimals(uint8 decimals);
    #[derive(Debug, PartialEq, Eq)]
    error NormalizationOverflow();
    #[derive(Debug, PartialEq, Eq)]
    error InvalidOptionType(uint8 value);
    #[derive(Debug, PartialEq, Eq)]
    error EmptyClaim();
    #[derive(Debug, PartialEq, Eq)]
    error Unauthorized(address caller);
    #[derive(Debug, PartialEq, Eq)]
    error PayoutOverflow();
}

#[derive(SolidityError, Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    /// Trade size is zero.
    InvalidAmount(InvalidAmount),
    /// Board, strike or position id is not known to the market or the ledger.
    UnknownId(UnknownId),
    /// The strike's board has expired or the strike cannot be traded.
    StrikeNotLive(StrikeNotLive),
    /// The market could not take the premium from strategy custody.
    InsufficientAllowance(InsufficientAllowance),
    /// The caller has not approved enough quote asset for the pull.
    AllowanceExceeded(AllowanceExceeded),
    /// Premium is above the caller's bound.
    CostExceeded(CostExceeded),
    /// Quote asset transfer returned `false` or reverted.
    TransferFailed(TransferFailed),
    /// `init_adapter` has not been called yet.
    NotInitialized(NotInitialized),
    /// `init_adapter` can only be called once.
    AlreadyInitialized(AlreadyInitialized),
    /// A collaborator address was zero.
    InvalidAddress(InvalidAddress),
    /// Settlement attempted before the board's expiry.
    BoardNotExpired(BoardNotExpired),
    /// No price at expiry has been reported for the board.
    OracleUnavailable(OracleUnavailable),
    /// Claim attempted on a position whose board has not been settled.
    NotSettled(NotSettled),
    /// Payout for the position was already collected.
    AlreadyClaimed(AlreadyClaimed),
    /// The position belongs to another owner.
    NotPositionOwner(NotPositionOwner),
    /// The market handed out a position id the ledger already holds.
    PositionIdReused(PositionIdReused),
    /// The market returned the unassigned (zero) position id.
    InvalidPositionId(InvalidPositionId),
    /// The market paid a different amount than the ledger recorded.
    SettlementMismatch(SettlementMismatch),
    /// The market reverted with data that is not a known market error.
    MarketCallFailed(MarketCallFailed),
    /// Token decimals exceed maximum of 18.
    InvalidDecimals(InvalidDecimals),
    /// Arithmetic overflow during normalization.
    NormalizationOverflow(NormalizationOverflow),
    /// Option type discriminant out of range.
    InvalidOptionType(InvalidOptionType),
    /// Claim request without position ids.
    EmptyClaim(EmptyClaim),
    /// Only the owner set at deployment may wire the adapter.
    Unauthorized(Unauthorized),
    /// The claimed payouts do not fit in a uint256.
    PayoutOverflow(PayoutOverflow),
}

impl StrategyError {
    /// Decodes revert data returned by the option market into the matching error.
    ///
    /// Only errors the market is allowed to raise are recognised; anything else
    /// collapses into `MarketCallFailed` so the caller still sees a typed failure.
    #[must_use]
    pub fn from_market_revert(market: Address, data: &[u8]) -> Self {
        if let Ok(err) = UnknownId::abi_decode(data, true) {
            return Self::UnknownId(err);
        }
        if let Ok(err) = StrikeNotLive::abi_decode(data, true) {
            return Self::StrikeNotLive(err);
        }
        if let Ok(err) = InsufficientAllowance::abi_decode(data, true) {
            return Self::InsufficientAllowance(err);
        }
        if let Ok(err) = CostExceeded::abi_decode(data, true) {
            return Self::CostExceeded(err);
        }
        if let Ok(err) = OracleUnavailable::abi_decode(data, true) {
            return Self::OracleUnavailable(err);
        }
        if let Ok(err) = NotSettled::abi_decode(data, true) {
            return Self::NotSettled(err);
        }
        if let Ok(err) = AlreadyClaimed::abi_decode(data, true) {
            return Self::AlreadyClaimed(err);
        }
        Self::MarketCallFailed(MarketCallFailed { market })
    }
}

/// Shorthand for a call-site `Result` carrying [`StrategyError`].
pub type StrategyResult<T> = Result<T, StrategyError>;
