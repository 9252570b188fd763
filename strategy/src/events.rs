use alloy_sol_types::sol;

sol! {
    /// Emitted once per opened leg; a straddle emits the call leg first.
    #[derive(Debug, PartialEq, Eq)]
    event Trade(
        address indexed user,
        uint256 indexed strike_id,
        uint256 position_id,
        uint8 option_type,
        uint256 amount
    );

    /// Emitted when settlement fixes the payout of a ledger position.
    #[derive(Debug, PartialEq, Eq)]
    event PositionSettled(
        address indexed user,
        uint256 indexed position_id,
        uint256 board_id,
        uint256 payout
    );

    /// Emitted when an owner collects settled payouts.
    #[derive(Debug, PartialEq, Eq)]
    event SettlementClaimed(
        address indexed user,
        uint256 positions,
        uint256 paid
    );

    /// Emitted once when the collaborator contracts are wired.
    #[derive(Debug, PartialEq, Eq)]
    event AdapterInitialized(
        address registry,
        address option_market,
        address curve_swap,
        address fee_counter
    );
}

/// Every event the strategy emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyEvent {
    Trade(Trade),
    PositionSettled(PositionSettled),
    SettlementClaimed(SettlementClaimed),
    AdapterInitialized(AdapterInitialized),
}

pub trait EventSink {
    fn emit(&mut self, event: StrategyEvent);
}
