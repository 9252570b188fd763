//! In-memory chain used by the unit tests.
//!
//! Holds an ERC20 quote asset, an option market with one board, and the strategy's
//! own storage. `checkpoint`/`rollback` snapshot and restore the whole state, the way
//! a dev chain's snapshot/revert does.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec;
use alloc::vec::Vec;
use alloy_primitives::{Address, U256};

use crate::collateral::QuoteToken;
use crate::config::{AdapterAddresses, AdapterConfig};
use crate::error::{
    CostExceeded, InsufficientAllowance, NotInitialized, NotSettled, AlreadyClaimed,
    OracleUnavailable, StrategyError, StrikeNotLive, TransferFailed, UnknownId,
};
use crate::events::{EventSink, PositionSettled, StrategyEvent, Trade};
use crate::fixed::{denormalize_amount, denormalize_amount_up, mul_unit, UNIT};
use crate::host::Environment;
use crate::journal::Transactional;
use crate::ledger::{Position, PositionStatus, PositionStore};
use crate::market::{Board, OpenPosition, OptionMarket, OptionType, Strike, TradeResult};

pub(crate) const STRATEGY: Address = Address::new([0x5A; 20]);
pub(crate) const MARKET: Address = Address::new([0x3A; 20]);
pub(crate) const QUOTE: Address = Address::new([0x0C; 20]);
/// Deployer that constructed the strategy.
pub(crate) const OWNER: Address = Address::new([0xDE; 20]);

pub(crate) const BOARD_ID: U256 = U256::from_limbs([1, 0, 0, 0]);
pub(crate) const STRIKE_1500: U256 = U256::from_limbs([1, 0, 0, 0]);
pub(crate) const STRIKE_2000: U256 = U256::from_limbs([2, 0, 0, 0]);
pub(crate) const STRIKE_2500: U256 = U256::from_limbs([3, 0, 0, 0]);

const GENESIS: u64 = 1_700_000_000;
const MONTH_SEC: u64 = 30 * 24 * 60 * 60;
const FIRST_POSITION_ID: u64 = 4_127;
const POSITION_ID_STRIDE: u64 = 3;

/// Balances and allowances of the quote asset.
#[derive(Clone, Default)]
struct Erc20 {
    balances: BTreeMap<Address, U256>,
    allowances: BTreeMap<Address, BTreeMap<Address, U256>>,
    decimals: u8,
}

impl Erc20 {
    fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or(U256::ZERO)
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&owner)
            .and_then(|m| m.get(&spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    fn mint(&mut self, to: Address, amount: U256) {
        let current_balance = self.balance_of(to);
        self.balances.insert(to, current_balance + amount);
    }

    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> bool {
        let sender_balance = self.balance_of(from);
        if sender_balance < amount {
            return false;
        }

        self.balances.insert(from, sender_balance - amount);
        let recipient_balance = self.balance_of(to);
        self.balances.insert(to, recipient_balance + amount);
        true
    }

    fn transfer_from(&mut self, spender: Address, from: Address, to: Address, amount: U256) -> bool {
        let allowance = self.allowance(from, spender);
        if allowance < amount || !self.transfer(from, to, amount) {
            return false;
        }

        if allowance != U256::MAX {
            self.approve(from, spender, allowance - amount);
        }
        true
    }

    fn approve(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances
            .entry(owner)
            .or_default()
            .insert(spender, amount);
    }
}

#[derive(Clone)]
struct SimStrike {
    board_id: U256,
    strike_price: U256,
    call_premium: U256,
    put_premium: U256,
}

#[derive(Clone)]
struct SimBoard {
    expiry: u64,
    strike_ids: Vec<U256>,
    price_at_expiry: Option<U256>,
}

#[derive(Clone)]
struct MarketPosition {
    strike_id: U256,
    option_type: OptionType,
    amount: U256,
}

/// Everything that a reverted invocation must leave untouched.
#[derive(Clone, Default)]
pub(crate) struct ChainState {
    token: Erc20,
    boards: BTreeMap<U256, SimBoard>,
    strikes: BTreeMap<U256, SimStrike>,
    market_positions: BTreeMap<U256, MarketPosition>,
    market_claimed: BTreeSet<U256>,
    next_position_id: U256,
    /// Added to every per-unit premium after each open.
    price_impact: U256,
    impact_accrued: U256,

    adapter: Option<AdapterAddresses>,
    ledger: BTreeMap<Address, Vec<Position>>,
    position_index: BTreeMap<U256, (Address, usize)>,
    board_index: BTreeMap<U256, Vec<U256>>,
    events: Vec<StrategyEvent>,
}

pub(crate) struct SimChain {
    state: ChainState,
    now: u64,
    spot_at_expiry: Option<U256>,
    rejected_leg: Option<(OptionType, StrategyError)>,
    forced_position_id: Option<U256>,
    claim_skim: U256,
    rollbacks: usize,
    board_settlements: usize,
}

impl SimChain {
    /// A chain without strategy wiring: one board expiring in a month with strikes
    /// at 1500, 2000 and 2500, and a funded liquidity pool.
    pub(crate) fn unwired() -> Self {
        let mut state = ChainState {
            next_position_id: U256::from(FIRST_POSITION_ID),
            ..ChainState::default()
        };
        state.token.decimals = 18;
        state.token.mint(MARKET, U256::from(1_000_000) * UNIT);

        let expiry = GENESIS + MONTH_SEC;
        let listed = [
            (STRIKE_1500, 1_500u64, 63u64, 13u64),
            (STRIKE_2000, 2_000, 25, 48),
            (STRIKE_2500, 2_500, 8, 110),
        ];
        for (strike_id, price, call, put) in listed {
            state.strikes.insert(
                strike_id,
                SimStrike {
                    board_id: BOARD_ID,
                    strike_price: U256::from(price) * UNIT,
                    call_premium: U256::from(call) * UNIT,
                    put_premium: U256::from(put) * UNIT,
                },
            );
        }
        state.boards.insert(
            BOARD_ID,
            SimBoard {
                expiry,
                strike_ids: listed.iter().map(|(id, ..)| *id).collect(),
                price_at_expiry: None,
            },
        );

        Self {
            state,
            now: GENESIS,
            spot_at_expiry: None,
            rejected_leg: None,
            forced_position_id: None,
            claim_skim: U256::ZERO,
            rollbacks: 0,
            board_settlements: 0,
        }
    }

    /// [`Self::unwired`] with the adapter already initialised.
    pub(crate) fn seeded() -> Self {
        let mut chain = Self::unwired();
        chain.state.adapter = Some(AdapterAddresses {
            registry: Address::new([0x01; 20]),
            option_market: MARKET,
            curve_swap: Address::new([0x03; 20]),
            fee_counter: Address::new([0x04; 20]),
        });
        chain
    }

    pub(crate) fn mint(&mut self, to: Address, amount: U256) {
        self.state.token.mint(to, amount);
    }

    /// `owner` approves the strategy contract.
    pub(crate) fn approve_strategy(&mut self, owner: Address, amount: U256) {
        self.state.token.approve(owner, STRATEGY, amount);
    }

    pub(crate) fn approve_market_from_strategy(&mut self, amount: U256) {
        self.state.token.approve(STRATEGY, MARKET, amount);
    }

    pub(crate) fn balance_of(&self, account: Address) -> U256 {
        self.state.token.balance_of(account)
    }

    pub(crate) fn allowance_of(&self, owner: Address, spender: Address) -> U256 {
        self.state.token.allowance(owner, spender)
    }

    pub(crate) fn set_quote_decimals(&mut self, decimals: u8) {
        self.state.token.decimals = decimals;
    }

    pub(crate) fn warp_past_expiry(&mut self) {
        self.now = GENESIS + MONTH_SEC;
    }

    /// Oracle report used when the board settles.
    pub(crate) fn set_spot_at_expiry(&mut self, price: U256) {
        self.spot_at_expiry = Some(price);
    }

    /// Makes every open of `option_type` fail with `error` until cleared.
    pub(crate) fn reject_leg(&mut self, option_type: OptionType, error: StrategyError) {
        self.rejected_leg = Some((option_type, error));
    }

    /// The next open is assigned `position_id` instead of a fresh one.
    pub(crate) fn force_next_position_id(&mut self, position_id: U256) {
        self.forced_position_id = Some(position_id);
    }

    pub(crate) fn set_price_impact(&mut self, per_unit: U256) {
        self.state.price_impact = per_unit;
    }

    /// The market pays `amount` less than owed on claims.
    pub(crate) fn skim_claims(&mut self, amount: U256) {
        self.claim_skim = amount;
    }

    pub(crate) fn market_open_interest(&self) -> usize {
        self.state.market_positions.len()
    }

    pub(crate) fn rollbacks(&self) -> usize {
        self.rollbacks
    }

    /// How many times the market ran its expiry settlement.
    pub(crate) fn board_settlements(&self) -> usize {
        self.board_settlements
    }

    pub(crate) fn events(&self) -> &[StrategyEvent] {
        &self.state.events
    }

    pub(crate) fn trades(&self) -> Vec<Trade> {
        self.state
            .events
            .iter()
            .filter_map(|event| match event {
                StrategyEvent::Trade(trade) => Some(trade.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn settled_events(&self) -> Vec<PositionSettled> {
        self.state
            .events
            .iter()
            .filter_map(|event| match event {
                StrategyEvent::PositionSettled(settled) => Some(settled.clone()),
                _ => None,
            })
            .collect()
    }

    /// Premium the market would charge right now.
    pub(crate) fn quoted(&self, strike_id: U256, option_type: OptionType, amount: U256) -> U256 {
        self.premium(strike_id, option_type, amount)
            .unwrap_or(U256::ZERO)
    }

    fn live_strike(&self, strike_id: U256) -> Result<&SimStrike, StrategyError> {
        let strike = self
            .state
            .strikes
            .get(&strike_id)
            .ok_or(StrategyError::UnknownId(UnknownId { id: strike_id }))?;
        let board = &self.state.boards[&strike.board_id];
        if self.now >= board.expiry || board.price_at_expiry.is_some() {
            return Err(StrategyError::StrikeNotLive(StrikeNotLive { strike_id }));
        }
        Ok(strike)
    }

    fn premium(
        &self,
        strike_id: U256,
        option_type: OptionType,
        amount: U256,
    ) -> Result<U256, StrategyError> {
        let strike = self.live_strike(strike_id)?;
        let per_unit = if option_type.is_call() {
            strike.call_premium
        } else {
            strike.put_premium
        };
        Ok(mul_unit(per_unit + self.state.impact_accrued, amount).unwrap_or(U256::MAX))
    }

    fn transfer_failed() -> StrategyError {
        StrategyError::TransferFailed(TransferFailed { token: QUOTE })
    }
}

impl Environment for SimChain {
    fn this(&self) -> Address {
        STRATEGY
    }

    fn now(&self) -> u64 {
        self.now
    }
}

impl AdapterConfig for SimChain {
    fn owner(&self) -> Address {
        OWNER
    }

    fn adapter(&self) -> Option<AdapterAddresses> {
        self.state.adapter
    }

    fn store_adapter(&mut self, addresses: AdapterAddresses) {
        self.state.adapter = Some(addresses);
    }
}

impl EventSink for SimChain {
    fn emit(&mut self, event: StrategyEvent) {
        self.state.events.push(event);
    }
}

impl Transactional for SimChain {
    type Checkpoint = ChainState;

    fn checkpoint(&mut self) -> ChainState {
        self.state.clone()
    }

    fn rollback(&mut self, checkpoint: ChainState) {
        self.state = checkpoint;
        self.rollbacks += 1;
    }
}

impl QuoteToken for SimChain {
    fn decimals(&self) -> Result<u8, StrategyError> {
        Ok(self.state.token.decimals)
    }

    fn balance_of(&self, account: Address) -> Result<U256, StrategyError> {
        Ok(self.state.token.balance_of(account))
    }

    fn allowance(&self, owner: Address, spender: Address) -> Result<U256, StrategyError> {
        Ok(self.state.token.allowance(owner, spender))
    }

    fn transfer_from(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), StrategyError> {
        if self.state.token.transfer_from(STRATEGY, from, to, amount) {
            Ok(())
        } else {
            Err(Self::transfer_failed())
        }
    }

    fn transfer(&mut self, to: Address, amount: U256) -> Result<(), StrategyError> {
        if self.state.token.transfer(STRATEGY, to, amount) {
            Ok(())
        } else {
            Err(Self::transfer_failed())
        }
    }

    fn approve(&mut self, spender: Address, amount: U256) -> Result<(), StrategyError> {
        self.state.token.approve(STRATEGY, spender, amount);
        Ok(())
    }
}

impl OptionMarket for SimChain {
    fn market_address(&self) -> Result<Address, StrategyError> {
        self.state
            .adapter
            .map(|adapter| adapter.option_market)
            .ok_or(StrategyError::NotInitialized(NotInitialized {}))
    }

    fn quote_asset(&self) -> Result<Address, StrategyError> {
        Ok(QUOTE)
    }

    fn quote_premium(
        &self,
        strike_id: U256,
        option_type: OptionType,
        amount: U256,
    ) -> Result<U256, StrategyError> {
        self.premium(strike_id, option_type, amount)
    }

    fn open_position(&mut self, request: &OpenPosition) -> Result<TradeResult, StrategyError> {
        if let Some((rejected, error)) = &self.rejected_leg {
            if *rejected == request.option_type {
                return Err(error.clone());
            }
        }

        let cost = self.premium(request.strike_id, request.option_type, request.amount)?;
        if cost > request.max_total_cost {
            return Err(StrategyError::CostExceeded(CostExceeded {
                cost,
                max_cost: request.max_total_cost,
            }));
        }

        // Premiums are priced in 18 decimals and taken in native units, rounded up.
        let native = denormalize_amount_up(cost, self.state.token.decimals)?;
        let allowance = self.state.token.allowance(STRATEGY, MARKET);
        if !self.state.token.transfer_from(MARKET, STRATEGY, MARKET, native) {
            return Err(StrategyError::InsufficientAllowance(InsufficientAllowance {
                owner: STRATEGY,
                allowance,
                required: native,
            }));
        }

        let position_id = self.forced_position_id.take().unwrap_or_else(|| {
            let id = self.state.next_position_id;
            self.state.next_position_id = id + U256::from(POSITION_ID_STRIDE);
            id
        });
        self.state.market_positions.insert(
            position_id,
            MarketPosition {
                strike_id: request.strike_id,
                option_type: request.option_type,
                amount: request.amount,
            },
        );
        self.state.impact_accrued += self.state.price_impact;

        Ok(TradeResult {
            position_id,
            total_cost: cost,
        })
    }

    fn live_boards(&self) -> Result<Vec<U256>, StrategyError> {
        Ok(self
            .state
            .boards
            .iter()
            .filter(|(_, board)| self.now < board.expiry)
            .map(|(id, _)| *id)
            .collect())
    }

    fn board_strikes(&self, board_id: U256) -> Result<Vec<U256>, StrategyError> {
        self.state
            .boards
            .get(&board_id)
            .map(|board| board.strike_ids.clone())
            .ok_or(StrategyError::UnknownId(UnknownId { id: board_id }))
    }

    fn strike(&self, strike_id: U256) -> Result<Strike, StrategyError> {
        let strike = self
            .state
            .strikes
            .get(&strike_id)
            .ok_or(StrategyError::UnknownId(UnknownId { id: strike_id }))?;
        let board = &self.state.boards[&strike.board_id];
        Ok(Strike {
            id: strike_id,
            board_id: strike.board_id,
            strike_price: strike.strike_price,
            expiry: board.expiry,
            live: board.price_at_expiry.is_none(),
        })
    }

    fn board(&self, board_id: U256) -> Result<Board, StrategyError> {
        self.state
            .boards
            .get(&board_id)
            .map(|board| Board {
                expiry: board.expiry,
                settled: board.price_at_expiry.is_some(),
            })
            .ok_or(StrategyError::UnknownId(UnknownId { id: board_id }))
    }

    fn settle_board(&mut self, board_id: U256) -> Result<(), StrategyError> {
        let spot = self.spot_at_expiry;
        let board = self
            .state
            .boards
            .get_mut(&board_id)
            .ok_or(StrategyError::UnknownId(UnknownId { id: board_id }))?;
        if board.price_at_expiry.is_some() {
            return Ok(());
        }
        board.price_at_expiry =
            Some(spot.ok_or(StrategyError::OracleUnavailable(OracleUnavailable { board_id }))?);
        self.board_settlements += 1;
        Ok(())
    }

    fn settlement_payout(&self, position_id: U256) -> Result<U256, StrategyError> {
        let position = self
            .state
            .market_positions
            .get(&position_id)
            .ok_or(StrategyError::UnknownId(UnknownId { id: position_id }))?;
        let strike = &self.state.strikes[&position.strike_id];
        let price = self.state.boards[&strike.board_id]
            .price_at_expiry
            .ok_or(StrategyError::NotSettled(NotSettled { position_id }))?;

        let intrinsic = match position.option_type {
            OptionType::LongCall => price.saturating_sub(strike.strike_price),
            OptionType::LongPut => strike.strike_price.saturating_sub(price),
            OptionType::ShortCall | OptionType::ShortPut => U256::ZERO,
        };
        Ok(mul_unit(intrinsic, position.amount).unwrap_or(U256::MAX))
    }

    fn claim_settlement(&mut self, position_ids: &[U256]) -> Result<U256, StrategyError> {
        let mut owed = U256::ZERO;
        for &position_id in position_ids {
            if self.state.market_claimed.contains(&position_id) {
                return Err(StrategyError::AlreadyClaimed(AlreadyClaimed { position_id }));
            }
            owed += self.settlement_payout(position_id)?;
            self.state.market_claimed.insert(position_id);
        }

        let paid = owed.saturating_sub(self.claim_skim);
        let native = denormalize_amount(paid, self.state.token.decimals)?;
        if !self.state.token.transfer(MARKET, STRATEGY, native) {
            return Err(Self::transfer_failed());
        }
        Ok(paid)
    }
}

impl PositionStore for SimChain {
    fn position_count(&self, owner: Address) -> usize {
        self.state.ledger.get(&owner).map_or(0, Vec::len)
    }

    fn load_position(&self, owner: Address, index: usize) -> Option<Position> {
        self.state.ledger.get(&owner)?.get(index).copied()
    }

    fn locate_position(&self, position_id: U256) -> Option<(Address, usize)> {
        self.state.position_index.get(&position_id).copied()
    }

    fn board_position_ids(&self, board_id: U256) -> Vec<U256> {
        self.state
            .board_index
            .get(&board_id)
            .cloned()
            .unwrap_or_default()
    }

    fn append_position(&mut self, position: &Position) {
        let positions = self.state.ledger.entry(position.owner).or_default();
        positions.push(*position);
        self.state
            .position_index
            .insert(position.position_id, (position.owner, positions.len() - 1));
        self.state
            .board_index
            .entry(position.board_id)
            .or_default()
            .push(position.position_id);
    }

    fn store_settlement(&mut self, owner: Address, index: usize, payout: U256) {
        if let Some(position) = self
            .state
            .ledger
            .get_mut(&owner)
            .and_then(|positions| positions.get_mut(index))
        {
            position.status = PositionStatus::Settled;
            position.payout = payout;
        }
    }

    fn store_claimed(&mut self, owner: Address, index: usize) {
        if let Some(position) = self
            .state
            .ledger
            .get_mut(&owner)
            .and_then(|positions| positions.get_mut(index))
        {
            position.claimed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_mints_increasing_ids() {
        let mut chain = SimChain::seeded();
        chain.mint(STRATEGY, U256::from(10_000) * UNIT);
        chain.approve_market_from_strategy(U256::MAX);
        let request = OpenPosition {
            strike_id: STRIKE_2500,
            option_type: OptionType::LongPut,
            amount: UNIT,
            max_total_cost: U256::MAX,
        };

        let first = chain.open_position(&request).unwrap();
        let second = chain.open_position(&request).unwrap();

        assert!(first.position_id > U256::ZERO);
        assert!(second.position_id > first.position_id);
        assert_eq!(first.total_cost, U256::from(110) * UNIT);
    }

    #[test]
    fn test_market_without_allowance_reports_insufficient_allowance() {
        let mut chain = SimChain::seeded();
        chain.mint(STRATEGY, U256::from(10_000) * UNIT);

        let result = chain.open_position(&OpenPosition {
            strike_id: STRIKE_1500,
            option_type: OptionType::LongCall,
            amount: UNIT,
            max_total_cost: U256::MAX,
        });

        assert!(matches!(result, Err(StrategyError::InsufficientAllowance(_))));
    }

    #[test]
    fn test_board_queries() {
        let mut chain = SimChain::seeded();

        assert_eq!(chain.live_boards().unwrap(), vec![BOARD_ID]);
        assert_eq!(
            chain.board_strikes(BOARD_ID).unwrap(),
            vec![STRIKE_1500, STRIKE_2000, STRIKE_2500]
        );
        assert_eq!(
            chain.strike(STRIKE_1500).unwrap().strike_price,
            U256::from(1_500) * UNIT
        );
        assert!(matches!(
            chain.board_strikes(U256::from(9)),
            Err(StrategyError::UnknownId(_))
        ));

        chain.warp_past_expiry();
        assert!(chain.live_boards().unwrap().is_empty());
    }

    #[test]
    fn test_settle_board_twice_is_a_no_op() {
        let mut chain = SimChain::seeded();
        chain.warp_past_expiry();
        chain.set_spot_at_expiry(U256::from(2_000) * UNIT);

        chain.settle_board(BOARD_ID).unwrap();
        chain.set_spot_at_expiry(U256::from(9_999) * UNIT);
        chain.settle_board(BOARD_ID).unwrap();

        assert!(chain.board(BOARD_ID).unwrap().settled);
        assert!(!chain.strike(STRIKE_1500).unwrap().live);
    }
}
