//! The contract's side of every seam: storage-backed ledger and wiring, calls into the
//! option market and the quote asset, and the EVM log.

use alloc::vec;
use alloc::vec::Vec;
use alloy_primitives::{Address, U256, U8};
use stylus_sdk::call::{Call, Error as CallError};
use stylus_sdk::prelude::*;
use stylus_sdk::stylus_core::log;

use crate::collateral::QuoteToken;
use crate::config::{require_adapter, AdapterAddresses, AdapterConfig};
use crate::error::{MarketCallFailed, StrategyError, TransferFailed};
use crate::events::{EventSink, StrategyEvent};
use crate::host::Environment;
use crate::journal::Transactional;
use crate::ledger::{Position, PositionStatus, PositionStore};
use crate::market::{Board, OpenPosition, OptionMarket, OptionType, Strike, TradeResult};
use crate::StraddleStrategy;

sol_interface! {
    /// Façade of the option market the strategy trades against.
    interface IOptionMarket {
        function quoteAsset() external view returns (address);
        function quotePremium(uint256 strike_id, uint8 option_type, uint256 amount) external view returns (uint256);
        function openPosition(uint256 strike_id, uint8 option_type, uint256 amount, uint256 max_total_cost) external returns (uint256, uint256);
        function getLiveBoards() external view returns (uint256[] memory);
        function getBoardStrikes(uint256 board_id) external view returns (uint256[] memory);
        function getStrike(uint256 strike_id) external view returns (uint256, uint256, uint256, bool);
        function getBoard(uint256 board_id) external view returns (uint256, bool);
        function settleExpiredBoard(uint256 board_id) external;
        function getSettlementPayout(uint256 position_id) external view returns (uint256);
        function claimSettlement(uint256[] calldata position_ids) external returns (uint256);
    }

    interface IERC20 {
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

fn market_error(market: Address, err: CallError) -> StrategyError {
    match err {
        CallError::Revert(data) => StrategyError::from_market_revert(market, &data),
        _ => StrategyError::MarketCallFailed(MarketCallFailed { market }),
    }
}

const fn transfer_failed(token: Address) -> StrategyError {
    StrategyError::TransferFailed(TransferFailed { token })
}

fn checked_transfer(token: Address, outcome: Result<bool, CallError>) -> Result<(), StrategyError> {
    match outcome {
        Ok(true) => Ok(()),
        _ => Err(transfer_failed(token)),
    }
}

impl Environment for StraddleStrategy {
    fn this(&self) -> Address {
        self.vm().contract_address()
    }

    fn now(&self) -> u64 {
        self.vm().block_timestamp()
    }
}

impl AdapterConfig for StraddleStrategy {
    fn owner(&self) -> Address {
        self.owner.get()
    }

    fn adapter(&self) -> Option<AdapterAddresses> {
        self.initialized.get().then(|| AdapterAddresses {
            registry: self.registry.get(),
            option_market: self.option_market.get(),
            curve_swap: self.curve_swap.get(),
            fee_counter: self.fee_counter.get(),
        })
    }

    fn store_adapter(&mut self, addresses: AdapterAddresses) {
        self.registry.set(addresses.registry);
        self.option_market.set(addresses.option_market);
        self.curve_swap.set(addresses.curve_swap);
        self.fee_counter.set(addresses.fee_counter);
        self.initialized.set(true);
    }
}

impl OptionMarket for StraddleStrategy {
    fn market_address(&self) -> Result<Address, StrategyError> {
        require_adapter(self).map(|adapter| adapter.option_market)
    }

    fn quote_asset(&self) -> Result<Address, StrategyError> {
        let market = self.market_address()?;
        IOptionMarket::new(market)
            .quote_asset(&*self)
            .map_err(|e| market_error(market, e))
    }

    fn quote_premium(
        &self,
        strike_id: U256,
        option_type: OptionType,
        amount: U256,
    ) -> Result<U256, StrategyError> {
        let market = self.market_address()?;
        IOptionMarket::new(market)
            .quote_premium(&*self, strike_id, option_type.to_u8(), amount)
            .map_err(|e| market_error(market, e))
    }

    fn open_position(&mut self, request: &OpenPosition) -> Result<TradeResult, StrategyError> {
        let market = self.market_address()?;
        let (position_id, total_cost) = IOptionMarket::new(market)
            .open_position(
                Call::new_in(self),
                request.strike_id,
                request.option_type.to_u8(),
                request.amount,
                request.max_total_cost,
            )
            .map_err(|e| market_error(market, e))?;

        Ok(TradeResult {
            position_id,
            total_cost,
        })
    }

    fn live_boards(&self) -> Result<Vec<U256>, StrategyError> {
        let market = self.market_address()?;
        IOptionMarket::new(market)
            .get_live_boards(&*self)
            .map_err(|e| market_error(market, e))
    }

    fn board_strikes(&self, board_id: U256) -> Result<Vec<U256>, StrategyError> {
        let market = self.market_address()?;
        IOptionMarket::new(market)
            .get_board_strikes(&*self, board_id)
            .map_err(|e| market_error(market, e))
    }

    fn strike(&self, strike_id: U256) -> Result<Strike, StrategyError> {
        let market = self.market_address()?;
        let (strike_price, board_id, expiry, live) = IOptionMarket::new(market)
            .get_strike(&*self, strike_id)
            .map_err(|e| market_error(market, e))?;

        Ok(Strike {
            id: strike_id,
            board_id,
            strike_price,
            expiry: expiry.saturating_to(),
            live,
        })
    }

    fn board(&self, board_id: U256) -> Result<Board, StrategyError> {
        let market = self.market_address()?;
        let (expiry, settled) = IOptionMarket::new(market)
            .get_board(&*self, board_id)
            .map_err(|e| market_error(market, e))?;

        Ok(Board {
            expiry: expiry.saturating_to(),
            settled,
        })
    }

    fn settle_board(&mut self, board_id: U256) -> Result<(), StrategyError> {
        let market = self.market_address()?;
        IOptionMarket::new(market)
            .settle_expired_board(Call::new_in(self), board_id)
            .map_err(|e| market_error(market, e))
    }

    fn settlement_payout(&self, position_id: U256) -> Result<U256, StrategyError> {
        let market = self.market_address()?;
        IOptionMarket::new(market)
            .get_settlement_payout(&*self, position_id)
            .map_err(|e| market_error(market, e))
    }

    fn claim_settlement(&mut self, position_ids: &[U256]) -> Result<U256, StrategyError> {
        let market = self.market_address()?;
        IOptionMarket::new(market)
            .claim_settlement(Call::new_in(self), position_ids.to_vec())
            .map_err(|e| market_error(market, e))
    }
}

impl QuoteToken for StraddleStrategy {
    fn decimals(&self) -> Result<u8, StrategyError> {
        let token = self.quote_asset()?;
        IERC20::new(token)
            .decimals(&*self)
            .map_err(|_| transfer_failed(token))
    }

    fn balance_of(&self, account: Address) -> Result<U256, StrategyError> {
        let token = self.quote_asset()?;
        IERC20::new(token)
            .balance_of(&*self, account)
            .map_err(|_| transfer_failed(token))
    }

    fn allowance(&self, owner: Address, spender: Address) -> Result<U256, StrategyError> {
        let token = self.quote_asset()?;
        IERC20::new(token)
            .allowance(&*self, owner, spender)
            .map_err(|_| transfer_failed(token))
    }

    fn transfer_from(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), StrategyError> {
        let token = self.quote_asset()?;
        let outcome = IERC20::new(token).transfer_from(Call::new_in(self), from, to, amount);
        checked_transfer(token, outcome)
    }

    fn transfer(&mut self, to: Address, amount: U256) -> Result<(), StrategyError> {
        let token = self.quote_asset()?;
        let outcome = IERC20::new(token).transfer(Call::new_in(self), to, amount);
        checked_transfer(token, outcome)
    }

    fn approve(&mut self, spender: Address, amount: U256) -> Result<(), StrategyError> {
        let token = self.quote_asset()?;
        let outcome = IERC20::new(token).approve(Call::new_in(self), spender, amount);
        checked_transfer(token, outcome)
    }
}

impl PositionStore for StraddleStrategy {
    fn position_count(&self, owner: Address) -> usize {
        self.positions.getter(owner).len()
    }

    fn load_position(&self, owner: Address, index: usize) -> Option<Position> {
        let list = self.positions.getter(owner);
        let stored = list.getter(index)?;

        Some(Position {
            position_id: stored.position_id.get(),
            owner: stored.owner.get(),
            strike_id: stored.strike_id.get(),
            board_id: stored.board_id.get(),
            option_type: OptionType::from_u8(u8::try_from(stored.option_type.get()).ok()?).ok()?,
            amount: stored.amount.get(),
            status: PositionStatus::from_u8(u8::try_from(stored.status.get()).ok()?)?,
            payout: stored.payout.get(),
            claimed: stored.claimed.get(),
        })
    }

    fn locate_position(&self, position_id: U256) -> Option<(Address, usize)> {
        // Owners are callers, so the zero address marks an unrecorded id.
        let owner = self.position_owner.get(position_id);
        if owner == Address::ZERO {
            return None;
        }
        let index = usize::try_from(self.position_index.get(position_id)).ok()?;
        Some((owner, index))
    }

    fn board_position_ids(&self, board_id: U256) -> Vec<U256> {
        let ids = self.board_positions.getter(board_id);
        (0..ids.len()).filter_map(|i| ids.get(i)).collect()
    }

    fn append_position(&mut self, position: &Position) {
        let index = {
            let mut list = self.positions.setter(position.owner);
            let index = list.len();
            let mut slot = list.grow();
            slot.position_id.set(position.position_id);
            slot.owner.set(position.owner);
            slot.strike_id.set(position.strike_id);
            slot.board_id.set(position.board_id);
            slot.option_type.set(U8::from(position.option_type.to_u8()));
            slot.amount.set(position.amount);
            slot.status.set(U8::from(position.status.to_u8()));
            slot.payout.set(position.payout);
            slot.claimed.set(position.claimed);
            index
        };

        self.position_owner
            .insert(position.position_id, position.owner);
        self.position_index
            .insert(position.position_id, U256::from(index));
        self.board_positions
            .setter(position.board_id)
            .push(position.position_id);
    }

    fn store_settlement(&mut self, owner: Address, index: usize, payout: U256) {
        let mut list = self.positions.setter(owner);
        if let Some(mut slot) = list.setter(index) {
            slot.status.set(U8::from(PositionStatus::Settled.to_u8()));
            slot.payout.set(payout);
        }
    }

    fn store_claimed(&mut self, owner: Address, index: usize) {
        let mut list = self.positions.setter(owner);
        if let Some(mut slot) = list.setter(index) {
            slot.claimed.set(true);
        }
    }
}

impl EventSink for StraddleStrategy {
    fn emit(&mut self, event: StrategyEvent) {
        let vm = self.vm();
        match event {
            StrategyEvent::Trade(event) => log(vm, event),
            StrategyEvent::PositionSettled(event) => log(vm, event),
            StrategyEvent::SettlementClaimed(event) => log(vm, event),
            StrategyEvent::AdapterInitialized(event) => log(vm, event),
        }
    }
}

/// A failing entry point returns its error and the VM reverts every write made during
/// the call, external calls included.
impl Transactional for StraddleStrategy {
    type Checkpoint = ();

    fn checkpoint(&mut self) -> Self::Checkpoint {}

    fn rollback(&mut self, (): Self::Checkpoint) {}
}
