#![cfg_attr(not(any(test, feature = "export-abi")), no_main)]
#![cfg_attr(not(any(test, feature = "export-abi")), no_std)]
extern crate alloc;

pub mod collateral;
pub mod config;
pub mod error;
pub mod events;
pub mod fixed;
pub mod host;
pub mod journal;
pub mod ledger;
pub mod market;
mod onchain;
pub mod settlement;
pub mod straddle;

#[cfg(test)]
pub(crate) mod sim;

use alloc::vec;
use alloc::vec::Vec;
use alloy_primitives::{Address, U256};
use stylus_sdk::prelude::*;

pub use error::{StrategyError, StrategyResult};
pub use market::OptionType;
pub use onchain::{IOptionMarket, IERC20};

use config::AdapterAddresses;
use error::{InvalidAddress, UnknownId};
use ledger::{Position, PositionStore};
use market::OptionMarket;

/// ABI view of a ledger entry:
/// `(positionId, owner, strikeId, boardId, optionType, amount, status, payout, claimed)`.
pub type PositionView = (U256, Address, U256, U256, u8, U256, u8, U256, bool);

fn position_view(position: &Position) -> PositionView {
    (
        position.position_id,
        position.owner,
        position.strike_id,
        position.board_id,
        position.option_type.to_u8(),
        position.amount,
        position.status.to_u8(),
        position.payout,
        position.claimed,
    )
}

sol_storage! {
    /// One ledger entry. `option_type` and `status` hold their u8 encodings.
    pub struct StoredPosition {
        uint256 position_id;
        address owner;
        uint256 strike_id;
        uint256 board_id;
        uint8 option_type;
        uint256 amount;
        uint8 status;
        uint256 payout;
        bool claimed;
    }

    #[entrypoint]
    pub struct StraddleStrategy {
        address owner;
        bool initialized;
        address registry;
        address option_market;
        address curve_swap;
        address fee_counter;

        /// Per-owner ledger in creation order.
        mapping(address => StoredPosition[]) positions;
        mapping(uint256 => address) position_owner;
        mapping(uint256 => uint256) position_index;
        mapping(uint256 => uint256[]) board_positions;
    }
}

#[public]
impl StraddleStrategy {
    /// Records the account allowed to wire the adapter.
    ///
    /// # Errors
    /// `InvalidAddress` for the zero address.
    #[constructor]
    pub fn constructor(&mut self, owner: Address) -> Result<(), StrategyError> {
        if owner == Address::ZERO {
            return Err(StrategyError::InvalidAddress(InvalidAddress {}));
        }
        self.owner.set(owner);
        Ok(())
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner.get()
    }

    /// Wires the collaborator contracts. Callable once, by the owner.
    ///
    /// # Errors
    /// - `Unauthorized` unless called by the owner
    /// - `AlreadyInitialized` on a second call
    /// - `InvalidAddress` if any address is zero
    pub fn init_adapter(
        &mut self,
        registry: Address,
        option_market: Address,
        curve_swap: Address,
        fee_counter: Address,
    ) -> Result<(), StrategyError> {
        let caller = self.vm().msg_sender();
        config::init_adapter(
            self,
            caller,
            AdapterAddresses {
                registry,
                option_market,
                curve_swap,
                fee_counter,
            },
        )
    }

    /// `(registry, optionMarket, curveSwap, feeCounter)`.
    ///
    /// # Errors
    /// `NotInitialized` before wiring.
    pub fn adapter_addresses(&self) -> Result<(Address, Address, Address, Address), StrategyError> {
        let adapter = config::require_adapter(self)?;
        Ok((
            adapter.registry,
            adapter.option_market,
            adapter.curve_swap,
            adapter.fee_counter,
        ))
    }

    /// Buys a long call and a long put of `amount` on `strike_id` at the market's price.
    ///
    /// Returns `(callPositionId, putPositionId)`.
    ///
    /// # Errors
    /// See [`straddle::buy_straddle`].
    pub fn buy_straddle(&mut self, strike_id: U256, amount: U256) -> Result<(U256, U256), StrategyError> {
        let caller = self.vm().msg_sender();
        straddle::buy_straddle(self, caller, strike_id, amount, U256::MAX).map(|pair| pair.ids())
    }

    /// [`Self::buy_straddle`] with a bound on the combined premium of both legs.
    ///
    /// # Errors
    /// `CostExceeded` when the combined premium is above `max_total_cost`.
    pub fn buy_straddle_with_limit(
        &mut self,
        strike_id: U256,
        amount: U256,
        max_total_cost: U256,
    ) -> Result<(U256, U256), StrategyError> {
        let caller = self.vm().msg_sender();
        straddle::buy_straddle(self, caller, strike_id, amount, max_total_cost).map(|pair| pair.ids())
    }

    /// Settles an expired board and returns how many ledger positions moved to Settled.
    ///
    /// # Errors
    /// See [`settlement::settle_expired`].
    pub fn settle_expired(&mut self, board_id: U256) -> Result<U256, StrategyError> {
        settlement::settle_expired(self, board_id).map(U256::from)
    }

    /// Collects the caller's settled payouts.
    ///
    /// # Errors
    /// See [`settlement::claim_payout`].
    pub fn claim_payout(&mut self, position_ids: Vec<U256>) -> Result<U256, StrategyError> {
        let caller = self.vm().msg_sender();
        settlement::claim_payout(self, caller, &position_ids)
    }

    #[must_use]
    pub fn get_positions(&self, owner: Address) -> Vec<PositionView> {
        straddle::get_positions(self, owner)
            .iter()
            .map(position_view)
            .collect()
    }

    #[must_use]
    pub fn get_position_ids(&self, owner: Address) -> Vec<U256> {
        straddle::get_positions(self, owner)
            .iter()
            .map(|position| position.position_id)
            .collect()
    }

    /// # Errors
    /// `UnknownId` when `index` is past the end of the owner's ledger.
    pub fn get_position(&self, owner: Address, index: U256) -> Result<PositionView, StrategyError> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.load_position(owner, index))
            .map(|position| position_view(&position))
            .ok_or(StrategyError::UnknownId(UnknownId { id: index }))
    }

    #[must_use]
    pub fn position_count(&self, owner: Address) -> U256 {
        U256::from(PositionStore::position_count(self, owner))
    }

    /// # Errors
    /// `NotInitialized`, or whatever the market reverts with.
    pub fn live_boards(&self) -> Result<Vec<U256>, StrategyError> {
        OptionMarket::live_boards(self)
    }

    /// # Errors
    /// `NotInitialized`, `UnknownId`.
    pub fn board_strikes(&self, board_id: U256) -> Result<Vec<U256>, StrategyError> {
        OptionMarket::board_strikes(self, board_id)
    }

    /// `(boardId, strikePrice, expiry, live)`.
    ///
    /// # Errors
    /// `NotInitialized`, `UnknownId`.
    pub fn get_strike(&self, strike_id: U256) -> Result<(U256, U256, U256, bool), StrategyError> {
        let strike = self.strike(strike_id)?;
        Ok((
            strike.board_id,
            strike.strike_price,
            U256::from(strike.expiry),
            strike.live,
        ))
    }
}
