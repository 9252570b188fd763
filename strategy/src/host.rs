//! The seams every strategy operation is written against.

use alloy_primitives::Address;

use crate::collateral::QuoteToken;
use crate::config::AdapterConfig;
use crate::events::EventSink;
use crate::journal::Transactional;
use crate::ledger::PositionStore;
use crate::market::OptionMarket;

/// Execution context of the current invocation.
pub trait Environment {
    /// Address of the strategy contract itself.
    fn this(&self) -> Address;

    /// Block timestamp in seconds.
    fn now(&self) -> u64;
}

/// Everything a strategy operation may touch, bundled.
///
/// The on-chain contract implements it against the Stylus VM; tests implement it
/// against an in-memory chain.
pub trait StrategyHost:
    Environment + AdapterConfig + OptionMarket + QuoteToken + PositionStore + EventSink + Transactional
{
}

impl<T> StrategyHost for T where
    T: Environment
        + AdapterConfig
        + OptionMarket
        + QuoteToken
        + PositionStore
        + EventSink
        + Transactional
{
}
