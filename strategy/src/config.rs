//! One-time wiring of the collaborator contracts.

use alloy_primitives::Address;

use crate::error::{
    AlreadyInitialized, InvalidAddress, NotInitialized, StrategyError, Unauthorized,
};
use crate::events::{AdapterInitialized, EventSink, StrategyEvent};

/// Collaborator addresses set once at deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterAddresses {
    pub registry: Address,
    pub option_market: Address,
    pub curve_swap: Address,
    pub fee_counter: Address,
}

impl AdapterAddresses {
    fn any_zero(&self) -> bool {
        [
            self.registry,
            self.option_market,
            self.curve_swap,
            self.fee_counter,
        ]
        .contains(&Address::ZERO)
    }
}

/// Storage for the wiring.
pub trait AdapterConfig {
    /// Account allowed to wire the adapter; zero until the contract is constructed.
    fn owner(&self) -> Address;

    fn adapter(&self) -> Option<AdapterAddresses>;

    fn store_adapter(&mut self, addresses: AdapterAddresses);
}

/// Returns the wiring or `NotInitialized`.
///
/// # Errors
/// `NotInitialized` before `init_adapter` has run.
pub fn require_adapter<H: AdapterConfig>(host: &H) -> Result<AdapterAddresses, StrategyError> {
    host.adapter()
        .ok_or(StrategyError::NotInitialized(NotInitialized {}))
}

/// Stores the collaborator addresses. Callable exactly once, by the owner.
///
/// # Errors
/// - `Unauthorized` when `caller` is not the owner
/// - `AlreadyInitialized` on a second call
/// - `InvalidAddress` if any address is zero
pub fn init_adapter<H>(
    host: &mut H,
    caller: Address,
    addresses: AdapterAddresses,
) -> Result<(), StrategyError>
where
    H: AdapterConfig + EventSink,
{
    let owner = host.owner();
    if owner == Address::ZERO || caller != owner {
        return Err(StrategyError::Unauthorized(Unauthorized { caller }));
    }
    if host.adapter().is_some() {
        return Err(StrategyError::AlreadyInitialized(AlreadyInitialized {}));
    }
    if addresses.any_zero() {
        return Err(StrategyError::InvalidAddress(InvalidAddress {}));
    }

    host.store_adapter(addresses);
    host.emit(StrategyEvent::AdapterInitialized(AdapterInitialized {
        registry: addresses.registry,
        option_market: addresses.option_market,
        curve_swap: addresses.curve_swap,
        fee_counter: addresses.fee_counter,
    }));
    Ok(())
}
