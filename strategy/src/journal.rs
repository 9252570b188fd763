//! All-or-nothing execution of a multi-step operation.
//!
//! On chain the VM already discards every write of a reverted call, so the contract's
//! checkpoint is free. Off chain, a host must snapshot its state and restore it when
//! the operation fails, so a failed second leg also undoes the first.

use crate::error::StrategyError;

pub trait Transactional {
    type Checkpoint;

    /// Marks the state to return to if the current operation fails.
    fn checkpoint(&mut self) -> Self::Checkpoint;

    /// Discards every effect since `checkpoint`.
    fn rollback(&mut self, checkpoint: Self::Checkpoint);
}

/// Runs `op` as one unit: either every effect lands or none does.
///
/// # Errors
/// Returns whatever `op` failed with, after rolling back.
pub fn atomically<H, T, F>(host: &mut H, op: F) -> Result<T, StrategyError>
where
    H: Transactional,
    F: FnOnce(&mut H) -> Result<T, StrategyError>,
{
    let checkpoint = host.checkpoint();
    let outcome = op(host);
    if outcome.is_err() {
        host.rollback(checkpoint);
    }
    outcome
}
