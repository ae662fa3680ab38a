//! BatchTransport trait - Dispatcher output interface
//!
//! Defines the abstract interface for the outbound write.

use crate::{Batch, ContractError};

/// Outbound write of one flushed batch
///
/// Implementations perform exactly one request per call and never retry;
/// the dispatcher discards the batch whatever the outcome.
#[trait_variant::make(BatchTransport: Send)]
pub trait LocalBatchTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Send a non-empty batch to the collector
    ///
    /// # Errors
    /// Serialization, connection or non-success status errors
    async fn send(&mut self, batch: &Batch) -> Result<(), ContractError>;
}
