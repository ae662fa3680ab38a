//! LogTransport - logs batch summaries via tracing instead of sending them

use contracts::{Batch, BatchTransport, ContractError};
use tracing::{debug, info, instrument};

/// Transport for dry runs: every batch "succeeds" and is only logged
pub struct LogTransport {
    name: String,
}

impl LogTransport {
    /// Create a new LogTransport with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_batch_summary(&self, batch: &Batch) {
        info!(
            transport = %self.name,
            events = batch.event_count(),
            categories = batch.category_count(),
            "Batch flushed"
        );
        for (category, payloads) in batch.iter() {
            debug!(transport = %self.name, %category, events = payloads.len(), "Category");
        }
    }
}

impl BatchTransport for LogTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_transport_send",
        skip(self, batch),
        fields(transport = %self.name, events = batch.event_count())
    )]
    async fn send(&mut self, batch: &Batch) -> Result<(), ContractError> {
        // Encode anyway so a dry run surfaces serialization problems.
        let body = batch.to_json()?;
        debug!(transport = %self.name, bytes = body.len(), "Encoded batch");
        self.log_batch_summary(batch);
        Ok(())
    }
}
