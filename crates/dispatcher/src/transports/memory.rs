//! MemoryTransport - keeps flushed batches in memory
//!
//! For tests of producers: inspect exactly what would have been posted.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use contracts::{Batch, BatchTransport, ContractError};
use tokio::time::sleep;

#[derive(Debug, Default)]
struct Recorded {
    batches: Vec<Batch>,
    attempts: usize,
}

/// Transport that records every batch it is given
///
/// Clones share the same record, so keep one clone to inspect after the
/// dispatcher has taken ownership of the other.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    name: String,
    recorded: Arc<Mutex<Recorded>>,
    delay: Duration,
    fail_first: usize,
}

impl MemoryTransport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            recorded: Arc::new(Mutex::new(Recorded::default())),
            delay: Duration::ZERO,
            fail_first: 0,
        }
    }

    /// Sleep this long inside every send (simulates a slow collector)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Reject the first `n` sends with a 500
    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    /// Batches accepted so far, in send order
    pub fn batches(&self) -> Vec<Batch> {
        self.lock().batches.clone()
    }

    /// Number of accepted writes
    pub fn write_count(&self) -> usize {
        self.lock().batches.len()
    }

    /// Number of send calls, failed ones included
    pub fn attempt_count(&self) -> usize {
        self.lock().attempts
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        // A panic while holding the lock only happens in a failing test.
        self.recorded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BatchTransport for MemoryTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, batch: &Batch) -> Result<(), ContractError> {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        let mut recorded = self.lock();
        recorded.attempts += 1;
        if recorded.attempts <= self.fail_first {
            return Err(ContractError::transport_status(
                &self.name,
                500,
                "simulated failure",
            ));
        }
        recorded.batches.push(batch.clone());
        Ok(())
    }
}
