//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Transport creation error
    #[error("failed to create transport '{name}': {message}")]
    TransportCreation { name: String, message: String },

    /// Queue full - event not accepted
    #[error("queue full, event for category '{category}' dropped")]
    QueueFull { category: String },

    /// Dispatch worker is gone; no more events can be accepted
    #[error("dispatcher closed, event for category '{category}' dropped")]
    Closed { category: String },

    /// Worker exited without acknowledging shutdown
    #[error("dispatch worker failed: {message}")]
    WorkerFailed { message: String },

    /// Configuration or transport error (from contract)
    #[error("contract error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl DispatcherError {
    /// Create a transport creation error
    pub fn transport_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
