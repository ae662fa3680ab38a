//! Layered error definitions
//!
//! Categorized by source: config / serialization / transport

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Batch Errors =====
    /// Batch could not be encoded for the wire
    #[error("failed to serialize batch of {events} events: {message}")]
    Serialization { message: String, events: usize },

    // ===== Transport Errors =====
    /// Request never produced a response (connect, timeout, TLS, ...)
    #[error("transport '{transport}' connection error: {message}")]
    TransportConnection { transport: String, message: String },

    /// Collector answered with something other than 200
    #[error("transport '{transport}' rejected batch: status {status}: {message}")]
    TransportStatus {
        transport: String,
        status: u16,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create transport connection error
    pub fn transport_connection(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportConnection {
            transport: transport.into(),
            message: message.into(),
        }
    }

    /// Create transport status error
    pub fn transport_status(
        transport: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::TransportStatus {
            transport: transport.into(),
            status,
            message: message.into(),
        }
    }
}
