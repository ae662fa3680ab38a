//! DispatcherConfig - Config Loader output
//!
//! Everything the dispatcher needs at construction time: the destination,
//! the write credential and the queue/flush sizing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use validator::{Validate, ValidationErrors};

use crate::ContractError;

/// Default collector API root; the project id and `/events` are appended.
pub const DEFAULT_BASE_URL: &str = "https://api.keen.io/3.0/projects/";

/// Default size of the producer queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default high-water mark that forces a flush mid-drain
pub const DEFAULT_FLUSH_THRESHOLD: usize = 90;

/// Dispatcher configuration
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct DispatcherConfig {
    /// Destination (project) identifier
    #[validate(length(min = 1, message = "project_id cannot be empty"))]
    pub project_id: String,

    /// Write credential, sent as the `api_key` query parameter
    #[validate(length(min = 1, message = "write_key cannot be empty"))]
    pub write_key: String,

    /// Collector API root
    #[serde(default = "default_base_url")]
    #[validate(length(min = 1, message = "base_url cannot be empty"))]
    pub base_url: String,

    /// Bound on events waiting in the queue
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1, message = "queue_capacity must be >= 1"))]
    pub queue_capacity: usize,

    /// Flush as soon as more than this many events are buffered
    #[serde(default = "default_flush_threshold")]
    #[validate(range(min = 1, message = "flush_threshold must be >= 1"))]
    pub flush_threshold: usize,

    /// Per-request timeout in milliseconds (none = wait indefinitely)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_flush_threshold() -> usize {
    DEFAULT_FLUSH_THRESHOLD
}

impl DispatcherConfig {
    /// Config for a project with default sizing
    pub fn new(project_id: impl Into<String>, write_key: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            write_key: write_key.into(),
            base_url: default_base_url(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            request_timeout_ms: None,
        }
    }

    /// Collector events endpoint, without the credential
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{}/{}/events", base, self.project_id)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Run the field rules, reporting the first offending field
    pub fn validate_fields(&self) -> Result<(), ContractError> {
        self.validate().map_err(first_field_error)
    }

    /// Write key with all but the last four characters hidden
    pub fn masked_write_key(&self) -> String {
        let chars: Vec<char> = self.write_key.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), visible)
    }
}

/// Collapse derive errors into the first offending field, sorted for a stable message
fn first_field_error(errors: ValidationErrors) -> ContractError {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    match fields.first() {
        Some((field, errs)) => {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| "invalid value".to_string());
            ContractError::config_validation(field.to_string(), message)
        }
        None => ContractError::config_validation("config", errors.to_string()),
    }
}

// Keep the credential out of logs.
impl fmt::Debug for DispatcherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherConfig")
            .field("project_id", &self.project_id)
            .field("write_key", &self.masked_write_key())
            .field("base_url", &self.base_url)
            .field("queue_capacity", &self.queue_capacity)
            .field("flush_threshold", &self.flush_threshold)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}
