//! HttpTransport - one JSON POST per flushed batch

use std::time::Duration;

use contracts::{Batch, BatchTransport, ContractError, DispatcherConfig};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};

/// Longest response body excerpt kept in an error message
const MAX_ERROR_BODY: usize = 256;

/// Configuration for HttpTransport
#[derive(Clone)]
pub struct HttpTransportConfig {
    /// Events endpoint, without the credential
    pub endpoint: String,
    /// Write credential, sent as the `api_key` query parameter
    pub write_key: String,
    /// Per-request timeout (None = no timeout)
    pub timeout: Option<Duration>,
}

impl HttpTransportConfig {
    pub fn from_dispatcher_config(config: &DispatcherConfig) -> Self {
        Self {
            endpoint: config.endpoint(),
            write_key: config.write_key.clone(),
            timeout: config.request_timeout(),
        }
    }
}

impl std::fmt::Debug for HttpTransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportConfig")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Transport that posts batches to the collector over HTTP(S)
pub struct HttpTransport {
    name: String,
    config: HttpTransportConfig,
    client: Client,
}

impl HttpTransport {
    /// Create a new HttpTransport
    #[instrument(name = "http_transport_new", skip(name, config))]
    pub fn new(name: impl Into<String>, config: HttpTransportConfig) -> Result<Self, ContractError> {
        let name = name.into();

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ContractError::transport_connection(&name, e.to_string()))?;

        debug!(
            transport = %name,
            endpoint = %config.endpoint,
            timeout_ms = config.timeout.map(|t| t.as_millis() as u64),
            "HttpTransport ready"
        );

        Ok(Self {
            name,
            config,
            client,
        })
    }

    /// Create from the dispatcher configuration
    pub fn from_config(
        name: impl Into<String>,
        config: &DispatcherConfig,
    ) -> Result<Self, ContractError> {
        Self::new(name, HttpTransportConfig::from_dispatcher_config(config))
    }

    async fn post(&self, body: Vec<u8>) -> Result<(), ContractError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&[("api_key", self.config.write_key.as_str())])
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            // The URL carries the write key; keep it out of the error.
            .map_err(|e| ContractError::transport_connection(&self.name, e.without_url().to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(ContractError::transport_status(
                &self.name,
                status.as_u16(),
                excerpt(&text),
            ));
        }

        Ok(())
    }
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

impl BatchTransport for HttpTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "http_transport_send",
        skip(self, batch),
        fields(transport = %self.name, events = batch.event_count())
    )]
    async fn send(&mut self, batch: &Batch) -> Result<(), ContractError> {
        let body = batch.to_json()?;
        let bytes = body.len();

        match self.post(body).await {
            Ok(()) => {
                debug!(transport = %self.name, bytes, "Batch posted");
                Ok(())
            }
            Err(e) => {
                warn!(transport = %self.name, bytes, error = %e, "Batch post failed");
                Err(e)
            }
        }
    }
}
