//! # Contracts
//!
//! Shared interface contracts between the dispatcher, its configuration and
//! its producers. Business crates depend on this crate, never the reverse.
//!
//! ## Wire model
//! - A flush sends one JSON object: category name -> array of payloads
//! - Payloads are opaque `serde_json::Value`s

mod category;
mod config;
mod error;
mod event;
mod request_event;
mod transport;

pub use category::Category;
pub use config::*;
pub use error::*;
pub use event::{Batch, Event};
pub use request_event::RequestEvent;
pub use transport::{BatchTransport, LocalBatchTransport};
