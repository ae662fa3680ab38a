//! # Dispatcher
//!
//! Batching event dispatch.
//!
//! Responsibilities:
//! - Accept events from any number of producers through a bounded queue
//! - Fold bursts into per-category batches
//! - Post each batch as a single write, best effort, never retried

pub mod accumulator;
pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod state;
pub mod transports;

pub use accumulator::Accumulator;
pub use contracts::{Batch, BatchTransport, Category, DispatcherConfig, Event, RequestEvent};
pub use dispatcher::{create_dispatcher, DispatchReport, DispatcherBuilder};
pub use error::DispatcherError;
pub use handle::Dispatcher;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use state::DispatcherState;
pub use transports::{HttpTransport, HttpTransportConfig, LogTransport, MemoryTransport};
