//! Dispatch loop - the single worker that owns the accumulator
//!
//! Policy: block for one event, drain whatever else is already queued
//! without waiting, then flush. A lone event is posted right away; a burst
//! is folded into few large batches. If the buffered count passes the flush
//! threshold while draining, the worker flushes immediately and keeps
//! draining, which bounds batch size under sustained load.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument, warn};

use contracts::{BatchTransport, DispatcherConfig, Event};
use observability::metrics as obs;
use observability::{BatchStatsAggregator, BatchSummary};

use crate::accumulator::Accumulator;
use crate::error::DispatcherError;
use crate::handle::Dispatcher;
use crate::metrics::{DispatchMetrics, MetricsSnapshot};
use crate::state::{DispatcherState, StateCell};
use crate::transports::{HttpTransport, LogTransport};

/// What the worker reports when it acknowledges shutdown
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// Counters at the moment the worker exited
    pub metrics: MetricsSnapshot,
    /// Batch size and latency statistics over the dispatcher's lifetime
    pub summary: BatchSummary,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    dry_run: bool,
}

impl DispatcherBuilder {
    /// Create a new DispatcherBuilder
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            dry_run: false,
        }
    }

    /// Log batches instead of posting them
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate the config, build the transport and start the dispatcher
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// `Contract(ConfigValidation)` for empty ids or zero sizes,
    /// `TransportCreation` if the HTTP client cannot be built.
    #[instrument(
        name = "dispatcher_builder_build",
        skip(self),
        fields(project = %self.config.project_id, dry_run = self.dry_run)
    )]
    pub fn build(self) -> Result<Dispatcher, DispatcherError> {
        self.config.validate_fields()?;

        if self.dry_run {
            let transport = LogTransport::new("dry_run");
            return Ok(Dispatcher::spawn(transport, &self.config));
        }

        let transport = HttpTransport::from_config("http", &self.config)
            .map_err(|e| DispatcherError::transport_creation("http", e.to_string()))?;
        Ok(Dispatcher::spawn(transport, &self.config))
    }
}

/// Convenience function to start an HTTP dispatcher from configuration
pub fn create_dispatcher(config: DispatcherConfig) -> Result<Dispatcher, DispatcherError> {
    DispatcherBuilder::new(config).build()
}

/// Worker state; lives entirely inside the spawned task
pub(crate) struct DispatchLoop<T> {
    transport: T,
    rx: mpsc::Receiver<Event>,
    accumulator: Accumulator,
    flush_threshold: usize,
    metrics: Arc<DispatchMetrics>,
    state: Arc<StateCell>,
    stats: BatchStatsAggregator,
}

impl<T: BatchTransport> DispatchLoop<T> {
    pub(crate) fn new(
        transport: T,
        rx: mpsc::Receiver<Event>,
        flush_threshold: usize,
        metrics: Arc<DispatchMetrics>,
        state: Arc<StateCell>,
    ) -> Self {
        Self {
            transport,
            rx,
            accumulator: Accumulator::new(),
            flush_threshold,
            metrics,
            state,
            stats: BatchStatsAggregator::new(),
        }
    }

    /// Run until the queue is closed and empty, then acknowledge on `done`
    #[instrument(
        name = "dispatch_loop",
        skip(self, done),
        fields(transport = %self.transport.name(), flush_threshold = self.flush_threshold)
    )]
    pub(crate) async fn run(mut self, done: oneshot::Sender<DispatchReport>) {
        debug!("Dispatch loop started");

        while let Some(event) = self.rx.recv().await {
            self.add(event).await;
            self.drain().await;
            self.flush().await;
        }

        // recv() only yields None once every sender is gone and the queue is empty.
        self.state.advance(DispatcherState::Closing);
        self.drain().await;
        self.flush().await;

        let report = DispatchReport {
            metrics: self.metrics.snapshot(),
            summary: self.stats.summary(),
        };
        self.state.advance(DispatcherState::Closed);

        info!(
            batches = report.summary.batches_sent,
            failed = report.summary.batches_failed,
            events = report.summary.events_sent,
            "Dispatch loop exited"
        );

        if done.send(report).is_err() {
            debug!("Shutdown acknowledgment had no receiver");
        }
    }

    /// Take everything already queued, without waiting for more
    async fn drain(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.add(event).await;
        }
        let depth = self.rx.len();
        self.metrics.set_queue_len(depth);
        obs::record_queue_depth(depth);
    }

    async fn add(&mut self, event: Event) {
        if event.category.is_empty() {
            self.metrics.inc_dropped_count();
            obs::record_event_dropped("empty_category");
            warn!("Event with empty category dropped");
            return;
        }

        self.accumulator.add(event.category, event.payload);

        if self.accumulator.exceeds(self.flush_threshold) {
            debug!(
                buffered = self.accumulator.len(),
                "Flush threshold exceeded mid-drain"
            );
            self.flush().await;
        }
    }

    /// Send whatever is buffered as one write; the batch is gone either way
    async fn flush(&mut self) {
        let batch = self.accumulator.take_all();
        if batch.is_empty() {
            return;
        }

        let events = batch.event_count();
        let start = Instant::now();
        let result = self.transport.send(&batch).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(()) => {
                self.metrics.record_sent(events);
                self.stats.record_success(events, elapsed_ms);
                obs::record_batch_flushed(self.transport.name(), events, elapsed_ms);
                debug!(
                    events,
                    categories = batch.category_count(),
                    elapsed_ms,
                    "Batch sent"
                );
            }
            Err(e) => {
                self.metrics.record_failure(events);
                self.stats.record_failure(events, elapsed_ms);
                obs::record_batch_failed(self.transport.name(), events);
                error!(events, elapsed_ms, error = %e, "Batch dropped");
            }
        }
    }
}
