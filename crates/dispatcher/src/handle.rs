//! Dispatcher - the producer-facing handle to a running dispatch loop

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{BatchTransport, Category, DispatcherConfig, Event};
use observability::metrics as obs;

use crate::dispatcher::{DispatchLoop, DispatchReport};
use crate::error::DispatcherError;
use crate::metrics::DispatchMetrics;
use crate::state::{DispatcherState, StateCell};

/// Handle to a running dispatcher
///
/// Producers share it by reference (or behind an `Arc`); every enqueue
/// method takes `&self`. [`Dispatcher::close`] consumes the handle, so a
/// dispatcher cannot be closed twice.
#[derive(Debug)]
pub struct Dispatcher {
    /// Transport name
    name: String,
    /// Inbound queue; the only sender, so dropping it closes the queue
    tx: mpsc::Sender<Event>,
    metrics: Arc<DispatchMetrics>,
    state: Arc<StateCell>,
    /// Shutdown acknowledgment from the worker
    done_rx: oneshot::Receiver<DispatchReport>,
    worker_handle: JoinHandle<()>,
}

impl Dispatcher {
    /// Start a dispatch worker that flushes through `transport`
    ///
    /// Must be called from within a tokio runtime. The config is not
    /// validated here; a zero `queue_capacity` is raised to 1.
    pub fn spawn<T: BatchTransport + Send + 'static>(transport: T, config: &DispatcherConfig) -> Self {
        let name = transport.name().to_string();
        let queue_capacity = config.queue_capacity.max(1);
        let (tx, rx) = mpsc::channel(queue_capacity);
        let (done_tx, done_rx) = oneshot::channel();
        let metrics = Arc::new(DispatchMetrics::new());
        let state = Arc::new(StateCell::new());

        let worker = DispatchLoop::new(
            transport,
            rx,
            config.flush_threshold,
            Arc::clone(&metrics),
            Arc::clone(&state),
        );
        let worker_handle = tokio::spawn(worker.run(done_tx));

        debug!(
            transport = %name,
            queue_capacity,
            flush_threshold = config.flush_threshold,
            "Dispatcher started"
        );

        Self {
            name,
            tx,
            metrics,
            state,
            done_rx,
            worker_handle,
        }
    }

    /// Transport name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    pub fn state(&self) -> DispatcherState {
        self.state.get()
    }

    /// Queue an event, waiting only for queue space
    ///
    /// Never waits on the network and never reports failure: if the worker
    /// is gone the event is logged and dropped.
    pub async fn enqueue(&self, category: impl Into<Category>, payload: Value) {
        let event = Event::new(category, payload);
        let category = event.category.clone();
        match self.tx.send(event).await {
            Ok(()) => self.accepted(&category),
            Err(_) => self.rejected(&category, "closed"),
        }
    }

    /// Queue an event from a thread outside the async runtime
    ///
    /// Blocks while the queue is full. Panics if called from async context,
    /// like [`mpsc::Sender::blocking_send`].
    pub fn blocking_enqueue(&self, category: impl Into<Category>, payload: Value) {
        let event = Event::new(category, payload);
        let category = event.category.clone();
        match self.tx.blocking_send(event) {
            Ok(()) => self.accepted(&category),
            Err(_) => self.rejected(&category, "closed"),
        }
    }

    /// Queue an event without waiting
    ///
    /// # Errors
    /// `QueueFull` when the queue is at capacity, `Closed` when the worker is gone.
    pub fn try_enqueue(
        &self,
        category: impl Into<Category>,
        payload: Value,
    ) -> Result<(), DispatcherError> {
        let event = Event::new(category, payload);
        let category = event.category.clone();
        match self.tx.try_send(event) {
            Ok(()) => {
                self.accepted(&category);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.rejected(&category, "queue_full");
                Err(DispatcherError::QueueFull {
                    category: category.to_string(),
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.rejected(&category, "closed");
                Err(DispatcherError::Closed {
                    category: category.to_string(),
                })
            }
        }
    }

    /// Queue any serializable value
    ///
    /// A value that cannot be represented as JSON is logged and dropped.
    pub async fn enqueue_serialize<P: Serialize>(&self, category: impl Into<Category>, payload: &P) {
        let category = category.into();
        match serde_json::to_value(payload) {
            Ok(value) => self.enqueue(category, value).await,
            Err(e) => {
                self.metrics.inc_dropped_count();
                obs::record_event_dropped("serialize");
                warn!(
                    transport = %self.name,
                    %category,
                    error = %e,
                    "Payload not serializable, event dropped"
                );
            }
        }
    }

    fn accepted(&self, category: &Category) {
        self.metrics.inc_enqueued_count();
        obs::record_event_enqueued(category);
    }

    fn rejected(&self, category: &Category, reason: &'static str) {
        self.metrics.inc_dropped_count();
        obs::record_event_dropped(reason);
        warn!(transport = %self.name, %category, reason, "Event dropped");
    }

    /// Close the queue, wait for the final flush, and return the worker's report
    ///
    /// # Errors
    /// `WorkerFailed` if the worker panicked instead of acknowledging.
    #[instrument(name = "dispatcher_close", skip(self), fields(transport = %self.name))]
    pub async fn close(self) -> Result<DispatchReport, DispatcherError> {
        let Self {
            name,
            tx,
            state,
            done_rx,
            worker_handle,
            ..
        } = self;

        state.advance(DispatcherState::Closing);
        // Dropping the only sender closes the queue.
        drop(tx);

        let report = done_rx.await;
        if let Err(e) = worker_handle.await {
            error!(transport = %name, error = ?e, "Dispatch worker panicked");
            state.advance(DispatcherState::Closed);
            return Err(DispatcherError::WorkerFailed {
                message: e.to_string(),
            });
        }

        let report = report.map_err(|_| DispatcherError::WorkerFailed {
            message: "worker exited without acknowledging shutdown".to_string(),
        })?;

        debug!(transport = %name, "Dispatcher closed");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transports::MemoryTransport;
    use contracts::RequestEvent;
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    fn config(queue_capacity: usize, flush_threshold: usize) -> DispatcherConfig {
        let mut config = DispatcherConfig::new("test-project", "test-key");
        config.queue_capacity = queue_capacity;
        config.flush_threshold = flush_threshold;
        config
    }

    async fn wait_for_writes(observer: &MemoryTransport, n: usize) {
        timeout(Duration::from_secs(2), async {
            while observer.write_count() < n {
                sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("writes did not arrive in time");
    }

    #[tokio::test]
    async fn test_close_without_events_sends_nothing() {
        let observer = MemoryTransport::new("mem");
        let dispatcher = Dispatcher::spawn(observer.clone(), &config(10, 90));

        let report = dispatcher.close().await.unwrap();

        assert_eq!(observer.attempt_count(), 0);
        assert_eq!(report.metrics.flush_count, 0);
    }

    #[tokio::test]
    async fn test_single_event_sent_promptly() {
        let observer = MemoryTransport::new("mem");
        let dispatcher = Dispatcher::spawn(observer.clone(), &config(10, 90));

        dispatcher.enqueue("clicks", json!({"button": "buy"})).await;
        wait_for_writes(&observer, 1).await;

        let batches = observer.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].event_count(), 1);
        assert_eq!(batches[0].get("clicks").unwrap(), &[json!({"button": "buy"})]);
        assert_eq!(dispatcher.state(), DispatcherState::Running);

        dispatcher.close().await.unwrap();
        assert_eq!(observer.write_count(), 1);
    }

    #[tokio::test]
    async fn test_burst_is_batched_under_slow_transport() {
        let observer = MemoryTransport::new("mem").with_delay(Duration::from_millis(5));
        let dispatcher = Dispatcher::spawn(observer.clone(), &config(100, 90));

        for i in 0..1000 {
            dispatcher.enqueue("burst", json!(i)).await;
        }
        let report = dispatcher.close().await.unwrap();

        assert!(observer.write_count() < 1000, "writes = {}", observer.write_count());
        assert_eq!(report.metrics.sent_count, 1000);
        assert!(observer.batches().iter().all(|b| b.event_count() <= 91));
    }

    #[tokio::test]
    async fn test_order_preserved_within_category() {
        let observer = MemoryTransport::new("mem");
        let dispatcher = Dispatcher::spawn(observer.clone(), &config(64, 1000));

        for i in 0..500 {
            dispatcher.enqueue("seq", json!(i)).await;
        }
        dispatcher.close().await.unwrap();

        let seen: Vec<i64> = observer
            .batches()
            .iter()
            .flat_map(|b| b.get("seq").unwrap_or(&[]).to_vec())
            .map(|v| v.as_i64().unwrap())
            .collect();
        assert_eq!(seen, (0..500).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_close_drains_and_stops_writing() {
        let observer = MemoryTransport::new("mem").with_delay(Duration::from_millis(2));
        let dispatcher = Dispatcher::spawn(observer.clone(), &config(100, 90));

        for i in 0..50 {
            dispatcher.try_enqueue("a", json!(i)).unwrap();
            dispatcher.try_enqueue("b", json!(i)).unwrap();
        }
        let report = dispatcher.close().await.unwrap();
        let writes_at_close = observer.write_count();

        sleep(Duration::from_millis(20)).await;
        assert_eq!(observer.write_count(), writes_at_close);

        let total: usize = observer.batches().iter().map(|b| b.event_count()).sum();
        assert_eq!(total, 100);
        assert_eq!(report.metrics.enqueued_count, 100);
    }

    #[tokio::test]
    async fn test_try_enqueue_reports_queue_full() {
        let observer = MemoryTransport::new("mem");
        let dispatcher = Dispatcher::spawn(observer.clone(), &config(2, 90));

        // The worker has not run yet, so nothing leaves the queue.
        dispatcher.try_enqueue("a", json!(1)).unwrap();
        dispatcher.try_enqueue("a", json!(2)).unwrap();
        let err = dispatcher.try_enqueue("a", json!(3)).unwrap_err();
        assert!(matches!(err, DispatcherError::QueueFull { .. }));
        assert_eq!(dispatcher.metrics().dropped_count(), 1);

        let report = dispatcher.close().await.unwrap();
        assert_eq!(report.metrics.sent_count, 2);
    }

    #[tokio::test]
    async fn test_spawn_with_zero_capacity_still_runs() {
        let observer = MemoryTransport::new("mem");
        let dispatcher = Dispatcher::spawn(observer.clone(), &config(0, 90));

        dispatcher.try_enqueue("a", json!(1)).unwrap();
        assert!(matches!(
            dispatcher.try_enqueue("a", json!(2)),
            Err(DispatcherError::QueueFull { .. })
        ));

        let report = dispatcher.close().await.unwrap();
        assert_eq!(report.metrics.sent_count, 1);
        assert_eq!(observer.write_count(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_serialize_request_event() {
        let observer = MemoryTransport::new("mem");
        let dispatcher = Dispatcher::spawn(observer.clone(), &config(10, 90));

        let event = RequestEvent::new("GET", "/health").with_status(204);
        dispatcher.enqueue_serialize("apievents", &event).await;
        dispatcher.close().await.unwrap();

        let batch = &observer.batches()[0];
        let sent = &batch.get("apievents").unwrap()[0];
        assert_eq!(sent["status_code"], 204);
        assert_eq!(sent["path"], "/health");
    }

    #[tokio::test]
    async fn test_unserializable_payload_is_dropped() {
        use std::collections::HashMap;

        let observer = MemoryTransport::new("mem");
        let dispatcher = Dispatcher::spawn(observer.clone(), &config(10, 90));

        // JSON object keys must be strings.
        let bad: HashMap<(u8, u8), u8> = HashMap::from([((1, 2), 3)]);
        dispatcher.enqueue_serialize("bad", &bad).await;
        let report = dispatcher.close().await.unwrap();

        assert_eq!(report.metrics.dropped_count, 1);
        assert_eq!(observer.attempt_count(), 0);
    }

    #[test]
    fn test_handle_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dispatcher>();
    }

    #[test]
    fn test_blocking_enqueue_from_plain_thread() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let observer = MemoryTransport::new("mem");
        let dispatcher = runtime.block_on(async { Dispatcher::spawn(observer.clone(), &config(4, 90)) });

        std::thread::scope(|scope| {
            for t in 0..4 {
                let dispatcher = &dispatcher;
                scope.spawn(move || {
                    for i in 0..25 {
                        dispatcher.blocking_enqueue(format!("thread{t}"), json!(i));
                    }
                });
            }
        });

        let report = runtime.block_on(dispatcher.close()).unwrap();
        assert_eq!(report.metrics.sent_count, 100);
        for t in 0..4 {
            let seen: Vec<i64> = observer
                .batches()
                .iter()
                .flat_map(|b| b.get(&format!("thread{t}")).unwrap_or(&[]).to_vec())
                .map(|v| v.as_i64().unwrap())
                .collect();
            assert_eq!(seen, (0..25).collect::<Vec<_>>());
        }
    }
}
