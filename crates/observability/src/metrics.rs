//! Dispatch metrics
//!
//! Recorders for the `metrics` facade plus an in-memory aggregator that the
//! dispatch worker returns as a summary when it shuts down.

use metrics::{counter, gauge, histogram};

/// Record an event accepted into the queue
pub fn record_event_enqueued(category: &str) {
    counter!(
        "event_batcher_events_enqueued_total",
        "category" => category.to_string()
    )
    .increment(1);
}

/// Record an event that never reached the accumulator
///
/// `reason` is a short label: `queue_full`, `closed`, `serialize`, `empty_category`.
pub fn record_event_dropped(reason: &'static str) {
    counter!("event_batcher_events_dropped_total", "reason" => reason).increment(1);
}

/// Record a delivered batch
pub fn record_batch_flushed(transport: &str, events: usize, latency_ms: f64) {
    counter!(
        "event_batcher_batches_total",
        "transport" => transport.to_string(),
        "status" => "success"
    )
    .increment(1);
    counter!(
        "event_batcher_events_sent_total",
        "transport" => transport.to_string()
    )
    .increment(events as u64);
    histogram!("event_batcher_batch_size").record(events as f64);
    histogram!("event_batcher_flush_latency_ms").record(latency_ms);
}

/// Record a batch lost to a serialization or transport failure
pub fn record_batch_failed(transport: &str, events: usize) {
    counter!(
        "event_batcher_batches_total",
        "transport" => transport.to_string(),
        "status" => "failure"
    )
    .increment(1);
    counter!(
        "event_batcher_events_lost_total",
        "transport" => transport.to_string()
    )
    .increment(events as u64);
}

/// Record how many events are waiting in the queue
pub fn record_queue_depth(depth: usize) {
    gauge!("event_batcher_queue_depth").set(depth as f64);
}

/// Batch statistics aggregator
///
/// Aggregates flush outcomes in memory for an end-of-run summary.
#[derive(Debug, Clone, Default)]
pub struct BatchStatsAggregator {
    /// Batches delivered
    pub batches_sent: u64,

    /// Batches lost
    pub batches_failed: u64,

    /// Events delivered
    pub events_sent: u64,

    /// Events lost with failed batches
    pub events_lost: u64,

    /// Events per flushed batch
    pub batch_size_stats: RunningStats,

    /// Time spent in the outbound write (ms)
    pub latency_stats: RunningStats,
}

impl BatchStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, events: usize, latency_ms: f64) {
        self.batches_sent += 1;
        self.events_sent += events as u64;
        self.batch_size_stats.push(events as f64);
        self.latency_stats.push(latency_ms);
    }

    pub fn record_failure(&mut self, events: usize, latency_ms: f64) {
        self.batches_failed += 1;
        self.events_lost += events as u64;
        self.batch_size_stats.push(events as f64);
        self.latency_stats.push(latency_ms);
    }

    pub fn summary(&self) -> BatchSummary {
        let batches = self.batches_sent + self.batches_failed;
        BatchSummary {
            batches_sent: self.batches_sent,
            batches_failed: self.batches_failed,
            events_sent: self.events_sent,
            events_lost: self.events_lost,
            failure_rate: if batches > 0 {
                self.batches_failed as f64 / batches as f64 * 100.0
            } else {
                0.0
            },
            batch_size: StatsSummary::from(&self.batch_size_stats),
            latency_ms: StatsSummary::from(&self.latency_stats),
        }
    }
}

/// Flush summary
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub batches_sent: u64,
    pub batches_failed: u64,
    pub events_sent: u64,
    pub events_lost: u64,
    pub failure_rate: f64,
    pub batch_size: StatsSummary,
    pub latency_ms: StatsSummary,
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Summary ===")?;
        writeln!(f, "Batches sent: {}", self.batches_sent)?;
        writeln!(
            f,
            "Batches failed: {} ({:.2}%)",
            self.batches_failed, self.failure_rate
        )?;
        writeln!(f, "Events sent: {}", self.events_sent)?;
        writeln!(f, "Events lost: {}", self.events_lost)?;
        writeln!(f, "Batch size: {}", self.batch_size)?;
        writeln!(f, "Flush latency (ms): {}", self.latency_ms)
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
