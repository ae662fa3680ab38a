//! Per-category batch accumulator.
//!
//! Owned exclusively by the dispatch worker, so it carries no locking.
//! It never flushes on its own; the worker reads [`Accumulator::len`] and
//! decides.

use std::fmt;

use contracts::{Batch, Category};
use serde_json::Value;

/// In-memory aggregation table: category -> payloads in arrival order
///
/// Invariant: `len()` equals the sum of all per-category sequence lengths.
#[derive(Default)]
pub struct Accumulator {
    batch: Batch,
    count: usize,
}

impl fmt::Debug for Accumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accumulator")
            .field("len", &self.count)
            .field("categories", &self.batch.category_count())
            .finish()
    }
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a payload under its category
    #[inline]
    pub fn add(&mut self, category: Category, payload: Value) {
        self.batch.push(category, payload);
        self.count += 1;
    }

    /// Number of buffered events across all categories
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// True once more than `threshold` events are buffered
    #[inline]
    pub fn exceeds(&self, threshold: usize) -> bool {
        self.count > threshold
    }

    /// Hand over everything buffered and start again from empty
    pub fn take_all(&mut self) -> Batch {
        self.count = 0;
        std::mem::take(&mut self.batch)
    }
}
