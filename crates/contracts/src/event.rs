//! Event and Batch - the data flowing through the dispatcher
//!
//! An [`Event`] travels from a producer through the queue into the
//! accumulator; a [`Batch`] is what the accumulator hands to the transport
//! at flush time.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::Category;

/// One discrete record of structured data tagged with a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub category: Category,
    pub payload: Value,
}

impl Event {
    pub fn new(category: impl Into<Category>, payload: Value) -> Self {
        Self {
            category: category.into(),
            payload,
        }
    }
}

/// All buffered events across all categories at the moment of a flush.
///
/// Serializes as the collector body: `{"<category>": [payload, ...], ...}`.
/// Payload order within a category is the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Batch {
    events: BTreeMap<Category, Vec<Value>>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a payload under its category.
    pub fn push(&mut self, category: Category, payload: Value) {
        self.events.entry(category).or_default().push(payload);
    }

    /// Total number of payloads across all categories
    pub fn event_count(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    pub fn category_count(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Payloads for a category, in insertion order
    pub fn get(&self, category: &str) -> Option<&[Value]> {
        self.events.get(category).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, &[Value])> {
        self.events.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Encode as the JSON request body
    pub fn to_json(&self) -> Result<Vec<u8>, crate::ContractError> {
        serde_json::to_vec(self).map_err(|e| crate::ContractError::Serialization {
            message: e.to_string(),
            events: self.event_count(),
        })
    }
}

impl FromIterator<Event> for Batch {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        let mut batch = Batch::new();
        for event in iter {
            batch.push(event.category, event.payload);
        }
        batch
    }
}
