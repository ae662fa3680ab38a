//! RequestEvent - payload describing one served HTTP request
//!
//! Framework-agnostic: an HTTP layer fills it in after the handler returns
//! and enqueues it under a category of its choice.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// Record of a single request/response exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEvent {
    /// Request target as received (path + query)
    pub url: String,
    pub path: String,
    pub method: String,
    /// Status written by the handler, 200 if it never wrote one
    pub status_code: u16,
    pub duration_ns: u64,
    #[serde(default)]
    pub user_agent: String,
    /// Request headers; repeated headers keep every value
    #[serde(default)]
    pub header: BTreeMap<String, Vec<String>>,
    /// Caller-supplied fields, flattened into the event object
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequestEvent {
    /// Start an event for `method url`; the path is `url` without its query.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let path = url.split('?').next().unwrap_or_default().to_string();
        Self {
            url,
            path,
            method: method.into(),
            status_code: 200,
            duration_ns: 0,
            user_agent: String::new(),
            header: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_duration(mut self, elapsed: Duration) -> Self {
        self.duration_ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self
    }

    /// Record a header; `User-Agent` also fills `user_agent`.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if name.eq_ignore_ascii_case("user-agent") {
            self.user_agent = value.clone();
        }
        self.header.entry(name).or_default().push(value);
        self
    }

    /// Attach an application-specific field
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}
