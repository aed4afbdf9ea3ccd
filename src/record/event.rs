//! Event - a named, timestamped occurrence with free-form payload

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event records something that happened during a session.
///
/// `timestamp` (ms since epoch) and `datetime` (ISO-8601) always describe
/// the same instant, at millisecond precision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    event: String,
    #[serde(default)]
    data: Map<String, Value>,
    timestamp: i64,
    datetime: String,
}

impl Event {
    /// Create an event stamped at the given instant.
    #[must_use]
    pub fn stamped(name: impl Into<String>, data: Map<String, Value>, at: DateTime<Utc>) -> Self {
        Self {
            event: name.into(),
            data,
            timestamp: at.timestamp_millis(),
            datetime: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Get the event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.event
    }

    /// Get the payload.
    #[must_use]
    pub const fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Milliseconds since epoch.
    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// ISO-8601 rendering of [`timestamp`](Self::timestamp).
    #[must_use]
    pub fn datetime(&self) -> &str {
        &self.datetime
    }
}
