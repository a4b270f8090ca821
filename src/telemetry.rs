use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;

use crate::limits::MAX_TELEMETRY_EVENTS;
use crate::report::Level;

pub const DEFAULT_ANALYTICS_PREFIX: &str = "https://api.mixpanel.com";

/// An automatically captured diagnostic event attached to later reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub level: Level,
    pub timestamp_ms: u64,
    pub body: Value,
}

impl TelemetryEvent {
    pub fn new(kind: &str, level: Level, timestamp_ms: u64, body: Value) -> Self {
        Self {
            kind: kind.to_owned(),
            level,
            timestamp_ms,
            body,
        }
    }

    pub fn is_log(&self) -> bool {
        self.kind == "log"
    }
}

/// Drops network breadcrumbs aimed at the analytics ingestion service.
#[derive(Debug, Clone)]
pub struct TelemetryFilter {
    url_prefix: String,
}

impl Default for TelemetryFilter {
    fn default() -> Self {
        Self::new(DEFAULT_ANALYTICS_PREFIX)
    }
}

impl TelemetryFilter {
    pub fn new(url_prefix: &str) -> Self {
        Self {
            url_prefix: url_prefix.to_owned(),
        }
    }

    /// `true` only for `xhr`/`fetch` network events whose URL starts with the
    /// analytics prefix. Events with any other shape are kept.
    pub fn should_drop(&self, event: &TelemetryEvent) -> bool {
        self.match_network_call(event).unwrap_or(false)
    }

    fn match_network_call(&self, event: &TelemetryEvent) -> Option<bool> {
        if event.kind != "network" {
            return Some(false);
        }
        let subtype = event.body.get("subtype")?.as_str()?;
        if subtype != "xhr" && subtype != "fetch" {
            return Some(false);
        }
        let url = event.body.get("url")?.as_str()?;
        Some(url.starts_with(&self.url_prefix))
    }
}

/// Bounded queue of recent telemetry, oldest first.
#[derive(Debug, Clone, Default)]
pub(crate) struct TelemetryQueue {
    events: VecDeque<TelemetryEvent>,
}

impl TelemetryQueue {
    pub(crate) fn push(&mut self, event: TelemetryEvent) {
        if self.events.len() >= MAX_TELEMETRY_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub(crate) fn snapshot(&self) -> Vec<TelemetryEvent> {
        self.events.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn network(body: Value) -> TelemetryEvent {
        TelemetryEvent::new("network", Level::Info, 0, body)
    }

    #[test]
    fn drops_analytics_calls() {
        let filter = TelemetryFilter::default();
        for subtype in &["xhr", "fetch"] {
            let event = network(json!({
                "subtype": subtype,
                "url": "https://api.mixpanel.com/track?data=abc",
            }));
            assert!(filter.should_drop(&event));
        }
    }

    #[test]
    fn keeps_everything_else() {
        let filter = TelemetryFilter::default();
        assert!(!filter.should_drop(&network(json!({
            "subtype": "xhr",
            "url": "https://api.somdomain.io/v1/users",
        }))));
        assert!(!filter.should_drop(&network(json!({
            "subtype": "beacon",
            "url": "https://api.mixpanel.com/track",
        }))));
        let log = TelemetryEvent::new(
            "log",
            Level::Info,
            0,
            json!({"url": "https://api.mixpanel.com", "subtype": "xhr"}),
        );
        assert!(!filter.should_drop(&log));
    }

    #[test]
    fn malformed_bodies_are_kept() {
        let filter = TelemetryFilter::default();
        assert!(!filter.should_drop(&network(Value::Null)));
        assert!(!filter.should_drop(&network(json!({"subtype": "xhr"}))));
        assert!(!filter.should_drop(&network(json!({"subtype": "fetch", "url": 42}))));
        assert!(!filter.should_drop(&network(json!(["xhr"]))));
    }

    #[test]
    fn queue_keeps_newest_events() {
        let mut queue = TelemetryQueue::default();
        for i in 0..(MAX_TELEMETRY_EVENTS as u64 + 5) {
            queue.push(TelemetryEvent::new("log", Level::Info, i, Value::Null));
        }
        assert_eq!(queue.snapshot().len(), MAX_TELEMETRY_EVENTS);
        assert_eq!(queue.snapshot()[0].timestamp_ms, 5);
    }
}
