use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::limits::ITEM_ENDPOINT;
use crate::payload::CollectorConfig;
use crate::report::Report;
use crate::scrub::scrub;
use crate::telemetry::{TelemetryEvent, TelemetryQueue};

mod item;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CollectorError {
    #[error("failed to serialize item: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to send item: {0}")]
    Transport(#[from] attohttpc::Error),
    #[error("collector answered {status}: {message}")]
    Status { status: u16, message: String },
}

/// Client side of the remote error collector.
///
/// Implementations must not fail towards the caller: delivery problems are
/// the collector's own concern.
pub trait Collector: Send + Sync {
    /// Replaces the active configuration.
    fn configure(&self, config: &CollectorConfig);

    fn error(&self, report: Report);

    fn record_telemetry(&self, _event: TelemetryEvent) {}
}

impl<C: Collector + ?Sized> Collector for &C {
    fn configure(&self, config: &CollectorConfig) {
        (**self).configure(config)
    }

    fn error(&self, report: Report) {
        (**self).error(report)
    }

    fn record_telemetry(&self, event: TelemetryEvent) {
        (**self).record_telemetry(event)
    }
}

impl<C: Collector + ?Sized> Collector for Arc<C> {
    fn configure(&self, config: &CollectorConfig) {
        (**self).configure(config)
    }

    fn error(&self, report: Report) {
        (**self).error(report)
    }

    fn record_telemetry(&self, event: TelemetryEvent) {
        (**self).record_telemetry(event)
    }
}

/// Collector that posts items to the vendor's item endpoint.
#[derive(Debug)]
pub struct HttpCollector {
    endpoint: String,
    config: RwLock<Option<CollectorConfig>>,
    telemetry: Mutex<TelemetryQueue>,
}

impl Default for HttpCollector {
    fn default() -> Self {
        Self::new(ITEM_ENDPOINT)
    }
}

impl HttpCollector {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
            config: RwLock::new(None),
            telemetry: Mutex::new(TelemetryQueue::default()),
        }
    }

    pub fn config(&self) -> Option<CollectorConfig> {
        self.config.read().clone()
    }

    /// Builds the item for `report` with frames rewritten and fields scrubbed,
    /// or `None` when the report must not be sent.
    pub fn prepare(&self, report: &Report) -> Option<Value> {
        let config = self.config.read();
        let config = match config.as_ref() {
            Some(config) => config,
            None => {
                log::debug!("dropping report, collector is not configured yet");
                return None;
            }
        };
        if !config.enabled {
            return None;
        }
        if report.uncaught && !config.capture_uncaught {
            log::debug!("dropping uncaught report, capture_uncaught is off");
            return None;
        }
        if report.level < config.log_level {
            log::debug!("dropping {:?} report below {:?}", report.level, config.log_level);
            return None;
        }

        let telemetry = self.telemetry.lock().snapshot();
        let mut item = match item::build(config, report, &telemetry) {
            Ok(item) => item,
            Err(e) => {
                log::warn!("could not serialize report: {}", e);
                return None;
            }
        };
        if let Some(data) = item.get_mut("data") {
            if let Err(e) = config.transform.transform(data) {
                log::debug!("frame transform skipped: {}", e);
            }
            scrub(data, &config.scrub_fields);
        }
        Some(item)
    }

    fn post(&self, item: &Value) -> Result<(), CollectorError> {
        let resp = attohttpc::post(&self.endpoint)
            .header("User-Agent", USER_AGENT)
            .json(item)?
            .send()?;
        if !resp.is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().unwrap_or_default();
            return Err(CollectorError::Status { status, message });
        }
        Ok(())
    }
}

impl Collector for HttpCollector {
    fn configure(&self, config: &CollectorConfig) {
        *self.config.write() = Some(config.clone());
    }

    fn error(&self, report: Report) {
        if let Some(item) = self.prepare(&report) {
            if let Err(e) = self.post(&item) {
                log::warn!("failed to deliver report: {}", e);
            }
        }
    }

    fn record_telemetry(&self, event: TelemetryEvent) {
        if let Some(config) = self.config.read().as_ref() {
            if config.filter_telemetry.should_drop(&event) {
                return;
            }
            if event.is_log() && !config.auto_instrument.log {
                return;
            }
        }
        self.telemetry.lock().push(event);
    }
}
