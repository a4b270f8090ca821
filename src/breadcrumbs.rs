//! `log` integration: records become `log` telemetry on a [`Collector`].
//!
//! Whether the breadcrumbs end up on reports is decided by the collector
//! (`auto_instrument.log`), so switching breadcrumb logging off through
//! `ErrorReporter` takes effect without reinstalling the logger.

use serde_json::json;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::collector::Collector;
use crate::report::Level;
use crate::telemetry::TelemetryEvent;

/// Records emitted by this crate are forwarded but never recorded.
const OWN_TARGET: &str = "rollbar_webclient";

/// Logger that records every record up to `filter` as a breadcrumb and
/// passes it on to an optional destination logger.
pub struct BreadcrumbLogger<C> {
    collector: C,
    filter: log::LevelFilter,
    dest: Option<Box<dyn log::Log>>,
}

impl<C: Collector> BreadcrumbLogger<C> {
    pub fn new(collector: C) -> Self {
        Self {
            collector,
            filter: log::LevelFilter::Info,
            dest: None,
        }
    }

    pub fn with_filter(self, filter: log::LevelFilter) -> Self {
        Self { filter, ..self }
    }

    pub fn with_dest<L: log::Log + 'static>(self, dest: L) -> Self {
        Self {
            dest: Some(Box::new(dest)),
            ..self
        }
    }

    fn max_level(&self) -> log::LevelFilter {
        if self.dest.is_some() {
            log::LevelFilter::Trace
        } else {
            self.filter
        }
    }
}

impl<C: Collector + 'static> BreadcrumbLogger<C> {
    /// Installs the logger as the global `log` logger.
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        let max_level = self.max_level();
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl<C: Collector> log::Log for BreadcrumbLogger<C> {
    fn enabled(&self, md: &log::Metadata<'_>) -> bool {
        md.level() <= self.filter || self.dest.as_ref().map_or(false, |d| d.enabled(md))
    }

    fn log(&self, record: &log::Record<'_>) {
        if record.level() <= self.filter && !record.target().starts_with(OWN_TARGET) {
            self.collector.record_telemetry(event_from_record(record));
        }
        if let Some(dest) = &self.dest {
            if dest.enabled(record.metadata()) {
                dest.log(record);
            }
        }
    }

    fn flush(&self) {
        if let Some(dest) = &self.dest {
            dest.flush();
        }
    }
}

impl<C> fmt::Debug for BreadcrumbLogger<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BreadcrumbLogger")
            .field("filter", &self.filter)
            .field("dest", &self.dest.is_some())
            .finish()
    }
}

fn event_from_record(record: &log::Record<'_>) -> TelemetryEvent {
    TelemetryEvent::new(
        "log",
        Level::from(record.level()),
        now_millis(),
        json!({
            "message": record.args().to_string(),
            "target": record.target(),
        }),
    )
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::HttpCollector;
    use crate::config::ReporterConfig;
    use crate::payload::PayloadTemplate;
    use crate::report::Report;
    use log::Log;
    use parking_lot::Mutex;
    use std::sync::Arc;

    const TOKEN: &str = "0123456789abcdef0123456789abcdef";

    fn collector(breadcrumb_logging: bool) -> HttpCollector {
        let collector = HttpCollector::new("http://127.0.0.1:9/api/1/item/");
        let config = ReporterConfig::new(TOKEN).with_breadcrumb_logging(breadcrumb_logging);
        collector.configure(&config.collector_config(&PayloadTemplate::new("rev", "root")));
        collector
    }

    fn emit(logger: &dyn Log, level: log::Level, target: &str, message: &str) {
        logger.log(
            &log::Record::builder()
                .args(format_args!("{}", message))
                .level(level)
                .target(target)
                .build(),
        );
    }

    #[derive(Clone, Default)]
    struct SharedLog(Arc<Mutex<Vec<String>>>);

    impl Log for SharedLog {
        fn enabled(&self, _md: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            self.0.lock().push(record.args().to_string());
        }

        fn flush(&self) {}
    }

    #[test]
    fn records_reach_report_telemetry_when_logging_is_on() {
        let collector = collector(true);
        let logger = BreadcrumbLogger::new(&collector);
        emit(&logger, log::Level::Warn, "app::checkout", "user clicked checkout");

        let item = collector.prepare(&Report::message(Level::Error, "x")).unwrap();
        let telemetry = &item["data"]["body"]["telemetry"];
        assert_eq!(telemetry[0]["type"], "log");
        assert_eq!(telemetry[0]["level"], "warning");
        assert_eq!(telemetry[0]["body"]["message"], "user clicked checkout");
    }

    #[test]
    fn records_are_not_kept_when_logging_is_off() {
        let collector = collector(false);
        let logger = BreadcrumbLogger::new(&collector);
        emit(&logger, log::Level::Warn, "app::checkout", "user clicked checkout");

        let item = collector.prepare(&Report::message(Level::Error, "x")).unwrap();
        assert!(item["data"]["body"].get("telemetry").is_none());
    }

    #[test]
    fn filters_and_forwards_to_destination() {
        let collector = collector(true);
        let dest = SharedLog::default();
        let logger = BreadcrumbLogger::new(&collector).with_dest(dest.clone());
        emit(&logger, log::Level::Debug, "app", "too chatty");
        emit(&logger, log::Level::Error, "rollbar_webclient::collector", "delivery failed");
        emit(&logger, log::Level::Info, "app", "signed in");

        let item = collector.prepare(&Report::message(Level::Error, "x")).unwrap();
        let telemetry = item["data"]["body"]["telemetry"].as_array().unwrap();
        assert_eq!(telemetry.len(), 1);
        assert_eq!(telemetry[0]["body"]["message"], "signed in");
        assert_eq!(
            *dest.0.lock(),
            vec!["too chatty", "delivery failed", "signed in"]
        );
        assert!(logger.enabled(&log::Metadata::builder().level(log::Level::Trace).build()));
    }
}
