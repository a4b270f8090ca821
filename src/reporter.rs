//! Error-reporting adapter.
//!
//! `ErrorReporter` is the single funnel between application error hooks and a
//! [`Collector`]. It owns the static configuration and the per-session state
//! (environment, server host, person) and pushes the merged configuration to
//! the collector after every change.

use serde_json::Value;
use std::error::Error;

use crate::collector::Collector;
use crate::config::{ConfigError, ReporterConfig};
use crate::environment::Environment;
use crate::options::ReportingOptions;
use crate::payload::{CollectorConfig, PayloadTemplate};
use crate::person::{Person, UserInfo};
use crate::report::{Level, Report};

#[derive(Debug)]
pub struct ErrorReporter<C> {
    collector: C,
    config: ReporterConfig,
    environment: Environment,
    server_url: Option<String>,
    person: Option<Person>,
}

impl<C: Collector> ErrorReporter<C> {
    /// Creates the adapter for a client served from `location_host`.
    ///
    /// Local development hosts get breadcrumb logging forced off before the
    /// collector sees its first configuration. An invalid configuration is
    /// rejected and the collector is left untouched.
    pub fn new(
        collector: C,
        mut config: ReporterConfig,
        location_host: &str,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if is_local_host(location_host) {
            config.breadcrumb_logging = Some(false);
        }
        let reporter = Self {
            collector,
            config,
            environment: Environment::default(),
            server_url: None,
            person: None,
        };
        reporter.apply();
        Ok(reporter)
    }

    pub fn collector(&self) -> &C {
        &self.collector
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    pub fn person(&self) -> Option<&Person> {
        self.person.as_ref()
    }

    /// Reports an uncaught error and mirrors it to the local log.
    pub fn handle_error(&self, err: &(dyn Error + 'static)) {
        self.collector.error(Report::from_error(err));
        log::error!("{}", err);
    }

    pub fn configure_from_options(&mut self, options: ReportingOptions) {
        if let Some(reporting) = options.reporting {
            self.config.enabled = reporting.is_on();
        }
        if let Some(logging) = options.breadcrumb_logging {
            self.config.breadcrumb_logging = Some(logging.is_on());
        }
        self.apply();
        log::info!("Configuring error reporting settings {:?}", options);
    }

    pub fn is_breadcrumb_logging_on(&self) -> bool {
        self.config.is_breadcrumb_logging_on()
    }

    /// Installs the signed-in user as `person` on subsequent reports.
    ///
    /// An incomplete user (usually: nobody signed in yet) keeps the previous
    /// identity in place.
    pub fn set_user(&mut self, user: Option<&UserInfo>) {
        match Person::from_user(user) {
            Ok(person) => {
                self.person = Some(person);
                self.apply();
            }
            Err(e) => {
                log::debug!(
                    "Could not set user info for error tracking, user likely not logged in: {}",
                    e
                );
            }
        }
    }

    pub fn set_environment(&mut self, server_url: &str, environment: Environment) {
        self.server_url = Some(server_url.to_owned());
        self.environment = environment;
        self.apply();
    }

    pub fn toggle_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        self.apply();
    }

    /// Sends a non-exception event built from loosely typed arguments.
    pub fn log_event(&self, data: &[Value]) {
        self.collector.error(Report::from_values(Level::Error, data));
    }

    pub fn collector_config(&self) -> CollectorConfig {
        self.config.collector_config(&self.payload_template())
    }

    fn payload_template(&self) -> PayloadTemplate {
        let mut template =
            PayloadTemplate::new(&self.config.code_version, &self.config.server_root);
        template.environment = self.environment;
        template.person = self.person.clone();
        template.server.host = self.server_url.clone();
        template
    }

    fn apply(&self) {
        self.collector.configure(&self.collector_config());
    }
}

pub fn is_local_host(host: &str) -> bool {
    host.contains("localhost")
}

/// Hostname of the machine, for clients that are not served from a browser
/// location.
pub fn current_host() -> String {
    match hostname::get() {
        Ok(hostname) => hostname.to_string_lossy().into_owned(),
        Err(e) => {
            log::debug!("could not read hostname: {}", e);
            "unknown".to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Toggle;
    use crate::report::{ReportBody, WrappedError};
    use crate::telemetry::TelemetryEvent;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::io;

    const TOKEN: &str = "0123456789abcdef0123456789abcdef";

    #[derive(Debug, Default)]
    struct RecordingCollector {
        configs: Mutex<Vec<CollectorConfig>>,
        reports: Mutex<Vec<Report>>,
    }

    impl RecordingCollector {
        fn last_config(&self) -> CollectorConfig {
            self.configs.lock().last().cloned().unwrap()
        }
    }

    impl Collector for RecordingCollector {
        fn configure(&self, config: &CollectorConfig) {
            self.configs.lock().push(config.clone());
        }

        fn error(&self, report: Report) {
            self.reports.lock().push(report);
        }

        fn record_telemetry(&self, _event: TelemetryEvent) {}
    }

    fn reporter(host: &str) -> ErrorReporter<RecordingCollector> {
        ErrorReporter::new(
            RecordingCollector::default(),
            ReporterConfig::new(TOKEN).with_code_version("abc1234"),
            host,
        )
        .unwrap()
    }

    #[test]
    fn construction_configures_collector_once() {
        let reporter = reporter("app.somdomain.io");
        assert_eq!(reporter.collector().configs.lock().len(), 1);
        assert!(reporter.is_breadcrumb_logging_on());
        let config = reporter.collector().last_config();
        assert!(config.enabled);
        assert!(config.auto_instrument.log);
        assert_eq!(config.payload.client.javascript.code_version, "abc1234");
    }

    #[test]
    fn localhost_disables_breadcrumb_logging() {
        let reporter = reporter("localhost:4200");
        assert!(!reporter.is_breadcrumb_logging_on());
        assert!(!reporter.collector().last_config().auto_instrument.log);
    }

    #[test]
    fn handle_error_reports_original_cause() {
        let reporter = reporter("app.somdomain.io");
        let err = WrappedError::new(
            "Uncaught (in promise)",
            io::Error::new(io::ErrorKind::Other, "request failed"),
        );
        reporter.handle_error(&err);
        let reports = reporter.collector().reports.lock();
        assert_eq!(reports.len(), 1);
        match &reports[0].body {
            ReportBody::Trace(chain) => {
                assert_eq!(chain[0].exception.message, "request failed")
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn options_toggle_reporting_and_logging() {
        let mut reporter = reporter("app.somdomain.io");
        reporter.configure_from_options(
            ReportingOptions::new()
                .with_reporting(Toggle::Off)
                .with_breadcrumb_logging(Toggle::Off),
        );
        let config = reporter.collector().last_config();
        assert!(!config.enabled);
        assert!(!config.auto_instrument.log);
        assert!(!reporter.is_breadcrumb_logging_on());

        reporter.configure_from_options(ReportingOptions::from_query("rollbar=on"));
        let config = reporter.collector().last_config();
        assert!(config.enabled);
        assert!(!config.auto_instrument.log);
        assert_eq!(reporter.collector().configs.lock().len(), 3);
    }

    #[test]
    fn set_user_updates_person() {
        let mut reporter = reporter("app.somdomain.io");
        reporter.set_user(Some(&UserInfo::new("42", "ann@example.com")));
        let person = reporter.collector().last_config().payload.person.unwrap();
        assert_eq!(person.id, "42");
        assert_eq!(person.email, "ann@example.com");
    }

    #[test]
    fn set_user_without_user_keeps_previous_identity() {
        let mut reporter = reporter("app.somdomain.io");
        reporter.set_user(None);
        assert!(reporter.person().is_none());
        assert_eq!(reporter.collector().configs.lock().len(), 1);

        reporter.set_user(Some(&UserInfo::new("42", "ann@example.com")));
        reporter.set_user(None);
        reporter.set_user(Some(&UserInfo::default()));
        assert_eq!(reporter.person().map(|p| p.id.as_str()), Some("42"));
        assert_eq!(
            reporter.collector().last_config().payload.person.map(|p| p.id),
            Some("42".to_owned())
        );
    }

    #[test]
    fn environment_and_host_are_stamped() {
        let mut reporter = reporter("app.somdomain.io");
        reporter.set_environment("https://app.somdomain.io", Environment::Production);
        let config = reporter.collector().last_config();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.payload.environment, Environment::Production);
        assert_eq!(
            config.payload.server.host.as_deref(),
            Some("https://app.somdomain.io")
        );
        assert_eq!(config.payload.server.root, "webpack:///./");
    }

    #[test]
    fn toggle_enabled_keeps_session_state() {
        let mut reporter = reporter("app.somdomain.io");
        reporter.set_environment("https://stage.somdomain.io", Environment::Staging);
        reporter.toggle_enabled(false);
        let config = reporter.collector().last_config();
        assert!(!config.enabled);
        assert_eq!(config.environment, Environment::Staging);
    }

    #[test]
    fn log_event_sends_message_report() {
        let reporter = reporter("app.somdomain.io");
        reporter.log_event(&[json!("sync stalled"), json!({"queue": 3})]);
        let reports = reporter.collector().reports.lock();
        assert_eq!(
            reports[0].body,
            ReportBody::Message("sync stalled".to_owned())
        );
        assert_eq!(reports[0].custom["queue"], 3);
    }

    #[test]
    fn works_with_borrowed_collector() {
        let collector = RecordingCollector::default();
        let mut reporter =
            ErrorReporter::new(&collector, ReporterConfig::new(TOKEN), "x").unwrap();
        reporter.toggle_enabled(false);
        assert_eq!(collector.configs.lock().len(), 2);
    }

    #[test]
    fn invalid_token_is_rejected_at_construction() {
        let collector = RecordingCollector::default();
        for token in &["", "short", "0123456789abcdef0123456789abcdeg"] {
            let err = ErrorReporter::new(&collector, ReporterConfig::new(token), "x");
            assert_eq!(err.unwrap_err(), ConfigError::AccessTokenFormat);
        }
        assert!(collector.configs.lock().is_empty());

        let disabled = ReporterConfig::new("").with_enabled(false);
        assert!(ErrorReporter::new(&collector, disabled, "x").is_ok());
    }

    #[test]
    fn start_uses_machine_hostname() {
        let collector = RecordingCollector::default();
        let reporter = ReporterConfig::new(TOKEN).start(&collector).unwrap();
        assert_eq!(
            reporter.is_breadcrumb_logging_on(),
            !is_local_host(&current_host())
        );
        assert_eq!(collector.configs.lock().len(), 1);
        assert!(ReporterConfig::new("short").start(&collector).is_err());
    }
}
