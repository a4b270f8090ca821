use std::fmt;
use thiserror::Error;

use crate::limits::ACCESS_TOKEN_LENGTH;
use crate::collector::Collector;
use crate::payload::{AutoInstrument, CollectorConfig, PayloadTemplate};
use crate::report::Level;
use crate::reporter::{current_host, ErrorReporter};
use crate::scrub::DEFAULT_SCRUB_FIELDS;
use crate::telemetry::TelemetryFilter;
use crate::transform::FrameRewriter;

pub const DEFAULT_SERVER_ROOT: &str = "webpack:///./";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("access token must be {} hexadecimal characters", ACCESS_TOKEN_LENGTH)]
    AccessTokenFormat,
    #[error("scrub field names must not be empty")]
    EmptyScrubField,
}

/// Static part of the collector configuration. The per-session part
/// (environment, host, person) is owned by `ErrorReporter`.
#[derive(Clone)]
pub struct ReporterConfig {
    pub access_token: String,
    pub enabled: bool,
    pub log_level: Level,
    /// Report panics seen by `install_panic_hook`.
    pub capture_uncaught: bool,
    /// Only forwarded in the collector configuration; nothing here produces
    /// promise rejections.
    pub capture_unhandled_rejections: bool,
    /// Log breadcrumb capture; `None` means the collector default (on).
    pub breadcrumb_logging: Option<bool>,
    pub scrub_fields: Vec<String>,
    /// Build revision reported as `code_version`.
    pub code_version: String,
    pub server_root: String,
    pub frame_rewriter: FrameRewriter,
    pub telemetry_filter: TelemetryFilter,
    #[doc(hidden)]
    pub __non_exhaustive: (),
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            access_token: String::default(),
            enabled: true,
            log_level: Level::Error,
            capture_uncaught: true,
            capture_unhandled_rejections: true,
            breadcrumb_logging: None,
            scrub_fields: DEFAULT_SCRUB_FIELDS.iter().map(|&f| f.to_owned()).collect(),
            code_version: String::default(),
            server_root: DEFAULT_SERVER_ROOT.to_owned(),
            frame_rewriter: FrameRewriter::default(),
            telemetry_filter: TelemetryFilter::default(),
            __non_exhaustive: (),
        }
    }
}

impl ReporterConfig {
    pub fn new(access_token: &str) -> Self {
        Self {
            access_token: access_token.to_owned(),
            ..Self::default()
        }
    }

    /// Starts reporting to `collector` from this machine, using its hostname
    /// as the client location.
    pub fn start<C: Collector>(self, collector: C) -> Result<ErrorReporter<C>, ConfigError> {
        ErrorReporter::new(collector, self, &current_host())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let token_ok = self.access_token.len() == ACCESS_TOKEN_LENGTH
            && self.access_token.chars().all(|c| c.is_ascii_hexdigit());
        if self.enabled {
            if !token_ok {
                return Err(ConfigError::AccessTokenFormat);
            }
        } else if !token_ok && !self.access_token.is_empty() {
            return Err(ConfigError::AccessTokenFormat);
        }
        if self.scrub_fields.iter().any(|f| f.is_empty()) {
            return Err(ConfigError::EmptyScrubField);
        }
        Ok(())
    }

    pub fn is_breadcrumb_logging_on(&self) -> bool {
        self.breadcrumb_logging.unwrap_or(true)
    }

    /// Merges the session template over the static base.
    pub fn collector_config(&self, payload: &PayloadTemplate) -> CollectorConfig {
        CollectorConfig {
            access_token: self.access_token.clone(),
            enabled: self.enabled,
            log_level: self.log_level,
            capture_uncaught: self.capture_uncaught,
            capture_unhandled_rejections: self.capture_unhandled_rejections,
            auto_instrument: AutoInstrument {
                log: self.is_breadcrumb_logging_on(),
            },
            scrub_fields: self.scrub_fields.clone(),
            environment: payload.environment,
            payload: payload.clone(),
            transform: self.frame_rewriter.clone(),
            filter_telemetry: self.telemetry_filter.clone(),
        }
    }

    pub fn with_access_token(self, access_token: &str) -> Self {
        Self {
            access_token: access_token.to_owned(),
            ..self
        }
    }

    pub fn with_enabled(self, enabled: bool) -> Self {
        Self { enabled, ..self }
    }

    pub fn with_log_level(self, log_level: Level) -> Self {
        Self { log_level, ..self }
    }

    pub fn with_capture_uncaught(self, capture_uncaught: bool) -> Self {
        Self {
            capture_uncaught,
            ..self
        }
    }

    pub fn with_breadcrumb_logging(self, breadcrumb_logging: bool) -> Self {
        Self {
            breadcrumb_logging: Some(breadcrumb_logging),
            ..self
        }
    }

    pub fn with_scrub_field(mut self, field: &str) -> Self {
        if !self.scrub_fields.iter().any(|f| f == field) {
            self.scrub_fields.push(field.to_owned());
        }
        self
    }

    pub fn with_code_version(self, code_version: &str) -> Self {
        Self {
            code_version: code_version.to_owned(),
            ..self
        }
    }

    pub fn with_frame_rewriter(self, frame_rewriter: FrameRewriter) -> Self {
        Self {
            frame_rewriter,
            ..self
        }
    }

    pub fn with_telemetry_filter(self, telemetry_filter: TelemetryFilter) -> Self {
        Self {
            telemetry_filter,
            ..self
        }
    }
}

pub(crate) struct TokenPlaceholder;

impl fmt::Debug for TokenPlaceholder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("<filtered>")
    }
}

impl fmt::Debug for ReporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ReporterConfig")
            .field("access_token", &TokenPlaceholder)
            .field("enabled", &self.enabled)
            .field("log_level", &self.log_level)
            .field("capture_uncaught", &self.capture_uncaught)
            .field(
                "capture_unhandled_rejections",
                &self.capture_unhandled_rejections,
            )
            .field("breadcrumb_logging", &self.breadcrumb_logging)
            .field("scrub_fields", &self.scrub_fields)
            .field("code_version", &self.code_version)
            .field("server_root", &self.server_root)
            .finish()
    }
}
