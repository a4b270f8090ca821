use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::TokenPlaceholder;
use crate::environment::Environment;
use crate::person::Person;
use crate::report::Level;
use crate::telemetry::TelemetryFilter;
use crate::transform::FrameRewriter;

/// Session-dependent fields stamped onto every item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadTemplate {
    pub environment: Environment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<Person>,
    pub server: ServerInfo,
    pub client: ClientInfo,
}

impl PayloadTemplate {
    pub fn new(code_version: &str, server_root: &str) -> Self {
        Self {
            environment: Environment::default(),
            person: None,
            server: ServerInfo {
                host: None,
                root: server_root.to_owned(),
            },
            client: ClientInfo {
                javascript: JavascriptInfo::new(code_version),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub root: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub javascript: JavascriptInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavascriptInfo {
    pub source_map_enabled: bool,
    pub code_version: String,
    pub guess_uncaught_frames: bool,
}

impl JavascriptInfo {
    fn new(code_version: &str) -> Self {
        Self {
            source_map_enabled: true,
            code_version: code_version.to_owned(),
            guess_uncaught_frames: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoInstrument {
    pub log: bool,
}

/// Complete configuration handed to a `Collector`. Rebuilt in full on every
/// change; collectors replace their previous copy.
#[derive(Clone)]
pub struct CollectorConfig {
    pub access_token: String,
    pub enabled: bool,
    pub log_level: Level,
    pub capture_uncaught: bool,
    pub capture_unhandled_rejections: bool,
    pub auto_instrument: AutoInstrument,
    pub scrub_fields: Vec<String>,
    pub environment: Environment,
    pub payload: PayloadTemplate,
    pub transform: FrameRewriter,
    pub filter_telemetry: TelemetryFilter,
}

impl fmt::Debug for CollectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CollectorConfig")
            .field("access_token", &TokenPlaceholder)
            .field("enabled", &self.enabled)
            .field("log_level", &self.log_level)
            .field("auto_instrument", &self.auto_instrument)
            .field("environment", &self.environment)
            .field("payload", &self.payload)
            .finish()
    }
}
