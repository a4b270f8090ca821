use serde::Serialize;
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::payload::{CollectorConfig, PayloadTemplate};
use crate::report::{Level, Report, ReportBody, Trace};
use crate::telemetry::TelemetryEvent;

const PLATFORM: &str = "browser";
const LANGUAGE: &str = "javascript";

#[derive(Debug, Serialize)]
struct Item<'a> {
    access_token: &'a str,
    data: ItemData<'a>,
}

#[derive(Debug, Serialize)]
struct ItemData<'a> {
    #[serde(flatten)]
    payload: &'a PayloadTemplate,
    level: Level,
    timestamp: u64,
    platform: &'static str,
    language: &'static str,
    body: Body<'a>,
    #[serde(skip_serializing_if = "no_custom")]
    custom: &'a Map<String, Value>,
    notifier: Notifier,
}

#[derive(Debug, Serialize)]
struct Body<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<&'a Trace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_chain: Option<&'a [Trace]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<MessageBody<'a>>,
    #[serde(skip_serializing_if = "no_telemetry")]
    telemetry: &'a [TelemetryEvent],
}

#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct Notifier {
    name: &'static str,
    version: &'static str,
}

impl Default for Notifier {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Serializes `report` into the item envelope accepted by the item endpoint.
pub(super) fn build(
    config: &CollectorConfig,
    report: &Report,
    telemetry: &[TelemetryEvent],
) -> serde_json::Result<Value> {
    let mut body = Body {
        trace: None,
        trace_chain: None,
        message: None,
        telemetry,
    };
    match &report.body {
        ReportBody::Trace(chain) if chain.len() == 1 => body.trace = chain.first(),
        ReportBody::Trace(chain) => body.trace_chain = Some(chain.as_slice()),
        ReportBody::Message(message) => body.message = Some(MessageBody { body: message }),
    }
    let item = Item {
        access_token: &config.access_token,
        data: ItemData {
            payload: &config.payload,
            level: report.level,
            timestamp: now_secs(),
            platform: PLATFORM,
            language: LANGUAGE,
            body,
            custom: &report.custom,
            notifier: Notifier::default(),
        },
    };
    serde_json::to_value(&item)
}

fn no_telemetry(telemetry: &&[TelemetryEvent]) -> bool {
    telemetry.is_empty()
}

fn no_custom(custom: &&Map<String, Value>) -> bool {
    custom.is_empty()
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReporterConfig;
    use crate::environment::Environment;
    use crate::person::{Person, UserInfo};
    use serde_json::json;
    use std::io;

    fn config() -> CollectorConfig {
        let mut template = PayloadTemplate::new("abc1234", "webpack:///./");
        template.environment = Environment::Production;
        template.person = Person::from_user(Some(&UserInfo::new("7", "a@b.c"))).ok();
        ReporterConfig::new("0123456789abcdef0123456789abcdef").collector_config(&template)
    }

    #[test]
    fn error_item_carries_template_and_trace() {
        let err = io::Error::new(io::ErrorKind::Other, "boom");
        let item = build(&config(), &Report::from_error(&err), &[]).unwrap();
        let data = &item["data"];
        assert_eq!(item["access_token"], "0123456789abcdef0123456789abcdef");
        assert_eq!(data["environment"], "production");
        assert_eq!(data["level"], "error");
        assert_eq!(data["person"]["username"], "a@b.c");
        assert_eq!(data["client"]["javascript"]["code_version"], "abc1234");
        assert_eq!(data["body"]["trace"]["exception"]["message"], "boom");
        assert!(data["body"].get("trace_chain").is_none());
        assert!(data["body"].get("telemetry").is_none());
        assert!(data.get("custom").is_none());
    }

    #[test]
    fn message_item_with_telemetry() {
        let report = Report::from_values(Level::Warning, &[json!("hello"), json!({"k": 1})]);
        let telemetry = vec![TelemetryEvent::new("log", Level::Info, 5, json!({"message": "m"}))];
        let item = build(&config(), &report, &telemetry).unwrap();
        let data = &item["data"];
        assert_eq!(data["body"]["message"]["body"], "hello");
        assert_eq!(data["body"]["telemetry"][0]["type"], "log");
        assert_eq!(data["custom"]["k"], 1);
        assert_eq!(data["level"], "warning");
    }
}
