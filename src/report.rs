use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt;

/// Severity of a report or telemetry event, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Default for Level {
    fn default() -> Self {
        Level::Error
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Level::Error,
            log::Level::Warn => Level::Warning,
            log::Level::Info => Level::Info,
            log::Level::Debug | log::Level::Trace => Level::Debug,
        }
    }
}

/// Error wrapper produced by framework error hooks.
///
/// The hook adds its own context around the error the application raised;
/// only the original is reported.
#[derive(Debug)]
pub struct WrappedError {
    context: String,
    original: Box<dyn Error + Send + Sync + 'static>,
}

impl WrappedError {
    pub fn new<E>(context: &str, original: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        Self {
            context: context.to_owned(),
            original: original.into(),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn original(&self) -> &(dyn Error + 'static) {
        &*self.original
    }
}

impl fmt::Display for WrappedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.original)
    }
}

impl Error for WrappedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.original())
    }
}

/// Unwraps one framework wrapper layer, if there is one.
pub fn original_error<'a>(err: &'a (dyn Error + 'static)) -> &'a (dyn Error + 'static) {
    match err.downcast_ref::<WrappedError>() {
        Some(wrapped) => wrapped.original(),
        None => err,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colno: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl Frame {
    pub fn new(filename: &str, lineno: u32, colno: u32) -> Self {
        Self {
            filename: filename.to_owned(),
            lineno: Some(lineno),
            colno: Some(colno),
            method: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    pub class: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub frames: Vec<Frame>,
    pub exception: ExceptionInfo,
}

impl Trace {
    fn from_error<E: Error + ?Sized>(err: &E) -> Self {
        Self {
            frames: vec![],
            exception: ExceptionInfo {
                class: parse_type_from_debug(err),
                message: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportBody {
    /// Exception chain, outermost first.
    Trace(Vec<Trace>),
    Message(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub level: Level,
    pub body: ReportBody,
    pub custom: Map<String, Value>,
    /// Nothing in the application handled it; see `capture_uncaught`.
    pub uncaught: bool,
}

impl Report {
    pub fn message(level: Level, message: &str) -> Self {
        Self {
            level,
            body: ReportBody::Message(message.to_owned()),
            custom: Map::new(),
            uncaught: false,
        }
    }

    /// Builds an error report from `err` after unwrapping a framework wrapper.
    /// The `source()` chain becomes the trace chain.
    pub fn from_error(err: &(dyn Error + 'static)) -> Self {
        let err = original_error(err);
        let mut chain = vec![Trace::from_error(err)];
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(Trace::from_error(cause));
            source = cause.source();
        }
        Self {
            level: Level::Error,
            body: ReportBody::Trace(chain),
            custom: Map::new(),
            uncaught: false,
        }
    }

    /// Builds a manual report from loosely typed arguments.
    ///
    /// Strings are joined into the message, objects are merged into `custom`,
    /// anything else is collected under `custom.extra`.
    pub fn from_values(level: Level, data: &[Value]) -> Self {
        let mut message = Vec::new();
        let mut custom = Map::new();
        let mut extra = Vec::new();
        for value in data {
            match value {
                Value::String(s) => message.push(s.as_str()),
                Value::Object(map) => {
                    for (k, v) in map {
                        custom.insert(k.clone(), v.clone());
                    }
                }
                other => extra.push(other.clone()),
            }
        }
        if !extra.is_empty() {
            custom.insert("extra".to_owned(), Value::Array(extra));
        }
        let message = if message.is_empty() {
            "Item sent with null or missing arguments.".to_owned()
        } else {
            message.join(" ")
        };
        Self {
            level,
            body: ReportBody::Message(message),
            custom,
            uncaught: false,
        }
    }

    /// Builds the report for a panic that nothing caught, with its location
    /// as the only frame.
    pub fn uncaught(message: &str, location: Option<Frame>) -> Self {
        Self {
            level: Level::Critical,
            body: ReportBody::Trace(vec![Trace {
                frames: location.into_iter().collect(),
                exception: ExceptionInfo {
                    class: "panic".to_owned(),
                    message: message.to_owned(),
                },
            }]),
            custom: Map::new(),
            uncaught: true,
        }
    }

    /// Attaches stack frames to the outermost trace. No-op for message reports.
    pub fn with_frames(mut self, frames: Vec<Frame>) -> Self {
        if let ReportBody::Trace(chain) = &mut self.body {
            if let Some(first) = chain.first_mut() {
                first.frames = frames;
            }
        }
        self
    }
}

fn parse_type_from_debug<D: fmt::Debug + ?Sized>(d: &D) -> String {
    let dbg = format!("{:?}", d);
    dbg.split(&[' ', '(', '{', '\r', '\n'][..])
        .next()
        .unwrap_or(&dbg)
        .trim()
        .to_owned()
}
