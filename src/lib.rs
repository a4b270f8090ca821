//! Rollbar integration for a browser client.
//!
//! Two independent halves:
//!
//! * [`ErrorReporter`] funnels application errors to a [`Collector`],
//!   stamping environment, host, and user onto every item. [`HttpCollector`]
//!   delivers to the vendor's item endpoint. [`BreadcrumbLogger`] and
//!   [`install_panic_hook`] feed it log breadcrumbs and panics.
//! * [`sourcemaps`] publishes source maps after a production build and
//!   removes them from the shipped artifacts (see the `upload-sourcemaps`
//!   binary).
//!
//! Both rely on the same convention: maps are uploaded for
//! `https://dynamichost/<file>`, and [`FrameRewriter`] rewrites frames from
//! any deployed domain to that host at report time.

mod breadcrumbs;
mod collector;
mod config;
mod environment;
mod limits;
mod options;
mod panic_hook;
mod payload;
mod person;
mod report;
mod reporter;
mod scrub;
mod telemetry;
mod transform;

pub mod sourcemaps;

pub use crate::breadcrumbs::BreadcrumbLogger;
pub use crate::collector::{Collector, CollectorError, HttpCollector};
pub use crate::config::{ConfigError, ReporterConfig};
pub use crate::environment::{Environment, ParseEnvironmentError};
pub use crate::limits::{ITEM_ENDPOINT, SOURCEMAP_ENDPOINT};
pub use crate::options::{ParseToggleError, ReportingOptions, Toggle};
pub use crate::panic_hook::install_panic_hook;
pub use crate::payload::{
    AutoInstrument, ClientInfo, CollectorConfig, JavascriptInfo, PayloadTemplate, ServerInfo,
};
pub use crate::person::{IdentityError, Person, UserInfo};
pub use crate::report::{
    original_error, ExceptionInfo, Frame, Level, Report, ReportBody, Trace, WrappedError,
};
pub use crate::reporter::{current_host, is_local_host, ErrorReporter};
pub use crate::scrub::{scrub, DEFAULT_SCRUB_FIELDS, REDACTED};
pub use crate::telemetry::{TelemetryEvent, TelemetryFilter, DEFAULT_ANALYTICS_PREFIX};
pub use crate::transform::{
    FrameRewriter, TransformError, DEFAULT_DOMAIN_SUFFIX, PLACEHOLDER_HOST,
};
