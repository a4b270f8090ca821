use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const REPORTING_PARAM: &str = "rollbar";
const BREADCRUMB_LOGGING_PARAM: &str = "rollbarLog";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected on or off, got {0:?}")]
pub struct ParseToggleError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Toggle::On
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Toggle::On => "on",
            Toggle::Off => "off",
        }
    }
}

impl From<bool> for Toggle {
    fn from(on: bool) -> Self {
        if on {
            Toggle::On
        } else {
            Toggle::Off
        }
    }
}

impl FromStr for Toggle {
    type Err = ParseToggleError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "on" => Toggle::On,
            "off" => Toggle::Off,
            _ => return Err(ParseToggleError(s.to_owned())),
        })
    }
}

impl fmt::Display for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime switches accepted by `ErrorReporter::configure_from_options`.
///
/// `None` leaves the corresponding setting as it is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportingOptions {
    pub reporting: Option<Toggle>,
    pub breadcrumb_logging: Option<Toggle>,
}

impl ReportingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reporting(self, reporting: Toggle) -> Self {
        Self {
            reporting: Some(reporting),
            ..self
        }
    }

    pub fn with_breadcrumb_logging(self, breadcrumb_logging: Toggle) -> Self {
        Self {
            breadcrumb_logging: Some(breadcrumb_logging),
            ..self
        }
    }

    /// Reads the options from a URL query string such as `rollbar=off&rollbarLog=on`.
    ///
    /// A leading `?` is accepted. Unknown parameters and values other than
    /// `on`/`off` are skipped.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut options = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                REPORTING_PARAM => &mut options.reporting,
                BREADCRUMB_LOGGING_PARAM => &mut options.breadcrumb_logging,
                _ => continue,
            };
            match value.parse::<Toggle>() {
                Ok(toggle) => *slot = Some(toggle),
                Err(e) => log::debug!("ignoring query parameter {}: {}", key, e),
            }
        }
        options
    }

    pub fn is_empty(&self) -> bool {
        self.reporting.is_none() && self.breadcrumb_logging.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_parameters() {
        let options = ReportingOptions::from_query("?rollbar=off&rollbarLog=on&page=2");
        assert_eq!(options.reporting, Some(Toggle::Off));
        assert_eq!(options.breadcrumb_logging, Some(Toggle::On));
    }

    #[test]
    fn ignores_bad_values() {
        let options = ReportingOptions::from_query("rollbar=maybe");
        assert!(options.is_empty());
        assert_eq!(ReportingOptions::from_query(""), ReportingOptions::new());
    }

    #[test]
    fn builder_sets_only_given_switch() {
        let options = ReportingOptions::new().with_breadcrumb_logging(Toggle::Off);
        assert_eq!(options.reporting, None);
        assert_eq!(options.breadcrumb_logging, Some(Toggle::Off));
        assert!(Toggle::from(true).is_on());
    }
}
