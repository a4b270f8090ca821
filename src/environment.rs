use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown environment {0:?}, expected development, staging, or production")]
pub struct ParseEnvironmentError(String);

/// Deployment environment attached to every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl FromStr for Environment {
    type Err = ParseEnvironmentError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "development" => Environment::Development,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            _ => return Err(ParseEnvironmentError(s.to_owned())),
        })
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Environment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Environment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{Error, Unexpected};

        let s = Cow::<str>::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(|_| {
            Error::invalid_value(
                Unexpected::Str(&s),
                &"one of development, staging, or production",
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        assert_eq!("staging".parse(), Ok(Environment::Staging));
        assert_eq!("production".parse(), Ok(Environment::Production));
        assert!("prod".parse::<Environment>().is_err());
    }

    #[test]
    fn serializes_as_lowercase_string() {
        let json = serde_json::to_string(&Environment::Production).unwrap();
        assert_eq!(json, r#""production""#);
        let env: Environment = serde_json::from_str(r#""development""#).unwrap();
        assert_eq!(env, Environment::Development);
        assert!(serde_json::from_str::<Environment>(r#""qa""#).is_err());
    }
}
