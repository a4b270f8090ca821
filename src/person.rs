use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdentityError {
    #[error("no user is signed in")]
    MissingUser,
    #[error("user has no id")]
    MissingId,
    #[error("user has no email")]
    MissingEmail,
}

/// User record as handed over by the application. Fields stay empty until
/// the session is authenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserInfo {
    pub fn new(id: &str, email: &str) -> Self {
        Self {
            id: Some(id.to_owned()),
            email: Some(email.to_owned()),
        }
    }
}

/// Identity attached to every report under `person`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub email: String,
    pub username: String,
}

impl Person {
    pub fn from_user(user: Option<&UserInfo>) -> Result<Self, IdentityError> {
        let user = user.ok_or(IdentityError::MissingUser)?;
        let id = non_empty(&user.id).ok_or(IdentityError::MissingId)?;
        let email = non_empty(&user.email).ok_or(IdentityError::MissingEmail)?;
        Ok(Self {
            id: id.to_owned(),
            email: email.to_owned(),
            username: email.to_owned(),
        })
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}
