use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Revision reported when neither an override nor a checkout is available.
pub const NO_REVISION: &str = "-none-";

#[derive(Error, Debug)]
pub enum RevisionError {
    #[error("could not run git: {0}")]
    Spawn(#[from] io::Error),
    #[error("git rev-parse failed: {0}")]
    Git(String),
}

/// Picks the revision identifier for uploaded maps.
///
/// `source_version` wins when set and non-empty; otherwise the short hash of
/// `HEAD` in `repo_dir`; otherwise [`NO_REVISION`].
pub fn resolve_revision(source_version: Option<&str>, repo_dir: &Path) -> String {
    if let Some(version) = source_version.filter(|v| !v.is_empty()) {
        log::info!("Getting revision from environment variable {}", version);
        return version.to_owned();
    }
    match git_short_head(repo_dir) {
        Ok(revision) => revision,
        Err(e) => {
            log::debug!("no git revision available: {}", e);
            NO_REVISION.to_owned()
        }
    }
}

pub fn git_short_head(repo_dir: &Path) -> Result<String, RevisionError> {
    let output = Command::new("git")
        .args(&["rev-parse", "--short", "HEAD"])
        .current_dir(repo_dir)
        .stdin(Stdio::null())
        .output()?;
    if !output.status.success() {
        return Err(RevisionError::Git(
            String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        ));
    }
    let revision = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    if revision.is_empty() {
        return Err(RevisionError::Git("empty output".to_owned()));
    }
    Ok(revision)
}
