//! Post-build source map publishing.
//!
//! A run goes through fixed phases: guard, discover, upload, delete maps,
//! strip references. Each phase handles every artifact concurrently and
//! completes for all of them before the next one starts. Only a failure to
//! strip a reference aborts the run; upload and delete failures are recorded
//! on the artifact and logged.

use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use thiserror::Error;

use crate::config::TokenPlaceholder;
use crate::limits::SOURCEMAP_ENDPOINT;

pub mod artifact;
pub mod revision;
pub mod truncate;
pub mod upload;

pub use self::artifact::{discover, public_url, BuildArtifact};
pub use self::revision::{resolve_revision, NO_REVISION};
pub use self::truncate::strip_map_reference;
pub use self::upload::{HttpUploader, SourceMapUploader, UploadError, UploadRequest};

pub const DEFAULT_BUILD_DIR: &str = "dist/client";
pub const DEFAULT_SERVER_URL: &str = "localhost";

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PublishError {
    #[error("ROLLBAR_ACCESS_TOKEN is not set")]
    MissingAccessToken,
    #[error("could not list {}: {}", .dir.display(), .source)]
    Discover { dir: PathBuf, source: io::Error },
    #[error("could not strip source map reference from {}: {}", .path.display(), .source)]
    Strip { path: PathBuf, source: io::Error },
}

#[derive(Clone)]
pub struct PublisherConfig {
    /// Deployment target; a `localhost` URL skips the run.
    pub server_url: String,
    pub access_token: Option<String>,
    /// Revision override, normally set by the CI environment.
    pub source_version: Option<String>,
    pub build_dir: PathBuf,
    pub repo_dir: PathBuf,
    pub endpoint: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_owned(),
            access_token: None,
            source_version: None,
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            repo_dir: PathBuf::from("."),
            endpoint: SOURCEMAP_ENDPOINT.to_owned(),
        }
    }
}

impl PublisherConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads `SERVER_URL`, `ROLLBAR_ACCESS_TOKEN`, `SOURCE_VERSION`,
    /// `SOURCEMAP_DIR` and `SOURCEMAP_ENDPOINT` through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            server_url: lookup("SERVER_URL").unwrap_or(defaults.server_url),
            access_token: lookup("ROLLBAR_ACCESS_TOKEN").filter(|t| !t.is_empty()),
            source_version: lookup("SOURCE_VERSION"),
            build_dir: lookup("SOURCEMAP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.build_dir),
            repo_dir: defaults.repo_dir,
            endpoint: lookup("SOURCEMAP_ENDPOINT").unwrap_or(defaults.endpoint),
        }
    }

    pub fn with_build_dir(self, build_dir: &Path) -> Self {
        Self {
            build_dir: build_dir.to_owned(),
            ..self
        }
    }

    pub fn with_repo_dir(self, repo_dir: &Path) -> Self {
        Self {
            repo_dir: repo_dir.to_owned(),
            ..self
        }
    }
}

impl std::fmt::Debug for PublisherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("PublisherConfig")
            .field("server_url", &self.server_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| TokenPlaceholder),
            )
            .field("source_version", &self.source_version)
            .field("build_dir", &self.build_dir)
            .field("repo_dir", &self.repo_dir)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

pub fn is_localhost(server_url: &str) -> bool {
    server_url.contains("localhost")
}

#[derive(Debug)]
pub enum Outcome {
    SkippedLocalhost,
    Published(PublishSummary),
}

#[derive(Debug, Clone)]
pub struct PublishSummary {
    pub revision: String,
    pub artifacts: Vec<BuildArtifact>,
}

impl PublishSummary {
    pub fn failed_uploads(&self) -> impl Iterator<Item = &BuildArtifact> {
        self.artifacts.iter().filter(|a| !a.is_uploaded())
    }

    pub fn is_complete(&self) -> bool {
        self.artifacts
            .iter()
            .all(|a| a.is_uploaded() && a.map_cleaned && a.source_cleaned)
    }

    pub fn log(&self) {
        log::info!(
            "Published {} source maps for revision {}",
            self.artifacts.len(),
            self.revision
        );
        for artifact in &self.artifacts {
            if let Some(error) = &artifact.error {
                log::warn!("{} was not uploaded: {}", artifact.js_file.display(), error);
            }
            if !artifact.map_cleaned {
                log::warn!("{} was not deleted", artifact.map_file.display());
            }
        }
    }
}

#[derive(Debug)]
pub struct Publisher<U> {
    config: PublisherConfig,
    uploader: U,
}

impl<U: SourceMapUploader> Publisher<U> {
    pub fn new(config: PublisherConfig, uploader: U) -> Self {
        Self { config, uploader }
    }

    pub fn run(&self) -> Result<Outcome, PublishError> {
        if is_localhost(&self.config.server_url) {
            log::info!("Target is localhost, skipping source map upload");
            return Ok(Outcome::SkippedLocalhost);
        }
        let access_token = self
            .config
            .access_token
            .as_deref()
            .ok_or(PublishError::MissingAccessToken)?;

        let revision = resolve_revision(
            self.config.source_version.as_deref(),
            &self.config.repo_dir,
        );
        log::info!("Revision {}", revision);

        let mut artifacts =
            discover(&self.config.build_dir).map_err(|source| PublishError::Discover {
                dir: self.config.build_dir.clone(),
                source,
            })?;

        log::info!("Uploading {} source maps", artifacts.len());
        self.upload_all(&mut artifacts, access_token, &revision);
        log::info!("Finished uploading source maps");

        delete_maps(&mut artifacts);
        strip_references(&mut artifacts)?;

        Ok(Outcome::Published(PublishSummary {
            revision,
            artifacts,
        }))
    }

    fn upload_all(&self, artifacts: &mut [BuildArtifact], access_token: &str, revision: &str) {
        let uploader = &self.uploader;
        for_each_artifact(artifacts, |artifact| {
            log::info!(
                "Uploading {} as {} (version {})",
                artifact.map_file.display(),
                artifact.server_url,
                revision
            );
            let request = UploadRequest {
                access_token,
                version: revision,
                minified_url: &artifact.server_url,
                source_map: &artifact.map_file,
            };
            match uploader.upload(&request) {
                Ok(()) => log::info!("Uploaded {}", artifact.map_file.display()),
                Err(e) => {
                    log::error!("Error uploading {}: {}", artifact.js_file.display(), e);
                    artifact.error = Some(e.to_string());
                }
            }
        });
    }
}

fn delete_maps(artifacts: &mut [BuildArtifact]) {
    for_each_artifact(artifacts, |artifact| {
        match std::fs::remove_file(&artifact.map_file) {
            Ok(()) => {
                log::info!("Deleted {}", artifact.map_file.display());
                artifact.map_cleaned = true;
            }
            Err(e) => log::warn!("Error deleting {}: {}", artifact.map_file.display(), e),
        }
    });
}

fn strip_references(artifacts: &mut [BuildArtifact]) -> Result<(), PublishError> {
    let results = for_each_artifact(artifacts, |artifact| {
        match strip_map_reference(&artifact.js_file) {
            Ok(_) => {
                log::info!(
                    "Removed source map reference from {}",
                    artifact.js_file.display()
                );
                artifact.source_cleaned = true;
                Ok(())
            }
            Err(source) => {
                log::error!("Error truncating {}: {}", artifact.js_file.display(), source);
                Err(PublishError::Strip {
                    path: artifact.js_file.clone(),
                    source,
                })
            }
        }
    });
    results.into_iter().collect()
}

/// Runs `work` for every artifact on its own thread and waits for all of them.
/// Results come back in artifact order.
fn for_each_artifact<T, F>(artifacts: &mut [BuildArtifact], work: F) -> Vec<T>
where
    F: Fn(&mut BuildArtifact) -> T + Sync,
    T: Send,
{
    let work = &work;
    thread::scope(|s| {
        let handles: Vec<_> = artifacts
            .iter_mut()
            .map(|artifact| s.spawn(move || work(artifact)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    })
}
