use attohttpc::{MultipartBuilder, MultipartFile};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum UploadError {
    #[error("could not read {}: {}", .path.display(), .source)]
    Read { path: PathBuf, source: io::Error },
    #[error("{0}")]
    Transport(#[from] attohttpc::Error),
    #[error("collector answered {status} {reason}")]
    Status { status: u16, reason: String },
}

/// Form fields of one source map upload.
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    pub access_token: &'a str,
    pub version: &'a str,
    pub minified_url: &'a str,
    pub source_map: &'a Path,
}

/// Sends one source map to the collector. Called concurrently for every
/// artifact of a build.
pub trait SourceMapUploader: Sync {
    fn upload(&self, request: &UploadRequest<'_>) -> Result<(), UploadError>;
}

impl<U: SourceMapUploader + ?Sized> SourceMapUploader for &U {
    fn upload(&self, request: &UploadRequest<'_>) -> Result<(), UploadError> {
        (**self).upload(request)
    }
}

/// Multipart upload to the source map ingestion endpoint. No retries.
#[derive(Debug, Clone)]
pub struct HttpUploader {
    endpoint: String,
}

impl HttpUploader {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
        }
    }
}

impl SourceMapUploader for HttpUploader {
    fn upload(&self, request: &UploadRequest<'_>) -> Result<(), UploadError> {
        let content = fs::read(request.source_map).map_err(|source| UploadError::Read {
            path: request.source_map.to_owned(),
            source,
        })?;
        let file_name = request
            .source_map
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let form = MultipartBuilder::new()
            .with_text("access_token", request.access_token)
            .with_text("version", request.version)
            .with_text("minified_url", request.minified_url)
            .with_file(MultipartFile::new("source_map", &content).with_filename(&file_name))
            .build()?;
        let resp = attohttpc::post(&self.endpoint).body(form).send()?;

        let status = resp.status();
        if status.as_u16() != 200 {
            return Err(UploadError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_owned(),
            });
        }
        Ok(())
    }
}
