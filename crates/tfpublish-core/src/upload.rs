//! Transfer of release files to the pre-signed URLs handed out by the registry.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use tokio::fs::File;
use tokio::process::Command;
use tokio_util::io::ReaderStream;

use crate::{PublishError, USER_AGENT};

/// Sends one local file to one pre-signed URL.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload `path` to `url`.
    async fn upload(&self, url: &str, path: &Path) -> Result<(), PublishError>;
}

/// Streams the file as the body of an HTTP `PUT`.
#[derive(Debug, Clone)]
pub struct HttpUploader {
    http: Client,
}

impl HttpUploader {
    /// # Errors
    ///
    /// Returns [`PublishError::Http`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, PublishError> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, url: &str, path: &Path) -> Result<(), PublishError> {
        tracing::info!("Uploading file: {}", path.display());

        let file = File::open(path)
            .await
            .map_err(|e| PublishError::upload(path, e))?;
        let len = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        let response = self
            .http
            .put(url)
            .header(CONTENT_LENGTH, len)
            .body(body)
            .send()
            .await
            .map_err(|e| PublishError::upload(path, e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PublishError::upload(
                path,
                format!("{status}: {}", detail.trim()),
            ));
        }

        tracing::debug!("Uploaded {} bytes from {}", len, path.display());
        Ok(())
    }
}

/// Hands the transfer to `curl -T`. Anything curl prints to stderr counts as failure.
#[derive(Debug, Clone)]
pub struct CurlUploader {
    program: PathBuf,
}

impl Default for CurlUploader {
    fn default() -> Self {
        Self {
            program: PathBuf::from("curl"),
        }
    }
}

impl CurlUploader {
    /// Use `program` instead of the `curl` on `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Uploader for CurlUploader {
    async fn upload(&self, url: &str, path: &Path) -> Result<(), PublishError> {
        tracing::info!("Uploading file: {}", path.display());

        let output = Command::new(&self.program)
            .args(["-s", "-S", "-f", "-T"])
            .arg(path)
            .arg(url)
            .output()
            .await
            .map_err(|e| {
                PublishError::upload(path, format!("failed to run {}: {e}", self.program.display()))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            return Err(PublishError::upload(path, stderr.trim()));
        }
        if !output.status.success() {
            return Err(PublishError::upload(
                path,
                format!("{} exited with {}", self.program.display(), output.status),
            ));
        }
        Ok(())
    }
}
