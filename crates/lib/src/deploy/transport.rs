//! Upload of deployment requests to a remote repository.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Url;
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::APP_NAME;

use super::checksum::ChecksumAlgorithm;
use super::target::DeploymentTarget;

/// Errors reported by a [`Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
  #[error("invalid repository url '{url}': {message}")]
  InvalidUrl { url: String, message: String },

  #[error("failed to read '{}' for upload: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("upload to {url} failed: {source}")]
  Request {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("upload to {url} rejected with status {status}")]
  Rejected { url: String, status: u16 },

  #[error("deployment to repository '{repository}' failed: {message}")]
  Failed { repository: String, message: String },
}

/// A repository ready to receive uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRepository {
  pub id: String,
  /// Base url, always ending with `/`.
  pub url: Url,
}

impl DeploymentRepository {
  /// Absolute url of a repository-relative location.
  pub fn resolve_location(&self, location: &str) -> Result<Url, TransportError> {
    self.url.join(location).map_err(|e| TransportError::InvalidUrl {
      url: format!("{}{}", self.url, location),
      message: e.to_string(),
    })
  }
}

/// A checksum uploaded next to an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumUpload {
  pub algorithm: ChecksumAlgorithm,
  pub location: String,
  pub value: String,
}

/// One file to upload, with its checksum sidecars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployItem {
  pub file: PathBuf,
  /// Repository-relative location.
  pub location: String,
  pub checksums: Vec<ChecksumUpload>,
}

/// Everything uploaded by a single deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
  pub repository: DeploymentRepository,
  pub items: Vec<DeployItem>,
}

/// Moves deployment requests to a remote repository.
///
/// A request either succeeds as a whole or fails. Implementations check
/// every local input of a request before the first upload, so a missing
/// file or an unresolvable location never leaves a partial deployment.
#[async_trait]
pub trait Transport {
  /// Turn a parsed target into a repository handle.
  async fn resolve(&self, target: &DeploymentTarget) -> Result<DeploymentRepository, TransportError>;

  async fn deploy(&self, request: &DeployRequest) -> Result<(), TransportError>;
}

/// Parse and normalize a base url so that relative locations join below it.
pub fn normalize_base_url(url: &str) -> Result<Url, TransportError> {
  let mut normalized = url.trim().to_string();
  if !normalized.ends_with('/') {
    normalized.push('/');
  }
  Url::parse(&normalized).map_err(|e| TransportError::InvalidUrl {
    url: url.to_string(),
    message: e.to_string(),
  })
}

/// Basic authentication for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
  pub username: String,
  pub password: Option<String>,
}

/// Uploads with one HTTP `PUT` per file.
#[derive(Debug, Clone)]
pub struct HttpTransport {
  client: reqwest::Client,
  credentials: Option<Credentials>,
}

impl HttpTransport {
  pub fn new(client: reqwest::Client) -> Self {
    Self {
      client,
      credentials: None,
    }
  }

  pub fn with_credentials(mut self, credentials: Credentials) -> Self {
    self.credentials = Some(credentials);
    self
  }

  /// Open every file and resolve every url of `request`.
  async fn prepare(request: &DeployRequest) -> Result<Vec<Upload>, TransportError> {
    let mut uploads = Vec::new();
    for item in &request.items {
      let read_error = |source| TransportError::Read {
        path: item.file.clone(),
        source,
      };
      let file = tokio::fs::File::open(&item.file).await.map_err(read_error)?;
      let len = file.metadata().await.map_err(read_error)?.len();
      uploads.push(Upload {
        url: request.repository.resolve_location(&item.location)?,
        body: UploadBody::File { file, len },
      });

      for checksum in &item.checksums {
        uploads.push(Upload {
          url: request.repository.resolve_location(&checksum.location)?,
          body: UploadBody::Text(checksum.value.clone()),
        });
      }
    }
    Ok(uploads)
  }

  async fn put(&self, upload: Upload) -> Result<(), TransportError> {
    let shown = upload.url.to_string();
    let (body, len) = match upload.body {
      UploadBody::File { file, len } => (reqwest::Body::from(file), len),
      UploadBody::Text(text) => {
        let len = text.len() as u64;
        (reqwest::Body::from(text), len)
      }
    };
    let mut request = self
      .client
      .put(upload.url)
      .header(reqwest::header::USER_AGENT, user_agent())
      .header(reqwest::header::CONTENT_LENGTH, len)
      .body(body);
    if let Some(credentials) = &self.credentials {
      request = request.basic_auth(&credentials.username, credentials.password.as_ref());
    }

    let response = request.send().await.map_err(|source| TransportError::Request {
      url: shown.clone(),
      source,
    })?;
    let status = response.status();
    if !status.is_success() {
      return Err(TransportError::Rejected {
        url: shown,
        status: status.as_u16(),
      });
    }
    debug!(url = %shown, status = status.as_u16(), bytes = len, "uploaded");
    Ok(())
  }
}

/// One `PUT` of a prepared request.
struct Upload {
  url: Url,
  body: UploadBody,
}

enum UploadBody {
  /// Streamed from disk.
  File { file: tokio::fs::File, len: u64 },
  Text(String),
}

fn user_agent() -> String {
  format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION"))
}

impl Default for HttpTransport {
  fn default() -> Self {
    Self::new(reqwest::Client::new())
  }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn resolve(&self, target: &DeploymentTarget) -> Result<DeploymentRepository, TransportError> {
    Ok(DeploymentRepository {
      id: target.id.clone(),
      url: normalize_base_url(&target.url)?,
    })
  }

  async fn deploy(&self, request: &DeployRequest) -> Result<(), TransportError> {
    let uploads = Self::prepare(request).await?;
    info!(
      repository = %request.repository.id,
      files = request.items.len(),
      uploads = uploads.len(),
      "uploading"
    );
    for upload in uploads {
      self.put(upload).await?;
    }
    Ok(())
  }
}
