//! In-memory transport for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::target::DeploymentTarget;
use super::transport::{DeployRequest, DeploymentRepository, Transport, TransportError, normalize_base_url};

/// Records every request; optionally fails them all.
#[derive(Debug, Default)]
pub struct MemoryTransport {
  pub requests: Mutex<Vec<DeployRequest>>,
  pub fail_with: Option<String>,
}

impl MemoryTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn failing(message: &str) -> Self {
    Self {
      fail_with: Some(message.to_string()),
      ..Self::default()
    }
  }

  pub fn requests(&self) -> Vec<DeployRequest> {
    self.requests.lock().unwrap().clone()
  }
}

#[async_trait]
impl Transport for MemoryTransport {
  async fn resolve(&self, target: &DeploymentTarget) -> Result<DeploymentRepository, TransportError> {
    Ok(DeploymentRepository {
      id: target.id.clone(),
      url: normalize_base_url(&target.url)?,
    })
  }

  async fn deploy(&self, request: &DeployRequest) -> Result<(), TransportError> {
    if let Some(message) = &self.fail_with {
      return Err(TransportError::Failed {
        repository: request.repository.id.clone(),
        message: message.clone(),
      });
    }
    self.requests.lock().unwrap().push(request.clone());
    Ok(())
  }
}
