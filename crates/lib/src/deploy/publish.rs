//! Assembly and submission of deployment requests.

use tracing::info;

use crate::collect::Artifact;
use crate::config::ProjectInfo;
use crate::error::Result;

use super::layout::{ArtifactCoordinates, RepositoryLayout};
use super::transport::{ChecksumUpload, DeployItem, DeployRequest, DeploymentRepository, Transport};
use super::target::DeploymentTarget;

/// Build one request covering every artifact, computing checksums as the layout requires.
pub fn build_request(
  layout: &dyn RepositoryLayout,
  repository: DeploymentRepository,
  project: &ProjectInfo,
  artifacts: &[Artifact],
) -> Result<DeployRequest> {
  let mut items = Vec::with_capacity(artifacts.len());
  for artifact in artifacts {
    let file_name = artifact.file_name();
    let coordinates = ArtifactCoordinates::new(&project.group_id, &project.artifact_id, &project.version, &file_name);
    let location = layout.location(&coordinates);

    let mut checksums = Vec::new();
    for checksum in layout.checksum_locations(&file_name, &location) {
      checksums.push(ChecksumUpload {
        algorithm: checksum.algorithm,
        value: checksum.algorithm.digest_file(&artifact.path)?,
        location: checksum.location,
      });
    }

    items.push(DeployItem {
      file: artifact.path.clone(),
      location,
      checksums,
    });
  }
  Ok(DeployRequest { repository, items })
}

/// Resolve `target` and deploy every artifact in a single request.
///
/// Transport failures are returned unchanged.
pub async fn publish<T: Transport + ?Sized>(
  transport: &T,
  layout: &dyn RepositoryLayout,
  target: &DeploymentTarget,
  project: &ProjectInfo,
  artifacts: &[Artifact],
) -> Result<DeployRequest> {
  let repository = transport.resolve(target).await?;
  info!(id = %repository.id, url = %repository.url, "resolved deployment repository");

  let request = build_request(layout, repository, project, artifacts)?;
  let files: Vec<String> = artifacts.iter().map(|a| a.path.display().to_string()).collect();
  info!(files = ?files, url = %target.url, "deploying");

  transport.deploy(&request).await?;
  Ok(request)
}
