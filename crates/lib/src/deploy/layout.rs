//! Repository layout for generic (filename preserving) deployments.
//!
//! Artifacts keep their own file name under the usual
//! `<group>/<artifactId>/<baseVersion>/` directory instead of a name
//! synthesized from coordinates.

use std::collections::BTreeSet;

use crate::config::DeployConfig;
use crate::error::{Error, Result};

use super::checksum::{ChecksumAlgorithm, is_checksum_extension};

/// Coordinates of one uploaded artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCoordinates {
  pub group_id: String,
  pub artifact_id: String,
  pub base_version: String,
  /// File name of the artifact on disk.
  pub file_name: String,
}

impl ArtifactCoordinates {
  pub fn new(group_id: &str, artifact_id: &str, version: &str, file_name: &str) -> Self {
    Self {
      group_id: group_id.to_string(),
      artifact_id: artifact_id.to_string(),
      base_version: base_version(version),
      file_name: file_name.to_string(),
    }
  }
}

/// Coordinates of a repository metadata file; any segment may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataCoordinates {
  pub group_id: String,
  pub artifact_id: String,
  pub version: String,
  /// Metadata file name, e.g. `maven-metadata.xml`.
  pub kind: String,
}

/// Where a checksum sidecar of an upload goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumLocation {
  pub algorithm: ChecksumAlgorithm,
  /// Relative location, `<artifact location>.<extension>`.
  pub location: String,
}

/// Maps artifacts and metadata to repository-relative locations.
pub trait RepositoryLayout {
  fn location(&self, artifact: &ArtifactCoordinates) -> String;

  fn metadata_location(&self, metadata: &MetadataCoordinates) -> String;

  fn checksum_algorithms(&self) -> &[ChecksumAlgorithm];

  /// Whether a file with this name gets checksum sidecars.
  fn has_checksums(&self, file_name: &str) -> bool;

  /// Checksum sidecars for an artifact stored at `location`.
  fn checksum_locations(&self, file_name: &str, location: &str) -> Vec<ChecksumLocation> {
    if !self.has_checksums(file_name) {
      return Vec::new();
    }
    self
      .checksum_algorithms()
      .iter()
      .map(|&algorithm| ChecksumLocation {
        algorithm,
        location: format!("{}.{}", location, algorithm.extension()),
      })
      .collect()
  }
}

/// Checksum settings shared by every upload to a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPolicy {
  algorithms: Vec<ChecksumAlgorithm>,
  omit_for_extensions: BTreeSet<String>,
}

impl LayoutPolicy {
  /// Build a policy. Every skip extension must start with `.`.
  pub fn new(algorithms: Vec<ChecksumAlgorithm>, omit_for_extensions: &[&str]) -> Result<Self> {
    let omit_for_extensions: BTreeSet<String> = omit_for_extensions
      .iter()
      .map(|e| e.trim())
      .filter(|e| !e.is_empty())
      .map(str::to_string)
      .collect();

    let illegal: Vec<&str> = omit_for_extensions
      .iter()
      .filter(|e| !e.starts_with('.'))
      .map(String::as_str)
      .collect();
    if !illegal.is_empty() {
      return Err(Error::Configuration(format!(
        "omit_checksums_for_extensions contains illegal values: [{}] (all entries must start with '.' (dot))",
        illegal.join(", ")
      )));
    }

    Ok(Self {
      algorithms,
      omit_for_extensions,
    })
  }

  /// Build a policy from the comma separated settings of a deploy configuration.
  pub fn from_config(config: &DeployConfig) -> Result<Self> {
    let algorithms = ChecksumAlgorithm::parse_list(&config.checksum_algorithms)?;
    let extensions: Vec<&str> = config.omit_checksums_for_extensions.split(',').collect();
    Self::new(algorithms, &extensions)
  }

  pub fn algorithms(&self) -> &[ChecksumAlgorithm] {
    &self.algorithms
  }

  pub fn omit_for_extensions(&self) -> impl Iterator<Item = &str> {
    self.omit_for_extensions.iter().map(String::as_str)
  }
}

/// The filename preserving layout.
#[derive(Debug, Clone)]
pub struct GenericLayout {
  policy: LayoutPolicy,
}

impl GenericLayout {
  pub fn new(policy: LayoutPolicy) -> Self {
    Self { policy }
  }

  pub fn policy(&self) -> &LayoutPolicy {
    &self.policy
  }
}

impl RepositoryLayout for GenericLayout {
  fn location(&self, artifact: &ArtifactCoordinates) -> String {
    format!(
      "{}/{}/{}/{}",
      artifact.group_id.replace('.', "/"),
      artifact.artifact_id,
      artifact.base_version,
      artifact.file_name
    )
  }

  fn metadata_location(&self, metadata: &MetadataCoordinates) -> String {
    let mut path = String::with_capacity(128);
    if !metadata.group_id.is_empty() {
      path.push_str(&metadata.group_id.replace('.', "/"));
      path.push('/');
      if !metadata.artifact_id.is_empty() {
        path.push_str(&metadata.artifact_id);
        path.push('/');
        if !metadata.version.is_empty() {
          path.push_str(&metadata.version);
          path.push('/');
        }
      }
    }
    path.push_str(&metadata.kind);
    path
  }

  fn checksum_algorithms(&self) -> &[ChecksumAlgorithm] {
    &self.policy.algorithms
  }

  fn has_checksums(&self, file_name: &str) -> bool {
    if self.policy.omit_for_extensions().any(|ext| file_name.ends_with(ext)) {
      return false;
    }
    let extension = file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    !is_checksum_extension(extension)
  }
}

/// The base version of a possibly timestamped snapshot version.
///
/// `1.0-20240101.120000-3` becomes `1.0-SNAPSHOT`; anything else is unchanged.
pub fn base_version(version: &str) -> String {
  let Some((head, build)) = version.rsplit_once('-') else {
    return version.to_string();
  };
  let Some((prefix, timestamp)) = head.rsplit_once('-') else {
    return version.to_string();
  };
  let is_timestamp = timestamp.len() == 15
    && timestamp.as_bytes()[8] == b'.'
    && timestamp
      .bytes()
      .enumerate()
      .all(|(i, b)| i == 8 || b.is_ascii_digit());
  let is_build = !build.is_empty() && build.bytes().all(|b| b.is_ascii_digit());

  if is_timestamp && is_build {
    format!("{}-SNAPSHOT", prefix)
  } else {
    version.to_string()
  }
}
