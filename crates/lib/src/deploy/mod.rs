//! Publishing of built RPMs to a remote repository.

mod checksum;
mod layout;
mod publish;
mod target;
mod transport;

pub use checksum::{ChecksumAlgorithm, is_checksum_extension};
pub use layout::{
  ArtifactCoordinates, ChecksumLocation, GenericLayout, LayoutPolicy, MetadataCoordinates, RepositoryLayout,
  base_version,
};
pub use publish::{build_request, publish};
pub use target::DeploymentTarget;
pub use transport::{
  ChecksumUpload, Credentials, DeployItem, DeployRequest, DeploymentRepository, HttpTransport, Transport,
  TransportError, normalize_base_url,
};

#[cfg(test)]
pub(crate) mod fakes;
