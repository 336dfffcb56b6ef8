//! Pipeline configuration.
//!
//! Both pipeline entry points take a fully populated configuration struct;
//! nothing is looked up implicitly. The CLI builds these from `rpmbuilder.toml`
//! plus command-line overrides.

use std::path::PathBuf;

use serde::Deserialize;

use crate::consts::{
  DEFAULT_CHANGELOG_EMAIL, DEFAULT_CHANGELOG_MESSAGE, DEFAULT_CHECKSUM_ALGORITHMS, DEFAULT_OMIT_CHECKSUMS_FOR_EXTENSIONS,
  DEFAULT_RPMBUILD,
};
use crate::macros::MacroSet;

/// Coordinates of the project being packaged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectInfo {
  pub group_id: String,
  pub artifact_id: String,
  pub version: String,
  /// Human readable name, used in log output only.
  #[serde(default)]
  pub name: Option<String>,
  /// Version of the upstream build wrapped inside the RPM.
  #[serde(default)]
  pub wrapped_build: Option<String>,
}

impl ProjectInfo {
  pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      group_id: group_id.into(),
      artifact_id: artifact_id.into(),
      version: version.into(),
      name: None,
      wrapped_build: None,
    }
  }

  pub fn with_wrapped_build(mut self, wrapped_build: impl Into<String>) -> Self {
    self.wrapped_build = Some(wrapped_build.into());
    self
  }

  pub fn display_name(&self) -> &str {
    self.name.as_deref().unwrap_or(&self.artifact_id)
  }
}

/// Changelog generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChangelogEntry {
  pub generate: bool,
  pub email: String,
  pub message: String,
}

impl Default for ChangelogEntry {
  fn default() -> Self {
    Self {
      generate: false,
      email: DEFAULT_CHANGELOG_EMAIL.to_string(),
      message: DEFAULT_CHANGELOG_MESSAGE.to_string(),
    }
  }
}

/// Source of the Lua patch hook run against the staged spec file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchHook {
  /// Lua source given directly in the configuration.
  Inline(String),
  /// Path to a Lua file.
  File(PathBuf),
}

impl PatchHook {
  /// Human readable label used in logs and errors.
  pub fn label(&self) -> String {
    match self {
      PatchHook::Inline(_) => "<inline>".to_string(),
      PatchHook::File(path) => path.display().to_string(),
    }
  }
}

/// Configuration of the `package` step.
#[derive(Debug, Clone)]
pub struct PackageConfig {
  pub project: ProjectInfo,
  /// Directory holding the spec file and sources.
  pub working_dir: PathBuf,
  /// Directory receiving built RPMs, the staged spec and the archive.
  pub output_dir: PathBuf,
  pub patch_hook: Option<PatchHook>,
  /// Bundle the produced RPMs into `<artifactId>-<version>.zip`.
  pub attach_zip: bool,
  pub changelog: Option<ChangelogEntry>,
  /// Unpack `<output>/dependency/noarch/*.noarch.rpm` before building.
  pub install_rpms: bool,
  /// Root directory the dependency RPMs are unpacked into.
  pub install_root: PathBuf,
  pub macros: MacroSet,
  /// rpmbuild executable.
  pub rpmbuild: String,
}

impl PackageConfig {
  pub fn new(project: ProjectInfo, working_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
    Self {
      project,
      working_dir: working_dir.into(),
      output_dir: output_dir.into(),
      patch_hook: None,
      attach_zip: true,
      changelog: None,
      install_rpms: false,
      install_root: PathBuf::from("/"),
      macros: MacroSet::new(),
      rpmbuild: DEFAULT_RPMBUILD.to_string(),
    }
  }

  /// Whether changelog generation was requested.
  pub fn generates_changelog(&self) -> bool {
    self.changelog.as_ref().is_some_and(|c| c.generate)
  }
}

/// Configuration of the `deploy` step.
#[derive(Debug, Clone)]
pub struct DeployConfig {
  pub project: ProjectInfo,
  pub output_dir: PathBuf,
  /// Target repository, `id::url` (or legacy `id::default::url`).
  pub repository: Option<String>,
  pub skip: bool,
  /// Comma separated checksum algorithm names.
  pub checksum_algorithms: String,
  /// Comma separated file suffixes that are uploaded without checksums.
  pub omit_checksums_for_extensions: String,
}

impl DeployConfig {
  pub fn new(project: ProjectInfo, output_dir: impl Into<PathBuf>) -> Self {
    Self {
      project,
      output_dir: output_dir.into(),
      repository: None,
      skip: false,
      checksum_algorithms: DEFAULT_CHECKSUM_ALGORITHMS.to_string(),
      omit_checksums_for_extensions: DEFAULT_OMIT_CHECKSUMS_FOR_EXTENSIONS.to_string(),
    }
  }
}
