//! Loading of `rpmbuilder.toml` and merging of command-line overrides.
//!
//! Relative paths in the file are resolved against the file's directory.
//! Command-line values take precedence over file values.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::debug;

use rpmbuilder_lib::config::{ChangelogEntry, DeployConfig, PackageConfig, PatchHook, ProjectInfo};
use rpmbuilder_lib::consts::DEFAULT_RPMBUILD;
use rpmbuilder_lib::macros::MacroSet;

/// The config file name looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "rpmbuilder.toml";

/// Default output directory, relative to the working directory.
const DEFAULT_OUTPUT_DIR: &str = "target";

/// Top-level layout of `rpmbuilder.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
  pub project: ProjectInfo,
  #[serde(default)]
  pub package: PackageSection,
  #[serde(default)]
  pub deploy: DeploySection,
}

/// `[package]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageSection {
  pub working_dir: Option<PathBuf>,
  pub output_dir: Option<PathBuf>,
  /// Inline Lua source.
  pub patch_hook: Option<String>,
  /// Path to a Lua file.
  pub patch_hook_file: Option<PathBuf>,
  pub attach_zip: Option<bool>,
  pub install_rpms: Option<bool>,
  pub install_root: Option<PathBuf>,
  pub rpmbuild: Option<String>,
  pub changelog: Option<ChangelogEntry>,
  pub macros: MacroSet,
}

/// `[deploy]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeploySection {
  pub repository: Option<String>,
  pub skip: Option<bool>,
  pub checksum_algorithms: Option<String>,
  pub omit_checksums_for_extensions: Option<String>,
}

/// A parsed config file and the directory its relative paths refer to.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
  pub file: ConfigFile,
  pub base_dir: PathBuf,
}

/// Command-line values applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub working_dir: Option<PathBuf>,
  pub output_dir: Option<PathBuf>,
  pub version: Option<String>,
  pub wrapped_build: Option<String>,
  pub no_zip: bool,
  pub install_rpms: bool,
  pub defines: Vec<(String, String)>,
  pub repository: Option<String>,
  pub skip: bool,
}

/// Load and parse a config file.
pub fn load_config(path: &Path) -> Result<LoadedConfig> {
  let contents = fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
  let file = parse_config(&contents).with_context(|| format!("Failed to parse config file {}", path.display()))?;
  let base_dir = path
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .map(Path::to_path_buf)
    .unwrap_or_else(|| PathBuf::from("."));
  debug!(config = %path.display(), base = %base_dir.display(), "loaded config");
  Ok(LoadedConfig { file, base_dir })
}

/// Parse a config file from a string. Unknown keys are rejected.
pub fn parse_config(contents: &str) -> Result<ConfigFile> {
  let config: ConfigFile = toml::from_str(contents).context("invalid configuration")?;
  Ok(config)
}

/// Parse a `name=value` macro definition.
pub fn parse_define(s: &str) -> std::result::Result<(String, String), String> {
  match s.split_once('=') {
    Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.to_string())),
    _ => Err(format!("expected name=value, got '{}'", s)),
  }
}

impl LoadedConfig {
  fn resolve(&self, path: &Path) -> PathBuf {
    self.base_dir.join(path)
  }

  fn project(&self, overrides: &Overrides) -> ProjectInfo {
    let mut project = self.file.project.clone();
    if let Some(version) = &overrides.version {
      project.version = version.clone();
    }
    if let Some(wrapped_build) = &overrides.wrapped_build {
      project.wrapped_build = Some(wrapped_build.clone());
    }
    project
  }

  fn working_dir(&self, overrides: &Overrides) -> PathBuf {
    match &overrides.working_dir {
      Some(dir) => dir.clone(),
      None => match &self.file.package.working_dir {
        Some(dir) => self.resolve(dir),
        None => self.base_dir.clone(),
      },
    }
  }

  fn output_dir(&self, overrides: &Overrides) -> PathBuf {
    if let Some(dir) = &overrides.output_dir {
      return dir.clone();
    }
    match &self.file.package.output_dir {
      Some(dir) => self.resolve(dir),
      None => self.working_dir(overrides).join(DEFAULT_OUTPUT_DIR),
    }
  }

  /// Build the configuration of the `package` step.
  pub fn package_config(&self, overrides: &Overrides) -> Result<PackageConfig> {
    let section = &self.file.package;
    let patch_hook = match (&section.patch_hook, &section.patch_hook_file) {
      (Some(_), Some(_)) => bail!("package.patch_hook and package.patch_hook_file are mutually exclusive"),
      (Some(source), None) => Some(PatchHook::Inline(source.clone())),
      (None, Some(file)) => Some(PatchHook::File(self.resolve(file))),
      (None, None) => None,
    };

    let mut macros = section.macros.clone();
    for (name, value) in &overrides.defines {
      macros.insert(name.as_str(), value.as_str());
    }

    let mut config = PackageConfig::new(self.project(overrides), self.working_dir(overrides), self.output_dir(overrides));
    config.patch_hook = patch_hook;
    config.attach_zip = section.attach_zip.unwrap_or(true) && !overrides.no_zip;
    config.changelog = section.changelog.clone();
    config.install_rpms = section.install_rpms.unwrap_or(false) || overrides.install_rpms;
    if let Some(root) = &section.install_root {
      config.install_root = self.resolve(root);
    }
    config.macros = macros;
    config.rpmbuild = section.rpmbuild.clone().unwrap_or_else(|| DEFAULT_RPMBUILD.to_string());
    Ok(config)
  }

  /// Build the configuration of the `deploy` step.
  pub fn deploy_config(&self, overrides: &Overrides) -> DeployConfig {
    let section = &self.file.deploy;
    let mut config = DeployConfig::new(self.project(overrides), self.output_dir(overrides));
    config.repository = overrides.repository.clone().or_else(|| section.repository.clone());
    config.skip = overrides.skip || section.skip.unwrap_or(false);
    if let Some(algorithms) = &section.checksum_algorithms {
      config.checksum_algorithms = algorithms.clone();
    }
    if let Some(extensions) = &section.omit_checksums_for_extensions {
      config.omit_checksums_for_extensions = extensions.clone();
    }
    config
  }
}
