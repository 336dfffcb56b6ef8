//! Per-invocation build context.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{ChangelogEntry, ProjectInfo};
use crate::consts::{BUILD_DIR, NIL_MACRO, RELEASE_SUFFIX, SPEC_DIR};
use crate::error::{Error, Result};
use crate::version::{Version, build_serial};

/// Immutable facts about one pipeline run.
///
/// Derived once from the configuration before any stage runs. Directory
/// paths are absolute.
#[derive(Debug, Clone)]
pub struct BuildContext {
  working_dir: PathBuf,
  output_dir: PathBuf,
  build_dir: PathBuf,
  spec_dir: PathBuf,
  version: String,
  serial: u64,
  wrapped_build: Option<Version>,
}

impl BuildContext {
  /// Derive the context for a project.
  ///
  /// A missing wrapped build is logged but not fatal here; see
  /// [`BuildContext::check_changelog_precondition`].
  pub fn derive(working_dir: &Path, output_dir: &Path, project: &ProjectInfo) -> Result<Self> {
    let working_dir =
      std::path::absolute(working_dir).map_err(Error::io("failed to resolve working directory", working_dir))?;
    let output_dir =
      std::path::absolute(output_dir).map_err(Error::io("failed to resolve output directory", output_dir))?;

    let wrapped_build = project.wrapped_build.as_deref().map(Version::parse);
    if wrapped_build.is_none() {
      warn!(
        project = project.display_name(),
        "no wrapped build version configured; define it to denote the version of the build wrapped inside the RPM"
      );
    }

    let serial = build_serial(&project.version).ok_or_else(|| {
      Error::Configuration(format!(
        "build serial of version '{}' does not fit in a 64-bit integer",
        project.version
      ))
    })?;

    Ok(Self {
      build_dir: output_dir.join(BUILD_DIR),
      spec_dir: output_dir.join(SPEC_DIR),
      working_dir,
      output_dir,
      version: project.version.clone(),
      serial,
      wrapped_build,
    })
  }

  /// Fail when a changelog is requested but there is no wrapped build to describe.
  pub fn check_changelog_precondition(&self, changelog: Option<&ChangelogEntry>) -> Result<()> {
    if changelog.is_some_and(|c| c.generate) && self.wrapped_build.is_none() {
      return Err(Error::Configuration(
        "unable to find wrapped build version, required for changelog generation".to_string(),
      ));
    }
    Ok(())
  }

  /// Create the build and spec directories.
  pub fn create_dirs(&self) -> Result<()> {
    for dir in [&self.build_dir, &self.spec_dir] {
      fs::create_dir_all(dir).map_err(Error::io("failed to create directory", dir))?;
    }
    Ok(())
  }

  /// Log the derived properties in one line.
  pub fn log_summary(&self, project: &ProjectInfo) {
    let alpha = self.mead_alpha();
    let mmm = self.mead_version();
    info!(
      project = project.display_name(),
      version = %self.version,
      wrapped_build = self.wrapped_build().unwrap_or("<none>"),
      meadalpha = alpha.as_deref().unwrap_or("<none>"),
      meadrel = self.release(),
      meadversion = mmm.as_deref().unwrap_or("<none>"),
      serial = self.serial,
      "derived build properties"
    );
  }

  pub fn working_dir(&self) -> &Path {
    &self.working_dir
  }

  pub fn output_dir(&self) -> &Path {
    &self.output_dir
  }

  pub fn build_dir(&self) -> &Path {
    &self.build_dir
  }

  pub fn spec_dir(&self) -> &Path {
    &self.spec_dir
  }

  /// The raw project version.
  pub fn version(&self) -> &str {
    &self.version
  }

  pub fn serial(&self) -> u64 {
    self.serial
  }

  pub fn wrapped_build(&self) -> Option<&str> {
    self.wrapped_build.as_ref().map(Version::raw)
  }

  /// The wrapped build's numeric triple, if any.
  pub fn version_triple(&self) -> Option<(Option<u64>, Option<u64>, Option<u64>)> {
    self.wrapped_build.as_ref().map(|v| (v.major(), v.minor(), v.micro()))
  }

  /// `major.minor.micro` of the wrapped build.
  pub fn mead_version(&self) -> Option<String> {
    self.wrapped_build.as_ref().map(Version::mmm)
  }

  /// Normalized qualifier of the wrapped build; empty when it has none.
  pub fn mead_alpha(&self) -> Option<String> {
    self.wrapped_build.as_ref().map(Version::alpha)
  }

  /// The qualifier as an rpmbuild value: `%{nil}` when empty or absent.
  pub fn mead_alpha_macro(&self) -> String {
    match self.mead_alpha() {
      Some(alpha) if !alpha.is_empty() => alpha,
      _ => NIL_MACRO.to_string(),
    }
  }

  pub fn release(&self) -> &'static str {
    RELEASE_SUFFIX
  }

  /// `<major.minor.micro>-<serial><alpha><release>`, as used in changelog titles.
  pub fn evr(&self) -> String {
    format!(
      "{}-{}{}{}",
      self.mead_version().unwrap_or_default(),
      self.serial,
      self.mead_alpha().unwrap_or_default(),
      self.release()
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn project() -> ProjectInfo {
    ProjectInfo::new("org.example", "widget", "1.2.3.Final-redhat-00004").with_wrapped_build("1.2.3.Final")
  }

  #[test]
  fn derives_directories_under_output() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("target");
    let ctx = BuildContext::derive(temp.path(), &out, &project()).unwrap();

    assert_eq!(ctx.build_dir(), out.join("build"));
    assert_eq!(ctx.spec_dir(), out.join("spec"));
    assert!(ctx.working_dir().is_absolute());
  }

  #[test]
  fn derives_version_fields() {
    let temp = TempDir::new().unwrap();
    let ctx = BuildContext::derive(temp.path(), temp.path(), &project()).unwrap();

    assert_eq!(ctx.serial(), 4);
    assert_eq!(ctx.mead_version().as_deref(), Some("1.2.3"));
    assert_eq!(ctx.mead_alpha().as_deref(), Some("Final"));
    assert_eq!(ctx.version_triple(), Some((Some(1), Some(2), Some(3))));
    assert_eq!(ctx.evr(), "1.2.3-4Final.1");
  }

  #[test]
  fn overflowing_serial_is_a_configuration_error() {
    let temp = TempDir::new().unwrap();
    let project = ProjectInfo::new("g", "a", "1.0.0.redhat-99999999999999999999999");
    let err = BuildContext::derive(temp.path(), temp.path(), &project).unwrap_err();

    assert!(matches!(err, Error::Configuration(_)), "{:?}", err);
    assert!(err.to_string().contains("99999999999999999999999"), "{}", err);
  }

  #[test]
  fn empty_alpha_becomes_nil_macro() {
    let temp = TempDir::new().unwrap();
    let project = ProjectInfo::new("g", "a", "1.0.0.redhat-1").with_wrapped_build("1.0.0");
    let ctx = BuildContext::derive(temp.path(), temp.path(), &project).unwrap();
    assert_eq!(ctx.mead_alpha_macro(), "%{nil}");
  }

  #[test]
  fn relative_dirs_are_made_absolute() {
    let ctx = BuildContext::derive(Path::new("."), Path::new("target"), &project()).unwrap();
    assert!(ctx.working_dir().is_absolute());
    assert!(ctx.output_dir().is_absolute());
  }

  mod changelog_precondition {
    use super::*;

    fn without_wrapped_build() -> BuildContext {
      let project = ProjectInfo::new("g", "a", "1.0.0.redhat-1");
      BuildContext::derive(Path::new("/w"), Path::new("/w/target"), &project).unwrap()
    }

    #[test]
    fn missing_wrapped_build_is_only_a_warning_without_changelog() {
      let ctx = without_wrapped_build();
      assert!(ctx.check_changelog_precondition(None).is_ok());
      assert!(ctx.check_changelog_precondition(Some(&ChangelogEntry::default())).is_ok());
      assert_eq!(ctx.mead_version(), None);
      assert_eq!(ctx.mead_alpha(), None);
    }

    #[test]
    fn missing_wrapped_build_is_fatal_with_changelog() {
      let ctx = without_wrapped_build();
      let entry = ChangelogEntry {
        generate: true,
        ..Default::default()
      };
      let err = ctx.check_changelog_precondition(Some(&entry)).unwrap_err();
      assert!(matches!(err, Error::Configuration(_)));
    }
  }

  #[test]
  fn create_dirs_creates_build_and_spec() {
    let temp = TempDir::new().unwrap();
    let ctx = BuildContext::derive(temp.path(), &temp.path().join("out"), &project()).unwrap();
    ctx.create_dirs().unwrap();
    assert!(ctx.build_dir().is_dir());
    assert!(ctx.spec_dir().is_dir());
  }
}
