//! Spec file preparation.
//!
//! The working directory must hold exactly one `*.spec` file at its top
//! level. It is copied into the output's spec directory, where the patch hook
//! and the changelog injection modify it. The original is never touched.

mod changelog;

pub use changelog::{changelog_title, inject_changelog, insert_changelog_lines};

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::consts::SPEC_SUFFIX;
use crate::error::{Error, Result};

/// Find the single spec file directly inside `working_dir`.
pub fn locate_spec(working_dir: &Path) -> Result<PathBuf> {
  let entries = fs::read_dir(working_dir).map_err(Error::io("failed to list working directory", working_dir))?;

  let mut matches = Vec::new();
  for entry in entries {
    let entry = entry.map_err(Error::io("failed to list working directory", working_dir))?;
    let is_spec = entry.file_name().to_string_lossy().ends_with(SPEC_SUFFIX);
    if is_spec && entry.path().is_file() {
      matches.push(entry.path());
    }
  }
  matches.sort();

  if matches.len() != 1 {
    let listed: Vec<String> = matches.iter().map(|p| p.display().to_string()).collect();
    return Err(Error::Configuration(format!(
      "incorrect number of spec files found ({}) [{}]",
      matches.len(),
      listed.join(", ")
    )));
  }

  let spec = matches.remove(0);
  debug!(spec = %spec.display(), "located spec file");
  Ok(spec)
}

/// Copy `spec` into `spec_dir`, replacing any previous copy.
///
/// Returns the path of the staged copy.
pub fn stage_spec(spec: &Path, spec_dir: &Path) -> Result<PathBuf> {
  let file_name = spec
    .file_name()
    .ok_or_else(|| Error::Configuration(format!("spec path has no file name: {}", spec.display())))?;
  let target = spec_dir.join(file_name);

  fs::create_dir_all(spec_dir).map_err(Error::io("failed to create spec directory", spec_dir))?;
  fs::copy(spec, &target).map_err(Error::io("failed to stage spec file", &target))?;

  info!(from = %spec.display(), to = %target.display(), "staged spec file");
  Ok(target)
}
