//! Dependency RPM installation.
//!
//! Architecture-independent RPMs downloaded to `<output>/dependency/noarch`
//! are unpacked into a root directory before the build, by piping
//! `rpm2cpio <file>` into `cpio -idmuv --quiet -D <root>`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::info;

use crate::consts::{CPIO, DEPENDENCY_DIR, NOARCH_DIR, NOARCH_RPM_SUFFIX, RPM2CPIO};
use crate::error::{Error, Result};
use crate::invoke::{LineSink, drain_output, reap, wait_for_exit};

/// Executables used to unpack an RPM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractTools {
  pub rpm2cpio: String,
  pub cpio: String,
}

impl Default for ExtractTools {
  fn default() -> Self {
    Self {
      rpm2cpio: RPM2CPIO.to_string(),
      cpio: CPIO.to_string(),
    }
  }
}

/// Directory searched for dependency RPMs.
pub fn noarch_dir(output_dir: &Path) -> PathBuf {
  output_dir.join(DEPENDENCY_DIR).join(NOARCH_DIR)
}

/// List the `*.noarch.rpm` files directly inside `dir`, sorted.
///
/// A missing directory or an empty result is a configuration error.
pub fn find_noarch_rpms(dir: &Path) -> Result<Vec<PathBuf>> {
  if !dir.is_dir() {
    return Err(Error::Configuration(format!(
      "unable to find dependency RPM directory {}",
      dir.display()
    )));
  }

  let entries = fs::read_dir(dir).map_err(Error::io("failed to list dependency directory", dir))?;
  let mut rpms = Vec::new();
  for entry in entries {
    let path = entry.map_err(Error::io("failed to list dependency directory", dir))?.path();
    let is_noarch = path
      .file_name()
      .is_some_and(|n| n.to_string_lossy().ends_with(NOARCH_RPM_SUFFIX));
    if is_noarch && path.is_file() {
      rpms.push(path);
    }
  }
  rpms.sort();

  if rpms.is_empty() {
    return Err(Error::Configuration(format!("no noarch RPMs found in {}", dir.display())));
  }
  Ok(rpms)
}

/// Unpack a single RPM into `root`.
pub async fn extract_rpm(rpm: &Path, root: &Path, tools: &ExtractTools, sink: &mut dyn LineSink) -> Result<()> {
  let mut rpm2cpio = Command::new(&tools.rpm2cpio)
    .arg(rpm)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::inherit())
    .spawn()
    .map_err(spawn_error(&tools.rpm2cpio))?;

  let archive: Stdio = match rpm2cpio.stdout.take() {
    Some(stdout) => match stdout.try_into() {
      Ok(archive) => archive,
      Err(source) => {
        reap(&mut rpm2cpio, &tools.rpm2cpio).await;
        return Err(spawn_error(&tools.rpm2cpio)(source));
      }
    },
    None => Stdio::null(),
  };

  let spawned = Command::new(&tools.cpio)
    .arg("-idmuv")
    .arg("--quiet")
    .arg("-D")
    .arg(root)
    .stdin(archive)
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn();
  let mut cpio = match spawned {
    Ok(cpio) => cpio,
    Err(source) => {
      reap(&mut rpm2cpio, &tools.rpm2cpio).await;
      return Err(spawn_error(&tools.cpio)(source));
    }
  };

  if let Err(err) = drain_output(&mut cpio, &tools.cpio, sink).await {
    reap(&mut cpio, &tools.cpio).await;
    reap(&mut rpm2cpio, &tools.rpm2cpio).await;
    return Err(err);
  }
  // Both children are waited on before either result is inspected.
  let cpio_code = wait_for_exit(&mut cpio, &tools.cpio).await;
  let rpm2cpio_code = wait_for_exit(&mut rpm2cpio, &tools.rpm2cpio).await?;
  let cpio_code = cpio_code?;

  if rpm2cpio_code != 0 {
    return Err(Error::ExternalTool {
      program: tools.rpm2cpio.clone(),
      code: rpm2cpio_code,
    });
  }
  if cpio_code != 0 {
    return Err(Error::ExternalTool {
      program: tools.cpio.clone(),
      code: cpio_code,
    });
  }
  Ok(())
}

fn spawn_error(program: &str) -> impl FnOnce(std::io::Error) -> Error {
  let program = program.to_string();
  move |source| Error::Spawn { program, source }
}

/// Unpack every dependency RPM under `output_dir` into `root`.
///
/// Returns the installed files in installation order.
pub async fn install_rpms(
  output_dir: &Path,
  root: &Path,
  tools: &ExtractTools,
  sink: &mut dyn LineSink,
) -> Result<Vec<PathBuf>> {
  let rpms = find_noarch_rpms(&noarch_dir(output_dir))?;
  for rpm in &rpms {
    info!(rpm = %rpm.display(), root = %root.display(), "installing dependency RPM");
    extract_rpm(rpm, root, tools, sink).await?;
  }
  info!(count = rpms.len(), "installed dependency RPMs");
  Ok(rpms)
}
