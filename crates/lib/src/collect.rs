//! Artifact discovery and archiving.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::consts::{DEPENDENCY_DIR, RPM_EXTENSION};
use crate::error::{Error, Result};

/// Compression level used for archives (deflate maximum).
const ARCHIVE_COMPRESSION_LEVEL: i64 = 9;

/// A produced package file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
  /// Absolute path on disk.
  pub path: PathBuf,
  /// Path relative to the collection root.
  pub relative: PathBuf,
  pub size: u64,
}

impl Artifact {
  /// Archive entry name: the relative path joined with `/`.
  pub fn entry_name(&self) -> String {
    self
      .relative
      .components()
      .map(|c| c.as_os_str().to_string_lossy())
      .collect::<Vec<_>>()
      .join("/")
  }

  pub fn file_name(&self) -> String {
    self
      .path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default()
  }
}

/// The subtree holding downloaded dependencies, never collected.
pub fn dependency_dir(output_dir: &Path) -> PathBuf {
  output_dir.join(DEPENDENCY_DIR)
}

/// `<output>/<artifactId>-<version>.zip`
pub fn archive_path(output_dir: &Path, artifact_id: &str, version: &str) -> PathBuf {
  output_dir.join(format!("{}-{}.zip", artifact_id, version))
}

fn is_rpm(path: &Path) -> bool {
  path
    .file_name()
    .is_some_and(|n| n.to_string_lossy().to_ascii_lowercase().ends_with(RPM_EXTENSION))
}

/// Find every `.rpm` file (case-insensitive) under `root`, skipping `exclude`.
///
/// Results are in depth-first traversal order. A missing root yields no artifacts.
pub fn collect(root: &Path, exclude: &Path) -> Result<Vec<Artifact>> {
  if !root.exists() {
    debug!(root = %root.display(), "collection root does not exist");
    return Ok(Vec::new());
  }

  let mut artifacts = Vec::new();
  let walker = WalkDir::new(root).into_iter().filter_entry(|e| !e.path().starts_with(exclude));
  for entry in walker {
    let entry = entry.map_err(|e| {
      let path = e.path().unwrap_or(root).to_path_buf();
      Error::Io {
        context: "failed to walk output directory",
        path,
        source: io::Error::other(e),
      }
    })?;

    if !entry.file_type().is_file() || !is_rpm(entry.path()) {
      continue;
    }

    let path = entry.path().to_path_buf();
    let size = entry
      .metadata()
      .map_err(|e| Error::Io {
        context: "failed to read file metadata",
        path: path.clone(),
        source: io::Error::other(e),
      })?
      .len();
    let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
    debug!(artifact = %path.display(), size, "found artifact");
    artifacts.push(Artifact { path, relative, size });
  }

  Ok(artifacts)
}

/// Write `artifacts` into a zip at `output`.
///
/// The archive is assembled in a temporary file next to `output` and moved
/// into place only once complete, so a failure never leaves a partial file.
pub fn archive(artifacts: &[Artifact], output: &Path) -> Result<PathBuf> {
  let parent = output.parent().unwrap_or(Path::new("."));
  std::fs::create_dir_all(parent).map_err(Error::io("failed to create archive directory", parent))?;

  let temp = NamedTempFile::new_in(parent).map_err(Error::io("failed to create temporary archive", parent))?;
  let archive_error = |source| Error::Archive {
    path: output.to_path_buf(),
    source,
  };

  let mut writer = ZipWriter::new(temp);
  for artifact in artifacts {
    let options = SimpleFileOptions::default()
      .compression_method(CompressionMethod::Deflated)
      .compression_level(Some(ARCHIVE_COMPRESSION_LEVEL))
      .large_file(artifact.size >= u64::from(u32::MAX));
    writer.start_file(artifact.entry_name(), options).map_err(archive_error)?;

    let file = File::open(&artifact.path).map_err(Error::io("failed to open artifact", &artifact.path))?;
    io::copy(&mut BufReader::new(file), &mut writer).map_err(Error::io("failed to archive artifact", &artifact.path))?;
  }
  let temp = writer.finish().map_err(archive_error)?;

  temp
    .persist(output)
    .map_err(|e| Error::io("failed to move archive into place", output)(e.error))?;

  info!(archive = %output.display(), entries = artifacts.len(), "wrote archive");
  Ok(output.to_path_buf())
}
