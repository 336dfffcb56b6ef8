//! Checksum algorithms for uploaded files.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::error::{Error, Result};

/// A digest uploaded alongside an artifact as `<location>.<extension>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumAlgorithm {
  Sha1,
  Md5,
  Sha256,
  Sha512,
}

impl ChecksumAlgorithm {
  pub const ALL: [ChecksumAlgorithm; 4] = [Self::Sha1, Self::Md5, Self::Sha256, Self::Sha512];

  /// Canonical name, as used in configuration (`SHA-1`, `MD5`, ...).
  pub fn name(self) -> &'static str {
    match self {
      Self::Sha1 => "SHA-1",
      Self::Md5 => "MD5",
      Self::Sha256 => "SHA-256",
      Self::Sha512 => "SHA-512",
    }
  }

  /// File extension of the checksum sidecar, without the dot.
  pub fn extension(self) -> &'static str {
    match self {
      Self::Sha1 => "sha1",
      Self::Md5 => "md5",
      Self::Sha256 => "sha256",
      Self::Sha512 => "sha512",
    }
  }

  /// Look up an algorithm by name, ignoring case.
  pub fn from_name(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|a| a.name().eq_ignore_ascii_case(name.trim()))
  }

  /// Parse a comma separated list of names.
  ///
  /// Blank entries are skipped and duplicates collapse onto their first
  /// occurrence. Unknown names are rejected.
  pub fn parse_list(names: &str) -> Result<Vec<Self>> {
    let mut algorithms = Vec::new();
    for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
      let algorithm = Self::from_name(name).ok_or_else(|| {
        Error::Configuration(format!(
          "unsupported checksum algorithm '{}' (supported: SHA-1, MD5, SHA-256, SHA-512)",
          name
        ))
      })?;
      if !algorithms.contains(&algorithm) {
        algorithms.push(algorithm);
      }
    }
    Ok(algorithms)
  }

  /// Lowercase hex digest of `data`.
  pub fn digest_bytes(self, data: &[u8]) -> String {
    match self {
      Self::Sha1 => hex::encode(Sha1::digest(data)),
      Self::Md5 => hex::encode(Md5::digest(data)),
      Self::Sha256 => hex::encode(Sha256::digest(data)),
      Self::Sha512 => hex::encode(Sha512::digest(data)),
    }
  }

  /// Lowercase hex digest of a file's contents, streamed.
  pub fn digest_file(self, path: &Path) -> Result<String> {
    match self {
      Self::Sha1 => hash_file::<Sha1>(path),
      Self::Md5 => hash_file::<Md5>(path),
      Self::Sha256 => hash_file::<Sha256>(path),
      Self::Sha512 => hash_file::<Sha512>(path),
    }
  }
}

impl fmt::Display for ChecksumAlgorithm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Whether `extension` (with or without a leading dot) names a checksum file.
pub fn is_checksum_extension(extension: &str) -> bool {
  let extension = extension.strip_prefix('.').unwrap_or(extension);
  ChecksumAlgorithm::ALL
    .iter()
    .any(|a| a.extension().eq_ignore_ascii_case(extension))
}

fn hash_file<D: Digest>(path: &Path) -> Result<String> {
  let file = File::open(path).map_err(Error::io("failed to open file for checksum", path))?;
  let mut reader = BufReader::new(file);
  let mut hasher = D::new();
  let mut buffer = [0u8; 8192];
  loop {
    let read = reader
      .read(&mut buffer)
      .map_err(Error::io("failed to read file for checksum", path))?;
    if read == 0 {
      break;
    }
    hasher.update(&buffer[..read]);
  }
  Ok(hex::encode(hasher.finalize()))
}
