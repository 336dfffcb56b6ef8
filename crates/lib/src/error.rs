//! Error types for the packaging pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::deploy::TransportError;

/// Errors that abort a pipeline invocation.
///
/// Every variant is terminal: nothing in the pipeline retries.
#[derive(Debug, Error)]
pub enum Error {
  /// Invalid or incomplete configuration, detected before any external process runs.
  #[error("configuration error: {0}")]
  Configuration(String),

  /// An external executable could not be launched.
  #[error("failed to execute '{program}'. Is it installed? {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  /// An external executable exited unsuccessfully.
  #[error("{program} exited with code {code}")]
  ExternalTool { program: String, code: i32 },

  /// Filesystem failure, tagged with the stage and path involved.
  #[error("{context} '{}': {source}", .path.display())]
  Io {
    context: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The patch hook raised an error.
  #[error("patch hook {hook} failed: {message}")]
  Hook { hook: String, message: String },

  /// The zip writer failed.
  #[error("failed to write archive '{}': {source}", .path.display())]
  Archive {
    path: PathBuf,
    #[source]
    source: zip::result::ZipError,
  },

  /// Deployment failed; propagated from the transport unchanged.
  #[error(transparent)]
  Transport(#[from] TransportError),
}

impl Error {
  /// Build a closure wrapping an `io::Error` with stage context and a path.
  ///
  /// ```ignore
  /// fs::copy(&from, &to).map_err(Error::io("failed to stage spec file", &to))?;
  /// ```
  pub fn io(context: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Error {
    let path = path.into();
    move |source| Error::Io { context, path, source }
  }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn external_tool_reports_literal_exit_code() {
    let err = Error::ExternalTool {
      program: "rpmbuild".to_string(),
      code: 42,
    };
    assert_eq!(err.to_string(), "rpmbuild exited with code 42");
  }

  #[test]
  fn io_helper_keeps_context_and_path() {
    let err = Error::io("failed to stage spec file", "/tmp/out/spec/pkg.spec")(io::Error::new(
      io::ErrorKind::PermissionDenied,
      "denied",
    ));
    let msg = err.to_string();
    assert!(msg.contains("failed to stage spec file"));
    assert!(msg.contains("/tmp/out/spec/pkg.spec"));
    assert!(msg.contains("denied"));
  }
}
