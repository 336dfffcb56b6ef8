//! External build process invocation.
//!
//! A child's stdout and stderr are read concurrently by two line readers
//! joined on the calling task. Both feed one channel so that a single
//! `&mut dyn LineSink` receives every line as it arrives.

mod lines;
mod sink;

pub use lines::{LineReader, RawLine};
pub use sink::{CollectingSink, LineSink, OutputLine, Stream, TracingSink};

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::consts::MAX_LINE_LENGTH;
use crate::error::{Error, Result};
use crate::macros::shell_echo;

/// Lifecycle of an [`Invocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
  NotStarted,
  Running,
  Succeeded,
  /// Exited with this code; `-1` when terminated by a signal.
  Failed(i32),
}

/// Outcome of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
  pub exit_code: i32,
  pub stdout: Vec<String>,
  pub stderr: Vec<String>,
}

impl BuildResult {
  pub fn success(&self) -> bool {
    self.exit_code == 0
  }
}

/// A single run of an external program.
#[derive(Debug)]
pub struct Invocation {
  program: String,
  args: Vec<String>,
  cwd: PathBuf,
  state: BuildState,
}

impl Invocation {
  pub fn new(program: impl Into<String>, args: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args,
      cwd: cwd.into(),
      state: BuildState::NotStarted,
    }
  }

  pub fn program(&self) -> &str {
    &self.program
  }

  pub fn args(&self) -> &[String] {
    &self.args
  }

  pub fn cwd(&self) -> &Path {
    &self.cwd
  }

  pub fn state(&self) -> BuildState {
    self.state
  }

  /// The command line in a form that can be pasted into a shell.
  pub fn command_line(&self) -> String {
    shell_echo(&self.program, &self.args)
  }

  /// Run the program to completion, streaming its output to `sink`.
  ///
  /// A non-zero exit is returned as [`Error::ExternalTool`]. There is no
  /// timeout: the call waits for the process to exit on its own.
  pub async fn run(&mut self, sink: &mut dyn LineSink) -> Result<BuildResult> {
    if self.state != BuildState::NotStarted {
      return Err(Error::Configuration(format!(
        "{} has already been run ({:?})",
        self.program, self.state
      )));
    }

    info!(command = %self.command_line(), "about to execute");
    let mut child = Command::new(&self.program)
      .args(&self.args)
      .current_dir(&self.cwd)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()
      .map_err(|source| Error::Spawn {
        program: self.program.clone(),
        source,
      })?;
    self.state = BuildState::Running;

    let (stdout, stderr) = match drain_output(&mut child, &self.program, sink).await {
      Ok(captured) => captured,
      Err(err) => {
        let exit_code = reap(&mut child, &self.program).await;
        self.state = BuildState::Failed(exit_code);
        return Err(err);
      }
    };
    let exit_code = wait_for_exit(&mut child, &self.program).await?;

    let result = BuildResult {
      exit_code,
      stdout,
      stderr,
    };
    if result.success() {
      self.state = BuildState::Succeeded;
      debug!(program = %self.program, lines = result.stdout.len() + result.stderr.len(), "process succeeded");
      Ok(result)
    } else {
      self.state = BuildState::Failed(exit_code);
      Err(Error::ExternalTool {
        program: self.program.clone(),
        code: exit_code,
      })
    }
  }
}

/// Wait for `child` and map its status to an exit code (`-1` for a signal).
pub(crate) async fn wait_for_exit(child: &mut Child, program: &str) -> Result<i32> {
  let status = child.wait().await.map_err(|source| Error::Spawn {
    program: program.to_string(),
    source,
  })?;
  Ok(status.code().unwrap_or(-1))
}

/// Kill `child` if it is still running and wait for it, so it never outlives
/// a failed invocation. Returns its exit code, `-1` if it could not be waited on.
pub(crate) async fn reap(child: &mut Child, program: &str) -> i32 {
  if let Err(err) = child.start_kill() {
    debug!(program, error = %err, "kill failed");
  }
  match child.wait().await {
    Ok(status) => status.code().unwrap_or(-1),
    Err(err) => {
      warn!(program, error = %err, "failed to reap child process");
      -1
    }
  }
}

/// Read the piped stdout and stderr of `child` until both close.
///
/// Returns the captured lines of each stream.
pub(crate) async fn drain_output(
  child: &mut Child,
  program: &str,
  sink: &mut dyn LineSink,
) -> Result<(Vec<String>, Vec<String>)> {
  let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();

  let pump_stdout = pump(child.stdout.take(), Stream::Stdout, tx.clone());
  let pump_stderr = pump(child.stderr.take(), Stream::Stderr, tx);
  let forward = async {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    while let Some(line) = rx.recv().await {
      sink.line(&line);
      match line.stream {
        Stream::Stdout => stdout.push(line.text),
        Stream::Stderr => stderr.push(line.text),
      }
    }
    (stdout, stderr)
  };

  let (out_result, err_result, captured) = tokio::join!(pump_stdout, pump_stderr, forward);
  let read_error = |source| Error::Io {
    context: "failed to read output of",
    path: PathBuf::from(program),
    source,
  };
  out_result.map_err(read_error)?;
  err_result.map_err(read_error)?;
  Ok(captured)
}

async fn pump<R: AsyncRead + Unpin>(
  reader: Option<R>,
  stream: Stream,
  tx: mpsc::UnboundedSender<OutputLine>,
) -> std::io::Result<()> {
  let Some(reader) = reader else {
    return Ok(());
  };

  let mut lines = LineReader::new(BufReader::new(reader), MAX_LINE_LENGTH);
  while let Some(raw) = lines.next_line().await? {
    let line = OutputLine {
      stream,
      text: raw.text,
      truncated: raw.truncated,
    };
    if tx.send(line).is_err() {
      break;
    }
  }
  Ok(())
}
