//! Destinations for the output lines of external processes.

use tracing::{info, warn};

/// Which output stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
  Stdout,
  Stderr,
}

/// One line of process output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
  pub stream: Stream,
  /// Line content without its terminator, at most `MAX_LINE_LENGTH` bytes before lossy decoding.
  pub text: String,
  /// The line was longer than the limit and has been cut.
  pub truncated: bool,
}

/// Receives process output as it is produced.
pub trait LineSink {
  fn line(&mut self, line: &OutputLine);
}

impl<F: FnMut(&OutputLine)> LineSink for F {
  fn line(&mut self, line: &OutputLine) {
    self(line)
  }
}

/// Logs stdout lines at `info` and stderr lines at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LineSink for TracingSink {
  fn line(&mut self, line: &OutputLine) {
    match line.stream {
      Stream::Stdout if line.truncated => info!(truncated = true, "{}", line.text),
      Stream::Stdout => info!("{}", line.text),
      Stream::Stderr if line.truncated => warn!(truncated = true, "{}", line.text),
      Stream::Stderr => warn!("{}", line.text),
    }
  }
}

/// Keeps every line in arrival order.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
  pub lines: Vec<OutputLine>,
}

impl CollectingSink {
  pub fn new() -> Self {
    Self::default()
  }

  /// Text of the lines received from `stream`.
  pub fn texts(&self, stream: Stream) -> Vec<&str> {
    self
      .lines
      .iter()
      .filter(|l| l.stream == stream)
      .map(|l| l.text.as_str())
      .collect()
  }
}

impl LineSink for CollectingSink {
  fn line(&mut self, line: &OutputLine) {
    self.lines.push(line.clone());
  }
}
