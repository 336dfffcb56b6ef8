//! Terminal reporting for the rpmbuilder commands.
//!
//! Every command ends with one status line followed by indented
//! `label: value` fields. Colors are applied only when the stream they are
//! written to supports them. `-o json` replaces all of this with a single
//! JSON document on stdout.

use std::fmt::Display;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// Outcome shown in front of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Done,
  Failed,
  Warning,
  Skipped,
}

impl Status {
  fn marker(self) -> &'static str {
    match self {
      Status::Done => "✓",
      Status::Failed => "✗",
      Status::Warning => "!",
      Status::Skipped => "-",
    }
  }

  /// Failures and warnings go to stderr so stdout stays parseable.
  fn stream(self) -> Stream {
    match self {
      Status::Done | Status::Skipped => Stream::Stdout,
      Status::Failed | Status::Warning => Stream::Stderr,
    }
  }
}

/// Print a one-line status message.
pub fn status(status: Status, message: &str) {
  let stream = status.stream();
  let marker = status.marker();
  let marker = match status {
    Status::Done => marker.if_supports_color(stream, |m| m.green()).to_string(),
    Status::Failed => marker.if_supports_color(stream, |m| m.red()).to_string(),
    Status::Warning => marker.if_supports_color(stream, |m| m.yellow()).to_string(),
    Status::Skipped => marker.if_supports_color(stream, |m| m.dimmed()).to_string(),
  };
  match stream {
    Stream::Stderr => eprintln!("{} {}", marker, message),
    _ => println!("{} {}", marker, message),
  }
}

/// Print an indented `label: value` line below a status line.
pub fn field(label: &str, value: impl Display) {
  println!("  {}: {}", label.if_supports_color(Stream::Stdout, |l| l.dimmed()), value);
}

/// Render a byte count with binary units, e.g. `3.2 MiB`.
pub fn size(bytes: u64) -> String {
  const UNITS: [&str; 3] = ["KiB", "MiB", "GiB"];
  if bytes < 1024 {
    return format!("{} B", bytes);
  }
  let mut value = bytes as f64 / 1024.0;
  let mut unit = 0;
  while value >= 1024.0 && unit + 1 < UNITS.len() {
    value /= 1024.0;
    unit += 1;
  }
  format!("{:.1} {}", value, UNITS[unit])
}

/// Render a wall-clock duration, e.g. `850ms`, `12.3s` or `2m05s`.
pub fn elapsed(duration: Duration) -> String {
  let secs = duration.as_secs();
  if secs >= 60 {
    format!("{}m{:02}s", secs / 60, secs % 60)
  } else if secs > 0 {
    format!("{:.1}s", duration.as_secs_f64())
  } else {
    format!("{}ms", duration.as_millis())
  }
}

pub fn json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  let rendered = serde_json::to_string_pretty(value).context("Failed to render JSON report")?;
  println!("{}", rendered);
  Ok(())
}
