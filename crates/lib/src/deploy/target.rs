//! Deployment target strings.
//!
//! Two forms are accepted:
//!
//! - `id::url`
//! - `id::default::url` (legacy; accepted with a warning)
//!
//! Splitting follows non-greedy matching: the id ends at the first `::` that
//! leaves a valid remainder, and likewise for the layout. Every part is
//! trimmed afterwards.

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::{Error, Result};

const SEPARATOR: &str = "::";

/// The only layout accepted in the legacy form.
const DEFAULT_LAYOUT: &str = "default";

/// A parsed `id::url` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget {
  pub id: String,
  pub url: String,
  legacy: bool,
}

impl DeploymentTarget {
  pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      url: url.into(),
      legacy: false,
    }
  }

  /// Parse a target string.
  pub fn parse(input: &str) -> Result<Self> {
    if let Some((id, rest)) = split_once_nongreedy(input, |rest| split_once_nongreedy(rest, |_| true).is_some()) {
      let (layout, url) = split_once_nongreedy(rest, |_| true).unwrap_or_default();
      let (id, layout, url) = (id.trim(), layout.trim(), url.trim());

      if layout != DEFAULT_LAYOUT {
        return Err(Error::Configuration(format!(
          "invalid legacy syntax and layout for repository \"{}\". Use \"{}::{}\" instead, and only default layout is supported",
          input, id, url
        )));
      }
      warn!(
        repository = input,
        "using legacy syntax for the deployment repository. Use \"{}::{}\" instead",
        id,
        url
      );
      return Self::checked(id, url, input, true);
    }

    match split_once_nongreedy(input, |_| true) {
      Some((id, url)) => Self::checked(id.trim(), url.trim(), input, false),
      None => Err(Error::Configuration(format!(
        "invalid syntax for repository \"{}\". Use \"id::url\"",
        input
      ))),
    }
  }

  fn checked(id: &str, url: &str, input: &str, legacy: bool) -> Result<Self> {
    if id.is_empty() || url.is_empty() {
      return Err(Error::Configuration(format!(
        "invalid syntax for repository \"{}\": id and url must not be blank",
        input
      )));
    }
    Ok(Self {
      id: id.to_string(),
      url: url.to_string(),
      legacy,
    })
  }

  /// Whether the target was given in the deprecated `id::layout::url` form.
  pub fn is_legacy(&self) -> bool {
    self.legacy
  }
}

impl FromStr for DeploymentTarget {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::parse(s)
  }
}

impl fmt::Display for DeploymentTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}::{}", self.id, self.url)
  }
}

/// Split at the first `::` with a non-empty head and a non-empty tail accepted by `accept`.
fn split_once_nongreedy(input: &str, accept: impl Fn(&str) -> bool) -> Option<(&str, &str)> {
  let mut from = 1;
  while from < input.len() {
    let pos = match input.get(from..).and_then(|rest| rest.find(SEPARATOR)) {
      Some(offset) => from + offset,
      None => return None,
    };
    let (head, tail) = (&input[..pos], &input[pos + SEPARATOR.len()..]);
    if !tail.is_empty() && accept(tail) {
      return Some((head, tail));
    }
    from = pos + 1;
    while from < input.len() && !input.is_char_boundary(from) {
      from += 1;
    }
  }
  None
}
