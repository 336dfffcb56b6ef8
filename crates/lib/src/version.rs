//! Version string decomposition.
//!
//! Versions are free-form strings such as `1.2.3.Final-redhat-00001`. They are
//! split into an optional numeric `major.minor.micro` prefix and a qualifier.
//! Parsing never fails: anything that is not part of the numeric prefix ends
//! up in the qualifier.

/// Delimiters accepted between the numeric prefix and the qualifier.
const QUALIFIER_DELIMITERS: [char; 3] = ['.', '-', '_'];

/// A decomposed version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
  raw: String,
  major: Option<u64>,
  minor: Option<u64>,
  micro: Option<u64>,
  delimiter: Option<char>,
  qualifier: String,
}

impl Version {
  /// Decompose a version string.
  pub fn parse(raw: &str) -> Self {
    let raw = raw.trim();
    let mut rest = raw;

    let major = take_number(&mut rest);
    let mut minor = None;
    let mut micro = None;
    if major.is_some() {
      minor = take_dotted_number(&mut rest);
      if minor.is_some() {
        micro = take_dotted_number(&mut rest);
      }
    }

    let (delimiter, qualifier) = match rest.chars().next() {
      Some(c) if major.is_some() && QUALIFIER_DELIMITERS.contains(&c) => (Some(c), &rest[c.len_utf8()..]),
      _ => (None, rest),
    };

    Self {
      raw: raw.to_string(),
      major,
      minor,
      micro,
      delimiter,
      qualifier: qualifier.to_string(),
    }
  }

  pub fn raw(&self) -> &str {
    &self.raw
  }

  pub fn major(&self) -> Option<u64> {
    self.major
  }

  pub fn minor(&self) -> Option<u64> {
    self.minor
  }

  pub fn micro(&self) -> Option<u64> {
    self.micro
  }

  /// The qualifier without its leading delimiter (e.g. `Final-redhat-00001`).
  pub fn qualifier(&self) -> &str {
    &self.qualifier
  }

  /// The qualifier including its leading delimiter (e.g. `.Final-redhat-00001`).
  pub fn qualifier_with_delim(&self) -> String {
    match self.delimiter {
      Some(d) => format!("{}{}", d, self.qualifier),
      None => self.qualifier.clone(),
    }
  }

  /// `major.minor.micro`, rendering absent components as `0`.
  pub fn mmm(&self) -> String {
    format!(
      "{}.{}.{}",
      self.major.unwrap_or(0),
      self.minor.unwrap_or(0),
      self.micro.unwrap_or(0)
    )
  }

  /// The qualifier normalized for use in an RPM release tag.
  ///
  /// The leading delimiter is dropped and hyphens (illegal in a release)
  /// become underscores.
  pub fn alpha(&self) -> String {
    self.qualifier.replace('-', "_")
  }

  /// The build serial: the trailing run of digits in the qualifier, or `0`.
  ///
  /// `None` when the digits do not fit in a `u64`.
  pub fn build_serial(&self) -> Option<u64> {
    let trimmed = self.qualifier.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &self.qualifier[trimmed.len()..];
    if digits.is_empty() {
      return Some(0);
    }
    // Leading zeros are padding, not part of the number.
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
      return Some(0);
    }
    significant.parse().ok()
  }
}

impl std::fmt::Display for Version {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.raw)
  }
}

/// Integer build serial of a raw version string.
pub fn build_serial(version: &str) -> Option<u64> {
  Version::parse(version).build_serial()
}

fn take_number(rest: &mut &str) -> Option<u64> {
  let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
  if end == 0 {
    return None;
  }
  let value = rest[..end].parse().ok()?;
  *rest = &rest[end..];
  Some(value)
}

fn take_dotted_number(rest: &mut &str) -> Option<u64> {
  let after_dot = rest.strip_prefix('.')?;
  let mut candidate = after_dot;
  let value = take_number(&mut candidate)?;
  *rest = candidate;
  Some(value)
}
