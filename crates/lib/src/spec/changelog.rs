//! Changelog injection into a staged spec file.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::config::ChangelogEntry;
use crate::consts::CHANGELOG_MARKER;
use crate::context::BuildContext;
use crate::error::{Error, Result};

/// Format of the changelog date, e.g. `Mon Oct 19 2026`.
const CHANGELOG_DATE_FORMAT: &str = "%a %b %d %Y";

/// The changelog title line for a build.
pub fn changelog_title(entry: &ChangelogEntry, ctx: &BuildContext, date: NaiveDate) -> String {
  format!(
    "* {} {} - {}",
    date.format(CHANGELOG_DATE_FORMAT),
    entry.email,
    ctx.evr()
  )
}

/// Insert `title`, `message` and a blank line after every marker line.
///
/// Returns the new line sequence and the number of markers found.
pub fn insert_changelog_lines(content: &str, title: &str, message: &str) -> (Vec<String>, usize) {
  let mut lines = Vec::new();
  let mut markers = 0;
  for line in content.lines() {
    lines.push(line.to_string());
    if line == CHANGELOG_MARKER {
      markers += 1;
      lines.push(title.to_string());
      lines.push(message.to_string());
      lines.push(String::new());
    }
  }
  (lines, markers)
}

/// Inject a changelog entry into the staged spec when generation is requested.
///
/// The file is rewritten with `\n` line endings. Nothing is touched when
/// `entry.generate` is false. Returns whether the file was rewritten.
pub fn inject_changelog(staged: &Path, entry: &ChangelogEntry, ctx: &BuildContext, date: NaiveDate) -> Result<bool> {
  if !entry.generate {
    debug!("changelog generation disabled");
    return Ok(false);
  }

  let content = fs::read_to_string(staged).map_err(Error::io("failed to read staged spec", staged))?;
  let title = changelog_title(entry, ctx, date);
  let (lines, markers) = insert_changelog_lines(&content, &title, &entry.message);

  let mut output = lines.join("\n");
  output.push('\n');
  fs::write(staged, output).map_err(Error::io("failed to write staged spec", staged))?;

  if markers == 0 {
    warn!(
      spec = %staged.display(),
      "no %changelog line found in staged spec; changelog entry was not added"
    );
  } else {
    info!(spec = %staged.display(), markers, title = %title, "injected changelog entry");
  }
  Ok(true)
}
