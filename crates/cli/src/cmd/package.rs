//! Implementation of the `rpmbuilder package` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use rpmbuilder_lib::invoke::TracingSink;
use rpmbuilder_lib::pipeline;

use crate::config::{Overrides, load_config};
use crate::output::{Status, elapsed, field, size, status};

pub fn cmd_package(config_path: &Path, overrides: &Overrides) -> Result<()> {
  let loaded = load_config(config_path)?;
  let config = loaded.package_config(overrides)?;

  let start = Instant::now();
  let rt = super::runtime()?;
  let outcome = rt
    .block_on(pipeline::package(&config, &mut TracingSink))
    .with_context(|| format!("Failed to package {}", config.project.display_name()))?;
  let took = start.elapsed();

  status(
    Status::Done,
    &format!(
      "Packaged {} {} in {}",
      config.project.display_name(),
      outcome.context.evr(),
      elapsed(took)
    ),
  );
  field("Spec", outcome.staged_spec.display());

  match &outcome.archive {
    Some(archive) => {
      if archive.artifacts.is_empty() {
        status(Status::Warning, "No RPMs were produced");
      }
      let total: u64 = archive.artifacts.iter().map(|a| a.size).sum();
      field("RPMs", archive.artifacts.len());
      field("Total size", size(total));
      field("Archive", archive.path.display());
    }
    None => field("Archive", "disabled"),
  }

  Ok(())
}
