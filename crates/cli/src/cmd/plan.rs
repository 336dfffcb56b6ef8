//! Implementation of the `rpmbuilder plan` command.
//!
//! Derives the build properties and prints the rpmbuild invocation that
//! `package` would run. Nothing is written to disk.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use rpmbuilder_lib::pipeline::{self, BuildPlan};

use crate::config::{Overrides, load_config};
use crate::output::{OutputFormat, field, json};

#[derive(Debug, Serialize)]
struct PlanReport {
  version: String,
  serial: u64,
  wrapped_build: Option<String>,
  mead_version: Option<String>,
  mead_alpha: Option<String>,
  evr: String,
  spec: String,
  staged_spec: String,
  program: String,
  args: Vec<String>,
  command_line: String,
}

impl From<&BuildPlan> for PlanReport {
  fn from(plan: &BuildPlan) -> Self {
    let ctx = &plan.context;
    Self {
      version: ctx.version().to_string(),
      serial: ctx.serial(),
      wrapped_build: ctx.wrapped_build().map(str::to_string),
      mead_version: ctx.mead_version(),
      mead_alpha: ctx.mead_alpha(),
      evr: ctx.evr(),
      spec: plan.spec.display().to_string(),
      staged_spec: plan.staged_spec.display().to_string(),
      program: plan.program.clone(),
      args: plan.args.clone(),
      command_line: plan.command_line(),
    }
  }
}

pub fn cmd_plan(config_path: &Path, overrides: &Overrides, output: OutputFormat) -> Result<()> {
  let loaded = load_config(config_path)?;
  let config = loaded.package_config(overrides)?;
  let plan = pipeline::plan(&config).context("Failed to plan build")?;
  let report = PlanReport::from(&plan);

  if output.is_json() {
    return json(&report);
  }

  println!("Plan: {}", config.project.display_name());
  field("Version", &report.version);
  field("Serial", report.serial);
  if let Some(wrapped_build) = &report.wrapped_build {
    field("Wrapped build", wrapped_build);
    field("EVR", &report.evr);
  }
  field("Spec", plan.spec.display());
  field("Staged", plan.staged_spec.display());
  println!("{}", report.command_line);

  Ok(())
}
