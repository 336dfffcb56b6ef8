//! Implementation of the `rpmbuilder deploy` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use rpmbuilder_lib::deploy::{Credentials, HttpTransport};
use rpmbuilder_lib::pipeline::{self, DeployOutcome};

use crate::config::{Overrides, load_config};
use crate::output::{Status, elapsed, field, status};

pub fn cmd_deploy(
  config_path: &Path,
  overrides: &Overrides,
  username: Option<String>,
  password: Option<String>,
) -> Result<()> {
  let loaded = load_config(config_path)?;
  let config = loaded.deploy_config(overrides);

  let mut transport = HttpTransport::default();
  if let Some(username) = username {
    transport = transport.with_credentials(Credentials { username, password });
  }

  let start = Instant::now();
  let rt = super::runtime()?;
  let outcome = rt
    .block_on(pipeline::deploy(&config, &transport))
    .with_context(|| format!("Failed to deploy {}", config.project.display_name()))?;

  match outcome {
    DeployOutcome::Skipped => status(Status::Skipped, "Skipping RPM deployment"),
    DeployOutcome::Deployed { repository, url, count } => {
      status(
        Status::Done,
        &format!("Deployed {} RPM(s) in {}", count, elapsed(start.elapsed())),
      );
      field("Repository", &repository);
      field("URL", &url);
    }
  }

  Ok(())
}
