mod deploy;
mod package;
mod plan;

pub use deploy::cmd_deploy;
pub use package::cmd_package;
pub use plan::cmd_plan;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;

/// Runtime used to drive a single pipeline step to completion.
fn runtime() -> Result<Runtime> {
  tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")
}
