mod cmd;
mod config;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{cmd_deploy, cmd_package, cmd_plan};
use crate::config::{CONFIG_FILE_NAME, Overrides, parse_define};
use crate::output::{OutputFormat, Status, status};

/// rpmbuilder - build RPMs with rpmbuild and publish them to a repository
#[derive(Parser)]
#[command(name = "rpmbuilder")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to the configuration file
  #[arg(short, long, global = true, env = "RPMBUILDER_CONFIG", default_value = CONFIG_FILE_NAME)]
  config: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

/// Values overriding the configuration file.
#[derive(Args, Debug, Default)]
struct ProjectArgs {
  /// Directory holding the spec file
  #[arg(long)]
  working_dir: Option<PathBuf>,

  /// Directory receiving build outputs
  #[arg(long)]
  output_dir: Option<PathBuf>,

  /// Override the project version
  #[arg(long)]
  project_version: Option<String>,

  /// Override the version of the wrapped build
  #[arg(long)]
  wrapped_build: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
  /// Stage the spec file, run rpmbuild and archive the produced RPMs
  Package {
    #[command(flatten)]
    project: ProjectArgs,

    /// Do not bundle the produced RPMs into a zip archive
    #[arg(long)]
    no_zip: bool,

    /// Unpack dependency RPMs before building
    #[arg(long)]
    install_rpms: bool,

    /// Define an rpmbuild macro (repeatable)
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUE", value_parser = parse_define)]
    defines: Vec<(String, String)>,
  },

  /// Upload the produced RPMs to a remote repository
  Deploy {
    #[command(flatten)]
    project: ProjectArgs,

    /// Target repository as "id::url"
    #[arg(long)]
    repository: Option<String>,

    /// Skip the deployment
    #[arg(long)]
    skip: bool,

    /// Username for basic authentication
    #[arg(long, env = "RPMBUILDER_USERNAME")]
    username: Option<String>,

    /// Password for basic authentication
    #[arg(long, env = "RPMBUILDER_PASSWORD", hide_env_values = true)]
    password: Option<String>,
  },

  /// Show the rpmbuild invocation without running it
  Plan {
    #[command(flatten)]
    project: ProjectArgs,

    /// Define an rpmbuild macro (repeatable)
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUE", value_parser = parse_define)]
    defines: Vec<(String, String)>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
  },
}

impl ProjectArgs {
  fn into_overrides(self) -> Overrides {
    Overrides {
      working_dir: self.working_dir,
      output_dir: self.output_dir,
      version: self.project_version,
      wrapped_build: self.wrapped_build,
      ..Overrides::default()
    }
  }
}

fn init_tracing(verbose: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    if verbose {
      EnvFilter::new("debug")
    } else {
      EnvFilter::new("info")
    }
  });

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let result = match cli.command {
    Commands::Package {
      project,
      no_zip,
      install_rpms,
      defines,
    } => {
      let overrides = Overrides {
        no_zip,
        install_rpms,
        defines,
        ..project.into_overrides()
      };
      cmd_package(&cli.config, &overrides)
    }
    Commands::Deploy {
      project,
      repository,
      skip,
      username,
      password,
    } => {
      let overrides = Overrides {
        repository,
        skip,
        ..project.into_overrides()
      };
      cmd_deploy(&cli.config, &overrides, username, password)
    }
    Commands::Plan {
      project,
      defines,
      output,
    } => {
      let overrides = Overrides {
        defines,
        ..project.into_overrides()
      };
      cmd_plan(&cli.config, &overrides, output)
    }
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      status(Status::Failed, &format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}
