//! The `package` and `deploy` entry points.
//!
//! `package` runs its stages strictly in order and stops at the first error:
//!
//! 1. derive the build context and create the build and spec directories
//! 2. check the changelog precondition
//! 3. unpack dependency RPMs (opt-in)
//! 4. stage the spec, run the patch hook, inject the changelog
//! 5. run rpmbuild
//! 6. collect the produced RPMs and archive them (unless disabled)

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::collect::{self, Artifact};
use crate::config::{DeployConfig, PackageConfig};
use crate::context::BuildContext;
use crate::deploy::{self, DeploymentTarget, GenericLayout, LayoutPolicy, Transport};
use crate::error::{Error, Result};
use crate::hook;
use crate::install::{self, ExtractTools};
use crate::invoke::{BuildResult, Invocation, LineSink};
use crate::macros::build_args;
use crate::spec;

/// The archive attached to a package run.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
  pub path: PathBuf,
  pub artifacts: Vec<Artifact>,
}

/// Result of a successful `package` run.
#[derive(Debug, Clone)]
pub struct PackageOutcome {
  pub context: BuildContext,
  /// The primary output.
  pub staged_spec: PathBuf,
  pub build: BuildResult,
  /// The attached output, when archiving is enabled.
  pub archive: Option<ArchiveSummary>,
}

/// What `package` would run, without running it.
#[derive(Debug, Clone)]
pub struct BuildPlan {
  pub context: BuildContext,
  pub spec: PathBuf,
  pub staged_spec: PathBuf,
  pub program: String,
  pub args: Vec<String>,
}

impl BuildPlan {
  /// The rpmbuild command line, quoted for a shell.
  pub fn command_line(&self) -> String {
    crate::macros::shell_echo(&self.program, &self.args)
  }
}

/// Result of a `deploy` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
  Skipped,
  Deployed { repository: String, url: String, count: usize },
}

/// Derive the context and the rpmbuild invocation for `config`.
///
/// Touches nothing on disk.
pub fn plan(config: &PackageConfig) -> Result<BuildPlan> {
  let context = BuildContext::derive(&config.working_dir, &config.output_dir, &config.project)?;
  context.check_changelog_precondition(config.changelog.as_ref())?;

  let spec = spec::locate_spec(context.working_dir())?;
  let file_name = spec
    .file_name()
    .ok_or_else(|| Error::Configuration(format!("spec path has no file name: {}", spec.display())))?;
  let staged_spec = context.spec_dir().join(file_name);
  let args = build_args(&context, &config.macros, &staged_spec);

  Ok(BuildPlan {
    context,
    spec,
    staged_spec,
    program: config.rpmbuild.clone(),
    args,
  })
}

/// Build the RPMs described by `config`, dating any changelog entry today.
pub async fn package(config: &PackageConfig, sink: &mut dyn LineSink) -> Result<PackageOutcome> {
  package_at(config, Local::now().date_naive(), sink).await
}

/// Build the RPMs described by `config`, dating any changelog entry `date`.
pub async fn package_at(config: &PackageConfig, date: NaiveDate, sink: &mut dyn LineSink) -> Result<PackageOutcome> {
  let context = BuildContext::derive(&config.working_dir, &config.output_dir, &config.project)?;
  context.create_dirs()?;
  context.log_summary(&config.project);
  context.check_changelog_precondition(config.changelog.as_ref())?;

  if config.install_rpms {
    install::install_rpms(context.output_dir(), &config.install_root, &ExtractTools::default(), sink).await?;
  }

  let located = spec::locate_spec(context.working_dir())?;
  let staged_spec = spec::stage_spec(&located, context.spec_dir())?;
  if let Some(patch_hook) = &config.patch_hook {
    hook::apply_patch_hook(patch_hook, &staged_spec, &context)?;
  }
  if let Some(changelog) = &config.changelog {
    spec::inject_changelog(&staged_spec, changelog, &context, date)?;
  }

  let args = build_args(&context, &config.macros, &staged_spec);
  let mut invocation = Invocation::new(config.rpmbuild.clone(), args, context.working_dir());
  let build = invocation.run(sink).await?;

  let archive = if config.attach_zip {
    let artifacts = collect::collect(context.output_dir(), &collect::dependency_dir(context.output_dir()))?;
    if artifacts.is_empty() {
      warn!(output = %context.output_dir().display(), "rpmbuild produced no RPMs");
    }
    let path = collect::archive_path(context.output_dir(), &config.project.artifact_id, &config.project.version);
    collect::archive(&artifacts, &path)?;
    Some(ArchiveSummary { path, artifacts })
  } else {
    None
  };

  info!(spec = %staged_spec.display(), "package complete");
  Ok(PackageOutcome {
    context,
    staged_spec,
    build,
    archive,
  })
}

/// Publish the RPMs under the configured output directory.
pub async fn deploy<T: Transport + ?Sized>(config: &DeployConfig, transport: &T) -> Result<DeployOutcome> {
  if config.skip {
    info!("Skipping RPM deployment");
    return Ok(DeployOutcome::Skipped);
  }
  let repository = match config.repository.as_deref().map(str::trim) {
    Some(repository) if !repository.is_empty() => repository,
    _ => {
      return Err(Error::Configuration(
        "no deployment repository specified (or skip via `deploy.skip = true` / `--skip`)".to_string(),
      ));
    }
  };

  let output_dir = &config.output_dir;
  let artifacts = collect::collect(output_dir, &collect::dependency_dir(output_dir))?;
  if artifacts.is_empty() {
    warn!(output = %output_dir.display(), "no RPMs found to deploy");
  }

  let target = DeploymentTarget::parse(repository)?;
  let layout = GenericLayout::new(LayoutPolicy::from_config(config)?);
  let request = deploy::publish(transport, &layout, &target, &config.project, &artifacts).await?;

  Ok(DeployOutcome::Deployed {
    repository: request.repository.id,
    url: request.repository.url.to_string(),
    count: artifacts.len(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{ChangelogEntry, PatchHook, ProjectInfo};
  use crate::deploy::fakes::MemoryTransport;
  use std::fs;
  use std::path::Path;
  use tempfile::TempDir;

  fn project() -> ProjectInfo {
    ProjectInfo::new("org.example", "widget", "1.2.3.Final-redhat-00004").with_wrapped_build("1.2.3.Final")
  }

  fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "rpm").unwrap();
  }

  mod plan {
    use super::*;

    #[test]
    fn describes_the_invocation() {
      let temp = TempDir::new().unwrap();
      fs::write(temp.path().join("widget.spec"), "Name: widget\n").unwrap();
      let config = PackageConfig::new(project(), temp.path(), temp.path().join("target"));

      let plan = super::super::plan(&config).unwrap();

      assert_eq!(plan.program, "rpmbuild");
      assert_eq!(plan.staged_spec, plan.context.spec_dir().join("widget.spec"));
      assert_eq!(plan.args.last().map(String::as_str), plan.staged_spec.to_str());
      assert!(plan.command_line().starts_with("rpmbuild --define='_topdir "));
      assert!(!temp.path().join("target").exists());
    }

    #[test]
    fn changelog_without_wrapped_build_fails() {
      let temp = TempDir::new().unwrap();
      fs::write(temp.path().join("widget.spec"), "").unwrap();
      let mut config = PackageConfig::new(ProjectInfo::new("g", "a", "1"), temp.path(), temp.path().join("t"));
      config.changelog = Some(ChangelogEntry {
        generate: true,
        ..Default::default()
      });

      assert!(matches!(super::super::plan(&config), Err(Error::Configuration(_))));
    }
  }

  #[cfg(unix)]
  mod package {
    use super::*;
    use crate::invoke::{CollectingSink, Stream};
    use crate::testutil::write_script;
    use serial_test::serial;

    /// A stand-in for rpmbuild that records its arguments and writes RPMs
    /// into `_rpmdir`, plus one decoy under `dependency/`.
    const FAKE_RPMBUILD: &str = r#"
for arg in "$@"; do echo "$arg"; done > "$PWD/rpmbuild.args"
for arg in "$@"; do
  case "$arg" in
    --define=_rpmdir\ *) rpmdir="${arg#--define=_rpmdir }" ;;
  esac
done
mkdir -p "$rpmdir/noarch" "$rpmdir/dependency/noarch"
echo rpm > "$rpmdir/noarch/widget-1.2.3-4.noarch.rpm"
echo srpm > "$rpmdir/widget-1.2.3-4.src.rpm"
echo dep > "$rpmdir/dependency/noarch/dep-1.0.noarch.rpm"
echo "Wrote: $rpmdir/noarch/widget-1.2.3-4.noarch.rpm"
echo "warning: bogus date in %changelog" >&2
"#;

    fn workspace(temp: &TempDir) -> PackageConfig {
      let work = temp.path().join("work");
      fs::create_dir_all(&work).unwrap();
      fs::write(
        work.join("pkg.spec"),
        "Name: widget\nRelease: @RELEASE@\n%description\ntest\n%changelog\n* Old entry\n",
      )
      .unwrap();

      let bin = temp.path().join("bin");
      fs::create_dir_all(&bin).unwrap();
      let rpmbuild = write_script(&bin, "rpmbuild", FAKE_RPMBUILD);

      let mut config = PackageConfig::new(project(), &work, temp.path().join("out"));
      config.rpmbuild = rpmbuild.display().to_string();
      config
    }

    #[tokio::test]
    #[serial]
    async fn end_to_end() {
      let temp = TempDir::new().unwrap();
      let mut config = workspace(&temp);
      config.changelog = Some(ChangelogEntry {
        generate: true,
        email: "a@b.com".to_string(),
        message: "- test".to_string(),
      });
      config.patch_hook = Some(PatchHook::Inline(
        "rpm.substitute(specFile, '@RELEASE@', serial .. meadalpha .. meadrel)".to_string(),
      ));
      config.macros.insert("dist", ".el8eap");
      let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
      let mut sink = CollectingSink::new();

      let outcome = package_at(&config, date, &mut sink).await.unwrap();

      let out = temp.path().join("out");
      assert_eq!(outcome.staged_spec, out.join("spec").join("pkg.spec"));
      assert_eq!(
        fs::read_to_string(&outcome.staged_spec).unwrap(),
        "Name: widget\nRelease: 4Final.1\n%description\ntest\n%changelog\n\
         * Mon Oct 19 2026 a@b.com - 1.2.3-4Final.1\n- test\n\n* Old entry\n"
      );
      assert_eq!(
        fs::read_to_string(temp.path().join("work").join("pkg.spec")).unwrap(),
        "Name: widget\nRelease: @RELEASE@\n%description\ntest\n%changelog\n* Old entry\n",
        "the original spec is never modified"
      );

      let args = fs::read_to_string(temp.path().join("work").join("rpmbuild.args")).unwrap();
      let args: Vec<&str> = args.lines().collect();
      assert_eq!(args.len(), 6 + 1 + 2);
      assert_eq!(args[6], "--define=dist .el8eap");
      assert_eq!(args[7], "-ba");
      assert_eq!(args[8], outcome.staged_spec.to_str().unwrap());

      assert_eq!(sink.texts(Stream::Stderr), vec!["warning: bogus date in %changelog"]);
      assert!(outcome.build.success());

      let summary = outcome.archive.expect("archive enabled by default");
      assert_eq!(summary.path, out.join("widget-1.2.3.Final-redhat-00004.zip"));
      let mut names: Vec<String> = summary.artifacts.iter().map(Artifact::entry_name).collect();
      names.sort();
      assert_eq!(names, vec!["noarch/widget-1.2.3-4.noarch.rpm", "widget-1.2.3-4.src.rpm"]);

      let zip = zip::ZipArchive::new(fs::File::open(&summary.path).unwrap()).unwrap();
      let mut entries: Vec<&str> = zip.file_names().collect();
      entries.sort();
      assert_eq!(entries, vec!["noarch/widget-1.2.3-4.noarch.rpm", "widget-1.2.3-4.src.rpm"]);
    }

    #[tokio::test]
    #[serial]
    async fn no_zip_skips_archive() {
      let temp = TempDir::new().unwrap();
      let mut config = workspace(&temp);
      config.attach_zip = false;

      let outcome = package(&config, &mut CollectingSink::new()).await.unwrap();

      assert!(outcome.archive.is_none());
      assert!(!temp.path().join("out").join("widget-1.2.3.Final-redhat-00004.zip").exists());
    }

    #[tokio::test]
    #[serial]
    async fn failed_build_collects_nothing() {
      let temp = TempDir::new().unwrap();
      let mut config = workspace(&temp);
      let bin = temp.path().join("bin");
      config.rpmbuild = write_script(&bin, "rpmbuild-fail", "echo 'error: bad spec' >&2; exit 1")
        .display()
        .to_string();

      let err = package(&config, &mut CollectingSink::new()).await.unwrap_err();

      assert!(matches!(err, Error::ExternalTool { code: 1, .. }), "{:?}", err);
      assert!(!temp.path().join("out").join("widget-1.2.3.Final-redhat-00004.zip").exists());
    }

    #[tokio::test]
    #[serial]
    async fn missing_wrapped_build_with_changelog_runs_nothing() {
      let temp = TempDir::new().unwrap();
      let mut config = workspace(&temp);
      config.project.wrapped_build = None;
      config.changelog = Some(ChangelogEntry {
        generate: true,
        ..Default::default()
      });

      let err = package(&config, &mut CollectingSink::new()).await.unwrap_err();

      assert!(matches!(err, Error::Configuration(_)));
      assert!(!temp.path().join("work").join("rpmbuild.args").exists());
    }

    #[tokio::test]
    #[serial]
    async fn two_spec_files_abort_before_build() {
      let temp = TempDir::new().unwrap();
      let config = workspace(&temp);
      fs::write(temp.path().join("work").join("other.spec"), "").unwrap();

      let err = package(&config, &mut CollectingSink::new()).await.unwrap_err();

      assert!(err.to_string().contains("(2)"), "{}", err);
      assert!(!temp.path().join("work").join("rpmbuild.args").exists());
    }

    #[tokio::test]
    #[serial]
    async fn install_without_dependencies_fails() {
      let temp = TempDir::new().unwrap();
      let mut config = workspace(&temp);
      config.install_rpms = true;

      let err = package(&config, &mut CollectingSink::new()).await.unwrap_err();
      assert!(matches!(err, Error::Configuration(_)));
    }
  }

  mod deploy {
    use super::*;

    fn config(temp: &TempDir) -> DeployConfig {
      let out = temp.path().join("out");
      touch(&out.join("noarch").join("widget-1.0-1.noarch.rpm"));
      touch(&out.join("dependency").join("noarch").join("dep-1.0-1.noarch.rpm"));
      DeployConfig::new(project(), out)
    }

    #[tokio::test]
    async fn skip_short_circuits() {
      let temp = TempDir::new().unwrap();
      let mut config = config(&temp);
      config.skip = true;
      config.repository = Some("badstring".to_string());
      let transport = MemoryTransport::new();

      let outcome = super::super::deploy(&config, &transport).await.unwrap();

      assert_eq!(outcome, DeployOutcome::Skipped);
      assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn missing_repository_mentions_skip() {
      let temp = TempDir::new().unwrap();
      let mut config = config(&temp);
      config.repository = Some("  ".to_string());

      let err = super::super::deploy(&config, &MemoryTransport::new()).await.unwrap_err();

      assert!(matches!(err, Error::Configuration(_)));
      assert!(err.to_string().contains("skip"));
    }

    #[tokio::test]
    async fn deploys_everything_outside_dependency_dir() {
      let temp = TempDir::new().unwrap();
      let mut config = config(&temp);
      config.repository = Some("indy::default::https://repo.example/api/".to_string());
      let transport = MemoryTransport::new();

      let outcome = super::super::deploy(&config, &transport).await.unwrap();

      assert_eq!(
        outcome,
        DeployOutcome::Deployed {
          repository: "indy".to_string(),
          url: "https://repo.example/api/".to_string(),
          count: 1,
        }
      );
      let requests = transport.requests();
      assert_eq!(requests.len(), 1);
      assert_eq!(
        requests[0].items[0].location,
        "org/example/widget/1.2.3.Final-redhat-00004/widget-1.0-1.noarch.rpm"
      );
    }

    #[tokio::test]
    async fn invalid_layout_is_configuration_error() {
      let temp = TempDir::new().unwrap();
      let mut config = config(&temp);
      config.repository = Some("indy::zip::https://repo.example".to_string());

      let err = super::super::deploy(&config, &MemoryTransport::new()).await.unwrap_err();
      assert!(matches!(err, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn bad_skip_extension_is_rejected() {
      let temp = TempDir::new().unwrap();
      let mut config = config(&temp);
      config.repository = Some("indy::https://repo.example".to_string());
      config.omit_checksums_for_extensions = "asc".to_string();

      let err = super::super::deploy(&config, &MemoryTransport::new()).await.unwrap_err();
      assert!(err.to_string().contains("must start with '.'"), "{}", err);
    }
  }
}
