//! CLI smoke tests for rpmbuilder.
//!
//! These tests run the binary against temporary projects and check exit
//! codes and the user-facing output.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

/// Get a Command for the rpmbuilder binary, run inside `dir`.
fn rpmbuilder_cmd(dir: &Path) -> Command {
  let mut cmd = cargo_bin_cmd!("rpmbuilder");
  cmd
    .current_dir(dir)
    .env_remove("RPMBUILDER_CONFIG")
    .env_remove("RPMBUILDER_USERNAME")
    .env_remove("RPMBUILDER_PASSWORD")
    .env_remove("RUST_LOG");
  cmd
}

const MINIMAL_CONFIG: &str = r#"
[project]
group_id = "org.example"
artifact_id = "widget"
version = "1.2.3.Final-redhat-00004"
wrapped_build = "1.2.3.Final"
"#;

const SPEC: &str = "Name: widget\nVersion: 1.2.3\n\n%changelog\n";

/// Create a project directory holding a config file and a spec file.
fn temp_project(config: &str) -> TempDir {
  let temp = TempDir::new().unwrap();
  fs::write(temp.path().join("rpmbuilder.toml"), config).unwrap();
  fs::write(temp.path().join("widget.spec"), SPEC).unwrap();
  temp
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  let temp = TempDir::new().unwrap();
  rpmbuilder_cmd(temp.path())
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage").and(predicate::str::contains("rpmbuilder")));
}

#[test]
fn version_flag_works() {
  let temp = TempDir::new().unwrap();
  rpmbuilder_cmd(temp.path())
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("rpmbuilder"));
}

#[test]
fn subcommand_help_works() {
  let temp = TempDir::new().unwrap();
  for cmd in &["package", "deploy", "plan"] {
    rpmbuilder_cmd(temp.path())
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn missing_config_fails() {
  let temp = TempDir::new().unwrap();
  for cmd in &["package", "plan", "deploy"] {
    rpmbuilder_cmd(temp.path())
      .arg(cmd)
      .assert()
      .failure()
      .stderr(predicate::str::contains("rpmbuilder.toml"));
  }
}

#[test]
fn unknown_config_key_fails() {
  let temp = temp_project(&format!("{}\n[package]\nattach_tar = true\n", MINIMAL_CONFIG));
  rpmbuilder_cmd(temp.path())
    .arg("plan")
    .assert()
    .failure()
    .stderr(predicate::str::contains("attach_tar"));
}

#[test]
fn config_flag_selects_file() {
  let temp = temp_project(MINIMAL_CONFIG);
  fs::rename(temp.path().join("rpmbuilder.toml"), temp.path().join("other.toml")).unwrap();
  rpmbuilder_cmd(temp.path())
    .args(["--config", "other.toml", "plan"])
    .assert()
    .success();
}

// =============================================================================
// Plan
// =============================================================================

#[test]
fn plan_prints_rpmbuild_command() {
  let temp = temp_project(MINIMAL_CONFIG);
  rpmbuilder_cmd(temp.path())
    .args(["plan", "-D", "dist=.el8"])
    .assert()
    .success()
    .stdout(
      predicate::str::contains("rpmbuild --define='_topdir ")
        .and(predicate::str::contains("--define='dist .el8'"))
        .and(predicate::str::contains(" -ba ")),
    );
  assert!(!temp.path().join("target").exists(), "plan must not touch disk");
}

#[test]
fn plan_json_output() {
  let temp = temp_project(MINIMAL_CONFIG);
  let output = rpmbuilder_cmd(temp.path())
    .args(["plan", "-o", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["serial"], 4);
  assert_eq!(report["evr"], "1.2.3-4Final.1");
  assert_eq!(report["program"], "rpmbuild");
}

#[test]
fn plan_fails_without_spec() {
  let temp = temp_project(MINIMAL_CONFIG);
  fs::remove_file(temp.path().join("widget.spec")).unwrap();
  rpmbuilder_cmd(temp.path())
    .arg("plan")
    .assert()
    .failure()
    .stderr(predicate::str::contains("incorrect number of spec files found (0)"));
}

// =============================================================================
// Package
// =============================================================================

#[cfg(unix)]
mod package {
  use super::*;
  use std::os::unix::fs::PermissionsExt;

  /// Writes one noarch RPM into the directory passed as `_rpmdir`.
  const FAKE_RPMBUILD: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    "--define=_rpmdir "*) dir="${arg#--define=_rpmdir }" ;;
  esac
done
mkdir -p "$dir/noarch"
echo rpm > "$dir/noarch/widget-1.2.3-4Final.1.noarch.rpm"
echo "Wrote: $dir/noarch/widget-1.2.3-4Final.1.noarch.rpm"
"#;

  fn project_with_fake_rpmbuild(exit_code: i32) -> TempDir {
    let temp = TempDir::new().unwrap();
    let script = temp.path().join("fake-rpmbuild");
    fs::write(&script, format!("{}exit {}\n", FAKE_RPMBUILD, exit_code)).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let config = format!(
      "{}\n[package]\nrpmbuild = \"{}\"\n\n[package.changelog]\ngenerate = true\n",
      MINIMAL_CONFIG,
      script.display()
    );
    fs::write(temp.path().join("rpmbuilder.toml"), config).unwrap();
    fs::write(temp.path().join("widget.spec"), SPEC).unwrap();
    temp
  }

  #[test]
  #[serial]
  fn package_builds_and_archives() {
    let temp = project_with_fake_rpmbuild(0);
    rpmbuilder_cmd(temp.path())
      .arg("package")
      .assert()
      .success()
      .stdout(predicate::str::contains("Packaged widget").and(predicate::str::contains("RPMs: 1")));

    let target = temp.path().join("target");
    assert!(target.join("widget-1.2.3.Final-redhat-00004.zip").is_file());
    let staged = fs::read_to_string(target.join("spec").join("widget.spec")).unwrap();
    assert!(staged.contains("project-ncl@redhat.com - 1.2.3-4Final.1"), "{}", staged);
  }

  #[test]
  #[serial]
  fn package_without_zip() {
    let temp = project_with_fake_rpmbuild(0);
    rpmbuilder_cmd(temp.path())
      .args(["package", "--no-zip"])
      .assert()
      .success()
      .stdout(predicate::str::contains("Archive: disabled"));
    assert!(!temp.path().join("target").join("widget-1.2.3.Final-redhat-00004.zip").exists());
  }

  #[test]
  #[serial]
  fn package_reports_rpmbuild_failure() {
    let temp = project_with_fake_rpmbuild(3);
    rpmbuilder_cmd(temp.path())
      .arg("package")
      .assert()
      .failure()
      .stderr(predicate::str::contains("exited with code 3"));
  }
}

// =============================================================================
// Deploy
// =============================================================================

#[test]
fn deploy_skip_succeeds() {
  let temp = temp_project(MINIMAL_CONFIG);
  rpmbuilder_cmd(temp.path())
    .args(["deploy", "--skip"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Skipping RPM deployment"));
}

#[test]
fn deploy_without_repository_fails() {
  let temp = temp_project(MINIMAL_CONFIG);
  rpmbuilder_cmd(temp.path())
    .arg("deploy")
    .assert()
    .failure()
    .stderr(predicate::str::contains("no deployment repository specified"));
}

#[test]
fn deploy_rejects_malformed_repository() {
  let temp = temp_project(MINIMAL_CONFIG);
  rpmbuilder_cmd(temp.path())
    .args(["deploy", "--repository", "badstring"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("id::url"));
}
