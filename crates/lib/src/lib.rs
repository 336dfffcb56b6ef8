//! rpmbuilder-lib: build RPMs with rpmbuild and publish them
//!
//! The crate is organized around two entry points in [`pipeline`]:
//! - `package`: stage a spec file, run `rpmbuild`, archive the produced RPMs
//! - `deploy`: upload the produced RPMs to a remote repository

pub mod collect;
pub mod config;
pub mod consts;
pub mod context;
pub mod deploy;
pub mod error;
pub mod hook;
pub mod install;
pub mod invoke;
pub mod macros;
pub mod pipeline;
pub mod spec;
pub mod version;

#[cfg(all(test, unix))]
pub(crate) mod testutil;

pub use error::{Error, Result};
