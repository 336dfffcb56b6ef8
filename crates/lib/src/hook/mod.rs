//! Lua patch hook run against the staged spec file.
//!
//! A hook sees a fixed set of globals:
//!
//! - `wrappedBuild` - version of the wrapped build (nil when absent)
//! - `meadalpha` - normalized qualifier, `%{nil}` when empty
//! - `meadrel` - release suffix
//! - `meadversion` - `major.minor.micro` (nil when absent)
//! - `serial` - build serial, as a string
//! - `specFile` - absolute path of the staged spec
//! - `rpm` - helpers: `rpm.substitute(path, from, to)`, `rpm.read(path)`, `rpm.write(path, content)`
//!
//! The hook's return value is ignored; it works by side effect.

mod helpers;

use std::path::Path;

use mlua::prelude::*;
use tracing::{debug, info};

use crate::config::PatchHook;
use crate::context::BuildContext;
use crate::error::{Error, Result};

/// Create a Lua runtime with the hook globals bound for `staged`.
pub fn create_runtime(staged: &Path, ctx: &BuildContext) -> LuaResult<Lua> {
  let lua = Lua::new();
  let globals = lua.globals();

  globals.set("wrappedBuild", ctx.wrapped_build())?;
  globals.set("meadalpha", ctx.mead_alpha_macro())?;
  globals.set("meadrel", ctx.release())?;
  globals.set("meadversion", ctx.mead_version())?;
  globals.set("serial", ctx.serial().to_string())?;
  globals.set("specFile", staged.to_string_lossy().to_string())?;
  globals.set("rpm", helpers::create_rpm_helpers(&lua)?)?;

  Ok(lua)
}

/// Run `hook` against the staged spec file.
pub fn apply_patch_hook(hook: &PatchHook, staged: &Path, ctx: &BuildContext) -> Result<()> {
  let label = hook.label();
  let hook_error = |message: String| Error::Hook {
    hook: label.clone(),
    message,
  };

  let (source, chunk_name) = match hook {
    PatchHook::Inline(source) => (source.clone(), "=patch_hook".to_string()),
    PatchHook::File(path) => {
      let source = std::fs::read_to_string(path).map_err(Error::io("failed to read patch hook", path))?;
      (source, format!("@{}", path.display()))
    }
  };

  debug!(hook = %label, spec = %staged.display(), "running patch hook");
  let lua = create_runtime(staged, ctx).map_err(|e| hook_error(e.to_string()))?;
  lua
    .load(source.as_str())
    .set_name(chunk_name)
    .exec()
    .map_err(|e| hook_error(e.to_string()))?;

  info!(hook = %label, spec = %staged.display(), "applied patch hook");
  Ok(())
}
