use std::fs;

use mlua::prelude::*;

/// Create the `rpm` table with text-file helpers for patch hooks.
pub fn create_rpm_helpers(lua: &Lua) -> LuaResult<LuaTable> {
  let rpm = lua.create_table()?;

  // rpm.substitute(path, from, to) - Replace every literal occurrence, returns the count
  rpm.set(
    "substitute",
    lua.create_function(|_, (path, from, to): (String, String, String)| substitute_file(&path, &from, &to))?,
  )?;

  // rpm.read(path) - Read a whole text file
  rpm.set(
    "read",
    lua.create_function(|_, path: String| {
      fs::read_to_string(&path).map_err(|e| LuaError::external(format!("cannot read '{}': {}", path, e)))
    })?,
  )?;

  // rpm.write(path, content) - Replace a file's content
  rpm.set(
    "write",
    lua.create_function(|_, (path, content): (String, String)| {
      fs::write(&path, content).map_err(|e| LuaError::external(format!("cannot write '{}': {}", path, e)))
    })?,
  )?;

  Ok(rpm)
}

fn substitute_file(path: &str, from: &str, to: &str) -> LuaResult<usize> {
  if from.is_empty() {
    return Err(LuaError::external("substitute: search text must not be empty"));
  }
  let content = fs::read_to_string(path).map_err(|e| LuaError::external(format!("cannot read '{}': {}", path, e)))?;
  let count = content.matches(from).count();
  if count > 0 {
    fs::write(path, content.replace(from, to))
      .map_err(|e| LuaError::external(format!("cannot write '{}': {}", path, e)))?;
  }
  Ok(count)
}
