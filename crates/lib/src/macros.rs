//! rpmbuild macro definitions and command-line assembly.
//!
//! The argument list handed to rpmbuild always has the same shape:
//!
//! ```text
//! --define=_topdir <working>      --define=_sourcedir <working>
//! --define=_rpmdir <output>       --define=_srcrpmdir <output>
//! --define=_specdir <spec>        --define=_builddir <build>
//! --define=<user macro> <value>   ... (insertion order)
//! -ba <staged spec>
//! ```

use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::consts::BUILD_ALL_FLAG;
use crate::context::BuildContext;

/// Names of the path macros every build defines, in emission order.
pub const FIXED_MACROS: [&str; 6] = ["_topdir", "_sourcedir", "_rpmdir", "_srcrpmdir", "_specdir", "_builddir"];

/// An ordered set of macro definitions.
///
/// Insertion order is preserved. Inserting a name that already exists
/// replaces its value without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroSet {
  entries: Vec<(String, String)>,
}

impl MacroSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert or override a definition. Returns the previous value, if any.
  pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
    let name = name.into();
    let value = value.into();
    match self.entries.iter_mut().find(|(n, _)| *n == name) {
      Some((_, existing)) => Some(std::mem::replace(existing, value)),
      None => {
        self.entries.push((name, value));
        None
      }
    }
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Render every entry as a `--define=<name> <value>` argument.
  pub fn define_args(&self) -> Vec<String> {
    self.iter().map(|(n, v)| define_arg(n, v)).collect()
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MacroSet {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut set = MacroSet::new();
    for (k, v) in iter {
      set.insert(k, v);
    }
    set
  }
}

impl<'de> Deserialize<'de> for MacroSet {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    struct MacroSetVisitor;

    impl<'de> Visitor<'de> for MacroSetVisitor {
      type Value = MacroSet;

      fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a table of macro names to string values")
      }

      fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<MacroSet, A::Error> {
        let mut set = MacroSet::new();
        while let Some((name, value)) = map.next_entry::<String, String>()? {
          set.insert(name, value);
        }
        Ok(set)
      }
    }

    deserializer.deserialize_map(MacroSetVisitor)
  }
}

/// A single `--define=<name> <value>` argument.
pub fn define_arg(name: &str, value: &str) -> String {
  format!("--define={} {}", name, value)
}

/// The fixed path macros for a build.
pub fn fixed_macros(ctx: &BuildContext) -> MacroSet {
  let working = ctx.working_dir().display().to_string();
  let output = ctx.output_dir().display().to_string();
  let values = [
    working.clone(),
    working,
    output.clone(),
    output,
    ctx.spec_dir().display().to_string(),
    ctx.build_dir().display().to_string(),
  ];
  FIXED_MACROS.iter().copied().zip(values).collect()
}

/// Assemble the complete rpmbuild argument list.
///
/// The six fixed definitions always come first, unchanged. User macros are
/// appended after them, so a user macro reusing a fixed name is passed as a
/// second definition and rpmbuild's last-definition-wins rule applies.
pub fn build_args(ctx: &BuildContext, user: &MacroSet, staged_spec: &Path) -> Vec<String> {
  let mut args = fixed_macros(ctx).define_args();
  args.extend(user.define_args());
  args.push(BUILD_ALL_FLAG.to_string());
  args.push(staged_spec.display().to_string());
  args
}

/// Render a command line so it can be pasted into a shell.
///
/// Arguments containing `=` are quoted after their first `=`:
/// `--define=_topdir /w` becomes `--define='_topdir /w'`.
pub fn shell_echo(program: &str, args: &[String]) -> String {
  let mut line = program.to_string();
  for arg in args {
    line.push(' ');
    match arg.split_once('=') {
      Some((flag, rest)) => {
        line.push_str(flag);
        line.push_str("='");
        line.push_str(rest);
        line.push('\'');
      }
      None => line.push_str(arg),
    }
  }
  line
}
