//! Build configuration of the target scripting runtime.
//!
//! Include paths, link flags, and the extension-module suffix are queried
//! from the runtime's own `sysconfig` data, never hardcoded: they vary per
//! platform, per interpreter version, and per build (framework, static,
//! shared).

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};
use crate::pipeline::types::FlagSet;

/// Environment variable overriding the interpreter used for queries.
pub const PYTHON_VAR: &str = "PYTHON";

const INCLUDE_PROBE: &str = r#"import sysconfig
print(sysconfig.get_path('include'))
print(sysconfig.get_path('platinclude'))"#;

const EXT_SUFFIX_PROBE: &str = r#"import sysconfig
print(sysconfig.get_config_var('EXT_SUFFIX'))"#;

/// Mirrors the runtime's own link-flag computation: core libraries, the
/// interpreter library itself, the static-build library directory, and the
/// extra flags needed outside a framework build.
const LINK_FLAGS_PROBE: &str = r#"import sys, sysconfig
var = sysconfig.get_config_var
libs = (var('LIBS') or '').split() + (var('SYSLIBS') or '').split()
libs.append('-lpython' + var('VERSION') + sys.abiflags)
if not var('Py_ENABLE_SHARED'):
    libs.insert(0, '-L' + var('LIBPL'))
if not var('PYTHONFRAMEWORK'):
    libs.extend((var('LINKFORSHARED') or '').split())
print('\n'.join(libs))"#;

/// What the pipeline needs to know about the target runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    include_flags: FlagSet,
    link_flags: FlagSet,
    ext_suffix: String,
}

impl RuntimeConfig {
    /// Query the interpreter named by `$PYTHON`, falling back to `python3`
    /// from `PATH`.
    pub fn query() -> Result<Self> {
        let python = match std::env::var_os(PYTHON_VAR) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => which::which("python3").map_err(|_| {
                Error::RuntimeConfig(
                    "no interpreter found: set PYTHON or install python3".into(),
                )
            })?,
        };
        Self::query_interpreter(&python)
    }

    /// Query a specific interpreter.
    pub fn query_interpreter(python: &Path) -> Result<Self> {
        let include_flags = include_flags_from(&probe(python, INCLUDE_PROBE, "include paths")?);

        let link_flags = probe(python, LINK_FLAGS_PROBE, "link flags")?
            .split_whitespace()
            .map(String::from)
            .collect();

        let ext_suffix = probe(python, EXT_SUFFIX_PROBE, "extension suffix")?
            .trim()
            .to_string();
        if ext_suffix.is_empty() || ext_suffix == "None" {
            return Err(Error::RuntimeConfig(
                "interpreter reported no extension-module suffix".into(),
            ));
        }

        tracing::debug!(%ext_suffix, "queried runtime build configuration");

        Ok(Self {
            include_flags,
            link_flags,
            ext_suffix,
        })
    }

    /// Assemble a configuration without probing, for embedders that already
    /// know their runtime.
    pub fn from_parts(
        include_flags: FlagSet,
        link_flags: FlagSet,
        ext_suffix: impl Into<String>,
    ) -> Self {
        Self {
            include_flags,
            link_flags,
            ext_suffix: ext_suffix.into(),
        }
    }

    pub fn include_flags(&self) -> &FlagSet {
        &self.include_flags
    }

    pub fn link_flags(&self) -> &FlagSet {
        &self.link_flags
    }

    /// Platform- and version-specific suffix for loadable extension
    /// modules, leading dot included.
    pub fn ext_suffix(&self) -> &str {
        &self.ext_suffix
    }
}

/// One include flag per reported directory; `platinclude` frequently equals
/// `include` and collapses.
fn include_flags_from(paths: &str) -> FlagSet {
    let mut seen = Vec::new();
    let mut flags = FlagSet::new();
    for dir in paths.lines().map(str::trim).filter(|dir| !dir.is_empty()) {
        if !seen.contains(&dir) {
            seen.push(dir);
            flags.push(format!("-I{dir}"));
        }
    }
    flags
}

fn probe(python: &Path, code: &str, what: &str) -> Result<String> {
    let output = Command::new(python)
        .arg("-c")
        .arg(code)
        .output()
        .map_err(|err| {
            Error::RuntimeConfig(format!("failed to run {}: {err}", python.display()))
        })?;

    if !output.status.success() {
        return Err(Error::RuntimeConfig(format!(
            "querying {what} failed with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_paths_deduplicate() {
        let flags = include_flags_from("/usr/include/python3.11\n/usr/include/python3.11\n");
        assert_eq!(flags.as_slice(), ["-I/usr/include/python3.11"]);
    }

    #[test]
    fn distinct_include_paths_stay_ordered() {
        let flags = include_flags_from("/opt/py/include\n/opt/py/include/plat\n");
        assert_eq!(
            flags.as_slice(),
            ["-I/opt/py/include", "-I/opt/py/include/plat"]
        );
    }

    #[test]
    fn from_parts_round_trips() {
        let config = RuntimeConfig::from_parts(
            ["-I/py/include"].into_iter().collect(),
            ["-lpython3.11"].into_iter().collect(),
            ".cpython-311-x86_64-linux-gnu.so",
        );

        assert_eq!(config.include_flags().as_slice(), ["-I/py/include"]);
        assert_eq!(config.link_flags().as_slice(), ["-lpython3.11"]);
        assert_eq!(config.ext_suffix(), ".cpython-311-x86_64-linux-gnu.so");
    }
}
