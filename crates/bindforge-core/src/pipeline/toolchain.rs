//! Host toolchain discovery and frontend flag inference.
//!
//! The driver accepts user-level flags and expands them through a hidden
//! multi-stage translation into the flags its single-translation-unit
//! frontend actually consumes (system include search paths among them). The
//! generator needs those frontend-level flags, so they are recovered from
//! the driver's own show-commands plan rather than re-derived.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};
use crate::pipeline::types::FlagSet;

/// Environment variable overriding the C++ driver executable.
pub const CXX_VAR: &str = "CXX";

/// Marker token identifying the frontend invocation in the driver's plan.
const FRONTEND_MARKER: &str = "-cc1";

/// The pipeline hands the frontend a superset of flags it may not all
/// consume; these silence the resulting unused-argument warnings.
const DRIVER_SUPPRESSION_FLAGS: &[&str] = &["-Qunused-arguments"];

/// The host C++ driver and the fixed flags every pipeline invocation uses.
#[derive(Debug, Clone)]
pub struct Toolchain {
    cxx: PathBuf,
    fixed_flags: FlagSet,
}

impl Toolchain {
    /// Resolve the driver: `$CXX` wins, otherwise `c++` from `PATH`.
    pub fn detect() -> Result<Self> {
        let cxx = match std::env::var_os(CXX_VAR) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => which::which("c++").map_err(|_| {
                Error::Toolchain("no C++ driver found: set CXX or install c++".into())
            })?,
        };

        let mut toolchain = Self::with_driver(cxx);
        if let Some(dir) = support_include_dir() {
            toolchain.fixed_flags.push(format!("-I{}", dir.display()));
        }
        Ok(toolchain)
    }

    /// Use a specific driver with the default fixed flags.
    pub fn with_driver(cxx: impl Into<PathBuf>) -> Self {
        Self {
            cxx: cxx.into(),
            fixed_flags: ["-std=c++11"].into_iter().collect(),
        }
    }

    pub fn driver(&self) -> &Path {
        &self.cxx
    }

    pub fn fixed_flags(&self) -> &FlagSet {
        &self.fixed_flags
    }

    /// Infer the frontend-level flags the driver would hand its frontend
    /// stage for `source` under the user-level `flags`.
    ///
    /// Runs the driver once in show-commands mode and extracts the frontend
    /// command line from the plan. A driver failure or an unrecognizable
    /// plan is fatal: falling back to the user-level flags would drop
    /// driver-resolved flags and produce spurious "header not found"
    /// failures downstream.
    pub fn infer_frontend_flags(&self, flags: &FlagSet, source: &Path) -> Result<FlagSet> {
        let mut unit = flags.clone();
        unit.push("-c");
        unit.push(source.display().to_string());

        // The driver may drop flags it believes are single-use, so the list
        // is passed twice.
        let output = Command::new(&self.cxx)
            .arg("-###")
            .args(unit.iter())
            .args(unit.iter())
            .output()
            .map_err(|err| {
                Error::Toolchain(format!("failed to run {}: {err}", self.cxx.display()))
            })?;

        let plan = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(Error::FlagInference {
                message: format!("driver exited with {}:\n{plan}", output.status),
            });
        }

        tracing::debug!(
            driver = %self.cxx.display(),
            source = %source.display(),
            "scanning driver plan for the frontend invocation"
        );

        extract_frontend_flags(&plan).ok_or_else(|| Error::FlagInference {
            message: format!("no frontend invocation in driver plan:\n{plan}"),
        })
    }

    /// Compile and link `inputs` into a shared library at `output`.
    pub fn link_shared(&self, flags: &FlagSet, inputs: &[PathBuf], output: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.cxx);
        cmd.args(flags.iter())
            .args(inputs)
            .arg("-shared")
            .arg("-o")
            .arg(output);

        tracing::debug!(command = ?cmd, "compiling and linking extension module");

        let result = cmd.output().map_err(|err| {
            Error::Toolchain(format!("failed to run {}: {err}", self.cxx.display()))
        })?;

        if !result.status.success() {
            return Err(Error::CompileLink {
                message: format!(
                    "driver exited with {}:\n{}",
                    result.status,
                    String::from_utf8_lossy(&result.stderr)
                ),
            });
        }
        Ok(())
    }
}

/// Extract the frontend command line from the driver's plan output.
///
/// The frontend invocation is the plan line carrying the marker token.
/// Tokens are split with shell-word rules and taken up to, not including,
/// the output-path flag; flags after the output path are irrelevant to
/// re-derivation. The driver-suppression flags are prepended.
fn extract_frontend_flags(plan: &str) -> Option<FlagSet> {
    for line in plan.lines() {
        if !line.contains(FRONTEND_MARKER) {
            continue;
        }
        let words = shlex::split(line)?;
        return Some(
            DRIVER_SUPPRESSION_FLAGS
                .iter()
                .map(|flag| flag.to_string())
                .chain(words.into_iter().take_while(|word| word != "-o"))
                .collect(),
        );
    }
    None
}

/// Directory of the annotation support headers shipped alongside the tool,
/// when running from an installed or build tree.
fn support_include_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let prefix = exe.parent()?.parent()?;
    let dir = prefix.join("include");
    dir.is_dir().then_some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = concat!(
        "clang version 15.0.7\n",
        "Target: x86_64-pc-linux-gnu\n",
        " \"/usr/lib/llvm-15/bin/clang\" \"-cc1\" \"-triple\" \"x86_64-pc-linux-gnu\" ",
        "\"-emit-obj\" \"-isystem\" \"/usr/include/c++/v1\" \"-o\" \"/tmp/widget.o\" ",
        "\"-x\" \"c++\" \"widget.cpp\"\n",
    );

    #[test]
    fn extracts_tokens_up_to_output_flag() {
        let flags = extract_frontend_flags(PLAN).unwrap();

        assert_eq!(flags.as_slice()[0], "-Qunused-arguments");
        assert!(flags.iter().any(|flag| flag == "-cc1"));
        assert!(flags.iter().any(|flag| flag == "/usr/include/c++/v1"));
        // Nothing at or after `-o` survives.
        assert!(!flags.iter().any(|flag| flag == "-o"));
        assert!(!flags.iter().any(|flag| flag == "/tmp/widget.o"));
        assert!(!flags.iter().any(|flag| flag == "widget.cpp"));
    }

    #[test]
    fn extraction_is_deterministic() {
        assert_eq!(extract_frontend_flags(PLAN), extract_frontend_flags(PLAN));
    }

    #[test]
    fn plan_without_frontend_line_yields_nothing() {
        let plan = "clang version 15.0.7\nTarget: x86_64-pc-linux-gnu\n";
        assert_eq!(extract_frontend_flags(plan), None);
    }

    #[test]
    fn preamble_lines_are_skipped() {
        let flags = extract_frontend_flags(PLAN).unwrap();
        assert!(!flags.iter().any(|flag| flag.contains("clang version")));
    }
}
