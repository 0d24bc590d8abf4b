//! Error types for bindforge-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::Diagnostic;

/// Result type for bindforge-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the binding-generation pipeline.
///
/// None of these are recovered locally: every failure aborts the pipeline
/// for the current request and is surfaced to the caller as a distinct
/// condition, so a harness can assert on which stage failed.
#[derive(Debug, Error)]
pub enum Error {
    /// The dry-run driver invocation failed, or its plan contained no
    /// recognizable frontend invocation.
    #[error("flag inference failed: {message}")]
    FlagInference { message: String },

    /// The binding generator exited non-zero. Carries the parsed diagnostic
    /// list, which may be empty when the generator reported nothing
    /// structured.
    #[error("binding generation failed ({} diagnostics)", diagnostics.len())]
    GenerationFailed { diagnostics: Vec<Diagnostic> },

    /// The final compile/link invocation exited non-zero.
    #[error("compile/link failed: {message}")]
    CompileLink { message: String },

    /// The generator executable exists at none of its install locations.
    #[error("binding generator not found (searched: {})", searched.iter().map(|path| path.display().to_string()).collect::<Vec<_>>().join(", "))]
    GeneratorNotFound { searched: Vec<PathBuf> },

    /// Toolchain misconfiguration.
    #[error("toolchain error: {0}")]
    Toolchain(String),

    /// Querying the scripting runtime's build configuration failed.
    #[error("runtime configuration error: {0}")]
    RuntimeConfig(String),

    /// The diagnostic capture file held a malformed document.
    #[error("malformed diagnostic document: {0}")]
    DiagnosticFormat(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Pipeline stage this error belongs to, for stage-labelled reporting.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::FlagInference { .. } => "flag-inference",
            Error::GenerationFailed { .. } => "generate",
            Error::CompileLink { .. } => "compile-link",
            Error::GeneratorNotFound { .. } | Error::Toolchain(_) => "toolchain",
            Error::RuntimeConfig(_) => "runtime-config",
            Error::DiagnosticFormat(_) => "diagnostics",
            Error::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_labels_are_distinct_per_taxonomy_entry() {
        let inference = Error::FlagInference {
            message: "driver exited with 1".into(),
        };
        let generation = Error::GenerationFailed {
            diagnostics: Vec::new(),
        };
        let link = Error::CompileLink {
            message: "undefined symbol".into(),
        };

        assert_eq!(inference.stage(), "flag-inference");
        assert_eq!(generation.stage(), "generate");
        assert_eq!(link.stage(), "compile-link");
    }

    #[test]
    fn generation_failure_reports_diagnostic_count() {
        let err = Error::GenerationFailed {
            diagnostics: vec![
                Diagnostic {
                    filename: "widget.cpp".into(),
                    line: 3,
                    col: 7,
                    message: "getter must have no parameters".into(),
                },
            ],
        };
        assert!(err.to_string().contains("1 diagnostics"));
    }
}
