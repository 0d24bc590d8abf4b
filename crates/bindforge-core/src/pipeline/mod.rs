//! Binding-generation build pipeline.
//!
//! This module provides:
//! - Toolchain discovery and frontend flag inference (driver dry-run)
//! - The diagnostic capture channel (scoped side channel for generator errors)
//! - Binding generator invocation
//! - Runtime build-configuration queries (includes, link flags, suffix)
//! - The build orchestrator (generate-only and full build)
//!
//! # Architecture
//!
//! ```text
//! annotated source (.cpp)
//!     │
//!     ├── Toolchain ── `-###` dry run ──► frontend-level FlagSet
//!     │
//!     ├── Generator ── source + flags ──► Generated(source text)
//!     │        │                          or Failed(diagnostics)
//!     │        └── DiagnosticChannel (env-named temp file)
//!     │
//!     └── ExtensionBuilder ── driver compile/link ──► <stem><EXT_SUFFIX>
//! ```

mod builder;
mod diagnostics;
mod generator;
mod runtime;
mod toolchain;
mod types;

pub use builder::ExtensionBuilder;
pub use diagnostics::{DIAG_PATH_VAR, Diagnostic, DiagnosticChannel, parse_documents};
pub use generator::{GENERATOR_BIN, GENERATOR_VAR, Generator};
pub use runtime::{PYTHON_VAR, RuntimeConfig};
pub use toolchain::{CXX_VAR, Toolchain};
pub use types::{
    BindingRequest, BindingResult, BuildArtifact, FlagSet, GENERATION_MODE_FLAG, GeneratorMode,
    PipelineConfig,
};
