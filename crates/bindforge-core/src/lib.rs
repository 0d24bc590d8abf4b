//! Core engine for the bindforge binding-generation pipeline.
//!
//! This crate drives an external source-analysis tool that reads annotated
//! C++ and emits glue source exposing selected declarations to a scripting
//! runtime, then compiles the result into a loadable extension module.
//!
//! The pipeline never parses the source language itself. It:
//! - infers the frontend-level compiler flags a translation unit needs,
//! - invokes the binding generator under a scoped diagnostic channel,
//! - assembles the final compile/link invocation for the loadable artifact.
//!
//! Every external invocation is synchronous and one-shot; every failure is
//! terminal for the current request and surfaced as a distinct
//! [`Error`] variant.

pub mod env_scope;
pub mod error;
pub mod pipeline;

pub use env_scope::EnvScope;
pub use error::{Error, Result};
pub use pipeline::{
    BindingRequest, BindingResult, BuildArtifact, Diagnostic, DiagnosticChannel,
    ExtensionBuilder, FlagSet, Generator, GeneratorMode, PipelineConfig, RuntimeConfig,
    Toolchain,
};
