//! Common types for the binding-generation pipeline.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Flag telling the generator to emit binding source rather than only
/// analyze the translation unit.
pub const GENERATION_MODE_FLAG: &str = "-DBINDFORGE_RUN";

/// An ordered sequence of opaque command-line tokens.
///
/// Order is significant: later flags may override earlier ones in the
/// underlying toolchain. Composition produces new sequences; a set handed to
/// a process invocation is not mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet(Vec<String>);

impl FlagSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, flag: impl Into<String>) {
        self.0.push(flag.into());
    }

    /// A new sequence: `self` followed by `other`.
    pub fn chain(&self, other: &FlagSet) -> FlagSet {
        let mut combined = self.0.clone();
        combined.extend(other.0.iter().cloned());
        FlagSet(combined)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for FlagSet {
    fn from(flags: Vec<String>) -> Self {
        Self(flags)
    }
}

impl FromIterator<String> for FlagSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for FlagSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(String::from).collect())
    }
}

impl<'a> IntoIterator for &'a FlagSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for FlagSet {
    /// Shell-quoted rendering for logs and error text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match shlex::try_join(self.0.iter().map(String::as_str)) {
            Ok(joined) => f.write_str(&joined),
            Err(_) => f.write_str(&self.0.join(" ")),
        }
    }
}

/// What the generator should do with the translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorMode {
    /// Parse and diagnose only.
    Analyze,
    /// Emit binding source for the exported declarations.
    Generate,
}

/// One fully-determined generator invocation.
///
/// Immutable once constructed; a retry builds a fresh request rather than
/// reusing one with mutated flags.
#[derive(Debug, Clone)]
pub struct BindingRequest {
    source: PathBuf,
    flags: FlagSet,
    mode: GeneratorMode,
}

impl BindingRequest {
    /// Build a request for `source`, absolutizing the path.
    pub fn new(source: impl AsRef<Path>, flags: FlagSet, mode: GeneratorMode) -> Result<Self> {
        Ok(Self {
            source: std::path::absolute(source)?,
            flags,
            mode,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn mode(&self) -> GeneratorMode {
        self.mode
    }

    /// Generator argument vector: the source path, a separator, the frontend
    /// flags, and the generation-mode marker when bindings are requested.
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv: Vec<OsString> = vec![self.source.clone().into(), "--".into()];
        argv.extend(self.flags.iter().map(|flag| OsString::from(flag.as_str())));
        if self.mode == GeneratorMode::Generate {
            argv.push(GENERATION_MODE_FLAG.into());
        }
        argv
    }
}

/// Outcome of one binding-generation attempt.
#[derive(Debug)]
pub enum BindingResult {
    /// The generator produced binding source.
    Generated(String),
    /// The generator reported a defect in the input source.
    Failed(Vec<crate::pipeline::Diagnostic>),
}

impl BindingResult {
    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }

    /// Get the generated source text if generation succeeded.
    pub fn generated(&self) -> Option<&str> {
        match self {
            Self::Generated(text) => Some(text),
            Self::Failed(_) => None,
        }
    }

    /// Get the reported diagnostics if generation failed.
    pub fn diagnostics(&self) -> Option<&[crate::pipeline::Diagnostic]> {
        match self {
            Self::Generated(_) => None,
            Self::Failed(diagnostics) => Some(diagnostics),
        }
    }
}

/// A successfully built extension module.
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    /// Path of the loadable library.
    pub path: PathBuf,

    /// The runtime-specific suffix used to select the path.
    pub ext_suffix: String,
}

/// Options recognized by the build pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Run the generator under a debugger.
    pub debugger_wrap: bool,

    /// Flags stripped from the runtime-provided flag lists.
    pub warning_suppressions: BTreeSet<String>,

    /// Include directories searched during generation and compilation.
    pub extra_include_dirs: Vec<PathBuf>,
}

impl PipelineConfig {
    pub fn with_debugger(mut self, debugger_wrap: bool) -> Self {
        self.debugger_wrap = debugger_wrap;
        self
    }

    pub fn suppress(mut self, flag: impl Into<String>) -> Self {
        self.warning_suppressions.insert(flag.into());
        self
    }

    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extra_include_dirs.push(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_preserves_order_and_leaves_inputs_untouched() {
        let base: FlagSet = ["-std=c++11", "-Iinclude"].into_iter().collect();
        let extra: FlagSet = ["-DDEMO"].into_iter().collect();

        let combined = base.chain(&extra);

        assert_eq!(combined.as_slice(), ["-std=c++11", "-Iinclude", "-DDEMO"]);
        assert_eq!(base.len(), 2);
        assert_eq!(extra.len(), 1);
    }

    #[test]
    fn display_is_shell_quoted() {
        let flags: FlagSet = ["-I/opt/some dir", "-DX=1"].into_iter().collect();
        let rendered = flags.to_string();
        assert!(rendered.contains("'-I/opt/some dir'") || rendered.contains("\"-I/opt/some dir\""));
    }

    #[test]
    fn request_argv_carries_separator_and_mode_marker() {
        let flags: FlagSet = ["-cc1", "-triple"].into_iter().collect();
        let request =
            BindingRequest::new("widget.cpp", flags.clone(), GeneratorMode::Generate).unwrap();

        let argv = request.argv();
        assert!(request.source().is_absolute());
        assert_eq!(argv[1], "--");
        assert_eq!(argv[2], "-cc1");
        assert_eq!(argv.last().unwrap(), GENERATION_MODE_FLAG);

        let analysis = BindingRequest::new("widget.cpp", flags, GeneratorMode::Analyze).unwrap();
        assert!(!analysis.argv().iter().any(|arg| arg == GENERATION_MODE_FLAG));
    }

    #[test]
    fn result_accessors_match_the_populated_variant() {
        let generated = BindingResult::Generated("// bindings\n".into());
        assert!(generated.is_generated());
        assert_eq!(generated.generated(), Some("// bindings\n"));
        assert!(generated.diagnostics().is_none());

        let failed = BindingResult::Failed(Vec::new());
        assert!(!failed.is_generated());
        assert!(failed.generated().is_none());
        assert_eq!(failed.diagnostics(), Some(&[][..]));
    }

    #[test]
    fn config_builders_accumulate() {
        let config = PipelineConfig::default()
            .with_debugger(true)
            .suppress("-Wall")
            .with_include_dir("vendor/include");

        assert!(config.debugger_wrap);
        assert!(config.warning_suppressions.contains("-Wall"));
        assert_eq!(config.extra_include_dirs, [PathBuf::from("vendor/include")]);
    }
}
