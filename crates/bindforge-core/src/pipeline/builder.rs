//! The binding build pipeline: annotated source in, loadable artifact out.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::pipeline::generator::Generator;
use crate::pipeline::runtime::RuntimeConfig;
use crate::pipeline::toolchain::Toolchain;
use crate::pipeline::types::{
    BindingRequest, BindingResult, BuildArtifact, FlagSet, GeneratorMode, PipelineConfig,
};

/// Orchestrates generation and compilation of one extension module.
///
/// One configurable pipeline serves both the generate-only and the full
/// build flow; the recognized options live in [`PipelineConfig`].
#[derive(Debug)]
pub struct ExtensionBuilder {
    config: PipelineConfig,
    toolchain: Toolchain,
    generator: Generator,
    runtime: RuntimeConfig,
}

impl ExtensionBuilder {
    /// Discover the toolchain, the generator, and the runtime build
    /// configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let toolchain = Toolchain::detect()?;
        let generator = Generator::locate()?;
        let runtime = RuntimeConfig::query()?;
        Ok(Self::from_parts(config, toolchain, generator, runtime))
    }

    /// Assemble a builder from already-resolved parts.
    pub fn from_parts(
        config: PipelineConfig,
        toolchain: Toolchain,
        generator: Generator,
        runtime: RuntimeConfig,
    ) -> Self {
        let generator = generator.with_debugger(config.debugger_wrap);
        Self {
            config,
            toolchain,
            generator,
            runtime,
        }
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn runtime(&self) -> &RuntimeConfig {
        &self.runtime
    }

    /// Run the generator for `source`, returning the raw outcome.
    pub fn run_generator(&self, source: &Path, extra_flags: &FlagSet) -> Result<BindingResult> {
        let user_flags = self.user_flags(extra_flags);
        tracing::debug!(source = %source.display(), flags = %user_flags, "assembled user-level flags");
        let frontend_flags = self.toolchain.infer_frontend_flags(&user_flags, source)?;
        let request = BindingRequest::new(source, frontend_flags, GeneratorMode::Generate)?;
        self.generator.generate(&request)
    }

    /// Generate binding source for `source`, turning generator-reported
    /// diagnostics into a typed failure.
    pub fn generate(&self, source: &Path, extra_flags: &FlagSet) -> Result<String> {
        match self.run_generator(source, extra_flags)? {
            BindingResult::Generated(text) => Ok(text),
            BindingResult::Failed(diagnostics) => Err(Error::GenerationFailed { diagnostics }),
        }
    }

    /// Generate bindings for the first source, then compile and link all
    /// sources into a loadable extension module.
    ///
    /// A generation failure aborts before any compiler invocation. The
    /// artifact appears at its final path only on full success; a failed
    /// link leaves nothing behind.
    pub fn build(
        &self,
        sources: &[PathBuf],
        extra_flags: &FlagSet,
        output: Option<&Path>,
    ) -> Result<BuildArtifact> {
        let (primary, additional) = sources.split_first().ok_or_else(|| {
            Error::Toolchain("build requires at least one source file".into())
        })?;

        let generated = self.generate(primary, extra_flags)?;

        // Alongside the primary source, so relative includes resolve the
        // same way they do for the original file.
        let mut generated_file = tempfile::Builder::new()
            .prefix("bindforge-")
            .suffix(".cpp")
            .tempfile_in(parent_dir(primary))?;
        generated_file.write_all(generated.as_bytes())?;
        generated_file.flush()?;

        let output_path = match output {
            Some(path) => path.to_path_buf(),
            None => self.default_output_path(primary)?,
        };

        let link_flags = self
            .user_flags(extra_flags)
            .chain(&self.filtered(self.runtime.link_flags()));

        let mut inputs: Vec<PathBuf> = additional.to_vec();
        inputs.push(generated_file.path().to_path_buf());

        // Link to a scratch path and rename into place, so a failed link
        // never leaves a partial artifact at the destination.
        let staged = tempfile::Builder::new()
            .prefix("bindforge-out-")
            .suffix(".tmp")
            .tempfile_in(parent_dir(&output_path))?;
        self.toolchain
            .link_shared(&link_flags, &inputs, staged.path())?;
        staged
            .persist(&output_path)
            .map_err(|err| Error::Io(err.error))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&output_path)?.permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&output_path, perms)?;
        }

        tracing::info!(artifact = %output_path.display(), "built extension module");

        Ok(BuildArtifact {
            path: output_path,
            ext_suffix: self.runtime.ext_suffix().to_string(),
        })
    }

    /// User-level flag set for one translation unit: fixed toolchain flags,
    /// extra include directories, runtime include flags, caller extras.
    fn user_flags(&self, extra_flags: &FlagSet) -> FlagSet {
        let mut flags = self.toolchain.fixed_flags().clone();
        for dir in &self.config.extra_include_dirs {
            flags.push(format!("-I{}", dir.display()));
        }
        flags
            .chain(&self.filtered(self.runtime.include_flags()))
            .chain(extra_flags)
    }

    fn filtered(&self, flags: &FlagSet) -> FlagSet {
        flags
            .iter()
            .filter(|flag| !self.config.warning_suppressions.contains(flag.as_str()))
            .cloned()
            .collect()
    }

    /// `<source stem><EXT_SUFFIX>`, next to the source file.
    fn default_output_path(&self, source: &Path) -> Result<PathBuf> {
        let stem = source
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| {
                Error::Toolchain(format!(
                    "cannot derive a module name from {}",
                    source.display()
                ))
            })?;
        Ok(parent_dir(source).join(format!("{stem}{}", self.runtime.ext_suffix())))
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_builder(config: PipelineConfig) -> ExtensionBuilder {
        ExtensionBuilder::from_parts(
            config,
            Toolchain::with_driver("/stub/cxx"),
            Generator::from_binary("/stub/bindforge-gen"),
            RuntimeConfig::from_parts(
                ["-I/py/include", "-Wall"].into_iter().collect(),
                ["-lpython3.11", "-Wall"].into_iter().collect(),
                ".cpython-311-x86_64-linux-gnu.so",
            ),
        )
    }

    #[test]
    fn user_flags_compose_in_documented_order() {
        let builder = test_builder(PipelineConfig::default().with_include_dir("vendor/include"));
        let extra: FlagSet = ["-DDEMO"].into_iter().collect();

        let flags = builder.user_flags(&extra);

        assert_eq!(
            flags.as_slice(),
            [
                "-std=c++11",
                "-Ivendor/include",
                "-I/py/include",
                "-Wall",
                "-DDEMO",
            ]
        );
    }

    #[test]
    fn suppressions_strip_runtime_flags() {
        let builder = test_builder(PipelineConfig::default().suppress("-Wall"));

        let flags = builder.user_flags(&FlagSet::new());
        assert!(!flags.iter().any(|flag| flag == "-Wall"));

        let link = builder.filtered(builder.runtime.link_flags());
        assert_eq!(link.as_slice(), ["-lpython3.11"]);
    }

    #[test]
    fn default_output_path_uses_runtime_suffix() {
        let builder = test_builder(PipelineConfig::default());

        let path = builder
            .default_output_path(Path::new("demo/widget.cpp"))
            .unwrap();
        assert_eq!(
            path,
            Path::new("demo/widget.cpython-311-x86_64-linux-gnu.so")
        );

        let bare = builder.default_output_path(Path::new("widget.cpp")).unwrap();
        assert_eq!(
            bare,
            Path::new("./widget.cpython-311-x86_64-linux-gnu.so")
        );
    }

    #[test]
    fn build_rejects_an_empty_source_list() {
        let builder = test_builder(PipelineConfig::default());
        let err = builder.build(&[], &FlagSet::new(), None).unwrap_err();
        assert!(matches!(err, Error::Toolchain(_)));
    }
}
