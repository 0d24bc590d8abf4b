//! Build verb: generate bindings and link a loadable extension module.

use std::path::{Path, PathBuf};

use bindforge_core::{ExtensionBuilder, FlagSet, PipelineConfig};

/// Build `sources` into a loadable extension module, generating bindings
/// for the first source. Prints the artifact path on success.
pub fn execute(
    sources: &[PathBuf],
    output: Option<&Path>,
    debugger: bool,
    suppressions: Vec<String>,
    include_dirs: Vec<PathBuf>,
    extra_flags: &[String],
) -> anyhow::Result<()> {
    let config = PipelineConfig {
        debugger_wrap: debugger,
        warning_suppressions: suppressions.into_iter().collect(),
        extra_include_dirs: include_dirs,
    };

    let builder = ExtensionBuilder::new(config)?;
    let flags: FlagSet = extra_flags.iter().cloned().collect();

    let artifact = builder.build(sources, &flags, output)?;
    println!("{}", artifact.path.display());
    Ok(())
}
