//! Generate verb: binding source to a file or stdout.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use bindforge_core::{ExtensionBuilder, FlagSet, PipelineConfig};

/// Generate binding source for `source` and write it to `output`, or to
/// stdout when no sink is given. Nothing is written unless generation
/// succeeds.
pub fn execute(source: &Path, output: Option<&Path>, extra_flags: &[String]) -> anyhow::Result<()> {
    let builder = ExtensionBuilder::new(PipelineConfig::default())?;
    let flags: FlagSet = extra_flags.iter().cloned().collect();

    let text = builder.generate(source, &flags)?;

    match output {
        Some(path) => fs::write(path, text)?,
        None => io::stdout().write_all(text.as_bytes())?,
    }
    Ok(())
}
