//! bindforge CLI - generate scripting-runtime bindings and build extension
//! modules.

mod build;
mod generate;

use std::path::PathBuf;
use std::process::ExitCode;

use bindforge_core::Error;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bindforge")]
#[command(about = "Generate scripting-runtime bindings and build extension modules")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate binding source
    Generate {
        /// Input source file
        #[arg(short = 'c', value_name = "FILE")]
        source: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Additional compiler flags; prefix the first with --
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "FLAGS")]
        flags: Vec<String>,
    },

    /// Generate binding source and compile it into a loadable extension
    Build {
        /// Source files (the first is used as the generator input)
        #[arg(short = 'c', value_name = "FILE", required = true)]
        sources: Vec<PathBuf>,

        /// Output path (defaults to the source name plus the runtime suffix)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Run the generator under a debugger
        #[arg(long)]
        debugger: bool,

        /// Strip a flag from the runtime-provided flag lists (repeatable)
        #[arg(long = "suppress", value_name = "FLAG", allow_hyphen_values = true)]
        suppressions: Vec<String>,

        /// Extra include directory for generation and compilation (repeatable)
        #[arg(short = 'I', value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        /// Additional compiler flags; prefix the first with --
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "FLAGS")]
        flags: Vec<String>,
    },
}

// Stage-specific exit codes, so a harness can tell a generation failure
// from a compile failure without parsing stderr.
const EXIT_GENERATION_FAILED: u8 = 1;
const EXIT_COMPILE_LINK_FAILED: u8 = 2;
const EXIT_ENVIRONMENT_FAILED: u8 = 3;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(err),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            source,
            output,
            flags,
        } => generate::execute(&source, output.as_deref(), &flags),

        Commands::Build {
            sources,
            output,
            debugger,
            suppressions,
            include_dirs,
            flags,
        } => build::execute(
            &sources,
            output.as_deref(),
            debugger,
            suppressions,
            include_dirs,
            &flags,
        ),
    }
}

/// Report the failure with its pipeline stage and map it to the documented
/// exit code.
fn report(err: anyhow::Error) -> ExitCode {
    match err.downcast_ref::<Error>() {
        Some(core_err @ Error::GenerationFailed { diagnostics }) => {
            eprintln!("bindforge: [{}] {core_err}", core_err.stage());
            for diagnostic in diagnostics {
                eprintln!("{diagnostic}");
            }
            ExitCode::from(EXIT_GENERATION_FAILED)
        }
        Some(core_err @ Error::CompileLink { .. }) => {
            eprintln!("bindforge: [{}] {core_err}", core_err.stage());
            ExitCode::from(EXIT_COMPILE_LINK_FAILED)
        }
        Some(core_err) => {
            eprintln!("bindforge: [{}] {core_err}", core_err.stage());
            ExitCode::from(EXIT_ENVIRONMENT_FAILED)
        }
        None => {
            eprintln!("bindforge: {err:#}");
            ExitCode::FAILURE
        }
    }
}
