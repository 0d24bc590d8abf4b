//! Locating and invoking the external binding generator.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::env_scope::EnvScope;
use crate::error::{Error, Result};
use crate::pipeline::diagnostics::DiagnosticChannel;
use crate::pipeline::types::{BindingRequest, BindingResult};

/// Environment variable overriding the generator executable location.
pub const GENERATOR_VAR: &str = "BINDFORGE_GENERATOR";

/// Name of the generator executable.
pub const GENERATOR_BIN: &str = "bindforge-gen";

/// Runs the binding generator, one request at a time.
#[derive(Debug, Clone)]
pub struct Generator {
    binary: PathBuf,
    debugger_wrap: bool,
}

impl Generator {
    /// Find the generator relative to the running executable.
    ///
    /// `$BINDFORGE_GENERATOR` overrides the search; otherwise the installed
    /// location is preferred over the build-tree location. If neither
    /// exists the failure is permanent.
    pub fn locate() -> Result<Self> {
        if let Some(path) = std::env::var_os(GENERATOR_VAR).filter(|path| !path.is_empty()) {
            return Ok(Self::from_binary(PathBuf::from(path)));
        }

        let mut searched = Vec::new();
        for candidate in install_candidates()? {
            if candidate.exists() {
                return Ok(Self::from_binary(candidate));
            }
            searched.push(candidate);
        }
        Err(Error::GeneratorNotFound { searched })
    }

    pub fn from_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            debugger_wrap: false,
        }
    }

    /// Run the generator under a debugger.
    pub fn with_debugger(mut self, debugger_wrap: bool) -> Self {
        self.debugger_wrap = debugger_wrap;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run one binding-generation attempt over a fresh diagnostic channel.
    pub fn generate(&self, request: &BindingRequest) -> Result<BindingResult> {
        let channel = DiagnosticChannel::create()?;
        self.generate_with(request, &channel)
    }

    /// Run one binding-generation attempt over a caller-supplied channel.
    ///
    /// Exit 0 yields the generated source from stdout; a non-zero exit
    /// yields whatever structured diagnostics the generator wrote to the
    /// channel. A failed generation is terminal and user-actionable (the
    /// input source has a defect), so no retry happens here.
    pub fn generate_with(
        &self,
        request: &BindingRequest,
        channel: &DiagnosticChannel,
    ) -> Result<BindingResult> {
        let mut cmd = if self.debugger_wrap {
            let mut cmd = Command::new("lldb");
            cmd.arg("--").arg(&self.binary);
            cmd
        } else {
            Command::new(&self.binary)
        };
        cmd.args(request.argv());

        tracing::debug!(
            generator = %self.binary.display(),
            source = %request.source().display(),
            "invoking binding generator"
        );

        let output = {
            // The channel variable is visible to the generator only for the
            // duration of this one invocation.
            let _channel_scope = EnvScope::apply([channel.env_binding()]);
            cmd.output().map_err(|err| {
                Error::Toolchain(format!("failed to run {}: {err}", self.binary.display()))
            })?
        };

        if output.status.success() {
            Ok(BindingResult::Generated(
                String::from_utf8_lossy(&output.stdout).into_owned(),
            ))
        } else {
            tracing::debug!(status = %output.status, "binding generator reported failure");
            Ok(BindingResult::Failed(channel.collect()?))
        }
    }
}

fn install_candidates() -> Result<Vec<PathBuf>> {
    let exe = std::env::current_exe()?;
    let prefix = exe.parent().and_then(Path::parent).ok_or_else(|| {
        Error::Toolchain("cannot resolve the executable's install prefix".into())
    })?;
    Ok(vec![
        prefix.join("bin").join(GENERATOR_BIN),
        prefix.join("build").join("bin").join(GENERATOR_BIN),
    ])
}
