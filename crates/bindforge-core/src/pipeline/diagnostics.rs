//! Structured generator diagnostics and the capture channel that carries
//! them across the process boundary.
//!
//! The generator signals failure only through its exit status; structured
//! per-error records travel through a side channel: a private temporary file
//! whose path is advertised in the environment for the duration of one
//! invocation. On failure the file holds a sequence of independent YAML
//! documents, one per error.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Environment variable naming the file the generator writes diagnostics to.
pub const DIAG_PATH_VAR: &str = "BINDFORGE_EMIT_YAML_DIAG";

/// One generation-time error, as reported by the generator's own diagnostic
/// engine.
///
/// Line and column are 1-based source positions. Equality is structural over
/// all four fields; the generator guarantees no emission order, so lists are
/// compared as sets. Field order doubles as the deterministic sort key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub filename: String,
    pub line: u32,
    pub col: u32,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.filename, self.line, self.col, self.message
        )
    }
}

/// Parse a sequence of YAML documents into a diagnostic list.
///
/// An empty input yields an empty list, never an absent one, so comparison
/// logic stays uniform. The result is sorted by (filename, line, col,
/// message) and deduplicated; the generator's emission order carries no
/// meaning.
pub fn parse_documents(text: &str) -> Result<Vec<Diagnostic>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut diagnostics = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        match Option::<Diagnostic>::deserialize(document) {
            Ok(Some(diagnostic)) => diagnostics.push(diagnostic),
            // Empty documents (a trailing separator) carry nothing.
            Ok(None) => {}
            Err(err) => return Err(Error::DiagnosticFormat(err.to_string())),
        }
    }

    diagnostics.sort();
    diagnostics.dedup();
    Ok(diagnostics)
}

/// A scoped side channel for one binding-generation attempt.
///
/// Create the channel, advertise [`DiagnosticChannel::env_binding`] to the
/// generator process, and [`collect`](DiagnosticChannel::collect) after a
/// failing exit. The backing file is private to this channel and removed on
/// drop, whatever the outcome, so repeated invocations leak nothing.
#[derive(Debug)]
pub struct DiagnosticChannel {
    file: NamedTempFile,
}

impl DiagnosticChannel {
    pub fn create() -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("bindforge-diag-")
            .suffix(".yaml")
            .tempfile()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// The environment binding that advertises this channel to the
    /// generator.
    pub fn env_binding(&self) -> (&'static str, &Path) {
        (DIAG_PATH_VAR, self.file.path())
    }

    /// Read back whatever the generator wrote.
    pub fn collect(&self) -> Result<Vec<Diagnostic>> {
        let text = fs::read_to_string(self.file.path())?;
        parse_documents(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn diag(filename: &str, line: u32, col: u32, message: &str) -> Diagnostic {
        Diagnostic {
            filename: filename.into(),
            line,
            col,
            message: message.into(),
        }
    }

    #[test]
    fn parses_multiple_documents() {
        let text = "---\nfilename: /src/widget.cpp\nline: 11\ncol: 14\nmessage: \"no Conversion specialization for type 'class Foo'\"\n---\nfilename: /src/widget.cpp\nline: 16\ncol: 30\nmessage: \"no Conversion specialization for type 'class Foo'\"\n";

        let diagnostics = parse_documents(text).unwrap();

        assert_eq!(
            diagnostics,
            vec![
                diag(
                    "/src/widget.cpp",
                    11,
                    14,
                    "no Conversion specialization for type 'class Foo'"
                ),
                diag(
                    "/src/widget.cpp",
                    16,
                    30,
                    "no Conversion specialization for type 'class Foo'"
                ),
            ]
        );
    }

    #[test]
    fn document_order_does_not_matter() {
        let forward = "---\nfilename: a.cpp\nline: 1\ncol: 2\nmessage: first\n---\nfilename: b.cpp\nline: 3\ncol: 4\nmessage: second\n";
        let reversed = "---\nfilename: b.cpp\nline: 3\ncol: 4\nmessage: second\n---\nfilename: a.cpp\nline: 1\ncol: 2\nmessage: first\n";

        assert_eq!(
            parse_documents(forward).unwrap(),
            parse_documents(reversed).unwrap()
        );
    }

    #[test]
    fn empty_input_is_an_empty_list() {
        assert_eq!(parse_documents("").unwrap(), Vec::new());
        assert_eq!(parse_documents("   \n").unwrap(), Vec::new());
    }

    #[test]
    fn duplicate_records_collapse() {
        let text = "---\nfilename: a.cpp\nline: 1\ncol: 2\nmessage: repeated\n---\nfilename: a.cpp\nline: 1\ncol: 2\nmessage: repeated\n";
        assert_eq!(parse_documents(text).unwrap().len(), 1);
    }

    #[test]
    fn malformed_document_is_a_format_error() {
        let text = "---\nfilename: a.cpp\nline: not-a-number\ncol: 2\nmessage: broken\n";
        let err = parse_documents(text).unwrap_err();
        assert!(matches!(err, Error::DiagnosticFormat(_)));
    }

    #[test]
    fn channel_collects_written_documents_and_cleans_up() {
        let channel = DiagnosticChannel::create().unwrap();
        let path = channel.path().to_path_buf();

        let mut file = fs::OpenOptions::new()
            .write(true)
            .open(channel.path())
            .unwrap();
        writeln!(file, "---").unwrap();
        writeln!(file, "filename: getter.cpp").unwrap();
        writeln!(file, "line: 15").unwrap();
        writeln!(file, "col: 23").unwrap();
        writeln!(file, "message: getter must have no parameters").unwrap();

        let diagnostics = channel.collect().unwrap();
        assert_eq!(
            diagnostics,
            vec![diag("getter.cpp", 15, 23, "getter must have no parameters")]
        );

        drop(channel);
        assert!(!path.exists());
    }

    #[test]
    fn unwritten_channel_collects_nothing() {
        let channel = DiagnosticChannel::create().unwrap();
        assert_eq!(channel.collect().unwrap(), Vec::new());
    }
}
