//! G-Code processing errors

use std::{fmt, io, path::PathBuf};
use thiserror::Error;

/// Non-fatal problem found while tokenizing a line
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    #[error("unrecognized field tag '{tag}'")]
    UnknownTag { tag: char },
    #[error("malformed value '{text}' for field '{tag}'")]
    MalformedValue { tag: char, text: String },
    #[error("line is not valid UTF-8, undecodable bytes replaced")]
    InvalidUtf8,
}

impl Diagnostic {
    /// Accompany `Diagnostic` with line number
    pub fn at_line(self, line: u64) -> LineDiagnostic {
        LineDiagnostic {
            diagnostic: self,
            line,
        }
    }
}

/// Diagnostic with line number
#[derive(Debug, Clone, PartialEq)]
pub struct LineDiagnostic {
    pub diagnostic: Diagnostic,
    pub line: u64,
}

impl fmt::Display for LineDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "warning: line {}: {}", self.line, self.diagnostic)
    }
}

/// Fatal conversion error, aborts the current file only
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("can't open input file '{}': {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("can't create output file '{}': {source}", .path.display())]
    Create { path: PathBuf, source: io::Error },
    #[error("can't read input at line {line}: {source}")]
    Read { line: u64, source: io::Error },
    #[error("can't write output: {0}")]
    Write(#[from] io::Error),
}
