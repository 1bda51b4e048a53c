//! Parse errors, reported with the offending line number and token.

use kirchhoff_devices::DeviceError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("line {line}: malformed number {token:?}")]
    MalformedNumber { line: usize, token: String },

    #[error("line {line}: unsupported syntax near {token:?}")]
    UnsupportedSyntax { line: usize, token: String },

    #[error("line {line}: unexpected end of expression")]
    UnexpectedEof { line: usize },

    #[error("line {line}: expected {expected}, found {found:?}")]
    Expected {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("line {line}: behavioral source model must be an assignment (`name = expr`)")]
    BehavioralModelNotAssignment { line: usize },

    #[error("line {line}: {source}")]
    Device {
        line: usize,
        #[source]
        source: DeviceError,
    },
}

pub type Result<T> = std::result::Result<T, ParseError>;
