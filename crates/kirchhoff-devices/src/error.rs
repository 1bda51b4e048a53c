//! Errors raised while resolving a netlist line against the registry.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DeviceError {
    #[error("unknown component prefix in {name:?}")]
    UnknownPrefix { name: String },

    #[error("{class} expects {expected} port(s), got {actual} in {name:?}")]
    PortArityMismatch {
        class: &'static str,
        name: String,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, DeviceError>;
