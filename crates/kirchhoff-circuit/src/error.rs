//! Errors raised while building or formulating a circuit.

use kirchhoff_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CircuitError {
    #[error("duplicate component name {0:?}")]
    DuplicateName(String),

    #[error(transparent)]
    Algebra(#[from] CoreError),

    #[error("assembled system is not square: {equations} equations, {unknowns} unknowns")]
    NotSquare { equations: usize, unknowns: usize },
}

pub type Result<T> = std::result::Result<T, CircuitError>;
