//! Solver errors.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SolverError {
    #[error("matrix row {row} has {actual} columns, expected {expected}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("system has no solution: column {column} has no nonzero entry at or below its pivot row")]
    Singular { column: usize },
}

pub type Result<T> = std::result::Result<T, SolverError>;
