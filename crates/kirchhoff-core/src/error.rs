//! Error types shared by the symbolic layer.

use thiserror::Error;

/// Errors raised while evaluating or combining symbolic expressions and
/// linear equations.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// `Expr::evaluate` reached a `Variable`, `Probe`, or unresolved
    /// `Function` node.
    #[error("expression is not evaluable: contains a free variable or probe")]
    NotEvaluable,

    /// A value could not be coerced into `LinearTerms`.
    #[error("cannot coerce value into linear terms: {0}")]
    TypeError(String),

    /// A substitution source equation did not have exactly one left-hand
    /// term, or the assembled system was not square.
    #[error("shape error: {0}")]
    ShapeError(String),
}

/// Result alias for the symbolic layer.
pub type Result<T> = std::result::Result<T, CoreError>;
