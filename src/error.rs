use thiserror::Error;

/// Errors returned by the projector, graph, and clustering engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Input slice is empty.
    #[error("empty input")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// A vector's dimensionality differs from the one the projector was fit on
    /// (or from the first row of the same batch).
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// A projection, query, or quality check was requested before any fit.
    #[error("not fitted")]
    NotFitted,
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
