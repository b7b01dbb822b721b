//! Error types for Centella operations

use thiserror::Error;

/// Result type for Centella operations
pub type Result<T> = std::result::Result<T, CentellaError>;

/// Errors that can occur during Centella operations
///
/// All variants are terminal for the run that raised them: the in-progress
/// solve is abandoned and no partial statistics are returned. The core never
/// retries and never logs; presentation is the caller's job.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CentellaError {
    /// A requested matrix allocation has a zero dimension
    #[error("invalid matrix sizes: {rows}x{columns}")]
    InvalidMatrixSizes {
        /// Requested row count
        rows: usize,
        /// Requested column count
        columns: usize,
    },

    /// The augmented system's column/row relationship is wrong, or no valid
    /// pivot exists for row 0
    #[error("invalid Gauss matrix: {0}")]
    InvalidGaussMatrix(String),

    /// Winograd's dimension-compatibility or minimum-size precondition failed
    #[error("matrix input not supported by the algorithm: {0}")]
    InvalidMatrixInput(String),

    /// The TSP input graph has an isolated vertex
    #[error("disconnected graph: vertex {0} has no incident edge")]
    DisconnectedGraph(usize),

    /// Non-positive or unparsable iteration count. Never raised by the core
    /// itself; defined here for the input layer to reuse.
    #[error("invalid iterations quantity")]
    InvalidIterationsQuantity,

    /// Matrix contents could not be obtained or do not match the declared
    /// shape. Raised by `Matrix::from_vec`; also reusable by the input layer.
    #[error("matrix input failure: {0}")]
    MatrixInputFailure(String),
}
