//! Error types for synthesis.

use cxroute_ir::IrError;
use thiserror::Error;

/// Errors that can occur during CNOT synthesis.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SynthError {
    /// Error from the matrix/circuit layer.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),

    /// An elimination step could not be carried out on the architecture.
    ///
    /// This signals a broken invariant (unreachable terminal, non-adjacent
    /// operation, pivot that failed to appear), never a search budget issue.
    #[error("Structural error: {0}")]
    Structural(String),

    /// RowCol-family synthesis needs an invertible matrix.
    #[error("Matrix of size {size} has rank {rank}; a full-rank matrix is required")]
    NotFullRank {
        /// Rank of the supplied matrix.
        rank: usize,
        /// Number of rows (and columns).
        size: usize,
    },

    /// The matrix and the architecture disagree on the number of qubits.
    #[error("Matrix has {matrix} rows but the architecture has {architecture} qubits")]
    ArchitectureMismatch {
        /// Number of matrix rows.
        matrix: usize,
        /// Number of architecture qubits.
        architecture: usize,
    },

    /// The connectivity graph has more than one component.
    #[error("Architecture '{0}' is not connected")]
    DisconnectedArchitecture(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A configuration or architecture document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for synthesis operations.
pub type SynthResult<T> = Result<T, SynthError>;
