//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur in matrix and circuit operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Two operands have incompatible shapes.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// The expected dimension (rows x cols or length).
        expected: String,
        /// The dimension that was provided.
        found: String,
    },

    /// A matrix entry other than 0 or 1 was supplied.
    #[error("Invalid matrix entry {value} at ({row}, {col}); expected 0 or 1")]
    InvalidEntry {
        /// Row of the entry.
        row: usize,
        /// Column of the entry.
        col: usize,
        /// The offending value.
        value: u8,
    },

    /// The given sequence is not a bijection on `0..n`.
    #[error("Invalid permutation: {0}")]
    InvalidPermutation(String),

    /// Qubit index outside the circuit's wires.
    #[error("Qubit {qubit} out of range for a circuit on {qubits} qubits")]
    QubitOutOfRange {
        /// The offending qubit index.
        qubit: usize,
        /// Number of qubits in the circuit.
        qubits: usize,
    },

    /// A CNOT whose control equals its target.
    #[error("CNOT control and target must differ (both are {0})")]
    SelfLoop(usize),
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
