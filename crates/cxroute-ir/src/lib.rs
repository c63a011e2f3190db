//! cxroute Parity-Map Representation
//!
//! This crate provides the linear-algebra layer underneath CNOT synthesis: a
//! packed GF(2) matrix type and a CNOT circuit that tracks the matrix it
//! implements.
//!
//! # Core Components
//!
//! - [`GF2Matrix`]: dense binary matrix with elementary row/column additions,
//!   Gaussian elimination, inverse and permutation helpers
//! - [`RowOperations`]: receiver for row additions performed by an eliminator
//! - [`CnotCircuit`]: ordered CNOT list with `count_cnots`, `cnot_depth` and
//!   `parity_map`
//! - [`Layout`]: the row/column relabelling applied before synthesis
//!
//! # Example: Recording an Elimination
//!
//! ```rust
//! use cxroute_ir::{CnotCircuit, GF2Matrix};
//!
//! let original = GF2Matrix::from_rows(&[[1u8, 1, 0], [0, 1, 0], [0, 1, 1]]).unwrap();
//! let mut matrix = original.clone();
//! let mut circuit = CnotCircuit::new(3);
//!
//! let rank = matrix.gauss(true, Some(&mut circuit)).unwrap();
//!
//! assert_eq!(rank, 3);
//! assert!(matrix.is_identity());
//! // The recorded circuit implements the original parity map.
//! assert_eq!(circuit.parity_map(), original);
//! ```
//!
//! # Conventions
//!
//! | Operation | Matrix effect | Recorded gate |
//! |-----------|---------------|---------------|
//! | `row_add(t, s)` | `row[t] ^= row[s]` | `CNOT(s, t)` prepended |
//! | `col_add(t, s)` | `col[t] ^= col[s]` | `CNOT(t, s)` appended |

pub mod circuit;
pub mod error;
pub mod matrix;

pub use circuit::{Cnot, CnotCircuit, Layout};
pub use error::{IrError, IrResult};
pub use matrix::{GF2Matrix, RowOperations, check_permutation, invert_permutation, is_permutation};
