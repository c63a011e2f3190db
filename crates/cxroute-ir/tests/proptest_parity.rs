//! Property-based tests for GF(2) elimination and CNOT tracking.
//!
//! Random CNOT circuits are turned into parity maps, eliminated, and the
//! recorded circuits are compared against the original maps.

use cxroute_ir::{Cnot, CnotCircuit, GF2Matrix};
use proptest::prelude::*;

/// Generate a random CNOT circuit on 2-12 qubits with up to 60 gates.
fn arb_cnot_circuit() -> impl Strategy<Value = CnotCircuit> {
    (2_usize..=12).prop_flat_map(|qubits| {
        prop::collection::vec(
            (0..qubits, 0..qubits)
                .prop_filter("Control and target must differ", |(c, t)| c != t),
            0..=60,
        )
        .prop_map(move |pairs| {
            CnotCircuit::from_gates(qubits, pairs.into_iter().map(|(c, t)| Cnot::new(c, t)))
                .expect("generated gates are in range")
        })
    })
}

/// Generate an arbitrary (possibly singular, possibly rectangular) matrix.
fn arb_matrix() -> impl Strategy<Value = GF2Matrix> {
    (1_usize..=10, 1_usize..=10).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(prop::collection::vec(0_u8..=1, cols), rows)
            .prop_map(|bits| GF2Matrix::from_rows(&bits).expect("bits are 0/1"))
    })
}

proptest! {
    /// Gauss-Jordan on a parity map records a circuit implementing that map.
    #[test]
    fn test_gauss_records_original_map(circuit in arb_cnot_circuit()) {
        let original = circuit.parity_map();
        let mut work = original.clone();
        let mut recorded = CnotCircuit::new(circuit.qubits());

        let rank = work.gauss(true, Some(&mut recorded)).unwrap();

        prop_assert_eq!(rank, circuit.qubits());
        prop_assert!(work.is_identity());
        prop_assert_eq!(recorded.parity_map(), original);
    }

    /// The inverse of a parity map is the map of the reversed circuit.
    #[test]
    fn test_inverse_is_reversed_circuit(circuit in arb_cnot_circuit()) {
        let map = circuit.parity_map();
        let inverse = map.inverse().expect("CNOT circuits are invertible");
        prop_assert_eq!(inverse, circuit.reversed().parity_map());
    }

    /// Rank is invariant under transposition and full reduction yields echelon form.
    #[test]
    fn test_rank_properties(matrix in arb_matrix()) {
        let rank = matrix.rank();
        prop_assert_eq!(rank, matrix.transpose().rank());

        let mut reduced = matrix.clone();
        let mut ops = GF2Matrix::identity(matrix.rows());
        prop_assert_eq!(reduced.gauss(true, Some(&mut ops)).unwrap(), rank);
        prop_assert_eq!(ops.multiply(&matrix).unwrap(), reduced.clone());
        for r in rank..matrix.rows() {
            prop_assert!(reduced.row_is_zero(r));
        }
    }

    /// Depth never exceeds the gate count and is at least count / (n / 2).
    #[test]
    fn test_depth_bounds(circuit in arb_cnot_circuit()) {
        let count = circuit.count_cnots();
        let depth = circuit.cnot_depth();
        prop_assert!(depth <= count);
        let per_layer = (circuit.qubits() / 2).max(1);
        prop_assert!(depth * per_layer >= count);
    }
}
