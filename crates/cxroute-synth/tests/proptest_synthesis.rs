//! Property-based tests for routing and placement search.

use cxroute_ir::{Cnot, CnotCircuit, GF2Matrix, is_permutation};
use cxroute_synth::search::{
    partial_crossover, random_permutation, segment_crossover, shuffle_mutation, swap_mutation,
};
use cxroute_synth::{ConnectivityGraph, Eliminator, PermRowCol, RowCol, SteinerGauss, SteinerVariant};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// A connected architecture on 2-9 qubits.
fn arb_architecture() -> impl Strategy<Value = ConnectivityGraph> {
    prop_oneof![
        (2_usize..=9).prop_map(ConnectivityGraph::line),
        (3_usize..=9).prop_map(ConnectivityGraph::ring),
        (1_usize..=3, 2_usize..=3).prop_map(|(r, c)| ConnectivityGraph::grid(r, c)),
        (2_usize..=9).prop_map(ConnectivityGraph::fully_connected),
    ]
}

/// An architecture together with an invertible matrix of matching size,
/// built as the parity map of random CNOTs.
fn arb_instance() -> impl Strategy<Value = (ConnectivityGraph, GF2Matrix)> {
    arb_architecture().prop_flat_map(|arch| {
        let n = arch.num_qubits();
        prop::collection::vec(
            (0..n, 0..n).prop_filter("Control and target must differ", |(c, t)| c != t),
            0..=40,
        )
        .prop_map(move |pairs| {
            let circuit =
                CnotCircuit::from_gates(n, pairs.into_iter().map(|(c, t)| Cnot::new(c, t)))
                    .expect("generated gates are in range");
            (arch.clone(), circuit.parity_map())
        })
    })
}

fn check_routed(
    eliminator: &dyn Eliminator,
    arch: &ConnectivityGraph,
    matrix: &GF2Matrix,
) -> Result<(), TestCaseError> {
    let mut work = matrix.clone();
    let mut circuit = CnotCircuit::new(matrix.rows());
    let rank = eliminator
        .reduce(&mut work, Some(arch), Some(&mut circuit))
        .map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert_eq!(rank, matrix.rows());
    prop_assert!(arch.supports(&circuit));
    let expected = match circuit.layout() {
        Some(layout) => matrix.permuted(&layout.row_perm, &layout.col_perm).unwrap(),
        None => matrix.clone(),
    };
    prop_assert_eq!(circuit.parity_map(), expected);
    Ok(())
}

proptest! {
    /// Recursive Steiner-Gauss reduces to the identity along edges only.
    #[test]
    fn test_steiner_round_trip((arch, matrix) in arb_instance()) {
        let steiner = SteinerGauss::new(true).with_variant(SteinerVariant::Recursive);
        let mut work = matrix.clone();
        let mut circuit = CnotCircuit::new(matrix.rows());
        steiner.reduce(&mut work, Some(&arch), Some(&mut circuit)).unwrap();
        prop_assert!(work.is_identity());
        prop_assert!(arch.supports(&circuit));
        prop_assert_eq!(circuit.parity_map(), matrix);
    }

    /// RowCol and PermRowCol emit only architecture edges.
    #[test]
    fn test_rowcol_family_connectivity((arch, matrix) in arb_instance()) {
        check_routed(&RowCol::new(), &arch, &matrix)?;
        check_routed(&PermRowCol::new(), &arch, &matrix)?;
    }

    /// Crossover and mutation operators always return bijections.
    #[test]
    fn test_operators_preserve_bijection(
        n in 0_usize..=24,
        seed in any::<u64>(),
        rate_personal in 0.0_f64..=1.0,
        rate_swarm in 0.0_f64..=1.0,
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let first = random_permutation(n, &mut rng);
        let second = random_permutation(n, &mut rng);

        let mut child = segment_crossover(&first, &second, &mut rng);
        prop_assert!(is_permutation(&child));
        swap_mutation(&mut child, &mut rng);
        prop_assert!(is_permutation(&child));

        let shaken = shuffle_mutation(&child, (rate_personal * n as f64) as usize, &mut rng);
        prop_assert!(is_permutation(&shaken));
        let pulled = partial_crossover(&shaken, &first, (rate_swarm * n as f64) as usize, &mut rng);
        prop_assert!(is_permutation(&pulled));
        prop_assert_eq!(pulled.len(), n);
    }
}
