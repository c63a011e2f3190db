//! Qubit placement search.
//!
//! Synthesis cost depends strongly on which logical qubit sits on which
//! matrix row and column. The optimizers here search permutation space,
//! using an [`Eliminator`] as a black-box cost oracle:
//!
//! - [`GeneticAlgorithm`]: population search with segment crossover
//! - [`ParticleSwarm`]: particles that fall back on their personal and the
//!   swarm's best placement when they stagnate
//! - [`SequenceSynthesizer`]: chained placements over a list of matrices
//! - [`GeneticEliminator`] / [`SwarmEliminator`]: single-matrix wrappers
//!
//! Fitness evaluation runs on a bounded rayon pool. All random choices are
//! drawn from seeded generators on the coordinating side, so results do not
//! depend on the pool size.

mod genetic;
mod placement;
mod sequence;
mod swarm;

pub use genetic::GeneticAlgorithm;
pub use placement::{GeneticEliminator, SwarmEliminator};
pub use sequence::{SequenceResult, SequenceStrategy, SequenceSynthesizer};
pub use swarm::{ParticleSwarm, StepFunction, SwarmOutcome};

use cxroute_ir::{CnotCircuit, GF2Matrix};
use rand::Rng;
use rand::seq::SliceRandom;
use rand::seq::index::sample;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::architecture::ConnectivityGraph;
use crate::eliminator::Eliminator;

/// How a synthesized circuit is scored. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessMetric {
    /// `depth * 10000 + count`.
    #[default]
    Combined,
    /// CNOT count.
    Count,
    /// CNOT depth.
    Depth,
}

impl FitnessMetric {
    /// Score `circuit`.
    pub fn score(self, circuit: &CnotCircuit) -> u64 {
        let count = circuit.count_cnots() as u64;
        let depth = circuit.cnot_depth() as u64;
        match self {
            Self::Combined => depth * 10_000 + count,
            Self::Count => count,
            Self::Depth => depth,
        }
    }
}

/// Cost of a permutation. Must be pure: evaluations run concurrently.
pub trait Fitness: Sync {
    /// Cost of `permutation`; lower is better.
    fn fitness(&self, permutation: &[usize]) -> u64;
}

impl<F> Fitness for F
where
    F: Fn(&[usize]) -> u64 + Sync,
{
    fn fitness(&self, permutation: &[usize]) -> u64 {
        self(permutation)
    }
}

/// Synthesis cost of a matrix after relabelling its rows and/or columns.
pub struct PermutationFitness<'a> {
    matrix: &'a GF2Matrix,
    eliminator: &'a dyn Eliminator,
    architecture: Option<&'a ConnectivityGraph>,
    metric: FitnessMetric,
    permute_rows: bool,
    permute_columns: bool,
}

impl<'a> PermutationFitness<'a> {
    /// Score `M[π][:, π]` (both flags set by default).
    pub fn new(
        matrix: &'a GF2Matrix,
        eliminator: &'a dyn Eliminator,
        architecture: Option<&'a ConnectivityGraph>,
        metric: FitnessMetric,
    ) -> Self {
        Self {
            matrix,
            eliminator,
            architecture,
            metric,
            permute_rows: true,
            permute_columns: true,
        }
    }

    /// Choose which axes the permutation applies to.
    #[must_use]
    pub fn permuting(mut self, rows: bool, columns: bool) -> Self {
        self.permute_rows = rows;
        self.permute_columns = columns;
        self
    }

    /// The matrix relabelled by `permutation` on the selected axes.
    pub fn relabel(&self, permutation: &[usize]) -> Option<GF2Matrix> {
        let rows: Vec<usize> = (0..self.matrix.rows()).collect();
        let cols: Vec<usize> = (0..self.matrix.cols()).collect();
        let row_perm = if self.permute_rows { permutation } else { &rows };
        let col_perm = if self.permute_columns { permutation } else { &cols };
        self.matrix.permuted(row_perm, col_perm).ok()
    }

    /// Synthesize the relabelled matrix and return its circuit.
    pub fn synthesize(&self, permutation: &[usize]) -> Option<CnotCircuit> {
        let mut matrix = self.relabel(permutation)?;
        let mut circuit = CnotCircuit::new(matrix.rows());
        match self
            .eliminator
            .reduce(&mut matrix, self.architecture, Some(&mut circuit))
        {
            Ok(_) => Some(circuit),
            Err(e) => {
                warn!(error = %e, eliminator = self.eliminator.name(), "Fitness evaluation failed");
                None
            }
        }
    }
}

impl Fitness for PermutationFitness<'_> {
    fn fitness(&self, permutation: &[usize]) -> u64 {
        self.synthesize(permutation)
            .map_or(u64::MAX, |circuit| self.metric.score(&circuit))
    }
}

/// Evaluates candidates on a bounded rayon pool, or inline with one thread.
pub(crate) struct Evaluator {
    pool: Option<ThreadPool>,
}

impl Evaluator {
    /// Pool of `min(threads, available_parallelism)` workers.
    pub(crate) fn new(threads: Option<usize>) -> Self {
        let available = std::thread::available_parallelism().map_or(1, |n| n.get());
        let size = threads.unwrap_or(available).clamp(1, available);
        if size == 1 {
            return Self::sequential();
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|i| format!("cxroute-search-{i}"))
            .build()
            .map_err(|e| warn!(error = %e, "Falling back to sequential fitness evaluation"))
            .ok();
        Self { pool }
    }

    pub(crate) fn sequential() -> Self {
        Self { pool: None }
    }

    /// Score every candidate, preserving order.
    pub(crate) fn evaluate<F: Fitness + ?Sized>(
        &self,
        fitness: &F,
        candidates: Vec<Vec<usize>>,
    ) -> Vec<(u64, Vec<usize>)> {
        match &self.pool {
            Some(pool) => pool.install(|| {
                candidates
                    .into_par_iter()
                    .map(|p| (fitness.fitness(&p), p))
                    .collect()
            }),
            None => candidates
                .into_iter()
                .map(|p| (fitness.fitness(&p), p))
                .collect(),
        }
    }

    /// Run `f` on every item.
    pub(crate) fn for_each<T, F>(&self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(&mut T) + Sync + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| items.par_iter_mut().for_each(f)),
            None => items.iter_mut().for_each(f),
        }
    }
}

/// A uniformly random permutation of `0..n`.
pub fn random_permutation<R: Rng>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..n).collect();
    perm.shuffle(rng);
    perm
}

/// Copy a random slice of `first`, fill the other positions with the genes
/// of `second` in order, skipping genes already copied.
///
/// The slice starts in `[0, n/2)` and has length in `[0, n - start)`.
pub fn segment_crossover<R: Rng>(first: &[usize], second: &[usize], rng: &mut R) -> Vec<usize> {
    let n = first.len();
    if n < 2 {
        return first.to_vec();
    }
    let start = rng.gen_range(0..n / 2);
    let end = start + rng.gen_range(0..n - start);

    let mut child = vec![usize::MAX; n];
    let mut used = vec![false; n];
    for i in start..end {
        child[i] = first[i];
        used[first[i]] = true;
    }
    let mut slots = (0..start).chain(end..n);
    for &gene in second {
        if !used[gene] {
            if let Some(slot) = slots.next() {
                child[slot] = gene;
                used[gene] = true;
            }
        }
    }
    child
}

/// Swap two distinct random positions.
pub fn swap_mutation<R: Rng>(perm: &mut [usize], rng: &mut R) {
    if perm.len() < 2 {
        return;
    }
    let picks = sample(rng, perm.len(), 2);
    perm.swap(picks.index(0), picks.index(1));
}

/// Shuffle the values at `k` random positions among themselves.
pub fn shuffle_mutation<R: Rng>(perm: &[usize], k: usize, rng: &mut R) -> Vec<usize> {
    let mut out = perm.to_vec();
    let k = k.min(perm.len());
    let positions = sample(rng, perm.len(), k).into_vec();
    let mut order: Vec<usize> = (0..k).collect();
    order.shuffle(rng);
    for (slot, &from) in positions.iter().zip(&order) {
        out[*slot] = perm[positions[from]];
    }
    out
}

/// Copy `best` at `k` random positions and fill the rest with the genes of
/// `particle` in order, skipping genes already copied.
pub fn partial_crossover<R: Rng>(
    particle: &[usize],
    best: &[usize],
    k: usize,
    rng: &mut R,
) -> Vec<usize> {
    let n = particle.len();
    let k = k.min(n);
    let mut out = vec![usize::MAX; n];
    let mut used = vec![false; n];
    for i in sample(rng, n, k).into_vec() {
        out[i] = best[i];
        used[best[i]] = true;
    }
    let mut genes = particle.iter().copied().filter(|&g| !used[g]);
    for slot in out.iter_mut().filter(|g| **g == usize::MAX) {
        if let Some(gene) = genes.next() {
            *slot = gene;
        }
    }
    out
}
