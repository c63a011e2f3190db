//! Eliminators that search a qubit placement before reducing.

use cxroute_ir::{CnotCircuit, GF2Matrix, Layout};
use tracing::debug;

use super::{FitnessMetric, GeneticAlgorithm, PermutationFitness, SequenceStrategy, SequenceSynthesizer};
use crate::architecture::ConnectivityGraph;
use crate::config::{GeneticConfig, SwarmConfig};
use crate::eliminator::Eliminator;
use crate::error::SynthResult;
use crate::trace::Tracer;

/// Search settings shared by the placement eliminators.
#[derive(Clone, Default)]
struct Search {
    metric: FitnessMetric,
    genetic: GeneticConfig,
    swarm: SwarmConfig,
    seed: u64,
    threads: Option<usize>,
    tracer: Tracer,
}

/// Reduce `matrix[rows][:, cols]` with `base` and record the relabelling on
/// the circuit, composed with whatever layout `base` attached.
fn reduce_placed(
    base: &dyn Eliminator,
    matrix: &mut GF2Matrix,
    architecture: Option<&ConnectivityGraph>,
    circuit: Option<&mut CnotCircuit>,
    rows: &[usize],
    cols: &[usize],
) -> SynthResult<usize> {
    *matrix = matrix.permuted(rows, cols)?;
    let Some(circuit) = circuit else {
        return base.reduce(matrix, architecture, None);
    };
    let rank = base.reduce(matrix, architecture, Some(&mut *circuit))?;
    let inner = circuit
        .layout()
        .cloned()
        .unwrap_or_else(|| Layout::trivial(rows.len()));
    circuit.set_layout(Layout {
        row_perm: inner.row_perm.iter().map(|&r| rows[r]).collect(),
        col_perm: inner.col_perm.iter().map(|&c| cols[c]).collect(),
    })?;
    Ok(rank)
}

macro_rules! search_setters {
    () => {
        /// Score candidates with `metric`.
        #[must_use]
        pub fn with_metric(mut self, metric: FitnessMetric) -> Self {
            self.search.metric = metric;
            self
        }

        /// Genetic algorithm settings.
        #[must_use]
        pub fn with_genetic(mut self, genetic: GeneticConfig) -> Self {
            self.search.genetic = genetic;
            self
        }

        /// Master seed.
        #[must_use]
        pub fn with_seed(mut self, seed: u64) -> Self {
            self.search.seed = seed;
            self
        }

        /// Worker thread cap for fitness evaluation.
        #[must_use]
        pub fn with_threads(mut self, threads: Option<usize>) -> Self {
            self.search.threads = threads;
            self
        }

        /// Forward search progress to `tracer`.
        #[must_use]
        pub fn with_tracer(mut self, tracer: Tracer) -> Self {
            self.search.tracer = tracer;
            self
        }
    };
}

/// Genetic placement search around a base eliminator.
///
/// The same permutation relabels rows and columns, so the reduced circuit
/// carries the layout `{row_perm: π, col_perm: π}`. The base eliminator
/// must reduce fully.
pub struct GeneticEliminator {
    base: Box<dyn Eliminator>,
    search: Search,
}

impl GeneticEliminator {
    /// Search placements around `base`, which must reduce fully.
    pub fn new(base: Box<dyn Eliminator>) -> Self {
        Self {
            base,
            search: Search::default(),
        }
    }

    search_setters!();
}

impl Eliminator for GeneticEliminator {
    fn name(&self) -> &str {
        "genetic"
    }

    fn reduce(
        &self,
        matrix: &mut GF2Matrix,
        architecture: Option<&ConnectivityGraph>,
        circuit: Option<&mut CnotCircuit>,
    ) -> SynthResult<usize> {
        let original = matrix.clone();
        let fitness =
            PermutationFitness::new(&original, self.base.as_ref(), architecture, self.search.metric);
        let placement = GeneticAlgorithm::new(&fitness, self.search.genetic.clone(), self.search.seed)
            .with_threads(self.search.threads)
            .with_tracer(self.search.tracer.clone())
            .find_optimum(matrix.rows(), self.search.genetic.generations);
        debug!(?placement, base = self.base.name(), "Genetic placement chosen");
        reduce_placed(
            self.base.as_ref(),
            matrix,
            architecture,
            circuit,
            &placement,
            &placement,
        )
    }
}

/// Particle swarm placement search around a base eliminator.
///
/// Treats the matrix as a one-element sequence with free input and output
/// placements, so rows and columns may end up relabelled differently.
pub struct SwarmEliminator {
    base: Box<dyn Eliminator>,
    search: Search,
}

impl SwarmEliminator {
    /// Search placements around `base`, which must reduce fully.
    pub fn new(base: Box<dyn Eliminator>) -> Self {
        Self {
            base,
            search: Search::default(),
        }
    }

    search_setters!();

    /// Particle swarm settings.
    #[must_use]
    pub fn with_swarm(mut self, swarm: SwarmConfig) -> Self {
        self.search.swarm = swarm;
        self
    }
}

impl Eliminator for SwarmEliminator {
    fn name(&self) -> &str {
        "pso"
    }

    fn reduce(
        &self,
        matrix: &mut GF2Matrix,
        architecture: Option<&ConnectivityGraph>,
        circuit: Option<&mut CnotCircuit>,
    ) -> SynthResult<usize> {
        let result = SequenceSynthesizer::new(self.base.as_ref(), architecture)
            .with_strategy(SequenceStrategy::Swarm)
            .with_metric(self.search.metric)
            .with_genetic(self.search.genetic.clone())
            .with_swarm(self.search.swarm.clone())
            .with_seed(self.search.seed)
            .with_threads(self.search.threads)
            .with_tracer(self.search.tracer.clone())
            .synthesize(std::slice::from_ref(matrix), true, true)?;
        let identity: Vec<usize> = (0..matrix.rows()).collect();
        let cols = result.permutations.first().unwrap_or(&identity).clone();
        let rows = result.permutations.get(1).unwrap_or(&identity).clone();
        debug!(?rows, ?cols, base = self.base.name(), "Swarm placement chosen");
        reduce_placed(self.base.as_ref(), matrix, architecture, circuit, &rows, &cols)
    }
}
