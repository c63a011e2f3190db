//! Synthesis of a sequence of parity maps with chained qubit placements.
//!
//! For matrices `M_0, …, M_{k-1}` the synthesizer picks placements
//! `π_0, …, π_k` and returns circuits `C_i` with
//! `C_i.parity_map() == M_i[π_{i+1}][:, π_i]`. The output placement of one
//! circuit is the input placement of the next, so the circuits compose into
//! the full computation up to the relabellings at both ends.

use cxroute_ir::{CnotCircuit, GF2Matrix, IrError, Layout};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::{FitnessMetric, GeneticAlgorithm, ParticleSwarm, PermutationFitness, StepFunction};
use crate::architecture::ConnectivityGraph;
use crate::config::{GeneticConfig, SwarmConfig};
use crate::eliminator::Eliminator;
use crate::error::SynthResult;
use crate::trace::Tracer;

/// How placements between consecutive matrices are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceStrategy {
    /// Every placement is the identity.
    Basic,
    /// A genetic search per matrix, each fixing the next placement.
    #[default]
    Genetic,
    /// A particle swarm over the initial placement, refined by forward and
    /// backward genetic passes. Needs free input and output placements;
    /// otherwise falls back to [`Genetic`](Self::Genetic).
    Swarm,
}

/// Circuits for a matrix sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceResult {
    /// One circuit per matrix. Circuit `i` carries the layout
    /// `{row_perm: permutations[i + 1], col_perm: permutations[i]}`.
    pub circuits: Vec<CnotCircuit>,
    /// The `k + 1` placements.
    pub permutations: Vec<Vec<usize>>,
    /// Sum of the metric over all circuits.
    pub score: u64,
}

/// Synthesizes matrix sequences on top of a base eliminator.
pub struct SequenceSynthesizer<'a> {
    eliminator: &'a dyn Eliminator,
    architecture: Option<&'a ConnectivityGraph>,
    strategy: SequenceStrategy,
    metric: FitnessMetric,
    genetic: GeneticConfig,
    swarm: SwarmConfig,
    seed: u64,
    threads: Option<usize>,
    tracer: Tracer,
}

impl<'a> SequenceSynthesizer<'a> {
    /// Use `eliminator` (which must reduce fully) for every matrix.
    pub fn new(eliminator: &'a dyn Eliminator, architecture: Option<&'a ConnectivityGraph>) -> Self {
        Self {
            eliminator,
            architecture,
            strategy: SequenceStrategy::default(),
            metric: FitnessMetric::default(),
            genetic: GeneticConfig::default(),
            swarm: SwarmConfig::default(),
            seed: 0,
            threads: None,
            tracer: Tracer::disabled(),
        }
    }

    /// Choose how inner placements are searched.
    #[must_use]
    pub fn with_strategy(mut self, strategy: SequenceStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Cost used to rank placements and to score the result.
    #[must_use]
    pub fn with_metric(mut self, metric: FitnessMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Genetic algorithm settings for placement searches.
    #[must_use]
    pub fn with_genetic(mut self, genetic: GeneticConfig) -> Self {
        self.genetic = genetic;
        self
    }

    /// Particle swarm settings for [`SequenceStrategy::Swarm`].
    #[must_use]
    pub fn with_swarm(mut self, swarm: SwarmConfig) -> Self {
        self.swarm = swarm;
        self
    }

    /// Master seed; matrix `i` searches with `seed + i`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Worker cap for fitness evaluation; `None` uses all cores.
    #[must_use]
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Forward search progress to `tracer`.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = tracer;
        self
    }

    /// Synthesize every matrix in order.
    ///
    /// With `input_perm` the first placement is searched rather than fixed
    /// to the identity; with `output_perm` so is the last one. Inner
    /// placements are always searched unless the strategy is
    /// [`Basic`](SequenceStrategy::Basic).
    #[instrument(skip_all, fields(matrices = matrices.len(), strategy = ?self.strategy))]
    pub fn synthesize(
        &self,
        matrices: &[GF2Matrix],
        input_perm: bool,
        output_perm: bool,
    ) -> SynthResult<SequenceResult> {
        let Some(first) = matrices.first() else {
            return Ok(SequenceResult::default());
        };
        let n = first.rows();
        for m in matrices {
            if m.rows() != n || m.cols() != n {
                return Err(IrError::DimensionMismatch {
                    expected: format!("{n}x{n}"),
                    found: format!("{}x{}", m.rows(), m.cols()),
                }
                .into());
            }
        }
        let identity: Vec<usize> = (0..n).collect();

        let result = match self.strategy {
            SequenceStrategy::Basic => {
                self.chain(matrices, identity, false, false, false, self.threads)?
            }
            SequenceStrategy::Genetic => {
                self.chain(matrices, identity, input_perm, output_perm, true, self.threads)?
            }
            SequenceStrategy::Swarm if input_perm && output_perm => {
                self.swarm_search(matrices, identity)?
            }
            SequenceStrategy::Swarm => {
                warn!(
                    input_perm,
                    output_perm, "Swarm search needs free input and output placements; using genetic search"
                );
                self.chain(matrices, identity, input_perm, output_perm, true, self.threads)?
            }
        };
        info!(score = result.score, circuits = result.circuits.len(), "Sequence synthesized");
        Ok(result)
    }

    /// One left-to-right pass. Each matrix is first relabelled by the
    /// previous output placement, then a placement is searched for the
    /// free axes.
    fn chain(
        &self,
        matrices: &[GF2Matrix],
        initial: Vec<usize>,
        input_perm: bool,
        output_perm: bool,
        search: bool,
        threads: Option<usize>,
    ) -> SynthResult<SequenceResult> {
        let k = matrices.len();
        let n = initial.len();
        let identity: Vec<usize> = (0..n).collect();

        let mut current = initial;
        let mut permute_cols = input_perm;
        let mut result = SequenceResult::default();
        if !permute_cols {
            result.permutations.push(current.clone());
        }

        for (i, matrix) in matrices.iter().enumerate() {
            let relabelled = matrix.permuted(&identity, &current)?;
            let permute_rows = i + 1 < k || output_perm;

            let placement = if search && (permute_rows || permute_cols) {
                let fitness = PermutationFitness::new(
                    &relabelled,
                    self.eliminator,
                    self.architecture,
                    self.metric,
                )
                .permuting(permute_rows, permute_cols);
                GeneticAlgorithm::new(&fitness, self.genetic.clone(), self.seed.wrapping_add(i as u64))
                    .with_threads(threads)
                    .with_tracer(self.tracer.clone())
                    .find_optimum(n, self.genetic.generations)
            } else {
                identity.clone()
            };

            let row_perm = if permute_rows { placement.clone() } else { identity.clone() };
            let col_perm = if permute_cols { placement.clone() } else { identity.clone() };
            let mut working = relabelled.permuted(&row_perm, &col_perm)?;
            let mut circuit = CnotCircuit::new(n);
            self.eliminator
                .reduce(&mut working, self.architecture, Some(&mut circuit))?;

            let input: Vec<usize> = col_perm.iter().map(|&c| current[c]).collect();
            circuit.set_layout(Layout {
                row_perm: row_perm.clone(),
                col_perm: input.clone(),
            })?;
            let cost = self.metric.score(&circuit);
            debug!(index = i, cost, "Sequence element synthesized");
            result.score = result.score.saturating_add(cost);
            result.circuits.push(circuit);

            if permute_cols {
                result.permutations.push(input);
            }
            current = row_perm;
            result.permutations.push(current.clone());
            permute_cols = false;
        }
        Ok(result)
    }

    fn swarm_search(&self, matrices: &[GF2Matrix], identity: Vec<usize>) -> SynthResult<SequenceResult> {
        let reversed: Vec<GF2Matrix> = matrices.iter().rev().map(GF2Matrix::transpose).collect();
        let step = RoundTrip {
            sequence: self,
            forward: matrices,
            backward: &reversed,
        };
        // Errors are structural, so one checked pass surfaces them before
        // the swarm swallows them as infinite cost.
        let n = identity.len();
        step.run(&identity)?;

        let outcome = ParticleSwarm::new(&step, self.swarm.clone(), self.seed)
            .with_threads(self.threads)
            .with_tracer(self.tracer.clone())
            .find_optimum(n, self.swarm.steps);
        Ok(outcome.solution)
    }
}

/// Swarm step: a forward pass from the particle's placement, then a
/// backward pass over the transposed sequence whose final placement is
/// where the particle moves next.
struct RoundTrip<'s, 'a> {
    sequence: &'s SequenceSynthesizer<'a>,
    forward: &'s [GF2Matrix],
    backward: &'s [GF2Matrix],
}

impl RoundTrip<'_, '_> {
    fn run(&self, placement: &[usize]) -> SynthResult<(Vec<usize>, SequenceResult)> {
        // Particles already run in parallel; inner searches stay inline.
        let inline = Some(1);
        let forward = self
            .sequence
            .chain(self.forward, placement.to_vec(), false, true, true, inline)?;
        let last = forward.permutations.last().cloned().unwrap_or_default();
        let backward = self
            .sequence
            .chain(self.backward, last, false, true, true, inline)?;
        let next = backward
            .permutations
            .last()
            .cloned()
            .unwrap_or_else(|| placement.to_vec());
        Ok((next, forward))
    }
}

impl StepFunction for RoundTrip<'_, '_> {
    type Solution = SequenceResult;

    fn step(&self, current: &[usize]) -> (Vec<usize>, SequenceResult, u64) {
        match self.run(current) {
            Ok((next, forward)) => {
                let score = forward.score;
                (next, forward, score)
            }
            Err(e) => {
                warn!(error = %e, "Swarm step failed");
                (current.to_vec(), SequenceResult::default(), u64::MAX)
            }
        }
    }
}
