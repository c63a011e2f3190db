//! Mode dispatch and the high-level synthesis entry points.

use std::borrow::Cow;
use std::sync::Arc;

use cxroute_ir::{CnotCircuit, GF2Matrix};
use tracing::{debug, info, instrument};

use crate::architecture::ConnectivityGraph;
use crate::config::SynthesisConfig;
use crate::elimination::{GaussEliminator, PermRowCol, RowCol, SteinerGauss};
use crate::eliminator::{EliminationMode, Eliminator, resolve_architecture};
use crate::error::{SynthError, SynthResult};
use crate::search::{
    FitnessMetric, GeneticEliminator, SequenceResult, SequenceStrategy, SequenceSynthesizer,
    SwarmEliminator,
};
use crate::trace::{TraceHook, Tracer};

/// Result of synthesizing one matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    /// The CNOT circuit. Search modes and PermRowCol attach a layout.
    pub circuit: CnotCircuit,
    /// Final state of the working matrix.
    pub matrix: GF2Matrix,
    /// Rank reported by the eliminator.
    pub rank: usize,
    /// When the working matrix ended as a permutation matrix, the row
    /// holding the 1 of each column. Permuting the columns of the circuit's
    /// parity map by it gives back the (relabelled) input.
    pub output_perm: Option<Vec<usize>>,
}

impl Synthesis {
    fn new(circuit: CnotCircuit, matrix: GF2Matrix, rank: usize) -> Self {
        let output_perm = permutation_of(&matrix);
        Self {
            circuit,
            matrix,
            rank,
            output_perm,
        }
    }

    /// Cost of the circuit under `metric`.
    pub fn score(&self, metric: FitnessMetric) -> u64 {
        metric.score(&self.circuit)
    }
}

/// Row index of the single 1 in every column, if `matrix` is a square
/// permutation matrix.
fn permutation_of(matrix: &GF2Matrix) -> Option<Vec<usize>> {
    if !matrix.is_square() {
        return None;
    }
    let n = matrix.rows();
    let mut seen = vec![false; n];
    let mut perm = Vec::with_capacity(n);
    for col in 0..n {
        let mut ones = matrix.col_ones(col);
        let row = ones.next()?;
        if ones.next().is_some() || seen[row] {
            return None;
        }
        seen[row] = true;
        perm.push(row);
    }
    Some(perm)
}

/// Synthesizes CNOT circuits in one configured mode.
///
/// ```
/// use cxroute_ir::GF2Matrix;
/// use cxroute_synth::{ConnectivityGraph, EliminationMode, Synthesizer};
///
/// let matrix = GF2Matrix::from_rows(&[[1u8, 0, 0, 1], [0, 1, 0, 0], [0, 0, 1, 0], [0, 0, 0, 1]])
///     .unwrap();
/// let synthesizer = Synthesizer::builder()
///     .with_mode(EliminationMode::Steiner)
///     .with_architecture(ConnectivityGraph::line(4))
///     .build()
///     .unwrap();
///
/// let result = synthesizer.synthesize(&matrix).unwrap();
/// assert_eq!(result.circuit.parity_map(), matrix);
/// assert!(result.circuit.count_cnots() >= 3);
/// ```
#[derive(Debug, Clone)]
pub struct Synthesizer {
    config: SynthesisConfig,
    architecture: Option<ConnectivityGraph>,
    tracer: Tracer,
}

impl Synthesizer {
    /// Start building a synthesizer with the default configuration.
    pub fn builder() -> SynthesizerBuilder {
        SynthesizerBuilder::new()
    }

    /// The validated configuration.
    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// The elimination mode.
    pub fn mode(&self) -> EliminationMode {
        self.config.mode
    }

    /// The target architecture, if one was supplied.
    pub fn architecture(&self) -> Option<&ConnectivityGraph> {
        self.architecture.as_ref()
    }

    /// The eliminator for the configured mode.
    ///
    /// Search modes forward generation and step events to the trace hook;
    /// their inner fitness evaluations are not traced.
    pub fn eliminator(&self) -> Box<dyn Eliminator> {
        let config = &self.config;
        match config.mode {
            EliminationMode::Gauss => {
                Box::new(GaussEliminator::new(config.full_reduce).with_tracer(self.tracer.clone()))
            }
            EliminationMode::Steiner => Box::new(self.steiner().with_tracer(self.tracer.clone())),
            EliminationMode::RowCol => Box::new(RowCol::new().with_tracer(self.tracer.clone())),
            EliminationMode::PermRowCol => {
                let mut perm_row_col = PermRowCol::new().with_tracer(self.tracer.clone());
                if let Some(settings) = config.best_first {
                    perm_row_col = perm_row_col.with_best_first(settings);
                }
                Box::new(perm_row_col)
            }
            EliminationMode::GeneticSteiner | EliminationMode::GeneticGauss => Box::new(
                GeneticEliminator::new(self.search_base())
                    .with_metric(config.metric)
                    .with_genetic(config.genetic.clone())
                    .with_seed(config.seed)
                    .with_threads(config.threads)
                    .with_tracer(self.tracer.clone()),
            ),
            EliminationMode::PsoSteiner | EliminationMode::PsoGauss => Box::new(
                SwarmEliminator::new(self.search_base())
                    .with_metric(config.metric)
                    .with_genetic(config.genetic.clone())
                    .with_swarm(config.swarm.clone())
                    .with_seed(config.seed)
                    .with_threads(config.threads)
                    .with_tracer(self.tracer.clone()),
            ),
        }
    }

    fn steiner(&self) -> SteinerGauss {
        SteinerGauss::new(self.config.full_reduce).with_variant(self.config.steiner_variant)
    }

    /// Untraced eliminator used as the fitness oracle of search modes.
    fn search_base(&self) -> Box<dyn Eliminator> {
        match self.config.mode {
            EliminationMode::GeneticGauss | EliminationMode::PsoGauss => {
                Box::new(GaussEliminator::new(self.config.full_reduce))
            }
            _ => Box::new(self.steiner()),
        }
    }

    /// The graph to pass to the eliminator. Routing modes get a fully
    /// connected stand-in when none was supplied.
    fn routing_architecture(&self, qubits: usize) -> SynthResult<Option<Cow<'_, ConnectivityGraph>>> {
        if self.config.mode.respects_architecture() {
            return resolve_architecture(self.architecture.as_ref(), qubits).map(Some);
        }
        match &self.architecture {
            Some(arch) if arch.num_qubits() != qubits => Err(SynthError::ArchitectureMismatch {
                matrix: qubits,
                architecture: arch.num_qubits(),
            }),
            other => Ok(other.as_ref().map(Cow::Borrowed)),
        }
    }

    /// Synthesize a circuit for `matrix`.
    ///
    /// The input is left untouched; the reduced working copy is returned
    /// in [`Synthesis::matrix`].
    #[instrument(skip_all, fields(mode = %self.config.mode, qubits = matrix.rows()))]
    pub fn synthesize(&self, matrix: &GF2Matrix) -> SynthResult<Synthesis> {
        let n = matrix.rows();
        let arch = self.routing_architecture(n)?;
        let eliminator = self.eliminator();

        let mut reduced = matrix.clone();
        let mut circuit = CnotCircuit::new(n);
        let rank = eliminator.reduce(&mut reduced, arch.as_deref(), Some(&mut circuit))?;
        let mut synthesis = Synthesis::new(circuit, reduced, rank);

        if self.transpose_applies() && synthesis.matrix.is_identity() {
            let mut transposed = matrix.transpose();
            let mut reverse = CnotCircuit::new(n);
            eliminator.reduce(&mut transposed, arch.as_deref(), Some(&mut reverse))?;
            if transposed.is_identity() {
                let candidate = reverse.transposed();
                let metric = self.config.metric;
                debug!(
                    direct = synthesis.score(metric),
                    transposed = metric.score(&candidate),
                    "Transpose trial"
                );
                if metric.score(&candidate) < synthesis.score(metric) {
                    synthesis.circuit = candidate;
                }
            }
        }

        info!(
            eliminator = eliminator.name(),
            rank = synthesis.rank,
            cnots = synthesis.circuit.count_cnots(),
            depth = synthesis.circuit.cnot_depth(),
            "Synthesis completed"
        );
        Ok(synthesis)
    }

    fn transpose_applies(&self) -> bool {
        self.config.try_transpose
            && self.config.full_reduce
            && matches!(
                self.config.mode,
                EliminationMode::Gauss | EliminationMode::Steiner
            )
    }

    /// Synthesize a sequence of square matrices with chained placements.
    ///
    /// Search modes choose the placements genetically (or by particle
    /// swarm); the other modes keep every placement at the identity.
    /// PermRowCol relabels circuit inputs, which would break the chain, and
    /// is rejected.
    #[instrument(skip_all, fields(mode = %self.config.mode, matrices = matrices.len()))]
    pub fn synthesize_sequence(
        &self,
        matrices: &[GF2Matrix],
        input_perm: bool,
        output_perm: bool,
    ) -> SynthResult<SequenceResult> {
        let config = &self.config;
        let (base, strategy): (Box<dyn Eliminator>, _) = match config.mode {
            EliminationMode::PermRowCol => {
                return Err(SynthError::InvalidConfiguration(
                    "perm_row_col relabels circuit inputs and cannot be chained".into(),
                ));
            }
            EliminationMode::GeneticSteiner | EliminationMode::GeneticGauss => {
                (self.search_base(), SequenceStrategy::Genetic)
            }
            EliminationMode::PsoSteiner | EliminationMode::PsoGauss => {
                (self.search_base(), SequenceStrategy::Swarm)
            }
            _ => (self.eliminator(), SequenceStrategy::Basic),
        };
        let Some(first) = matrices.first() else {
            return Ok(SequenceResult::default());
        };
        let arch = self.routing_architecture(first.rows())?;

        SequenceSynthesizer::new(base.as_ref(), arch.as_deref())
            .with_strategy(strategy)
            .with_metric(config.metric)
            .with_genetic(config.genetic.clone())
            .with_swarm(config.swarm.clone())
            .with_seed(config.seed)
            .with_threads(config.threads)
            .with_tracer(self.tracer.clone())
            .synthesize(matrices, input_perm, output_perm)
    }
}

/// Builder for [`Synthesizer`].
#[derive(Default)]
pub struct SynthesizerBuilder {
    config: SynthesisConfig,
    architecture: Option<ConnectivityGraph>,
    hook: Option<Arc<dyn TraceHook>>,
}

impl SynthesizerBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: SynthesisConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the elimination mode.
    #[must_use]
    pub fn with_mode(mut self, mode: EliminationMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the target architecture.
    #[must_use]
    pub fn with_architecture(mut self, architecture: ConnectivityGraph) -> Self {
        self.architecture = Some(architecture);
        self
    }

    /// Reduce to upper triangular form only when `false`.
    #[must_use]
    pub fn with_full_reduce(mut self, full_reduce: bool) -> Self {
        self.config.full_reduce = full_reduce;
        self
    }

    /// Set the master seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Cap the fitness evaluation pool.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.config.threads = Some(threads);
        self
    }

    /// Install a hook that observes row operations and search progress.
    #[must_use]
    pub fn with_trace_hook(mut self, hook: Arc<dyn TraceHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Validate the configuration and build the synthesizer.
    pub fn build(self) -> SynthResult<Synthesizer> {
        self.config.validate()?;
        let tracer = self.hook.map_or_else(Tracer::disabled, Tracer::new);
        debug!(
            mode = %self.config.mode,
            architecture = self.architecture.as_ref().map(ConnectivityGraph::name),
            traced = tracer.is_enabled(),
            "Synthesizer built"
        );
        Ok(Synthesizer {
            config: self.config,
            architecture: self.architecture,
            tracer,
        })
    }
}
