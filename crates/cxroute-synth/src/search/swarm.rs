//! Particle swarm search over permutations.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, instrument};

use super::{Evaluator, partial_crossover, random_permutation, shuffle_mutation};
use crate::config::SwarmConfig;
use crate::trace::{TraceEvent, Tracer};

/// One move of a particle.
///
/// Given the particle's current point, return the point it moves to next,
/// the solution found at the current point and that solution's cost.
pub trait StepFunction: Sync {
    /// Payload kept alongside each best point.
    type Solution: Clone + Send + Default;

    /// Evaluate `current` and propose the next point.
    fn step(&self, current: &[usize]) -> (Vec<usize>, Self::Solution, u64);
}

/// Best point found by a swarm.
#[derive(Debug, Clone, PartialEq)]
pub struct SwarmOutcome<S> {
    /// Point whose step produced [`solution`](Self::solution).
    pub point: Vec<usize>,
    /// Solution found at that point.
    pub solution: S,
    /// Its cost.
    pub fitness: u64,
}

struct Particle<S> {
    rng: StdRng,
    current: Vec<usize>,
    best_point: Vec<usize>,
    best_solution: S,
    best_fitness: Option<u64>,
}

/// Particle swarm minimizing a [`StepFunction`].
///
/// A particle that improves on its own best keeps moving wherever the step
/// function sends it. One that fails to improve and is not moved by the
/// step function is shaken: a few positions are shuffled, then it is pulled
/// toward its personal best and toward the swarm's best.
pub struct ParticleSwarm<'f, F: StepFunction + ?Sized> {
    step_fn: &'f F,
    config: SwarmConfig,
    seed: u64,
    evaluator: Evaluator,
    tracer: Tracer,
}

impl<'f, F: StepFunction + ?Sized> ParticleSwarm<'f, F> {
    /// Particle `i` draws from a generator seeded with `seed + i`.
    pub fn new(step_fn: &'f F, config: SwarmConfig, seed: u64) -> Self {
        Self {
            step_fn,
            config,
            seed,
            evaluator: Evaluator::sequential(),
            tracer: Tracer::disabled(),
        }
    }

    /// Move particles on up to `threads` workers (all cores when `None`).
    #[must_use]
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.evaluator = Evaluator::new(threads);
        self
    }

    /// Report each finished step.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = tracer;
        self
    }

    /// Run the swarm over permutations of `0..n` for `steps` steps (at
    /// least one). Particle 0 starts at the identity.
    #[instrument(skip(self), fields(swarm = self.config.swarm_size))]
    pub fn find_optimum(&self, n: usize, steps: usize) -> SwarmOutcome<F::Solution> {
        let mut particles: Vec<Particle<F::Solution>> = (0..self.config.swarm_size.max(1))
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(i as u64));
                let current = if i == 0 {
                    (0..n).collect()
                } else {
                    random_permutation(n, &mut rng)
                };
                Particle {
                    rng,
                    current,
                    best_point: Vec::new(),
                    best_solution: F::Solution::default(),
                    best_fitness: None,
                }
            })
            .collect();

        let mut global = SwarmOutcome {
            point: (0..n).collect(),
            solution: F::Solution::default(),
            fitness: u64::MAX,
        };
        let mut global_known = false;

        let shuffled = (self.config.mutation * n as f64) as usize;
        let from_personal = (self.config.p_crossover * n as f64) as usize;
        let from_swarm = (self.config.s_crossover * n as f64) as usize;

        for step in 0..steps.max(1) {
            let step_fn = self.step_fn;
            let swarm_point = global.point.as_slice();
            self.evaluator.for_each(&mut particles, |p| {
                let (next, solution, fitness) = step_fn.step(&p.current);
                if p.best_fitness.is_none_or(|best| fitness <= best) {
                    p.best_fitness = Some(fitness);
                    p.best_point = p.current.clone();
                    p.best_solution = solution;
                    p.current = next;
                } else if next == p.current {
                    let shaken = shuffle_mutation(&p.current, shuffled, &mut p.rng);
                    let shaken = partial_crossover(&shaken, &p.best_point, from_personal, &mut p.rng);
                    p.current = partial_crossover(&shaken, swarm_point, from_swarm, &mut p.rng);
                } else {
                    p.current = next;
                }
            });

            let leader = particles
                .iter()
                .filter_map(|p| p.best_fitness.map(|f| (f, p)))
                .min_by_key(|(f, _)| *f);
            if let Some((fitness, p)) = leader {
                if !global_known || fitness < global.fitness {
                    global = SwarmOutcome {
                        point: p.best_point.clone(),
                        solution: p.best_solution.clone(),
                        fitness,
                    };
                    global_known = true;
                }
            }

            let best_fitness = global.fitness;
            debug!(step, best_fitness, "Swarm step completed");
            self.tracer
                .emit(|| TraceEvent::SwarmStepCompleted { step, best_fitness });
        }
        global
    }
}
