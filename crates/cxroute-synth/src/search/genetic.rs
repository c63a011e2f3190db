//! Genetic search over permutations.

use std::collections::BTreeSet;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument, warn};

use super::{Evaluator, Fitness, random_permutation, segment_crossover, swap_mutation};
use crate::config::GeneticConfig;
use crate::trace::{TraceEvent, Tracer};

type Individual = (u64, Vec<usize>);

/// Genetic algorithm minimizing a [`Fitness`] over permutations of `0..n`.
///
/// The population is kept sorted by `(fitness, permutation)`, so the best
/// individual is always first and ties break lexicographically. Individuals
/// dropped from the population feed a small "negative" pool that donates
/// one extra child per generation, which keeps some diversity alive.
pub struct GeneticAlgorithm<'f, F: Fitness + ?Sized> {
    fitness: &'f F,
    config: GeneticConfig,
    rng: StdRng,
    evaluator: Evaluator,
    tracer: Tracer,
    population: BTreeSet<Individual>,
    negative: Vec<Individual>,
    generation: usize,
}

impl<'f, F: Fitness + ?Sized> GeneticAlgorithm<'f, F> {
    /// Create a search with its own seeded generator.
    pub fn new(fitness: &'f F, config: GeneticConfig, seed: u64) -> Self {
        Self {
            fitness,
            config,
            rng: StdRng::seed_from_u64(seed),
            evaluator: Evaluator::sequential(),
            tracer: Tracer::disabled(),
            population: BTreeSet::new(),
            negative: Vec::new(),
            generation: 0,
        }
    }

    /// Evaluate fitness on up to `threads` workers (all cores when `None`).
    #[must_use]
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.evaluator = Evaluator::new(threads);
        self
    }

    /// Report each finished generation.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = tracer;
        self
    }

    /// Best individual found so far.
    pub fn best(&self) -> Option<(&[usize], u64)> {
        self.population
            .first()
            .map(|(fitness, perm)| (perm.as_slice(), *fitness))
    }

    /// Generations run since the last [`find_optimum`](Self::find_optimum).
    pub fn generations_run(&self) -> usize {
        self.generation
    }

    /// Seed a fresh population of permutations of `0..n` and evolve it.
    ///
    /// The initial population always contains the identity, so the result
    /// is never worse than leaving the qubits in place.
    #[instrument(skip(self), fields(population = self.config.population_size))]
    pub fn find_optimum(&mut self, n: usize, generations: usize) -> Vec<usize> {
        self.population.clear();
        self.negative.clear();
        self.generation = 0;

        let mut seeds = vec![(0..n).collect::<Vec<_>>()];
        for _ in 1..self.config.population_size {
            seeds.push(random_permutation(n, &mut self.rng));
        }
        self.population = self
            .evaluator
            .evaluate(self.fitness, seeds)
            .into_iter()
            .collect();

        let negative = self
            .config
            .negative_population_size()
            .min(self.population.len());
        self.negative = self
            .population
            .iter()
            .rev()
            .take(negative)
            .cloned()
            .collect();

        debug!(
            distinct = self.population.len(),
            best = self.population.first().map(|(f, _)| *f),
            "Initial population evaluated"
        );
        self.continue_search(generations).unwrap_or_default()
    }

    /// Evolve the current population for more generations.
    ///
    /// Returns `None` if [`find_optimum`](Self::find_optimum) was never run.
    pub fn continue_search(&mut self, generations: usize) -> Option<Vec<usize>> {
        if self.population.is_empty() {
            return None;
        }
        for _ in 0..generations {
            self.step();
        }
        self.best().map(|(perm, _)| perm.to_vec())
    }

    fn step(&mut self) {
        let mut children = Vec::new();

        if self.negative.len() >= 2 {
            let picks = sample(&mut self.rng, self.negative.len(), 2);
            children.push(segment_crossover(
                &self.negative[picks.index(0)].1,
                &self.negative[picks.index(1)].1,
                &mut self.rng,
            ));
        }

        let members: Vec<&Individual> = self.population.iter().collect();
        if members.len() >= 2 {
            let worst = members.iter().map(|(f, _)| *f).max().unwrap_or(0);
            let weights = members.iter().map(|(f, _)| (worst - f) as f64 + 1.0);
            match WeightedIndex::new(weights) {
                Ok(parents) => {
                    for _ in 0..self.config.children_per_generation() {
                        if self.rng.r#gen::<f64>() >= self.config.crossover_prob {
                            continue;
                        }
                        let first = parents.sample(&mut self.rng);
                        let mut second = parents.sample(&mut self.rng);
                        if second == first {
                            let offset = self.rng.gen_range(1..members.len());
                            second = (first + offset) % members.len();
                        }
                        let mut child =
                            segment_crossover(&members[first].1, &members[second].1, &mut self.rng);
                        if self.rng.r#gen::<f64>() < self.config.mutation_prob {
                            swap_mutation(&mut child, &mut self.rng);
                        }
                        children.push(child);
                    }
                }
                Err(e) => warn!(error = %e, "Skipping parent selection"),
            }
        }

        let evaluated = self.evaluator.evaluate(self.fitness, children);
        self.population.extend(evaluated);

        let mut pool = std::mem::take(&mut self.negative);
        while self.population.len() > self.config.population_size {
            if let Some(dropped) = self.population.pop_last() {
                pool.push(dropped);
            }
        }
        let keep = self.config.negative_population_size();
        self.negative = if pool.len() > keep {
            sample(&mut self.rng, pool.len(), keep)
                .into_vec()
                .into_iter()
                .map(|i| pool[i].clone())
                .collect()
        } else {
            pool
        };

        let generation = self.generation;
        let best_fitness = self.population.first().map_or(u64::MAX, |(f, _)| *f);
        self.generation += 1;
        debug!(generation, best_fitness, "Generation completed");
        self.tracer.emit(|| TraceEvent::GenerationCompleted {
            generation,
            best_fitness,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxroute_ir::is_permutation;
    use std::sync::{Arc, Mutex};

    use crate::trace::TraceHook;

    /// Count of ascending pairs; the descending permutation scores 0.
    fn ascending_pairs(perm: &[usize]) -> u64 {
        let mut count = 0;
        for i in 0..perm.len() {
            for j in i + 1..perm.len() {
                if perm[i] < perm[j] {
                    count += 1;
                }
            }
        }
        count
    }

    #[derive(Default)]
    struct Collect(Mutex<Vec<u64>>);

    impl TraceHook for Collect {
        fn on_event(&self, event: &TraceEvent) {
            if let TraceEvent::GenerationCompleted { best_fitness, .. } = event {
                self.0.lock().unwrap().push(*best_fitness);
            }
        }
    }

    #[test]
    fn test_finds_valid_permutation() {
        let fitness = ascending_pairs;
        let mut ga = GeneticAlgorithm::new(&fitness, GeneticConfig::default(), 3);
        let best = ga.find_optimum(6, 10);
        assert!(is_permutation(&best));
        assert_eq!(best.len(), 6);
        // The identity is the worst case and always seeded.
        assert!(ascending_pairs(&best) < 15);
    }

    #[test]
    fn test_best_never_regresses() {
        let fitness = ascending_pairs;
        let hook = Arc::new(Collect::default());
        let mut ga = GeneticAlgorithm::new(&fitness, GeneticConfig::default(), 11)
            .with_tracer(Tracer::new(hook.clone()));
        ga.find_optimum(7, 8);
        ga.continue_search(4);

        let history = hook.0.lock().unwrap().clone();
        assert_eq!(history.len(), 12);
        assert!(history.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(ga.generations_run(), 12);
    }

    #[test]
    fn test_deterministic_across_thread_counts() {
        let fitness = ascending_pairs;
        let run = |threads| {
            GeneticAlgorithm::new(&fitness, GeneticConfig::default(), 42)
                .with_threads(threads)
                .find_optimum(8, 5)
        };
        assert_eq!(run(Some(1)), run(Some(4)));
    }

    #[test]
    fn test_continue_without_population() {
        let fitness = ascending_pairs;
        let mut ga = GeneticAlgorithm::new(&fitness, GeneticConfig::default(), 0);
        assert!(ga.continue_search(3).is_none());
    }

    #[test]
    fn test_tiny_instances() {
        let fitness = ascending_pairs;
        let mut ga = GeneticAlgorithm::new(&fitness, GeneticConfig::default(), 0);
        assert_eq!(ga.find_optimum(1, 3), vec![0]);
        assert_eq!(ga.find_optimum(0, 3), Vec::<usize>::new());
    }
}
