//! Synthesis configuration.
//!
//! All settings derive `serde` with `#[serde(default)]`, so a JSON document
//! only needs to name the fields it changes:
//!
//! ```
//! use cxroute_synth::{EliminationMode, SynthesisConfig};
//!
//! let config = SynthesisConfig::from_json(r#"{"mode": "genetic_steiner", "seed": 7}"#).unwrap();
//! assert_eq!(config.mode, EliminationMode::GeneticSteiner);
//! assert_eq!(config.genetic.population_size, 30);
//! ```

use serde::{Deserialize, Serialize};

use crate::elimination::{BestFirst, SteinerVariant};
use crate::eliminator::EliminationMode;
use crate::error::{SynthError, SynthResult};
use crate::search::FitnessMetric;

/// Genetic algorithm parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    /// Individuals kept after each generation.
    pub population_size: usize,
    /// Probability that a child attempt produces a child.
    pub crossover_prob: f64,
    /// Probability that a new child gets a swap mutation.
    pub mutation_prob: f64,
    /// Generations per search.
    pub generations: usize,
    /// Child attempts per generation; `None` means `population_size`.
    pub children: Option<usize>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 30,
            crossover_prob: 0.8,
            mutation_prob: 0.2,
            generations: 5,
            children: None,
        }
    }
}

impl GeneticConfig {
    /// Size of the weak "negative" population, `⌊√population_size⌋`.
    pub fn negative_population_size(&self) -> usize {
        (self.population_size as f64).sqrt() as usize
    }

    /// Child attempts per generation.
    pub fn children_per_generation(&self) -> usize {
        self.children.unwrap_or(self.population_size)
    }

    /// Check value ranges.
    pub fn validate(&self) -> SynthResult<()> {
        if self.population_size < 2 {
            return Err(SynthError::InvalidConfiguration(format!(
                "population_size must be at least 2, got {}",
                self.population_size
            )));
        }
        check_probability("crossover_prob", self.crossover_prob)?;
        check_probability("mutation_prob", self.mutation_prob)
    }
}

/// Particle swarm parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// Number of particles.
    pub swarm_size: usize,
    /// Synchronized swarm steps.
    pub steps: usize,
    /// Fraction of positions copied from the swarm best on stagnation.
    pub s_crossover: f64,
    /// Fraction of positions copied from the personal best on stagnation.
    pub p_crossover: f64,
    /// Fraction of positions shuffled on stagnation.
    pub mutation: f64,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            swarm_size: 15,
            steps: 5,
            s_crossover: 0.4,
            p_crossover: 0.3,
            mutation: 0.2,
        }
    }
}

impl SwarmConfig {
    /// Check value ranges.
    pub fn validate(&self) -> SynthResult<()> {
        if self.swarm_size == 0 {
            return Err(SynthError::InvalidConfiguration(
                "swarm_size must be positive".into(),
            ));
        }
        check_probability("s_crossover", self.s_crossover)?;
        check_probability("p_crossover", self.p_crossover)?;
        check_probability("mutation", self.mutation)
    }
}

fn check_probability(name: &str, value: f64) -> SynthResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SynthError::InvalidConfiguration(format!(
            "{name} must lie in [0, 1], got {value}"
        )))
    }
}

/// Everything the [`Synthesizer`](crate::Synthesizer) needs besides the
/// matrix and the architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Elimination mode.
    pub mode: EliminationMode,
    /// Reduce to the identity rather than upper triangular form.
    pub full_reduce: bool,
    /// Pivot ordering for Steiner-Gauss.
    pub steiner_variant: SteinerVariant,
    /// Cost of a synthesized circuit.
    pub metric: FitnessMetric,
    /// Genetic algorithm settings.
    pub genetic: GeneticConfig,
    /// Particle swarm settings.
    pub swarm: SwarmConfig,
    /// Best-first branching for PermRowCol; greedy when absent.
    pub best_first: Option<BestFirst>,
    /// Worker thread cap for fitness evaluation; all cores when absent.
    pub threads: Option<usize>,
    /// Master seed for every random choice.
    pub seed: u64,
    /// Also synthesize the transpose and keep the cheaper circuit
    /// (`Gauss` and `Steiner` with `full_reduce` only).
    pub try_transpose: bool,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            mode: EliminationMode::default(),
            full_reduce: true,
            steiner_variant: SteinerVariant::default(),
            metric: FitnessMetric::default(),
            genetic: GeneticConfig::default(),
            swarm: SwarmConfig::default(),
            best_first: None,
            threads: None,
            seed: 0,
            try_transpose: false,
        }
    }
}

impl SynthesisConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> SynthResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> SynthResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value ranges.
    pub fn validate(&self) -> SynthResult<()> {
        self.genetic.validate()?;
        self.swarm.validate()?;
        if self.threads == Some(0) {
            return Err(SynthError::InvalidConfiguration(
                "threads must be positive".into(),
            ));
        }
        if self.best_first.is_some_and(|b| b.branch_width == 0) {
            return Err(SynthError::InvalidConfiguration(
                "best_first.branch_width must be positive".into(),
            ));
        }
        if self.mode.is_search() && !self.full_reduce {
            return Err(SynthError::InvalidConfiguration(format!(
                "mode {} requires full_reduce",
                self.mode
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SynthesisConfig::default();
        assert_eq!(config.mode, EliminationMode::Steiner);
        assert!(config.full_reduce);
        assert_eq!(config.genetic.negative_population_size(), 5);
        assert_eq!(config.genetic.children_per_generation(), 30);
        assert_eq!(config.swarm.swarm_size, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip_fills_defaults() {
        let config = SynthesisConfig::from_json(
            r#"{"mode": "pso_gauss", "swarm": {"steps": 2}, "best_first": {"branch_width": 4}}"#,
        )
        .unwrap();
        assert_eq!(config.mode, EliminationMode::PsoGauss);
        assert_eq!(config.swarm.steps, 2);
        assert_eq!(config.swarm.swarm_size, 15);
        assert_eq!(
            config.best_first,
            Some(BestFirst {
                branch_width: 4,
                max_expansions: 64
            })
        );

        let json = config.to_json().unwrap();
        assert_eq!(SynthesisConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_validation_errors() {
        assert!(SynthesisConfig::from_json(r#"{"genetic": {"population_size": 1}}"#).is_err());
        assert!(SynthesisConfig::from_json(r#"{"genetic": {"mutation_prob": 1.5}}"#).is_err());
        assert!(SynthesisConfig::from_json(r#"{"threads": 0}"#).is_err());
        assert!(
            SynthesisConfig::from_json(r#"{"mode": "genetic_gauss", "full_reduce": false}"#)
                .is_err()
        );
        assert!(matches!(
            SynthesisConfig::from_json(r#"{"mode": "annealing"}"#),
            Err(SynthError::Config(_))
        ));
    }
}
