//! Run configuration types.
//!
//! Everything here is plain serde data with `Default` impls, so a run can be
//! described entirely in JSON and validated before any generation executes.

use serde::{Deserialize, Serialize};

use crate::evolution::{DEFAULT_MUTATION_PROBABILITY, DEFAULT_PREFERENCE, is_valid_mutation_range};

/// Top-level configuration for an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// When the loop terminates.
    #[serde(default)]
    pub stop: StopCriteria,
    /// How the next generation is produced.
    #[serde(default)]
    pub selection: SelectionConfig,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Compute pairwise pool diversity for every generation report. The scan
    /// is quadratic in the pool size.
    #[serde(default = "default_report_diversity")]
    pub report_diversity: bool,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            stop: StopCriteria::default(),
            selection: SelectionConfig::default(),
            random_seed: None,
            report_diversity: default_report_diversity(),
        }
    }
}

fn default_report_diversity() -> bool {
    true
}

/// Stop criteria for the evolution loop.
///
/// A criterion only applies when its flag is set, and an enabled flag
/// requires its limit. With neither flag set the loop runs until cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopCriteria {
    /// Stop once the best fitness reaches `fitness_limit`.
    #[serde(default)]
    pub stop_at_fitness_limit: bool,
    /// Stop after `iteration_limit` generations.
    #[serde(default = "default_stop_at_iteration_limit")]
    pub stop_at_iteration_limit: bool,
    #[serde(default)]
    pub fitness_limit: Option<f64>,
    #[serde(default = "default_iteration_limit")]
    pub iteration_limit: Option<usize>,
}

impl Default for StopCriteria {
    fn default() -> Self {
        Self {
            stop_at_fitness_limit: false,
            stop_at_iteration_limit: default_stop_at_iteration_limit(),
            fitness_limit: None,
            iteration_limit: default_iteration_limit(),
        }
    }
}

fn default_stop_at_iteration_limit() -> bool {
    true
}
fn default_iteration_limit() -> Option<usize> {
    Some(100)
}

impl StopCriteria {
    /// Stop only after a fixed number of generations.
    pub fn iterations(limit: usize) -> Self {
        Self {
            stop_at_fitness_limit: false,
            stop_at_iteration_limit: true,
            fitness_limit: None,
            iteration_limit: Some(limit),
        }
    }

    /// Stop only once some individual reaches `limit`.
    pub fn fitness(limit: f64) -> Self {
        Self {
            stop_at_fitness_limit: true,
            stop_at_iteration_limit: false,
            fitness_limit: Some(limit),
            iteration_limit: None,
        }
    }

    /// Whether at least one criterion bounds the run.
    pub fn is_bounded(&self) -> bool {
        self.stop_at_fitness_limit || self.stop_at_iteration_limit
    }

    /// Check that every enabled flag carries its limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stop_at_fitness_limit {
            match self.fitness_limit {
                None => return Err(ConfigError::MissingFitnessLimit),
                Some(limit) if limit.is_nan() => {
                    return Err(ConfigError::InvalidFitnessLimit(limit));
                }
                Some(_) => {}
            }
        }
        if self.stop_at_iteration_limit && self.iteration_limit.is_none() {
            return Err(ConfigError::MissingIterationLimit);
        }
        Ok(())
    }
}

/// Mating strategy used for crossover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatingStrategy {
    /// Weighted linear interpolation between parents.
    #[default]
    Average,
    /// Per-gene uniform crossover biased by preference.
    GiveAndTake,
}

/// Mutation parameters used by the selector's mutate operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Per-gene perturbation half-widths. `None` means 1.0 for every gene.
    #[serde(default)]
    pub ranges: Option<Vec<f64>>,
    /// Per-gene mutation probability (0.0-1.0).
    #[serde(default = "default_mutation_probability")]
    pub probability: f64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            ranges: None,
            probability: default_mutation_probability(),
        }
    }
}

fn default_mutation_probability() -> f64 {
    DEFAULT_MUTATION_PROBABILITY
}

/// Crossover parameters used by the selector's mate operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatingConfig {
    #[serde(default)]
    pub strategy: MatingStrategy,
    /// Bias toward the primary parent (0.0-1.0).
    #[serde(default = "default_preference")]
    pub preference: f64,
}

impl Default for MatingConfig {
    fn default() -> Self {
        Self {
            strategy: MatingStrategy::default(),
            preference: default_preference(),
        }
    }
}

fn default_preference() -> f64 {
    DEFAULT_PREFERENCE
}

/// Roulette selection and operator mixing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Relative weight of cloning.
    #[serde(default = "default_operator_weight")]
    pub clone_weight: f64,
    /// Relative weight of mutation.
    #[serde(default = "default_operator_weight")]
    pub mutate_weight: f64,
    /// Relative weight of crossover.
    #[serde(default = "default_operator_weight")]
    pub mate_weight: f64,
    /// Children per generation. `None` keeps the population size constant.
    #[serde(default)]
    pub generation_size: Option<usize>,
    #[serde(default)]
    pub mutation: MutationConfig,
    #[serde(default)]
    pub mating: MatingConfig,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            clone_weight: default_operator_weight(),
            mutate_weight: default_operator_weight(),
            mate_weight: default_operator_weight(),
            generation_size: None,
            mutation: MutationConfig::default(),
            mating: MatingConfig::default(),
        }
    }
}

fn default_operator_weight() -> f64 {
    1.0
}

impl SelectionConfig {
    /// Sum of the three operator weights.
    pub fn weight_sum(&self) -> f64 {
        self.clone_weight + self.mutate_weight + self.mate_weight
    }

    /// Validate operator weights and operator parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, weight) in [
            ("clone", self.clone_weight),
            ("mutate", self.mutate_weight),
            ("mate", self.mate_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidOperatorWeight(format!(
                    "{name} weight {weight} must be finite and non-negative"
                )));
            }
        }
        if !self.weight_sum().is_finite() {
            return Err(ConfigError::InvalidOperatorWeight(
                "operator weights overflow when summed".to_string(),
            ));
        }
        if self.weight_sum() <= 0.0 {
            return Err(ConfigError::InvalidOperatorWeight(
                "operator weights sum to zero".to_string(),
            ));
        }

        if self.generation_size == Some(0) {
            return Err(ConfigError::EmptyGeneration);
        }

        if !(0.0..=1.0).contains(&self.mutation.probability) {
            return Err(ConfigError::InvalidProbability(self.mutation.probability));
        }
        if let Some(ranges) = &self.mutation.ranges
            && !ranges.iter().all(|&r| is_valid_mutation_range(r))
        {
            return Err(ConfigError::InvalidMutationRanges);
        }

        if !(0.0..=1.0).contains(&self.mating.preference) {
            return Err(ConfigError::InvalidPreference(self.mating.preference));
        }

        Ok(())
    }
}

impl EvolutionConfig {
    /// Parse from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stop.validate()?;
        self.selection.validate()
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("fitness_limit is not supplied, despite stop_at_fitness_limit=true")]
    MissingFitnessLimit,
    #[error("iteration_limit is not supplied, despite stop_at_iteration_limit=true")]
    MissingIterationLimit,
    #[error("Fitness limit must not be NaN, got {0}")]
    InvalidFitnessLimit(f64),
    #[error("Invalid operator weight: {0}")]
    InvalidOperatorWeight(String),
    #[error("Generation size must be at least 1")]
    EmptyGeneration,
    #[error("Mutation probability {0} must lie in [0, 1]")]
    InvalidProbability(f64),
    #[error("Mutation ranges must be non-negative with a finite width")]
    InvalidMutationRanges,
    #[error("Mating preference {0} must lie in [0, 1]")]
    InvalidPreference(f64),
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = EvolutionConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.stop.is_bounded());
    }

    #[test]
    fn test_missing_limits_rejected() {
        let stop = StopCriteria {
            stop_at_fitness_limit: true,
            stop_at_iteration_limit: false,
            fitness_limit: None,
            iteration_limit: None,
        };
        assert!(matches!(
            stop.validate(),
            Err(ConfigError::MissingFitnessLimit)
        ));

        let stop = StopCriteria {
            stop_at_fitness_limit: false,
            stop_at_iteration_limit: true,
            fitness_limit: None,
            iteration_limit: None,
        };
        assert!(matches!(
            stop.validate(),
            Err(ConfigError::MissingIterationLimit)
        ));
    }

    #[test]
    fn test_disabled_flags_ignore_missing_limits() {
        let stop = StopCriteria {
            stop_at_fitness_limit: false,
            stop_at_iteration_limit: false,
            fitness_limit: None,
            iteration_limit: None,
        };
        assert!(stop.validate().is_ok());
        assert!(!stop.is_bounded());
    }

    #[test]
    fn test_operator_weights_validated() {
        let selection = SelectionConfig {
            clone_weight: 0.0,
            mutate_weight: 0.0,
            mate_weight: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            selection.validate(),
            Err(ConfigError::InvalidOperatorWeight(_))
        ));

        let selection = SelectionConfig {
            mate_weight: -1.0,
            ..Default::default()
        };
        assert!(selection.validate().is_err());

        let selection = SelectionConfig {
            generation_size: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            selection.validate(),
            Err(ConfigError::EmptyGeneration)
        ));
    }

    #[test]
    fn test_operator_parameters_validated() {
        let mut selection = SelectionConfig::default();
        selection.mutation.probability = 2.0;
        assert!(matches!(
            selection.validate(),
            Err(ConfigError::InvalidProbability(_))
        ));

        let mut selection = SelectionConfig::default();
        selection.mutation.ranges = Some(vec![1.0, f64::NAN]);
        assert!(matches!(
            selection.validate(),
            Err(ConfigError::InvalidMutationRanges)
        ));

        let mut selection = SelectionConfig::default();
        selection.mutation.ranges = Some(vec![1e308]);
        assert!(matches!(
            selection.validate(),
            Err(ConfigError::InvalidMutationRanges)
        ));

        let mut selection = SelectionConfig::default();
        selection.mating.preference = -0.1;
        assert!(matches!(
            selection.validate(),
            Err(ConfigError::InvalidPreference(_))
        ));
    }

    #[test]
    fn test_json_defaults() {
        let config = EvolutionConfig::from_json_str(
            r#"{
                "stop": { "stop_at_fitness_limit": true, "fitness_limit": 5.0 },
                "selection": { "mate_weight": 0.0, "mating": { "strategy": "GiveAndTake" } },
                "random_seed": 7
            }"#,
        )
        .unwrap();

        assert!(config.stop.stop_at_fitness_limit);
        assert!(config.stop.stop_at_iteration_limit);
        assert_eq!(config.stop.iteration_limit, Some(100));
        assert_eq!(config.selection.clone_weight, 1.0);
        assert_eq!(config.selection.mate_weight, 0.0);
        assert_eq!(config.selection.mating.strategy, MatingStrategy::GiveAndTake);
        assert_eq!(config.selection.mating.preference, DEFAULT_PREFERENCE);
        assert_eq!(
            config.selection.mutation.probability,
            DEFAULT_MUTATION_PROBABILITY
        );
        assert_eq!(config.random_seed, Some(7));
        assert!(config.report_diversity);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            EvolutionConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
