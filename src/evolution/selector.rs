//! Roulette-wheel selection with weighted operator mixing.
//!
//! Each child of the next generation is produced by one of three operators
//! (clone, mutate, mate) chosen in proportion to the configured weights. The
//! parents are drawn from a cumulative probability scale built over the scored
//! population, so fitter individuals reproduce more often.

use crate::schema::{ConfigError, SelectionConfig};

use super::genome::{Genome, GenomeError, GenomeRng};
use super::problem::Scored;

/// Converts raw fitness into a roulette weight.
///
/// Any `Fn(f64) -> f64` closure is a translation, which makes rank-like or
/// shifted scalings a one-liner.
pub trait FitnessTranslation {
    fn translate_fitness_to_probability(&self, fitness: f64) -> f64;
}

/// Uses raw fitness as the selection weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl FitnessTranslation for Identity {
    fn translate_fitness_to_probability(&self, fitness: f64) -> f64 {
        fitness
    }
}

impl<F> FitnessTranslation for F
where
    F: Fn(f64) -> f64,
{
    fn translate_fitness_to_probability(&self, fitness: f64) -> f64 {
        self(fitness)
    }
}

/// Selection failures. All of them indicate a broken precondition rather
/// than a recoverable runtime event.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectionError {
    #[error("Cannot select from an empty population")]
    EmptyPopulation,
    #[error("Selection weight {weight} for individual {index} (fitness {fitness}) must be finite")]
    InvalidWeight {
        index: usize,
        fitness: f64,
        weight: f64,
    },
    #[error("Probability mass {0} must be finite")]
    DegenerateMass(f64),
    #[error("Roulette draw {draw} exceeds probability mass {mass}")]
    RouletteOverflow { draw: f64, mass: f64 },
    #[error("Candidate references genome {index} outside a pool of {pool_size}")]
    UnknownGenome { index: usize, pool_size: usize },
    #[error(transparent)]
    Genome(#[from] GenomeError),
}

/// Ordered `(cumulative weight, pool index)` pairs.
#[derive(Debug, Clone)]
pub struct CumulativeScale {
    entries: Vec<(f64, usize)>,
    mass: f64,
}

impl CumulativeScale {
    /// Accumulate translated weights in population order.
    ///
    /// Negative weights count as zero. A population whose mass is zero
    /// still yields a scale: every draw is then `0` and picks the first
    /// entry.
    pub fn build<C, T>(scored: &[Scored<C>], translation: &T) -> Result<Self, SelectionError>
    where
        T: FitnessTranslation + ?Sized,
    {
        if scored.is_empty() {
            return Err(SelectionError::EmptyPopulation);
        }

        let mut entries = Vec::with_capacity(scored.len());
        let mut cumulative = 0.0;
        for (index, item) in scored.iter().enumerate() {
            let weight = translation.translate_fitness_to_probability(item.fitness);
            if !weight.is_finite() {
                return Err(SelectionError::InvalidWeight {
                    index,
                    fitness: item.fitness,
                    weight,
                });
            }
            cumulative += weight.max(0.0);
            entries.push((cumulative, item.genome()));
        }

        if !cumulative.is_finite() {
            return Err(SelectionError::DegenerateMass(cumulative));
        }

        Ok(Self {
            entries,
            mass: cumulative,
        })
    }

    /// Total probability mass (the last cumulative value).
    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn entries(&self) -> &[(f64, usize)] {
        &self.entries
    }

    /// Pool index of the first entry whose cumulative value is `>= draw`.
    pub fn pick(&self, draw: f64) -> Result<usize, SelectionError> {
        let pos = self.entries.partition_point(|(cumulative, _)| *cumulative < draw);
        self.entries
            .get(pos)
            .map(|(_, genome)| *genome)
            .ok_or(SelectionError::RouletteOverflow {
                draw,
                mass: self.mass,
            })
    }

    /// One roulette spin: draw from `[0, mass)` and pick.
    pub fn spin(&self, rng: &mut GenomeRng) -> Result<usize, SelectionError> {
        self.pick(rng.below(self.mass))
    }
}

/// Reproduction operator chosen for one child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Clone,
    Mutate,
    Mate,
}

/// Produces the next genome pool from a scored population.
#[derive(Debug, Clone)]
pub struct Selector<T = Identity> {
    config: SelectionConfig,
    translation: T,
}

impl Selector<Identity> {
    /// Create a selector using raw fitness as selection weight.
    pub fn new(config: SelectionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            translation: Identity,
        })
    }
}

impl<T: FitnessTranslation> Selector<T> {
    /// Replace the fitness translation.
    pub fn with_translation<U: FitnessTranslation>(self, translation: U) -> Selector<U> {
        Selector {
            config: self.config,
            translation,
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn translate_fitness_to_probability(&self, fitness: f64) -> f64 {
        self.translation.translate_fitness_to_probability(fitness)
    }

    /// Choose an operator in proportion to the configured weights.
    pub fn choose_operator(&self, rng: &mut GenomeRng) -> Operator {
        let draw = rng.below(self.config.weight_sum());
        if draw < self.config.clone_weight {
            Operator::Clone
        } else if draw < self.config.clone_weight + self.config.mutate_weight {
            Operator::Mutate
        } else {
            Operator::Mate
        }
    }

    /// Build the next generation from `scored`, whose candidates index into
    /// `pool`.
    ///
    /// Returns `generation_size` genomes, or as many as were scored when no
    /// size is configured.
    pub fn select_next_generation<C>(
        &self,
        pool: &[Genome],
        scored: &[Scored<C>],
        rng: &mut GenomeRng,
    ) -> Result<Vec<Genome>, SelectionError> {
        let scale = CumulativeScale::build(scored, &self.translation)?;
        if let Some(&(_, index)) = scale.entries().iter().find(|(_, i)| *i >= pool.len()) {
            return Err(SelectionError::UnknownGenome {
                index,
                pool_size: pool.len(),
            });
        }

        let size = self.config.generation_size.unwrap_or(scored.len());
        let mutation = &self.config.mutation;
        let mating = &self.config.mating;
        let mut counts = [0usize; 3];
        let mut next_gen = Vec::with_capacity(size);

        for _ in 0..size {
            let operator = self.choose_operator(rng);
            let primary = &pool[scale.spin(rng)?];

            let child = match operator {
                Operator::Clone => {
                    counts[0] += 1;
                    primary.clone()
                }
                Operator::Mutate => {
                    counts[1] += 1;
                    primary.mutate(rng, mutation.ranges.as_deref(), mutation.probability)?
                }
                Operator::Mate => {
                    counts[2] += 1;
                    let partner = &pool[scale.spin(rng)?];
                    primary.procreate(partner, mating.preference, mating.strategy, rng)?
                }
            };
            next_gen.push(child);
        }

        log::debug!(
            "Selected {} children (clone={}, mutate={}, mate={}) from mass {:.4}",
            next_gen.len(),
            counts[0],
            counts[1],
            counts[2],
            scale.mass()
        );

        Ok(next_gen)
    }
}
