//! Genome representation and reproduction operators.
//!
//! Provides the fixed-length real-valued genome, the random source shared by
//! all operators, and the clone, mutate and mating operations.

use rand::prelude::*;
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};

use crate::schema::MatingStrategy;

/// Per-gene mutation probability used when none is configured.
pub const DEFAULT_MUTATION_PROBABILITY: f64 = 0.05;

/// Mutation half-width applied to every gene when no ranges are supplied.
pub const DEFAULT_MUTATION_RANGE: f64 = 1.0;

/// Bias toward the receiving parent used when none is configured.
pub const DEFAULT_PREFERENCE: f64 = 0.5;

/// Genome operator errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenomeError {
    #[error("Gene count mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Mutation ranges length {actual} does not match gene count {expected}")]
    RangesLength { expected: usize, actual: usize },
    #[error("Mutation range {value} at gene {index} must be non-negative with a finite width")]
    InvalidRange { index: usize, value: f64 },
    #[error("Mutation probability {0} must lie in [0, 1]")]
    InvalidProbability(f64),
    #[error("Mating preference {0} must lie in [0, 1]")]
    InvalidPreference(f64),
    #[error("Invalid gene bounds ({0}, {1})")]
    InvalidBounds(f64, f64),
}

/// Whether `(gene - range, gene + range)` can be sampled: non-negative and
/// with a width `2 * range` that does not overflow.
pub(crate) fn is_valid_mutation_range(range: f64) -> bool {
    range >= 0.0 && (2.0 * range).is_finite()
}

/// Random number generator wrapper for genome operations.
///
/// Every stochastic step of a run draws from one of these, so a fixed seed
/// reproduces the whole run.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform draw from `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    /// Uniform draw from `[0, bound)`.
    pub fn below(&mut self, bound: f64) -> f64 {
        self.unit() * bound
    }

    /// Bernoulli trial succeeding with `probability`.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.unit() < probability
    }

    /// Uniform perturbation in `[-range, range)`. A zero range yields zero.
    pub fn noise(&mut self, range: f64) -> f64 {
        if range > 0.0 {
            self.rng.sample(Uniform::new(-range, range))
        } else {
            0.0
        }
    }

    /// Uniform value in `[low, high)`, or `low` when the bounds coincide.
    /// The width must be finite.
    fn uniform(&mut self, bounds: (f64, f64)) -> f64 {
        bounds.0 + self.below(bounds.1 - bounds.0)
    }

    /// Generate next u64 for seeding child RNGs.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }
}

/// An ordered, fixed-length sequence of real-valued genes.
///
/// Genomes are immutable; every operator returns a new genome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    genes: Vec<f64>,
}

impl Genome {
    pub fn new(genes: Vec<f64>) -> Self {
        Self { genes }
    }

    /// Random genome with every gene drawn uniformly from `bounds`.
    pub fn random(
        rng: &mut GenomeRng,
        len: usize,
        bounds: (f64, f64),
    ) -> Result<Self, GenomeError> {
        if !(bounds.1 - bounds.0).is_finite() || bounds.0 > bounds.1 {
            return Err(GenomeError::InvalidBounds(bounds.0, bounds.1));
        }
        let genes = (0..len).map(|_| rng.uniform(bounds)).collect();
        Ok(Self { genes })
    }

    pub fn genes(&self) -> &[f64] {
        &self.genes
    }

    pub fn into_genes(self) -> Vec<f64> {
        self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Perturb each gene with independent `probability` by a uniform value in
    /// `(-ranges[i], ranges[i])`. Omitted ranges default to
    /// [`DEFAULT_MUTATION_RANGE`] for every gene.
    pub fn mutate(
        &self,
        rng: &mut GenomeRng,
        ranges: Option<&[f64]>,
        probability: f64,
    ) -> Result<Genome, GenomeError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(GenomeError::InvalidProbability(probability));
        }
        if let Some(ranges) = ranges {
            if ranges.len() != self.len() {
                return Err(GenomeError::RangesLength {
                    expected: self.len(),
                    actual: ranges.len(),
                });
            }
            if let Some((index, &value)) = ranges
                .iter()
                .enumerate()
                .find(|(_, r)| !is_valid_mutation_range(**r))
            {
                return Err(GenomeError::InvalidRange { index, value });
            }
        }

        let genes = self
            .genes
            .iter()
            .enumerate()
            .map(|(i, &gene)| {
                if rng.chance(probability) {
                    let range = ranges.map_or(DEFAULT_MUTATION_RANGE, |r| r[i]);
                    gene + rng.noise(range)
                } else {
                    gene
                }
            })
            .collect();

        Ok(Genome { genes })
    }

    /// Produce one child with `other` using the given mating strategy.
    pub fn procreate(
        &self,
        other: &Genome,
        preference: f64,
        strategy: MatingStrategy,
        rng: &mut GenomeRng,
    ) -> Result<Genome, GenomeError> {
        match strategy {
            MatingStrategy::Average => self.average_mating(other, preference),
            MatingStrategy::GiveAndTake => self.give_and_take_mating(other, preference, rng),
        }
    }

    /// Weighted interpolation between parents, biased toward `self` as
    /// `preference` approaches 1.
    pub fn average_mating(&self, other: &Genome, preference: f64) -> Result<Genome, GenomeError> {
        self.check_partner(other, preference)?;
        let genes = self
            .genes
            .iter()
            .zip(&other.genes)
            .map(|(&a, &b)| a + (1.0 - preference) * (b - a))
            .collect();
        Ok(Genome { genes })
    }

    /// Uniform crossover: each gene comes from `self` with probability
    /// `preference`, otherwise from `other`.
    pub fn give_and_take_mating(
        &self,
        other: &Genome,
        preference: f64,
        rng: &mut GenomeRng,
    ) -> Result<Genome, GenomeError> {
        self.check_partner(other, preference)?;
        let genes = self
            .genes
            .iter()
            .zip(&other.genes)
            .map(|(&a, &b)| if rng.chance(preference) { a } else { b })
            .collect();
        Ok(Genome { genes })
    }

    fn check_partner(&self, other: &Genome, preference: f64) -> Result<(), GenomeError> {
        if other.len() != self.len() {
            return Err(GenomeError::LengthMismatch {
                expected: self.len(),
                actual: other.len(),
            });
        }
        if !(0.0..=1.0).contains(&preference) {
            return Err(GenomeError::InvalidPreference(preference));
        }
        Ok(())
    }
}

impl From<Vec<f64>> for Genome {
    fn from(genes: Vec<f64>) -> Self {
        Self::new(genes)
    }
}

/// Mean absolute per-gene difference between two genomes.
///
/// Genes beyond the shorter genome are ignored.
pub fn genome_distance(g1: &Genome, g2: &Genome) -> f64 {
    let count = g1.len().min(g2.len());
    if count == 0 {
        return 0.0;
    }
    let total: f64 = g1
        .genes
        .iter()
        .zip(&g2.genes)
        .map(|(a, b)| (a - b).abs())
        .sum();
    total / count as f64
}

/// Mean pairwise distance over a pool.
pub fn pool_diversity(pool: &[Genome]) -> f64 {
    if pool.len() < 2 {
        return 0.0;
    }

    let mut total_distance = 0.0;
    let mut count = 0;
    for i in 0..pool.len() {
        for j in (i + 1)..pool.len() {
            total_distance += genome_distance(&pool[i], &pool[j]);
            count += 1;
        }
    }
    total_distance / count as f64
}
