//! Target-vector search, a small reference problem.
//!
//! Genomes decode to points; fitness is `1 / (1 + d²)` where `d` is the
//! Euclidean distance to the target, so it is always in `(0, 1]` and works
//! with the identity fitness translation.

use serde::{Deserialize, Serialize};

use super::genome::{Genome, GenomeError, GenomeRng};
use super::problem::Problem;

/// Decoding errors for [`TargetSearch`].
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("Genome has {actual} genes, target has {expected} dimensions")]
    Dimension { expected: usize, actual: usize },
    #[error("Genome contains non-finite gene {0}")]
    NonFinite(f64),
}

/// Find the point closest to `target`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSearch {
    /// Point to approach.
    pub target: Vec<f64>,
    /// Bounds for genes of the initial pool.
    #[serde(default = "default_initial_bounds")]
    pub initial_bounds: (f64, f64),
    /// Size of the initial pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_initial_bounds() -> (f64, f64) {
    (-10.0, 10.0)
}
fn default_pool_size() -> usize {
    50
}

impl Default for TargetSearch {
    fn default() -> Self {
        Self {
            target: vec![3.0, -1.5, 0.5],
            initial_bounds: default_initial_bounds(),
            pool_size: default_pool_size(),
        }
    }
}

impl TargetSearch {
    pub fn new(target: Vec<f64>) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    /// Random starting pool sized and bounded by this problem's settings.
    pub fn initial_pool(&self, rng: &mut GenomeRng) -> Result<Vec<Genome>, GenomeError> {
        (0..self.pool_size)
            .map(|_| Genome::random(rng, self.target.len(), self.initial_bounds))
            .collect()
    }

    /// Squared Euclidean distance to the target.
    pub fn squared_distance(&self, point: &[f64]) -> f64 {
        point
            .iter()
            .zip(&self.target)
            .map(|(x, t)| (x - t).powi(2))
            .sum()
    }
}

impl Problem for TargetSearch {
    type Candidate = Vec<f64>;
    type Error = TargetError;

    fn decode_genes(&self, genes: &[Genome]) -> Result<Vec<Vec<f64>>, TargetError> {
        genes
            .iter()
            .map(|genome| {
                if genome.len() != self.target.len() {
                    return Err(TargetError::Dimension {
                        expected: self.target.len(),
                        actual: genome.len(),
                    });
                }
                if let Some(&x) = genome.genes().iter().find(|x| !x.is_finite()) {
                    return Err(TargetError::NonFinite(x));
                }
                Ok(genome.genes().to_vec())
            })
            .collect()
    }

    fn evaluate_fitness(&self, candidate: &Vec<f64>) -> Result<f64, TargetError> {
        Ok(1.0 / (1.0 + self.squared_distance(candidate)))
    }
}
