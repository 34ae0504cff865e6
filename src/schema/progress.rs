//! Report types emitted while a run progresses and when it finishes.

use serde::{Deserialize, Serialize};

use crate::evolution::Genome;

/// Per-generation record, emitted after evaluation and before selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Zero-based generation index.
    pub iteration: usize,
    /// Highest fitness in this generation.
    pub generation_fitness: f64,
    /// Pool index of the generation leader.
    pub generation_leader: Option<usize>,
    /// Genome of the generation leader.
    pub leader_genome: Option<Genome>,
    /// Highest fitness seen so far.
    pub best_fitness: f64,
    /// Generation in which the all-time best appeared.
    pub best_iteration: Option<usize>,
    /// Genome of the all-time best.
    pub best_genome: Option<Genome>,
    /// Mean fitness of this generation.
    pub mean_fitness: f64,
    /// Mean pairwise genome distance of this generation's pool, when
    /// diversity reporting is enabled.
    pub diversity: Option<f64>,
    /// Number of individuals evaluated.
    pub population_size: usize,
}

/// Fitness history across generations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionHistory {
    /// Generation-leader fitness per generation.
    pub generation_fitness: Vec<f64>,
    /// All-time best fitness after each generation.
    pub best_fitness: Vec<f64>,
    /// Mean fitness per generation.
    pub mean_fitness: Vec<f64>,
    /// Pool diversity per generation; empty when not reported.
    pub diversity: Vec<f64>,
}

impl EvolutionHistory {
    pub(crate) fn record(&mut self, report: &GenerationReport) {
        self.generation_fitness.push(report.generation_fitness);
        self.best_fitness.push(report.best_fitness);
        self.mean_fitness.push(report.mean_fitness);
        if let Some(diversity) = report.diversity {
            self.diversity.push(diversity);
        }
    }

    pub fn len(&self) -> usize {
        self.best_fitness.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best_fitness.is_empty()
    }
}

/// Statistics from an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    /// Total generations run.
    pub generations: usize,
    /// Total fitness evaluations performed.
    pub total_evaluations: u64,
    /// Best fitness achieved.
    pub best_fitness: f64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Reason evolution stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached the iteration limit.
    IterationLimit,
    /// Reached the fitness limit.
    FitnessLimit,
    /// Cancelled through the cancel handle.
    Cancelled,
}
