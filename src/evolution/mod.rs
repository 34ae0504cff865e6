//! Evolutionary computation engine.
//!
//! # Overview
//!
//! The engine consists of:
//!
//! - **Genome** (`genome`): fixed-length real-valued genes with clone,
//!   mutation and two mating strategies
//! - **Selector** (`selector`): roulette-wheel selection mixed with weighted
//!   operator choice
//! - **Runner** (`runner`): the decode → evaluate → report → select loop
//! - **Problem** (`problem`): the trait a concrete problem implements
//!
//! # Example
//!
//! ```rust,no_run
//! use evolve::evolution::{EvolutionRunner, GenomeRng, TargetSearch};
//! use evolve::schema::{EvolutionConfig, StopCriteria};
//!
//! let problem = TargetSearch::new(vec![1.0, 2.0, 3.0]);
//! let pool = problem.initial_pool(&mut GenomeRng::new(7)).unwrap();
//!
//! let config = EvolutionConfig {
//!     stop: StopCriteria::iterations(50),
//!     random_seed: Some(7),
//!     ..Default::default()
//! };
//! let mut runner = EvolutionRunner::new(problem, config).unwrap();
//! let result = runner
//!     .run_with_callback(pool, |report| {
//!         println!("Generation {}: best fitness = {:.3}",
//!             report.iteration, report.best_fitness);
//!     })
//!     .unwrap();
//! println!("Stopped: {:?}", result.stats.stop_reason);
//! ```

mod error;
mod genome;
mod problem;
mod runner;
mod selector;
mod target;

pub use error::EvolutionError;
pub(crate) use genome::is_valid_mutation_range;
pub use genome::{
    DEFAULT_MUTATION_PROBABILITY, DEFAULT_MUTATION_RANGE, DEFAULT_PREFERENCE, Genome,
    GenomeError, GenomeRng, genome_distance, pool_diversity,
};
pub use problem::{Candidate, Problem, Scored};
pub use runner::{BestIndividual, EvolutionRunner, RunResult};
pub use selector::{
    CumulativeScale, FitnessTranslation, Identity, Operator, SelectionError, Selector,
};
pub use target::{TargetError, TargetSearch};
