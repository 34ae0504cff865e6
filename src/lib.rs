//! Evolve - Generic evolutionary computation engine.
//!
//! This crate drives a population of candidate solutions through repeated
//! cycles of decoding, fitness evaluation and roulette-wheel
//! selection/reproduction until a stop criterion is met.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration and report types for evolution runs
//! - `evolution`: Genome operators, selection and the evolution loop
//!
//! A concrete problem implements [`Problem`] (decode genomes into candidates,
//! score candidates); the engine supplies everything else.
//!
//! # Example
//!
//! ```rust,no_run
//! use evolve::{EvolutionConfig, EvolutionRunner, Genome, Problem, StopCriteria};
//!
//! struct Maximize;
//!
//! impl Problem for Maximize {
//!     type Candidate = f64;
//!     type Error = std::convert::Infallible;
//!
//!     fn decode_genes(&self, genes: &[Genome]) -> Result<Vec<f64>, Self::Error> {
//!         Ok(genes.iter().map(|g| g.genes()[0]).collect())
//!     }
//!
//!     fn evaluate_fitness(&self, x: &f64) -> Result<f64, Self::Error> {
//!         Ok(x.max(0.0) + 1.0)
//!     }
//! }
//!
//! let config = EvolutionConfig {
//!     stop: StopCriteria::fitness(5.0),
//!     ..Default::default()
//! };
//! let mut runner = EvolutionRunner::new(Maximize, config).unwrap();
//! let result = runner.run(vec![Genome::new(vec![0.0]); 10]).unwrap();
//! println!("Best fitness: {}", result.stats.best_fitness);
//! ```

pub mod evolution;
pub mod schema;

// Re-export commonly used types
pub use evolution::{EvolutionError, EvolutionRunner, Genome, GenomeRng, Problem, Selector};
pub use schema::{EvolutionConfig, SelectionConfig, StopCriteria};
