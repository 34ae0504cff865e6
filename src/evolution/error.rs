//! Run-level error taxonomy.

use crate::schema::ConfigError;

use super::genome::GenomeError;
use super::selector::SelectionError;

/// Errors surfaced by [`EvolutionRunner`](super::EvolutionRunner).
///
/// `E` is the problem's own error type, passed through untouched.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError<E> {
    /// Invalid stop criteria or operator settings, detected before the loop.
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),
    /// Mismatched gene counts or invalid operator parameters.
    #[error("Genome validation failed: {0}")]
    Validation(GenomeError),
    /// Broken selection precondition (empty population, invalid weights).
    #[error("Selection invariant violated: {0}")]
    InvariantViolation(SelectionError),
    /// The decoder did not return one candidate per genome.
    #[error("Decoder returned {actual} candidates for {expected} genomes")]
    DecodeMismatch { expected: usize, actual: usize },
    /// Decode or evaluation error raised by the problem.
    #[error(transparent)]
    Problem(E),
}

impl<E> From<GenomeError> for EvolutionError<E> {
    fn from(err: GenomeError) -> Self {
        Self::Validation(err)
    }
}

impl<E> From<SelectionError> for EvolutionError<E> {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::Genome(err) => Self::Validation(err),
            other => Self::InvariantViolation(other),
        }
    }
}
