//! Problem-specific extension points.

use super::genome::Genome;

/// A concrete optimization problem: how genomes become candidates and how
/// candidates are scored.
///
/// Higher fitness is better.
pub trait Problem {
    /// The decoded, evaluable form of a genome.
    type Candidate;
    /// Domain error raised by decoding or evaluation.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Decode a pool into candidates, exactly one per genome and in the same
    /// order.
    fn decode_genes(&self, genes: &[Genome]) -> Result<Vec<Self::Candidate>, Self::Error>;

    /// Score one decoded candidate.
    fn evaluate_fitness(&self, candidate: &Self::Candidate) -> Result<f64, Self::Error>;
}

/// A decoded candidate paired with the pool index of the genome it came from.
#[derive(Debug, Clone)]
pub struct Candidate<C> {
    /// Index into the generation's genome pool.
    pub genome: usize,
    /// The decoded value.
    pub phenotype: C,
}

/// A candidate with its fitness score.
#[derive(Debug, Clone)]
pub struct Scored<C> {
    pub candidate: Candidate<C>,
    pub fitness: f64,
}

impl<C> Scored<C> {
    /// Pool index of the genome behind this score.
    pub fn genome(&self) -> usize {
        self.candidate.genome
    }
}
