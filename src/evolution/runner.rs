//! The generational evolution loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::schema::{
    ConfigError, EvolutionConfig, EvolutionHistory, GenerationReport, RunStats, StopCriteria,
    StopReason,
};

use super::error::EvolutionError;
use super::genome::{Genome, GenomeError, GenomeRng, pool_diversity};
use super::problem::{Candidate, Problem, Scored};
use super::selector::{FitnessTranslation, Identity, SelectionError, Selector};

/// The highest-fitness individual seen during a run.
#[derive(Debug, Clone)]
pub struct BestIndividual<C> {
    /// The decoded candidate.
    pub candidate: C,
    /// The genome it was decoded from.
    pub genome: Genome,
    /// Its fitness.
    pub fitness: f64,
    /// Generation in which it appeared.
    pub iteration: usize,
}

/// Final result of an evolution run.
#[derive(Debug, Clone)]
pub struct RunResult<C> {
    /// Best individual found, `None` if no generation ran or no fitness
    /// exceeded negative infinity.
    pub best: Option<BestIndividual<C>>,
    /// The pool produced by the last selection.
    pub final_pool: Vec<Genome>,
    /// Statistics from the run.
    pub stats: RunStats,
    /// Per-generation history.
    pub history: EvolutionHistory,
}

/// Drives a gene pool through decode, evaluate, report and select cycles
/// until a stop criterion holds.
pub struct EvolutionRunner<P, T = Identity> {
    problem: P,
    selector: Selector<T>,
    stop: StopCriteria,
    rng: GenomeRng,
    report_diversity: bool,
    cancelled: Arc<AtomicBool>,
}

impl<P: Problem> EvolutionRunner<P> {
    /// Create a runner for `problem`.
    ///
    /// Selection settings are validated here; stop criteria are validated
    /// when a run starts.
    pub fn new(problem: P, config: EvolutionConfig) -> Result<Self, ConfigError> {
        let seed = config.random_seed.unwrap_or_else(rand::random);
        log::debug!("Evolution runner seeded with {seed}");

        Ok(Self {
            problem,
            selector: Selector::new(config.selection)?,
            stop: config.stop,
            rng: GenomeRng::new(seed),
            report_diversity: config.report_diversity,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }
}

impl<P: Problem, T: FitnessTranslation> EvolutionRunner<P, T> {
    /// Replace the fitness-to-probability translation.
    pub fn with_translation<U: FitnessTranslation>(
        self,
        translation: U,
    ) -> EvolutionRunner<P, U> {
        EvolutionRunner {
            problem: self.problem,
            selector: self.selector.with_translation(translation),
            stop: self.stop,
            rng: self.rng,
            report_diversity: self.report_diversity,
            cancelled: self.cancelled,
        }
    }

    /// Replace the random source.
    pub fn with_rng(mut self, rng: GenomeRng) -> Self {
        self.rng = rng;
        self
    }

    /// Replace the stop criteria.
    pub fn with_stop_criteria(mut self, stop: StopCriteria) -> Self {
        self.stop = stop;
        self
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    pub fn selector(&self) -> &Selector<T> {
        &self.selector
    }

    /// Check if evolution should stop.
    fn should_stop(&self, iteration: usize, best_fitness: f64) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }

        if self.stop.stop_at_iteration_limit
            && let Some(limit) = self.stop.iteration_limit
            && iteration >= limit
        {
            return Some(StopReason::IterationLimit);
        }

        if self.stop.stop_at_fitness_limit
            && let Some(target) = self.stop.fitness_limit
            && best_fitness >= target
        {
            return Some(StopReason::FitnessLimit);
        }

        None
    }

    /// Run evolution with a per-generation report callback.
    ///
    /// The starting pool is consumed; each generation replaces it with the
    /// selector's output.
    pub fn run_with_callback<F>(
        &mut self,
        gene_pool: Vec<Genome>,
        mut callback: F,
    ) -> Result<RunResult<P::Candidate>, EvolutionError<P::Error>>
    where
        F: FnMut(&GenerationReport),
    {
        self.stop.validate()?;
        if !self.stop.is_bounded() {
            log::warn!("No stop criterion enabled; the run ends only when cancelled");
        }

        let gene_count = match gene_pool.first() {
            Some(genome) => genome.len(),
            None => return Err(SelectionError::EmptyPopulation.into()),
        };
        if let Some(genome) = gene_pool.iter().find(|g| g.len() != gene_count) {
            return Err(GenomeError::LengthMismatch {
                expected: gene_count,
                actual: genome.len(),
            }
            .into());
        }

        let start_time = Instant::now();
        let mut pool = gene_pool;
        let mut iteration = 0;
        let mut best_fitness = f64::NEG_INFINITY;
        let mut best: Option<BestIndividual<P::Candidate>> = None;
        let mut history = EvolutionHistory::default();
        let mut total_evaluations = 0u64;

        let stop_reason = loop {
            if let Some(reason) = self.should_stop(iteration, best_fitness) {
                break reason;
            }

            let cohort = self
                .problem
                .decode_genes(&pool)
                .map_err(EvolutionError::Problem)?;
            if cohort.len() != pool.len() {
                return Err(EvolutionError::DecodeMismatch {
                    expected: pool.len(),
                    actual: cohort.len(),
                });
            }

            let mut scored = Vec::with_capacity(cohort.len());
            let mut generation_fitness = f64::NEG_INFINITY;
            let mut generation_leader = None;
            let mut new_best = None;
            let mut fitness_sum = 0.0;

            for (genome, phenotype) in cohort.into_iter().enumerate() {
                let fitness = self
                    .problem
                    .evaluate_fitness(&phenotype)
                    .map_err(EvolutionError::Problem)?;
                if fitness > generation_fitness {
                    generation_fitness = fitness;
                    generation_leader = Some(genome);
                    if fitness > best_fitness {
                        best_fitness = fitness;
                        new_best = Some(genome);
                    }
                }
                fitness_sum += fitness;
                scored.push(Scored {
                    candidate: Candidate { genome, phenotype },
                    fitness,
                });
            }
            total_evaluations += scored.len() as u64;

            let report = GenerationReport {
                iteration,
                generation_fitness,
                generation_leader,
                leader_genome: generation_leader.map(|i| pool[i].clone()),
                best_fitness,
                best_iteration: match new_best {
                    Some(_) => Some(iteration),
                    None => best.as_ref().map(|b| b.iteration),
                },
                best_genome: match new_best {
                    Some(i) => Some(pool[i].clone()),
                    None => best.as_ref().map(|b| b.genome.clone()),
                },
                mean_fitness: fitness_sum / scored.len() as f64,
                diversity: self.report_diversity.then(|| pool_diversity(&pool)),
                population_size: scored.len(),
            };
            log::info!(
                "Generation {}: leader fitness {:.6} (genome {:?}), best fitness {:.6} (generation {:?})",
                report.iteration,
                report.generation_fitness,
                report.generation_leader,
                report.best_fitness,
                report.best_iteration
            );
            history.record(&report);
            callback(&report);

            let next_gen = self
                .selector
                .select_next_generation(&pool, &scored, &mut self.rng)?;

            if let Some(index) = new_best {
                let leader = scored.swap_remove(index);
                best = Some(BestIndividual {
                    candidate: leader.candidate.phenotype,
                    genome: pool[index].clone(),
                    fitness: leader.fitness,
                    iteration,
                });
            }

            pool = next_gen;
            iteration += 1;
        };

        let elapsed = start_time.elapsed().as_secs_f64();
        log::info!(
            "Evolution stopped after {iteration} generations ({stop_reason:?}), best fitness {best_fitness:.6}"
        );

        Ok(RunResult {
            best,
            final_pool: pool,
            stats: RunStats {
                generations: iteration,
                total_evaluations,
                best_fitness,
                elapsed_seconds: elapsed,
                stop_reason,
            },
            history,
        })
    }

    /// Run evolution (blocking).
    pub fn run(
        &mut self,
        gene_pool: Vec<Genome>,
    ) -> Result<RunResult<P::Candidate>, EvolutionError<P::Error>> {
        self.run_with_callback(gene_pool, |_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{MutationConfig, SelectionConfig};
    use std::cell::Cell;

    #[derive(Debug, thiserror::Error)]
    #[error("bad gene {0}")]
    struct BadGene(f64);

    /// Fitness of `[x, ..]` is `x`; decoding fails on NaN.
    struct FirstGene {
        decodes: Cell<usize>,
    }

    impl FirstGene {
        fn new() -> Self {
            Self {
                decodes: Cell::new(0),
            }
        }
    }

    impl Problem for FirstGene {
        type Candidate = f64;
        type Error = BadGene;

        fn decode_genes(&self, genes: &[Genome]) -> Result<Vec<f64>, BadGene> {
            self.decodes.set(self.decodes.get() + 1);
            genes
                .iter()
                .map(|g| {
                    let x = g.genes()[0];
                    if x.is_nan() { Err(BadGene(x)) } else { Ok(x) }
                })
                .collect()
        }

        fn evaluate_fitness(&self, candidate: &f64) -> Result<f64, BadGene> {
            Ok(*candidate)
        }
    }

    /// Decoder that drops the last genome.
    struct Lossy;

    impl Problem for Lossy {
        type Candidate = ();
        type Error = BadGene;

        fn decode_genes(&self, genes: &[Genome]) -> Result<Vec<()>, BadGene> {
            Ok(vec![(); genes.len().saturating_sub(1)])
        }

        fn evaluate_fitness(&self, _: &()) -> Result<f64, BadGene> {
            Ok(1.0)
        }
    }

    fn config(stop: StopCriteria, selection: SelectionConfig) -> EvolutionConfig {
        EvolutionConfig {
            stop,
            selection,
            random_seed: Some(42),
            ..Default::default()
        }
    }

    fn pool(values: &[f64]) -> Vec<Genome> {
        values.iter().map(|&v| Genome::new(vec![v])).collect()
    }

    fn mutation_only(range: f64) -> SelectionConfig {
        SelectionConfig {
            clone_weight: 0.0,
            mutate_weight: 1.0,
            mate_weight: 0.0,
            mutation: MutationConfig {
                ranges: Some(vec![range]),
                probability: 1.0,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_limit_fails_before_first_generation() {
        let stop = StopCriteria {
            stop_at_fitness_limit: true,
            stop_at_iteration_limit: false,
            fitness_limit: None,
            iteration_limit: None,
        };
        let mut runner =
            EvolutionRunner::new(FirstGene::new(), config(stop, SelectionConfig::default()))
                .unwrap();
        let result = runner.run(pool(&[1.0]));
        assert!(matches!(
            result,
            Err(EvolutionError::Configuration(ConfigError::MissingFitnessLimit))
        ));
        assert_eq!(runner.problem().decodes.get(), 0);
    }

    #[test]
    fn test_iteration_limit() {
        let mut runner = EvolutionRunner::new(
            FirstGene::new(),
            config(StopCriteria::iterations(7), SelectionConfig::default()),
        )
        .unwrap();
        let mut seen = Vec::new();
        let result = runner
            .run_with_callback(pool(&[10.0, 20.0, 30.0]), |report| seen.push(report.iteration))
            .unwrap();

        assert_eq!(result.stats.generations, 7);
        assert_eq!(result.stats.stop_reason, StopReason::IterationLimit);
        assert_eq!(result.stats.total_evaluations, 21);
        assert_eq!(seen, (0..7).collect::<Vec<_>>());
        assert_eq!(result.history.len(), 7);
        assert_eq!(result.final_pool.len(), 3);
        assert_eq!(runner.problem().decodes.get(), 7);
    }

    #[test]
    fn test_zero_iteration_limit_runs_nothing() {
        let mut runner = EvolutionRunner::new(
            FirstGene::new(),
            config(StopCriteria::iterations(0), SelectionConfig::default()),
        )
        .unwrap();
        let result = runner.run(pool(&[1.0])).unwrap();
        assert_eq!(result.stats.generations, 0);
        assert!(result.best.is_none());
        assert_eq!(result.final_pool, pool(&[1.0]));
    }

    #[test]
    fn test_single_genome_walks_to_fitness_limit() {
        let mut runner = EvolutionRunner::new(
            FirstGene::new(),
            config(StopCriteria::fitness(5.0), mutation_only(10.0)),
        )
        .unwrap();

        let result = runner.run(vec![Genome::new(vec![0.0])]).unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::FitnessLimit);
        assert!(result.stats.best_fitness >= 5.0);
        assert_eq!(result.final_pool.len(), 1);

        let best = result.best.unwrap();
        assert!(best.fitness >= 5.0);
        assert_eq!(best.iteration + 1, result.stats.generations);
    }

    #[test]
    fn test_fitness_limit_with_translation() {
        let mut runner = EvolutionRunner::new(
            FirstGene::new(),
            config(StopCriteria::fitness(5.0), mutation_only(10.0)),
        )
        .unwrap()
        .with_translation(|fitness: f64| fitness.max(0.0) + 1.0);

        let result = runner.run(pool(&[0.0; 10])).unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::FitnessLimit);
        assert!(result.stats.best_fitness >= 5.0);

        let best = result.best.unwrap();
        assert!(best.fitness >= 5.0);
        assert_eq!(best.candidate, best.genome.genes()[0]);
        assert_eq!(best.iteration + 1, result.stats.generations);
    }

    #[test]
    fn test_best_fitness_is_monotonic() {
        let mut runner = EvolutionRunner::new(
            FirstGene::new(),
            config(StopCriteria::iterations(30), mutation_only(2.0)),
        )
        .unwrap()
        .with_translation(|fitness: f64| (fitness + 100.0).max(0.0));

        let mut leaders = Vec::new();
        let result = runner
            .run_with_callback(pool(&[1.0, 2.0, 3.0, 4.0]), |report| {
                leaders.push(report.generation_fitness)
            })
            .unwrap();

        let best = &result.history.best_fitness;
        assert!(best.windows(2).all(|w| w[0] <= w[1]));
        for (leader, best) in leaders.iter().zip(best) {
            assert!(leader <= best);
        }
        assert_eq!(*best.last().unwrap(), result.stats.best_fitness);
        assert_eq!(result.best.unwrap().fitness, result.stats.best_fitness);
    }

    #[test]
    fn test_ties_keep_first_seen() {
        let selection = SelectionConfig {
            clone_weight: 1.0,
            mutate_weight: 0.0,
            mate_weight: 0.0,
            ..Default::default()
        };
        let mut runner =
            EvolutionRunner::new(FirstGene::new(), config(StopCriteria::iterations(3), selection))
                .unwrap();
        let mut reports = Vec::new();
        let result = runner
            .run_with_callback(pool(&[2.0, 2.0]), |r| reports.push(r.clone()))
            .unwrap();

        assert_eq!(reports[0].generation_leader, Some(0));
        assert_eq!(reports[2].best_iteration, Some(0));
        assert_eq!(result.best.unwrap().iteration, 0);
    }

    #[test]
    fn test_problem_errors_propagate() {
        let mut runner = EvolutionRunner::new(
            FirstGene::new(),
            config(StopCriteria::iterations(3), SelectionConfig::default()),
        )
        .unwrap();
        let result = runner.run(pool(&[f64::NAN]));
        assert!(matches!(result, Err(EvolutionError::Problem(BadGene(_)))));
    }

    #[test]
    fn test_decode_mismatch() {
        let mut runner = EvolutionRunner::new(
            Lossy,
            config(StopCriteria::iterations(3), SelectionConfig::default()),
        )
        .unwrap();
        let result = runner.run(pool(&[1.0, 2.0]));
        assert!(matches!(
            result,
            Err(EvolutionError::DecodeMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_invalid_pools_rejected() {
        let mut runner = EvolutionRunner::new(
            FirstGene::new(),
            config(StopCriteria::iterations(3), SelectionConfig::default()),
        )
        .unwrap();

        assert!(matches!(
            runner.run(Vec::new()),
            Err(EvolutionError::InvariantViolation(
                SelectionError::EmptyPopulation
            ))
        ));
        assert!(matches!(
            runner.run(vec![Genome::new(vec![1.0]), Genome::new(vec![1.0, 2.0])]),
            Err(EvolutionError::Validation(GenomeError::LengthMismatch {
                expected: 1,
                actual: 2
            }))
        ));
    }

    #[test]
    fn test_zero_mass_population_keeps_evolving() {
        let mut runner = EvolutionRunner::new(
            FirstGene::new(),
            config(StopCriteria::iterations(3), SelectionConfig::default()),
        )
        .unwrap();
        let result = runner.run(pool(&[0.0, 0.0])).unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::IterationLimit);
        assert_eq!(result.stats.generations, 3);
        assert_eq!(result.final_pool.len(), 2);
    }

    #[test]
    fn test_non_finite_fitness_is_invariant_violation() {
        let mut runner = EvolutionRunner::new(
            FirstGene::new(),
            config(StopCriteria::iterations(3), SelectionConfig::default()),
        )
        .unwrap();
        let result = runner.run(pool(&[1.0, f64::INFINITY]));
        assert!(matches!(
            result,
            Err(EvolutionError::InvariantViolation(
                SelectionError::InvalidWeight { index: 1, .. }
            ))
        ));
    }

    #[test]
    fn test_diversity_reporting_can_be_disabled() {
        let run = |report_diversity: bool| {
            let mut runner = EvolutionRunner::new(
                FirstGene::new(),
                EvolutionConfig {
                    report_diversity,
                    ..config(StopCriteria::iterations(4), SelectionConfig::default())
                },
            )
            .unwrap();
            let mut reported = Vec::new();
            let result = runner
                .run_with_callback(pool(&[10.0, 20.0, 30.0]), |report| {
                    reported.push(report.diversity)
                })
                .unwrap();
            (reported, result.history)
        };

        let (reported, history) = run(true);
        assert!(reported.iter().all(Option::is_some));
        assert_eq!(history.diversity.len(), 4);
        assert!(history.diversity[0] > 0.0);

        let (reported, history) = run(false);
        assert_eq!(reported, vec![None; 4]);
        assert!(history.diversity.is_empty());
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn test_cancellation() {
        let stop = StopCriteria {
            stop_at_fitness_limit: false,
            stop_at_iteration_limit: false,
            fitness_limit: None,
            iteration_limit: None,
        };
        let mut runner =
            EvolutionRunner::new(FirstGene::new(), config(stop, SelectionConfig::default()))
                .unwrap();
        let cancel = runner.cancel_handle();

        let result = runner
            .run_with_callback(pool(&[10.0, 20.0]), |report| {
                if report.iteration == 4 {
                    cancel.store(true, Ordering::Relaxed);
                }
            })
            .unwrap();
        assert_eq!(result.stats.stop_reason, StopReason::Cancelled);
        assert_eq!(result.stats.generations, 5);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let run = || {
            let mut runner = EvolutionRunner::new(
                FirstGene::new(),
                config(StopCriteria::iterations(10), SelectionConfig::default()),
            )
            .unwrap()
            .with_rng(GenomeRng::new(99));
            runner.run(pool(&[20.0, 30.0, 40.0])).unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.final_pool, b.final_pool);
        assert_eq!(a.history.best_fitness, b.history.best_fitness);
    }
}
