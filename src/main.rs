//! Evolve CLI - Run a target-vector search from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use evolve::{
    EvolutionConfig, EvolutionRunner, GenomeRng,
    evolution::TargetSearch,
    schema::{GenerationReport, StopCriteria},
};

/// Contents of a run configuration file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RunFile {
    #[serde(default)]
    evolution: EvolutionConfig,
    #[serde(default)]
    problem: TargetSearch,
}

fn load_run_file(path: &Path) -> Result<RunFile, String> {
    let text =
        fs::read_to_string(path).map_err(|e| format!("Error reading config file: {}", e))?;
    let run: RunFile =
        serde_json::from_str(&text).map_err(|e| format!("Error parsing config: {}", e))?;
    run.evolution
        .validate()
        .map_err(|e| format!("Invalid config: {}", e))?;
    Ok(run)
}

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json>", args[0]);
        eprintln!();
        eprintln!("Run a target-vector search from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to run configuration file");
        eprintln!();
        eprintln!("Example configuration is printed with the --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let run = load_run_file(&config_path).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });

    let seed = run.evolution.random_seed.unwrap_or_else(rand::random);
    let mut pool_rng = GenomeRng::new(seed);
    let pool = run.problem.initial_pool(&mut pool_rng).unwrap_or_else(|e| {
        eprintln!("Error creating initial pool: {}", e);
        std::process::exit(1);
    });

    println!("Evolve - Target Search");
    println!("======================");
    println!("Target: {:?}", run.problem.target);
    println!("Pool size: {}", pool.len());
    println!("Seed: {}", seed);
    println!();

    let problem = run.problem.clone();
    let config = EvolutionConfig {
        random_seed: Some(pool_rng.next_seed()),
        ..run.evolution
    };
    let mut runner = EvolutionRunner::new(run.problem, config).unwrap_or_else(|e| {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    });

    let start = Instant::now();
    let result = runner
        .run_with_callback(pool, print_generation)
        .unwrap_or_else(|e| {
            eprintln!("Evolution failed: {}", e);
            std::process::exit(1);
        });
    let elapsed = start.elapsed();

    println!();
    println!("Stopped: {:?}", result.stats.stop_reason);
    println!("Generations: {}", result.stats.generations);
    println!("Evaluations: {}", result.stats.total_evaluations);
    if let Some(best) = &result.best {
        println!(
            "Best: {:?} (fitness {:.6}, distance {:.6}, generation {})",
            best.candidate,
            best.fitness,
            problem.squared_distance(&best.candidate).sqrt(),
            best.iteration
        );
    }
    println!("Time: {:.2}s", elapsed.as_secs_f32());
}

fn print_generation(report: &GenerationReport) {
    let diversity = report
        .diversity
        .map_or_else(|| "-".to_string(), |d| format!("{d:.4}"));
    println!(
        "  Generation {}: leader={:.6}, mean={:.6}, best={:.6}, diversity={}",
        report.iteration,
        report.generation_fitness,
        report.mean_fitness,
        report.best_fitness,
        diversity
    );
}

fn example_run_file() -> RunFile {
    let mut run = RunFile::default();
    run.evolution.stop = StopCriteria {
        stop_at_fitness_limit: true,
        stop_at_iteration_limit: true,
        fitness_limit: Some(0.99),
        iteration_limit: Some(200),
    };
    run.evolution.random_seed = Some(42);
    run
}

fn print_example_config() {
    match serde_json::to_string_pretty(&example_run_file()) {
        Ok(json) => {
            println!("Example configuration (config.json):");
            println!("{}", json);
        }
        Err(e) => {
            eprintln!("Error serializing example: {}", e);
            std::process::exit(1);
        }
    }
}
