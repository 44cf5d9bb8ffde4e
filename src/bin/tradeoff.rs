//! Strategy trade-off benchmark.
//!
//! Generates a seeded random dense symmetric matrix and, for a sweep of ranks `k`,
//! times the dense and the iterative strategy on it directly, bypassing the
//! orchestrator's fallback. The output shows where the crossover between the two
//! lies for a given `n`, and how often the iterative strategy fails to converge
//! within its budget.
use anyhow::{Result, anyhow, ensure};
use clap::{Parser, ValueEnum};
use faer::{
    Mat, Par,
    dyn_stack::{MemBuffer, MemStack},
    matrix_free::LinOp,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;
use std::path::PathBuf;
use topk_eigen::{
    EigenRequest, SymmetricMatrix,
    algorithms::{Strategy, StrategyKind, dense::DenseFullSolver, lanczos::IterativePartialSolver},
    request,
    utils::perf::{peak_memory_kb, timed},
};

/// Which strategies to benchmark.
#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
enum Variant {
    Dense,
    Iterative,
    Both,
}

/// Command-line arguments for the trade-off benchmark.
#[derive(Parser, Debug)]
#[clap(
    name = "strategy-tradeoff",
    about = "Times the dense and iterative eigensolver strategies over a sweep of ranks."
)]
struct TradeoffArgs {
    /// Dimension of the dense square matrix.
    #[clap(long)]
    n: usize,
    /// The first rank of the sweep.
    #[clap(long, default_value_t = 1)]
    k_start: usize,
    /// The last rank of the sweep (inclusive).
    #[clap(long, default_value_t = 50)]
    k_end: usize,
    /// The step size of the sweep.
    #[clap(long, default_value_t = 5)]
    k_step: usize,
    /// Strategies to run.
    #[clap(long, value_enum, default_value_t = Variant::Both)]
    variant: Variant,
    /// Convergence tolerance of the iterative solver.
    #[clap(long, default_value_t = request::DEFAULT_TOLERANCE)]
    tolerance: f64,
    /// Maximum number of restart cycles of the iterative solver.
    #[clap(long, default_value_t = request::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,
    /// Seed for the random matrix.
    #[clap(long, default_value_t = 42)]
    seed: u64,
    /// Path to the output CSV file where results will be written.
    #[clap(long, value_name = "PATH")]
    output: PathBuf,
}

/// One measurement.
#[derive(Debug, Serialize)]
struct TradeoffResult {
    strategy: StrategyKind,
    k: usize,
    time_s: f64,
    rss_kb: u64,
    converged: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    let args = TradeoffArgs::parse();
    ensure!(args.n > 1, "--n must be at least 2, got {}", args.n);
    ensure!(args.k_step > 0, "--k-step must be positive");
    ensure!(
        args.k_start >= 1 && args.k_start <= args.k_end,
        "invalid rank sweep {}..={}",
        args.k_start,
        args.k_end
    );

    // A dense, symmetric, random matrix with a fixed seed for reproducibility.
    log::info!("Generating a {0}x{0} random symmetric matrix...", args.n);
    let mut rng = StdRng::seed_from_u64(args.seed);
    let b_rand = Mat::from_fn(args.n, args.n, |_, _| rng.random::<f64>());
    let a = &b_rand + b_rand.transpose();
    let matrix = SymmetricMatrix::new(a.as_ref())?;

    let dense = DenseFullSolver;
    let iterative = IterativePartialSolver;
    let mut strategies: Vec<&dyn Strategy> = Vec::new();
    if matches!(args.variant, Variant::Dense | Variant::Both) {
        strategies.push(&dense);
    }
    if matches!(args.variant, Variant::Iterative | Variant::Both) {
        strategies.push(&iterative);
    }

    let mut mem = MemBuffer::new(a.as_ref().apply_scratch(1, Par::Seq));
    let stack = MemStack::new(&mut mem);
    let mut writer = csv::Writer::from_path(&args.output)?;

    for k in (args.k_start..=args.k_end.min(args.n)).step_by(args.k_step) {
        let request = EigenRequest::new(k)
            .with_tolerance(args.tolerance)
            .with_max_iterations(args.max_iterations);

        for strategy in &strategies {
            // The iterative strategy is only defined for a strict subset of the spectrum.
            if strategy.kind() == StrategyKind::IterativePartial && k >= args.n {
                continue;
            }
            log::info!("Running {} for k = {k}...", strategy.kind());
            let (outcome, elapsed) = timed(|| strategy.attempt(matrix, &request, stack));
            let converged = match outcome {
                Ok(_) => true,
                Err(err) if err.is_convergence_failure() => {
                    log::warn!("{} did not converge for k = {k}: {err}", strategy.kind());
                    false
                }
                Err(err) => return Err(err.into()),
            };

            writer.serialize(TradeoffResult {
                strategy: strategy.kind(),
                k,
                time_s: elapsed.as_secs_f64(),
                rss_kb: peak_memory_kb(),
                converged,
            })?;
        }
    }

    writer.flush()?;
    log::info!("Results written to {}.", args.output.display());
    Ok(())
}
