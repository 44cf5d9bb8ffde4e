//! Command-line front end: computes the top-K eigenpairs of a matrix file.
//!
//! Reads a symmetric matrix in the plain-text format of
//! [`topk_eigen::utils::data_loader`], runs the default [`EigenSolver`] and writes one
//! CSV row per eigenpair: its rank, eigenvalue, and the eigenvector components.
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde::Serialize;
use std::{fs::File, io, path::PathBuf};
use topk_eigen::{
    EigenRequest, EigenSolver, SymmetricMatrix, request, utils::data_loader::load_symmetric_matrix,
};

/// Command-line arguments for the eigensolver.
#[derive(Parser, Debug)]
#[clap(
    name = "topk-eigs",
    about = "Computes the K largest eigenpairs of a symmetric matrix file."
)]
struct EigsArgs {
    /// Path to the symmetric matrix file.
    #[clap(value_name = "PATH")]
    matrix: PathBuf,

    /// Number of eigenpairs to compute.
    #[clap(long, short = 'k')]
    rank: usize,

    /// Convergence tolerance of the iterative solver.
    #[clap(long, default_value_t = request::DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Maximum number of restart cycles of the iterative solver.
    #[clap(long, default_value_t = request::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Krylov subspace size. Defaults to min(2K, N).
    #[clap(long)]
    subspace_size: Option<usize>,

    /// Seed of the Lanczos start vector.
    #[clap(long, default_value_t = request::DEFAULT_SEED)]
    seed: u64,

    /// Path to the output CSV file. Writes to stdout when omitted.
    #[clap(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// A single output row.
#[derive(Debug, Serialize)]
struct EigenpairRow {
    index: usize,
    eigenvalue: f64,
    eigenvector: String,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    let args = EigsArgs::parse();

    let matrix = load_symmetric_matrix(&args.matrix)
        .with_context(|| format!("Failed to load matrix from {}", args.matrix.display()))?;
    log::info!(
        "Loaded {}x{} matrix from {}.",
        matrix.nrows(),
        matrix.ncols(),
        args.matrix.display()
    );

    let mut request = EigenRequest::new(args.rank)
        .with_tolerance(args.tolerance)
        .with_max_iterations(args.max_iterations)
        .with_seed(args.seed);
    if let Some(size) = args.subspace_size {
        request = request.with_subspace_size(size);
    }

    let result = EigenSolver::new().solve(SymmetricMatrix::new(matrix.as_ref())?, &request)?;
    for attempt in &result.report.attempts {
        log::info!(
            "{} solver: {:?} in {:.3}s",
            attempt.strategy,
            attempt.outcome,
            attempt.elapsed.as_secs_f64()
        );
    }

    let sink: Box<dyn io::Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    let mut writer = csv::Writer::from_writer(sink);
    for (index, &eigenvalue) in result.eigenvalues.iter().enumerate() {
        let eigenvector = (0..result.dim())
            .map(|i| result.eigenvectors[(i, index)].to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writer.serialize(EigenpairRow {
            index,
            eigenvalue,
            eigenvector,
        })?;
    }
    writer.flush()?;

    Ok(())
}
