//! File-driven tests over the matrices in `data/`.
//!
//! `build.rs` scans `data/*.sym` and generates one `#[test]` per file, each of which
//! calls [`run_fixture`]. Adding a fixture only requires dropping a new matrix file
//! into `data/`.
//!
//! For every fixture the solver is run for a few ranks between 1 and `n`, and the
//! result is compared with the full dense spectrum of the same matrix.

use anyhow::{Context, Result, ensure};
use faer::prelude::*;
use std::path::PathBuf;
use topk_eigen::{
    EigenRequest, SymmetricMatrix, algorithms::dense::DenseFullSolver, solve,
    utils::data_loader::load_symmetric_matrix,
};

/// A matrix fixture discovered by the build script.
#[derive(Debug)]
struct Fixture {
    name: &'static str,
    path: PathBuf,
}

fn run_fixture(fixture: &Fixture) -> Result<()> {
    let a = load_symmetric_matrix(&fixture.path)
        .with_context(|| format!("Failed to load fixture {}", fixture.name))?;
    let n = a.nrows();
    let matrix = SymmetricMatrix::new(a.as_ref())?;

    let mut expected = DenseFullSolver.compute(matrix)?.values;
    expected.sort_by(|x, y| y.total_cmp(x));
    let scale = expected.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));

    let mut ranks = vec![1, 2, n / 3, n];
    ranks.retain(|&k| k >= 1 && k <= n);
    ranks.dedup();

    for k in ranks {
        let result = solve(matrix, &EigenRequest::new(k))?;
        ensure!(result.rank() == k, "{}: wrong rank", fixture.name);

        for (i, (got, want)) in result.eigenvalues.iter().zip(&expected).enumerate() {
            ensure!(
                (got - want).abs() < 1e-8 * scale,
                "{} k={k}, pair {i}: got {got}, want {want}",
                fixture.name
            );
        }

        for (j, &lambda) in result.eigenvalues.iter().enumerate() {
            let v = result.eigenvectors.as_ref().get(.., j..j + 1);
            ensure!((v.norm_l2() - 1.0).abs() < 1e-10, "{}: not unit norm", fixture.name);
            let residual = (a.as_ref() * v - v * Scale(lambda)).norm_l2();
            ensure!(
                residual < 1e-6 * scale,
                "{} k={k}: residual of pair {j} is {residual}",
                fixture.name
            );
        }
    }
    Ok(())
}

include!(concat!(env!("OUT_DIR"), "/fixture_tests.rs"));
