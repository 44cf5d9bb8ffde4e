//! This module provides the high-level API: the [`EigenSolver`] orchestrator that turns
//! a symmetric matrix and an [`EigenRequest`] into the top-`k` eigenpairs.
//!
//! The orchestrator owns the strategy selection policy:
//!
//! - `k < n`: the Lanczos strategy runs first. If it reports a convergence shortfall
//!   the dense strategy runs on the same matrix and its output is truncated.
//! - `k == n`: the whole spectrum is wanted, so the dense strategy runs directly.
//!
//! Whatever the strategy, the result is sorted by descending eigenvalue with the
//! eigenvectors permuted in lock step, each eigenvector is scaled to unit norm and
//! its sign fixed so that its largest-magnitude component is positive.

use crate::{
    algorithms::{
        EigenPairs, Strategy, dense::DenseFullSolver, lanczos::IterativePartialSolver,
    },
    error::{EigenError, EigenErrorKind},
    matrix::SymmetricMatrix,
    request::EigenRequest,
    result::{AttemptOutcome, AttemptRecord, EigenResult, SolveReport},
};
use faer::{
    Mat, Par,
    dyn_stack::{MemBuffer, MemStack},
    matrix_free::LinOp,
};
use std::time::Instant;

/// Stateless top-`k` symmetric eigensolver with an iterative-first, dense-fallback policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct EigenSolver {
    dense: DenseFullSolver,
    iterative: IterativePartialSolver,
}

impl EigenSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The strategies tried, in order, for rank `k` of an `n x n` matrix.
    pub fn plan(&self, n: usize, k: usize) -> Vec<&dyn Strategy> {
        let iterative: &dyn Strategy = &self.iterative;
        let dense: &dyn Strategy = &self.dense;
        if k < n {
            vec![iterative, dense]
        } else {
            vec![dense]
        }
    }

    /// Computes the `request.rank` largest eigenpairs of `matrix`.
    ///
    /// # Arguments
    /// * `matrix`: The symmetric input. Only its lower triangle and its products with
    ///   vectors are used; symmetry is not verified.
    /// * `request`: The rank and the iterative solver settings.
    ///
    /// # Returns
    /// An [`EigenResult`] with eigenvalues in descending order, or an [`EigenError`]:
    /// `InvalidArgument` if the request does not fit the matrix (nothing is computed),
    /// `ComputationFailed` if every applicable strategy failed.
    pub fn solve(
        &self,
        matrix: SymmetricMatrix<'_>,
        request: &EigenRequest,
    ) -> Result<EigenResult, EigenError> {
        let n = matrix.dim();
        let k = request.rank;
        request.validate(n)?;

        let mut mem = MemBuffer::new(matrix.as_ref().apply_scratch(1, Par::Seq));
        let stack = MemStack::new(&mut mem);
        run_plan(&self.plan(n, k), matrix, request, stack)
    }

    /// Flat-buffer form of [`EigenSolver::solve`].
    ///
    /// # Arguments
    /// * `n`: The matrix dimension.
    /// * `matrix`: `n * n` entries in row-major order.
    /// * `request`: The rank `k` and the iterative solver settings.
    /// * `values`: Receives the `k` eigenvalues, descending. Must hold at least `k` entries.
    /// * `vectors`: Receives the eigenvectors, eigenvector `i` in `vectors[i * n..(i + 1) * n]`.
    ///   Must hold at least `k * n` entries.
    ///
    /// # Returns
    /// The [`SolveReport`] of the solve. On error the output buffers are left untouched.
    pub fn solve_into(
        &self,
        n: usize,
        matrix: &[f64],
        request: &EigenRequest,
        values: &mut [f64],
        vectors: &mut [f64],
    ) -> Result<SolveReport, EigenError> {
        request.validate(n)?;
        let k = request.rank;
        let matrix = SymmetricMatrix::from_row_major(n, matrix)?;
        if values.len() < k {
            return Err(EigenError::invalid(format!(
                "eigenvalue buffer holds {} entries, need {k}",
                values.len()
            )));
        }
        let needed = k.checked_mul(n).ok_or_else(|| {
            EigenError::invalid(format!("eigenvector buffer size {k} * {n} overflows"))
        })?;
        if vectors.len() < needed {
            return Err(EigenError::invalid(format!(
                "eigenvector buffer holds {} entries, need {needed}",
                vectors.len()
            )));
        }

        let result = self.solve(matrix, request)?;

        values[..k].copy_from_slice(&result.eigenvalues);
        for (j, chunk) in vectors.chunks_exact_mut(n).take(k).enumerate() {
            for (i, slot) in chunk.iter_mut().enumerate() {
                *slot = result.eigenvectors[(i, j)];
            }
        }
        Ok(result.report)
    }
}

/// Solves with the default [`EigenSolver`]. See [`EigenSolver::solve`].
pub fn solve(
    matrix: SymmetricMatrix<'_>,
    request: &EigenRequest,
) -> Result<EigenResult, EigenError> {
    EigenSolver::new().solve(matrix, request)
}

/// Solves into flat buffers with the default [`EigenSolver`]. See [`EigenSolver::solve_into`].
pub fn solve_into(
    n: usize,
    matrix: &[f64],
    request: &EigenRequest,
    values: &mut [f64],
    vectors: &mut [f64],
) -> Result<SolveReport, EigenError> {
    EigenSolver::new().solve_into(n, matrix, request, values, vectors)
}

/// Tries `plan` in order until a strategy produces an acceptable result.
///
/// A convergence shortfall, or a result rejected by [`rank_descending`], hands over to
/// the next strategy. Invalid arguments and failures of the last strategy are final.
fn run_plan(
    plan: &[&dyn Strategy],
    matrix: SymmetricMatrix<'_>,
    request: &EigenRequest,
    stack: &mut MemStack,
) -> Result<EigenResult, EigenError> {
    let n = matrix.dim();
    let k = request.rank;

    let mut attempts = Vec::new();
    let mut last_error = None;
    for (position, strategy) in plan.iter().enumerate() {
        let kind = strategy.kind();
        let has_fallback = position + 1 < plan.len();
        log::debug!("Attempting {kind} eigensolver for k={k}, n={n}.");

        let start = Instant::now();
        let outcome = strategy.attempt(matrix, request, stack);
        let elapsed = start.elapsed();

        match outcome.and_then(|pairs| rank_descending(pairs, k)) {
            Ok((eigenvalues, eigenvectors)) => {
                attempts.push(AttemptRecord {
                    strategy: kind,
                    elapsed,
                    outcome: AttemptOutcome::Succeeded,
                });
                log::info!(
                    "Computed top {k} of {n} eigenpairs with the {kind} solver in {:.3}s.",
                    elapsed.as_secs_f64()
                );
                return Ok(EigenResult {
                    eigenvalues,
                    eigenvectors,
                    report: SolveReport {
                        strategy: kind,
                        attempts,
                    },
                });
            }
            Err(err) => match err.kind().clone() {
                EigenErrorKind::ConvergenceFailed {
                    converged,
                    requested,
                } => {
                    log::warn!(
                        "The {kind} solver converged {converged} of {requested} eigenpairs after {:.3}s; falling back.",
                        elapsed.as_secs_f64()
                    );
                    attempts.push(AttemptRecord {
                        strategy: kind,
                        elapsed,
                        outcome: AttemptOutcome::ConvergenceFailed {
                            converged,
                            requested,
                        },
                    });
                    last_error = Some(err);
                }
                EigenErrorKind::InvalidArgument(_) => return Err(err),
                EigenErrorKind::ComputationFailed(reason) if has_fallback => {
                    log::warn!("The {kind} solver failed: {reason}; falling back.");
                    attempts.push(AttemptRecord {
                        strategy: kind,
                        elapsed,
                        outcome: AttemptOutcome::Failed { reason },
                    });
                    last_error = Some(err);
                }
                EigenErrorKind::ComputationFailed(reason) => {
                    log::warn!("The {kind} solver failed: {reason}");
                    return Err(err);
                }
            },
        }
    }

    Err(EigenError::computation(match last_error {
        Some(err) => format!("no eigensolver strategy succeeded; last error: {err}"),
        None => "no eigensolver strategy applies".to_string(),
    }))
}

/// Sorts raw eigenpairs by descending eigenvalue and keeps the first `k`.
///
/// Each kept eigenvector is normalized and its sign chosen so that its
/// largest-magnitude component is positive.
fn rank_descending(pairs: EigenPairs, k: usize) -> Result<(Vec<f64>, Mat<f64>), EigenError> {
    let EigenPairs { values, vectors } = pairs;
    if vectors.ncols() != values.len() || values.len() < k {
        return Err(EigenError::computation(format!(
            "strategy returned {} eigenvalues and {} eigenvectors for k={k}",
            values.len(),
            vectors.ncols()
        )));
    }

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    order.truncate(k);

    let n = vectors.nrows();
    let mut scales = Vec::with_capacity(k);
    for &src in &order {
        let mut norm_sq = 0.0;
        let mut pivot = 0.0_f64;
        for i in 0..n {
            let x = vectors[(i, src)];
            norm_sq += x * x;
            if x.abs() > pivot.abs() {
                pivot = x;
            }
        }
        let norm = norm_sq.sqrt();
        if !(norm.is_finite() && norm > 0.0) {
            return Err(EigenError::computation(format!(
                "eigenvector for eigenvalue {} has norm {norm}",
                values[src]
            )));
        }
        scales.push(if pivot < 0.0 { -1.0 / norm } else { 1.0 / norm });
    }

    let eigenvalues = order.iter().map(|&src| values[src]).collect();
    let eigenvectors = Mat::from_fn(n, k, |i, j| vectors[(i, order[j])] * scales[j]);
    Ok((eigenvalues, eigenvectors))
}
