//! Solve outcomes.
//!
//! [`EigenResult`] is what a successful solve hands back: the eigenpairs in
//! descending eigenvalue order plus a [`SolveReport`] describing how they were
//! obtained. The report exists for operational visibility only; nothing in the
//! solver reads it back.

use crate::algorithms::StrategyKind;
use faer::{ColRef, Mat};
use serde::Serialize;
use std::time::Duration;

/// The `k` largest eigenpairs of a symmetric matrix.
#[derive(Debug, Clone)]
pub struct EigenResult {
    /// Eigenvalues in descending order.
    pub eigenvalues: Vec<f64>,
    /// Unit-norm eigenvectors, column `i` pairing with `eigenvalues[i]`.
    pub eigenvectors: Mat<f64>,
    /// How the result was obtained.
    pub report: SolveReport,
}

impl EigenResult {
    /// Number of eigenpairs `k`.
    pub fn rank(&self) -> usize {
        self.eigenvalues.len()
    }

    /// Dimension `n` of the eigenvectors.
    pub fn dim(&self) -> usize {
        self.eigenvectors.nrows()
    }

    /// The eigenvector paired with `eigenvalues[i]`.
    pub fn eigenvector(&self, i: usize) -> ColRef<'_, f64> {
        self.eigenvectors.col(i)
    }
}

/// How one strategy attempt ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttemptOutcome {
    Succeeded,
    ConvergenceFailed { converged: usize, requested: usize },
    Failed { reason: String },
}

/// A single strategy attempt within a solve.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    pub strategy: StrategyKind,
    pub elapsed: Duration,
    pub outcome: AttemptOutcome,
}

/// The trace of a solve: every attempt in order, the last one being the successful one.
#[derive(Debug, Clone, Serialize)]
pub struct SolveReport {
    /// The strategy that produced the result.
    pub strategy: StrategyKind,
    pub attempts: Vec<AttemptRecord>,
}

impl SolveReport {
    /// Returns `true` if an earlier strategy failed before the successful one ran.
    pub fn fell_back(&self) -> bool {
        self.attempts.len() > 1
    }

    /// Wall time spent across all attempts.
    pub fn total_elapsed(&self) -> Duration {
        self.attempts.iter().map(|a| a.elapsed).sum()
    }
}
