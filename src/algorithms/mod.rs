//! Eigendecomposition strategies.
//!
//! ** NOTE: We recommend using the high-level [`crate::solvers::EigenSolver`] instead. This
//! module is intended for use cases where a specific strategy must be forced, e.g. for
//! benchmarking one against the other.
//!
//! Two strategies implement the common [`Strategy`] trait:
//!
//! - [`dense::DenseFullSolver`]: the complete decomposition of the matrix in O(n^3).
//!   Deterministic and only fails on degenerate input.
//! - [`lanczos::IterativePartialSolver`]: a thick-restart Lanczos projection that only
//!   resolves the `k` largest eigenpairs. Much cheaper when `k` is small relative to `n`,
//!   but bounded by a restart budget and therefore allowed to fail.
//!
//! Strategies return raw [`EigenPairs`] in whatever order is natural to them. Sorting,
//! truncation and sign normalization are the orchestrator's job.

pub mod dense;
pub mod lanczos;

use crate::{error::EigenError, matrix::SymmetricMatrix, request::EigenRequest};
use faer::{Mat, dyn_stack::MemStack};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a strategy in logs and solve reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    DenseFull,
    IterativePartial,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::DenseFull => f.write_str("dense-full"),
            StrategyKind::IterativePartial => f.write_str("iterative-partial"),
        }
    }
}

/// Eigenpairs as produced by a strategy, before ordering.
///
/// `vectors` holds one eigenvector per column, column `i` pairing with `values[i]`.
#[derive(Debug, Clone)]
pub struct EigenPairs {
    pub values: Vec<f64>,
    pub vectors: Mat<f64>,
}

/// A way of computing (at least) the `k` largest eigenpairs of a symmetric matrix.
pub trait Strategy {
    /// The identifier reported in logs and solve reports.
    fn kind(&self) -> StrategyKind;

    /// Attempts the computation.
    ///
    /// # Arguments
    /// * `matrix`: The symmetric input matrix.
    /// * `request`: The validated request. `request.rank` is the number of pairs wanted.
    /// * `stack`: Scratch space sized for one matrix-vector product with `matrix`.
    ///
    /// # Returns
    /// At least `request.rank` eigenpairs containing the `request.rank` largest ones,
    /// or `ConvergenceFailed` if the strategy gave up and another one should be tried.
    fn attempt(
        &self,
        matrix: SymmetricMatrix<'_>,
        request: &EigenRequest,
        stack: &mut MemStack,
    ) -> Result<EigenPairs, EigenError>;
}

/// Relative norm below which a freshly orthogonalized Krylov direction is treated as
/// lying inside the current subspace.
#[inline]
pub(crate) fn breakdown_tolerance() -> f64 {
    f64::EPSILON.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_kind_display() {
        assert_eq!(StrategyKind::DenseFull.to_string(), "dense-full");
        assert_eq!(
            StrategyKind::IterativePartial.to_string(),
            "iterative-partial"
        );
    }
}
