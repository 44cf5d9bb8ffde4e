//! Full dense eigendecomposition.
//!
//! A thin adapter over faer's self-adjoint eigendecomposition. faer reports the
//! eigenvalues in nondecreasing order with orthonormal eigenvectors in the columns
//! of `U`; the adapter forwards them untouched and leaves ordering to the caller.

use super::{EigenPairs, Strategy, StrategyKind};
use crate::{error::EigenError, matrix::SymmetricMatrix, request::EigenRequest};
use faer::{Side, dyn_stack::MemStack, prelude::*};

/// Computes every eigenpair of the matrix in O(n^3).
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseFullSolver;

impl DenseFullSolver {
    /// Computes the complete spectrum of `matrix`, eigenvalues in ascending order.
    ///
    /// # Errors
    /// Returns `ComputationFailed` if the matrix has non-finite entries, if faer's
    /// routine does not converge, or if it yields non-finite eigenvalues.
    pub fn compute(&self, matrix: SymmetricMatrix<'_>) -> Result<EigenPairs, EigenError> {
        if !matrix.is_finite() {
            return Err(EigenError::computation(
                "matrix contains non-finite entries",
            ));
        }

        let n = matrix.dim();
        let evd = matrix
            .as_ref()
            .self_adjoint_eigen(Side::Lower)
            .map_err(|e| EigenError::computation(format!("{e:?}")))?;

        let s = evd.S();
        let values: Vec<f64> = (0..n).map(|i| s[i]).collect();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(EigenError::computation(
                "eigendecomposition produced non-finite eigenvalues",
            ));
        }

        Ok(EigenPairs {
            values,
            vectors: evd.U().to_owned(),
        })
    }
}

impl Strategy for DenseFullSolver {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DenseFull
    }

    fn attempt(
        &self,
        matrix: SymmetricMatrix<'_>,
        _request: &EigenRequest,
        _stack: &mut MemStack,
    ) -> Result<EigenPairs, EigenError> {
        self.compute(matrix)
    }
}
