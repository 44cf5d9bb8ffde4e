//! Per-call solver configuration.
//!
//! An [`EigenRequest`] carries the requested rank together with the knobs that
//! control the iterative path. The defaults reproduce the values the solver was
//! tuned with; every knob can be overridden through the `with_*` builders.

use crate::error::EigenError;
use serde::{Deserialize, Serialize};

/// Default convergence tolerance for the iterative solver.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Default number of thick-restart cycles for the iterative solver.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Default seed for the Lanczos start vector.
pub const DEFAULT_SEED: u64 = 42;

/// The parameters of a single top-K eigenpair computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EigenRequest {
    /// Number of eigenpairs `K` to return.
    pub rank: usize,
    /// Relative residual tolerance for a Ritz pair to count as converged.
    pub tolerance: f64,
    /// Maximum number of thick-restart cycles before the iterative path gives up.
    pub max_iterations: usize,
    /// Krylov subspace size. `None` selects `min(2K, N)`.
    pub subspace_size: Option<usize>,
    /// Seed of the random start vector.
    pub seed: u64,
}

impl Default for EigenRequest {
    fn default() -> Self {
        Self::new(1)
    }
}

impl EigenRequest {
    /// A request for the `rank` largest eigenpairs with default settings.
    pub fn new(rank: usize) -> Self {
        Self {
            rank,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            subspace_size: None,
            seed: DEFAULT_SEED,
        }
    }

    /// Sets the relative residual tolerance of the iterative solver.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the restart cycle budget of the iterative solver.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Overrides the Krylov basis size, `min(2k, n)` by default.
    pub fn with_subspace_size(mut self, subspace_size: usize) -> Self {
        self.subspace_size = Some(subspace_size);
        self
    }

    /// Sets the seed of the random start vector.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks the request against a matrix of dimension `dim`.
    ///
    /// # Errors
    /// Returns `InvalidArgument` when `dim == 0`, `rank == 0`, `rank > dim`, the
    /// tolerance is not a positive finite number, or an explicit subspace size
    /// cannot hold the requested rank plus one expansion vector.
    pub fn validate(&self, dim: usize) -> Result<(), EigenError> {
        if dim == 0 {
            return Err(EigenError::invalid("matrix dimension must be at least 1"));
        }
        if self.rank == 0 {
            return Err(EigenError::invalid("requested rank must be at least 1"));
        }
        if self.rank > dim {
            return Err(EigenError::invalid(format!(
                "requested rank {} exceeds matrix dimension {dim}",
                self.rank
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(EigenError::invalid(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if let Some(size) = self.subspace_size {
            if self.rank < dim && (size <= self.rank || size > dim) {
                return Err(EigenError::invalid(format!(
                    "subspace size {size} must lie in {}..={dim}",
                    self.rank + 1
                )));
            }
        }
        Ok(())
    }

    /// The Krylov subspace size used for a matrix of dimension `dim`.
    ///
    /// Without an override this is `min(2K, N)`, never smaller than `K + 1`
    /// when a strict subset of the spectrum is requested.
    pub fn subspace_size_for(&self, dim: usize) -> usize {
        let size = self
            .subspace_size
            .unwrap_or_else(|| (2 * self.rank).min(dim));
        size.max((self.rank + 1).min(dim)).min(dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = EigenRequest::new(3);
        assert_eq!(request.rank, 3);
        assert_eq!(request.tolerance, 1e-10);
        assert_eq!(request.max_iterations, 1000);
        assert_eq!(request.subspace_size, None);
    }

    #[test]
    fn test_subspace_size_doubles_rank_capped_at_dim() {
        assert_eq!(EigenRequest::new(3).subspace_size_for(100), 6);
        assert_eq!(EigenRequest::new(3).subspace_size_for(5), 5);
        assert_eq!(EigenRequest::new(1).subspace_size_for(10), 2);
        assert_eq!(
            EigenRequest::new(3).with_subspace_size(12).subspace_size_for(100),
            12
        );
    }

    #[test]
    fn test_validate_rank_bounds() {
        assert!(EigenRequest::new(0).validate(4).is_err());
        assert!(EigenRequest::new(5).validate(4).is_err());
        assert!(EigenRequest::new(1).validate(0).is_err());
        assert!(EigenRequest::new(4).validate(4).is_ok());
        assert!(EigenRequest::new(1).validate(1).is_ok());
    }

    #[test]
    fn test_validate_tolerance() {
        assert!(EigenRequest::new(1).with_tolerance(0.0).validate(4).is_err());
        assert!(EigenRequest::new(1).with_tolerance(-1e-3).validate(4).is_err());
        assert!(
            EigenRequest::new(1)
                .with_tolerance(f64::NAN)
                .validate(4)
                .is_err()
        );
    }

    #[test]
    fn test_validate_subspace_size() {
        assert!(EigenRequest::new(2).with_subspace_size(2).validate(10).is_err());
        assert!(EigenRequest::new(2).with_subspace_size(11).validate(10).is_err());
        assert!(EigenRequest::new(2).with_subspace_size(3).validate(10).is_ok());
        // Irrelevant when the full spectrum is requested.
        assert!(EigenRequest::new(4).with_subspace_size(1).validate(4).is_ok());
    }
}
