//! This module defines the custom error types for the library.
//!
//! Every failure a solve can produce is collected into a single enum,
//! [`EigenErrorKind`], and surfaced through the opaque [`EigenError`] wrapper.
//! The three kinds mirror the three ways a solve can end without a result:
//! the arguments were rejected up-front, the iterative path ran out of budget,
//! or the dense decomposition itself broke down.
//!
//! Note that [`faer::linalg::evd::EvdError`] does not implement the standard
//! [`std::error::Error`] trait, so it is folded into the string payload of the
//! relevant kind rather than wrapped with `#[from]`.
use thiserror::Error;

/// Represents all possible errors that can occur while computing eigenpairs.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct EigenError(#[from] EigenErrorKind);

/// The distinct kinds of errors reported by the solvers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EigenErrorKind {
    /// The request or the buffers were rejected before any computation started.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The iterative solver stopped with fewer converged eigenpairs than requested,
    /// either because the restart budget ran out or because the projected problem
    /// became numerically unusable.
    #[error(
        "Iterative solver did not converge: {converged} of {requested} requested eigenpairs converged."
    )]
    ConvergenceFailed { converged: usize, requested: usize },

    /// The dense eigendecomposition failed. This only happens for degenerate input,
    /// e.g. a matrix with non-finite entries.
    #[error("Dense eigendecomposition failed: {0}")]
    ComputationFailed(String),
}

impl EigenError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> &EigenErrorKind {
        &self.0
    }

    /// Returns `true` when the error is a recoverable shortfall of the iterative path.
    pub fn is_convergence_failure(&self) -> bool {
        matches!(self.0, EigenErrorKind::ConvergenceFailed { .. })
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        EigenErrorKind::InvalidArgument(message.into()).into()
    }

    pub(crate) fn computation(message: impl Into<String>) -> Self {
        EigenErrorKind::ComputationFailed(message.into()).into()
    }

    pub(crate) fn convergence(converged: usize, requested: usize) -> Self {
        EigenErrorKind::ConvergenceFailed {
            converged,
            requested,
        }
        .into()
    }
}

// Compare through the inner kind.
impl PartialEq for EigenError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_message() {
        let error = EigenError::invalid("requested rank 0 must be at least 1");
        assert_eq!(
            error.to_string(),
            "Invalid argument: requested rank 0 must be at least 1"
        );
        assert!(!error.is_convergence_failure());
    }

    #[test]
    fn test_convergence_failed_message() {
        let error = EigenError::convergence(2, 5);
        assert_eq!(
            error.to_string(),
            "Iterative solver did not converge: 2 of 5 requested eigenpairs converged."
        );
        assert!(error.is_convergence_failure());
        assert_eq!(
            error.kind(),
            &EigenErrorKind::ConvergenceFailed {
                converged: 2,
                requested: 5
            }
        );
    }

    #[test]
    fn test_computation_failed_message() {
        let evd_error = faer::linalg::evd::EvdError::NoConvergence;
        let error = EigenError::computation(format!("{evd_error:?}"));
        assert_eq!(
            error.to_string(),
            "Dense eigendecomposition failed: NoConvergence"
        );
    }

    #[test]
    fn test_errors_compare_by_kind() {
        assert_eq!(EigenError::convergence(1, 3), EigenError::convergence(1, 3));
        assert_ne!(EigenError::convergence(1, 3), EigenError::convergence(2, 3));
    }
}
