//! This module defines the read-only matrix view accepted by the solvers.
//!
//! [`SymmetricMatrix`] is a thin, borrowed wrapper around a faer [`MatRef`]. It
//! only checks what can be checked cheaply: the view is square, non-empty, and,
//! when built from a flat buffer, the buffer holds exactly `n * n` entries.
//! Symmetry itself is the caller's guarantee. The dense solver reads the lower
//! triangle only, and the iterative solver only ever applies the matrix to
//! vectors, so an asymmetric input produces a well-defined but meaningless
//! answer rather than undefined behaviour.

use crate::error::EigenError;
use faer::MatRef;

/// An immutable `n x n` real symmetric matrix borrowed for the duration of a solve.
#[derive(Debug, Clone, Copy)]
pub struct SymmetricMatrix<'a> {
    inner: MatRef<'a, f64>,
}

impl<'a> SymmetricMatrix<'a> {
    /// Wraps an existing faer view.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the view is empty or not square.
    pub fn new(matrix: MatRef<'a, f64>) -> Result<Self, EigenError> {
        if matrix.nrows() != matrix.ncols() {
            return Err(EigenError::invalid(format!(
                "matrix must be square, got {} x {}",
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        if matrix.nrows() == 0 {
            return Err(EigenError::invalid("matrix dimension must be at least 1"));
        }
        Ok(Self { inner: matrix })
    }

    /// Interprets a flat row-major buffer as an `dim x dim` matrix.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if `dim` is zero or the buffer does not hold
    /// exactly `dim * dim` entries.
    pub fn from_row_major(dim: usize, data: &'a [f64]) -> Result<Self, EigenError> {
        if dim == 0 {
            return Err(EigenError::invalid("matrix dimension must be at least 1"));
        }
        let expected = dim.checked_mul(dim).ok_or_else(|| {
            EigenError::invalid(format!("matrix dimension {dim} overflows the buffer size"))
        })?;
        if data.len() != expected {
            return Err(EigenError::invalid(format!(
                "matrix buffer holds {} entries, expected {expected} for dimension {dim}",
                data.len()
            )));
        }
        Self::new(MatRef::from_row_major_slice(data, dim, dim))
    }

    /// The dimension `n` of the matrix.
    #[inline]
    pub fn dim(&self) -> usize {
        self.inner.nrows()
    }

    /// The underlying faer view.
    #[inline]
    pub fn as_ref(&self) -> MatRef<'a, f64> {
        self.inner
    }

    /// Returns `true` if every entry is finite.
    pub fn is_finite(&self) -> bool {
        let n = self.dim();
        (0..n).all(|j| (0..n).all(|i| self.inner[(i, j)].is_finite()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EigenErrorKind;
    use faer::{Mat, mat};

    #[test]
    fn test_from_row_major_maps_rows() {
        let data = [1.0, 2.0, 3.0, 2.0, 5.0, 6.0, 3.0, 6.0, 9.0];
        let matrix = SymmetricMatrix::from_row_major(3, &data).unwrap();
        assert_eq!(matrix.dim(), 3);
        assert_eq!(matrix.as_ref()[(0, 1)], 2.0);
        assert_eq!(matrix.as_ref()[(1, 2)], 6.0);
        assert_eq!(matrix.as_ref()[(2, 0)], 3.0);
    }

    #[test]
    fn test_rejects_wrong_buffer_length() {
        let data = [1.0, 2.0, 3.0];
        let err = SymmetricMatrix::from_row_major(2, &data).unwrap_err();
        assert!(matches!(err.kind(), EigenErrorKind::InvalidArgument(_)));
    }

    #[test]
    fn test_rejects_zero_dimension() {
        let err = SymmetricMatrix::from_row_major(0, &[]).unwrap_err();
        assert!(matches!(err.kind(), EigenErrorKind::InvalidArgument(_)));
    }

    #[test]
    fn test_rejects_non_square_view() {
        let rect: Mat<f64> = Mat::zeros(3, 2);
        let err = SymmetricMatrix::new(rect.as_ref()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument: matrix must be square, got 3 x 2"
        );
    }

    #[test]
    fn test_is_finite() {
        let good: Mat<f64> = mat![[1.0, 0.5], [0.5, 2.0]];
        assert!(SymmetricMatrix::new(good.as_ref()).unwrap().is_finite());

        let bad: Mat<f64> = mat![[1.0, f64::NAN], [f64::NAN, 2.0]];
        assert!(!SymmetricMatrix::new(bad.as_ref()).unwrap().is_finite());
    }
}
