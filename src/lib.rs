//! Top-K eigenpairs of dense real symmetric matrices.
//!
//! This crate computes the `k` largest eigenvalues of a symmetric `n x n` matrix,
//! together with their eigenvectors, in descending eigenvalue order. It is meant for
//! spectral embeddings where only a handful of leading eigenvectors of a similarity
//! or adjacency matrix are needed.
//!
//! Built on the [`faer`] linear algebra framework, the crate composes two strategies
//! behind one [`algorithms::Strategy`] trait:
//!
//! **Iterative partial** ([`algorithms::lanczos::IterativePartialSolver`]): thick-restart
//! Lanczos with full reorthogonalization over a Krylov subspace of size `min(2k, n)`.
//! Only touches the matrix through matrix-vector products, so it is much cheaper than a
//! full decomposition when `k` is small, but it works against a restart budget and may
//! give up.
//!
//! **Dense full** ([`algorithms::dense::DenseFullSolver`]): faer's self-adjoint
//! eigendecomposition in O(n^3). Always succeeds on finite input.
//!
//! The [`EigenSolver`] orchestrator tries the iterative strategy first whenever `k < n`
//! and falls back to the dense one on a convergence shortfall; for `k == n` it goes
//! straight to the dense strategy. Fallbacks are logged through the [`log`] facade and
//! recorded in the [`SolveReport`] of the result, never returned as errors.
//!
//! ## Example Usage
//!
//! ```rust
//! use topk_eigen::{EigenRequest, SymmetricMatrix, solve};
//!
//! // diag(4, 3, 2, 1), row-major.
//! let data = [
//!     4.0, 0.0, 0.0, 0.0,
//!     0.0, 3.0, 0.0, 0.0,
//!     0.0, 0.0, 2.0, 0.0,
//!     0.0, 0.0, 0.0, 1.0,
//! ];
//! let matrix = SymmetricMatrix::from_row_major(4, &data).unwrap();
//! let result = solve(matrix, &EigenRequest::new(2)).unwrap();
//!
//! assert!((result.eigenvalues[0] - 4.0).abs() < 1e-10);
//! assert!((result.eigenvalues[1] - 3.0).abs() < 1e-10);
//! // Eigenvectors are unit norm with a positive largest component.
//! assert!((result.eigenvectors[(0, 0)] - 1.0).abs() < 1e-8);
//! assert!((result.eigenvectors[(1, 1)] - 1.0).abs() < 1e-8);
//! ```
//!
//! The same computation over caller-owned flat buffers:
//!
//! ```rust
//! use topk_eigen::{EigenRequest, solve_into};
//!
//! let data = [2.0, 1.0, 1.0, 2.0];
//! let mut values = [0.0; 1];
//! let mut vectors = [0.0; 2];
//! solve_into(2, &data, &EigenRequest::new(1), &mut values, &mut vectors).unwrap();
//! assert!((values[0] - 3.0).abs() < 1e-10);
//! ```

pub mod algorithms;
pub mod error;
pub mod matrix;
pub mod request;
pub mod result;
pub mod solvers;
pub mod utils;

pub use error::{EigenError, EigenErrorKind};
pub use matrix::SymmetricMatrix;
pub use request::EigenRequest;
pub use result::{AttemptOutcome, AttemptRecord, EigenResult, SolveReport};
pub use solvers::{EigenSolver, solve, solve_into};
