//! Thick-restart Lanczos for the largest eigenpairs of a symmetric operator.
//!
//! The solver keeps an orthonormal basis `V` of at most `m` vectors together with
//! its image `A V`. Each restart cycle
//!
//! 1. extends `V` to `m` columns with the Lanczos recurrence, reorthogonalizing every
//!    new direction against the whole basis (two passes of classical Gram-Schmidt),
//! 2. forms the projected matrix `H = V^T A V` and solves it densely,
//! 3. builds the `k` wanted Ritz pairs `(theta_i, x_i = V s_i)` and measures their
//!    residuals `||A x_i - theta_i x_i||`,
//! 4. stops if all `k` pairs are converged, otherwise keeps the `k` Ritz vectors as
//!    the head of the next basis and continues from the residual direction.
//!
//! Because `H` is formed explicitly from the stored images instead of being read off
//! the recurrence coefficients, the restarted basis does not need to preserve the
//! tridiagonal structure of the plain Lanczos process. The matrix is only touched
//! through [`LinOp::apply`], one column at a time.
//!
//! A process started from a single vector sees only one direction of a repeated
//! eigenvalue, so it can converge to the next distinct eigenvalue instead of a second
//! copy. Converged pairs are therefore confirmed by a second search for the largest
//! eigenvalue of `A` restricted to the orthogonal complement of the `k` Ritz vectors.
//! If that eigenvalue exceeds `theta_k`, a copy was missed and the solver reports
//! `ConvergenceFailed`.
//!
//! Memory usage is O(nm) for `V` and `A V` plus O(m^2) for the projected problem.

use super::{EigenPairs, Strategy, StrategyKind, breakdown_tolerance};
use crate::{error::EigenError, matrix::SymmetricMatrix, request::EigenRequest};
use faer::{
    Accum, Mat, MatRef, Par, Side, dyn_stack::MemStack, linalg::matmul::matmul,
    matrix_free::LinOp, prelude::*,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Smallest basis used by the complement search.
const MIN_COMPLEMENT_SUBSPACE: usize = 8;

/// Computes the `k` algebraically largest eigenpairs by thick-restart Lanczos.
///
/// Must only be used for a strict subset of the spectrum (`k < n`).
#[derive(Debug, Clone, Copy, Default)]
pub struct IterativePartialSolver;

impl IterativePartialSolver {
    /// Runs the restarted Lanczos process on a matrix-free operator.
    ///
    /// # Arguments
    /// * `operator`: A symmetric linear operator implementing [`faer::matrix_free::LinOp`].
    /// * `request`: Rank, tolerance, restart budget, subspace size and seed.
    /// * `stack`: Scratch space for one application of `operator` to a single column.
    ///
    /// # Returns
    /// The `k` largest Ritz pairs, eigenvalues in descending order, or
    /// `ConvergenceFailed` carrying how many pairs met the tolerance. The restart
    /// budget applies separately to the main search and to the complement search.
    pub fn compute<O: LinOp<f64>>(
        &self,
        operator: &O,
        request: &EigenRequest,
        stack: &mut MemStack,
    ) -> Result<EigenPairs, EigenError> {
        let n = operator.nrows();
        let k = request.rank;
        if operator.ncols() != n {
            return Err(EigenError::invalid(format!(
                "operator must be square, got {} x {}",
                n,
                operator.ncols()
            )));
        }
        if k == 0 || k >= n {
            return Err(EigenError::invalid(format!(
                "iterative solver requires 1 <= k < n, got k={k}, n={n}"
            )));
        }
        request.validate(n)?;

        let m = request.subspace_size_for(n);
        let mut rng = StdRng::seed_from_u64(request.seed);
        let unlocked = Mat::<f64>::zeros(n, 0);

        let wanted = KrylovSearch {
            operator,
            locked: unlocked.as_ref(),
            rank: k,
            subspace: m,
            tolerance: request.tolerance,
            scale_floor: 0.0,
            max_cycles: request.max_iterations,
        }
        .run(&mut rng, stack, |_, converged| converged >= k)?;

        confirm_top_k(operator, &wanted, request, m, &mut rng, stack)?;

        Ok(EigenPairs {
            values: wanted.values,
            vectors: wanted.vectors,
        })
    }
}

impl Strategy for IterativePartialSolver {
    fn kind(&self) -> StrategyKind {
        StrategyKind::IterativePartial
    }

    fn attempt(
        &self,
        matrix: SymmetricMatrix<'_>,
        request: &EigenRequest,
        stack: &mut MemStack,
    ) -> Result<EigenPairs, EigenError> {
        self.compute(&matrix.as_ref(), request, stack)
    }
}

/// Checks that no eigenvalue outside the span of the wanted Ritz vectors lies above
/// the smallest wanted Ritz value.
///
/// Runs a rank-one search on the complement of `wanted.vectors` until its leading
/// Ritz pair converges or its Ritz value rises above `theta_k`. Ritz values never
/// exceed the largest eigenvalue of the restricted operator, so the latter proves a
/// missed eigenvalue. Ties with `theta_k` within the tolerance are accepted.
fn confirm_top_k<O: LinOp<f64>>(
    operator: &O,
    wanted: &RitzPairs,
    request: &EigenRequest,
    subspace: usize,
    rng: &mut StdRng,
    stack: &mut MemStack,
) -> Result<(), EigenError> {
    let n = operator.nrows();
    let k = wanted.values.len();
    let slack = request.tolerance * wanted.scale;
    let bound = wanted.values[k - 1] + slack;

    let mut best = f64::NEG_INFINITY;
    let outcome = KrylovSearch {
        operator,
        locked: wanted.vectors.as_ref(),
        rank: 1,
        subspace: subspace.max(MIN_COMPLEMENT_SUBSPACE).min(n - k),
        tolerance: request.tolerance,
        scale_floor: wanted.scale,
        max_cycles: request.max_iterations,
    }
    .run(rng, stack, |ritz, converged| {
        best = best.max(ritz.values[0]);
        best > bound || converged >= 1
    });

    match outcome {
        Ok(_) if best <= bound => Ok(()),
        Err(err) if !err.is_convergence_failure() => Err(err),
        _ => {
            // Only the pairs above every value seen in the complement are trusted.
            let trusted = if best.is_finite() {
                wanted.values.iter().filter(|&&v| v > best + slack).count()
            } else {
                0
            };
            log::debug!(
                "Complement search found Ritz value {best:.6e} against theta_k = {:.6e}; {trusted}/{k} pairs confirmed.",
                wanted.values[k - 1]
            );
            Err(EigenError::convergence(trusted, k))
        }
    }
}

/// One restarted Lanczos run, confined to the orthogonal complement of `locked`.
struct KrylovSearch<'a, O> {
    operator: &'a O,
    /// Orthonormal columns the basis is kept orthogonal to. May have no columns.
    locked: MatRef<'a, f64>,
    /// Number of wanted Ritz pairs.
    rank: usize,
    /// Basis size `m`, with `rank <= m`.
    subspace: usize,
    tolerance: f64,
    /// Lower bound for the scale the tolerance is relative to.
    scale_floor: f64,
    max_cycles: usize,
}

impl<O: LinOp<f64>> KrylovSearch<'_, O> {
    /// Restarts until `done` accepts the wanted Ritz pairs of a cycle, given how many
    /// of them are converged.
    ///
    /// Fails with `ConvergenceFailed` when the cycle budget runs out or the basis
    /// cannot be extended.
    fn run(
        &self,
        rng: &mut StdRng,
        stack: &mut MemStack,
        mut done: impl FnMut(&RitzPairs, usize) -> bool,
    ) -> Result<RitzPairs, EigenError> {
        let n = self.operator.nrows();
        let (k, m) = (self.rank, self.subspace);

        // V and A V, filled column by column. Columns past `filled` are stale.
        let mut basis = Mat::<f64>::zeros(n, m);
        let mut images = Mat::<f64>::zeros(n, m);
        let mut filled = 0;
        let mut next = random_vector(rng, n);
        let mut converged = 0;

        for cycle in 0..self.max_cycles {
            // --- EXPANSION ---
            while filled < m {
                let against = [self.locked, basis.as_ref().get(.., 0..filled)];
                if !orthonormalize_into(&mut next, &against) {
                    // The Krylov sequence is trapped in an invariant subspace. Any
                    // direction orthogonal to the basis keeps the projection valid.
                    log::debug!(
                        "Lanczos breakdown at basis size {filled} in cycle {cycle}; injecting a random direction."
                    );
                    next = random_vector(rng, n);
                    if !orthonormalize_into(&mut next, &against) {
                        return Err(EigenError::convergence(converged, k));
                    }
                }

                for (i, &value) in next.iter().enumerate() {
                    basis[(i, filled)] = value;
                }
                self.operator.apply(
                    images.as_mut().get_mut(.., filled..filled + 1),
                    basis.as_ref().get(.., filled..filled + 1),
                    Par::Seq,
                    stack,
                );
                for (i, value) in next.iter_mut().enumerate() {
                    *value = images[(i, filled)];
                }
                filled += 1;
            }

            // --- RAYLEIGH-RITZ ---
            let ritz = rayleigh_ritz(&basis, &images, k, self.locked)?;
            if ritz.values.iter().any(|v| !v.is_finite()) {
                log::debug!("Projected eigenproblem produced non-finite Ritz values.");
                return Err(EigenError::convergence(0, k));
            }

            let threshold = self.tolerance * ritz.scale.max(self.scale_floor);
            converged = ritz
                .residuals
                .iter()
                .filter(|&&r| r <= threshold)
                .count();
            log::debug!(
                "Lanczos cycle {cycle} ({} locked): {converged}/{k} Ritz pairs converged (max residual {:.3e}, threshold {:.3e}).",
                self.locked.ncols(),
                ritz.residuals.iter().cloned().fold(0.0, f64::max),
                threshold
            );

            if done(&ritz, converged) {
                return Ok(ritz);
            }

            // --- THICK RESTART ---
            // The last Krylov direction, stripped of its component in the old basis, is
            // the common residual direction of every Ritz pair.
            let before = norm(&next);
            let after = orthogonalize(&mut next, &[self.locked, basis.as_ref()]);
            if before == 0.0 || after <= breakdown_tolerance() * before {
                next.iter_mut().for_each(|v| *v = 0.0);
            }

            basis.as_mut().get_mut(.., 0..k).copy_from(ritz.vectors.as_ref());
            images
                .as_mut()
                .get_mut(.., 0..k)
                .copy_from(ritz.images.as_ref());
            filled = k;
        }

        Err(EigenError::convergence(converged, k))
    }
}

/// The wanted Ritz pairs of one restart cycle.
struct RitzPairs {
    /// Ritz values, descending.
    values: Vec<f64>,
    /// Ritz vectors `V s_i`, one per column.
    vectors: Mat<f64>,
    /// Their images `A V s_i`.
    images: Mat<f64>,
    /// Residual norms `||A x_i - theta_i x_i||`, measured in the complement of the
    /// locked columns.
    residuals: Vec<f64>,
    /// Spectral scale used to make the tolerance relative.
    scale: f64,
}

/// Solves the projected problem `V^T A V s = theta s` and lifts the `k` largest pairs.
fn rayleigh_ritz(
    basis: &Mat<f64>,
    images: &Mat<f64>,
    k: usize,
    locked: MatRef<'_, f64>,
) -> Result<RitzPairs, EigenError> {
    let n = basis.nrows();
    let m = basis.ncols();

    let mut h = Mat::<f64>::zeros(m, m);
    matmul(
        h.as_mut(),
        Accum::Replace,
        basis.transpose(),
        images.as_ref(),
        1.0,
        Par::Seq,
    );
    // Rounding leaves H slightly asymmetric; the solver only reads one triangle.
    let h = Mat::from_fn(m, m, |i, j| 0.5 * (h[(i, j)] + h[(j, i)]));

    let evd = h
        .as_ref()
        .self_adjoint_eigen(Side::Lower)
        .map_err(|e| {
            log::debug!("Eigendecomposition of the projected matrix failed: {e:?}");
            EigenError::convergence(0, k)
        })?;
    let s = evd.S();
    let u = evd.U();

    // faer sorts ascending, so the wanted pairs are the trailing columns.
    let values: Vec<f64> = (0..k).map(|j| s[m - 1 - j]).collect();
    let scale = (0..m)
        .map(|j| s[j].abs())
        .fold(0.0, f64::max)
        .max(f64::MIN_POSITIVE.sqrt());
    let selector = Mat::from_fn(m, k, |i, j| u[(i, m - 1 - j)]);

    let mut vectors = Mat::<f64>::zeros(n, k);
    let mut lifted_images = Mat::<f64>::zeros(n, k);
    matmul(
        vectors.as_mut(),
        Accum::Replace,
        basis.as_ref(),
        selector.as_ref(),
        1.0,
        Par::Seq,
    );
    matmul(
        lifted_images.as_mut(),
        Accum::Replace,
        images.as_ref(),
        selector.as_ref(),
        1.0,
        Par::Seq,
    );

    let residuals = values
        .iter()
        .enumerate()
        .map(|(j, &theta)| {
            let mut r: Vec<f64> = (0..n)
                .map(|i| lifted_images[(i, j)] - theta * vectors[(i, j)])
                .collect();
            orthogonalize(&mut r, &[locked])
        })
        .collect();

    Ok(RitzPairs {
        values,
        vectors,
        images: lifted_images,
        residuals,
        scale,
    })
}

/// Removes from `w` its components along every column of `blocks`.
///
/// The columns of all blocks together must be orthonormal. Two passes of classical
/// Gram-Schmidt keep the basis orthogonal to working precision. Returns the norm of
/// the result.
fn orthogonalize(w: &mut [f64], blocks: &[MatRef<'_, f64>]) -> f64 {
    for _ in 0..2 {
        for block in blocks {
            for j in 0..block.ncols() {
                let coeff: f64 = w
                    .iter()
                    .enumerate()
                    .map(|(i, &wi)| block[(i, j)] * wi)
                    .sum();
                for (i, wi) in w.iter_mut().enumerate() {
                    *wi -= coeff * block[(i, j)];
                }
            }
        }
    }
    norm(w)
}

/// Orthogonalizes `w` against `blocks` and scales it to unit length.
///
/// Returns `false` if nothing significant is left of `w`, i.e. it lay (numerically)
/// inside the span of the blocks.
fn orthonormalize_into(w: &mut [f64], blocks: &[MatRef<'_, f64>]) -> bool {
    let before = norm(w);
    if before == 0.0 {
        return false;
    }
    let after = orthogonalize(w, blocks);
    if after <= breakdown_tolerance() * before {
        return false;
    }
    w.iter_mut().for_each(|v| *v /= after);
    true
}

fn norm(w: &[f64]) -> f64 {
    w.iter().map(|v| v * v).sum::<f64>().sqrt()
}

fn random_vector(rng: &mut StdRng, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.random::<f64>() - 0.5).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{algorithms::dense::DenseFullSolver, error::EigenErrorKind};
    use faer::dyn_stack::MemBuffer;

    /// `Q diag(eigs) Q^T` with `Q` the Householder reflector of a seeded random vector.
    fn reflected_diagonal(eigs: &[f64], seed: u64) -> Mat<f64> {
        let n = eigs.len();
        let mut rng = StdRng::seed_from_u64(seed);
        let u: Vec<f64> = (0..n).map(|_| rng.random::<f64>() - 0.5).collect();
        let uu: f64 = u.iter().map(|x| x * x).sum();
        let q = Mat::from_fn(n, n, |i, j| {
            let delta = if i == j { 1.0 } else { 0.0 };
            delta - 2.0 * u[i] * u[j] / uu
        });
        let d = Mat::from_fn(n, n, |i, j| if i == j { eigs[i] } else { 0.0 });
        &q * &d * q.transpose()
    }

    fn run(a: &Mat<f64>, request: &EigenRequest) -> Result<EigenPairs, EigenError> {
        let mut mem = MemBuffer::new(a.as_ref().apply_scratch(1, Par::Seq));
        let stack = MemStack::new(&mut mem);
        IterativePartialSolver.compute(&a.as_ref(), request, stack)
    }

    #[test]
    fn test_finds_separated_top_eigenpairs() {
        let mut eigs: Vec<f64> = (0..80).map(|i| 10.0 * i as f64 / 80.0).collect();
        eigs[3] = 100.0;
        eigs[17] = 90.0;
        eigs[42] = 80.0;
        let a = reflected_diagonal(&eigs, 7);

        let pairs = run(&a, &EigenRequest::new(3)).unwrap();

        let expected = [100.0, 90.0, 80.0];
        for (got, want) in pairs.values.iter().zip(expected) {
            assert!((got - want).abs() < 1e-7, "got {got}, want {want}");
        }
        for j in 0..3 {
            let v = pairs.vectors.as_ref().get(.., j..j + 1);
            assert!((v.norm_l2() - 1.0).abs() < 1e-10);
            let residual = (a.as_ref() * v - v * Scale(pairs.values[j])).norm_l2();
            assert!(residual < 1e-6, "residual {residual}");
        }
    }

    #[test]
    fn test_matches_dense_on_random_symmetric_matrix() {
        let n = 40;
        let mut rng = StdRng::seed_from_u64(11);
        let b = Mat::from_fn(n, n, |_, _| rng.random::<f64>());
        let a = &b + b.transpose();

        let pairs = run(&a, &EigenRequest::new(4).with_subspace_size(12)).unwrap();
        let dense = DenseFullSolver
            .compute(SymmetricMatrix::new(a.as_ref()).unwrap())
            .unwrap();

        for j in 0..4 {
            let want = dense.values[n - 1 - j];
            assert!(
                (pairs.values[j] - want).abs() < 1e-8 * want.abs().max(1.0),
                "pair {j}: got {}, want {want}",
                pairs.values[j]
            );
        }
    }

    #[test]
    fn test_never_skips_a_copy_of_a_repeated_eigenvalue() {
        let mut eigs: Vec<f64> = (0..50).map(|i| 8.0 * i as f64 / 50.0).collect();
        eigs[0] = 10.0;
        eigs[1] = 10.0;
        eigs[2] = 9.0;
        let a = reflected_diagonal(&eigs, 4);

        for seed in 0..4 {
            match run(&a, &EigenRequest::new(2).with_seed(seed)) {
                Ok(pairs) => {
                    for value in &pairs.values {
                        assert!((value - 10.0).abs() < 1e-8, "seed {seed}: got {value}");
                    }
                }
                Err(err) => assert!(err.is_convergence_failure(), "seed {seed}: {err}"),
            }
        }
    }

    #[test]
    fn test_accepts_a_tie_at_the_rank_boundary() {
        let a = reflected_diagonal(&[5.0, 5.0, 3.0, 2.0, 1.0, 0.5], 2);
        let pairs = run(&a, &EigenRequest::new(1)).unwrap();
        assert!((pairs.values[0] - 5.0).abs() < 1e-8);
    }

    #[test]
    fn test_zero_matrix_converges_immediately() {
        let a = Mat::<f64>::zeros(10, 10);
        let pairs = run(&a, &EigenRequest::new(2)).unwrap();
        assert_eq!(pairs.values, vec![0.0, 0.0]);
    }

    #[test]
    fn test_reports_shortfall_when_budget_is_exhausted() {
        // A tight cluster of eigenvalues cannot be resolved by one short cycle.
        let eigs: Vec<f64> = (0..200).map(|i| 1.0 + 1e-9 * i as f64).collect();
        let a = reflected_diagonal(&eigs, 3);
        let request = EigenRequest::new(3)
            .with_tolerance(1e-15)
            .with_max_iterations(1);

        let err = run(&a, &request).unwrap_err();
        match err.kind() {
            EigenErrorKind::ConvergenceFailed {
                converged,
                requested,
            } => {
                assert!(*converged < 3);
                assert_eq!(*requested, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_budget_reports_shortfall() {
        let a = reflected_diagonal(&[4.0, 3.0, 2.0, 1.0], 1);
        let err = run(&a, &EigenRequest::new(1).with_max_iterations(0)).unwrap_err();
        assert_eq!(
            err.kind(),
            &EigenErrorKind::ConvergenceFailed {
                converged: 0,
                requested: 1
            }
        );
    }

    #[test]
    fn test_rejects_full_spectrum_request() {
        let a = reflected_diagonal(&[2.0, 1.0], 1);
        let err = run(&a, &EigenRequest::new(2)).unwrap_err();
        assert!(matches!(err.kind(), EigenErrorKind::InvalidArgument(_)));
    }

    #[test]
    fn test_is_deterministic_for_a_fixed_seed() {
        let eigs: Vec<f64> = (0..30).map(|i| (i * i) as f64).collect();
        let a = reflected_diagonal(&eigs, 5);
        let request = EigenRequest::new(2).with_seed(9);
        let first = run(&a, &request).unwrap();
        let second = run(&a, &request).unwrap();
        assert_eq!(first.values, second.values);
        assert_eq!(first.vectors, second.vectors);
    }
}
