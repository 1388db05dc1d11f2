//! LU decomposition solver
//!
//! Provides LU factorization with partial pivoting for solving dense linear systems.
//! With the `ndarray-linalg` feature, one-shot solves go through LAPACK `gesv`
//! and [`LapackLuFactorization`] keeps `getrf` factors for repeated solves.
//! The pure-Rust factorization is the fallback and screens for near-singular
//! pivots.

use crate::traits::RealField;
use ndarray::{Array1, Array2};
use thiserror::Error;

/// Errors that can occur during LU factorization
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LuError {
    #[error("Matrix is singular or nearly singular (zero pivot in column {column})")]
    SingularMatrix { column: usize },
    #[error("Matrix dimensions mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("LAPACK routine {routine} failed")]
    Lapack { routine: &'static str },
}

/// LU factorization result
///
/// Stores L and U factors along with pivot information
#[derive(Debug, Clone)]
pub struct LuFactorization<T: RealField> {
    /// Combined L and U matrices (L is unit lower triangular, stored below diagonal)
    pub lu: Array2<T>,
    /// Row permutation: row `i` of the factorized matrix is row `perm[i]` of the input
    pub perm: Vec<usize>,
    /// Matrix dimension
    pub n: usize,
}

impl<T: RealField> LuFactorization<T> {
    /// Solve Ax = b using the pre-computed LU factorization
    pub fn solve(&self, b: &Array1<T>) -> Result<Array1<T>, LuError> {
        if b.len() != self.n {
            return Err(LuError::DimensionMismatch {
                expected: self.n,
                got: b.len(),
            });
        }

        let mut x = Array1::from_iter(self.perm.iter().map(|&p| b[p]));

        // Forward substitution: Ly = Pb
        for i in 0..self.n {
            for j in 0..i {
                let l_ij = self.lu[[i, j]];
                x[i] = x[i] - l_ij * x[j];
            }
        }

        // Backward substitution: Ux = y
        for i in (0..self.n).rev() {
            for j in (i + 1)..self.n {
                let u_ij = self.lu[[i, j]];
                x[i] = x[i] - u_ij * x[j];
            }
            x[i] /= self.lu[[i, i]];
        }

        Ok(x)
    }
}

/// Compute LU factorization with partial pivoting (pure Rust implementation)
///
/// A pivot is treated as zero when it falls below `n * eps * max|a_ij|`, so
/// rank-deficient matrices are rejected even when rounding leaves a tiny
/// non-zero pivot.
pub fn lu_factorize<T: RealField>(a: &Array2<T>) -> Result<LuFactorization<T>, LuError> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(LuError::DimensionMismatch {
            expected: n,
            got: a.ncols(),
        });
    }

    let scale = a.iter().fold(T::zero(), |acc, v| acc.max(v.abs()));
    let tolerance = T::pivot_tolerance(n, scale);

    let mut lu = a.clone();
    let mut perm: Vec<usize> = (0..n).collect();

    for k in 0..n {
        // Find pivot
        let mut max_val = lu[[k, k]].abs();
        let mut max_row = k;

        for i in (k + 1)..n {
            let val = lu[[i, k]].abs();
            if val > max_val {
                max_val = val;
                max_row = i;
            }
        }

        if max_val <= tolerance {
            return Err(LuError::SingularMatrix { column: k });
        }

        if max_row != k {
            for j in 0..n {
                lu.swap([k, j], [max_row, j]);
            }
            perm.swap(k, max_row);
        }

        // Compute multipliers and eliminate
        let pivot = lu[[k, k]];
        for i in (k + 1)..n {
            let mult = lu[[i, k]] / pivot;
            lu[[i, k]] = mult;

            for j in (k + 1)..n {
                let update = mult * lu[[k, j]];
                lu[[i, j]] -= update;
            }
        }
    }

    Ok(LuFactorization { lu, perm, n })
}

/// LU factors computed by LAPACK, reused across right-hand sides
#[cfg(feature = "ndarray-linalg")]
#[derive(Clone)]
pub struct LapackLuFactorization<T: RealField> {
    factors: T::LapackLu,
    n: usize,
}

#[cfg(feature = "ndarray-linalg")]
impl<T: RealField> std::fmt::Debug for LapackLuFactorization<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LapackLuFactorization")
            .field("n", &self.n)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "ndarray-linalg")]
impl<T: RealField> LapackLuFactorization<T> {
    /// Solve Ax = b with the stored `getrf` factors
    pub fn solve(&self, b: &Array1<T>) -> Result<Array1<T>, LuError> {
        if b.len() != self.n {
            return Err(LuError::DimensionMismatch {
                expected: self.n,
                got: b.len(),
            });
        }
        T::lapack_lu_solve(&self.factors, b).ok_or(LuError::Lapack { routine: "getrs" })
    }
}

/// Factorize through LAPACK after the pure-Rust pivot screen
///
/// `getrf` only fails on exactly zero pivots, so the matrix is first checked
/// with [`lu_factorize`] to reject nearly singular blocks consistently.
#[cfg(feature = "ndarray-linalg")]
pub fn lapack_lu_factorize<T: RealField>(
    a: &Array2<T>,
) -> Result<LapackLuFactorization<T>, LuError> {
    lu_factorize(a)?;
    let factors = T::lapack_factorize(a).ok_or(LuError::Lapack { routine: "getrf" })?;
    Ok(LapackLuFactorization {
        factors,
        n: a.nrows(),
    })
}

/// Solve Ax = b using LU decomposition
///
/// This is a convenience function that combines factorization and solve.
pub fn lu_solve<T: RealField>(a: &Array2<T>, b: &Array1<T>) -> Result<Array1<T>, LuError> {
    #[cfg(feature = "ndarray-linalg")]
    {
        if let Some(x) = T::lapack_solve(a, b) {
            return Ok(x);
        }
    }

    let factorization = lu_factorize(a)?;
    factorization.solve(b)
}
