//! Cholesky factorization for symmetric positive definite systems

use crate::traits::RealField;
use ndarray::{Array1, Array2};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CholeskyError {
    #[error("Matrix is not positive definite (pivot {pivot} is not positive)")]
    NotPositiveDefinite { pivot: usize },
    #[error("Matrix dimensions mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Lower-triangular factor `L` with `A = L L^T`
#[derive(Debug, Clone)]
pub struct CholeskyFactorization<T: RealField> {
    pub l: Array2<T>,
    pub n: usize,
}

impl<T: RealField> CholeskyFactorization<T> {
    pub fn solve(&self, b: &Array1<T>) -> Result<Array1<T>, CholeskyError> {
        if b.len() != self.n {
            return Err(CholeskyError::DimensionMismatch {
                expected: self.n,
                got: b.len(),
            });
        }

        let mut y = b.clone();
        for i in 0..self.n {
            for j in 0..i {
                y[i] = y[i] - self.l[[i, j]] * y[j];
            }
            y[i] /= self.l[[i, i]];
        }

        let mut x = y;
        for i in (0..self.n).rev() {
            for j in (i + 1)..self.n {
                x[i] = x[i] - self.l[[j, i]] * x[j];
            }
            x[i] /= self.l[[i, i]];
        }

        Ok(x)
    }
}

/// Factorize a symmetric positive definite matrix. Only the lower triangle is read.
pub fn cholesky_factorize<T: RealField>(
    a: &Array2<T>,
) -> Result<CholeskyFactorization<T>, CholeskyError> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(CholeskyError::DimensionMismatch {
            expected: n,
            got: a.ncols(),
        });
    }

    let scale = a.diag().iter().fold(T::zero(), |acc, v| acc.max(v.abs()));
    let tolerance = T::pivot_tolerance(n, scale);

    let mut l = Array2::from_elem((n, n), T::zero());
    for j in 0..n {
        let mut diag = a[[j, j]];
        for k in 0..j {
            diag -= l[[j, k]] * l[[j, k]];
        }
        if diag <= tolerance {
            return Err(CholeskyError::NotPositiveDefinite { pivot: j });
        }
        let l_jj = diag.sqrt();
        l[[j, j]] = l_jj;

        for i in (j + 1)..n {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = sum / l_jj;
        }
    }

    Ok(CholeskyFactorization { l, n })
}
