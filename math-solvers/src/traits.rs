//! Core traits for linear algebra operations
//!
//! This module defines the fundamental abstractions used throughout the solver library:
//! - [`RealField`]: Trait for the real scalar types the solvers work with
//! - [`LinearOperator`]: Trait for matrix-like objects that can perform matrix-vector products
//! - [`Preconditioner`]: Trait for preconditioning operations

use ndarray::{Array1, Array2};
use num_traits::{Float, FromPrimitive, NumAssign, ToPrimitive};
use std::fmt::Debug;

/// Trait for real scalar types that can be used in linear algebra operations.
///
/// Diffusion problems are real symmetric, so the solvers are generic over
/// `f64` and `f32` only.
pub trait RealField:
    Float + NumAssign + FromPrimitive + ToPrimitive + Send + Sync + Debug + 'static
{
    /// Convert from an `f64` constant
    fn from_f64_lossy(value: f64) -> Self;

    /// Dense solve through LAPACK (`gesv`)
    #[cfg(feature = "ndarray-linalg")]
    fn lapack_solve(a: &Array2<Self>, b: &Array1<Self>) -> Option<Array1<Self>>;

    /// LU factors produced by LAPACK `getrf`
    #[cfg(feature = "ndarray-linalg")]
    type LapackLu: Clone + Send + Sync;

    /// Factorize through LAPACK (`getrf`)
    #[cfg(feature = "ndarray-linalg")]
    fn lapack_factorize(a: &Array2<Self>) -> Option<Self::LapackLu>;

    /// Solve with LAPACK factors (`getrs`)
    #[cfg(feature = "ndarray-linalg")]
    fn lapack_lu_solve(lu: &Self::LapackLu, b: &Array1<Self>) -> Option<Array1<Self>>;

    /// Relative pivot threshold below which a dense factorization is declared singular
    fn pivot_tolerance(n: usize, scale: Self) -> Self {
        let n = Self::from_usize(n.max(1)).unwrap_or_else(Self::one);
        Self::epsilon() * n * scale
    }
}

impl RealField for f64 {
    #[inline]
    fn from_f64_lossy(value: f64) -> Self {
        value
    }

    #[cfg(feature = "ndarray-linalg")]
    fn lapack_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
        use ndarray_linalg::Solve;
        a.solve(b).ok()
    }

    #[cfg(feature = "ndarray-linalg")]
    type LapackLu = ndarray_linalg::LUFactorized<ndarray::OwnedRepr<f64>>;

    #[cfg(feature = "ndarray-linalg")]
    fn lapack_factorize(a: &Array2<f64>) -> Option<Self::LapackLu> {
        use ndarray_linalg::Factorize;
        a.factorize().ok()
    }

    #[cfg(feature = "ndarray-linalg")]
    fn lapack_lu_solve(lu: &Self::LapackLu, b: &Array1<f64>) -> Option<Array1<f64>> {
        use ndarray_linalg::Solve;
        lu.solve(b).ok()
    }
}

impl RealField for f32 {
    #[inline]
    fn from_f64_lossy(value: f64) -> Self {
        value as f32
    }

    #[cfg(feature = "ndarray-linalg")]
    fn lapack_solve(a: &Array2<f32>, b: &Array1<f32>) -> Option<Array1<f32>> {
        use ndarray_linalg::Solve;
        a.solve(b).ok()
    }

    #[cfg(feature = "ndarray-linalg")]
    type LapackLu = ndarray_linalg::LUFactorized<ndarray::OwnedRepr<f32>>;

    #[cfg(feature = "ndarray-linalg")]
    fn lapack_factorize(a: &Array2<f32>) -> Option<Self::LapackLu> {
        use ndarray_linalg::Factorize;
        a.factorize().ok()
    }

    #[cfg(feature = "ndarray-linalg")]
    fn lapack_lu_solve(lu: &Self::LapackLu, b: &Array1<f32>) -> Option<Array1<f32>> {
        use ndarray_linalg::Solve;
        lu.solve(b).ok()
    }
}

/// Trait for linear operators (matrices) that can perform matrix-vector products.
///
/// This abstraction allows solvers to work with sparse matrices, restriction
/// operators and dense local matrices interchangeably.
pub trait LinearOperator<T: RealField>: Send + Sync {
    /// Number of rows in the operator
    fn num_rows(&self) -> usize;

    /// Number of columns in the operator
    fn num_cols(&self) -> usize;

    /// Apply the operator: y = A * x
    fn apply(&self, x: &Array1<T>) -> Array1<T>;

    /// Apply the transpose: y = A^T * x
    fn apply_transpose(&self, x: &Array1<T>) -> Array1<T>;

    /// Check if the operator is square
    fn is_square(&self) -> bool {
        self.num_rows() == self.num_cols()
    }
}

impl<T: RealField> LinearOperator<T> for Array2<T> {
    fn num_rows(&self) -> usize {
        self.nrows()
    }

    fn num_cols(&self) -> usize {
        self.ncols()
    }

    fn apply(&self, x: &Array1<T>) -> Array1<T> {
        self.dot(x)
    }

    fn apply_transpose(&self, x: &Array1<T>) -> Array1<T> {
        self.t().dot(x)
    }
}

/// Trait for preconditioners used in iterative solvers.
///
/// A preconditioner M approximates A^(-1), so that M*A is better conditioned
/// than A alone. This accelerates convergence of iterative methods.
pub trait Preconditioner<T: RealField>: Send + Sync {
    /// Apply the preconditioner: y = M * r
    ///
    /// This should approximate solving A * y = r
    fn apply(&self, r: &Array1<T>) -> Array1<T>;
}

/// Identity preconditioner (no preconditioning)
#[derive(Clone, Debug, Default)]
pub struct IdentityPreconditioner;

impl<T: RealField> Preconditioner<T> for IdentityPreconditioner {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        r.clone()
    }
}
