//! Vector kernels shared by the iterative solvers
//!
//! Inner products, norms and residuals used by CG and by the Schwarz sweeps.

use crate::traits::{LinearOperator, RealField};
use ndarray::Array1;

/// Compute inner product (x, y) = Σ x_i * y_i
#[inline]
pub fn inner_product<T: RealField>(x: &Array1<T>, y: &Array1<T>) -> T {
    assert_eq!(
        x.len(),
        y.len(),
        "Vector lengths must match for inner product"
    );
    let mut sum = T::zero();
    for (xi, yi) in x.iter().zip(y.iter()) {
        sum += *xi * *yi;
    }
    sum
}

/// Compute vector 2-norm: ||x||_2 = sqrt(Σ x_i^2)
#[inline]
pub fn vector_norm<T: RealField>(x: &Array1<T>) -> T {
    vector_norm_sqr(x).sqrt()
}

/// Compute vector norm squared: ||x||_2^2 = Σ x_i^2
#[inline]
pub fn vector_norm_sqr<T: RealField>(x: &Array1<T>) -> T {
    x.iter().fold(T::zero(), |acc, &xi| acc + xi * xi)
}

/// Compute axpy: y = α * x + y
#[inline]
pub fn axpy<T: RealField>(alpha: T, x: &Array1<T>, y: &mut Array1<T>) {
    for (xi, yi) in x.iter().zip(y.iter_mut()) {
        *yi += alpha * *xi;
    }
}

/// Residual of a linear system: r = b - A * x
pub fn residual<T, A>(operator: &A, b: &Array1<T>, x: &Array1<T>) -> Array1<T>
where
    T: RealField,
    A: LinearOperator<T> + ?Sized,
{
    let ax = operator.apply(x);
    b - &ax
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_inner_product_and_norm() {
        let x = array![3.0_f64, 4.0];
        let y = array![1.0_f64, 2.0];
        assert_relative_eq!(inner_product(&x, &y), 11.0);
        assert_relative_eq!(vector_norm(&x), 5.0);
        assert_relative_eq!(vector_norm_sqr(&x), 25.0);
    }

    #[test]
    fn test_axpy() {
        let x = array![1.0_f64, 2.0];
        let mut y = array![10.0_f64, 20.0];
        axpy(0.5, &x, &mut y);
        assert_relative_eq!(y[0], 10.5);
        assert_relative_eq!(y[1], 21.0);
    }

    #[test]
    fn test_residual() {
        let a = array![[2.0_f64, 0.0], [0.0, 4.0]];
        let b = array![2.0_f64, 4.0];
        let x = array![1.0_f64, 0.5];
        let r = residual(&a, &b, &x);
        assert_relative_eq!(r[0], 0.0);
        assert_relative_eq!(r[1], 2.0);
    }
}
