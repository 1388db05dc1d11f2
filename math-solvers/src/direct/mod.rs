//! Direct solvers for linear systems
//!
//! This module provides direct (non-iterative) solvers:
//! - [`lu_solve`]: LU decomposition with partial pivoting
//! - [`cholesky_factorize`]: Cholesky for symmetric positive definite systems

mod cholesky;
mod lu;

pub use cholesky::{CholeskyError, CholeskyFactorization, cholesky_factorize};
pub use lu::{LuError, LuFactorization, lu_factorize, lu_solve};

#[cfg(feature = "ndarray-linalg")]
pub use lu::{LapackLuFactorization, lapack_lu_factorize};
