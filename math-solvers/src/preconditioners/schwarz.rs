//! Symmetric multiplicative Schwarz preconditioner
//!
//! Applies one forward sweep followed by one backward sweep over the regions
//! to `A z = r`, starting from `z = 0`. With exact local solves and a
//! symmetric positive definite `A` the resulting operator is symmetric, so it
//! can precondition CG.
//!
//! # Algorithm
//!
//! 1. Factorize every local matrix once (done by [`MultiplicativeSchwarz::new`])
//! 2. For each preconditioner apply:
//!    - Forward sweep over regions `0..K`
//!    - Backward sweep over regions `K..0`
//!
//! The sweeps are sequential: every region sees the corrections made by the
//! regions before it.

use crate::domain_decomposition::{
    LocalSolverKind, MultiplicativeSchwarz, Result, SchwarzError, Subdomain,
};
use crate::sparse::CsrMatrix;
use crate::traits::{Preconditioner, RealField};
use ndarray::Array1;

/// Symmetric multiplicative Schwarz preconditioner over a fixed decomposition
#[derive(Debug)]
pub struct SymmetricSchwarzPreconditioner<'a, T: RealField> {
    schwarz: MultiplicativeSchwarz<'a, T>,
}

impl<'a, T: RealField> SymmetricSchwarzPreconditioner<'a, T> {
    /// Validate the decomposition and factorize the local matrices
    pub fn new(
        matrix: &'a CsrMatrix<T>,
        subdomains: &'a [Subdomain<T>],
        local_solver: LocalSolverKind,
    ) -> Result<Self> {
        Ok(Self::from_solver(MultiplicativeSchwarz::new(
            matrix,
            subdomains,
            local_solver,
        )?))
    }

    pub fn from_solver(schwarz: MultiplicativeSchwarz<'a, T>) -> Self {
        Self { schwarz }
    }

    /// `z = M^{-1} r`, reporting shape or local solve failures
    pub fn try_apply(&self, r: &Array1<T>) -> Result<Array1<T>> {
        let zero = Array1::from_elem(self.schwarz.global_size(), T::zero());
        let z = self.schwarz.sweep(r, zero)?;
        self.schwarz.backward_sweep(r, z)
    }

    /// Get statistics about the domain decomposition
    pub fn stats(&self) -> (usize, usize, usize, f64) {
        self.schwarz.stats()
    }
}

impl<T: RealField> Preconditioner<T> for SymmetricSchwarzPreconditioner<'_, T> {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        match self.try_apply(r) {
            Ok(z) => z,
            Err(err @ SchwarzError::Dimension { .. }) => {
                panic!("Schwarz preconditioner applied to a mismatched vector: {err}")
            }
            Err(err) => {
                log::error!("Schwarz preconditioner failed, using identity: {err}");
                r.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_decomposition::test_support::grid_laplacian;
    use crate::domain_decomposition::{Region, build_subdomains};
    use crate::iterative::{CgConfig, cg, cg_preconditioned};
    use crate::traits::LinearOperator;
    use approx::assert_relative_eq;

    fn row_bands(nx: usize, rows_per_band: usize, bands: usize) -> Vec<Region> {
        (0..bands)
            .map(|b| {
                let start = b * rows_per_band * nx;
                let end = start + rows_per_band * nx;
                Region::new(format!("region-{b}"), (start..end).collect()).expect("region")
            })
            .collect()
    }

    #[test]
    fn test_single_region_preconditioner_is_exact_inverse() {
        let a = grid_laplacian(4, 4);
        let subdomains = build_subdomains(&a, &row_bands(4, 4, 1)).expect("subdomains");
        let precond =
            SymmetricSchwarzPreconditioner::new(&a, &subdomains, LocalSolverKind::Lu).expect("new");

        let r = Array1::from_iter((0..16).map(|i| i as f64));
        let z = precond.apply(&r);
        let az = a.apply(&z);
        for i in 0..16 {
            assert_relative_eq!(az[i], r[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_preconditioner_is_symmetric() {
        let a = grid_laplacian(4, 4);
        let subdomains = build_subdomains(&a, &row_bands(4, 2, 2)).expect("subdomains");
        let precond =
            SymmetricSchwarzPreconditioner::new(&a, &subdomains, LocalSolverKind::Cholesky)
                .expect("new");

        let u = Array1::from_iter((0..16).map(|i| ((i * 7) % 5) as f64 - 2.0));
        let v = Array1::from_iter((0..16).map(|i| ((i * 3) % 4) as f64 + 0.5));
        let mu = precond.apply(&u);
        let mv = precond.apply(&v);
        assert_relative_eq!(v.dot(&mu), u.dot(&mv), epsilon = 1e-10);
    }

    #[test]
    fn test_preconditioned_cg_needs_fewer_iterations() {
        let a = grid_laplacian(8, 8);
        let b = Array1::from_elem(64, 1.0);
        let subdomains = build_subdomains(&a, &row_bands(8, 2, 4)).expect("subdomains");
        let precond =
            SymmetricSchwarzPreconditioner::new(&a, &subdomains, LocalSolverKind::Lu).expect("new");
        assert_eq!(precond.stats(), (4, 16, 16, 16.0));

        let config = CgConfig {
            max_iterations: 200,
            tolerance: 1e-10,
            print_interval: 0,
        };
        let plain = cg(&a, &b, &config);
        let preconditioned = cg_preconditioned(&a, &precond, &b, &config);

        assert!(plain.converged);
        assert!(preconditioned.converged);
        assert!(
            preconditioned.iterations < plain.iterations,
            "preconditioned {} vs plain {}",
            preconditioned.iterations,
            plain.iterations
        );
        for i in 0..64 {
            assert_relative_eq!(preconditioned.x[i], plain.x[i], epsilon = 1e-7);
        }
    }

    #[test]
    fn test_try_apply_reports_dimension_error() {
        let a = grid_laplacian(4, 4);
        let subdomains = build_subdomains(&a, &row_bands(4, 2, 2)).expect("subdomains");
        let precond =
            SymmetricSchwarzPreconditioner::new(&a, &subdomains, LocalSolverKind::Lu).expect("new");
        assert!(
            precond
                .try_apply(&Array1::zeros(3))
                .unwrap_err()
                .is_dimension_error()
        );
    }
}
