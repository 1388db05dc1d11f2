//! Multiplicative Schwarz iteration
//!
//! Regions are visited in a fixed order. Each region computes the current
//! global residual, solves its local system exactly and adds the correction
//! to the iterate before the next region runs, so later regions see the
//! corrections of earlier ones within the same sweep:
//!
//! ```text
//! for k in 0..K:
//!     r   = f - A x
//!     d_k = A_k^{-1} R_k r
//!     x   = x + R_k^T d_k
//! ```
//!
//! After every full sweep the iteration stops once `||f - A x||_2 < tolerance`
//! or when the sweep bound is reached.

use super::error::{Result, SchwarzError};
use super::subdomain::{LocalConstraint, LocalSolver, LocalSolverKind, Subdomain};
use crate::blas_helpers::{residual, vector_norm};
use crate::sparse::CsrMatrix;
use crate::traits::RealField;
use ndarray::Array1;

/// Multiplicative Schwarz configuration
#[derive(Debug, Clone)]
pub struct SchwarzConfig<R> {
    /// Maximum number of sweeps
    pub max_sweeps: usize,
    /// Absolute tolerance on the global residual 2-norm
    pub tolerance: R,
    /// Print progress every N sweeps (0 = no output)
    pub print_interval: usize,
    /// Factorization used for the local solves
    pub local_solver: LocalSolverKind,
}

impl Default for SchwarzConfig<f64> {
    fn default() -> Self {
        Self {
            max_sweeps: 50,
            tolerance: 1e-8,
            print_interval: 0,
            local_solver: LocalSolverKind::Lu,
        }
    }
}

/// Iteration state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchwarzState {
    Init,
    Sweeping,
    /// Residual dropped below the tolerance
    Converged,
    /// Sweep bound reached; the caller should inspect the residual
    MaxIterReached,
}

impl SchwarzState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SchwarzState::Converged | SchwarzState::MaxIterReached)
    }
}

/// Multiplicative Schwarz result
#[derive(Debug, Clone)]
pub struct SchwarzSolution<T: RealField> {
    /// Solution vector
    pub x: Array1<T>,
    /// Number of sweeps performed
    pub sweeps: usize,
    /// Final global residual norm
    pub residual: T,
    /// Global residual norm after each sweep
    pub residual_history: Vec<T>,
    /// Terminal state
    pub state: SchwarzState,
}

impl<T: RealField> SchwarzSolution<T> {
    pub fn converged(&self) -> bool {
        self.state == SchwarzState::Converged
    }
}

/// A validated decomposition with factorized local matrices
///
/// The global matrix and the subdomains are borrowed read-only for the
/// lifetime of the solver; only the iterate changes during a solve.
#[derive(Debug)]
pub struct MultiplicativeSchwarz<'a, T: RealField> {
    matrix: &'a CsrMatrix<T>,
    subdomains: &'a [Subdomain<T>],
    factors: Vec<LocalSolver<T>>,
}

impl<'a, T: RealField> MultiplicativeSchwarz<'a, T> {
    /// Check shapes and coverage, then factorize every local matrix
    ///
    /// Every DOF must be corrected by at least one region: a DOF that is an
    /// interface DOF in all regions containing it is a configuration error.
    pub fn new(
        matrix: &'a CsrMatrix<T>,
        subdomains: &'a [Subdomain<T>],
        local_solver: LocalSolverKind,
    ) -> Result<Self> {
        let n = matrix.num_rows;
        if matrix.num_cols != n {
            return Err(SchwarzError::dimension(
                "global matrix columns",
                n,
                matrix.num_cols,
            ));
        }
        if subdomains.is_empty() {
            return Err(SchwarzError::Configuration(
                "at least one subdomain is required".to_string(),
            ));
        }

        let mut covered = vec![false; n];
        let mut corrected = vec![false; n];
        for subdomain in subdomains {
            let restriction = &subdomain.restriction;
            if restriction.global_size() != n {
                return Err(SchwarzError::dimension(
                    format!("restriction of {}", subdomain.name()),
                    n,
                    restriction.global_size(),
                ));
            }
            if subdomain.matrix.size() != restriction.local_size() {
                return Err(SchwarzError::dimension(
                    format!("local matrix of {}", subdomain.name()),
                    restriction.local_size(),
                    subdomain.matrix.size(),
                ));
            }
            let constraints = subdomain.matrix.constraints();
            for (&g, constraint) in restriction.indices().iter().zip(constraints) {
                covered[g] = true;
                if *constraint != LocalConstraint::Interface {
                    corrected[g] = true;
                }
            }
        }
        if let Some(dof) = covered.iter().position(|&c| !c) {
            return Err(SchwarzError::Configuration(format!(
                "DOF {dof} is not covered by any subdomain"
            )));
        }
        // An interface DOF is pinned by its region; some region must solve for it
        if let Some(dof) = corrected.iter().position(|&c| !c) {
            return Err(SchwarzError::Configuration(format!(
                "DOF {dof} lies on the interface of every subdomain holding it; \
                 increase the overlap"
            )));
        }

        let factors = subdomains
            .iter()
            .enumerate()
            .map(|(k, subdomain)| {
                subdomain
                    .matrix
                    .factorize(local_solver)
                    .map_err(|reason| SchwarzError::SubdomainSolve {
                        region: k,
                        name: subdomain.name().to_string(),
                        reason,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Multiplicative Schwarz: {} subdomains over {} DOFs ({:?} local solves)",
            subdomains.len(),
            n,
            local_solver
        );

        Ok(Self {
            matrix,
            subdomains,
            factors,
        })
    }

    pub fn num_subdomains(&self) -> usize {
        self.subdomains.len()
    }

    pub fn global_size(&self) -> usize {
        self.matrix.num_rows
    }

    pub fn subdomains(&self) -> &[Subdomain<T>] {
        self.subdomains
    }

    /// Get statistics about the decomposition
    ///
    /// Returns (num_subdomains, min_size, max_size, avg_size)
    pub fn stats(&self) -> (usize, usize, usize, f64) {
        let sizes: Vec<usize> = self.subdomains.iter().map(Subdomain::size).collect();
        let min_size = sizes.iter().copied().min().unwrap_or(0);
        let max_size = sizes.iter().copied().max().unwrap_or(0);
        let avg_size = sizes.iter().sum::<usize>() as f64 / sizes.len().max(1) as f64;
        (sizes.len(), min_size, max_size, avg_size)
    }

    /// Sweep until the global residual drops below the tolerance
    pub fn solve(
        &self,
        f: &Array1<T>,
        x0: Array1<T>,
        config: &SchwarzConfig<T>,
    ) -> Result<SchwarzSolution<T>> {
        check_config(config)?;
        self.check_vector("load vector", f)?;
        self.check_vector("initial guess", &x0)?;

        let mut state = SchwarzState::Init;
        log::debug!(
            "Schwarz {:?}: initial residual = {:.6e}",
            state,
            vector_norm(&residual(self.matrix, f, &x0))
                .to_f64()
                .unwrap_or(f64::NAN)
        );

        let mut x = x0;
        let mut history = Vec::with_capacity(config.max_sweeps);
        for sweep in 1..=config.max_sweeps {
            state = SchwarzState::Sweeping;
            x = self.sweep(f, x)?;

            let norm = vector_norm(&residual(self.matrix, f, &x));
            history.push(norm);

            if config.print_interval > 0 && sweep % config.print_interval == 0 {
                log::info!(
                    "Schwarz {:?} sweep {}: residual = {:.6e}",
                    state,
                    sweep,
                    norm.to_f64().unwrap_or(f64::NAN)
                );
            }

            if norm < config.tolerance {
                log::info!(
                    "Schwarz converged in {} sweeps: residual = {:.6e}",
                    sweep,
                    norm.to_f64().unwrap_or(f64::NAN)
                );
                return Ok(SchwarzSolution {
                    x,
                    sweeps: sweep,
                    residual: norm,
                    residual_history: history,
                    state: SchwarzState::Converged,
                });
            }
        }

        let final_residual = history.last().copied().unwrap_or_else(T::zero);
        log::warn!(
            "Schwarz stopped after {} sweeps without converging: residual = {:.6e} (tolerance {:.1e})",
            config.max_sweeps,
            final_residual.to_f64().unwrap_or(f64::NAN),
            config.tolerance.to_f64().unwrap_or(f64::NAN)
        );

        Ok(SchwarzSolution {
            x,
            sweeps: config.max_sweeps,
            residual: final_residual,
            residual_history: history,
            state: SchwarzState::MaxIterReached,
        })
    }

    /// One forward sweep over the regions in processing order
    pub fn sweep(&self, f: &Array1<T>, x: Array1<T>) -> Result<Array1<T>> {
        self.check_vector("load vector", f)?;
        self.check_vector("iterate", &x)?;
        (0..self.subdomains.len()).try_fold(x, |x, k| self.correct(k, f, x))
    }

    /// One sweep over the regions in reverse order
    pub(crate) fn backward_sweep(&self, f: &Array1<T>, x: Array1<T>) -> Result<Array1<T>> {
        self.check_vector("load vector", f)?;
        self.check_vector("iterate", &x)?;
        (0..self.subdomains.len())
            .rev()
            .try_fold(x, |x, k| self.correct(k, f, x))
    }

    /// Local correction of region `k`: `x + R_k^T A_k^{-1} R_k (f - A x)`
    pub(crate) fn correct(&self, k: usize, f: &Array1<T>, x: Array1<T>) -> Result<Array1<T>> {
        let subdomain = &self.subdomains[k];
        let r = residual(self.matrix, f, &x);
        let r_k = subdomain
            .matrix
            .local_rhs(subdomain.restriction.restrict(&r)?);

        let delta = self.factors[k]
            .solve(&r_k)
            .map_err(|reason| self.solve_error(k, reason))?;
        if delta.iter().any(|v| !v.is_finite()) {
            return Err(self.solve_error(k, "local correction is not finite".to_string()));
        }

        subdomain.restriction.extend_add(x, &delta)
    }

    fn solve_error(&self, k: usize, reason: String) -> SchwarzError {
        SchwarzError::SubdomainSolve {
            region: k,
            name: self.subdomains[k].name().to_string(),
            reason,
        }
    }

    fn check_vector(&self, context: &str, v: &Array1<T>) -> Result<()> {
        if v.len() != self.matrix.num_rows {
            return Err(SchwarzError::dimension(
                context,
                self.matrix.num_rows,
                v.len(),
            ));
        }
        Ok(())
    }
}

fn check_config<T: RealField>(config: &SchwarzConfig<T>) -> Result<()> {
    if config.max_sweeps == 0 {
        return Err(SchwarzError::Configuration(
            "max_sweeps must be at least 1".to_string(),
        ));
    }
    if !config.tolerance.is_finite() || config.tolerance < T::zero() {
        return Err(SchwarzError::Configuration(format!(
            "tolerance must be finite and non-negative, got {:?}",
            config.tolerance
        )));
    }
    Ok(())
}

/// Solve `A x = f` by multiplicative Schwarz sweeps starting from `x0`
///
/// Shapes, coverage and local factorizations are all checked before the
/// first sweep; on error no iterate is returned.
pub fn multiplicative_schwarz<T: RealField>(
    matrix: &CsrMatrix<T>,
    f: &Array1<T>,
    subdomains: &[Subdomain<T>],
    x0: Array1<T>,
    config: &SchwarzConfig<T>,
) -> Result<SchwarzSolution<T>> {
    MultiplicativeSchwarz::new(matrix, subdomains, config.local_solver)?.solve(f, x0, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direct::lu_solve;
    use crate::domain_decomposition::partition::Region;
    use crate::domain_decomposition::subdomain::{build_subdomains, build_subdomains_from_elements};
    use crate::domain_decomposition::test_support::{ClampedChain, grid_laplacian};
    use approx::assert_relative_eq;
    use ndarray::array;

    fn bands(ranges: &[(usize, usize)]) -> Vec<Region> {
        ranges
            .iter()
            .enumerate()
            .map(|(b, &(start, end))| {
                Region::new(format!("region-{b}"), (start..end).collect()).expect("region")
            })
            .collect()
    }

    fn run(ranges: &[(usize, usize)], config: &SchwarzConfig<f64>) -> SchwarzSolution<f64> {
        let a = grid_laplacian(4, 4);
        let f = Array1::from_elem(16, 1.0);
        let subdomains = build_subdomains(&a, &bands(ranges)).expect("subdomains");
        multiplicative_schwarz(&a, &f, &subdomains, Array1::zeros(16), config).expect("solve")
    }

    #[test]
    fn test_two_row_bands_converge() {
        let solution = run(&[(0, 8), (8, 16)], &SchwarzConfig::default());

        assert!(solution.converged());
        assert_eq!(solution.sweeps, 16);
        assert!(solution.residual < 1e-8);
        assert_eq!(solution.residual_history.len(), solution.sweeps);

        let a = grid_laplacian(4, 4);
        let exact = lu_solve(&a.to_dense(), &Array1::from_elem(16, 1.0)).expect("direct");
        for i in 0..16 {
            assert_relative_eq!(solution.x[i], exact[i], epsilon = 1e-8);
        }
        assert_relative_eq!(solution.x[0], 5.0 / 6.0, epsilon = 1e-8);
    }

    #[test]
    fn test_residual_is_non_increasing() {
        let solution = run(&[(0, 8), (8, 16)], &SchwarzConfig::default());
        for pair in solution.residual_history.windows(2) {
            assert!(pair[1] <= pair[0], "residual grew: {:?}", pair);
        }
    }

    #[test]
    fn test_single_region_is_exact_in_one_sweep() {
        let solution = run(&[(0, 16)], &SchwarzConfig::default());
        assert!(solution.converged());
        assert_eq!(solution.sweeps, 1);

        let a = grid_laplacian(4, 4);
        let exact = lu_solve(&a.to_dense(), &Array1::from_elem(16, 1.0)).expect("direct");
        for i in 0..16 {
            assert_relative_eq!(solution.x[i], exact[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let config = SchwarzConfig::default();
        let first = run(&[(0, 8), (8, 16)], &config);
        let second = run(&[(0, 8), (8, 16)], &config);
        assert_eq!(first.sweeps, second.sweeps);
        assert_eq!(first.x, second.x);
        assert_eq!(first.residual_history, second.residual_history);
    }

    #[test]
    fn test_overlap_reduces_sweeps() {
        let config = SchwarzConfig::default();
        let plain = run(&[(0, 8), (8, 16)], &config);
        let overlapping = run(&[(0, 12), (4, 16)], &config);
        assert!(overlapping.converged());
        assert!(overlapping.sweeps < plain.sweeps);
    }

    #[test]
    fn test_cholesky_local_solves_match_lu() {
        let lu = run(&[(0, 8), (8, 16)], &SchwarzConfig::default());
        let cholesky = run(
            &[(0, 8), (8, 16)],
            &SchwarzConfig {
                local_solver: LocalSolverKind::Cholesky,
                ..SchwarzConfig::default()
            },
        );
        assert_eq!(lu.sweeps, cholesky.sweeps);
        for i in 0..16 {
            assert_relative_eq!(lu.x[i], cholesky.x[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_sweep_bound_reports_max_iter() {
        let config = SchwarzConfig {
            max_sweeps: 1,
            ..SchwarzConfig::default()
        };
        let solution = run(&[(0, 8), (8, 16)], &config);
        assert_eq!(solution.state, SchwarzState::MaxIterReached);
        assert!(solution.state.is_terminal());
        assert!(!solution.converged());
        assert_eq!(solution.sweeps, 1);
        assert_eq!(solution.residual_history, vec![solution.residual]);
        assert!(solution.residual > 1e-8);
    }

    #[test]
    fn test_singular_region_is_named() {
        // Pure Neumann chain: the full block is rank deficient
        let a = CsrMatrix::from_dense(
            &array![[1.0, -1.0, 0.0], [-1.0, 2.0, -1.0], [0.0, -1.0, 1.0]],
            0.0,
        );
        let regions = vec![
            Region::new("corner", vec![0]).expect("corner"),
            Region::new("whole", vec![0, 1, 2]).expect("whole"),
        ];
        let subdomains = build_subdomains(&a, &regions).expect("subdomains");
        let f = array![1.0, 0.0, -1.0];

        let err = multiplicative_schwarz(
            &a,
            &f,
            &subdomains,
            Array1::zeros(3),
            &SchwarzConfig::default(),
        )
        .unwrap_err();

        assert_eq!(err.failed_region(), Some(1));
        match err {
            SchwarzError::SubdomainSolve { name, .. } => assert_eq!(name, "whole"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_interface_only_dof_is_rejected() {
        let chain = ClampedChain::new(6);
        let a = chain.matrix();
        let regions = vec![
            Region::new("left", vec![0, 1, 2]).expect("left"),
            Region::new("right", vec![3, 4, 5]).expect("right"),
        ];
        let subdomains = build_subdomains_from_elements(&chain, &regions).expect("subdomains");

        // Element [2, 3] belongs to neither region, so DOFs 2 and 3 are never solved for
        let err = MultiplicativeSchwarz::new(&a, &subdomains, LocalSolverKind::Lu).unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("DOF 2"), "{err}");
    }

    #[test]
    fn test_overlapping_element_owned_regions_converge() {
        let chain = ClampedChain::new(6);
        let a = chain.matrix();
        let regions = vec![
            Region::new("left", vec![0, 1, 2, 3]).expect("left"),
            Region::new("right", vec![2, 3, 4, 5]).expect("right"),
        ];
        let subdomains = build_subdomains_from_elements(&chain, &regions).expect("subdomains");
        let f = array![0.0, 1.0, 1.0, 1.0, 1.0, 0.0];

        let solution = multiplicative_schwarz(
            &a,
            &f,
            &subdomains,
            Array1::zeros(6),
            &SchwarzConfig::default(),
        )
        .expect("solve");

        assert!(solution.converged());
        let exact = lu_solve(&a.to_dense(), &f).expect("direct");
        for i in 0..6 {
            assert_relative_eq!(solution.x[i], exact[i], epsilon = 1e-8);
        }
    }

    #[test]
    fn test_dimension_errors_before_sweeping() {
        let a = grid_laplacian(4, 4);
        let subdomains = build_subdomains(&a, &bands(&[(0, 8), (8, 16)])).expect("subdomains");
        let solver =
            MultiplicativeSchwarz::new(&a, &subdomains, LocalSolverKind::Lu).expect("solver");
        let config = SchwarzConfig::default();

        let short_f = Array1::from_elem(15, 1.0);
        assert!(
            solver
                .solve(&short_f, Array1::zeros(16), &config)
                .unwrap_err()
                .is_dimension_error()
        );

        let f = Array1::from_elem(16, 1.0);
        assert!(
            solver
                .solve(&f, Array1::zeros(17), &config)
                .unwrap_err()
                .is_dimension_error()
        );

        let other = grid_laplacian(3, 3);
        assert!(
            MultiplicativeSchwarz::new(&other, &subdomains, LocalSolverKind::Lu)
                .unwrap_err()
                .is_dimension_error()
        );
    }

    #[test]
    fn test_configuration_errors() {
        let a = grid_laplacian(4, 4);
        let f = Array1::from_elem(16, 1.0);

        let partial = build_subdomains(&a, &bands(&[(0, 8)])).expect("subdomains");
        assert!(
            multiplicative_schwarz(&a, &f, &partial, Array1::zeros(16), &SchwarzConfig::default())
                .unwrap_err()
                .is_configuration_error()
        );
        assert!(
            MultiplicativeSchwarz::<f64>::new(&a, &[], LocalSolverKind::Lu)
                .unwrap_err()
                .is_configuration_error()
        );

        let subdomains = build_subdomains(&a, &bands(&[(0, 8), (8, 16)])).expect("subdomains");
        for config in [
            SchwarzConfig {
                max_sweeps: 0,
                ..SchwarzConfig::default()
            },
            SchwarzConfig {
                tolerance: -1.0,
                ..SchwarzConfig::default()
            },
            SchwarzConfig {
                tolerance: f64::NAN,
                ..SchwarzConfig::default()
            },
        ] {
            let err = multiplicative_schwarz(&a, &f, &subdomains, Array1::zeros(16), &config)
                .unwrap_err();
            assert!(err.is_configuration_error());
        }
    }

    #[test]
    fn test_stats() {
        let a = grid_laplacian(4, 4);
        let subdomains = build_subdomains(&a, &bands(&[(0, 12), (4, 16)])).expect("subdomains");
        let solver =
            MultiplicativeSchwarz::new(&a, &subdomains, LocalSolverKind::Lu).expect("solver");
        assert_eq!(solver.stats(), (2, 12, 12, 12.0));
        assert_eq!(solver.num_subdomains(), 2);
        assert_eq!(solver.global_size(), 16);
    }
}
