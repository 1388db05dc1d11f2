//! Subdomain (local) systems
//!
//! Two constructions of the local matrix `A_k` are provided:
//!
//! - [`SubdomainAssembly::Sliced`]: `A_k = R_k A R_k^T`, the rows and columns
//!   of the assembled global matrix that belong to the region. Rows of `A`
//!   already hold the full sum over every element touching a DOF, and the
//!   dropped columns amount to a homogeneous Dirichlet condition on the
//!   region's internal boundary, so nothing is counted twice.
//! - [`SubdomainAssembly::ElementOwned`]: `A_k` is reassembled from the
//!   elements whose nodes all lie in the region. Region DOFs touched by an
//!   element that sticks out of the region are interface DOFs; they get an
//!   identity row and column and a zero right-hand side, which pins their
//!   correction to zero. Essential (globally constrained) DOFs get an identity
//!   row too but keep their residual. This variant only converges when
//!   regions overlap, since interface DOFs are never corrected by their own
//!   region.

use super::error::{Result, SchwarzError};
use super::partition::Region;
use super::restriction::RestrictionOperator;
use crate::direct::{CholeskyFactorization, LuFactorization, cholesky_factorize};
#[cfg(feature = "ndarray-linalg")]
use crate::direct::{LapackLuFactorization, lapack_lu_factorize};
#[cfg(not(feature = "ndarray-linalg"))]
use crate::direct::lu_factorize;
use crate::sparse::CsrMatrix;
use crate::traits::RealField;
use ndarray::{Array1, Array2};

/// How local matrices are built from the global problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubdomainAssembly {
    /// Slice the assembled matrix: `R_k A R_k^T`
    #[default]
    Sliced,
    /// Reassemble from elements owned by the region
    ElementOwned,
}

/// Factorization used for the exact local solves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalSolverKind {
    /// LU with partial pivoting; works for any non-singular local matrix
    #[default]
    Lu,
    /// Cholesky; requires symmetric positive definite local matrices
    Cholesky,
}

/// Element-level view of an assembled problem
///
/// Implemented by the finite element assembly so that local matrices can be
/// rebuilt from the elements a region owns.
pub trait ElementContributions<T: RealField> {
    /// Global DOF count
    fn num_dofs(&self) -> usize;

    /// Number of elements
    fn num_elements(&self) -> usize;

    /// Global DOFs of an element, in the order of its element matrix
    fn element_dofs(&self, element: usize) -> &[usize];

    /// Dense element matrix
    fn element_matrix(&self, element: usize) -> &Array2<T>;

    /// Whether a DOF carries an essential (Dirichlet) condition in the global system
    fn is_essential(&self, _dof: usize) -> bool {
        false
    }
}

/// Role of a local DOF in the subdomain system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalConstraint {
    /// Regular unknown
    Free,
    /// Globally constrained DOF (identity row, residual kept)
    Essential,
    /// DOF on the region's internal boundary (identity row, residual zeroed)
    Interface,
}

/// Dense local matrix of one region
#[derive(Debug, Clone)]
pub struct SubdomainMatrix<T: RealField> {
    matrix: Array2<T>,
    constraints: Vec<LocalConstraint>,
}

impl<T: RealField> SubdomainMatrix<T> {
    /// `R A R^T`
    pub fn sliced(global: &CsrMatrix<T>, restriction: &RestrictionOperator) -> Result<Self> {
        check_square(global)?;
        if restriction.global_size() != global.num_rows {
            return Err(SchwarzError::dimension(
                format!("restriction of {}", restriction.name()),
                global.num_rows,
                restriction.global_size(),
            ));
        }

        Ok(Self {
            matrix: global.principal_submatrix(restriction.indices()),
            constraints: vec![LocalConstraint::Free; restriction.local_size()],
        })
    }

    /// Reassemble from the elements lying entirely inside the region
    pub fn element_owned<E>(elements: &E, restriction: &RestrictionOperator) -> Result<Self>
    where
        E: ElementContributions<T> + ?Sized,
    {
        let n = elements.num_dofs();
        if restriction.global_size() != n {
            return Err(SchwarzError::dimension(
                format!("restriction of {}", restriction.name()),
                n,
                restriction.global_size(),
            ));
        }

        let local_n = restriction.local_size();
        let mut global_to_local = vec![usize::MAX; n];
        for (local, &global) in restriction.indices().iter().enumerate() {
            global_to_local[global] = local;
        }

        let mut matrix = Array2::from_elem((local_n, local_n), T::zero());
        let mut constraints = vec![LocalConstraint::Free; local_n];

        for element in 0..elements.num_elements() {
            let dofs = elements.element_dofs(element);
            let k_e = elements.element_matrix(element);
            if k_e.dim() != (dofs.len(), dofs.len()) {
                return Err(SchwarzError::dimension(
                    format!("element matrix {element}"),
                    dofs.len(),
                    k_e.nrows().max(k_e.ncols()),
                ));
            }

            let locals: Vec<usize> = dofs
                .iter()
                .map(|&g| {
                    if g < n {
                        Ok(global_to_local[g])
                    } else {
                        Err(SchwarzError::dimension(
                            format!("DOF {g} of element {element}"),
                            n,
                            g + 1,
                        ))
                    }
                })
                .collect::<Result<_>>()?;

            if locals.iter().all(|&l| l != usize::MAX) {
                for (a, &la) in locals.iter().enumerate() {
                    for (b, &lb) in locals.iter().enumerate() {
                        matrix[[la, lb]] += k_e[[a, b]];
                    }
                }
            } else {
                for &l in locals.iter().filter(|&&l| l != usize::MAX) {
                    constraints[l] = LocalConstraint::Interface;
                }
            }
        }

        for (local, &global) in restriction.indices().iter().enumerate() {
            if elements.is_essential(global) {
                constraints[local] = LocalConstraint::Essential;
            }
        }

        for (local, constraint) in constraints.iter().enumerate() {
            if *constraint != LocalConstraint::Free {
                matrix.row_mut(local).fill(T::zero());
                matrix.column_mut(local).fill(T::zero());
                matrix[[local, local]] = T::one();
            }
        }

        Ok(Self {
            matrix,
            constraints,
        })
    }

    /// Wrap an explicit local matrix; every DOF is free
    pub fn from_dense(matrix: Array2<T>) -> Result<Self> {
        if matrix.nrows() != matrix.ncols() {
            return Err(SchwarzError::dimension(
                "local matrix columns",
                matrix.nrows(),
                matrix.ncols(),
            ));
        }
        let n = matrix.nrows();
        Ok(Self {
            matrix,
            constraints: vec![LocalConstraint::Free; n],
        })
    }

    pub fn size(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn matrix(&self) -> &Array2<T> {
        &self.matrix
    }

    pub fn constraints(&self) -> &[LocalConstraint] {
        &self.constraints
    }

    pub fn num_interface(&self) -> usize {
        self.constraints
            .iter()
            .filter(|&&c| c == LocalConstraint::Interface)
            .count()
    }

    /// Local right-hand side from a restricted residual: interface entries are zeroed
    pub fn local_rhs(&self, mut restricted: Array1<T>) -> Array1<T> {
        for (value, constraint) in restricted.iter_mut().zip(&self.constraints) {
            if *constraint == LocalConstraint::Interface {
                *value = T::zero();
            }
        }
        restricted
    }

    /// Factorize once for repeated exact solves
    pub fn factorize(&self, kind: LocalSolverKind) -> std::result::Result<LocalSolver<T>, String> {
        match kind {
            #[cfg(feature = "ndarray-linalg")]
            LocalSolverKind::Lu => lapack_lu_factorize(&self.matrix)
                .map(LocalSolver::Lapack)
                .map_err(|e| e.to_string()),
            #[cfg(not(feature = "ndarray-linalg"))]
            LocalSolverKind::Lu => lu_factorize(&self.matrix)
                .map(LocalSolver::Lu)
                .map_err(|e| e.to_string()),
            LocalSolverKind::Cholesky => cholesky_factorize(&self.matrix)
                .map(LocalSolver::Cholesky)
                .map_err(|e| e.to_string()),
        }
    }
}

/// Factorized local matrix
#[derive(Debug, Clone)]
pub enum LocalSolver<T: RealField> {
    Lu(LuFactorization<T>),
    #[cfg(feature = "ndarray-linalg")]
    Lapack(LapackLuFactorization<T>),
    Cholesky(CholeskyFactorization<T>),
}

impl<T: RealField> LocalSolver<T> {
    pub fn solve(&self, rhs: &Array1<T>) -> std::result::Result<Array1<T>, String> {
        match self {
            LocalSolver::Lu(lu) => lu.solve(rhs).map_err(|e| e.to_string()),
            #[cfg(feature = "ndarray-linalg")]
            LocalSolver::Lapack(lu) => lu.solve(rhs).map_err(|e| e.to_string()),
            LocalSolver::Cholesky(chol) => chol.solve(rhs).map_err(|e| e.to_string()),
        }
    }
}

/// A region's restriction paired with its local matrix
#[derive(Debug, Clone)]
pub struct Subdomain<T: RealField> {
    pub restriction: RestrictionOperator,
    pub matrix: SubdomainMatrix<T>,
}

impl<T: RealField> Subdomain<T> {
    pub fn new(restriction: RestrictionOperator, matrix: SubdomainMatrix<T>) -> Result<Self> {
        if matrix.size() != restriction.local_size() {
            return Err(SchwarzError::dimension(
                format!("local matrix of {}", restriction.name()),
                restriction.local_size(),
                matrix.size(),
            ));
        }
        Ok(Self {
            restriction,
            matrix,
        })
    }

    pub fn name(&self) -> &str {
        self.restriction.name()
    }

    pub fn size(&self) -> usize {
        self.restriction.local_size()
    }
}

/// Sliced subdomains for every region, in region order
pub fn build_subdomains<T: RealField>(
    global: &CsrMatrix<T>,
    regions: &[Region],
) -> Result<Vec<Subdomain<T>>> {
    check_square(global)?;
    regions
        .iter()
        .map(|region| {
            let restriction = RestrictionOperator::new(global.num_rows, region)?;
            let matrix = SubdomainMatrix::sliced(global, &restriction)?;
            Subdomain::new(restriction, matrix)
        })
        .collect()
}

/// Element-owned subdomains for every region, in region order
pub fn build_subdomains_from_elements<T, E>(
    elements: &E,
    regions: &[Region],
) -> Result<Vec<Subdomain<T>>>
where
    T: RealField,
    E: ElementContributions<T> + ?Sized,
{
    regions
        .iter()
        .map(|region| {
            let restriction = RestrictionOperator::new(elements.num_dofs(), region)?;
            let matrix = SubdomainMatrix::element_owned(elements, &restriction)?;
            Subdomain::new(restriction, matrix)
        })
        .collect()
}

fn check_square<T: RealField>(global: &CsrMatrix<T>) -> Result<()> {
    if global.num_rows != global.num_cols {
        return Err(SchwarzError::dimension(
            "global matrix columns",
            global.num_rows,
            global.num_cols,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    /// 1D P1 chain on 0..=4 with unit elements: element matrix [[1, -1], [-1, 1]]
    struct Chain {
        elements: Vec<[usize; 2]>,
        k_e: Array2<f64>,
        essential: Vec<usize>,
    }

    impl Chain {
        fn new(essential: Vec<usize>) -> Self {
            Self {
                elements: (0..4).map(|e| [e, e + 1]).collect(),
                k_e: array![[1.0, -1.0], [-1.0, 1.0]],
                essential,
            }
        }

        fn assembled(&self) -> CsrMatrix<f64> {
            let mut triplets = Vec::new();
            for dofs in &self.elements {
                for (a, &ga) in dofs.iter().enumerate() {
                    for (b, &gb) in dofs.iter().enumerate() {
                        triplets.push((ga, gb, self.k_e[[a, b]]));
                    }
                }
            }
            CsrMatrix::from_triplets(5, 5, triplets)
        }
    }

    impl ElementContributions<f64> for Chain {
        fn num_dofs(&self) -> usize {
            5
        }

        fn num_elements(&self) -> usize {
            self.elements.len()
        }

        fn element_dofs(&self, element: usize) -> &[usize] {
            &self.elements[element]
        }

        fn element_matrix(&self, _element: usize) -> &Array2<f64> {
            &self.k_e
        }

        fn is_essential(&self, dof: usize) -> bool {
            self.essential.contains(&dof)
        }
    }

    fn restriction(dofs: Vec<usize>) -> RestrictionOperator {
        let region = Region::new("r", dofs).expect("region");
        RestrictionOperator::new(5, &region).expect("restriction")
    }

    #[test]
    fn test_sliced_matches_principal_block() {
        let chain = Chain::new(vec![]);
        let global = chain.assembled();
        let local = SubdomainMatrix::sliced(&global, &restriction(vec![1, 2, 3])).expect("slice");

        assert_eq!(
            local.matrix(),
            &array![[2.0, -1.0, 0.0], [-1.0, 2.0, -1.0], [0.0, -1.0, 2.0]]
        );
        assert_eq!(local.num_interface(), 0);
    }

    #[test]
    fn test_element_owned_marks_interface() {
        let chain = Chain::new(vec![]);
        let local =
            SubdomainMatrix::element_owned(&chain, &restriction(vec![1, 2, 3])).expect("owned");

        // Elements [1,2] and [2,3] are owned; DOFs 1 and 3 touch outside elements
        assert_eq!(
            local.constraints(),
            &[
                LocalConstraint::Interface,
                LocalConstraint::Free,
                LocalConstraint::Interface
            ]
        );
        assert_eq!(
            local.matrix(),
            &array![[1.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 1.0]]
        );

        let rhs = local.local_rhs(array![5.0, 6.0, 7.0]);
        assert_eq!(rhs, array![0.0, 6.0, 0.0]);
    }

    #[test]
    fn test_element_owned_free_block_equals_sliced_block() {
        let chain = Chain::new(vec![]);
        let global = chain.assembled();
        let owned =
            SubdomainMatrix::element_owned(&chain, &restriction(vec![0, 1, 2, 3])).expect("owned");
        let sliced = SubdomainMatrix::sliced(&global, &restriction(vec![0, 1, 2])).expect("slice");

        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(owned.matrix()[[i, j]], sliced.matrix()[[i, j]]);
            }
        }
        assert_eq!(owned.constraints()[3], LocalConstraint::Interface);
    }

    #[test]
    fn test_essential_dofs_keep_residual() {
        let chain = Chain::new(vec![0]);
        let local =
            SubdomainMatrix::element_owned(&chain, &restriction(vec![0, 1, 2])).expect("owned");
        assert_eq!(local.constraints()[0], LocalConstraint::Essential);
        assert_eq!(local.matrix().row(0), array![1.0, 0.0, 0.0]);
        assert_eq!(local.matrix().column(0), array![1.0, 0.0, 0.0]);

        let rhs = local.local_rhs(array![3.0, 1.0, 1.0]);
        assert_eq!(rhs, array![3.0, 1.0, 0.0]);
    }

    #[test]
    fn test_factorize_reports_singular_matrix() {
        let chain = Chain::new(vec![]);
        let global = chain.assembled();
        let whole =
            SubdomainMatrix::sliced(&global, &restriction(vec![0, 1, 2, 3, 4])).expect("slice");

        for kind in [LocalSolverKind::Lu, LocalSolverKind::Cholesky] {
            let reason = whole.factorize(kind).unwrap_err();
            assert!(reason.contains("singular") || reason.contains("positive definite"));
        }
    }

    #[cfg(feature = "ndarray-linalg")]
    #[test]
    fn test_lu_local_solver_uses_lapack() {
        let local = SubdomainMatrix::from_dense(array![[4.0, -1.0], [-1.0, 4.0]]).expect("dense");
        let solver = local.factorize(LocalSolverKind::Lu).expect("lu");
        assert!(matches!(solver, LocalSolver::Lapack(_)));

        let x = solver.solve(&array![3.0, 3.0]).expect("solve");
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_local_solvers_agree() {
        let local = SubdomainMatrix::from_dense(array![[4.0, -1.0], [-1.0, 4.0]]).expect("dense");
        let rhs = array![1.0, 2.0];
        let lu = local
            .factorize(LocalSolverKind::Lu)
            .expect("lu")
            .solve(&rhs)
            .expect("solve");
        let chol = local
            .factorize(LocalSolverKind::Cholesky)
            .expect("cholesky")
            .solve(&rhs)
            .expect("solve");
        for i in 0..2 {
            assert_relative_eq!(lu[i], chol[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_builders_check_dimensions() {
        let chain = Chain::new(vec![]);
        let global = chain.assembled();
        let regions = vec![
            Region::new("left", vec![0, 1, 2]).expect("left"),
            Region::new("right", vec![2, 3, 4]).expect("right"),
        ];

        let sliced = build_subdomains(&global, &regions).expect("sliced");
        assert_eq!(sliced.len(), 2);
        assert_eq!(sliced[1].name(), "right");
        assert_eq!(sliced[1].size(), 3);

        let owned = build_subdomains_from_elements(&chain, &regions).expect("owned");
        assert_eq!(owned[0].matrix.num_interface(), 1);

        let other = Region::new("x", vec![0]).expect("x");
        let wrong = RestrictionOperator::new(3, &other).expect("restriction");
        assert!(
            SubdomainMatrix::sliced(&global, &wrong)
                .unwrap_err()
                .is_dimension_error()
        );

        let rect = CsrMatrix::<f64>::new(5, 4);
        assert!(build_subdomains(&rect, &regions).unwrap_err().is_dimension_error());

        let mismatched = SubdomainMatrix::from_dense(Array2::<f64>::eye(2)).expect("dense");
        assert!(
            Subdomain::new(restriction(vec![0, 1, 2]), mismatched)
                .unwrap_err()
                .is_dimension_error()
        );
    }
}
