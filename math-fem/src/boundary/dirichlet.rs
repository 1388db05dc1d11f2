//! Dirichlet (essential) boundary conditions
//!
//! Implements u = g on boundary nodes by modifying the system matrix and RHS.

use crate::assembly::StiffnessMatrix;
use ndarray::Array1;
use std::collections::{BTreeMap, HashSet};

/// Apply Dirichlet conditions using symmetric row and column elimination
///
/// For each Dirichlet node i with value g_i:
/// - Set A[i, :] = 0 and A[:, i] = 0
/// - Set A[i, i] = 1
/// - Set b[i] = g_i
/// - Modify b[j] -= A[j, i] * g_i for all free j (to preserve symmetry)
///
/// Returns the eliminated matrix; the input triplets are left untouched.
pub fn apply_dirichlet(
    matrix: &StiffnessMatrix,
    rhs: &mut Array1<f64>,
    values: &BTreeMap<usize, f64>,
) -> StiffnessMatrix {
    let n = matrix.dim;

    // First pass: move known column contributions to the RHS
    for k in 0..matrix.nnz() {
        let (row, col) = (matrix.rows[k], matrix.cols[k]);
        if let Some(&g) = values.get(&col) {
            if !values.contains_key(&row) {
                rhs[row] -= matrix.values[k] * g;
            }
        }
    }

    for (&node, &value) in values {
        rhs[node] = value;
    }

    // Rebuild matrix with Dirichlet rows/columns zeroed
    let mut eliminated = StiffnessMatrix::new(n);
    for k in 0..matrix.nnz() {
        let (row, col) = (matrix.rows[k], matrix.cols[k]);
        if !values.contains_key(&row) && !values.contains_key(&col) {
            eliminated.add(row, col, matrix.values[k]);
        }
    }
    for &node in values.keys() {
        eliminated.add(node, node, 1.0);
    }

    eliminated
}

/// Apply homogeneous Dirichlet conditions (u = 0)
pub fn apply_homogeneous_dirichlet(
    matrix: &StiffnessMatrix,
    rhs: &mut Array1<f64>,
    nodes: &[usize],
) -> StiffnessMatrix {
    let unique: HashSet<usize> = nodes.iter().copied().collect();
    let values: BTreeMap<usize, f64> = unique.into_iter().map(|node| (node, 0.0)).collect();
    apply_dirichlet(matrix, rhs, &values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 1D chain 0 - 1 - 2 with unit elements
    fn chain() -> StiffnessMatrix {
        let mut matrix = StiffnessMatrix::new(3);
        for (a, b) in [(0, 1), (1, 2)] {
            matrix.add(a, a, 1.0);
            matrix.add(b, b, 1.0);
            matrix.add(a, b, -1.0);
            matrix.add(b, a, -1.0);
        }
        matrix
    }

    #[test]
    fn test_identity_rows_and_zero_columns() {
        let mut rhs = Array1::from_elem(3, 1.0);
        let csr = apply_homogeneous_dirichlet(&chain(), &mut rhs, &[0, 2, 0]).to_csr();

        assert_relative_eq!(csr.get(0, 0), 1.0);
        assert_relative_eq!(csr.get(0, 1), 0.0);
        assert_relative_eq!(csr.get(1, 0), 0.0);
        assert_relative_eq!(csr.get(1, 1), 2.0);
        assert_relative_eq!(csr.get(2, 2), 1.0);
        assert!(csr.is_symmetric(0.0));
        assert_eq!(rhs.to_vec(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_inhomogeneous_values_move_to_rhs() {
        let mut rhs = Array1::zeros(3);
        let values = BTreeMap::from([(0, 2.0), (2, 4.0)]);
        let csr = apply_dirichlet(&chain(), &mut rhs, &values).to_csr();

        // 2 u_1 = 0 + 1 * 2 + 1 * 4
        assert_relative_eq!(rhs[1], 6.0);
        assert_relative_eq!(rhs[0], 2.0);
        assert_relative_eq!(rhs[2], 4.0);
        assert_relative_eq!(csr.get(1, 1), 2.0);
    }
}
