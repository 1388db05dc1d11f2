//! Stiffness matrix assembly
//!
//! Assembles the diffusion stiffness matrix K where K_ij = ∫ κ ∇φ_i · ∇φ_j dΩ
//! for linear (P1) triangles. P1 gradients are constant per element, so the
//! coefficient is sampled once at the element centroid.

use crate::error::{FemError, Result};
use crate::mesh::{Mesh, Point};
use ndarray::Array2;
use solvers::{CsrMatrix, ElementContributions};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Diffusion coefficient κ(x, y)
#[derive(Debug, Clone, Copy)]
pub enum DiffusionCoefficient {
    /// Same value everywhere
    Constant(f64),
    /// Spatially varying coefficient
    Field(fn(f64, f64) -> f64),
}

impl DiffusionCoefficient {
    /// Evaluate at a point
    pub fn value_at(&self, point: &Point) -> f64 {
        match self {
            DiffusionCoefficient::Constant(value) => *value,
            DiffusionCoefficient::Field(f) => f(point.x, point.y),
        }
    }
}

impl Default for DiffusionCoefficient {
    fn default() -> Self {
        DiffusionCoefficient::Constant(1.0)
    }
}

/// Assembled stiffness matrix in triplet format
#[derive(Debug, Clone)]
pub struct StiffnessMatrix {
    /// Row indices
    pub rows: Vec<usize>,
    /// Column indices
    pub cols: Vec<usize>,
    /// Values
    pub values: Vec<f64>,
    /// Matrix dimension
    pub dim: usize,
}

impl StiffnessMatrix {
    pub fn new(dim: usize) -> Self {
        Self {
            rows: Vec::new(),
            cols: Vec::new(),
            values: Vec::new(),
            dim,
        }
    }

    /// Add a triplet (i, j, value)
    pub fn add(&mut self, i: usize, j: usize, value: f64) {
        self.rows.push(i);
        self.cols.push(j);
        self.values.push(value);
    }

    /// Number of non-zeros
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Sum duplicates into a CSR matrix
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let triplets = self
            .rows
            .iter()
            .zip(&self.cols)
            .zip(&self.values)
            .map(|((&i, &j), &v)| (i, j, v))
            .collect();
        CsrMatrix::from_triplets(self.dim, self.dim, triplets)
    }
}

/// Dense element stiffness matrices, kept for element-level subdomain assembly
#[derive(Debug, Clone)]
pub struct ElementMatrices {
    num_dofs: usize,
    dofs: Vec<[usize; 3]>,
    matrices: Vec<Array2<f64>>,
    essential: Vec<bool>,
}

impl ElementMatrices {
    /// Mark DOFs carrying an essential boundary condition
    pub fn mark_essential(&mut self, nodes: &[usize]) {
        for &node in nodes {
            if let Some(flag) = self.essential.get_mut(node) {
                *flag = true;
            }
        }
    }

    /// Scatter every element matrix into global triplets
    pub fn assemble(&self) -> StiffnessMatrix {
        let mut matrix = StiffnessMatrix::new(self.num_dofs);
        for (dofs, k_local) in self.dofs.iter().zip(&self.matrices) {
            for (i, &gi) in dofs.iter().enumerate() {
                for (j, &gj) in dofs.iter().enumerate() {
                    if k_local[[i, j]].abs() > 1e-15 {
                        matrix.add(gi, gj, k_local[[i, j]]);
                    }
                }
            }
        }
        matrix
    }
}

impl ElementContributions<f64> for ElementMatrices {
    fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    fn num_elements(&self) -> usize {
        self.dofs.len()
    }

    fn element_dofs(&self, element: usize) -> &[usize] {
        &self.dofs[element]
    }

    fn element_matrix(&self, element: usize) -> &Array2<f64> {
        &self.matrices[element]
    }

    fn is_essential(&self, dof: usize) -> bool {
        self.essential.get(dof).copied().unwrap_or(false)
    }
}

/// Compute element stiffness matrix for a 2D triangle (P1)
fn element_stiffness_triangle_p1(
    mesh: &Mesh,
    elem_idx: usize,
    diffusion: &DiffusionCoefficient,
) -> Result<Array2<f64>> {
    let nodes = mesh.elements[elem_idx].nodes;
    let p: Vec<&Point> = nodes.iter().map(|&v| &mesh.nodes[v]).collect();

    let kappa = diffusion.value_at(&mesh.element_centroid(elem_idx));
    if !(kappa.is_finite() && kappa > 0.0) {
        return Err(FemError::InvalidParameter {
            name: "diffusion",
            value: kappa,
            reason: "must be finite and positive",
        });
    }

    let twice_area =
        (p[1].x - p[0].x) * (p[2].y - p[0].y) - (p[2].x - p[0].x) * (p[1].y - p[0].y);
    if twice_area.abs() < 1e-300 {
        return Err(FemError::InvalidMesh(format!("element {elem_idx} is degenerate")));
    }

    // Gradients of the barycentric coordinates, scaled by 2|T|
    let b = [p[1].y - p[2].y, p[2].y - p[0].y, p[0].y - p[1].y];
    let c = [p[2].x - p[1].x, p[0].x - p[2].x, p[1].x - p[0].x];

    let scale = kappa / (2.0 * twice_area.abs());
    Ok(Array2::from_shape_fn((3, 3), |(i, j)| {
        scale * (b[i] * b[j] + c[i] * c[j])
    }))
}

/// Compute every element stiffness matrix of the mesh
pub fn compute_element_matrices(
    mesh: &Mesh,
    diffusion: &DiffusionCoefficient,
) -> Result<ElementMatrices> {
    #[cfg(feature = "parallel")]
    let matrices = (0..mesh.num_elements())
        .into_par_iter()
        .map(|elem_idx| element_stiffness_triangle_p1(mesh, elem_idx, diffusion))
        .collect::<Result<Vec<_>>>()?;

    #[cfg(not(feature = "parallel"))]
    let matrices = (0..mesh.num_elements())
        .map(|elem_idx| element_stiffness_triangle_p1(mesh, elem_idx, diffusion))
        .collect::<Result<Vec<_>>>()?;

    Ok(ElementMatrices {
        num_dofs: mesh.num_nodes(),
        dofs: mesh.elements.iter().map(|e| e.nodes).collect(),
        matrices,
        essential: vec![false; mesh.num_nodes()],
    })
}

/// Assemble global stiffness matrix from mesh
pub fn assemble_stiffness(
    mesh: &Mesh,
    diffusion: &DiffusionCoefficient,
) -> Result<StiffnessMatrix> {
    Ok(compute_element_matrices(mesh, diffusion)?.assemble())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::unit_square_triangles;
    use approx::assert_relative_eq;

    #[test]
    fn test_stiffness_assembly_triangle() {
        let mesh = unit_square_triangles(2).expect("mesh");
        let stiffness =
            assemble_stiffness(&mesh, &DiffusionCoefficient::Constant(1.0)).expect("stiffness");

        assert_eq!(stiffness.dim, mesh.num_nodes());
        assert!(stiffness.nnz() > 0);
    }

    #[test]
    fn test_stiffness_symmetry_and_zero_row_sums() {
        let mesh = unit_square_triangles(3).expect("mesh");
        let csr = assemble_stiffness(&mesh, &DiffusionCoefficient::Constant(2.5))
            .expect("stiffness")
            .to_csr();

        assert!(csr.is_symmetric(1e-12));
        for i in 0..csr.num_rows {
            let row_sum: f64 = csr.row_entries(i).map(|(_, v)| v).sum();
            assert!(row_sum.abs() < 1e-12, "row {} sums to {}", i, row_sum);
        }
    }

    #[test]
    fn test_interior_stencil_is_five_point() {
        let mesh = unit_square_triangles(2).expect("mesh");
        let csr = assemble_stiffness(&mesh, &DiffusionCoefficient::Constant(1.0))
            .expect("stiffness")
            .to_csr();

        // Node 4 is the center of the 3x3 grid
        assert_relative_eq!(csr.get(4, 4), 4.0, epsilon = 1e-12);
        for neighbour in [1, 3, 5, 7] {
            assert_relative_eq!(csr.get(4, neighbour), -1.0, epsilon = 1e-12);
        }
        assert_relative_eq!(csr.get(4, 0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(csr.get(4, 8), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_varying_coefficient_scales_elements() {
        let mesh = unit_square_triangles(2).expect("mesh");
        let constant =
            compute_element_matrices(&mesh, &DiffusionCoefficient::Constant(1.0)).expect("const");
        let field = compute_element_matrices(&mesh, &DiffusionCoefficient::Field(|x, _| 1.0 + x))
            .expect("field");

        let centroid = mesh.element_centroid(0);
        let ratio = field.element_matrix(0)[[0, 0]] / constant.element_matrix(0)[[0, 0]];
        assert_relative_eq!(ratio, 1.0 + centroid.x, epsilon = 1e-12);
    }

    #[test]
    fn test_non_positive_coefficient_is_rejected() {
        let mesh = unit_square_triangles(1).expect("mesh");
        let err = assemble_stiffness(&mesh, &DiffusionCoefficient::Constant(0.0)).unwrap_err();
        assert!(matches!(
            err,
            FemError::InvalidParameter {
                name: "diffusion",
                ..
            }
        ));
    }

    #[test]
    fn test_essential_marks() {
        let mesh = unit_square_triangles(1).expect("mesh");
        let mut elements =
            compute_element_matrices(&mesh, &DiffusionCoefficient::default()).expect("elements");
        elements.mark_essential(&[0, 3]);
        assert!(elements.is_essential(0));
        assert!(!elements.is_essential(1));
        assert!(elements.is_essential(3));
        assert!(!elements.is_essential(99));
        assert_eq!(elements.element_dofs(1), &[0, 3, 2]);
    }
}
