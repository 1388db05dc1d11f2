//! Assembled diffusion problems
//!
//! `-∇·(κ ∇u) = s` on a triangulated domain with `u = 0` on the boundary,
//! discretized with P1 elements (one DOF per mesh node).

use crate::assembly::{
    DiffusionCoefficient, ElementMatrices, assemble_load, compute_element_matrices,
};
use crate::boundary::apply_homogeneous_dirichlet;
use crate::error::{FemError, Result};
use crate::mesh::{Mesh, unit_square_triangles};
use ndarray::Array1;
use solvers::{
    CsrMatrix, DofSet, PartitionConfig, Region, Subdomain, SubdomainAssembly, build_subdomains,
    build_subdomains_from_elements, partition,
};

/// Global system `A u = f` together with the mesh it was assembled on
#[derive(Debug, Clone)]
pub struct DiffusionProblem {
    /// Triangulation
    pub mesh: Mesh,
    /// Global stiffness matrix with Dirichlet rows eliminated
    pub matrix: CsrMatrix<f64>,
    /// Load vector, zero on Dirichlet nodes
    pub rhs: Array1<f64>,
    /// Element stiffness matrices (before elimination)
    pub elements: ElementMatrices,
    /// Boundary nodes carrying `u = 0`, ascending
    pub dirichlet_nodes: Vec<usize>,
}

impl DiffusionProblem {
    /// Unit square with `dimension` nodes per side (`dimension²` DOFs) and a constant source
    pub fn unit_square(
        dimension: usize,
        diffusion: DiffusionCoefficient,
        source: f64,
    ) -> Result<Self> {
        if dimension < 2 {
            return Err(FemError::InvalidMesh(format!(
                "need at least 2 nodes per side, got {dimension}"
            )));
        }
        if !source.is_finite() {
            return Err(FemError::InvalidParameter {
                name: "source",
                value: source,
                reason: "must be finite",
            });
        }
        let mesh = unit_square_triangles(dimension - 1)?;
        Self::from_mesh(mesh, diffusion, &|_, _| source)
    }

    /// Assemble on an existing mesh; all detected boundary nodes are clamped
    pub fn from_mesh<F>(mesh: Mesh, diffusion: DiffusionCoefficient, source: &F) -> Result<Self>
    where
        F: Fn(f64, f64) -> f64 + Sync,
    {
        let mut elements = compute_element_matrices(&mesh, &diffusion)?;
        let dirichlet_nodes = mesh.boundary_nodes();
        elements.mark_essential(&dirichlet_nodes);

        let stiffness = elements.assemble();
        let mut rhs = assemble_load(&mesh, source);
        let matrix = apply_homogeneous_dirichlet(&stiffness, &mut rhs, &dirichlet_nodes).to_csr();

        log::info!(
            "Assembled diffusion problem: {} DOFs, {} elements, {} non-zeros, {} Dirichlet nodes",
            mesh.num_nodes(),
            mesh.num_elements(),
            matrix.nnz(),
            dirichlet_nodes.len()
        );

        Ok(Self {
            mesh,
            matrix,
            rhs,
            elements,
            dirichlet_nodes,
        })
    }

    pub fn num_dofs(&self) -> usize {
        self.matrix.num_rows
    }

    /// DOF indices paired with node coordinates (P1: DOF i lives on node i)
    pub fn dof_positions(&self) -> DofSet {
        DofSet::from_positions(self.mesh.positions())
    }

    /// Split the DOFs into regions
    pub fn partition(&self, config: &PartitionConfig) -> Result<Vec<Region>> {
        Ok(partition(&self.dof_positions(), config)?)
    }

    /// Build one local system per region
    pub fn subdomains(
        &self,
        regions: &[Region],
        assembly: SubdomainAssembly,
    ) -> Result<Vec<Subdomain<f64>>> {
        let subdomains = match assembly {
            SubdomainAssembly::Sliced => build_subdomains(&self.matrix, regions)?,
            SubdomainAssembly::ElementOwned => {
                build_subdomains_from_elements(&self.elements, regions)?
            }
        };
        Ok(subdomains)
    }
}
