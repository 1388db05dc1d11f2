//! Mesh generators for rectangular domains

use super::types::{Mesh, Point};
use crate::error::{FemError, Result};

/// Generate a rectangular mesh with triangular elements
///
/// Nodes are numbered row by row (x fastest), so node `j * (nx + 1) + i`
/// sits at column `i`, row `j`.
pub fn rectangular_mesh_triangles(
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    nx: usize,
    ny: usize,
) -> Result<Mesh> {
    if nx == 0 || ny == 0 {
        return Err(FemError::InvalidMesh(format!(
            "need at least one cell per direction, got {nx} x {ny}"
        )));
    }
    if !(x_max > x_min && y_max > y_min) {
        return Err(FemError::InvalidMesh(format!(
            "empty rectangle [{x_min}, {x_max}] x [{y_min}, {y_max}]"
        )));
    }

    let mut mesh = Mesh::new();

    let dx = (x_max - x_min) / nx as f64;
    let dy = (y_max - y_min) / ny as f64;

    // Create nodes
    for j in 0..=ny {
        for i in 0..=nx {
            let x = x_min + i as f64 * dx;
            let y = y_min + j as f64 * dy;
            mesh.add_node(Point::new_2d(x, y));
        }
    }

    // Create triangular elements (2 triangles per cell)
    for j in 0..ny {
        for i in 0..nx {
            let n00 = j * (nx + 1) + i;
            let n10 = n00 + 1;
            let n01 = n00 + (nx + 1);
            let n11 = n01 + 1;

            mesh.add_element([n00, n10, n11]);
            mesh.add_element([n00, n11, n01]);
        }
    }

    mesh.detect_boundaries();

    log::debug!(
        "Generated {} x {} triangle mesh: {} nodes, {} elements, {} boundary edges",
        nx,
        ny,
        mesh.num_nodes(),
        mesh.num_elements(),
        mesh.boundaries.len()
    );

    Ok(mesh)
}

/// Generate a unit square mesh with `n` cells per side
pub fn unit_square_triangles(n: usize) -> Result<Mesh> {
    rectangular_mesh_triangles(0.0, 1.0, 0.0, 1.0, n, n)
}
