//! Load vector assembly
//!
//! Assembles b_i = ∫ s φ_i dΩ with a one-point (centroid) rule per triangle,
//! exact for constant sources.

use crate::mesh::Mesh;
use ndarray::Array1;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Compute element load contributions (returns (node, value) pairs for one element)
fn compute_element_load<F>(mesh: &Mesh, elem_idx: usize, source: &F) -> [(usize, f64); 3]
where
    F: Fn(f64, f64) -> f64,
{
    let centroid = mesh.element_centroid(elem_idx);
    let share = source(centroid.x, centroid.y) * mesh.element_measure(elem_idx) / 3.0;
    let [a, b, c] = mesh.elements[elem_idx].nodes;
    [(a, share), (b, share), (c, share)]
}

/// Assemble the load vector for a source term s(x, y)
pub fn assemble_load<F>(mesh: &Mesh, source: &F) -> Array1<f64>
where
    F: Fn(f64, f64) -> f64 + Sync,
{
    #[cfg(feature = "parallel")]
    let contributions: Vec<[(usize, f64); 3]> = (0..mesh.num_elements())
        .into_par_iter()
        .map(|elem_idx| compute_element_load(mesh, elem_idx, source))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let contributions: Vec<[(usize, f64); 3]> = (0..mesh.num_elements())
        .map(|elem_idx| compute_element_load(mesh, elem_idx, source))
        .collect();

    let mut rhs = Array1::zeros(mesh.num_nodes());
    for element in contributions {
        for (node, value) in element {
            rhs[node] += value;
        }
    }
    rhs
}
