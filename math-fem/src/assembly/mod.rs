//! Finite element matrix assembly
//!
//! Assembles the diffusion stiffness matrix and the load vector on triangular meshes.

mod load;
mod stiffness;

pub use load::*;
pub use stiffness::*;
