//! Boundary condition handling for finite element problems
//!
//! Dirichlet (essential) conditions by symmetric elimination.

mod dirichlet;

pub use dirichlet::*;
