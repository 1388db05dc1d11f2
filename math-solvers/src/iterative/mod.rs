//! Iterative solvers for linear systems
//!
//! - [`cg`]: Conjugate Gradient - for symmetric positive definite systems
//! - [`cg_preconditioned`]: Conjugate Gradient with an SPD preconditioner

mod cg;

pub use cg::{CgConfig, CgSolution, cg, cg_preconditioned};
