//! Mesh types and generators for FEM
//!
//! This module provides triangular mesh data structures and structured generators
//! for rectangular 2D domains.

mod generators;
mod types;

pub use generators::*;
pub use types::*;
