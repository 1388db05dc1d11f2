//! Preconditioners for iterative solvers
//!
//! Preconditioners approximate A^(-1) to accelerate convergence of iterative methods.
//!
//! # Available Preconditioners
//!
//! - **IdentityPreconditioner**: No preconditioning
//! - **SymmetricSchwarzPreconditioner**: Forward and backward multiplicative Schwarz sweeps

mod schwarz;

pub use schwarz::SymmetricSchwarzPreconditioner;

// Re-export IdentityPreconditioner from traits
pub use crate::traits::IdentityPreconditioner;
