//! Overlapping domain decomposition
//!
//! The pipeline runs in four stages:
//!
//! 1. [`partition`] splits the DOFs into coordinate bands (optionally overlapping)
//! 2. [`RestrictionOperator`] maps the global space onto each region and back
//! 3. [`build_subdomains`] / [`build_subdomains_from_elements`] produce the local matrices
//! 4. [`MultiplicativeSchwarz`] sweeps over the regions until the global residual is small
//!
//! [`SymmetricSchwarzPreconditioner`](crate::preconditioners::SymmetricSchwarzPreconditioner)
//! reuses the same sweeps as a preconditioner for CG.

pub mod error;
pub mod multiplicative;
pub mod partition;
pub mod restriction;
pub mod subdomain;

pub use error::{Result, SchwarzError};
pub use multiplicative::{
    MultiplicativeSchwarz, SchwarzConfig, SchwarzSolution, SchwarzState, multiplicative_schwarz,
};
pub use partition::{
    Axis, BandPolicy, DofSet, PartitionConfig, Region, extend_by_layers, partition, uncovered_dofs,
};
pub use restriction::{RestrictionOperator, build_restrictions};
pub use subdomain::{
    ElementContributions, LocalConstraint, LocalSolver, LocalSolverKind, Subdomain,
    SubdomainAssembly, SubdomainMatrix, build_subdomains, build_subdomains_from_elements,
};
