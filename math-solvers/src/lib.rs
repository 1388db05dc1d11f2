//! Linear solvers and multiplicative Schwarz domain decomposition
//!
//! This crate provides sparse matrix representations, dense direct solvers,
//! Conjugate Gradient, and an overlapping domain decomposition solver for
//! symmetric positive definite systems arising from diffusion problems.
//!
//! # Features
//!
//! - **Domain Decomposition**: coordinate-band partitioning, restriction and
//!   extension operators, local subdomain matrices, multiplicative Schwarz sweeps
//! - **Iterative Solvers**: CG, plain and preconditioned
//! - **Direct Solvers**: LU decomposition (with LAPACK and pure-Rust fallbacks), Cholesky
//! - **Preconditioners**: symmetric multiplicative Schwarz
//! - **Sparse Matrices**: CSR format with efficient matrix-vector products
//! - **Generic Scalar Types**: Works with f64 and f32
//!
//! # Example
//!
//! ```ignore
//! use math_schwarz_solvers::{
//!     DofSet, PartitionConfig, SchwarzConfig, build_subdomains, multiplicative_schwarz, partition,
//! };
//!
//! let regions = partition(&DofSet::from_positions(positions), &PartitionConfig::new(2))?;
//! let subdomains = build_subdomains(&matrix, &regions)?;
//! let solution = multiplicative_schwarz(&matrix, &rhs, &subdomains, x0, &SchwarzConfig::default())?;
//! ```

pub mod blas_helpers;
pub mod direct;
pub mod domain_decomposition;
pub mod iterative;
pub mod preconditioners;
pub mod sparse;
pub mod traits;

// Re-export main types
pub use sparse::{CsrBuilder, CsrMatrix};
pub use traits::{LinearOperator, Preconditioner, RealField};

// Re-export iterative solvers
pub use iterative::{CgConfig, CgSolution, cg, cg_preconditioned};

// Re-export direct solvers
pub use direct::{CholeskyFactorization, LuFactorization, cholesky_factorize, lu_factorize, lu_solve};

// Re-export preconditioners
pub use preconditioners::{IdentityPreconditioner, SymmetricSchwarzPreconditioner};

// Re-export domain decomposition
pub use domain_decomposition::{
    Axis, BandPolicy, DofSet, ElementContributions, LocalSolverKind, MultiplicativeSchwarz,
    PartitionConfig, Region, RestrictionOperator, SchwarzConfig, SchwarzError, SchwarzSolution,
    SchwarzState, Subdomain, SubdomainAssembly, SubdomainMatrix, build_restrictions,
    build_subdomains, build_subdomains_from_elements, extend_by_layers, multiplicative_schwarz,
    partition,
};
