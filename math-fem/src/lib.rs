//! P1 diffusion problems for multiplicative Schwarz
//!
//! This crate provides the finite element side of the domain decomposition
//! pipeline: it builds the global system, the DOF positions the partitioner
//! needs, and the element matrices used for element-owned subdomains.
//!
//! # Features
//!
//! - **2D meshes**: structured triangle meshes with boundary detection
//! - **Assembly**: P1 stiffness with constant or varying diffusion, load vectors
//! - **Boundary conditions**: Dirichlet by symmetric elimination
//! - **Driver**: JSON-configured partition / subdomain / sweep pipeline
//!
//! # Example
//!
//! ```ignore
//! use fem::{DiffusionProblem, assembly::DiffusionCoefficient};
//! use solvers::{PartitionConfig, SchwarzConfig, SubdomainAssembly, multiplicative_schwarz};
//!
//! let problem = DiffusionProblem::unit_square(31, DiffusionCoefficient::Constant(1.0), 1.0)?;
//! let regions = problem.partition(&PartitionConfig::new(2))?;
//! let subdomains = problem.subdomains(&regions, SubdomainAssembly::Sliced)?;
//! let x0 = ndarray::Array1::zeros(problem.num_dofs());
//! let solution = multiplicative_schwarz(&problem.matrix, &problem.rhs, &subdomains, x0, &SchwarzConfig::default())?;
//! ```

pub mod assembly;
pub mod boundary;
pub mod driver;
pub mod error;
pub mod mesh;
pub mod problem;

pub use driver::{DriverConfig, DriverReport, run};
pub use error::{FemError, Result};
pub use problem::DiffusionProblem;

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
