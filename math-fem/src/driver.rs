//! End-to-end Schwarz driver
//!
//! Assembles a diffusion problem on the unit square, partitions its DOFs,
//! builds the subdomain systems and runs multiplicative Schwarz. Optionally
//! compares plain CG against CG preconditioned by symmetric Schwarz sweeps.
//!
//! Configuration is JSON; every field has a default, so `{}` is a valid file.

use crate::assembly::DiffusionCoefficient;
use crate::error::{FemError, Result};
use crate::problem::DiffusionProblem;
use clap::ValueEnum;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use solvers::{
    Axis, BandPolicy, CgConfig, LocalSolverKind, PartitionConfig, SchwarzConfig,
    SubdomainAssembly, SymmetricSchwarzPreconditioner, cg, cg_preconditioned, extend_by_layers,
    multiplicative_schwarz,
};
use std::fs;
use std::path::Path;

/// Complete driver configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Nodes per side of the unit square
    pub dimension: usize,
    /// Diffusion coefficient
    pub diffusion: DiffusionConfig,
    /// Constant source term
    pub source: f64,
    /// Domain partitioning
    pub partition: PartitionSettings,
    /// Schwarz iteration
    pub solver: SolverSettings,
    /// Also run plain and Schwarz-preconditioned CG
    pub compare_cg: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            dimension: 31,
            diffusion: DiffusionConfig::default(),
            source: 1.0,
            partition: PartitionSettings::default(),
            solver: SolverSettings::default(),
            compare_cg: false,
        }
    }
}

/// Diffusion coefficient configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiffusionConfig {
    /// κ = value everywhere
    Constant {
        #[serde(default = "default_diffusion")]
        value: f64,
    },
    /// κ(x, y) = 1 + 0.5 sin(πx) sin(πy)
    Varying,
}

fn default_diffusion() -> f64 {
    1.0
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        DiffusionConfig::Constant {
            value: default_diffusion(),
        }
    }
}

fn smooth_bump(x: f64, y: f64) -> f64 {
    use std::f64::consts::PI;
    1.0 + 0.5 * (PI * x).sin() * (PI * y).sin()
}

impl DiffusionConfig {
    /// Convert to DiffusionCoefficient
    pub fn to_coefficient(&self) -> DiffusionCoefficient {
        match self {
            DiffusionConfig::Constant { value } => DiffusionCoefficient::Constant(*value),
            DiffusionConfig::Varying => DiffusionCoefficient::Field(smooth_bump),
        }
    }
}

/// Coordinate axis along which bands are cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AxisChoice {
    X,
    #[default]
    Y,
    Z,
}

impl From<AxisChoice> for Axis {
    fn from(choice: AxisChoice) -> Self {
        match choice {
            AxisChoice::X => Axis::X,
            AxisChoice::Y => Axis::Y,
            AxisChoice::Z => Axis::Z,
        }
    }
}

/// Band construction rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PolicyChoice {
    #[default]
    EqualCount,
    EqualWidth,
}

impl From<PolicyChoice> for BandPolicy {
    fn from(choice: PolicyChoice) -> Self {
        match choice {
            PolicyChoice::EqualCount => BandPolicy::EqualCount,
            PolicyChoice::EqualWidth => BandPolicy::EqualWidth,
        }
    }
}

/// Local matrix construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyChoice {
    #[default]
    Sliced,
    ElementOwned,
}

impl From<AssemblyChoice> for SubdomainAssembly {
    fn from(choice: AssemblyChoice) -> Self {
        match choice {
            AssemblyChoice::Sliced => SubdomainAssembly::Sliced,
            AssemblyChoice::ElementOwned => SubdomainAssembly::ElementOwned,
        }
    }
}

/// Local factorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LocalSolverChoice {
    #[default]
    Lu,
    Cholesky,
}

impl From<LocalSolverChoice> for LocalSolverKind {
    fn from(choice: LocalSolverChoice) -> Self {
        match choice {
            LocalSolverChoice::Lu => LocalSolverKind::Lu,
            LocalSolverChoice::Cholesky => LocalSolverKind::Cholesky,
        }
    }
}

/// Three mesh widths at the default dimension of 31
const DEFAULT_OVERLAP: f64 = 0.1;

/// Sweep bound sized for the default 961-DOF problem
const DEFAULT_MAX_SWEEPS: usize = 200;

/// Partitioning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionSettings {
    /// Number of regions
    pub num_regions: usize,
    /// Geometric overlap width added on each side of a band
    pub overlap: f64,
    /// Extra matrix-graph layers added to every region
    pub overlap_layers: usize,
    /// Band axis
    pub axis: AxisChoice,
    /// Band policy
    pub policy: PolicyChoice,
}

impl Default for PartitionSettings {
    fn default() -> Self {
        Self {
            num_regions: 2,
            overlap: DEFAULT_OVERLAP,
            overlap_layers: 0,
            axis: AxisChoice::default(),
            policy: PolicyChoice::default(),
        }
    }
}

impl PartitionSettings {
    /// Convert to PartitionConfig
    pub fn to_partition_config(&self) -> PartitionConfig {
        PartitionConfig::new(self.num_regions)
            .with_overlap(self.overlap)
            .with_axis(self.axis.into())
            .with_policy(self.policy.into())
    }
}

/// Schwarz iteration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Residual tolerance
    pub tolerance: f64,
    /// Sweep bound
    pub max_sweeps: usize,
    /// Log every N sweeps (0 = quiet)
    pub print_interval: usize,
    /// Local factorization
    pub local_solver: LocalSolverChoice,
    /// Local matrix construction
    pub assembly: AssemblyChoice,
}

impl Default for SolverSettings {
    fn default() -> Self {
        let defaults = SchwarzConfig::default();
        Self {
            tolerance: defaults.tolerance,
            max_sweeps: DEFAULT_MAX_SWEEPS,
            print_interval: defaults.print_interval,
            local_solver: LocalSolverChoice::default(),
            assembly: AssemblyChoice::default(),
        }
    }
}

impl SolverSettings {
    /// Convert to SchwarzConfig
    pub fn to_schwarz_config(&self) -> SchwarzConfig<f64> {
        SchwarzConfig {
            max_sweeps: self.max_sweeps,
            tolerance: self.tolerance,
            print_interval: self.print_interval,
            local_solver: self.local_solver.into(),
        }
    }
}

impl DriverConfig {
    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| FemError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| FemError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Size of one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub name: String,
    pub size: usize,
}

/// Iteration counts of the Krylov comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CgComparison {
    pub plain_iterations: usize,
    pub plain_converged: bool,
    pub preconditioned_iterations: usize,
    pub preconditioned_converged: bool,
}

/// Everything the driver produces, ready for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverReport {
    /// Global DOF count
    pub num_dofs: usize,
    /// Regions in processing order
    pub regions: Vec<RegionSummary>,
    /// Sweeps performed
    pub sweeps: usize,
    /// Final global residual norm
    pub residual: f64,
    /// Residual after every sweep
    pub residual_history: Vec<f64>,
    /// Whether the tolerance was met
    pub converged: bool,
    /// Terminal state name
    pub state: String,
    /// DOF coordinates, indexed like `values`
    pub positions: Vec<[f64; 3]>,
    /// Solution value per DOF
    pub values: Vec<f64>,
    /// Krylov comparison, when requested
    pub cg: Option<CgComparison>,
}

impl DriverReport {
    /// Write as pretty JSON
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| FemError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn solution(&self) -> Array1<f64> {
        Array1::from_vec(self.values.clone())
    }
}

/// Run the full pipeline: assemble, partition, build subdomains, sweep
pub fn run(config: &DriverConfig) -> Result<DriverReport> {
    let problem = DiffusionProblem::unit_square(
        config.dimension,
        config.diffusion.to_coefficient(),
        config.source,
    )?;

    let mut regions = problem.partition(&config.partition.to_partition_config())?;
    if config.partition.overlap_layers > 0 {
        regions = regions
            .iter()
            .map(|region| {
                extend_by_layers(region, &problem.matrix, config.partition.overlap_layers)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
    }

    let subdomains = problem.subdomains(&regions, config.solver.assembly.into())?;
    for subdomain in &subdomains {
        log::debug!(
            "{}: {} DOFs, {} interface",
            subdomain.name(),
            subdomain.size(),
            subdomain.matrix.num_interface()
        );
    }

    let schwarz_config = config.solver.to_schwarz_config();
    let solution = multiplicative_schwarz(
        &problem.matrix,
        &problem.rhs,
        &subdomains,
        Array1::zeros(problem.num_dofs()),
        &schwarz_config,
    )?;

    let comparison = if config.compare_cg {
        let cg_config = CgConfig {
            max_iterations: 10 * problem.num_dofs(),
            tolerance: config.solver.tolerance,
            print_interval: config.solver.print_interval,
        };
        let plain = cg(&problem.matrix, &problem.rhs, &cg_config);
        let precond = SymmetricSchwarzPreconditioner::new(
            &problem.matrix,
            &subdomains,
            schwarz_config.local_solver,
        )?;
        let preconditioned = cg_preconditioned(&problem.matrix, &precond, &problem.rhs, &cg_config);
        log::info!(
            "CG: {} iterations unpreconditioned, {} with symmetric Schwarz",
            plain.iterations,
            preconditioned.iterations
        );
        Some(CgComparison {
            plain_iterations: plain.iterations,
            plain_converged: plain.converged,
            preconditioned_iterations: preconditioned.iterations,
            preconditioned_converged: preconditioned.converged,
        })
    } else {
        None
    };

    let converged = solution.converged();
    Ok(DriverReport {
        num_dofs: problem.num_dofs(),
        regions: subdomains
            .iter()
            .map(|s| RegionSummary {
                name: s.name().to_string(),
                size: s.size(),
            })
            .collect(),
        sweeps: solution.sweeps,
        residual: solution.residual,
        residual_history: solution.residual_history,
        converged,
        state: format!("{:?}", solution.state),
        positions: problem.mesh.positions(),
        values: solution.x.to_vec(),
        cg: comparison,
    })
}
