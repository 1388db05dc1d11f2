//! Multiplicative Schwarz driver
//!
//! Solves -∇·(κ∇u) = s on the unit square with u = 0 on the boundary by
//! multiplicative Schwarz sweeps over coordinate bands, and optionally writes
//! the DOF positions and solution values as JSON for plotting.
//!
//! Usage:
//!   cargo run --release --bin schwarz-driver -- --dimension 31 --regions 4 --overlap 0.05
//!   cargo run --release --bin schwarz-driver -- --config configs/schwarz.json --output solution.json

use anyhow::Context;
use clap::Parser;
use fem::driver::{AssemblyChoice, AxisChoice, LocalSolverChoice, PolicyChoice};
use fem::{DriverConfig, DriverReport};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "schwarz-driver",
    about = "Solve a P1 diffusion problem with multiplicative Schwarz domain decomposition"
)]
struct Args {
    /// JSON configuration file (command line flags override its values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Nodes per side of the unit square
    #[arg(long)]
    dimension: Option<usize>,

    /// Number of regions
    #[arg(long)]
    regions: Option<usize>,

    /// Geometric overlap width on each side of a band
    #[arg(long)]
    overlap: Option<f64>,

    /// Extra matrix-graph overlap layers
    #[arg(long)]
    overlap_layers: Option<usize>,

    /// Axis along which bands are cut
    #[arg(long, value_enum)]
    axis: Option<AxisChoice>,

    /// Band placement policy
    #[arg(long, value_enum)]
    policy: Option<PolicyChoice>,

    /// Residual tolerance
    #[arg(long)]
    tolerance: Option<f64>,

    /// Maximum number of sweeps
    #[arg(long)]
    max_sweeps: Option<usize>,

    /// Log the residual every N sweeps (0 = quiet)
    #[arg(long)]
    print_interval: Option<usize>,

    /// Local factorization
    #[arg(long, value_enum)]
    local_solver: Option<LocalSolverChoice>,

    /// Local matrix construction
    #[arg(long, value_enum)]
    assembly: Option<AssemblyChoice>,

    /// Also run plain and Schwarz-preconditioned CG
    #[arg(long)]
    compare_cg: bool,

    /// Write positions and solution values to this JSON file
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut DriverConfig) {
        if let Some(dimension) = self.dimension {
            config.dimension = dimension;
        }
        if let Some(regions) = self.regions {
            config.partition.num_regions = regions;
        }
        if let Some(overlap) = self.overlap {
            config.partition.overlap = overlap;
        }
        if let Some(layers) = self.overlap_layers {
            config.partition.overlap_layers = layers;
        }
        if let Some(axis) = self.axis {
            config.partition.axis = axis;
        }
        if let Some(policy) = self.policy {
            config.partition.policy = policy;
        }
        if let Some(tolerance) = self.tolerance {
            config.solver.tolerance = tolerance;
        }
        if let Some(max_sweeps) = self.max_sweeps {
            config.solver.max_sweeps = max_sweeps;
        }
        if let Some(print_interval) = self.print_interval {
            config.solver.print_interval = print_interval;
        }
        if let Some(local_solver) = self.local_solver {
            config.solver.local_solver = local_solver;
        }
        if let Some(assembly) = self.assembly {
            config.solver.assembly = assembly;
        }
        config.compare_cg |= self.compare_cg;
    }
}

fn print_summary(report: &DriverReport) {
    println!("DOFs:      {}", report.num_dofs);
    for region in &report.regions {
        println!("  {:<12} {} DOFs", region.name, region.size);
    }
    println!("State:     {}", report.state);
    println!("Sweeps:    {}", report.sweeps);
    println!("Residual:  {:.6e}", report.residual);
    if let Some(cg) = &report.cg {
        println!(
            "CG:        {} iterations (converged: {})",
            cg.plain_iterations, cg.plain_converged
        );
        println!(
            "PCG:       {} iterations (converged: {})",
            cg.preconditioned_iterations, cg.preconditioned_converged
        );
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let mut config = if let Some(path) = &args.config {
        println!("Loading configuration from: {}", path.display());
        DriverConfig::from_file(path)?
    } else {
        DriverConfig::default()
    };
    args.apply(&mut config);

    let start = Instant::now();
    let report = fem::run(&config).context("Schwarz solve failed")?;
    print_summary(&report);
    println!("Elapsed:   {:.3} s", start.elapsed().as_secs_f64());

    if let Some(output) = &args.output {
        report
            .save_json(output)
            .with_context(|| format!("writing {}", output.display()))?;
        println!("Solution saved to: {}", output.display());
    }

    if !report.converged {
        eprintln!(
            "Schwarz did not converge in {} sweeps (residual {:.3e})",
            report.sweeps, report.residual
        );
        std::process::exit(1);
    }

    Ok(())
}
