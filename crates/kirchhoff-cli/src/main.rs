//! `kirchhoff`: parse a DC-only SPICE-like netlist, formulate its
//! Kirchhoff equations, solve them, and print the result.

mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use kirchhoff_circuit::{Circuit, EquationFormulator};
use kirchhoff_devices::ComponentRegistry;
use kirchhoff_parser::parse_netlist;

#[derive(Parser)]
#[command(name = "kirchhoff")]
#[command(about = "Solve a DC netlist by symbolic Kirchhoff equation formulation")]
#[command(version)]
struct Cli {
    /// Path to the netlist file
    netlist: PathBuf,

    /// Emit the solution as JSON instead of formatted text
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let source = std::fs::read_to_string(&cli.netlist)
        .with_context(|| format!("reading netlist {}", cli.netlist.display()))?;

    let registry = ComponentRegistry::new();
    let netlist = parse_netlist(&source, &registry)
        .with_context(|| format!("parsing netlist {}", cli.netlist.display()))?;
    info!(
        "parsed {:?}: {} components",
        netlist.title,
        netlist.components.len()
    );

    let circuit =
        Circuit::from_instances(netlist.components).context("building circuit graph")?;
    let formulator = EquationFormulator::new(&circuit);
    let (unknowns, matrix) = formulator
        .assemble_numeric()
        .context("formulating circuit equations")?;
    info!("assembled a {}x{} linear system", unknowns.len(), unknowns.len());

    let x = kirchhoff_solver::solve_augmented(&matrix).context("solving linear system")?;
    let solution = formulator
        .build_solution(&unknowns, &x)
        .context("deriving node/edge quantities from solved unknowns")?;

    if cli.json {
        let json = serde_json::json!({
            "node_potentials": solution.node_potentials,
            "edge_currents": solution.edge_currents,
            "edge_voltages": solution.edge_voltages,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        output::print_dc_solution(&circuit, &solution);
    }

    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new().filter_level(level).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve_netlist(source: &str) -> kirchhoff_circuit::CircuitSolution {
        let registry = ComponentRegistry::new();
        let netlist = parse_netlist(source, &registry).unwrap();
        let circuit = Circuit::from_instances(netlist.components).unwrap();
        let formulator = EquationFormulator::new(&circuit);
        let (unknowns, matrix) = formulator.assemble_numeric().unwrap();
        let x = kirchhoff_solver::solve_augmented(&matrix).unwrap();
        formulator.build_solution(&unknowns, &x).unwrap()
    }

    #[test]
    fn single_resistor_across_voltage_source() {
        // S1: a single resistor loads a 10V source directly.
        let solution = solve_netlist("Source\nV1 a 0 10\nR1 a 0 1k\n");
        assert!((solution.node_potentials["a"] - 10.0).abs() < 1e-9);
        assert!((solution.edge_currents["V1"] - (-0.01)).abs() < 1e-9);
        assert!((solution.edge_currents["R1"] - 0.01).abs() < 1e-9);
        assert!((solution.edge_voltages["V1"] - 10.0).abs() < 1e-9);
        assert!((solution.edge_voltages["R1"] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn voltage_divider_end_to_end() {
        let solution = solve_netlist("Divider\nV1 a 0 6\nR1 a b 1k\nR2 b 0 2k\n");
        assert!((solution.node_potentials["a"] - 6.0).abs() < 1e-9);
        assert!((solution.node_potentials["b"] - 4.0).abs() < 1e-9);
        assert!((solution.node_potentials["0"] - 0.0).abs() < 1e-9);
        assert!((solution.edge_currents["R1"] - 0.002).abs() < 1e-9);
        assert!((solution.edge_currents["R2"] - 0.002).abs() < 1e-9);
    }

    #[test]
    fn parallel_resistors_with_current_source() {
        // S3: a 1A current source (pos at ground, neg at `a`) driving two
        // parallel 2ohm resistors; e_a settles at I * (R1 || R2) = 1V.
        let solution = solve_netlist("Parallel\nI1 0 a 1\nR1 a 0 2\nR2 a 0 2\n");
        assert!((solution.node_potentials["a"] - 1.0).abs() < 1e-9);
        assert!((solution.edge_currents["R1"] - 0.5).abs() < 1e-9);
        assert!((solution.edge_currents["R2"] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn behavioral_gain_source_end_to_end() {
        let solution =
            solve_netlist("Gain\nV1 a 0 3\nR1 a b 1k\nE1 c 0 vs=2*V(b)\nR2 c 0 1k\n");
        assert!((solution.node_potentials["b"] - 3.0).abs() < 1e-9);
        assert!((solution.node_potentials["c"] - 6.0).abs() < 1e-9);
    }
}
