//! Run command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use console::style;

use qutil_sim::{Counts, Simulator};
use qutilities::estimate_phase;

use super::circuit::CircuitCommand;
use super::common::{announce, print_counts};
use crate::config::{BuildFile, CircuitSpec, OutputFormat, Settings, layered};

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Number of shots
    #[arg(short, long)]
    pub shots: Option<u32>,

    /// Seed for reproducible sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Refuse circuits wider than this
    #[arg(long)]
    pub max_qubits: Option<usize>,

    /// Simulate every circuit in a build file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub circuit: Option<CircuitCommand>,
}

/// Execute the run command.
pub fn execute(args: &RunArgs, format: Option<OutputFormat>) -> Result<()> {
    let (specs, file_settings) = match (&args.circuit, &args.config) {
        (Some(_), Some(_)) => {
            anyhow::bail!("Give either a circuit subcommand or --config, not both")
        }
        (Some(command), None) => (vec![command.to_spec()], None),
        (None, Some(path)) => {
            let file = BuildFile::from_file(path)?;
            (file.circuits, Some(file.settings))
        }
        (None, None) => anyhow::bail!("Nothing to run: give a circuit subcommand or --config"),
    };

    let cli = Settings {
        output_format: format,
        shots: args.shots,
        seed: args.seed,
        max_qubits: args.max_qubits,
    };
    let settings = layered(file_settings.as_ref(), cli)?;

    let mut simulator = Simulator::new().with_max_qubits(settings.max_qubits);
    if let Some(seed) = settings.seed {
        simulator = simulator.with_seed(seed);
    }

    for spec in &specs {
        let circuit = spec
            .build()
            .with_context(|| format!("Failed to build {} circuit", spec.kind()))?;
        announce(&circuit);
        eprintln!(
            "{} Running {} ({} shots)",
            style("→").cyan().bold(),
            style(circuit.name()).green(),
            settings.shots
        );

        let counts = simulator
            .run(&circuit, settings.shots)
            .with_context(|| format!("Simulation of {} failed", circuit.name()))?;

        if settings.output_format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&counts)?);
        } else {
            print_counts(&counts);
            if let CircuitSpec::Qpe(config) = spec {
                if let Some(phase) = phase_estimate(&counts, config.num_counting_qubits) {
                    println!("\n  Estimated phase: {}", style(format!("{phase:.6}")).yellow());
                }
            }
        }
    }

    Ok(())
}

/// Phase read from the most frequent outcome of a measured QPE circuit.
fn phase_estimate(counts: &Counts, num_counting_qubits: u32) -> Option<f64> {
    let (bitstring, _) = counts.most_frequent()?;
    let width = usize::try_from(num_counting_qubits).ok()?;
    if bitstring.len() != width {
        return None;
    }
    let reading = u64::from_str_radix(bitstring, 2).ok()?;
    Some(estimate_phase(reading, num_counting_qubits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_estimate_from_counts() {
        let mut counts = Counts::new();
        counts.insert("110", 90);
        counts.insert("010", 10);
        let phase = phase_estimate(&counts, 3).unwrap();
        assert!((phase - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_phase_estimate_needs_counting_width() {
        let mut counts = Counts::new();
        counts.insert("1101", 5);
        assert!(phase_estimate(&counts, 3).is_none());
        assert!(phase_estimate(&Counts::new(), 3).is_none());
    }
}
