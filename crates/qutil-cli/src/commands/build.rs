//! Build commands: one circuit from flags, or every circuit in a build file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use tracing::debug;

use qutil_ir::Circuit;

use super::circuit::CircuitCommand;
use super::common::{announce, output_file_name, render, write_output};
use crate::config::{BuildFile, CircuitSpec, Settings, layered};

fn build_spec(spec: &CircuitSpec) -> Result<Circuit> {
    debug!("Building {spec:?}");
    spec.build()
        .with_context(|| format!("Failed to build {} circuit", spec.kind()))
}

/// Build the circuit described by a subcommand and print or save it.
pub fn execute_single(command: &CircuitCommand, cli: Settings, output: Option<&Path>) -> Result<()> {
    let settings = layered(None, cli)?;
    let circuit = build_spec(&command.to_spec())?;
    announce(&circuit);

    let content = render(&circuit, settings.output_format)?;
    write_output(&content, output)
}

/// Build every circuit in `config`.
///
/// With an output directory each circuit goes to its own file; otherwise they
/// are printed one after another.
pub fn execute_file(config: &Path, cli: Settings, output: Option<&Path>) -> Result<()> {
    eprintln!(
        "{} Building circuits from {}",
        style("→").cyan().bold(),
        style(config.display()).green()
    );

    let file = BuildFile::from_file(config)?;
    let settings = layered(Some(&file.settings), cli)?;

    if let Some(dir) = output {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    }

    for (index, spec) in file.circuits.iter().enumerate() {
        let circuit = build_spec(spec)?;
        announce(&circuit);
        let content = render(&circuit, settings.output_format)?;
        match output {
            Some(dir) => {
                let path = dir.join(output_file_name(index, &circuit, settings.output_format));
                write_output(&content, Some(&path))?;
            }
            None => {
                if index > 0 {
                    println!();
                }
                write_output(&content, None)?;
            }
        }
    }

    eprintln!(
        "{} Built {} circuit(s) as {}",
        style("✓").green().bold(),
        file.circuits.len(),
        settings.output_format
    );
    Ok(())
}
