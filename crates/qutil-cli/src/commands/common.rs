//! Shared helpers for CLI commands.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;

use qutil_ir::Circuit;
use qutil_ir::circuit::sanitize_identifier;
use qutil_ir::draw;
use qutil_qasm3::emit;
use qutil_sim::Counts;

use crate::config::OutputFormat;

/// Render a circuit in the requested format.
pub fn render(circuit: &Circuit, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Qasm => emit(circuit).map_err(|e| anyhow::anyhow!("Emit error: {e}")),
        OutputFormat::Json => circuit
            .to_json()
            .map_err(|e| anyhow::anyhow!("Serialization error: {e}")),
        OutputFormat::Text => Ok(draw::text(circuit)),
        OutputFormat::Stats => Ok(stats(circuit)),
    }
}

/// Summary of a circuit's size and gate usage.
pub fn stats(circuit: &Circuit) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "name:   {}", circuit.name());
    let _ = writeln!(out, "qubits: {}", circuit.num_qubits());
    let _ = writeln!(out, "clbits: {}", circuit.num_clbits());
    let _ = writeln!(out, "depth:  {}", circuit.depth());
    let _ = writeln!(out, "size:   {}", circuit.size());
    let _ = writeln!(out, "ops:");
    for (name, count) in circuit.count_ops() {
        let _ = writeln!(out, "  {name}: {count}");
    }
    out
}

/// File name for the `index`-th circuit written into a directory.
pub fn output_file_name(index: usize, circuit: &Circuit, format: OutputFormat) -> PathBuf {
    PathBuf::from(format!(
        "{index:02}_{}.{}",
        sanitize_identifier(circuit.name()),
        format.extension()
    ))
}

/// Print to stdout, or write to `path`.
pub fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
            eprintln!("  Output: {}", style(path.display()).green());
        }
        None => {
            print!("{content}");
            if !content.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

/// One-line description of a freshly built circuit.
pub fn announce(circuit: &Circuit) {
    eprintln!(
        "{} Built {}: {} qubits, depth {}, {} ops",
        style("✓").green().bold(),
        style(circuit.name()).cyan(),
        circuit.num_qubits(),
        circuit.depth(),
        circuit.size()
    );
}

/// Print measurement counts as a table, most frequent first.
pub fn print_counts(counts: &Counts) {
    println!(
        "\n{} Results ({} shots):",
        style("✓").green().bold(),
        counts.total()
    );

    let mut sorted: Vec<(&str, u64)> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    #[allow(clippy::cast_precision_loss)]
    let total = counts.total() as f64;

    for (bitstring, count) in sorted.iter().take(16) {
        #[allow(clippy::cast_precision_loss)]
        let prob = *count as f64 / total * 100.0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bar_len = (prob / 2.0).round() as usize;
        let bar: String = "█".repeat(bar_len);

        println!(
            "  {}: {:>6} ({:>5.2}%) {}",
            style(bitstring).cyan(),
            count,
            prob,
            style(bar).green()
        );
    }

    if sorted.len() > 16 {
        println!("  ... and {} more outcomes", sorted.len() - 16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qutilities::QFTAdder;

    #[test]
    fn test_stats_lists_ops() {
        let circuit = QFTAdder::new(2).build().unwrap();
        let text = stats(&circuit);
        assert!(text.contains("qubits: 5"));
        assert!(text.contains("  cp: 5"));
        assert!(text.contains("  qft: 1"));
    }

    #[test]
    fn test_render_formats() {
        let circuit = QFTAdder::new(1).build().unwrap();
        assert!(render(&circuit, OutputFormat::Qasm).unwrap().starts_with("OPENQASM 3.0;"));
        let json: serde_json::Value =
            serde_json::from_str(&render(&circuit, OutputFormat::Json).unwrap()).unwrap();
        assert!(json.is_array());
        assert!(!render(&circuit, OutputFormat::Text).unwrap().is_empty());
    }

    #[test]
    fn test_output_file_name_sanitized() {
        let circuit = QFTAdder::new(1).build().unwrap();
        let name = output_file_name(3, &circuit, OutputFormat::Qasm);
        let name = name.to_string_lossy();
        assert!(name.starts_with("03_"));
        assert!(name.ends_with(".qasm"));
        assert!(!name.contains('|'));
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_output("hello", Some(&path)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }
}
