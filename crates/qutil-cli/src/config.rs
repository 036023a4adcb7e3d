//! Build files and run settings.
//!
//! A build file (YAML or JSON) lists the circuits to build plus optional
//! settings. Settings are layered with the following precedence (highest to
//! lowest):
//! 1. Command-line flags
//! 2. Environment variables (with QUTIL_ prefix)
//! 3. Build file
//! 4. Default values

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::warn;

use qutil_ir::Circuit;
use qutil_sim::{DEFAULT_MAX_QUBITS, MAX_SUPPORTED_QUBITS};
use qutilities::{
    AdderConfig, MultiplierConfig, QFT, QFTAdder, QFTMultiplier, QPE, QftConfig, QpeConfig,
    QutilResult,
};

/// Shots per run when nothing else is configured.
pub const DEFAULT_SHOTS: u32 = 1024;

/// How a built circuit is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// OpenQASM 3 source
    #[default]
    Qasm,
    /// JSON instruction list
    Json,
    /// Text drawing
    Text,
    /// Qubits, depth and gate counts
    Stats,
}

impl OutputFormat {
    /// File extension used when writing to a directory.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Qasm => "qasm",
            OutputFormat::Json => "json",
            OutputFormat::Text | OutputFormat::Stats => "txt",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Qasm => "qasm",
            OutputFormat::Json => "json",
            OutputFormat::Text => "text",
            OutputFormat::Stats => "stats",
        };
        f.write_str(name)
    }
}

/// One circuit in a build file, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CircuitSpec {
    Qft(QftConfig),
    Qpe(QpeConfig),
    Adder(AdderConfig),
    Multiplier(MultiplierConfig),
}

impl CircuitSpec {
    /// Run the matching builder.
    pub fn build(&self) -> QutilResult<Circuit> {
        match self {
            CircuitSpec::Qft(config) => QFT::from_config(config.clone()).build(),
            CircuitSpec::Qpe(config) => QPE::from_config(config).build(),
            CircuitSpec::Adder(config) => QFTAdder::from_config(config.clone()).build(),
            CircuitSpec::Multiplier(config) => QFTMultiplier::from_config(config)?.build(),
        }
    }

    /// Short name for progress messages.
    pub fn kind(&self) -> &'static str {
        match self {
            CircuitSpec::Qft(_) => "qft",
            CircuitSpec::Qpe(_) => "qpe",
            CircuitSpec::Adder(_) => "adder",
            CircuitSpec::Multiplier(_) => "multiplier",
        }
    }
}

/// Partially specified settings from one layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub output_format: Option<OutputFormat>,
    pub shots: Option<u32>,
    pub seed: Option<u64>,
    pub max_qubits: Option<usize>,
}

impl Settings {
    /// Settings read through `lookup` (normally `std::env::var`).
    ///
    /// Unparsable values are logged and skipped.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Option<T> {
            let raw = raw?;
            match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring {key}={raw}: not a valid value");
                    None
                }
            }
        }

        let output_format = lookup("QUTIL_OUTPUT_FORMAT").and_then(|raw| {
            match OutputFormat::from_str(raw.trim(), true) {
                Ok(format) => Some(format),
                Err(_) => {
                    warn!("Ignoring QUTIL_OUTPUT_FORMAT={raw}: expected qasm, json, text or stats");
                    None
                }
            }
        });

        Self {
            output_format,
            shots: parsed("QUTIL_SHOTS", lookup("QUTIL_SHOTS")),
            seed: parsed("QUTIL_SEED", lookup("QUTIL_SEED")),
            max_qubits: parsed("QUTIL_MAX_QUBITS", lookup("QUTIL_MAX_QUBITS")),
        }
    }

    /// Settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Layer `higher` on top of `self`; values set in `higher` win.
    #[must_use]
    pub fn overridden_by(self, higher: Settings) -> Self {
        Self {
            output_format: higher.output_format.or(self.output_format),
            shots: higher.shots.or(self.shots),
            seed: higher.seed.or(self.seed),
            max_qubits: higher.max_qubits.or(self.max_qubits),
        }
    }

    /// Fill the gaps with defaults.
    pub fn resolve(self) -> Result<Resolved> {
        let resolved = Resolved {
            output_format: self.output_format.unwrap_or_default(),
            shots: self.shots.unwrap_or(DEFAULT_SHOTS),
            seed: self.seed,
            max_qubits: self.max_qubits.unwrap_or(DEFAULT_MAX_QUBITS),
        };
        if resolved.shots == 0 {
            anyhow::bail!("shots must be greater than 0");
        }
        if resolved.max_qubits == 0 {
            anyhow::bail!("max_qubits must be greater than 0");
        }
        if resolved.max_qubits > MAX_SUPPORTED_QUBITS {
            anyhow::bail!(
                "max_qubits is {}, the simulator supports at most {MAX_SUPPORTED_QUBITS}",
                resolved.max_qubits
            );
        }
        Ok(resolved)
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub output_format: OutputFormat,
    pub shots: u32,
    pub seed: Option<u64>,
    pub max_qubits: usize,
}

/// Contents of a build file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildFile {
    /// Circuits to build, in order.
    pub circuits: Vec<CircuitSpec>,
    /// File-level settings.
    #[serde(flatten)]
    pub settings: Settings,
}

impl BuildFile {
    /// Load a build file; `.json` is parsed as JSON, anything else as YAML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read build file: {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let file: BuildFile = if is_json {
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid JSON build file: {}", path.display()))?
        } else {
            serde_yaml_ng::from_str(&contents)
                .with_context(|| format!("Invalid YAML build file: {}", path.display()))?
        };

        if file.circuits.is_empty() {
            anyhow::bail!("Build file {} lists no circuits", path.display());
        }
        Ok(file)
    }
}

/// Resolve settings from file, environment and command line.
pub fn layered(file: Option<&Settings>, cli: Settings) -> Result<Resolved> {
    file.cloned()
        .unwrap_or_default()
        .overridden_by(Settings::from_env())
        .overridden_by(cli)
        .resolve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let resolved = Settings::default().resolve().unwrap();
        assert_eq!(resolved.output_format, OutputFormat::Qasm);
        assert_eq!(resolved.shots, DEFAULT_SHOTS);
        assert_eq!(resolved.seed, None);
        assert_eq!(resolved.max_qubits, DEFAULT_MAX_QUBITS);
    }

    #[test]
    fn test_env_values() {
        let settings = Settings::from_env_with(env(&[
            ("QUTIL_OUTPUT_FORMAT", "Stats"),
            ("QUTIL_SHOTS", "50"),
            ("QUTIL_SEED", "7"),
            ("QUTIL_MAX_QUBITS", "12"),
        ]));
        assert_eq!(settings.output_format, Some(OutputFormat::Stats));
        assert_eq!(settings.shots, Some(50));
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.max_qubits, Some(12));
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let settings = Settings::from_env_with(env(&[
            ("QUTIL_OUTPUT_FORMAT", "pdf"),
            ("QUTIL_SHOTS", "many"),
        ]));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_precedence() {
        let file = Settings {
            output_format: Some(OutputFormat::Json),
            shots: Some(10),
            seed: Some(1),
            max_qubits: None,
        };
        let env_layer = Settings::from_env_with(env(&[("QUTIL_SHOTS", "20"), ("QUTIL_SEED", "2")]));
        let cli = Settings {
            seed: Some(3),
            ..Settings::default()
        };
        let resolved = file
            .overridden_by(env_layer)
            .overridden_by(cli)
            .resolve()
            .unwrap();
        assert_eq!(resolved.output_format, OutputFormat::Json);
        assert_eq!(resolved.shots, 20);
        assert_eq!(resolved.seed, Some(3));
        assert_eq!(resolved.max_qubits, DEFAULT_MAX_QUBITS);
    }

    #[test]
    fn test_zero_shots_rejected() {
        let settings = Settings {
            shots: Some(0),
            ..Settings::default()
        };
        assert!(settings.resolve().is_err());
    }

    #[test]
    fn test_max_qubits_bounds() {
        let oversized = Settings {
            max_qubits: Some(MAX_SUPPORTED_QUBITS + 1),
            ..Settings::default()
        };
        assert!(oversized.resolve().is_err());

        let widest = Settings {
            max_qubits: Some(MAX_SUPPORTED_QUBITS),
            ..Settings::default()
        };
        assert_eq!(widest.resolve().unwrap().max_qubits, MAX_SUPPORTED_QUBITS);
    }

    #[test]
    fn test_yaml_build_file() {
        let yaml = r"
output_format: stats
shots: 256
circuits:
  - kind: qft
    num_qubits: 3
    inverse: true
  - kind: qpe
    num_counting_qubits: 3
    phase: 0.25
  - kind: adder
    num_qubits: 2
  - kind: multiplier
    multiplicand_qubits: 2
    multiplier_qubits: 1
    strategy: weighted_addition
";
        let file: BuildFile = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(file.circuits.len(), 4);
        assert_eq!(file.settings.output_format, Some(OutputFormat::Stats));
        assert_eq!(file.settings.shots, Some(256));

        let kinds: Vec<&str> = file.circuits.iter().map(CircuitSpec::kind).collect();
        assert_eq!(kinds, vec!["qft", "qpe", "adder", "multiplier"]);
        let names: Vec<String> = file
            .circuits
            .iter()
            .map(|spec| spec.build().unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["IQFT", "QPE", "|A+B⟩", "|M×N⟩"]);
    }

    #[test]
    fn test_json_build_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("circuits.json");
        std::fs::write(
            &path,
            r#"{"circuits": [{"kind": "qft", "num_qubits": 2}], "seed": 9}"#,
        )
        .unwrap();
        let file = BuildFile::from_file(&path).unwrap();
        assert_eq!(file.settings.seed, Some(9));
        assert_eq!(file.circuits[0], CircuitSpec::Qft(QftConfig::new(2)));
    }

    #[test]
    fn test_empty_build_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yaml");
        std::fs::write(&path, "circuits: []\n").unwrap();
        let err = BuildFile::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("no circuits"));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result: std::result::Result<BuildFile, _> =
            serde_yaml_ng::from_str("circuits:\n  - kind: grover\n    num_qubits: 3\n");
        assert!(result.is_err());
    }
}
