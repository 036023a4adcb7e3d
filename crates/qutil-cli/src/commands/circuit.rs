//! Circuit subcommands shared by the top level and `run`.

use clap::{Args, Subcommand, ValueEnum};

use qutilities::{AdderConfig, MultiplierConfig, MultiplierStrategy, QftConfig, QpeConfig};

use crate::config::CircuitSpec;

/// A single circuit described on the command line.
#[derive(Subcommand, Debug, Clone)]
pub enum CircuitCommand {
    /// Quantum Fourier transform
    Qft(QftArgs),

    /// Phase estimation of P(2πφ) on |1⟩
    Qpe(QpeArgs),

    /// Draper QFT adder: A ← A ± B
    Add(AddArgs),

    /// QFT multiplier: Y ← Y ± M·N
    Mul(MulArgs),
}

/// Flags every builder accepts.
#[derive(Args, Debug, Clone, Default)]
pub struct BuilderArgs {
    /// Insert barriers between stages
    #[arg(long)]
    pub barriers: bool,

    /// Circuit name
    #[arg(long)]
    pub label: Option<String>,

    /// Log a text drawing of the circuit (needs -v)
    #[arg(long)]
    pub debug: bool,
}

#[derive(Args, Debug, Clone)]
pub struct QftArgs {
    /// Number of qubits
    #[arg(short, long)]
    pub num_qubits: u32,

    /// Build the inverse transform
    #[arg(long)]
    pub inverse: bool,

    /// Leave out the final qubit reversal
    #[arg(long)]
    pub no_swaps: bool,

    /// Drop rotations this many steps below the smallest angle
    #[arg(short, long, default_value = "0")]
    pub approximation_degree: u32,

    #[command(flatten)]
    pub builder: BuilderArgs,
}

#[derive(Args, Debug, Clone)]
pub struct QpeArgs {
    /// Number of counting qubits
    #[arg(short, long)]
    pub num_counting_qubits: u32,

    /// Eigenphase in [0, 1)
    #[arg(short, long)]
    pub phase: f64,

    /// Leave out the final measurement
    #[arg(long)]
    pub no_measure: bool,

    /// Approximation degree of the inverse QFT
    #[arg(short, long, default_value = "0")]
    pub approximation_degree: u32,

    #[command(flatten)]
    pub builder: BuilderArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Width of B (A gets one more qubit)
    #[arg(short, long)]
    pub num_qubits: u32,

    /// Compute A - B
    #[arg(long)]
    pub subtract: bool,

    /// Assume A is already in the Fourier basis
    #[arg(long)]
    pub skip_qft: bool,

    /// Add 2^k · B
    #[arg(long, default_value = "0")]
    pub scale_exponent: u32,

    #[command(flatten)]
    pub builder: BuilderArgs,
}

/// How the multiplier adds each partial product.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StrategyArg {
    /// 2^i controlled additions for bit i
    #[default]
    Repeated,
    /// One shifted controlled addition per bit
    Weighted,
}

impl From<StrategyArg> for MultiplierStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Repeated => MultiplierStrategy::RepeatedAddition,
            StrategyArg::Weighted => MultiplierStrategy::WeightedAddition,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct MulArgs {
    /// Width of the multiplicand M
    #[arg(short, long)]
    pub multiplicand_qubits: u32,

    /// Width of the multiplier N
    #[arg(short = 'n', long)]
    pub multiplier_qubits: u32,

    /// Width of the product register Y (default |M| + |N|)
    #[arg(short, long)]
    pub target_qubits: Option<u32>,

    /// Subtract the product instead
    #[arg(long)]
    pub inverse: bool,

    /// Assume Y is already in the Fourier basis
    #[arg(long)]
    pub skip_qft: bool,

    #[arg(long, value_enum, default_value_t)]
    pub strategy: StrategyArg,

    #[command(flatten)]
    pub builder: BuilderArgs,
}

impl CircuitCommand {
    /// The equivalent build-file entry.
    pub fn to_spec(&self) -> CircuitSpec {
        match self {
            CircuitCommand::Qft(args) => CircuitSpec::Qft(QftConfig {
                num_qubits: args.num_qubits,
                approximation_degree: args.approximation_degree,
                inverse: args.inverse,
                do_swaps: !args.no_swaps,
                insert_barrier: args.builder.barriers,
                debug: args.builder.debug,
                label: args.builder.label.clone(),
            }),
            CircuitCommand::Qpe(args) => CircuitSpec::Qpe(QpeConfig {
                num_counting_qubits: args.num_counting_qubits,
                phase: args.phase,
                measure: !args.no_measure,
                insert_barrier: args.builder.barriers,
                approximation_degree: args.approximation_degree,
                debug: args.builder.debug,
                label: args.builder.label.clone(),
            }),
            CircuitCommand::Add(args) => CircuitSpec::Adder(AdderConfig {
                num_qubits: args.num_qubits,
                subtract: args.subtract,
                skip_qft: args.skip_qft,
                scale_exponent: args.scale_exponent,
                insert_barrier: args.builder.barriers,
                debug: args.builder.debug,
                label: args.builder.label.clone(),
            }),
            CircuitCommand::Mul(args) => CircuitSpec::Multiplier(MultiplierConfig {
                multiplicand_qubits: args.multiplicand_qubits,
                multiplier_qubits: args.multiplier_qubits,
                target_qubits: args.target_qubits,
                inverse: args.inverse,
                skip_qft: args.skip_qft,
                insert_barrier: args.builder.barriers,
                debug: args.builder.debug,
                label: args.builder.label.clone(),
                strategy: args.strategy.into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(subcommand)]
        circuit: CircuitCommand,
    }

    fn spec(args: &[&str]) -> CircuitSpec {
        let argv = std::iter::once("qutil").chain(args.iter().copied());
        Harness::try_parse_from(argv).unwrap().circuit.to_spec()
    }

    #[test]
    fn test_qft_flags() {
        let CircuitSpec::Qft(config) = spec(&["qft", "-n", "5", "--inverse", "--no-swaps", "-a", "2"])
        else {
            panic!("expected qft");
        };
        assert_eq!(config.num_qubits, 5);
        assert!(config.inverse);
        assert!(!config.do_swaps);
        assert_eq!(config.approximation_degree, 2);
    }

    #[test]
    fn test_qpe_flags() {
        let CircuitSpec::Qpe(config) = spec(&["qpe", "-n", "4", "--phase", "0.375", "--no-measure"])
        else {
            panic!("expected qpe");
        };
        assert_eq!(config.num_counting_qubits, 4);
        assert!((config.phase - 0.375).abs() < 1e-12);
        assert!(!config.measure);
    }

    #[test]
    fn test_add_flags() {
        let CircuitSpec::Adder(config) =
            spec(&["add", "-n", "3", "--subtract", "--barriers", "--label", "sub3"])
        else {
            panic!("expected adder");
        };
        assert!(config.subtract);
        assert!(config.insert_barrier);
        assert_eq!(config.label.as_deref(), Some("sub3"));
    }

    #[test]
    fn test_mul_flags() {
        let CircuitSpec::Multiplier(config) =
            spec(&["mul", "-m", "2", "-n", "3", "-t", "6", "--strategy", "weighted"])
        else {
            panic!("expected multiplier");
        };
        assert_eq!(config.multiplicand_qubits, 2);
        assert_eq!(config.multiplier_qubits, 3);
        assert_eq!(config.target_qubits, Some(6));
        assert_eq!(config.strategy, MultiplierStrategy::WeightedAddition);
    }

    #[test]
    fn test_missing_width_rejected() {
        assert!(Harness::try_parse_from(["qutil", "qft"]).is_err());
        assert!(Harness::try_parse_from(["qutil", "qpe", "-n", "3"]).is_err());
    }
}
