//! QFT multiplier.
//!
//! `|Y⟩|M⟩|N⟩ → |Y ± M·N mod 2^{|Y|}⟩|M⟩|N⟩`. `Y` is moved to the Fourier basis
//! once; each bit `N[i]` then controls the addition of `2^i·M`, and an inverse
//! QFT brings `Y` back. Inputs may be in superposition.

use serde::{Deserialize, Serialize};
use std::iter;
use tracing::debug;

use qutil_ir::{Circuit, Gate, QuantumRegister, QubitId};

use crate::arithmetic::adder::QFTAdder;
use crate::display::{barrier, debug_render};
use crate::error::{QutilError, QutilResult};
use crate::qft::{QFTGate, QftConfig};

/// Widest multiplier register [`MultiplierStrategy::RepeatedAddition`] accepts.
pub const MAX_REPEATED_ADDITION_QUBITS: u32 = 16;

/// How the `2^i·M` contribution of each multiplier bit is added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplierStrategy {
    /// Append one controlled adder `2^i` times for bit `i`; at most
    /// [`MAX_REPEATED_ADDITION_QUBITS`] multiplier bits.
    #[default]
    RepeatedAddition,
    /// Append one controlled adder per bit, with rotations shifted by `i`.
    WeightedAddition,
}

/// Parameters of a [`QFTMultiplier`] over fresh registers `Y`, `M`, `N`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiplierConfig {
    /// Width of the multiplicand `M`.
    pub multiplicand_qubits: u32,
    /// Width of the multiplier `N`.
    pub multiplier_qubits: u32,
    /// Width of the target `Y`; defaults to `|M| + |N|`.
    pub target_qubits: Option<u32>,
    /// Subtract the product instead of adding it.
    pub inverse: bool,
    /// `Y` is already in the Fourier basis; leave it there.
    pub skip_qft: bool,
    /// Barrier after the QFT and after each multiplier bit.
    pub insert_barrier: bool,
    /// Log a drawing of the built circuit.
    pub debug: bool,
    /// Circuit name; defaults to `|M×N⟩` or `|M÷N⟩`.
    pub label: Option<String>,
    /// Controlled-addition layout.
    pub strategy: MultiplierStrategy,
}

/// QFT-based multiplier accumulating `M × N` into `Y`.
///
/// ```rust
/// use qutil_ir::QuantumRegister;
/// use qutilities::QFTMultiplier;
///
/// let m = QuantumRegister::new("M", 2).unwrap();
/// let n = QuantumRegister::new("N", 2).unwrap();
/// let circuit = QFTMultiplier::new(m, n).build().unwrap();
/// assert_eq!(circuit.qreg("Y").map(<[_]>::len), Some(4));
/// assert_eq!(circuit.count_ops()["c1_draper_add"], 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QFTMultiplier {
    multiplicand: QuantumRegister,
    multiplier: QuantumRegister,
    target: Option<QuantumRegister>,
    inverse: bool,
    skip_qft: bool,
    insert_barrier: bool,
    debug: bool,
    label: Option<String>,
    strategy: MultiplierStrategy,
}

impl QFTMultiplier {
    /// Multiplier of `multiplicand` by `multiplier`.
    pub fn new(multiplicand: QuantumRegister, multiplier: QuantumRegister) -> Self {
        Self {
            multiplicand,
            multiplier,
            target: None,
            inverse: false,
            skip_qft: false,
            insert_barrier: false,
            debug: false,
            label: None,
            strategy: MultiplierStrategy::default(),
        }
    }

    /// Multiplier over fresh registers `M`, `N` and optionally `Y`.
    pub fn from_config(config: &MultiplierConfig) -> QutilResult<Self> {
        if config.multiplicand_qubits == 0 || config.multiplier_qubits == 0 {
            return Err(QutilError::ZeroQubits {
                builder: "QFTMultiplier",
            });
        }
        let mut multiplier = Self::new(
            QuantumRegister::new("M", config.multiplicand_qubits)?,
            QuantumRegister::new("N", config.multiplier_qubits)?,
        )
        .inverse(config.inverse)
        .skip_qft(config.skip_qft)
        .insert_barrier(config.insert_barrier)
        .debug(config.debug)
        .strategy(config.strategy);
        multiplier.label.clone_from(&config.label);
        if let Some(width) = config.target_qubits {
            multiplier = multiplier.target(QuantumRegister::new("Y", width)?);
        }
        Ok(multiplier)
    }

    /// Accumulate into an existing register of at least `|M| + |N|` qubits.
    #[must_use]
    pub fn target(mut self, target: QuantumRegister) -> Self {
        self.target = Some(target);
        self
    }

    /// Subtract the product instead of adding it.
    #[must_use]
    pub fn inverse(mut self, inverse: bool) -> Self {
        self.inverse = inverse;
        self
    }

    /// Assume `Y` is already in the Fourier basis.
    #[must_use]
    pub fn skip_qft(mut self, skip_qft: bool) -> Self {
        self.skip_qft = skip_qft;
        self
    }

    /// Toggle barriers between blocks.
    #[must_use]
    pub fn insert_barrier(mut self, insert_barrier: bool) -> Self {
        self.insert_barrier = insert_barrier;
        self
    }

    /// Log a drawing of the circuit after building.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Override the circuit label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Choose the controlled-addition layout.
    #[must_use]
    pub fn strategy(mut self, strategy: MultiplierStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    fn resolved_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| {
            if self.inverse { "|M÷N⟩" } else { "|M×N⟩" }.to_string()
        })
    }

    fn target_register(&self) -> QutilResult<QuantumRegister> {
        let required = self.multiplicand.size() + self.multiplier.size();
        match &self.target {
            Some(target) if target.size() < required => Err(QutilError::TargetTooSmall {
                required,
                got: target.size(),
            }),
            Some(target) => Ok(target.clone()),
            None => Ok(QuantumRegister::new("Y", required)?),
        }
    }

    /// `Y ± 2^shift·M` in the Fourier basis, controlled by one qubit.
    fn controlled_adder(&self, target: &QuantumRegister, shift: u32) -> QutilResult<Gate> {
        let adder = QFTAdder::on_registers(target.clone(), self.multiplicand.clone())
            .subtract(self.inverse)
            .skip_qft(true)
            .scale_exponent(shift)
            .build_gate()?;
        Ok(adder.control(1))
    }

    /// Assemble the circuit over `Y`, `M`, `N`.
    pub fn build(&self) -> QutilResult<Circuit> {
        let target = self.target_register()?;
        if self.strategy == MultiplierStrategy::RepeatedAddition
            && self.multiplier.size() > MAX_REPEATED_ADDITION_QUBITS
        {
            return Err(QutilError::MultiplierTooWide {
                got: self.multiplier.size(),
                max: MAX_REPEATED_ADDITION_QUBITS,
            });
        }
        let mut circuit = Circuit::new(self.resolved_label());
        let y = circuit.add_register(&target)?;
        let m = circuit.add_register(&self.multiplicand)?;
        let n = circuit.add_register(&self.multiplier)?;

        let fourier = QftConfig {
            do_swaps: false,
            ..QftConfig::new(target.size())
        };
        if !self.skip_qft {
            let qft = QFTGate::from_config(fourier.clone()).build()?;
            circuit.append(&qft, y.iter().copied())?;
            barrier(&mut circuit, self.insert_barrier)?;
        }

        let operands = |control: QubitId| {
            iter::once(control)
                .chain(y.iter().copied())
                .chain(m.iter().copied())
        };
        match self.strategy {
            MultiplierStrategy::RepeatedAddition => {
                let add = self.controlled_adder(&target, 0)?;
                for (i, &control) in n.iter().enumerate() {
                    for _ in 0..1u32 << i {
                        circuit.append(&add, operands(control))?;
                    }
                    barrier(&mut circuit, self.insert_barrier)?;
                }
            }
            MultiplierStrategy::WeightedAddition => {
                for (shift, &control) in (0u32..).zip(n.iter()) {
                    let add = self.controlled_adder(&target, shift)?;
                    circuit.append(&add, operands(control))?;
                    barrier(&mut circuit, self.insert_barrier)?;
                }
            }
        }

        if !self.skip_qft {
            let iqft = QFTGate::from_config(QftConfig {
                inverse: true,
                ..fourier
            })
            .build()?;
            circuit.append(&iqft, y.iter().copied())?;
        }

        debug!(
            "Built {} ({:?}): |Y| = {}, |M| = {}, |N| = {}, {} ops",
            circuit.name(),
            self.strategy,
            target.size(),
            self.multiplicand.size(),
            self.multiplier.size(),
            circuit.size()
        );
        debug_render(&circuit, self.debug);
        Ok(circuit)
    }

    /// Assemble the circuit and freeze it into a gate over `Y ++ M ++ N`.
    pub fn build_gate(&self) -> QutilResult<Gate> {
        let name = if self.inverse { "qft_mul_dg" } else { "qft_mul" };
        Ok(self.build()?.to_gate_named(name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qutil_ir::IrError;

    fn regs(m: u32, n: u32) -> (QuantumRegister, QuantumRegister) {
        (
            QuantumRegister::new("M", m).unwrap(),
            QuantumRegister::new("N", n).unwrap(),
        )
    }

    #[test]
    fn test_repeated_addition_counts() {
        let (m, n) = regs(2, 3);
        let circuit = QFTMultiplier::new(m, n).build().unwrap();
        let ops = circuit.count_ops();
        // 1 + 2 + 4 controlled additions.
        assert_eq!(ops["c1_draper_add"], 7);
        assert_eq!(ops["qft"], 1);
        assert_eq!(ops["iqft"], 1);
        assert_eq!(circuit.num_qubits(), 10);
        assert_eq!(circuit.name(), "|M×N⟩");
    }

    #[test]
    fn test_weighted_addition_counts() {
        let (m, n) = regs(2, 3);
        let circuit = QFTMultiplier::new(m, n)
            .strategy(MultiplierStrategy::WeightedAddition)
            .build()
            .unwrap();
        let ops = circuit.count_ops();
        assert_eq!(ops["c1_draper_add"], 1);
        assert_eq!(ops["c1_draper_add_shl1"], 1);
        assert_eq!(ops["c1_draper_add_shl2"], 1);
    }

    #[test]
    fn test_inverse_label_and_subtraction() {
        let (m, n) = regs(1, 1);
        let circuit = QFTMultiplier::new(m, n).inverse(true).build().unwrap();
        assert_eq!(circuit.name(), "|M÷N⟩");
        assert_eq!(circuit.count_ops()["c1_draper_sub"], 1);
    }

    #[test]
    fn test_register_order_and_controls() {
        let (m, n) = regs(1, 2);
        let circuit = QFTMultiplier::new(m, n).skip_qft(true).build().unwrap();
        let first = circuit.instructions()[0];
        // N[0], then Y[0..3], then M[0].
        let expected: Vec<_> = [4, 0, 1, 2, 3].into_iter().map(QubitId).collect();
        assert_eq!(first.qubits, expected);
    }

    #[test]
    fn test_target_validation() {
        let (m, n) = regs(2, 2);
        let small = QuantumRegister::new("Y", 3).unwrap();
        assert!(matches!(
            QFTMultiplier::new(m.clone(), n.clone()).target(small).build(),
            Err(QutilError::TargetTooSmall { required: 4, got: 3 })
        ));

        let wide = QuantumRegister::new("acc", 6).unwrap();
        let circuit = QFTMultiplier::new(m.clone(), n.clone()).target(wide).build().unwrap();
        assert_eq!(circuit.qreg("acc").map(<[_]>::len), Some(6));

        let clash = QuantumRegister::new("M", 4).unwrap();
        assert!(matches!(
            QFTMultiplier::new(m, n).target(clash).build(),
            Err(QutilError::Ir(IrError::DuplicateRegister(_)))
        ));
    }

    #[test]
    fn test_repeated_addition_width_limit() {
        let (m, n) = regs(1, MAX_REPEATED_ADDITION_QUBITS + 1);
        assert!(matches!(
            QFTMultiplier::new(m.clone(), n.clone()).build(),
            Err(QutilError::MultiplierTooWide { got: 17, max: 16 })
        ));

        let circuit = QFTMultiplier::new(m, n)
            .strategy(MultiplierStrategy::WeightedAddition)
            .skip_qft(true)
            .build()
            .unwrap();
        assert_eq!(circuit.size(), 17);
    }

    #[test]
    fn test_barriers() {
        let (m, n) = regs(1, 2);
        let circuit = QFTMultiplier::new(m, n).insert_barrier(true).build().unwrap();
        assert_eq!(circuit.count_ops()["barrier"], 3);
    }

    #[test]
    fn test_from_config() {
        let config = MultiplierConfig {
            multiplicand_qubits: 2,
            multiplier_qubits: 1,
            target_qubits: Some(5),
            strategy: MultiplierStrategy::WeightedAddition,
            ..MultiplierConfig::default()
        };
        let circuit = QFTMultiplier::from_config(&config).unwrap().build().unwrap();
        assert_eq!(circuit.qreg("Y").map(<[_]>::len), Some(5));

        let zero = MultiplierConfig::default();
        assert!(matches!(
            QFTMultiplier::from_config(&zero),
            Err(QutilError::ZeroQubits { .. })
        ));
    }

    #[test]
    fn test_build_gate() {
        let (m, n) = regs(1, 1);
        let gate = QFTMultiplier::new(m, n).build_gate().unwrap();
        assert_eq!(gate.name(), "qft_mul");
        assert_eq!(gate.num_qubits(), 4);
    }
}
