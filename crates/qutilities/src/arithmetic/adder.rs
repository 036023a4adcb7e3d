//! Draper QFT adder.
//!
//! `A ← (A ± 2^k·B) mod 2^{|A|}` in place, with `B` unchanged. `A` is taken to
//! the Fourier basis with a swap-free QFT, where qubit `A[j]` carries the phase
//! `e^{2πi·a/2^{j+1}}`; adding `B[i]·2^{i+k}` to it is a controlled phase of
//! `π/2^{j-i-k}` from `B[i]` onto every `A[j]` with `j ≥ i + k`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use qutil_ir::{Circuit, Gate, QuantumRegister, QubitId};

use crate::display::{barrier, debug_render};
use crate::error::{QutilError, QutilResult};
use crate::qft::{QFTGate, QftConfig, phase_angle};

/// Parameters of a [`QFTAdder`] that owns its registers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdderConfig {
    /// Width of `B`; `A` gets one extra qubit for the carry.
    pub num_qubits: u32,
    /// Compute `A - B` instead of `A + B`.
    pub subtract: bool,
    /// `A` is already in the Fourier basis; leave it there.
    pub skip_qft: bool,
    /// Add `2^scale_exponent · B` instead of `B`.
    pub scale_exponent: u32,
    /// Barrier after the QFT and after each control qubit.
    pub insert_barrier: bool,
    /// Log a drawing of the built circuit.
    pub debug: bool,
    /// Circuit name; defaults to `|A+B⟩` or `|A-B⟩`.
    pub label: Option<String>,
}

impl AdderConfig {
    /// The explicit label or the default for the operation.
    pub fn resolved_label(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        let sign = if self.subtract { '-' } else { '+' };
        match self.scale_exponent {
            0 => format!("|A{sign}B⟩"),
            k => match 2u64.checked_pow(k) {
                Some(factor) => format!("|A{sign}{factor}B⟩"),
                None => format!("|A{sign}2^{k}B⟩"),
            },
        }
    }

    fn gate_name(&self) -> String {
        let op = if self.subtract { "sub" } else { "add" };
        match self.scale_exponent {
            0 => format!("draper_{op}"),
            k => format!("draper_{op}_shl{k}"),
        }
    }
}

/// In-place QFT adder (Draper, arXiv:quant-ph/0008033).
///
/// ```rust
/// use qutilities::QFTAdder;
///
/// let circuit = QFTAdder::new(3).build().unwrap();
/// assert_eq!(circuit.name(), "|A+B⟩");
/// assert_eq!(circuit.qreg("A").map(<[_]>::len), Some(4));
/// assert_eq!(circuit.qreg("B").map(<[_]>::len), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QFTAdder {
    config: AdderConfig,
    a: Option<QuantumRegister>,
    b: Option<QuantumRegister>,
}

impl QFTAdder {
    /// Adder with fresh registers `A` (`num_qubits + 1`) and `B` (`num_qubits`).
    pub fn new(num_qubits: u32) -> Self {
        Self::from_config(AdderConfig {
            num_qubits,
            ..AdderConfig::default()
        })
    }

    /// Adder acting on existing registers; `a` must be wider than `b`.
    pub fn on_registers(a: QuantumRegister, b: QuantumRegister) -> Self {
        Self::new(b.size()).register_a(a).register_b(b)
    }

    /// Builder from a full parameter set.
    pub fn from_config(config: AdderConfig) -> Self {
        Self {
            config,
            a: None,
            b: None,
        }
    }

    /// Inject the accumulator register.
    #[must_use]
    pub fn register_a(mut self, a: QuantumRegister) -> Self {
        self.a = Some(a);
        self
    }

    /// Inject the addend register.
    #[must_use]
    pub fn register_b(mut self, b: QuantumRegister) -> Self {
        self.b = Some(b);
        self
    }

    /// Subtract instead of add.
    #[must_use]
    pub fn subtract(mut self, subtract: bool) -> Self {
        self.config.subtract = subtract;
        self
    }

    /// Assume `A` is already in the Fourier basis.
    #[must_use]
    pub fn skip_qft(mut self, skip_qft: bool) -> Self {
        self.config.skip_qft = skip_qft;
        self
    }

    /// Add `2^exponent · B`; `exponent` must be below the width of `A`.
    #[must_use]
    pub fn scale_exponent(mut self, exponent: u32) -> Self {
        self.config.scale_exponent = exponent;
        self
    }

    /// Toggle barriers between blocks.
    #[must_use]
    pub fn insert_barrier(mut self, insert_barrier: bool) -> Self {
        self.config.insert_barrier = insert_barrier;
        self
    }

    /// Log a drawing of the circuit after building.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Override the circuit label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.label = Some(label.into());
        self
    }

    /// The current parameters.
    pub fn config(&self) -> &AdderConfig {
        &self.config
    }

    fn registers(&self) -> QutilResult<(QuantumRegister, QuantumRegister)> {
        match (&self.a, &self.b) {
            (Some(a), Some(b)) => {
                if a.size() < b.size() + 1 {
                    return Err(QutilError::RegisterTooNarrow {
                        register: a.name().to_string(),
                        min: b.size() + 1,
                        got: a.size(),
                    });
                }
                Ok((a.clone(), b.clone()))
            }
            (Some(_), None) => Err(QutilError::MissingRegister("B")),
            (None, Some(_)) => Err(QutilError::MissingRegister("A")),
            (None, None) => {
                let n = self.config.num_qubits;
                if n == 0 {
                    return Err(QutilError::ZeroQubits {
                        builder: "QFTAdder",
                    });
                }
                Ok((QuantumRegister::new("A", n + 1)?, QuantumRegister::new("B", n)?))
            }
        }
    }

    /// Assemble the circuit over `A` then `B`.
    pub fn build(&self) -> QutilResult<Circuit> {
        let (a_reg, b_reg) = self.registers()?;
        if self.config.scale_exponent >= a_reg.size() {
            return Err(QutilError::ScaleOutOfRange {
                exponent: self.config.scale_exponent,
                width: a_reg.size(),
            });
        }
        let mut circuit = Circuit::new(self.config.resolved_label());
        let a = circuit.add_register(&a_reg)?;
        let b = circuit.add_register(&b_reg)?;

        let fourier = QftConfig {
            do_swaps: false,
            ..QftConfig::new(a_reg.size())
        };
        if !self.config.skip_qft {
            let qft = QFTGate::from_config(fourier.clone()).build()?;
            circuit.append(&qft, a.iter().copied())?;
            barrier(&mut circuit, self.config.insert_barrier)?;
        }

        self.append_phase_kicks(&mut circuit, &a, &b)?;

        if !self.config.skip_qft {
            let iqft = QFTGate::from_config(QftConfig {
                inverse: true,
                ..fourier
            })
            .build()?;
            circuit.append(&iqft, a.iter().copied())?;
        }

        debug!(
            "Built {}: |{}| = {}, |{}| = {}, {} ops",
            circuit.name(),
            a_reg.name(),
            a_reg.size(),
            b_reg.name(),
            b_reg.size(),
            circuit.size()
        );
        debug_render(&circuit, self.config.debug);
        Ok(circuit)
    }

    /// Assemble the circuit and freeze it into a gate over `A ++ B`.
    pub fn build_gate(&self) -> QutilResult<Gate> {
        let circuit = self.build()?;
        Ok(circuit.to_gate_named(self.config.gate_name())?)
    }

    fn append_phase_kicks(
        &self,
        circuit: &mut Circuit,
        a: &[QubitId],
        b: &[QubitId],
    ) -> QutilResult<()> {
        let shift = self.config.scale_exponent as usize;
        for (i, &control) in b.iter().enumerate() {
            for (j, &target) in a.iter().enumerate().skip(i + shift) {
                let angle = phase_angle(j - i - shift);
                let angle = if self.config.subtract { -angle } else { angle };
                circuit.cp(angle, control, target)?;
            }
            barrier(circuit, self.config.insert_barrier)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qutil_ir::{GateKind, IrError, StandardGate};
    use std::f64::consts::PI;

    #[test]
    fn test_owned_registers_and_gate_counts() {
        let circuit = QFTAdder::new(3).build().unwrap();
        let ops = circuit.count_ops();
        assert_eq!(ops["qft"], 1);
        assert_eq!(ops["iqft"], 1);
        // B[0] → 4 targets, B[1] → 3, B[2] → 2.
        assert_eq!(ops["cp"], 9);
        assert_eq!(circuit.num_qubits(), 7);
    }

    #[test]
    fn test_subtract_negates_angles() {
        let circuit = QFTAdder::new(2).subtract(true).skip_qft(true).build().unwrap();
        assert_eq!(circuit.name(), "|A-B⟩");
        let first = circuit.instructions()[0];
        match &first.as_gate().unwrap().kind {
            GateKind::Standard(StandardGate::CP(theta)) => {
                assert!((theta.as_f64().unwrap() + PI).abs() < 1e-12);
            }
            other => panic!("unexpected gate {other:?}"),
        }
    }

    #[test]
    fn test_skip_qft_only_phase_kicks() {
        let circuit = QFTAdder::new(2).skip_qft(true).build().unwrap();
        assert_eq!(circuit.count_ops().len(), 1);
        assert_eq!(circuit.size(), 5);
    }

    #[test]
    fn test_barriers() {
        let circuit = QFTAdder::new(2).insert_barrier(true).build().unwrap();
        // After the QFT and after each of the two B qubits.
        assert_eq!(circuit.count_ops()["barrier"], 3);
    }

    #[test]
    fn test_scaled_addition_shifts_targets() {
        let circuit = QFTAdder::new(2)
            .scale_exponent(1)
            .skip_qft(true)
            .build()
            .unwrap();
        assert_eq!(circuit.name(), "|A+2B⟩");
        // B[0] → A[1], A[2]; B[1] → A[2].
        assert_eq!(circuit.size(), 3);
        let first = circuit.instructions()[0];
        assert_eq!(first.qubits, vec![QubitId(3), QubitId(1)]);
    }

    #[test]
    fn test_scale_exponent_bounded_by_accumulator() {
        assert!(matches!(
            QFTAdder::new(2).scale_exponent(64).build(),
            Err(QutilError::ScaleOutOfRange {
                exponent: 64,
                width: 3
            })
        ));
        assert!(matches!(
            QFTAdder::new(2).scale_exponent(3).build_gate(),
            Err(QutilError::ScaleOutOfRange { .. })
        ));
        assert!(QFTAdder::new(2).scale_exponent(2).build().is_ok());

        let config = AdderConfig {
            scale_exponent: 70,
            ..AdderConfig::default()
        };
        assert_eq!(config.resolved_label(), "|A+2^70B⟩");
    }

    #[test]
    fn test_injected_registers() {
        let a = QuantumRegister::new("acc", 5).unwrap();
        let b = QuantumRegister::new("x", 3).unwrap();
        let circuit = QFTAdder::on_registers(a, b).build().unwrap();
        assert_eq!(circuit.qreg("acc").map(<[_]>::len), Some(5));
        assert_eq!(circuit.qreg("x").map(<[_]>::len), Some(3));
    }

    #[test]
    fn test_register_validation() {
        let a = QuantumRegister::new("A", 3).unwrap();
        let b = QuantumRegister::new("B", 3).unwrap();

        assert!(matches!(
            QFTAdder::new(2).register_a(a.clone()).build(),
            Err(QutilError::MissingRegister("B"))
        ));
        assert!(matches!(
            QFTAdder::new(2).register_b(b.clone()).build(),
            Err(QutilError::MissingRegister("A"))
        ));
        assert!(matches!(
            QFTAdder::on_registers(a, b).build(),
            Err(QutilError::RegisterTooNarrow { min: 4, got: 3, .. })
        ));
        assert!(matches!(
            QFTAdder::new(0).build(),
            Err(QutilError::ZeroQubits { .. })
        ));

        let same = QuantumRegister::new("R", 2).unwrap();
        let wide = QuantumRegister::new("R", 3).unwrap();
        assert!(matches!(
            QFTAdder::on_registers(wide, same).build(),
            Err(QutilError::Ir(IrError::DuplicateRegister(_)))
        ));
    }

    #[test]
    fn test_build_gate() {
        let gate = QFTAdder::new(2).build_gate().unwrap();
        assert_eq!(gate.name(), "draper_add");
        assert_eq!(gate.num_qubits(), 5);
        assert_eq!(gate.display_name(), "|A+B⟩");

        let gate = QFTAdder::new(2).subtract(true).scale_exponent(2).build_gate().unwrap();
        assert_eq!(gate.name(), "draper_sub_shl2");
    }
}
