//! Quantum Phase Estimation.
//!
//! For an eigenstate `|ψ⟩` of `U` with `U|ψ⟩ = e^{2πiφ}|ψ⟩`, the counting
//! register ends up holding the best `n`-bit approximation of `φ·2^n`.
//! Counting qubit `j` controls `U^(2^j)`, so the register is little-endian.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::iter;
use tracing::debug;

use qutil_ir::{Circuit, ClassicalRegister, Gate, QuantumRegister, StandardGate};

use crate::display::{barrier, debug_render};
use crate::error::{QutilError, QutilResult};
use crate::qft::{QFTGate, QftConfig};

/// Largest counting register; `U^(2^j)` exponents must fit in a `u64`.
pub const MAX_COUNTING_QUBITS: u32 = 32;

/// The unitary whose eigenphase is estimated.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseUnitary {
    /// `P(2π·phase)` on one qubit prepared in `|1⟩`, eigenphase `phase`.
    Toy { phase: f64 },
    /// Any gate, with an optional gate preparing its eigenstate on the target.
    Custom {
        gate: Gate,
        eigenstate_prep: Option<Gate>,
    },
}

impl PhaseUnitary {
    /// Toy unitary with eigenphase `phase`.
    pub fn toy(phase: f64) -> Self {
        PhaseUnitary::Toy { phase }
    }

    /// Custom unitary; the target starts in `|0…0⟩` unless a preparation is set.
    pub fn custom(gate: Gate) -> Self {
        PhaseUnitary::Custom {
            gate,
            eigenstate_prep: None,
        }
    }

    /// Width of the target register.
    pub fn num_qubits(&self) -> u32 {
        match self {
            PhaseUnitary::Toy { .. } => 1,
            PhaseUnitary::Custom { gate, .. } => gate.num_qubits(),
        }
    }

    fn validate(&self) -> QutilResult<()> {
        match self {
            PhaseUnitary::Toy { phase } => {
                if !(0.0..1.0).contains(phase) {
                    return Err(QutilError::InvalidPhase(*phase));
                }
            }
            PhaseUnitary::Custom {
                gate,
                eigenstate_prep,
            } => {
                if gate.num_qubits() == 0 {
                    return Err(QutilError::ZeroQubits {
                        builder: "QPE unitary",
                    });
                }
                if let Some(prep) = eigenstate_prep {
                    if prep.num_qubits() != gate.num_qubits() {
                        return Err(QutilError::RegisterWidthMismatch {
                            register: prep.display_name(),
                            expected: gate.num_qubits(),
                            got: prep.num_qubits(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn base_gate(&self) -> Gate {
        match self {
            PhaseUnitary::Toy { phase } => {
                Gate::standard(StandardGate::P((2.0 * PI * phase).into()))
            }
            PhaseUnitary::Custom { gate, .. } => gate.clone(),
        }
    }
}

/// Serializable QPE parameters using the toy unitary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QpeConfig {
    /// Width of the counting register.
    pub num_counting_qubits: u32,
    /// Eigenphase of the toy unitary, in `[0, 1)`.
    pub phase: f64,
    /// Measure the counting register into `c`.
    pub measure: bool,
    /// Barriers between the stages.
    pub insert_barrier: bool,
    /// Approximation degree of the inverse QFT.
    pub approximation_degree: u32,
    /// Log a drawing of the built circuit.
    pub debug: bool,
    /// Circuit name; defaults to `QPE`.
    pub label: Option<String>,
}

impl Default for QpeConfig {
    fn default() -> Self {
        Self {
            num_counting_qubits: 0,
            phase: 0.0,
            measure: true,
            insert_barrier: false,
            approximation_degree: 0,
            debug: false,
            label: None,
        }
    }
}

/// Phase value `reading / 2^n` for a counting-register reading.
pub fn estimate_phase(reading: u64, num_counting_qubits: u32) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let reading = reading as f64;
    reading / 2f64.powi(i32::try_from(num_counting_qubits).unwrap_or(i32::MAX))
}

/// QPE circuit builder.
///
/// ```rust
/// use qutilities::{PhaseUnitary, QPE};
///
/// let circuit = QPE::new(3, PhaseUnitary::toy(0.25)).build().unwrap();
/// assert_eq!(circuit.qreg("count").map(<[_]>::len), Some(3));
/// assert_eq!(circuit.qreg("target").map(<[_]>::len), Some(1));
/// assert_eq!(circuit.count_ops()["measure"], 3);
/// ```
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq)]
pub struct QPE {
    num_counting_qubits: u32,
    unitary: PhaseUnitary,
    counting_register: Option<QuantumRegister>,
    target_register: Option<QuantumRegister>,
    measure: bool,
    insert_barrier: bool,
    approximation_degree: u32,
    debug: bool,
    label: Option<String>,
}

impl QPE {
    /// Estimation with `num_counting_qubits` bits of precision.
    pub fn new(num_counting_qubits: u32, unitary: PhaseUnitary) -> Self {
        Self {
            num_counting_qubits,
            unitary,
            counting_register: None,
            target_register: None,
            measure: true,
            insert_barrier: false,
            approximation_degree: 0,
            debug: false,
            label: None,
        }
    }

    /// Toy-unitary estimation from a parameter set.
    pub fn from_config(config: &QpeConfig) -> Self {
        let mut qpe = Self::new(config.num_counting_qubits, PhaseUnitary::toy(config.phase))
            .measure(config.measure)
            .insert_barrier(config.insert_barrier)
            .approximation_degree(config.approximation_degree)
            .debug(config.debug);
        qpe.label.clone_from(&config.label);
        qpe
    }

    /// Use an existing counting register; the precision follows its width.
    #[must_use]
    pub fn counting_register(mut self, register: QuantumRegister) -> Self {
        self.num_counting_qubits = register.size();
        self.counting_register = Some(register);
        self
    }

    /// Use an existing target register; its width must match the unitary.
    #[must_use]
    pub fn target_register(mut self, register: QuantumRegister) -> Self {
        self.target_register = Some(register);
        self
    }

    /// Prepare the target with `prep` before estimation (custom unitaries).
    #[must_use]
    pub fn eigenstate_prep(mut self, prep: Gate) -> Self {
        if let PhaseUnitary::Custom {
            eigenstate_prep, ..
        } = &mut self.unitary
        {
            *eigenstate_prep = Some(prep);
        }
        self
    }

    /// Toggle the final measurement.
    #[must_use]
    pub fn measure(mut self, measure: bool) -> Self {
        self.measure = measure;
        self
    }

    /// Toggle barriers between stages.
    #[must_use]
    pub fn insert_barrier(mut self, insert_barrier: bool) -> Self {
        self.insert_barrier = insert_barrier;
        self
    }

    /// Approximation degree of the inverse QFT.
    #[must_use]
    pub fn approximation_degree(mut self, degree: u32) -> Self {
        self.approximation_degree = degree;
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

    /// The unitary under estimation.
    pub fn unitary(&self) -> &PhaseUnitary {
        &self.unitary
    }

    fn registers(&self) -> QutilResult<(QuantumRegister, QuantumRegister)> {
        let n = self.num_counting_qubits;
        if n == 0 {
            return Err(QutilError::ZeroQubits { builder: "QPE" });
        }
        if n > MAX_COUNTING_QUBITS {
            return Err(QutilError::TooManyCountingQubits {
                requested: n,
                max: MAX_COUNTING_QUBITS,
            });
        }
        self.unitary.validate()?;

        let width = self.unitary.num_qubits();
        let counting = match &self.counting_register {
            Some(register) => register.clone(),
            None => QuantumRegister::new("count", n)?,
        };
        let target = match &self.target_register {
            Some(register) if register.size() != width => {
                return Err(QutilError::RegisterWidthMismatch {
                    register: register.name().to_string(),
                    expected: width,
                    got: register.size(),
                });
            }
            Some(register) => register.clone(),
            None => QuantumRegister::new("target", width)?,
        };
        Ok((counting, target))
    }

    /// Assemble the circuit over `count` then `target` (plus `c` when measuring).
    pub fn build(&self) -> QutilResult<Circuit> {
        let (counting_reg, target_reg) = self.registers()?;
        let mut circuit = Circuit::new(self.label.clone().unwrap_or_else(|| "QPE".into()));
        let count = circuit.add_register(&counting_reg)?;
        let target = circuit.add_register(&target_reg)?;

        match &self.unitary {
            PhaseUnitary::Toy { .. } => {
                circuit.x(target[0])?;
            }
            PhaseUnitary::Custom {
                eigenstate_prep: Some(prep),
                ..
            } => {
                circuit.append(prep, target.iter().copied())?;
            }
            PhaseUnitary::Custom { .. } => {}
        }
        barrier(&mut circuit, self.insert_barrier)?;

        for &q in &count {
            circuit.h(q)?;
        }
        barrier(&mut circuit, self.insert_barrier)?;

        let base = self.unitary.base_gate();
        for (j, &control) in count.iter().enumerate() {
            let powered = base.power(1u64 << j)?.control(1);
            circuit.append(&powered, iter::once(control).chain(target.iter().copied()))?;
        }
        barrier(&mut circuit, self.insert_barrier)?;

        let iqft = QFTGate::from_config(QftConfig {
            inverse: true,
            approximation_degree: self.approximation_degree,
            ..QftConfig::new(counting_reg.size())
        })
        .build()?;
        circuit.append(&iqft, count.iter().copied())?;

        if self.measure {
            barrier(&mut circuit, self.insert_barrier)?;
            let creg = ClassicalRegister::new("c", counting_reg.size())?;
            let clbits = circuit.add_classical_register(&creg)?;
            for (&q, &c) in count.iter().zip(&clbits) {
                circuit.measure(q, c)?;
            }
        }

        debug!(
            "Built {}: {} counting qubits, {}-qubit unitary {}, depth {}",
            circuit.name(),
            counting_reg.size(),
            target_reg.size(),
            base.display_name(),
            circuit.depth()
        );
        debug_render(&circuit, self.debug);
        Ok(circuit)
    }
}

/// The unitary part of QPE (no measurement) as a composite gate named `qpe`.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq)]
pub struct QPEGate {
    qpe: QPE,
}

impl QPEGate {
    /// Gate over `num_counting_qubits + unitary width` qubits.
    pub fn new(num_counting_qubits: u32, unitary: PhaseUnitary) -> Self {
        Self {
            qpe: QPE::new(num_counting_qubits, unitary),
        }
    }

    /// Prepare the target with `prep` inside the gate.
    #[must_use]
    pub fn eigenstate_prep(mut self, prep: Gate) -> Self {
        self.qpe = self.qpe.eigenstate_prep(prep);
        self
    }

    /// Approximation degree of the inverse QFT.
    #[must_use]
    pub fn approximation_degree(mut self, degree: u32) -> Self {
        self.qpe = self.qpe.approximation_degree(degree);
        self
    }

    /// Override the gate label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.qpe = self.qpe.label(label);
        self
    }

    /// Assemble the gate over `count ++ target`.
    pub fn build(&self) -> QutilResult<Gate> {
        let circuit = self.qpe.clone().measure(false).insert_barrier(false).build()?;
        Ok(circuit.to_gate_named("qpe")?)
    }
}

impl From<QPE> for QPEGate {
    fn from(qpe: QPE) -> Self {
        Self { qpe }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qutil_ir::{GateKind, InstructionKind, QubitId};

    #[test]
    fn test_toy_layout() {
        let circuit = QPE::new(3, PhaseUnitary::toy(0.125)).build().unwrap();
        let insts = circuit.instructions();
        assert_eq!(insts[0].name(), "x");
        assert_eq!(insts[0].qubits, vec![QubitId(3)]);
        assert_eq!(circuit.count_ops()["h"], 3);
        assert_eq!(circuit.count_ops()["cp"], 3);
        assert_eq!(circuit.count_ops()["iqft"], 1);
        assert_eq!(circuit.qreg("count").map(<[_]>::len), Some(3));
        assert_eq!(circuit.creg("c").map(<[_]>::len), Some(3));
    }

    #[test]
    fn test_toy_powers_scale_angle() {
        let circuit = QPE::new(3, PhaseUnitary::toy(0.125)).build().unwrap();
        let angles: Vec<f64> = circuit
            .instructions()
            .into_iter()
            .filter_map(|inst| match inst.as_gate().map(|g| &g.kind) {
                Some(GateKind::Standard(StandardGate::CP(theta))) => theta.as_f64(),
                _ => None,
            })
            .collect();
        let expected = [PI / 4.0, PI / 2.0, PI];
        for (angle, want) in angles.iter().zip(expected) {
            assert!((angle - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_custom_unitary_uses_power_and_control() {
        let mut body = Circuit::with_size("u", 2, 0);
        body.cx(QubitId(0), QubitId(1)).unwrap();
        let gate = body.to_gate().unwrap();

        let circuit = QPE::new(2, PhaseUnitary::custom(gate))
            .measure(false)
            .build()
            .unwrap();
        let ops = circuit.count_ops();
        assert_eq!(ops["c1_u"], 1);
        assert_eq!(ops["c1_u_pow_2"], 1);
        assert!(!ops.contains_key("measure"));
        assert!(circuit.creg("c").is_none());
    }

    #[test]
    fn test_custom_unitary_at_counting_limit() {
        let mut body = Circuit::with_size("u", 2, 0);
        body.cx(QubitId(0), QubitId(1)).unwrap();
        let gate = body.to_gate().unwrap();

        let start = std::time::Instant::now();
        let circuit = QPE::new(MAX_COUNTING_QUBITS, PhaseUnitary::custom(gate))
            .build()
            .unwrap();
        assert!(start.elapsed() < std::time::Duration::from_secs(5));
        assert_eq!(circuit.count_ops()["c1_u_pow_2147483648"], 1);
        assert_eq!(circuit.num_qubits(), MAX_COUNTING_QUBITS as usize + 2);
    }

    #[test]
    fn test_eigenstate_prep_applied_first() {
        let gate = Gate::standard(StandardGate::Z);
        let prep = Gate::standard(StandardGate::X);
        let circuit = QPE::new(2, PhaseUnitary::custom(gate))
            .eigenstate_prep(prep)
            .build()
            .unwrap();
        let first = circuit.instructions()[0];
        assert_eq!(first.name(), "x");
        assert_eq!(first.qubits, vec![QubitId(2)]);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            QPE::new(0, PhaseUnitary::toy(0.5)).build(),
            Err(QutilError::ZeroQubits { .. })
        ));
        assert!(matches!(
            QPE::new(3, PhaseUnitary::toy(1.0)).build(),
            Err(QutilError::InvalidPhase(_))
        ));
        assert!(matches!(
            QPE::new(3, PhaseUnitary::toy(-0.1)).build(),
            Err(QutilError::InvalidPhase(_))
        ));
        assert!(matches!(
            QPE::new(40, PhaseUnitary::toy(0.5)).build(),
            Err(QutilError::TooManyCountingQubits { .. })
        ));
        let wide = QuantumRegister::new("t", 2).unwrap();
        assert!(matches!(
            QPE::new(3, PhaseUnitary::toy(0.5)).target_register(wide).build(),
            Err(QutilError::RegisterWidthMismatch {
                expected: 1,
                got: 2,
                ..
            })
        ));
        let zero = Gate::custom(qutil_ir::CustomGate::new("empty", 0));
        assert!(matches!(
            QPE::new(2, PhaseUnitary::custom(zero)).build(),
            Err(QutilError::ZeroQubits { .. })
        ));
    }

    #[test]
    fn test_injected_registers() {
        let count = QuantumRegister::new("phase", 4).unwrap();
        let target = QuantumRegister::new("psi", 1).unwrap();
        let circuit = QPE::new(1, PhaseUnitary::toy(0.5))
            .counting_register(count)
            .target_register(target)
            .build()
            .unwrap();
        assert_eq!(circuit.qreg("phase").map(<[_]>::len), Some(4));
        assert_eq!(circuit.count_ops()["measure"], 4);
    }

    #[test]
    fn test_barriers() {
        let circuit = QPE::new(2, PhaseUnitary::toy(0.5))
            .insert_barrier(true)
            .build()
            .unwrap();
        assert_eq!(circuit.count_ops()["barrier"], 4);
        let last = circuit.instructions().into_iter().last().unwrap();
        assert!(matches!(last.kind, InstructionKind::Measure));
    }

    #[test]
    fn test_qpe_gate_is_unitary() {
        let gate = QPEGate::new(3, PhaseUnitary::toy(0.25)).build().unwrap();
        assert_eq!(gate.name(), "qpe");
        assert_eq!(gate.num_qubits(), 4);
        assert_eq!(gate.display_name(), "QPE");
    }

    #[test]
    fn test_estimate_phase() {
        assert!((estimate_phase(2, 3) - 0.25).abs() < 1e-12);
        assert!((estimate_phase(0, 5)).abs() < 1e-12);
    }

    #[test]
    fn test_config_builds_toy() {
        let config: QpeConfig =
            serde_json::from_str(r#"{"num_counting_qubits": 4, "phase": 0.375}"#).unwrap();
        let qpe = QPE::from_config(&config);
        assert_eq!(qpe.unitary(), &PhaseUnitary::toy(0.375));
        assert!(qpe.build().is_ok());
    }
}
