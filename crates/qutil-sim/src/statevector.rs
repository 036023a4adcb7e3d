//! Statevector simulation engine.
//!
//! Every standard gate is reduced to either a 2×2 matrix on one target qubit
//! or a swap of two qubits, in both cases gated by a bit mask of control
//! qubits. Composite gates are expanded recursively with their operands
//! remapped, and the controlled modifier just widens the control mask, so a
//! controlled adder built from controlled-phase gates costs no more than the
//! adder itself.

use num_complex::Complex64;
use rand::Rng;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

use qutil_ir::{
    Circuit, Gate, GateKind, Instruction, InstructionKind, ParameterExpression, QubitId,
    StandardGate,
};

use crate::error::{SimError, SimResult};

type Matrix2 = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

/// Widest state that can be allocated (64 GiB of amplitudes), whatever the
/// simulator's configured limit.
pub const MAX_SUPPORTED_QUBITS: usize = 32;

/// What a standard gate does once its leading controls are stripped.
enum Kernel {
    Unitary(Matrix2),
    Swap,
}

/// A statevector representing a quantum state.
#[derive(Debug, Clone, PartialEq)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> SimResult<Self> {
        Self::from_basis_state(num_qubits, 0)
    }

    /// Create the computational basis state `|index⟩`.
    pub fn from_basis_state(num_qubits: usize, index: usize) -> SimResult<Self> {
        if num_qubits > MAX_SUPPORTED_QUBITS {
            return Err(SimError::CircuitTooLarge {
                qubits: num_qubits,
                max: MAX_SUPPORTED_QUBITS,
            });
        }
        let size = 1usize << num_qubits;
        if index >= size {
            return Err(SimError::InvalidBasisState { index, num_qubits });
        }
        let mut amplitudes = vec![ZERO; size];
        amplitudes[index] = ONE;
        Ok(Self {
            amplitudes,
            num_qubits,
        })
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The raw amplitudes, indexed little-endian by basis state.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Probability of every basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(Complex64::norm_sqr).collect()
    }

    /// Probability of one basis state (0 for an index outside the state).
    pub fn probability_of(&self, index: usize) -> f64 {
        self.amplitudes.get(index).map_or(0.0, Complex64::norm_sqr)
    }

    /// The most probable basis state and its probability.
    pub fn most_likely(&self) -> (usize, f64) {
        self.amplitudes
            .iter()
            .map(Complex64::norm_sqr)
            .enumerate()
            .fold((0, 0.0), |best, (i, p)| if p > best.1 { (i, p) } else { best })
    }

    /// |⟨self|other⟩|², or 0 when the widths differ.
    pub fn fidelity(&self, other: &Statevector) -> f64 {
        if self.num_qubits != other.num_qubits {
            return 0.0;
        }
        self.amplitudes
            .iter()
            .zip(&other.amplitudes)
            .map(|(a, b)| a.conj() * b)
            .sum::<Complex64>()
            .norm_sqr()
    }

    /// Decode the value held by `qubits` (least significant first) in basis state `index`.
    pub fn register_value(index: usize, qubits: &[QubitId]) -> u64 {
        qubits
            .iter()
            .enumerate()
            .map(|(bit, q)| (((index >> q.index()) & 1) as u64) << bit)
            .sum()
    }

    /// Apply an instruction to the statevector.
    ///
    /// Measurements, barriers and delays leave the state untouched; the
    /// simulator reads measurements from sampled basis states instead.
    pub fn apply(&mut self, instruction: &Instruction) -> SimResult<()> {
        let qubits = self.positions(&instruction.qubits)?;
        match &instruction.kind {
            InstructionKind::Gate(gate) => self.apply_gate(gate, &qubits, 0),
            InstructionKind::Reset => {
                qubits.iter().for_each(|&q| self.reset(q));
                Ok(())
            }
            InstructionKind::Measure | InstructionKind::Barrier | InstructionKind::Delay { .. } => {
                Ok(())
            }
        }
    }

    /// Apply every instruction of a circuit in order.
    pub fn apply_circuit(&mut self, circuit: &Circuit) -> SimResult<()> {
        for inst in circuit.instructions() {
            self.apply(inst)?;
        }
        Ok(())
    }

    fn positions(&self, qubits: &[QubitId]) -> SimResult<Vec<usize>> {
        qubits
            .iter()
            .map(|q| {
                let idx = q.index();
                if idx < self.num_qubits {
                    Ok(idx)
                } else {
                    Err(SimError::QubitOutOfRange {
                        qubit: idx,
                        num_qubits: self.num_qubits,
                    })
                }
            })
            .collect()
    }

    /// Apply a gate to `qubits` when every bit of `ctrl_mask` is set.
    fn apply_gate(&mut self, gate: &Gate, qubits: &[usize], ctrl_mask: usize) -> SimResult<()> {
        let expected = gate.num_qubits() as usize;
        if qubits.len() != expected {
            return Err(SimError::OperandCount {
                gate_name: gate.name().to_string(),
                expected,
                got: qubits.len(),
            });
        }
        if bit_mask(qubits).count_ones() as usize != qubits.len() {
            return Err(SimError::Unsupported(format!(
                "repeated operand of gate '{}'",
                gate.name()
            )));
        }
        match &gate.kind {
            GateKind::Standard(std_gate) => {
                let (num_ctrl, kernel) = standard_kernel(std_gate)?;
                let mask = ctrl_mask | bit_mask(&qubits[..num_ctrl]);
                let targets = &qubits[num_ctrl..];
                match kernel {
                    Kernel::Unitary(m) => self.apply_matrix(&m, targets[0], mask),
                    Kernel::Swap => self.apply_swap(targets[0], targets[1], mask),
                }
                Ok(())
            }
            GateKind::Custom(custom) => {
                if let Some(body) = &custom.definition {
                    for inst in body.iter() {
                        let mapped = inst
                            .qubits
                            .iter()
                            .map(|q| {
                                qubits.get(q.index()).copied().ok_or(SimError::QubitOutOfRange {
                                    qubit: q.index(),
                                    num_qubits: qubits.len(),
                                })
                            })
                            .collect::<SimResult<Vec<_>>>()?;
                        match &inst.kind {
                            InstructionKind::Gate(inner) => {
                                self.apply_gate(inner, &mapped, ctrl_mask)?;
                            }
                            InstructionKind::Barrier | InstructionKind::Delay { .. } => {}
                            other => {
                                return Err(SimError::Unsupported(format!(
                                    "{other:?} inside gate '{}'",
                                    custom.name
                                )));
                            }
                        }
                    }
                    Ok(())
                } else if let Some(matrix) = &custom.matrix {
                    self.apply_dense(matrix, qubits, ctrl_mask);
                    Ok(())
                } else {
                    Err(SimError::OpaqueGate(custom.name.clone()))
                }
            }
            GateKind::Controlled {
                base,
                num_ctrl_qubits,
            } => {
                let n = *num_ctrl_qubits as usize;
                let mask = ctrl_mask | bit_mask(&qubits[..n]);
                self.apply_gate(base, &qubits[n..], mask)
            }
        }
    }

    fn apply_matrix(&mut self, m: &Matrix2, target: usize, ctrl_mask: usize) {
        let tgt_mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if i & tgt_mask == 0 && i & ctrl_mask == ctrl_mask {
                let j = i | tgt_mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = m[0][0] * a + m[0][1] * b;
                self.amplitudes[j] = m[1][0] * a + m[1][1] * b;
            }
        }
    }

    fn apply_swap(&mut self, q1: usize, q2: usize, ctrl_mask: usize) {
        let mask1 = 1 << q1;
        let mask2 = 1 << q2;
        for i in 0..self.amplitudes.len() {
            if i & ctrl_mask == ctrl_mask && i & mask1 != 0 && i & mask2 == 0 {
                let j = (i & !mask1) | mask2;
                self.amplitudes.swap(i, j);
            }
        }
    }

    /// Apply a row-major `2^k × 2^k` matrix over `qubits` (qubit 0 of the gate
    /// is bit 0 of the local index).
    fn apply_dense(&mut self, matrix: &[Complex64], qubits: &[usize], ctrl_mask: usize) {
        let dim = 1usize << qubits.len();
        let target_mask = bit_mask(qubits);
        let offsets: Vec<usize> = (0..dim)
            .map(|local| {
                qubits
                    .iter()
                    .enumerate()
                    .filter(|(bit, _)| local >> bit & 1 == 1)
                    .map(|(_, &q)| 1 << q)
                    .sum()
            })
            .collect();

        let mut old = vec![ZERO; dim];
        for base in 0..self.amplitudes.len() {
            if base & target_mask != 0 || base & ctrl_mask != ctrl_mask {
                continue;
            }
            for (slot, off) in old.iter_mut().zip(&offsets) {
                *slot = self.amplitudes[base | off];
            }
            for (row, off) in offsets.iter().enumerate() {
                self.amplitudes[base | off] = matrix[row * dim..(row + 1) * dim]
                    .iter()
                    .zip(&old)
                    .map(|(m, a)| m * a)
                    .sum();
            }
        }
    }

    fn reset(&mut self, qubit: usize) {
        // Simplified reset: fold the |1⟩ branch onto |0⟩ and renormalize
        let mask = 1 << qubit;
        for i in 0..self.amplitudes.len() {
            if i & mask != 0 {
                let val = self.amplitudes[i];
                self.amplitudes[i & !mask] += val;
                self.amplitudes[i] = ZERO;
            }
        }
        let norm = self
            .amplitudes
            .iter()
            .map(Complex64::norm_sqr)
            .sum::<f64>()
            .sqrt();
        if norm > 0.0 {
            for amp in &mut self.amplitudes {
                *amp /= norm;
            }
        }
    }

    /// Sample a measurement outcome of all qubits.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let r: f64 = rng.r#gen();
        let mut cumulative = 0.0;
        for (i, amp) in self.amplitudes.iter().enumerate() {
            cumulative += amp.norm_sqr();
            if r < cumulative {
                return i;
            }
        }
        // Rounding can leave the total just below 1
        self.amplitudes.len() - 1
    }

    /// Sample `shots` outcomes using a precomputed cumulative distribution.
    pub fn sample_many<R: Rng + ?Sized>(&self, shots: u32, rng: &mut R) -> Vec<usize> {
        let mut cdf = Vec::with_capacity(self.amplitudes.len());
        let mut acc = 0.0;
        for amp in &self.amplitudes {
            acc += amp.norm_sqr();
            cdf.push(acc);
        }
        let last = cdf.len() - 1;
        (0..shots)
            .map(|_| {
                let r: f64 = rng.r#gen::<f64>() * acc;
                cdf.partition_point(|&c| c <= r).min(last)
            })
            .collect()
    }
}

fn bit_mask(qubits: &[usize]) -> usize {
    qubits.iter().fold(0, |mask, &q| mask | (1 << q))
}

fn angle(param: &ParameterExpression, gate: &StandardGate) -> SimResult<f64> {
    param
        .as_f64()
        .ok_or_else(|| SimError::UnboundParameter(gate.name().to_string()))
}

fn phase(theta: f64) -> Matrix2 {
    [[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, theta)]]
}

fn rx(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new(0.0, -(theta / 2.0).sin());
    [[c, s], [s, c]]
}

fn ry(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new((theta / 2.0).sin(), 0.0);
    [[c, -s], [s, c]]
}

fn rz(theta: f64) -> Matrix2 {
    [
        [Complex64::from_polar(1.0, -theta / 2.0), ZERO],
        [ZERO, Complex64::from_polar(1.0, theta / 2.0)],
    ]
}

fn u(theta: f64, phi: f64, lambda: f64) -> Matrix2 {
    let c = (theta / 2.0).cos();
    let s = (theta / 2.0).sin();
    [
        [Complex64::new(c, 0.0), -Complex64::from_polar(s, lambda)],
        [
            Complex64::from_polar(s, phi),
            Complex64::from_polar(c, phi + lambda),
        ],
    ]
}

/// Number of leading control operands and the remaining kernel of a standard gate.
fn standard_kernel(gate: &StandardGate) -> SimResult<(usize, Kernel)> {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    let x: Matrix2 = [[ZERO, ONE], [ONE, ZERO]];
    let y: Matrix2 = [[ZERO, -I], [I, ZERO]];
    let z: Matrix2 = [[ONE, ZERO], [ZERO, -ONE]];
    let hadamard: Matrix2 = [[h, h], [h, -h]];
    let sx_p = Complex64::new(0.5, 0.5);
    let sx_m = Complex64::new(0.5, -0.5);

    let kernel = match gate {
        StandardGate::I => (0, Kernel::Unitary([[ONE, ZERO], [ZERO, ONE]])),
        StandardGate::X => (0, Kernel::Unitary(x)),
        StandardGate::Y => (0, Kernel::Unitary(y)),
        StandardGate::Z => (0, Kernel::Unitary(z)),
        StandardGate::H => (0, Kernel::Unitary(hadamard)),
        StandardGate::S => (0, Kernel::Unitary(phase(PI / 2.0))),
        StandardGate::Sdg => (0, Kernel::Unitary(phase(-PI / 2.0))),
        StandardGate::T => (0, Kernel::Unitary(phase(PI / 4.0))),
        StandardGate::Tdg => (0, Kernel::Unitary(phase(-PI / 4.0))),
        StandardGate::SX => (0, Kernel::Unitary([[sx_p, sx_m], [sx_m, sx_p]])),
        StandardGate::SXdg => (0, Kernel::Unitary([[sx_m, sx_p], [sx_p, sx_m]])),
        StandardGate::Rx(t) => (0, Kernel::Unitary(rx(angle(t, gate)?))),
        StandardGate::Ry(t) => (0, Kernel::Unitary(ry(angle(t, gate)?))),
        StandardGate::Rz(t) => (0, Kernel::Unitary(rz(angle(t, gate)?))),
        StandardGate::P(t) => (0, Kernel::Unitary(phase(angle(t, gate)?))),
        StandardGate::U(t, p, l) => (
            0,
            Kernel::Unitary(u(angle(t, gate)?, angle(p, gate)?, angle(l, gate)?)),
        ),
        StandardGate::CX => (1, Kernel::Unitary(x)),
        StandardGate::CY => (1, Kernel::Unitary(y)),
        StandardGate::CZ => (1, Kernel::Unitary(z)),
        StandardGate::CH => (1, Kernel::Unitary(hadamard)),
        StandardGate::Swap => (0, Kernel::Swap),
        StandardGate::CRx(t) => (1, Kernel::Unitary(rx(angle(t, gate)?))),
        StandardGate::CRy(t) => (1, Kernel::Unitary(ry(angle(t, gate)?))),
        StandardGate::CRz(t) => (1, Kernel::Unitary(rz(angle(t, gate)?))),
        StandardGate::CP(t) => (1, Kernel::Unitary(phase(angle(t, gate)?))),
        StandardGate::CCX => (2, Kernel::Unitary(x)),
        StandardGate::CSwap => (1, Kernel::Swap),
    };
    Ok(kernel)
}
