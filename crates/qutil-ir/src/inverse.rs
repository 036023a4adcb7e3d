//! Gate and instruction inversion.
//!
//! Standard gates invert algebraically. Composite gates invert by reversing
//! their body and inverting each element; the inverse of `name` is
//! `name_dg` (and back again), with a `†` appended to or stripped from the label.

use num_complex::Complex64;
use std::sync::Arc;

use crate::error::{IrError, IrResult};
use crate::gate::{CustomGate, Gate, GateKind, StandardGate};
use crate::instruction::{Instruction, InstructionKind};
use crate::parameter::ParameterExpression;

const DAGGER_SUFFIX: &str = "_dg";
const DAGGER: char = '†';

/// Adjoint of a built-in gate.
///
/// `S`, `T` and `SX` swap with their daggers, `U(θ, φ, λ)` becomes
/// `U(-θ, -λ, -φ)`, every other angle is negated, and the remaining gates are
/// their own inverse.
pub fn inverse_gate(gate: &StandardGate) -> StandardGate {
    use StandardGate as G;
    match gate {
        G::S => G::Sdg,
        G::Sdg => G::S,
        G::T => G::Tdg,
        G::Tdg => G::T,
        G::SX => G::SXdg,
        G::SXdg => G::SX,
        G::U(theta, phi, lambda) => G::U(theta.negated(), lambda.negated(), phi.negated()),
        g if !g.angles().is_empty() => g.map_angles(ParameterExpression::negated),
        other => {
            debug_assert!(is_self_inverse(other));
            other.clone()
        }
    }
}

/// Check if a gate is self-inverse (Hermitian).
pub fn is_self_inverse(gate: &StandardGate) -> bool {
    matches!(
        gate,
        StandardGate::I
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::Swap
            | StandardGate::CCX
            | StandardGate::CSwap
    )
}

/// Adjoint of one instruction. Directives are kept as they are; measurement
/// and reset have no inverse.
pub fn inverse_instruction(instruction: &Instruction) -> IrResult<Instruction> {
    if !instruction.is_unitary() {
        return Err(IrError::NonUnitary(instruction.name().to_string()));
    }
    let mut inverted = instruction.clone();
    if let InstructionKind::Gate(gate) = &instruction.kind {
        inverted.kind = InstructionKind::Gate(gate.inverse()?);
    }
    Ok(inverted)
}

/// Invert a sequence of instructions: reversed order, each element inverted.
pub fn inverse_sequence<'a>(
    instructions: impl DoubleEndedIterator<Item = &'a Instruction>,
) -> IrResult<Vec<Instruction>> {
    instructions.rev().map(inverse_instruction).collect()
}

impl Gate {
    /// The adjoint of this gate.
    ///
    /// Fails with [`IrError::OpaqueGate`] for a custom gate that has neither a
    /// body nor a matrix.
    pub fn inverse(&self) -> IrResult<Gate> {
        match &self.kind {
            GateKind::Standard(g) => Ok(Gate {
                kind: GateKind::Standard(inverse_gate(g)),
                label: self.label.as_deref().map(toggle_dagger_label),
            }),
            GateKind::Custom(custom) => {
                if custom.definition.is_none() && custom.matrix.is_none() {
                    return Err(IrError::OpaqueGate(custom.name.clone()));
                }
                let definition = custom
                    .definition
                    .as_deref()
                    .map(inverse_body)
                    .transpose()?;
                let matrix = custom
                    .matrix
                    .as_ref()
                    .map(|m| adjoint(m, 1usize << custom.num_qubits));
                Ok(Gate {
                    kind: GateKind::Custom(CustomGate {
                        name: toggle_dagger_name(&custom.name),
                        num_qubits: custom.num_qubits,
                        params: custom.params.clone(),
                        matrix,
                        definition: definition.map(Into::into),
                    }),
                    label: self.label.as_deref().map(toggle_dagger_label),
                })
            }
            GateKind::Controlled {
                base,
                num_ctrl_qubits,
            } => Ok(Gate {
                kind: GateKind::Controlled {
                    base: Box::new(base.inverse()?),
                    num_ctrl_qubits: *num_ctrl_qubits,
                },
                label: self.label.as_deref().map(toggle_dagger_label),
            }),
        }
    }
}

/// Like [`inverse_sequence`], but sub-gates that share a body (the halves of
/// a power) are inverted once and keep sharing.
fn inverse_body(body: &[Instruction]) -> IrResult<Vec<Instruction>> {
    let mut inverted: Vec<(&Gate, Gate)> = Vec::new();
    body.iter()
        .rev()
        .map(|inst| {
            let Some(gate) = inst.as_gate() else {
                return inverse_instruction(inst);
            };
            let adjoint = match inverted.iter().find(|(seen, _)| shares_body(seen, gate)) {
                Some((_, adjoint)) => adjoint.clone(),
                None => {
                    let adjoint = gate.inverse()?;
                    inverted.push((gate, adjoint.clone()));
                    adjoint
                }
            };
            let mut out = inst.clone();
            out.kind = InstructionKind::Gate(adjoint);
            Ok(out)
        })
        .collect()
}

fn shares_body(a: &Gate, b: &Gate) -> bool {
    match (&a.kind, &b.kind) {
        (GateKind::Custom(x), GateKind::Custom(y)) => {
            a.label == b.label
                && x.name == y.name
                && x.params == y.params
                && x.matrix == y.matrix
                && matches!(
                    (&x.definition, &y.definition),
                    (Some(p), Some(q)) if Arc::ptr_eq(p, q)
                )
        }
        _ => false,
    }
}

fn toggle_dagger_name(name: &str) -> String {
    match name.strip_suffix(DAGGER_SUFFIX) {
        Some(base) => base.to_string(),
        None => format!("{name}{DAGGER_SUFFIX}"),
    }
}

fn toggle_dagger_label(label: &str) -> String {
    match label.strip_suffix(DAGGER) {
        Some(base) => base.to_string(),
        None => format!("{label}{DAGGER}"),
    }
}

/// Conjugate transpose of a row-major `dim × dim` matrix.
fn adjoint(matrix: &[Complex64], dim: usize) -> Vec<Complex64> {
    let mut out = vec![Complex64::new(0.0, 0.0); dim * dim];
    for row in 0..dim {
        for col in 0..dim {
            out[col * dim + row] = matrix[row * dim + col].conj();
        }
    }
    out
}
