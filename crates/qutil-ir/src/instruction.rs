//! Circuit instructions: an operation plus the wires it touches.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::qubit::{ClbitId, QubitId};

/// What an instruction does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// Apply a gate.
    Gate(Gate),
    /// Measure each qubit into the classical bit at the same position.
    Measure,
    /// Reset to |0⟩.
    Reset,
    /// Scheduling fence; no effect on the state.
    Barrier,
    /// Idle period; no effect on the state.
    Delay {
        /// Duration in backend-defined units.
        duration: u64,
    },
}

/// An operation applied to specific qubits and classical bits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The operation.
    pub kind: InstructionKind,
    /// Qubit operands. Controls of a controlled gate come first.
    pub qubits: Vec<QubitId>,
    /// Classical operands; only measurements have any.
    pub clbits: Vec<ClbitId>,
}

impl Instruction {
    fn on_qubits(kind: InstructionKind, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind,
            qubits: qubits.into_iter().collect(),
            clbits: Vec::new(),
        }
    }

    /// Apply `gate` to `qubits`.
    pub fn gate(gate: impl Into<Gate>, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self::on_qubits(InstructionKind::Gate(gate.into()), qubits)
    }

    /// Measure one qubit into one classical bit.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure,
            qubits: vec![qubit],
            clbits: vec![clbit],
        }
    }

    /// Measure `qubits[i]` into `clbits[i]` for every `i`.
    pub fn measure_many(
        qubits: impl IntoIterator<Item = QubitId>,
        clbits: impl IntoIterator<Item = ClbitId>,
    ) -> IrResult<Self> {
        let qubits: Vec<_> = qubits.into_iter().collect();
        let clbits: Vec<_> = clbits.into_iter().collect();
        if qubits.len() != clbits.len() {
            return Err(IrError::InvalidDag(format!(
                "cannot measure {} qubits into {} classical bits",
                qubits.len(),
                clbits.len(),
            )));
        }
        Ok(Self {
            kind: InstructionKind::Measure,
            qubits,
            clbits,
        })
    }

    /// Reset one qubit.
    pub fn reset(qubit: QubitId) -> Self {
        Self::on_qubits(InstructionKind::Reset, [qubit])
    }

    /// Barrier across `qubits`.
    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self::on_qubits(InstructionKind::Barrier, qubits)
    }

    /// Delay on one qubit.
    pub fn delay(qubit: QubitId, duration: u64) -> Self {
        Self::on_qubits(InstructionKind::Delay { duration }, [qubit])
    }

    /// The gate, for gate instructions.
    pub fn as_gate(&self) -> Option<&Gate> {
        match &self.kind {
            InstructionKind::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// Barriers and delays: instructions that leave the state untouched.
    pub fn is_directive(&self) -> bool {
        matches!(
            self.kind,
            InstructionKind::Barrier | InstructionKind::Delay { .. }
        )
    }

    /// Whether the instruction can appear in a gate body or be inverted.
    pub fn is_unitary(&self) -> bool {
        !matches!(self.kind, InstructionKind::Measure | InstructionKind::Reset)
    }

    /// Gate name, or the keyword of a non-gate instruction.
    pub fn name(&self) -> &str {
        match &self.kind {
            InstructionKind::Gate(g) => g.name(),
            InstructionKind::Measure => "measure",
            InstructionKind::Reset => "reset",
            InstructionKind::Barrier => "barrier",
            InstructionKind::Delay { .. } => "delay",
        }
    }

    /// A gate gets exactly as many operands as it has qubits, and no qubit
    /// appears twice.
    pub fn check_operands(&self) -> IrResult<()> {
        let gate_name = self.as_gate().map(|g| g.name().to_string());
        if let InstructionKind::Gate(gate) = &self.kind {
            let got = self.qubits.len();
            if gate.num_qubits() as usize != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected: gate.num_qubits(),
                    got: u32::try_from(got).unwrap_or(u32::MAX),
                });
            }
        }
        let mut seen = FxHashSet::default();
        match self.qubits.iter().find(|&&q| !seen.insert(q)) {
            Some(&qubit) => Err(IrError::DuplicateQubit { qubit, gate_name }),
            None => Ok(()),
        }
    }

    /// The same instruction with local qubit `i` replaced by `targets[i]`.
    ///
    /// Used to inline gate bodies and composed circuits, so classical
    /// operands are rejected.
    pub fn relabel(&self, targets: &[QubitId]) -> IrResult<Self> {
        if !self.clbits.is_empty() {
            return Err(IrError::NonUnitary(self.name().to_string()));
        }
        let qubits = self
            .qubits
            .iter()
            .map(|&local| {
                targets
                    .get(local.index())
                    .copied()
                    .ok_or_else(|| IrError::QubitNotFound {
                        qubit: local,
                        gate_name: Some(self.name().to_string()),
                    })
            })
            .collect::<IrResult<Vec<_>>>()?;
        Ok(Self {
            kind: self.kind.clone(),
            qubits,
            clbits: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::StandardGate;

    #[test]
    fn test_gate_instruction() {
        let inst = Instruction::gate(StandardGate::H, [QubitId(0)]);
        assert!(inst.as_gate().is_some());
        assert!(inst.is_unitary());
        assert!(!inst.is_directive());
        assert_eq!(inst.name(), "h");
    }

    #[test]
    fn test_measure_is_not_unitary() {
        let inst = Instruction::measure(QubitId(0), ClbitId(0));
        assert!(!inst.is_unitary());
        assert_eq!(inst.clbits, vec![ClbitId(0)]);
        assert!(!Instruction::reset(QubitId(1)).is_unitary());
    }

    #[test]
    fn test_measure_many_length_mismatch() {
        let err = Instruction::measure_many([QubitId(0), QubitId(1)], [ClbitId(0)]).unwrap_err();
        assert!(matches!(err, IrError::InvalidDag(_)));
    }

    #[test]
    fn test_directives() {
        assert!(Instruction::barrier([QubitId(0), QubitId(2)]).is_directive());
        assert!(Instruction::delay(QubitId(0), 40).is_directive());
        assert!(Instruction::delay(QubitId(0), 40).is_unitary());
    }

    #[test]
    fn test_check_operands() {
        assert!(Instruction::gate(StandardGate::CX, [QubitId(0), QubitId(1)])
            .check_operands()
            .is_ok());
        assert!(matches!(
            Instruction::gate(StandardGate::CX, [QubitId(0)]).check_operands(),
            Err(IrError::QubitCountMismatch {
                expected: 2,
                got: 1,
                ..
            })
        ));
        assert!(matches!(
            Instruction::gate(StandardGate::Swap, [QubitId(1), QubitId(1)]).check_operands(),
            Err(IrError::DuplicateQubit { .. })
        ));
        assert!(matches!(
            Instruction::barrier([QubitId(0), QubitId(0)]).check_operands(),
            Err(IrError::DuplicateQubit { .. })
        ));
    }

    #[test]
    fn test_relabel() {
        let inst = Instruction::gate(StandardGate::CX, [QubitId(0), QubitId(1)]);
        let mapped = inst.relabel(&[QubitId(4), QubitId(2)]).unwrap();
        assert_eq!(mapped.qubits, vec![QubitId(4), QubitId(2)]);

        let err = inst.relabel(&[QubitId(4)]).unwrap_err();
        assert!(matches!(err, IrError::QubitNotFound { .. }));

        let measure = Instruction::measure(QubitId(0), ClbitId(0));
        assert!(matches!(
            measure.relabel(&[QubitId(3)]),
            Err(IrError::NonUnitary(_))
        ));
    }
}
