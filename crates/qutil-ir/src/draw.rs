//! Plain-text circuit rendering.
//!
//! ```text
//! circuit QFT (3 qubits, 0 clbits)
//!   qubit[3] q
//!   h q[2]
//!   cp(pi/2) q[2], q[1]
//! ```

use std::fmt::Write as _;

use crate::circuit::Circuit;
use crate::gate::{Gate, GateKind};
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId};

/// Render a circuit as one line per instruction, with register-qualified operands.
pub fn text(circuit: &Circuit) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "circuit {} ({} qubits, {} clbits)",
        circuit.name(),
        circuit.num_qubits(),
        circuit.num_clbits()
    );
    for slot in circuit.qregs() {
        let _ = writeln!(out, "  {}", slot.register);
    }
    for slot in circuit.cregs() {
        let _ = writeln!(out, "  {}", slot.register);
    }
    for inst in circuit.instructions() {
        let _ = writeln!(out, "  {}", instruction_line(circuit, inst));
    }
    out
}

fn instruction_line(circuit: &Circuit, inst: &Instruction) -> String {
    let qubits = qubit_names(circuit, &inst.qubits);
    match &inst.kind {
        InstructionKind::Gate(gate) => format!("{} {qubits}", gate_head(gate)),
        InstructionKind::Measure => {
            format!("measure {qubits} -> {}", clbit_names(circuit, &inst.clbits))
        }
        InstructionKind::Reset => format!("reset {qubits}"),
        InstructionKind::Barrier => format!("barrier {qubits}"),
        InstructionKind::Delay { duration } => format!("delay[{duration}] {qubits}"),
    }
}

fn gate_head(gate: &Gate) -> String {
    match &gate.kind {
        GateKind::Standard(g) => {
            let params = g.angles();
            if params.is_empty() {
                g.name().to_string()
            } else {
                let params: Vec<_> = params.iter().map(|p| p.to_pi_string()).collect();
                format!("{}({})", g.name(), params.join(", "))
            }
        }
        GateKind::Custom(_) => match &gate.label {
            Some(label) if label != gate.name() => format!("{}[{label}]", gate.name()),
            _ => gate.name().to_string(),
        },
        GateKind::Controlled {
            base,
            num_ctrl_qubits,
        } => format!("ctrl({num_ctrl_qubits}) @ {}", gate_head(base)),
    }
}

fn qubit_names(circuit: &Circuit, qubits: &[QubitId]) -> String {
    qubits
        .iter()
        .map(|&q| circuit.qubit(q).map_or_else(|| q.to_string(), ToString::to_string))
        .collect::<Vec<_>>()
        .join(", ")
}

fn clbit_names(circuit: &Circuit, clbits: &[ClbitId]) -> String {
    clbits
        .iter()
        .map(|&c| circuit.clbit(c).map_or_else(|| c.to_string(), ToString::to_string))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_text_uses_register_names() {
        let mut circuit = Circuit::new("adder");
        let a = circuit.add_qreg("A", 2).unwrap();
        let b = circuit.add_qreg("B", 1).unwrap();
        circuit.cp(PI / 2.0, b[0], a[1]).unwrap();
        circuit.barrier_all().unwrap();

        let drawing = text(&circuit);
        assert!(drawing.starts_with("circuit adder (3 qubits, 0 clbits)"));
        assert!(drawing.contains("  qubit[2] A\n"));
        assert!(drawing.contains("  cp(pi/2) B[0], A[1]\n"));
        assert!(drawing.contains("  barrier A[0], A[1], B[0]\n"));
    }

    #[test]
    fn test_text_measure_and_controlled() {
        let mut inner = Circuit::with_size("inc", 1, 0);
        inner.x(QubitId(0)).unwrap();
        let gate = inner.to_gate().unwrap().control(2);

        let mut circuit = Circuit::with_size("c", 3, 1);
        circuit
            .append(&gate, [QubitId(0), QubitId(1), QubitId(2)])
            .unwrap();
        circuit.measure(QubitId(2), ClbitId(0)).unwrap();

        let drawing = text(&circuit);
        assert!(drawing.contains("ctrl(2) @ inc q0, q1, q2"));
        assert!(drawing.contains("measure q2 -> c0"));
    }
}
