//! Circuit builder: bits, registers and a wire DAG of instructions.

use std::collections::BTreeMap;

use crate::dag::CircuitDag;
use crate::error::{IrError, IrResult};
use crate::gate::{CustomGate, Gate, GateKind, StandardGate};
use crate::instruction::{Instruction, InstructionKind};
use crate::inverse::inverse_sequence;
use crate::parameter::ParameterExpression;
use crate::qubit::{Clbit, ClbitId, Qubit, QubitId};
use crate::register::{ClassicalRegister, QuantumRegister, is_identifier};

/// Builder methods for built-in gates without angles.
macro_rules! fixed_gates {
    ($($(#[$doc:meta])* $method:ident => $gate:ident($($q:ident),+);)*) => {
        $(
            $(#[$doc])*
            pub fn $method(&mut self, $($q: QubitId),+) -> IrResult<&mut Self> {
                self.apply_standard(StandardGate::$gate, [$($q),+])
            }
        )*
    };
}

/// Builder methods for built-in gates taking one angle before the qubits.
macro_rules! rotation_gates {
    ($($(#[$doc:meta])* $method:ident => $gate:ident($($q:ident),+);)*) => {
        $(
            $(#[$doc])*
            pub fn $method(
                &mut self,
                theta: impl Into<ParameterExpression>,
                $($q: QubitId),+
            ) -> IrResult<&mut Self> {
                self.apply_standard(StandardGate::$gate(theta.into()), [$($q),+])
            }
        )*
    };
}

/// A register that has been materialized in a circuit.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterSlot<R, B> {
    /// The register descriptor.
    pub register: R,
    /// Bit ids allocated for it, least significant first.
    pub bits: Vec<B>,
}

/// A quantum circuit.
///
/// Qubit and clbit ids are allocated sequentially, so `QubitId(i)` is always
/// the `i`-th entry of [`Circuit::qubits`]. Registers are contiguous ranges of
/// those ids in the order they were added.
#[derive(Debug, Clone)]
pub struct Circuit {
    name: String,
    qubits: Vec<Qubit>,
    clbits: Vec<Clbit>,
    qregs: Vec<RegisterSlot<QuantumRegister, QubitId>>,
    cregs: Vec<RegisterSlot<ClassicalRegister, ClbitId>>,
    dag: CircuitDag,
}

impl Circuit {
    /// An empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qubits: Vec::new(),
            clbits: Vec::new(),
            qregs: Vec::new(),
            cregs: Vec::new(),
            dag: CircuitDag::new(),
        }
    }

    /// A circuit of loose (register-less) qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        (0..num_qubits).for_each(|_| {
            circuit.add_qubit();
        });
        (0..num_clbits).for_each(|_| {
            circuit.add_clbit();
        });
        circuit
    }

    /// Create a circuit containing the given quantum registers, in order.
    pub fn with_registers<'a>(
        name: impl Into<String>,
        registers: impl IntoIterator<Item = &'a QuantumRegister>,
    ) -> IrResult<Self> {
        let mut circuit = Self::new(name);
        for register in registers {
            circuit.add_register(register)?;
        }
        Ok(circuit)
    }

    fn next_qubit_id(&self) -> QubitId {
        QubitId::from(self.qubits.len())
    }

    fn next_clbit_id(&self) -> ClbitId {
        ClbitId::from(self.clbits.len())
    }

    /// Add a single qubit to the circuit.
    pub fn add_qubit(&mut self) -> QubitId {
        let id = self.next_qubit_id();
        self.qubits.push(Qubit::new(id));
        self.dag.add_qubit(id);
        id
    }

    /// Add a single classical bit to the circuit.
    pub fn add_clbit(&mut self) -> ClbitId {
        let id = self.next_clbit_id();
        self.clbits.push(Clbit::new(id));
        self.dag.add_clbit(id);
        id
    }

    /// Add a quantum register by name and size.
    pub fn add_qreg(&mut self, name: impl Into<String>, size: u32) -> IrResult<Vec<QubitId>> {
        let register = QuantumRegister::new(name, size)?;
        self.add_register(&register)
    }

    /// Add a classical register by name and size.
    pub fn add_creg(&mut self, name: impl Into<String>, size: u32) -> IrResult<Vec<ClbitId>> {
        let register = ClassicalRegister::new(name, size)?;
        self.add_classical_register(&register)
    }

    /// Materialize a quantum register descriptor, returning its qubit ids.
    pub fn add_register(&mut self, register: &QuantumRegister) -> IrResult<Vec<QubitId>> {
        self.check_register_name(register.name())?;
        let mut ids = Vec::with_capacity(register.len());
        for i in 0..register.size() {
            let id = self.next_qubit_id();
            self.qubits
                .push(Qubit::with_register(id, register.name(), i));
            self.dag.add_qubit(id);
            ids.push(id);
        }
        self.qregs.push(RegisterSlot {
            register: register.clone(),
            bits: ids.clone(),
        });
        Ok(ids)
    }

    /// Materialize a classical register descriptor, returning its bit ids.
    pub fn add_classical_register(
        &mut self,
        register: &ClassicalRegister,
    ) -> IrResult<Vec<ClbitId>> {
        self.check_register_name(register.name())?;
        let mut ids = Vec::new();
        for i in 0..register.size() {
            let id = self.next_clbit_id();
            self.clbits
                .push(Clbit::with_register(id, register.name(), i));
            self.dag.add_clbit(id);
            ids.push(id);
        }
        self.cregs.push(RegisterSlot {
            register: register.clone(),
            bits: ids.clone(),
        });
        Ok(ids)
    }

    fn check_register_name(&self, name: &str) -> IrResult<()> {
        let taken = self.qregs.iter().any(|r| r.register.name() == name)
            || self.cregs.iter().any(|r| r.register.name() == name);
        if taken {
            return Err(IrError::DuplicateRegister(name.to_string()));
        }
        Ok(())
    }

    /// Qubit ids of the named quantum register.
    pub fn qreg(&self, name: &str) -> Option<&[QubitId]> {
        self.qregs
            .iter()
            .find(|r| r.register.name() == name)
            .map(|r| r.bits.as_slice())
    }

    /// Bit ids of the named classical register.
    pub fn creg(&self, name: &str) -> Option<&[ClbitId]> {
        self.cregs
            .iter()
            .find(|r| r.register.name() == name)
            .map(|r| r.bits.as_slice())
    }

    /// Quantum registers in declaration order.
    pub fn qregs(&self) -> &[RegisterSlot<QuantumRegister, QubitId>] {
        &self.qregs
    }

    /// Classical registers in declaration order.
    pub fn cregs(&self) -> &[RegisterSlot<ClassicalRegister, ClbitId>] {
        &self.cregs
    }

    // =========================================================================
    // Built-in gates
    // =========================================================================

    fn apply_standard(
        &mut self,
        gate: StandardGate,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::gate(gate, qubits))?;
        Ok(self)
    }

    fixed_gates! {
        /// Hadamard.
        h => H(qubit);
        /// Pauli X.
        x => X(qubit);
        /// Pauli Y.
        y => Y(qubit);
        /// Pauli Z.
        z => Z(qubit);
        /// `√Z`.
        s => S(qubit);
        /// `S†`.
        sdg => Sdg(qubit);
        /// `⁴√Z`.
        t => T(qubit);
        /// `T†`.
        tdg => Tdg(qubit);
        /// `√X`.
        sx => SX(qubit);
        /// `√X†`.
        sxdg => SXdg(qubit);
        /// CNOT.
        cx => CX(control, target);
        /// Controlled Y.
        cy => CY(control, target);
        /// Controlled Z.
        cz => CZ(control, target);
        /// Controlled Hadamard.
        ch => CH(control, target);
        /// Exchange two qubits.
        swap => Swap(a, b);
        /// Toffoli.
        ccx => CCX(c1, c2, target);
        /// Fredkin.
        cswap => CSwap(control, a, b);
    }

    rotation_gates! {
        /// X rotation.
        rx => Rx(qubit);
        /// Y rotation.
        ry => Ry(qubit);
        /// Z rotation.
        rz => Rz(qubit);
        /// Phase `diag(1, e^{iθ})`.
        p => P(qubit);
        /// Controlled X rotation.
        crx => CRx(control, target);
        /// Controlled Y rotation.
        cry => CRy(control, target);
        /// Controlled Z rotation.
        crz => CRz(control, target);
        /// Controlled phase.
        cp => CP(control, target);
    }

    /// General single-qubit rotation `U(θ, φ, λ)`.
    pub fn u(
        &mut self,
        theta: impl Into<ParameterExpression>,
        phi: impl Into<ParameterExpression>,
        lambda: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        let gate = StandardGate::U(theta.into(), phi.into(), lambda.into());
        self.apply_standard(gate, [qubit])
    }

    // =========================================================================
    // Composition
    // =========================================================================

    /// Apply any gate.
    pub fn gate(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.dag.apply(Instruction::gate(gate, qubits))?;
        Ok(self)
    }

    /// Append a copy of `gate` on `qubits` (controls first for controlled gates).
    pub fn append(
        &mut self,
        gate: &Gate,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.gate(gate.clone(), qubits)
    }

    /// Inline every instruction of `other`, mapping its `i`-th qubit to `qubits[i]`.
    ///
    /// `other` must not contain classical operations.
    pub fn compose(&mut self, other: &Circuit, qubits: &[QubitId]) -> IrResult<&mut Self> {
        if qubits.len() != other.num_qubits() {
            return Err(IrError::QubitCountMismatch {
                gate_name: other.name.clone(),
                expected: u32::try_from(other.num_qubits()).unwrap_or(u32::MAX),
                got: u32::try_from(qubits.len()).unwrap_or(u32::MAX),
            });
        }
        for inst in other.instructions() {
            self.dag.apply(inst.relabel(qubits)?)?;
        }
        Ok(self)
    }

    /// Freeze this circuit into a composite gate named after the circuit.
    ///
    /// Non-identifier characters in the circuit name become `_`.
    pub fn to_gate(&self) -> IrResult<Gate> {
        self.to_gate_named(sanitize_identifier(&self.name))
    }

    /// Freeze this circuit into a composite gate with the given identifier.
    ///
    /// The gate's label is the circuit name. Barriers and delays are dropped
    /// from the body; measurement and reset are rejected.
    pub fn to_gate_named(&self, name: impl Into<String>) -> IrResult<Gate> {
        let mut body = Vec::with_capacity(self.size());
        for inst in self.instructions() {
            if !inst.is_unitary() {
                return Err(IrError::NonUnitary(inst.name().to_string()));
            }
            if !inst.is_directive() {
                body.push(inst.clone());
            }
        }
        let width = u32::try_from(self.num_qubits()).unwrap_or(u32::MAX);
        let custom = CustomGate::new(name, width).with_definition(body)?;
        Ok(Gate::custom(custom).with_label(self.name.clone()))
    }

    /// The adjoint circuit: same wires and registers, instructions reversed
    /// and inverted. The name gains a `_dg` suffix.
    pub fn inverse(&self) -> IrResult<Circuit> {
        let mut inverted = self.empty_like(format!("{}_dg", self.name));
        let ops: Vec<&Instruction> = self.instructions();
        for inst in inverse_sequence(ops.into_iter())? {
            inverted.dag.apply(inst)?;
        }
        Ok(inverted)
    }

    /// A circuit with the same bits and registers and no instructions.
    pub fn empty_like(&self, name: impl Into<String>) -> Circuit {
        let mut dag = CircuitDag::new();
        for q in &self.qubits {
            dag.add_qubit(q.id);
        }
        for c in &self.clbits {
            dag.add_clbit(c.id);
        }
        Circuit {
            name: name.into(),
            qubits: self.qubits.clone(),
            clbits: self.clbits.clone(),
            qregs: self.qregs.clone(),
            cregs: self.cregs.clone(),
            dag,
        }
    }

    // =========================================================================
    // Non-gate instructions
    // =========================================================================

    fn push(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        self.dag.apply(instruction)?;
        Ok(self)
    }

    /// Measure `qubit` into `clbit`.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.push(Instruction::measure(qubit, clbit))
    }

    /// Measure qubit `i` into clbit `i` for every qubit, adding loose
    /// classical bits until there are enough.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        let missing = self.qubits.len().saturating_sub(self.clbits.len());
        for _ in 0..missing {
            self.add_clbit();
        }
        let pairs: (Vec<QubitId>, Vec<ClbitId>) = self
            .qubits
            .iter()
            .zip(&self.clbits)
            .map(|(q, c)| (q.id, c.id))
            .unzip();
        self.push(Instruction::measure_many(pairs.0, pairs.1)?)
    }

    /// Measure quantum register `qreg` into classical register `creg`, bit by bit.
    pub fn measure_register(&mut self, qreg: &str, creg: &str) -> IrResult<&mut Self> {
        let missing = |name: &str, what: &str| IrError::InvalidRegister {
            name: name.to_string(),
            reason: format!("no such {what} register"),
        };
        let qubits = self.qreg(qreg).ok_or_else(|| missing(qreg, "quantum"))?.to_vec();
        let clbits = self.creg(creg).ok_or_else(|| missing(creg, "classical"))?.to_vec();
        if qubits.len() != clbits.len() {
            return Err(IrError::InvalidRegister {
                name: creg.to_string(),
                reason: format!(
                    "has {} bits but register '{qreg}' has {} qubits",
                    clbits.len(),
                    qubits.len()
                ),
            });
        }
        for (q, c) in qubits.into_iter().zip(clbits) {
            self.measure(q, c)?;
        }
        Ok(self)
    }

    /// Reset `qubit` to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push(Instruction::reset(qubit))
    }

    /// Barrier across `qubits`.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.push(Instruction::barrier(qubits))
    }

    /// Barrier across every qubit.
    pub fn barrier_all(&mut self) -> IrResult<&mut Self> {
        let all: Vec<QubitId> = self.qubits.iter().map(|q| q.id).collect();
        self.barrier(all)
    }

    /// Idle `qubit` for `duration`.
    pub fn delay(&mut self, qubit: QubitId, duration: u64) -> IrResult<&mut Self> {
        self.push(Instruction::delay(qubit, duration))
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Circuit name; also the label of gates made from it.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the circuit.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Width.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// Longest chain of operations, barriers excluded.
    pub fn depth(&self) -> usize {
        self.dag.depth()
    }

    /// Number of instructions, barriers included.
    pub fn size(&self) -> usize {
        self.dag.num_ops()
    }

    /// Instructions in application order.
    pub fn instructions(&self) -> Vec<&Instruction> {
        self.dag.topological_ops().map(|(_, inst)| inst).collect()
    }

    /// Instruction counts keyed by operation name, sorted by name.
    ///
    /// Controlled modifiers are counted as `c<n>_<base>` so that a controlled
    /// adder is not confused with the adder itself.
    pub fn count_ops(&self) -> BTreeMap<String, usize> {
        self.instructions()
            .into_iter()
            .fold(BTreeMap::new(), |mut counts, inst| {
                *counts.entry(op_key(inst)).or_insert(0) += 1;
                counts
            })
    }

    /// The wire DAG.
    pub fn dag(&self) -> &CircuitDag {
        &self.dag
    }

    /// All qubits, indexed by id.
    pub fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    /// All classical bits, indexed by id.
    pub fn clbits(&self) -> &[Clbit] {
        &self.clbits
    }

    /// The qubit with id `id`.
    pub fn qubit(&self, id: QubitId) -> Option<&Qubit> {
        self.qubits.get(id.index())
    }

    /// The classical bit with id `id`.
    pub fn clbit(&self, id: ClbitId) -> Option<&Clbit> {
        self.clbits.get(id.index())
    }

    /// Serialize the instruction list as pretty JSON.
    pub fn to_json(&self) -> IrResult<String> {
        serde_json::to_string_pretty(&self.instructions())
            .map_err(|e| IrError::Serialization(e.to_string()))
    }
}

fn op_key(inst: &Instruction) -> String {
    match &inst.kind {
        InstructionKind::Gate(Gate {
            kind:
                GateKind::Controlled {
                    base,
                    num_ctrl_qubits,
                },
            ..
        }) => format!("c{num_ctrl_qubits}_{}", base.name()),
        _ => inst.name().to_string(),
    }
}

/// Turn an arbitrary circuit name into a gate identifier.
pub fn sanitize_identifier(name: &str) -> String {
    if is_identifier(name) {
        return name.to_string();
    }
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if !out.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        out.insert(0, '_');
    }
    out
}
