//! QASM3 emitter for serializing circuits.

use rustc_hash::{FxHashMap, FxHashSet};

use qutil_ir::circuit::sanitize_identifier;
use qutil_ir::{Circuit, ClbitId, CustomGate, Gate, GateKind, Instruction, InstructionKind, QubitId};

use crate::error::{EmitError, EmitResult};

/// Gate names declared by `stdgates.inc` plus the builtin `U`.
const STDGATES: &[&str] = &[
    "p", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "sx", "rx", "ry", "rz", "cx", "cy", "cz",
    "cp", "crx", "cry", "crz", "ch", "swap", "ccx", "cswap", "cu", "CX", "phase", "cphase", "id",
    "u1", "u2", "u3", "U", "gphase",
];

/// Gates the IR knows that `stdgates.inc` lacks.
const EXTRA_DEFINITIONS: &[(&str, &str)] = &[
    ("sxdg", "gate sxdg a { inv @ sx a; }"),
    ("u", "gate u(theta, phi, lambda) a { U(theta, phi, lambda) a; }"),
];

/// Emit a circuit as QASM3 source code.
///
/// Composite gates become `gate` definitions, written before first use with
/// nested definitions first. Registers are declared by name; qubits and bits
/// outside any register are gathered into anonymous `q` and `c` arrays.
pub fn emit(circuit: &Circuit) -> EmitResult<String> {
    let mut emitter = Emitter::new();
    emitter.emit_circuit(circuit)
}

/// QASM3 emitter.
struct Emitter {
    output: String,
    indent: usize,
    /// Distinct composite gates in definition order, with their QASM name.
    definitions: Vec<(CustomGate, String)>,
    /// QASM name of every visited body, keyed by gate name and allocation.
    resolved: FxHashMap<BodyKey, String>,
    names: FxHashSet<String>,
}

type BodyKey = (String, *const Instruction);

fn body_key(custom: &CustomGate) -> Option<BodyKey> {
    custom
        .definition
        .as_ref()
        .map(|body| (custom.name.clone(), body.as_ptr()))
}

impl Emitter {
    fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
            definitions: Vec::new(),
            resolved: FxHashMap::default(),
            names: STDGATES
                .iter()
                .chain(EXTRA_DEFINITIONS.iter().map(|(name, _)| name))
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    fn emit_circuit(&mut self, circuit: &Circuit) -> EmitResult<String> {
        self.writeln("OPENQASM 3.0;");
        self.writeln("include \"stdgates.inc\";");
        self.writeln("");

        for slot in circuit.qregs() {
            self.names.insert(slot.register.name().to_string());
        }
        for slot in circuit.cregs() {
            self.names.insert(slot.register.name().to_string());
        }
        let (qubit_names, loose_qubits) = self.name_bits(
            "q",
            circuit
                .qubits()
                .iter()
                .map(|q| (q.id.index(), q.location.as_ref())),
        );
        let (clbit_names, loose_clbits) = self.name_bits(
            "c",
            circuit
                .clbits()
                .iter()
                .map(|c| (c.id.index(), c.location.as_ref())),
        );

        let ops = circuit.instructions();
        for inst in &ops {
            if let Some(gate) = inst.as_gate() {
                self.collect_definitions(gate)?;
            }
        }
        self.emit_extra_definitions(&ops);
        self.emit_definitions()?;

        for slot in circuit.qregs() {
            self.writeln(&format!("{};", slot.register));
        }
        if let Some((name, size)) = &loose_qubits {
            self.writeln(&format!("qubit[{size}] {name};"));
        }
        for slot in circuit.cregs() {
            self.writeln(&format!("{};", slot.register));
        }
        if let Some((name, size)) = &loose_clbits {
            self.writeln(&format!("bit[{size}] {name};"));
        }
        if circuit.num_qubits() > 0 || circuit.num_clbits() > 0 {
            self.writeln("");
        }

        let qubit = |id: QubitId| -> EmitResult<&str> {
            qubit_names
                .get(id.index())
                .map(String::as_str)
                .ok_or_else(|| EmitError::UnknownBit {
                    kind: "qubit",
                    id: id.to_string(),
                })
        };
        let clbit = |id: ClbitId| -> EmitResult<&str> {
            clbit_names
                .get(id.index())
                .map(String::as_str)
                .ok_or_else(|| EmitError::UnknownBit {
                    kind: "clbit",
                    id: id.to_string(),
                })
        };

        for inst in ops {
            let qubits = inst
                .qubits
                .iter()
                .map(|&q| qubit(q))
                .collect::<EmitResult<Vec<_>>>()?
                .join(", ");
            match &inst.kind {
                InstructionKind::Gate(gate) => {
                    let head = self.gate_head(gate)?;
                    self.writeln(&format!("{head} {qubits};"));
                }
                InstructionKind::Measure => {
                    for (&q, &c) in inst.qubits.iter().zip(&inst.clbits) {
                        let line = format!("{} = measure {};", clbit(c)?, qubit(q)?);
                        self.writeln(&line);
                    }
                }
                InstructionKind::Reset => self.writeln(&format!("reset {qubits};")),
                InstructionKind::Barrier => {
                    if qubits.is_empty() {
                        self.writeln("barrier;");
                    } else {
                        self.writeln(&format!("barrier {qubits};"));
                    }
                }
                InstructionKind::Delay { duration } => {
                    self.writeln(&format!("delay[{duration}dt] {qubits};"));
                }
            }
        }

        Ok(std::mem::take(&mut self.output))
    }

    /// Operand names for every bit, indexed by id, plus the anonymous array
    /// (name, size) holding bits outside any register.
    fn name_bits<'a>(
        &mut self,
        base: &str,
        bits: impl Iterator<Item = (usize, Option<&'a qutil_ir::BitLocation>)>,
    ) -> (Vec<String>, Option<(String, usize)>) {
        let bits: Vec<_> = bits.collect();
        let loose_count = bits.iter().filter(|(_, loc)| loc.is_none()).count();
        let loose_name = (loose_count > 0).then(|| self.fresh_name(base));

        let mut names = vec![String::new(); bits.len()];
        let mut next_loose = 0;
        for (index, location) in bits {
            let Some(slot) = names.get_mut(index) else {
                continue;
            };
            *slot = match (location, &loose_name) {
                (Some(loc), _) => format!("{}[{}]", loc.register, loc.index),
                (None, Some(name)) => {
                    next_loose += 1;
                    format!("{name}[{}]", next_loose - 1)
                }
                (None, None) => continue,
            };
        }
        (names, loose_name.map(|name| (name, loose_count)))
    }

    /// A global identifier not yet in use, derived from `base`.
    fn fresh_name(&mut self, base: &str) -> String {
        let base = sanitize_identifier(base);
        let mut candidate = base.clone();
        let mut suffix = 1;
        while self.names.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        self.names.insert(candidate.clone());
        candidate
    }

    /// Register every composite gate reachable from `gate`, children first.
    ///
    /// Bodies already visited are skipped by allocation, so the halves of a
    /// `name_pow_k` gate cost one visit. Equal gates from different
    /// allocations share one definition.
    fn collect_definitions(&mut self, gate: &Gate) -> EmitResult<()> {
        match &gate.kind {
            GateKind::Standard(_) => Ok(()),
            GateKind::Controlled { base, .. } => self.collect_definitions(base),
            GateKind::Custom(custom) => {
                if self.definition_name(custom).is_some() {
                    return Ok(());
                }
                if !custom.params.is_empty() {
                    return Err(EmitError::ParameterizedDefinition(custom.name.clone()));
                }
                let (key, body) = body_key(custom)
                    .zip(custom.definition.as_deref())
                    .ok_or_else(|| EmitError::OpaqueGate(custom.name.clone()))?;
                for inst in body {
                    if let Some(inner) = inst.as_gate() {
                        self.collect_definitions(inner)?;
                    }
                }
                let known = self
                    .definitions
                    .iter()
                    .find(|(known, _)| self.same_definition(known, custom))
                    .map(|(_, name)| name.clone());
                let name = match known {
                    Some(name) => name,
                    None => {
                        let name = self.fresh_name(&custom.name);
                        self.definitions.push((custom.clone(), name.clone()));
                        name
                    }
                };
                self.resolved.insert(key, name);
                Ok(())
            }
        }
    }

    fn definition_name(&self, custom: &CustomGate) -> Option<&str> {
        body_key(custom)
            .and_then(|key| self.resolved.get(&key))
            .map(String::as_str)
    }

    /// Structural equality, comparing nested composites by resolved name.
    fn same_definition(&self, a: &CustomGate, b: &CustomGate) -> bool {
        let (Some(x), Some(y)) = (a.definition.as_deref(), b.definition.as_deref()) else {
            return false;
        };
        a.name == b.name
            && a.num_qubits == b.num_qubits
            && a.params == b.params
            && x.len() == y.len()
            && x.iter().zip(y).all(|(i, j)| {
                i.qubits == j.qubits
                    && match (i.as_gate(), j.as_gate()) {
                        (Some(g), Some(h)) => self.same_gate(g, h),
                        (None, None) => i.kind == j.kind,
                        _ => false,
                    }
            })
    }

    fn same_gate(&self, a: &Gate, b: &Gate) -> bool {
        match (&a.kind, &b.kind) {
            (GateKind::Standard(x), GateKind::Standard(y)) => x == y,
            (
                GateKind::Controlled {
                    base: x,
                    num_ctrl_qubits: m,
                },
                GateKind::Controlled {
                    base: y,
                    num_ctrl_qubits: n,
                },
            ) => m == n && self.same_gate(x, y),
            (GateKind::Custom(x), GateKind::Custom(y)) => {
                let name = self.definition_name(x);
                name.is_some() && name == self.definition_name(y)
            }
            _ => false,
        }
    }

    fn emit_extra_definitions(&mut self, ops: &[&Instruction]) {
        fn standard_name(mut gate: &Gate) -> Option<&'static str> {
            loop {
                match &gate.kind {
                    GateKind::Standard(g) => return Some(g.name()),
                    GateKind::Controlled { base, .. } => gate = &**base,
                    GateKind::Custom(_) => return None,
                }
            }
        }

        // Every composite body is already in `definitions`.
        let used: FxHashSet<&'static str> = ops
            .iter()
            .copied()
            .chain(
                self.definitions
                    .iter()
                    .flat_map(|(custom, _)| custom.definition.as_deref().unwrap_or_default()),
            )
            .filter_map(Instruction::as_gate)
            .filter_map(standard_name)
            .collect();

        let mut any = false;
        for (name, definition) in EXTRA_DEFINITIONS {
            if used.contains(name) {
                self.writeln(definition);
                any = true;
            }
        }
        if any {
            self.writeln("");
        }
    }

    fn emit_definitions(&mut self) -> EmitResult<()> {
        for index in 0..self.definitions.len() {
            let (custom, name) = self.definitions[index].clone();
            let args: Vec<String> = (0..custom.num_qubits).map(|i| format!("q{i}")).collect();
            self.writeln(&format!("gate {name} {} {{", args.join(", ")));
            self.indent += 1;
            for inst in custom.definition.as_deref().unwrap_or_default() {
                let InstructionKind::Gate(gate) = &inst.kind else {
                    continue;
                };
                let operands: Vec<&str> = inst
                    .qubits
                    .iter()
                    .filter_map(|q| args.get(q.index()).map(String::as_str))
                    .collect();
                let head = self.gate_head(gate)?;
                self.writeln(&format!("{head} {};", operands.join(", ")));
            }
            self.indent -= 1;
            self.writeln("}");
            self.writeln("");
        }
        Ok(())
    }

    fn gate_head(&self, gate: &Gate) -> EmitResult<String> {
        match &gate.kind {
            GateKind::Standard(std) => {
                let params = std.angles();
                if params.is_empty() {
                    Ok(std.name().to_string())
                } else {
                    let params: Vec<String> = params.iter().map(|p| p.to_pi_string()).collect();
                    Ok(format!("{}({})", std.name(), params.join(", ")))
                }
            }
            GateKind::Custom(custom) => self
                .definition_name(custom)
                .map(str::to_string)
                .ok_or_else(|| EmitError::OpaqueGate(custom.name.clone())),
            GateKind::Controlled {
                base,
                num_ctrl_qubits,
            } => {
                let base = self.gate_head(base)?;
                if *num_ctrl_qubits == 1 {
                    Ok(format!("ctrl @ {base}"))
                } else {
                    Ok(format!("ctrl({num_ctrl_qubits}) @ {base}"))
                }
            }
        }
    }

    fn writeln(&mut self, line: &str) {
        let indent = "    ".repeat(self.indent);
        self.output.push_str(&indent);
        self.output.push_str(line);
        self.output.push('\n');
    }
}
