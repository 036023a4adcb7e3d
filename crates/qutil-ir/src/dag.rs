//! Wire graph of a circuit.
//!
//! Every qubit and classical bit is a wire running from an input node to an
//! output node; each instruction is spliced into the wires it touches. The
//! builders only ever append, so the graph also tracks the ASAP layer at the
//! end of every wire and keeps depth current without a traversal.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::instruction::Instruction;
use crate::qubit::{ClbitId, QubitId};

/// Node index type for the circuit DAG.
pub type NodeIndex = PetNodeIndex<u32>;

/// A wire of the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireId {
    /// A quantum wire.
    Qubit(QubitId),
    /// A classical wire.
    Clbit(ClbitId),
}

impl From<QubitId> for WireId {
    fn from(q: QubitId) -> Self {
        WireId::Qubit(q)
    }
}

impl From<ClbitId> for WireId {
    fn from(c: ClbitId) -> Self {
        WireId::Clbit(c)
    }
}

/// A node of the wire graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DagNode {
    /// Start of a wire.
    In(WireId),
    /// End of a wire.
    Out(WireId),
    /// An applied instruction.
    Op(Instruction),
}

impl DagNode {
    /// The instruction, for operation nodes.
    pub fn instruction(&self) -> Option<&Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }
}

/// Edge label: the wire a segment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DagEdge {
    /// The wire this segment belongs to.
    pub wire: WireId,
}

/// Endpoints and current tail of one wire.
#[derive(Debug, Clone, Copy)]
struct Wire {
    input: NodeIndex,
    output: NodeIndex,
    /// Last node before `output`.
    front: NodeIndex,
    /// ASAP layer reached at `front`.
    layer: usize,
}

/// Append-only wire DAG.
#[derive(Debug, Clone, Default)]
pub struct CircuitDag {
    graph: DiGraph<DagNode, DagEdge, u32>,
    wires: FxHashMap<WireId, Wire>,
    ops: Vec<NodeIndex>,
    num_qubits: usize,
    num_clbits: usize,
    depth: usize,
}

impl CircuitDag {
    /// Create an empty DAG.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a qubit wire. Adding an existing qubit is a no-op.
    pub fn add_qubit(&mut self, qubit: QubitId) {
        if self.add_wire(WireId::Qubit(qubit)) {
            self.num_qubits += 1;
        }
    }

    /// Add a classical wire. Adding an existing bit is a no-op.
    pub fn add_clbit(&mut self, clbit: ClbitId) {
        if self.add_wire(WireId::Clbit(clbit)) {
            self.num_clbits += 1;
        }
    }

    fn add_wire(&mut self, id: WireId) -> bool {
        if self.wires.contains_key(&id) {
            return false;
        }
        let input = self.graph.add_node(DagNode::In(id));
        let output = self.graph.add_node(DagNode::Out(id));
        self.graph.add_edge(input, output, DagEdge { wire: id });
        self.wires.insert(
            id,
            Wire {
                input,
                output,
                front: input,
                layer: 0,
            },
        );
        true
    }

    /// Append an instruction at the end of its wires.
    ///
    /// Fails on a gate/operand width mismatch, an unknown wire, or a qubit
    /// listed twice. Nothing is modified on failure.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        self.check_operands(&instruction)?;

        let wires: Vec<WireId> = instruction
            .qubits
            .iter()
            .map(|&q| WireId::Qubit(q))
            .chain(instruction.clbits.iter().map(|&c| WireId::Clbit(c)))
            .collect();
        let start = wires
            .iter()
            .filter_map(|w| self.wires.get(w))
            .map(|w| w.layer)
            .max()
            .unwrap_or(0);
        let layer = if instruction.is_directive() {
            start
        } else {
            start + 1
        };

        let node = self.graph.add_node(DagNode::Op(instruction));
        for id in wires {
            self.splice(node, id, layer)?;
        }
        self.ops.push(node);
        self.depth = self.depth.max(layer);
        Ok(node)
    }

    fn check_operands(&self, instruction: &Instruction) -> IrResult<()> {
        instruction.check_operands()?;
        let gate_name = instruction.as_gate().map(|g| g.name().to_string());
        if let Some(&qubit) = instruction
            .qubits
            .iter()
            .find(|&&q| !self.wires.contains_key(&WireId::Qubit(q)))
        {
            return Err(IrError::QubitNotFound { qubit, gate_name });
        }
        match instruction
            .clbits
            .iter()
            .find(|&&c| !self.wires.contains_key(&WireId::Clbit(c)))
        {
            Some(&clbit) => Err(IrError::ClbitNotFound { clbit, gate_name }),
            None => Ok(()),
        }
    }

    /// Reroute `front -> output` of wire `id` through `node`.
    fn splice(&mut self, node: NodeIndex, id: WireId, layer: usize) -> IrResult<()> {
        let wire = self
            .wires
            .get_mut(&id)
            .ok_or_else(|| IrError::InvalidDag(format!("unknown wire {id:?}")))?;
        let tail = self
            .graph
            .edges_connecting(wire.front, wire.output)
            .find(|e| e.weight().wire == id)
            .map(|e| e.id())
            .ok_or_else(|| IrError::InvalidDag(format!("wire {id:?} does not end at its front")))?;

        self.graph.remove_edge(tail);
        self.graph.add_edge(wire.front, node, DagEdge { wire: id });
        self.graph.add_edge(node, wire.output, DagEdge { wire: id });
        wire.front = node;
        wire.layer = layer;
        Ok(())
    }

    /// Operations in the order they were applied.
    pub fn topological_ops(&self) -> impl Iterator<Item = (NodeIndex, &Instruction)> {
        self.ops
            .iter()
            .filter_map(|&idx| self.graph[idx].instruction().map(|inst| (idx, inst)))
    }

    /// The instruction at `node`, if it is an operation node.
    pub fn get_instruction(&self, node: NodeIndex) -> Option<&Instruction> {
        self.graph.node_weight(node).and_then(DagNode::instruction)
    }

    /// Number of qubit wires.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of classical wires.
    pub fn num_clbits(&self) -> usize {
        self.num_clbits
    }

    /// Number of operations, directives included.
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Longest chain of non-directive operations.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The underlying petgraph graph.
    pub fn graph(&self) -> &DiGraph<DagNode, DagEdge, u32> {
        &self.graph
    }

    /// Check that the graph is acyclic and that every wire is one unbroken
    /// path from its input to its output visiting each of its operations.
    pub fn verify_integrity(&self) -> IrResult<()> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(IrError::InvalidDag("graph contains a cycle".into()));
        }

        let mut expected: FxHashMap<WireId, usize> = FxHashMap::default();
        for (_, inst) in self.topological_ops() {
            for &q in &inst.qubits {
                *expected.entry(WireId::Qubit(q)).or_default() += 1;
            }
            for &c in &inst.clbits {
                *expected.entry(WireId::Clbit(c)).or_default() += 1;
            }
        }

        for (&id, wire) in &self.wires {
            let mut current = wire.input;
            let mut visited = 0;
            while current != wire.output {
                current = self
                    .graph
                    .edges_directed(current, Direction::Outgoing)
                    .find(|e| e.weight().wire == id)
                    .map(|e| e.target())
                    .ok_or_else(|| {
                        IrError::InvalidDag(format!("wire {id:?} breaks at node {current:?}"))
                    })?;
                if current != wire.output {
                    visited += 1;
                }
                if visited > self.ops.len() {
                    return Err(IrError::InvalidDag(format!("wire {id:?} does not terminate")));
                }
            }
            let want = expected.get(&id).copied().unwrap_or(0);
            if visited != want {
                return Err(IrError::InvalidDag(format!(
                    "wire {id:?} passes {visited} operations, {want} reference it"
                )));
            }
        }
        Ok(())
    }
}
