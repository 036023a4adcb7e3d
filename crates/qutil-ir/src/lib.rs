//! Circuit Intermediate Representation for qutilities
//!
//! The data structures every other crate in the workspace builds on: registers,
//! gates, instructions, a wire DAG and the [`Circuit`] builder.
//!
//! # Core Components
//!
//! - **Bits and registers**: [`QubitId`], [`ClbitId`], and the free-standing
//!   [`QuantumRegister`] / [`ClassicalRegister`] descriptors that circuit
//!   builders accept for register injection
//! - **Gates**: [`StandardGate`] for built-in gates, [`CustomGate`] for composite
//!   gates with a body, and [`GateKind::Controlled`] for the control modifier
//! - **Parameters**: [`ParameterExpression`] for gate angles
//! - **Instructions**: [`Instruction`] combining gates with their operands
//! - **DAG**: [`CircuitDag`] for the internal graph representation
//! - **Circuit**: [`Circuit`] high-level builder API
//!
//! Qubit `q` is bit `q` of a computational basis index (little-endian).
//!
//! # Example: a reusable gate
//!
//! ```rust
//! use qutil_ir::{Circuit, QubitId};
//! use std::f64::consts::PI;
//!
//! let mut rotations = Circuit::with_size("rot", 2, 0);
//! rotations.h(QubitId(1)).unwrap();
//! rotations.cp(PI / 2.0, QubitId(1), QubitId(0)).unwrap();
//! let gate = rotations.to_gate().unwrap();
//!
//! let mut circuit = Circuit::new("main");
//! let a = circuit.add_qreg("A", 2).unwrap();
//! let ctrl = circuit.add_qreg("ctl", 1).unwrap();
//! circuit.append(&gate, [a[0], a[1]]).unwrap();
//! circuit.append(&gate.inverse().unwrap().control(1), [ctrl[0], a[0], a[1]]).unwrap();
//!
//! assert_eq!(circuit.size(), 2);
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `H` | 1 | Hadamard gate |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `S`, `Sdg`, `T`, `Tdg`, `SX`, `SXdg` | 1 | Clifford+T gates |
//! | `Rx`, `Ry`, `Rz`, `P` | 1 | Rotation and phase gates |
//! | `U` | 1 | Universal single-qubit gate U(θ,φ,λ) |
//! | `CX`, `CY`, `CZ`, `CH` | 2 | Controlled Paulis and Hadamard |
//! | `CRx`, `CRy`, `CRz`, `CP` | 2 | Controlled rotations and phase |
//! | `Swap` | 2 | SWAP gate |
//! | `CCX`, `CSwap` | 3 | Toffoli and Fredkin gates |

pub mod circuit;
pub mod dag;
pub mod draw;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod inverse;
pub mod parameter;
pub mod qubit;
pub mod register;

pub use circuit::{Circuit, RegisterSlot};
pub use dag::{CircuitDag, DagEdge, DagNode, NodeIndex, WireId};
pub use error::{IrError, IrResult};
pub use gate::{CustomGate, Gate, GateKind, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use parameter::ParameterExpression;
pub use qubit::{BitLocation, Clbit, ClbitId, Qubit, QubitId};
pub use register::{ClassicalRegister, QuantumRegister};
