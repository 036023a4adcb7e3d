//! Errors raised while building circuits and gates.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors from circuit construction, composition and inversion.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// An operand refers to a qubit the circuit does not have.
    #[error("Qubit {qubit:?} not found in circuit{}", gate_context(.gate_name))]
    QubitNotFound {
        /// The missing qubit.
        qubit: QubitId,
        /// Gate being applied, if any.
        gate_name: Option<String>,
    },

    /// An operand refers to a classical bit the circuit does not have.
    #[error("Classical bit {clbit:?} not found in circuit{}", gate_context(.gate_name))]
    ClbitNotFound {
        /// The missing bit.
        clbit: ClbitId,
        /// Gate being applied, if any.
        gate_name: Option<String>,
    },

    /// The wire graph is malformed or an instruction is inconsistent.
    #[error("Invalid DAG structure: {0}")]
    InvalidDag(String),

    /// A gate or composed circuit got the wrong number of operands.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Gate or circuit name.
        gate_name: String,
        /// Its width.
        expected: u32,
        /// Operands supplied.
        got: u32,
    },

    /// The same qubit appears twice among an instruction's operands.
    #[error("Duplicate qubit {qubit:?} in operation{}", gate_context(.gate_name))]
    DuplicateQubit {
        /// The repeated qubit.
        qubit: QubitId,
        /// Gate being applied, if any.
        gate_name: Option<String>,
    },

    /// Register name or size is not acceptable.
    #[error("Invalid register '{name}': {reason}")]
    InvalidRegister {
        /// Register name as given.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A register with this name already exists in the circuit.
    #[error("Register '{0}' already exists in circuit")]
    DuplicateRegister(String),

    /// The operation requires a unitary circuit or gate.
    #[error("Operation '{0}' is not unitary")]
    NonUnitary(String),

    /// A gate has no body and cannot be expanded or inverted.
    #[error("Gate '{0}' has no definition")]
    OpaqueGate(String),

    /// A gate body references a qubit outside of the gate's width.
    #[error("Gate '{gate_name}' body uses qubit {qubit:?} but the gate has {num_qubits} qubits")]
    DefinitionOutOfRange {
        /// Name of the gate.
        gate_name: String,
        /// Offending local qubit.
        qubit: QubitId,
        /// Width of the gate.
        num_qubits: u32,
    },

    /// A dense matrix does not fit the gate width.
    #[error("Gate '{gate_name}' needs {expected} matrix entries, got {got}")]
    MatrixDimension {
        /// Name of the gate.
        gate_name: String,
        /// `4^num_qubits`.
        expected: usize,
        /// Entries supplied.
        got: usize,
    },

    /// Serialization failure.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

#[allow(clippy::ref_option)]
fn gate_context(gate_name: &Option<String>) -> String {
    gate_name
        .as_ref()
        .map(|name| format!(" (gate: {name})"))
        .unwrap_or_default()
}

/// Result alias for IR operations.
pub type IrResult<T> = Result<T, IrError>;
