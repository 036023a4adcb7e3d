//! Error types for the simulator crate.

use thiserror::Error;

/// Errors produced while simulating a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// The circuit needs more qubits than the simulator is configured for.
    #[error("Circuit has {qubits} qubits but simulator only supports {max}")]
    CircuitTooLarge {
        /// Qubits in the circuit.
        qubits: usize,
        /// Configured limit.
        max: usize,
    },

    /// A gate angle is still symbolic.
    #[error("Gate '{0}' has unbound parameters")]
    UnboundParameter(String),

    /// A composite gate has neither a body nor a matrix.
    #[error("Gate '{0}' has no definition to simulate")]
    OpaqueGate(String),

    /// An operation the statevector engine cannot execute in this position.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// A gate was given the wrong number of qubits.
    #[error("Gate '{gate_name}' acts on {expected} qubits, got {got}")]
    OperandCount {
        /// Name of the gate.
        gate_name: String,
        /// Qubits the gate acts on.
        expected: usize,
        /// Operands supplied.
        got: usize,
    },

    /// A qubit index is outside of the statevector.
    #[error("Qubit {qubit} is out of range for a {num_qubits}-qubit state")]
    QubitOutOfRange {
        /// The offending qubit index.
        qubit: usize,
        /// Width of the state.
        num_qubits: usize,
    },

    /// A basis-state index is outside of the statevector.
    #[error("Basis state {index} does not exist in a {num_qubits}-qubit state")]
    InvalidBasisState {
        /// The requested basis index.
        index: usize,
        /// Width of the state.
        num_qubits: usize,
    },
}

/// Result type for simulation.
pub type SimResult<T> = Result<T, SimError>;
