//! Error types for the QASM3 emitter.

use thiserror::Error;

/// Errors that can occur during emission.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EmitError {
    /// A custom gate has no body to write out as a `gate` definition.
    #[error("Gate '{0}' has no definition and cannot be exported")]
    OpaqueGate(String),

    /// A custom gate carries parameters, which gate definitions do not support.
    #[error("Gate '{0}' has parameters; only concrete bodies can be exported")]
    ParameterizedDefinition(String),

    /// An operand does not belong to the circuit.
    #[error("Unknown {kind} {id}")]
    UnknownBit { kind: &'static str, id: String },
}

/// Result type for emission.
pub type EmitResult<T> = Result<T, EmitError>;
