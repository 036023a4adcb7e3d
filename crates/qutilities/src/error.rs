//! Error types for the circuit builders.

use qutil_ir::IrError;
use thiserror::Error;

/// Errors raised while validating builder parameters or assembling a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QutilError {
    /// A builder was asked for a zero-width register.
    #[error("{builder} needs at least one qubit")]
    ZeroQubits { builder: &'static str },

    /// Approximation would remove every controlled rotation.
    #[error(
        "Approximation degree {degree} must be smaller than the number of qubits ({num_qubits})"
    )]
    InvalidApproximation { degree: u32, num_qubits: u32 },

    /// Only one of a pair of injected registers was supplied.
    #[error("Register {0} must be provided together with its partner register")]
    MissingRegister(&'static str),

    /// An injected register is narrower than the operation requires.
    #[error("Register '{register}' has {got} qubits, needs at least {min}")]
    RegisterTooNarrow { register: String, min: u32, got: u32 },

    /// An injected register does not have the width the operation acts on.
    #[error("Register '{register}' has {got} qubits, expected {expected}")]
    RegisterWidthMismatch {
        register: String,
        expected: u32,
        got: u32,
    },

    /// The scaled addend would start past the last accumulator qubit.
    #[error("Scale exponent {exponent} must be smaller than the accumulator width ({width})")]
    ScaleOutOfRange { exponent: u32, width: u32 },

    /// Repeated addition would append `2^(|N|-1)` adders for the top bit.
    #[error(
        "Repeated addition supports multiplier registers of at most {max} qubits, got {got}; use weighted addition"
    )]
    MultiplierTooWide { got: u32, max: u32 },

    /// The multiplier target cannot hold `|M| + |N|` bits.
    #[error("Target register must be at least {required} qubits, got {got}")]
    TargetTooSmall { required: u32, got: u32 },

    /// Toy eigenphase outside `[0, 1)`.
    #[error("Phase {0} is outside [0, 1)")]
    InvalidPhase(f64),

    /// `U^(2^j)` exponents would overflow.
    #[error("{requested} counting qubits requested, at most {max} are supported")]
    TooManyCountingQubits { requested: u32, max: u32 },

    /// Circuit construction failed.
    #[error("Circuit error: {0}")]
    Ir(#[from] IrError),
}

/// Result type for builder operations.
pub type QutilResult<T> = Result<T, QutilError>;
