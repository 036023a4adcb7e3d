//! Fourier-basis arithmetic.
//!
//! Registers are little-endian: qubit `i` of a register carries weight `2^i`.
//! All results are taken modulo `2^width` of the register they land in.

pub mod adder;
pub mod multiplier;

pub use adder::{AdderConfig, QFTAdder};
pub use multiplier::{
    MAX_REPEATED_ADDITION_QUBITS, MultiplierConfig, MultiplierStrategy, QFTMultiplier,
};
