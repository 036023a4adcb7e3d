//! Composable QFT, QPE and QFT-arithmetic circuit builders.
//!
//! Each builder is a small configuration value whose `build()` assembles a
//! fresh [`qutil_ir::Circuit`]. Circuits can be frozen into reusable gates
//! ([`QFTGate`], [`QPEGate`], [`QFTAdder::build_gate`]) and appended,
//! controlled or powered inside larger circuits.
//!
//! | Builder | Operation | Registers |
//! |---------|-----------|-----------|
//! | [`QFT`] / [`QFTGate`] | `|x⟩ → Σ_y e^{2πi·xy/2^n}|y⟩` | `q` |
//! | [`QPE`] / [`QPEGate`] | eigenphase `φ` → `⌊φ·2^n⌉` | `count`, `target`, `c` |
//! | [`QFTAdder`] | `A ← A ± B` | `A` (n+1), `B` (n) |
//! | [`QFTMultiplier`] | `Y ← Y ± M·N` | `Y`, `M`, `N` |
//!
//! All registers are little-endian: qubit `i` carries weight `2^i`.
//!
//! # Example
//!
//! ```rust
//! use qutilities::{QFTAdder, QFTGate};
//!
//! // A 3-bit adder with barriers between blocks.
//! let adder = QFTAdder::new(3).insert_barrier(true).build().unwrap();
//! assert_eq!(adder.num_qubits(), 7);
//!
//! // A 4-qubit inverse QFT as a gate.
//! let iqft = QFTGate::new(4).inverse(true).build().unwrap();
//! assert_eq!(iqft.num_qubits(), 4);
//! ```
//!
//! Setting `debug(true)` on a builder logs a text drawing of the built circuit
//! through `tracing` at `info` level.

pub mod arithmetic;
mod display;
pub mod error;
pub mod qft;
pub mod qpe;

pub use arithmetic::{
    AdderConfig, MAX_REPEATED_ADDITION_QUBITS, MultiplierConfig, MultiplierStrategy, QFTAdder,
    QFTMultiplier,
};
pub use error::{QutilError, QutilResult};
pub use qft::{QFT, QFTGate, QftConfig};
pub use qpe::{MAX_COUNTING_QUBITS, PhaseUnitary, QPE, QPEGate, QpeConfig, estimate_phase};

use qutil_ir::Circuit;

/// Anything that assembles a circuit from its own parameters.
pub trait CircuitBuilder {
    /// Assemble the circuit.
    fn build_circuit(&self) -> QutilResult<Circuit>;
}

impl CircuitBuilder for QFT {
    fn build_circuit(&self) -> QutilResult<Circuit> {
        self.build()
    }
}

impl CircuitBuilder for QPE {
    fn build_circuit(&self) -> QutilResult<Circuit> {
        self.build()
    }
}

impl CircuitBuilder for QFTAdder {
    fn build_circuit(&self) -> QutilResult<Circuit> {
        self.build()
    }
}

impl CircuitBuilder for QFTMultiplier {
    fn build_circuit(&self) -> QutilResult<Circuit> {
        self.build()
    }
}
