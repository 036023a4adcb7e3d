//! `OpenQASM` 3 Emitter for qutilities
//!
//! Serializes a [`qutil_ir::Circuit`] into `OpenQASM` 3.0 source so circuits
//! built by the `qutilities` builders can be handed to other toolchains.
//!
//! # Supported Features
//!
//! | Feature | Example |
//! |---------|---------|
//! | Version and includes | `OPENQASM 3.0;` / `include "stdgates.inc";` |
//! | Named registers | `qubit[4] A;`, `bit[3] c;` |
//! | Loose bits | `qubit[2] q;` |
//! | Standard gates | `h A[0];`, `cp(pi/4) B[0], A[2];` |
//! | Composite gates | `gate qft q0, q1, q2 { ... }` |
//! | Control modifier | `ctrl @ qft_pow_2 count[1], target[0];` |
//! | Measurement | `c[0] = measure count[0];` |
//! | Barriers, reset, delay | `barrier A[0], A[1];` |
//!
//! # Example
//!
//! ```rust
//! use qutil_ir::Circuit;
//! use qutil_qasm3::emit;
//!
//! let mut circuit = Circuit::new("demo");
//! let a = circuit.add_qreg("A", 2).unwrap();
//! circuit.h(a[1]).unwrap();
//! circuit.cp(std::f64::consts::PI / 2.0, a[1], a[0]).unwrap();
//!
//! let qasm = emit(&circuit).unwrap();
//! assert!(qasm.contains("qubit[2] A;"));
//! assert!(qasm.contains("cp(pi/2) A[1], A[0];"));
//! ```

mod emitter;
mod error;

pub use emitter::emit;
pub use error::{EmitError, EmitResult};
