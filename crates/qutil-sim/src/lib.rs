//! Local Statevector Simulator for qutilities
//!
//! Exact statevector simulation of [`qutil_ir::Circuit`]s, including composite
//! gates and the controlled modifier, plus shot sampling into [`Counts`].
//! Qubit `q` is bit `q` of a basis index.
//!
//! # Performance
//!
//! | Qubits | Memory | Simulation Speed |
//! |--------|--------|------------------|
//! | 10 | ~16 KB | Instant |
//! | 15 | ~512 KB | Fast |
//! | 20 | ~16 MB | Moderate |
//! | 25 | ~512 MB | Slow |
//!
//! # Example
//!
//! ```rust
//! use qutil_ir::{Circuit, ClbitId, QubitId};
//! use qutil_sim::Simulator;
//!
//! let mut circuit = Circuit::with_size("bell", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure(QubitId(0), ClbitId(0)).unwrap();
//! circuit.measure(QubitId(1), ClbitId(1)).unwrap();
//!
//! let counts = Simulator::new().with_seed(7).run(&circuit, 1000).unwrap();
//! assert_eq!(counts.get("00") + counts.get("11"), 1000);
//! ```

pub mod counts;
pub mod error;
pub mod simulator;
pub mod statevector;

pub use counts::Counts;
pub use error::{SimError, SimResult};
pub use simulator::{DEFAULT_MAX_QUBITS, Simulator, outcome_to_bitstring};
pub use statevector::{MAX_SUPPORTED_QUBITS, Statevector};
