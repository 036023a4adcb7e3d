//! Quantum Fourier Transform.
//!
//! With swaps enabled the circuit maps `|x⟩ → 2^{-n/2} Σ_y e^{2πi·xy/2^n} |y⟩`
//! in little-endian order (qubit `k` carries weight `2^k`). Without swaps the
//! output is bit-reversed: qubit `j` holds the phase `e^{2πi·x/2^{j+1}}`,
//! which is the form the Draper adder works on.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

use qutil_ir::{Circuit, Gate, QuantumRegister, QubitId};

use crate::display::debug_render;
use crate::error::{QutilError, QutilResult};

/// `π / 2^distance`, the controlled-phase angle between qubits `distance` apart.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub(crate) fn phase_angle(distance: usize) -> f64 {
    PI / 2f64.powi(distance as i32)
}

/// Parameters shared by [`QFT`] and [`QFTGate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QftConfig {
    /// Width of the transform.
    pub num_qubits: u32,
    /// Controlled rotations between qubits more than
    /// `num_qubits - 1 - approximation_degree` apart are dropped.
    pub approximation_degree: u32,
    /// Build the adjoint transform.
    pub inverse: bool,
    /// Reverse the qubit order at the end.
    pub do_swaps: bool,
    /// Barrier after each qubit's rotation block.
    pub insert_barrier: bool,
    /// Log a drawing of the built circuit.
    pub debug: bool,
    /// Circuit name; defaults to `QFT` or `IQFT`.
    pub label: Option<String>,
}

impl Default for QftConfig {
    fn default() -> Self {
        Self {
            num_qubits: 0,
            approximation_degree: 0,
            inverse: false,
            do_swaps: true,
            insert_barrier: false,
            debug: false,
            label: None,
        }
    }
}

impl QftConfig {
    /// Default configuration for an `n`-qubit transform.
    pub fn new(num_qubits: u32) -> Self {
        Self {
            num_qubits,
            ..Self::default()
        }
    }

    /// Check the width and approximation degree.
    pub fn validate(&self) -> QutilResult<()> {
        if self.num_qubits == 0 {
            return Err(QutilError::ZeroQubits { builder: "QFT" });
        }
        if self.num_qubits > 1 && self.approximation_degree >= self.num_qubits {
            return Err(QutilError::InvalidApproximation {
                degree: self.approximation_degree,
                num_qubits: self.num_qubits,
            });
        }
        Ok(())
    }

    /// The explicit label or the default for the direction.
    pub fn resolved_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| {
            if self.inverse { "IQFT" } else { "QFT" }.to_string()
        })
    }

    fn gate_name(&self) -> &'static str {
        if self.inverse { "iqft" } else { "qft" }
    }
}

/// Append the forward transform on `qubits` (index 0 least significant).
pub(crate) fn append_qft(
    circuit: &mut Circuit,
    qubits: &[QubitId],
    config: &QftConfig,
) -> QutilResult<()> {
    let n = qubits.len();
    let max_distance = n.saturating_sub(1 + config.approximation_degree as usize);
    for j in (0..n).rev() {
        circuit.h(qubits[j])?;
        for k in (0..j).rev() {
            if j - k > max_distance {
                continue;
            }
            circuit.cp(phase_angle(j - k), qubits[j], qubits[k])?;
        }
        if config.insert_barrier {
            circuit.barrier(qubits.iter().copied())?;
        }
    }
    if config.do_swaps {
        for k in 0..n / 2 {
            circuit.swap(qubits[k], qubits[n - 1 - k])?;
        }
    }
    Ok(())
}

macro_rules! qft_setters {
    ($ty:ident) => {
        impl $ty {
            /// Drop rotations between qubits more than `n - 1 - degree` apart.
            #[must_use]
            pub fn approximation_degree(mut self, degree: u32) -> Self {
                self.config.approximation_degree = degree;
                self
            }

            /// Build the inverse transform.
            #[must_use]
            pub fn inverse(mut self, inverse: bool) -> Self {
                self.config.inverse = inverse;
                self
            }

            /// Toggle the final bit-reversal swaps.
            #[must_use]
            pub fn do_swaps(mut self, do_swaps: bool) -> Self {
                self.config.do_swaps = do_swaps;
                self
            }

            /// Toggle barriers between rotation blocks.
            #[must_use]
            pub fn insert_barrier(mut self, insert_barrier: bool) -> Self {
                self.config.insert_barrier = insert_barrier;
                self
            }

            /// Log a drawing of the circuit after building.
            #[must_use]
            pub fn debug(mut self, debug: bool) -> Self {
                self.config.debug = debug;
                self
            }

            /// Override the circuit label.
            #[must_use]
            pub fn label(mut self, label: impl Into<String>) -> Self {
                self.config.label = Some(label.into());
                self
            }

            /// The current parameters.
            pub fn config(&self) -> &QftConfig {
                &self.config
            }
        }
    };
}

/// QFT circuit builder.
///
/// ```rust
/// use qutilities::QFT;
///
/// let circuit = QFT::new(3).build().unwrap();
/// assert_eq!(circuit.name(), "QFT");
/// assert_eq!(circuit.count_ops()["cp"], 3);
/// assert_eq!(circuit.count_ops()["swap"], 1);
/// ```
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QFT {
    config: QftConfig,
    register: Option<QuantumRegister>,
}

qft_setters!(QFT);

impl QFT {
    /// Transform on a fresh register `q` of `num_qubits` qubits.
    pub fn new(num_qubits: u32) -> Self {
        Self::from_config(QftConfig::new(num_qubits))
    }

    /// Transform on an existing register; the width follows the register.
    pub fn on_register(register: QuantumRegister) -> Self {
        Self {
            config: QftConfig::new(register.size()),
            register: Some(register),
        }
    }

    /// Builder from a full parameter set.
    pub fn from_config(config: QftConfig) -> Self {
        Self {
            config,
            register: None,
        }
    }

    /// Assemble the circuit.
    pub fn build(&self) -> QutilResult<Circuit> {
        self.config.validate()?;
        let register = match &self.register {
            Some(register) => register.clone(),
            None => QuantumRegister::new("q", self.config.num_qubits)?,
        };

        let label = self.config.resolved_label();
        let mut circuit = Circuit::new(label.clone());
        let qubits = circuit.add_register(&register)?;
        append_qft(&mut circuit, &qubits, &self.config)?;
        if self.config.inverse {
            circuit = circuit.inverse()?;
            circuit.set_name(label);
        }

        debug!(
            "Built {} on {}: {} qubits, approximation {}, depth {}",
            circuit.name(),
            register.name(),
            self.config.num_qubits,
            self.config.approximation_degree,
            circuit.depth()
        );
        debug_render(&circuit, self.config.debug);
        Ok(circuit)
    }
}

/// QFT as a reusable composite gate named `qft` (or `iqft`).
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QFTGate {
    config: QftConfig,
}

qft_setters!(QFTGate);

impl QFTGate {
    /// Gate over `num_qubits` qubits.
    pub fn new(num_qubits: u32) -> Self {
        Self::from_config(QftConfig::new(num_qubits))
    }

    /// Gate from a full parameter set.
    pub fn from_config(config: QftConfig) -> Self {
        Self { config }
    }

    /// Assemble the gate. Its label is the circuit label.
    pub fn build(&self) -> QutilResult<Gate> {
        let circuit = QFT::from_config(self.config.clone()).build()?;
        Ok(circuit.to_gate_named(self.config.gate_name())?)
    }
}
