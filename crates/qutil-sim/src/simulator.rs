//! Shot-based simulator on top of [`Statevector`].

use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, instrument};

use qutil_ir::{Circuit, ClbitId, InstructionKind, QubitId};

use crate::counts::Counts;
use crate::error::{SimError, SimResult};
use crate::statevector::{MAX_SUPPORTED_QUBITS, Statevector};

/// Default qubit limit (16 MB of amplitudes).
pub const DEFAULT_MAX_QUBITS: usize = 20;

/// Local statevector simulator.
///
/// The state is evolved once per run and measurements are read from sampled
/// basis states, so every measurement is treated as terminal: a gate applied
/// after measuring a qubit still acts on the unmeasured state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simulator {
    /// Largest circuit accepted.
    pub max_qubits: usize,
    /// RNG seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self {
            max_qubits: DEFAULT_MAX_QUBITS,
            seed: None,
        }
    }
}

impl Simulator {
    /// Create a simulator with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the qubit limit.
    #[must_use]
    pub fn with_max_qubits(mut self, max_qubits: usize) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    /// Fix the RNG seed for reproducible counts.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn check_size(&self, circuit: &Circuit) -> SimResult<()> {
        let max = self.max_qubits.min(MAX_SUPPORTED_QUBITS);
        if circuit.num_qubits() > max {
            return Err(SimError::CircuitTooLarge {
                qubits: circuit.num_qubits(),
                max,
            });
        }
        Ok(())
    }

    /// Final state of the circuit, ignoring measurements.
    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    pub fn statevector(&self, circuit: &Circuit) -> SimResult<Statevector> {
        self.check_size(circuit)?;
        let mut sv = Statevector::new(circuit.num_qubits())?;
        sv.apply_circuit(circuit)?;
        Ok(sv)
    }

    /// Run the circuit for `shots` shots.
    ///
    /// Counts are keyed by the classical register contents, highest clbit
    /// first. A circuit without measurements is read out on all qubits,
    /// highest qubit first.
    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    pub fn run(&self, circuit: &Circuit, shots: u32) -> SimResult<Counts> {
        self.check_size(circuit)?;
        let start = Instant::now();

        debug!(
            "Starting simulation: {} qubits, {} instructions, {} shots",
            circuit.num_qubits(),
            circuit.size(),
            shots
        );

        let mut sv = Statevector::new(circuit.num_qubits())?;
        let mut readout: FxHashMap<ClbitId, QubitId> = FxHashMap::default();
        for inst in circuit.instructions() {
            if let InstructionKind::Measure = inst.kind {
                for (&q, &c) in inst.qubits.iter().zip(&inst.clbits) {
                    readout.insert(c, q);
                }
            } else {
                sv.apply(inst)?;
            }
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let width = if readout.is_empty() {
            circuit.num_qubits()
        } else {
            circuit.num_clbits()
        };
        let mut counts = Counts::new();
        let mut histogram: FxHashMap<usize, u64> = FxHashMap::default();
        for outcome in sv.sample_many(shots, &mut rng) {
            *histogram.entry(outcome).or_insert(0) += 1;
        }
        for (outcome, n) in histogram {
            let bitstring = if readout.is_empty() {
                outcome_to_bitstring(outcome, width)
            } else {
                classical_bitstring(outcome, width, &readout)
            };
            counts.insert(bitstring, n);
        }

        debug!("Simulation completed in {:?}", start.elapsed());
        Ok(counts)
    }
}

/// Format a basis index as a bitstring, highest bit first.
pub fn outcome_to_bitstring(outcome: usize, width: usize) -> String {
    format!("{outcome:0width$b}")
}

fn classical_bitstring(
    outcome: usize,
    num_clbits: usize,
    readout: &FxHashMap<ClbitId, QubitId>,
) -> String {
    (0..num_clbits)
        .rev()
        .map(|c| {
            let bit = readout
                .get(&ClbitId::from(c))
                .is_some_and(|q| outcome >> q.index() & 1 == 1);
            if bit { '1' } else { '0' }
        })
        .collect()
}
