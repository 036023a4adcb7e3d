//! Simulated checks of the QFT adder and multiplier on basis-state inputs.

use proptest::prelude::*;
use qutil_ir::{Circuit, QuantumRegister, QubitId};
use qutil_sim::Statevector;
use qutilities::{MultiplierStrategy, QFTAdder, QFTMultiplier};

/// Basis index with each register holding the given value.
fn encode(values: &[(&[QubitId], u64)]) -> usize {
    let mut index = 0usize;
    for (qubits, value) in values {
        for (bit, q) in qubits.iter().enumerate() {
            if value >> bit & 1 == 1 {
                index |= 1 << q.index();
            }
        }
    }
    index
}

/// Run `circuit` on a basis state and return the (deterministic) output index.
fn run_basis(circuit: &Circuit, index: usize) -> usize {
    let mut sv = Statevector::from_basis_state(circuit.num_qubits(), index).unwrap();
    sv.apply_circuit(circuit).unwrap();
    let (out, probability) = sv.most_likely();
    assert!(
        probability > 1.0 - 1e-9,
        "output of {} is not a basis state (p = {probability})",
        circuit.name()
    );
    out
}

fn qreg(circuit: &Circuit, name: &str) -> Vec<QubitId> {
    circuit.qreg(name).unwrap().to_vec()
}

#[test]
fn adder_is_exact_for_all_small_inputs() {
    for n in 1..=3u32 {
        let circuit = QFTAdder::new(n).build().unwrap();
        let (a, b) = (qreg(&circuit, "A"), qreg(&circuit, "B"));
        let modulus = 1u64 << (n + 1);
        for x in 0..modulus {
            for y in 0..1u64 << n {
                let out = run_basis(&circuit, encode(&[(&a[..], x), (&b[..], y)]));
                assert_eq!(Statevector::register_value(out, &a), (x + y) % modulus, "{x}+{y}");
                assert_eq!(Statevector::register_value(out, &b), y);
            }
        }
    }
}

#[test]
fn subtractor_wraps_modulo() {
    let circuit = QFTAdder::new(2).subtract(true).build().unwrap();
    let (a, b) = (qreg(&circuit, "A"), qreg(&circuit, "B"));
    for x in 0..8u64 {
        for y in 0..4u64 {
            let out = run_basis(&circuit, encode(&[(&a[..], x), (&b[..], y)]));
            assert_eq!(Statevector::register_value(out, &a), (x + 8 - y) % 8);
        }
    }
}

#[test]
fn adder_with_wider_injected_register() {
    let acc = QuantumRegister::new("acc", 4).unwrap();
    let x = QuantumRegister::new("x", 2).unwrap();
    let circuit = QFTAdder::on_registers(acc, x).build().unwrap();
    let (a, b) = (qreg(&circuit, "acc"), qreg(&circuit, "x"));
    let out = run_basis(&circuit, encode(&[(&a[..], 13), (&b[..], 3)]));
    assert_eq!(Statevector::register_value(out, &a), 0);
}

#[test]
fn scaled_adder_adds_shifted_operand() {
    let circuit = QFTAdder::new(2).scale_exponent(1).build().unwrap();
    let (a, b) = (qreg(&circuit, "A"), qreg(&circuit, "B"));
    for x in 0..8u64 {
        for y in 0..4u64 {
            let out = run_basis(&circuit, encode(&[(&a[..], x), (&b[..], y)]));
            assert_eq!(Statevector::register_value(out, &a), (x + 2 * y) % 8);
        }
    }
}

#[test]
fn adder_gate_inside_larger_circuit() {
    let gate = QFTAdder::new(2).build_gate().unwrap();
    let mut circuit = Circuit::new("host");
    let spare = circuit.add_qreg("spare", 1).unwrap();
    let a = circuit.add_qreg("A", 3).unwrap();
    let b = circuit.add_qreg("B", 2).unwrap();
    circuit.append(&gate, a.iter().chain(&b).copied()).unwrap();

    let out = run_basis(&circuit, encode(&[(&spare[..], 1), (&a[..], 6), (&b[..], 3)]));
    assert_eq!(Statevector::register_value(out, &a), 1);
    assert_eq!(Statevector::register_value(out, &spare), 1);
}

fn check_multiplier(strategy: MultiplierStrategy, inverse: bool) {
    let m_reg = QuantumRegister::new("M", 2).unwrap();
    let n_reg = QuantumRegister::new("N", 2).unwrap();
    let circuit = QFTMultiplier::new(m_reg, n_reg)
        .strategy(strategy)
        .inverse(inverse)
        .build()
        .unwrap();
    let (y, m, n) = (qreg(&circuit, "Y"), qreg(&circuit, "M"), qreg(&circuit, "N"));
    for start in [0u64, 5] {
        for mv in 0..4u64 {
            for nv in 0..4u64 {
                let out = run_basis(&circuit, encode(&[(&y[..], start), (&m[..], mv), (&n[..], nv)]));
                let expected = if inverse {
                    (start + 16 - mv * nv) % 16
                } else {
                    (start + mv * nv) % 16
                };
                assert_eq!(
                    Statevector::register_value(out, &y),
                    expected,
                    "{start} ± {mv}×{nv} ({strategy:?})"
                );
                assert_eq!(Statevector::register_value(out, &m), mv);
                assert_eq!(Statevector::register_value(out, &n), nv);
            }
        }
    }
}

#[test]
fn multiplier_repeated_addition() {
    check_multiplier(MultiplierStrategy::RepeatedAddition, false);
}

#[test]
fn multiplier_weighted_addition() {
    check_multiplier(MultiplierStrategy::WeightedAddition, false);
}

#[test]
fn inverse_multiplier_subtracts() {
    check_multiplier(MultiplierStrategy::RepeatedAddition, true);
    check_multiplier(MultiplierStrategy::WeightedAddition, true);
}

#[test]
fn multiplier_then_inverse_restores_target() {
    let m_reg = QuantumRegister::new("M", 2).unwrap();
    let n_reg = QuantumRegister::new("N", 1).unwrap();
    let forward = QFTMultiplier::new(m_reg.clone(), n_reg.clone()).build().unwrap();
    let backward = QFTMultiplier::new(m_reg, n_reg).inverse(true).build().unwrap();

    let mut circuit = forward.empty_like("roundtrip");
    let all: Vec<QubitId> = circuit.qubits().iter().map(|q| q.id).collect();
    circuit.compose(&forward, &all).unwrap();
    circuit.compose(&backward, &all).unwrap();

    let (y, m, n) = (qreg(&circuit, "Y"), qreg(&circuit, "M"), qreg(&circuit, "N"));
    let out = run_basis(&circuit, encode(&[(&y[..], 6), (&m[..], 3), (&n[..], 1)]));
    assert_eq!(Statevector::register_value(out, &y), 6);
}

#[test]
fn adder_acts_linearly_on_superpositions() {
    // A = |0⟩, B = (|1⟩ + |2⟩)/√2  →  A + B entangled with B.
    let adder = QFTAdder::new(2).build().unwrap();
    let (a, b) = (qreg(&adder, "A"), qreg(&adder, "B"));
    let mut circuit = adder.empty_like("superposed");
    circuit.h(b[0]).unwrap();
    circuit.cx(b[0], b[1]).unwrap();
    circuit.x(b[0]).unwrap();
    let all: Vec<QubitId> = circuit.qubits().iter().map(|q| q.id).collect();
    circuit.compose(&adder, &all).unwrap();

    let mut sv = Statevector::new(circuit.num_qubits()).unwrap();
    sv.apply_circuit(&circuit).unwrap();
    for (index, p) in sv.probabilities().into_iter().enumerate() {
        if p > 1e-9 {
            assert!((p - 0.5).abs() < 1e-9);
            assert_eq!(
                Statevector::register_value(index, &a),
                Statevector::register_value(index, &b)
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn adder_matches_modular_sum(x in 0u64..32, y in 0u64..16, subtract in any::<bool>()) {
        let circuit = QFTAdder::new(4).subtract(subtract).build().unwrap();
        let (a, b) = (qreg(&circuit, "A"), qreg(&circuit, "B"));
        let out = run_basis(&circuit, encode(&[(&a[..], x), (&b[..], y)]));
        let expected = if subtract { (x + 32 - y) % 32 } else { (x + y) % 32 };
        prop_assert_eq!(Statevector::register_value(out, &a), expected);
        prop_assert_eq!(Statevector::register_value(out, &b), y);
    }

    #[test]
    fn multiplier_strategies_agree(mv in 0u64..8, nv in 0u64..4) {
        let build = |strategy| {
            QFTMultiplier::new(
                QuantumRegister::new("M", 3).unwrap(),
                QuantumRegister::new("N", 2).unwrap(),
            )
            .strategy(strategy)
            .build()
            .unwrap()
        };
        let repeated = build(MultiplierStrategy::RepeatedAddition);
        let weighted = build(MultiplierStrategy::WeightedAddition);
        let (y, m, n) = (qreg(&repeated, "Y"), qreg(&repeated, "M"), qreg(&repeated, "N"));
        let index = encode(&[(&y[..], 0), (&m[..], mv), (&n[..], nv)]);
        let out = run_basis(&repeated, index);
        prop_assert_eq!(out, run_basis(&weighted, index));
        prop_assert_eq!(Statevector::register_value(out, &y), mv * nv);
    }
}
