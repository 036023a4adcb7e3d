//! Gates.
//!
//! Besides the fixed [`StandardGate`] vocabulary there are two ways to build
//! larger operations: a [`CustomGate`] with a body (a list of instructions over
//! local qubits `0..num_qubits`), and the [`GateKind::Controlled`] modifier that
//! adds control qubits in front of any gate. Both nest arbitrarily, which is how
//! a QFT circuit becomes a reusable gate and how a whole adder becomes a
//! controlled addition.
//!
//! Bodies sit behind an [`Arc`], so a gate that uses the same sub-gate several
//! times (every `name_pow_k`) holds one copy of it.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{IrError, IrResult};
use crate::instruction::Instruction;
use crate::parameter::ParameterExpression;
use crate::qubit::QubitId;

/// Built-in gates. Controls of the two- and three-qubit gates come first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    /// Hadamard.
    H,
    /// Phase `diag(1, e^{iλ})`; the rotation of the Fourier transform.
    P(ParameterExpression),
    /// Controlled phase; symmetric in its two qubits.
    CP(ParameterExpression),
    /// Exchange two qubits.
    Swap,

    /// Identity.
    I,
    /// Pauli X.
    X,
    /// Pauli Y.
    Y,
    /// Pauli Z.
    Z,
    /// `√Z`.
    S,
    /// `S†`.
    Sdg,
    /// `⁴√Z`.
    T,
    /// `T†`.
    Tdg,
    /// `√X`.
    SX,
    /// `√X†`.
    SXdg,
    /// `exp(-iθX/2)`.
    Rx(ParameterExpression),
    /// `exp(-iθY/2)`.
    Ry(ParameterExpression),
    /// `exp(-iθZ/2)`.
    Rz(ParameterExpression),
    /// `U(θ, φ, λ) = Rz(φ)·Ry(θ)·Rz(λ)` up to global phase.
    U(
        ParameterExpression,
        ParameterExpression,
        ParameterExpression,
    ),

    /// CNOT.
    CX,
    /// Controlled Y.
    CY,
    /// Controlled Z.
    CZ,
    /// Controlled Hadamard.
    CH,
    /// Controlled `Rx`.
    CRx(ParameterExpression),
    /// Controlled `Ry`.
    CRy(ParameterExpression),
    /// Controlled `Rz`.
    CRz(ParameterExpression),
    /// Toffoli.
    CCX,
    /// Fredkin.
    CSwap,
}

impl StandardGate {
    /// OpenQASM name and width.
    fn signature(&self) -> (&'static str, u32) {
        use StandardGate as G;
        match self {
            G::H => ("h", 1),
            G::P(_) => ("p", 1),
            G::CP(_) => ("cp", 2),
            G::Swap => ("swap", 2),
            G::I => ("id", 1),
            G::X => ("x", 1),
            G::Y => ("y", 1),
            G::Z => ("z", 1),
            G::S => ("s", 1),
            G::Sdg => ("sdg", 1),
            G::T => ("t", 1),
            G::Tdg => ("tdg", 1),
            G::SX => ("sx", 1),
            G::SXdg => ("sxdg", 1),
            G::Rx(_) => ("rx", 1),
            G::Ry(_) => ("ry", 1),
            G::Rz(_) => ("rz", 1),
            G::U(..) => ("u", 1),
            G::CX => ("cx", 2),
            G::CY => ("cy", 2),
            G::CZ => ("cz", 2),
            G::CH => ("ch", 2),
            G::CRx(_) => ("crx", 2),
            G::CRy(_) => ("cry", 2),
            G::CRz(_) => ("crz", 2),
            G::CCX => ("ccx", 3),
            G::CSwap => ("cswap", 3),
        }
    }

    /// OpenQASM name of the gate.
    pub fn name(&self) -> &'static str {
        self.signature().0
    }

    /// Number of qubits, controls included.
    pub fn num_qubits(&self) -> u32 {
        self.signature().1
    }

    /// Angle arguments in OpenQASM order.
    pub fn angles(&self) -> Vec<&ParameterExpression> {
        use StandardGate as G;
        match self {
            G::P(t) | G::CP(t) | G::Rx(t) | G::Ry(t) | G::Rz(t) | G::CRx(t) | G::CRy(t)
            | G::CRz(t) => vec![t],
            G::U(theta, phi, lambda) => vec![theta, phi, lambda],
            _ => Vec::new(),
        }
    }

    /// Whether any angle is still an unbound parameter.
    pub fn is_parameterized(&self) -> bool {
        self.angles().iter().any(|a| a.is_symbolic())
    }

    /// The same gate with every angle passed through `f`.
    pub fn map_angles(&self, f: impl Fn(&ParameterExpression) -> ParameterExpression) -> Self {
        use StandardGate as G;
        match self {
            G::P(t) => G::P(f(t)),
            G::CP(t) => G::CP(f(t)),
            G::Rx(t) => G::Rx(f(t)),
            G::Ry(t) => G::Ry(f(t)),
            G::Rz(t) => G::Rz(f(t)),
            G::CRx(t) => G::CRx(f(t)),
            G::CRy(t) => G::CRy(f(t)),
            G::CRz(t) => G::CRz(f(t)),
            G::U(a, b, c) => G::U(f(a), f(b), f(c)),
            other => other.clone(),
        }
    }

    /// The built-in gate equal to this one with a single added control.
    pub fn controlled(&self) -> Option<Self> {
        use StandardGate as G;
        Some(match self {
            G::P(t) => G::CP(t.clone()),
            G::X => G::CX,
            G::Y => G::CY,
            G::Z => G::CZ,
            G::H => G::CH,
            G::Rx(t) => G::CRx(t.clone()),
            G::Ry(t) => G::CRy(t.clone()),
            G::Rz(t) => G::CRz(t.clone()),
            G::CX => G::CCX,
            G::Swap => G::CSwap,
            _ => return None,
        })
    }

    /// `self^k` as a single built-in gate, when rotation angles simply
    /// multiply. `U` is excluded since its angles do not compose that way.
    pub fn power(&self, exponent: u64) -> Option<Self> {
        #[allow(clippy::cast_precision_loss)]
        let k = exponent as f64;
        match self {
            StandardGate::I => Some(StandardGate::I),
            StandardGate::U(..) => None,
            g if g.angles().len() == 1 => Some(g.map_angles(|t| t.scaled(k))),
            _ => None,
        }
    }
}

/// What a [`Gate`] is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateKind {
    /// Built-in gate.
    Standard(StandardGate),
    /// Named gate with a body or a matrix.
    Custom(CustomGate),
    /// `base` with `num_ctrl_qubits` controls prepended to its operands.
    Controlled {
        /// The controlled operation.
        base: Box<Gate>,
        /// Number of leading control qubits.
        num_ctrl_qubits: u32,
    },
}

impl GateKind {
    /// Identifier. Controlled gates report their base's.
    pub fn name(&self) -> &str {
        match self {
            GateKind::Standard(g) => g.name(),
            GateKind::Custom(g) => &g.name,
            GateKind::Controlled { base, .. } => base.name(),
        }
    }

    /// Number of qubits, controls included.
    pub fn num_qubits(&self) -> u32 {
        match self {
            GateKind::Standard(g) => g.num_qubits(),
            GateKind::Custom(g) => g.num_qubits,
            GateKind::Controlled {
                base,
                num_ctrl_qubits,
            } => num_ctrl_qubits + base.num_qubits(),
        }
    }
}

/// A named gate defined by a body over local qubits, a dense matrix, or
/// neither (opaque).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomGate {
    /// Identifier; must be a valid OpenQASM identifier to be exported.
    pub name: String,
    /// Width.
    pub num_qubits: u32,
    /// Angle arguments.
    pub params: Vec<ParameterExpression>,
    /// Row-major `2^n × 2^n` unitary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Vec<Complex64>>,
    /// Body over local qubits `QubitId(0)..QubitId(num_qubits)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<Arc<[Instruction]>>,
}

impl CustomGate {
    /// An opaque gate.
    pub fn new(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            params: Vec::new(),
            matrix: None,
            definition: None,
        }
    }

    /// Set the angle arguments.
    #[must_use]
    pub fn with_params(mut self, params: Vec<ParameterExpression>) -> Self {
        self.params = params;
        self
    }

    /// Attach a dense unitary of matching dimension.
    pub fn with_matrix(mut self, matrix: Vec<Complex64>) -> IrResult<Self> {
        let dim = 1usize << self.num_qubits;
        if matrix.len() != dim * dim {
            return Err(IrError::MatrixDimension {
                gate_name: self.name.clone(),
                expected: dim * dim,
                got: matrix.len(),
            });
        }
        self.matrix = Some(matrix);
        Ok(self)
    }

    /// Attach a body. It may hold gates and directives only, on distinct
    /// local qubits below `num_qubits`, with every gate given its full arity.
    pub fn with_definition(mut self, body: Vec<Instruction>) -> IrResult<Self> {
        if let Some(inst) = body.iter().find(|inst| !inst.is_unitary()) {
            return Err(IrError::NonUnitary(inst.name().to_string()));
        }
        body.iter().try_for_each(Instruction::check_operands)?;
        let out_of_range = body
            .iter()
            .flat_map(|inst| inst.qubits.iter())
            .find(|q| q.0 >= self.num_qubits);
        if let Some(&qubit) = out_of_range {
            return Err(IrError::DefinitionOutOfRange {
                gate_name: self.name.clone(),
                qubit,
                num_qubits: self.num_qubits,
            });
        }
        self.definition = Some(body.into());
        Ok(self)
    }

    /// Whether the gate has no body.
    pub fn is_opaque(&self) -> bool {
        self.definition.is_none()
    }
}

/// A gate plus an optional human-readable label.
///
/// The label is what drawings and debug output show (`QFT`, `|A+B⟩`); the
/// name is the identifier used in exported definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// What the gate is.
    pub kind: GateKind,
    /// Display label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Gate {
    /// Wrap a built-in gate.
    pub fn standard(gate: StandardGate) -> Self {
        GateKind::Standard(gate).into()
    }

    /// Wrap a custom gate.
    pub fn custom(gate: CustomGate) -> Self {
        GateKind::Custom(gate).into()
    }

    /// Set the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Identifier of the gate.
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Number of qubits, controls included.
    pub fn num_qubits(&self) -> u32 {
        self.kind.num_qubits()
    }

    /// Label if set, otherwise the name; unlabelled controlled gates show
    /// their control count (`c2-qft`).
    pub fn display_name(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        match &self.kind {
            GateKind::Controlled {
                base,
                num_ctrl_qubits,
            } => format!("c{num_ctrl_qubits}-{}", base.display_name()),
            kind => kind.name().to_string(),
        }
    }

    /// Prepend `num_ctrl_qubits` controls to the operands.
    ///
    /// One control on a built-in gate with a built-in controlled form gives
    /// that form (`p` becomes `cp`); controls on a controlled gate add up.
    #[must_use]
    pub fn control(&self, num_ctrl_qubits: u32) -> Gate {
        if num_ctrl_qubits == 0 {
            return self.clone();
        }
        if let (GateKind::Standard(g), 1) = (&self.kind, num_ctrl_qubits) {
            if let Some(controlled) = g.controlled() {
                return Gate {
                    kind: GateKind::Standard(controlled),
                    label: self.label.as_ref().map(|l| format!("c-{l}")),
                };
            }
        }
        let (base, inner) = match &self.kind {
            GateKind::Controlled {
                base,
                num_ctrl_qubits,
            } => (base.clone(), *num_ctrl_qubits),
            _ => (Box::new(self.clone()), 0),
        };
        GateKind::Controlled {
            base,
            num_ctrl_qubits: inner + num_ctrl_qubits,
        }
        .into()
    }

    /// `self^k` for `k ≥ 1`.
    ///
    /// Single-angle built-in gates scale their angle and controlled gates
    /// power their base. Anything else becomes `<name>_pow_<k>`, a composite
    /// applying `<name>_pow_<k/2>` twice and the gate itself once more for odd
    /// `k`; nesting depth is `log2(k)`.
    pub fn power(&self, exponent: u64) -> IrResult<Gate> {
        if exponent == 1 {
            return Ok(self.clone());
        }
        match &self.kind {
            GateKind::Standard(g) => {
                if let Some(powered) = g.power(exponent) {
                    return Ok(Gate::standard(powered));
                }
            }
            GateKind::Controlled {
                base,
                num_ctrl_qubits,
            } => return Ok(base.power(exponent)?.control(*num_ctrl_qubits)),
            GateKind::Custom(_) => {}
        }

        let width = self.num_qubits();
        let operands = || (0..width).map(QubitId);
        let mut body = Vec::with_capacity(3);
        if exponent > 1 {
            let half = self.power(exponent / 2)?;
            body.push(Instruction::gate(half.clone(), operands()));
            body.push(Instruction::gate(half, operands()));
        }
        if exponent % 2 == 1 {
            body.push(Instruction::gate(self.clone(), operands()));
        }
        let custom =
            CustomGate::new(format!("{}_pow_{exponent}", self.name()), width).with_definition(body)?;
        Ok(Gate::custom(custom).with_label(format!("{}^{exponent}", self.display_name())))
    }

    /// Whether the gate's meaning comes from another gate or a body.
    pub fn is_composite(&self) -> bool {
        !matches!(self.kind, GateKind::Standard(_))
    }
}

impl From<GateKind> for Gate {
    fn from(kind: GateKind) -> Self {
        Gate { kind, label: None }
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Gate::standard(gate)
    }
}

impl From<CustomGate> for Gate {
    fn from(gate: CustomGate) -> Self {
        Gate::custom(gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn phase(theta: f64) -> Gate {
        Gate::standard(StandardGate::P(theta.into()))
    }

    #[test]
    fn test_signatures() {
        assert_eq!(StandardGate::H.num_qubits(), 1);
        assert_eq!(StandardGate::CP(PI.into()).name(), "cp");
        assert_eq!(StandardGate::CP(PI.into()).num_qubits(), 2);
        assert_eq!(StandardGate::CSwap.num_qubits(), 3);
        assert_eq!(StandardGate::I.name(), "id");
    }

    #[test]
    fn test_angles_and_binding_state() {
        let u = StandardGate::U(0.1.into(), 0.2.into(), 0.3.into());
        assert_eq!(u.angles().len(), 3);
        assert!(StandardGate::Swap.angles().is_empty());
        assert!(!StandardGate::Rx(PI.into()).is_parameterized());
        assert!(StandardGate::Rx(ParameterExpression::symbol("theta")).is_parameterized());
    }

    #[test]
    fn test_single_control_on_phase_is_cp() {
        let cp = phase(PI / 4.0).control(1);
        assert_eq!(cp.name(), "cp");
        assert_eq!(cp.num_qubits(), 2);

        let ccp = phase(PI / 4.0).control(2);
        assert!(matches!(
            ccp.kind,
            GateKind::Controlled {
                num_ctrl_qubits: 2,
                ..
            }
        ));
        assert_eq!(ccp.num_qubits(), 3);
        assert_eq!(ccp.display_name(), "c2-p");
    }

    #[test]
    fn test_control_counts_add_up() {
        let body = vec![Instruction::gate(StandardGate::H, [QubitId(0)])];
        let g = Gate::custom(CustomGate::new("hh", 1).with_definition(body).unwrap());
        let cc = g.control(1).control(2);
        let GateKind::Controlled {
            base,
            num_ctrl_qubits,
        } = &cc.kind
        else {
            panic!("expected a controlled gate");
        };
        assert_eq!(*num_ctrl_qubits, 3);
        assert_eq!(base.name(), "hh");
        assert_eq!(cc.num_qubits(), 4);
    }

    #[test]
    fn test_power_of_phase_scales_angle() {
        let p4 = phase(PI / 8.0).power(4).unwrap();
        let GateKind::Standard(StandardGate::P(theta)) = p4.kind else {
            panic!("expected a phase gate");
        };
        assert!((theta.as_f64().unwrap() - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_power_of_controlled_phase_stays_standard() {
        let cp = phase(PI / 8.0).control(1).power(2).unwrap();
        assert_eq!(cp.name(), "cp");
    }

    #[test]
    fn test_power_repeats_other_gates() {
        let h3 = Gate::standard(StandardGate::H).power(3).unwrap();
        assert_eq!(h3.name(), "h_pow_3");
        assert_eq!(h3.display_name(), "h^3");
        let GateKind::Custom(c) = &h3.kind else {
            panic!("expected a composite gate");
        };
        assert_eq!(c.definition.as_ref().map(|body| body.len()), Some(3));
    }

    fn body_of(gate: &Gate) -> &[Instruction] {
        match &gate.kind {
            GateKind::Custom(c) => c.definition.as_deref().unwrap_or_default(),
            _ => &[],
        }
    }

    #[test]
    fn test_power_nests_by_squaring() {
        let body = vec![Instruction::gate(StandardGate::CX, [QubitId(0), QubitId(1)])];
        let g = Gate::custom(CustomGate::new("u", 2).with_definition(body).unwrap());

        let g5 = g.power(5).unwrap();
        let names: Vec<_> = body_of(&g5).iter().map(Instruction::name).collect();
        assert_eq!(names, ["u_pow_2", "u_pow_2", "u"]);

        let g4 = g.power(4).unwrap();
        let names: Vec<_> = body_of(&g4).iter().map(Instruction::name).collect();
        assert_eq!(names, ["u_pow_2", "u_pow_2"]);

        // Both halves share one body.
        let huge = g.power(1 << 40).unwrap();
        let (first, second) = match body_of(&huge) {
            [a, b] => (a.as_gate().unwrap(), b.as_gate().unwrap()),
            other => panic!("expected two halves, got {}", other.len()),
        };
        let (GateKind::Custom(a), GateKind::Custom(b)) = (&first.kind, &second.kind) else {
            panic!("expected composite halves");
        };
        assert!(Arc::ptr_eq(
            a.definition.as_ref().unwrap(),
            b.definition.as_ref().unwrap()
        ));
        let mut depth = 0;
        let mut cursor = huge.clone();
        while let Some(inner) = body_of(&cursor).first().and_then(Instruction::as_gate).cloned() {
            cursor = inner;
            depth += 1;
        }
        assert_eq!(depth, 41);
    }

    #[test]
    fn test_definition_checks() {
        let wide = vec![Instruction::gate(StandardGate::CX, [QubitId(0), QubitId(2)])];
        assert!(matches!(
            CustomGate::new("bad", 2).with_definition(wide),
            Err(IrError::DefinitionOutOfRange { .. })
        ));

        let measured = vec![Instruction::measure(QubitId(0), crate::qubit::ClbitId(0))];
        assert!(matches!(
            CustomGate::new("m", 1).with_definition(measured),
            Err(IrError::NonUnitary(_))
        ));

        let short = vec![Instruction::gate(StandardGate::CX, [QubitId(0)])];
        assert!(matches!(
            CustomGate::new("short", 1).with_definition(short),
            Err(IrError::QubitCountMismatch { .. })
        ));

        let repeated = vec![Instruction::gate(StandardGate::CZ, [QubitId(1), QubitId(1)])];
        assert!(matches!(
            CustomGate::new("twice", 2).with_definition(repeated),
            Err(IrError::DuplicateQubit { .. })
        ));
    }

    #[test]
    fn test_matrix_dimension_checked() {
        let one = Complex64::new(1.0, 0.0);
        assert!(CustomGate::new("g", 1).with_matrix(vec![one; 3]).is_err());
        assert!(CustomGate::new("g", 1).with_matrix(vec![one; 4]).is_ok());
    }
}
