//! Gate angle expressions.
//!
//! Angles produced by the circuit builders are almost always constants. A
//! rotation can also be left open as `scale·name + offset` and bound later
//! (for example a QPE phase sweep). That form is closed under everything the
//! IR does to angles: inversion negates, powers scale.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::ops::{Add, Mul, Neg};

/// A concrete angle or an affine function of one named parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterExpression {
    /// A constant numeric value in radians.
    Constant(f64),
    /// `scale * name + offset`.
    Linear {
        /// Parameter name.
        name: String,
        /// Multiplier of the parameter.
        scale: f64,
        /// Constant term.
        offset: f64,
    },
}

impl ParameterExpression {
    /// Create a constant parameter.
    pub fn constant(value: f64) -> Self {
        Self::Constant(value)
    }

    /// Create an unbound parameter.
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Linear {
            name: name.into(),
            scale: 1.0,
            offset: 0.0,
        }
    }

    /// Whether the expression still refers to a parameter.
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Self::Linear { .. })
    }

    /// The value, if the expression is concrete.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Constant(v) => Some(*v),
            Self::Linear { .. } => None,
        }
    }

    /// The parameter name, if any.
    pub fn symbol_name(&self) -> Option<&str> {
        match self {
            Self::Constant(_) => None,
            Self::Linear { name, .. } => Some(name),
        }
    }

    /// Substitute `value` for `name`. Other parameters are left as they are.
    pub fn bind(&self, name: &str, value: f64) -> Self {
        match self {
            Self::Linear {
                name: own,
                scale,
                offset,
            } if own == name => Self::Constant(scale * value + offset),
            _ => self.clone(),
        }
    }

    /// Substitute every parameter found in `values`.
    pub fn bind_all(&self, values: &FxHashMap<String, f64>) -> Self {
        match self.symbol_name() {
            Some(name) => values
                .get(name)
                .map_or_else(|| self.clone(), |&value| self.bind(name, value)),
            None => self.clone(),
        }
    }

    /// Multiply by a constant factor.
    pub fn scaled(&self, factor: f64) -> Self {
        match self {
            Self::Constant(v) => Self::Constant(v * factor),
            Self::Linear {
                name,
                scale,
                offset,
            } => Self::Linear {
                name: name.clone(),
                scale: scale * factor,
                offset: offset * factor,
            },
        }
    }

    /// The additive inverse.
    pub fn negated(&self) -> Self {
        self.scaled(-1.0)
    }

    /// Shift by a constant.
    pub fn shifted(&self, delta: f64) -> Self {
        match self {
            Self::Constant(v) => Self::Constant(v + delta),
            Self::Linear {
                name,
                scale,
                offset,
            } => Self::Linear {
                name: name.clone(),
                scale: *scale,
                offset: offset + delta,
            },
        }
    }

    /// Render with constants shown as π fractions where possible.
    pub fn to_pi_string(&self) -> String {
        match self {
            Self::Constant(v) => format_angle(*v),
            Self::Linear {
                name,
                scale,
                offset,
            } => {
                let term = if *scale == 1.0 {
                    name.clone()
                } else if *scale == -1.0 {
                    format!("-{name}")
                } else {
                    format!("{}*{name}", format_angle(*scale))
                };
                if *offset == 0.0 {
                    term
                } else if *offset < 0.0 {
                    format!("{term} - {}", format_angle(-offset))
                } else {
                    format!("{term} + {}", format_angle(*offset))
                }
            }
        }
    }
}

/// Format an angle as a multiple of π when it is a dyadic fraction of π
/// (`pi/2`, `-3*pi/4`), otherwise as a plain float.
pub fn format_angle(value: f64) -> String {
    const MAX_DENOMINATOR_BITS: u32 = 12;
    if value == 0.0 {
        return "0".into();
    }
    let ratio = value / PI;
    (0..=MAX_DENOMINATOR_BITS)
        .find_map(|bits| {
            let numerator = ratio * f64::from(1u32 << bits);
            ((numerator - numerator.round()).abs() <= 1e-9).then(|| {
                #[allow(clippy::cast_possible_truncation)]
                let numerator = numerator.round() as i64;
                pi_fraction(numerator, 1u64 << bits)
            })
        })
        .unwrap_or_else(|| format!("{value}"))
}

fn pi_fraction(numerator: i64, denominator: u64) -> String {
    let sign = if numerator < 0 { "-" } else { "" };
    let head = match numerator.unsigned_abs() {
        1 => format!("{sign}pi"),
        m => format!("{sign}{m}*pi"),
    };
    if denominator == 1 {
        head
    } else {
        format!("{head}/{denominator}")
    }
}

impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(v) => write!(f, "{v}"),
            Self::Linear {
                name,
                scale,
                offset,
            } => write!(f, "{scale}·{name} + {offset}"),
        }
    }
}

impl From<f64> for ParameterExpression {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

impl From<i32> for ParameterExpression {
    fn from(value: i32) -> Self {
        Self::Constant(f64::from(value))
    }
}

impl Mul<f64> for ParameterExpression {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.scaled(rhs)
    }
}

impl Add<f64> for ParameterExpression {
    type Output = Self;

    fn add(self, rhs: f64) -> Self {
        self.shifted(rhs)
    }
}

impl Neg for ParameterExpression {
    type Output = Self;

    fn neg(self) -> Self {
        self.negated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant() {
        let p = ParameterExpression::constant(1.5);
        assert!(!p.is_symbolic());
        assert_eq!(p.as_f64(), Some(1.5));
        assert_eq!(p.symbol_name(), None);
    }

    #[test]
    fn test_symbol_and_bind() {
        let p = ParameterExpression::symbol("phi") * PI;
        assert!(p.is_symbolic());
        assert_eq!(p.as_f64(), None);
        assert_eq!(p.symbol_name(), Some("phi"));

        let bound = p.bind("phi", 0.5);
        assert!((bound.as_f64().unwrap() - PI / 2.0).abs() < 1e-12);
        assert!(p.bind("theta", 0.5).is_symbolic());
    }

    #[test]
    fn test_bind_all() {
        let p = ParameterExpression::symbol("a") + 1.0;
        let mut values = FxHashMap::default();
        values.insert("b".to_string(), 2.0);
        assert!(p.bind_all(&values).is_symbolic());

        values.insert("a".to_string(), 2.0);
        assert_eq!(p.bind_all(&values).as_f64(), Some(3.0));
    }

    #[test]
    fn test_scaled_and_negated() {
        let p = ParameterExpression::constant(PI / 8.0);
        assert_eq!(p.scaled(4.0).as_f64(), Some(PI / 2.0));
        assert_eq!(p.negated(), ParameterExpression::Constant(-PI / 8.0));

        let s = ParameterExpression::symbol("t") + 0.25;
        assert_eq!(s.negated().negated(), s);
        assert_eq!(
            (s.scaled(2.0)).bind("t", 1.0).as_f64(),
            Some(2.5),
            "offset scales with the parameter"
        );
    }

    #[test]
    fn test_format_angle() {
        assert_eq!(format_angle(PI), "pi");
        assert_eq!(format_angle(PI / 2.0), "pi/2");
        assert_eq!(format_angle(-PI / 4.0), "-pi/4");
        assert_eq!(format_angle(3.0 * PI / 8.0), "3*pi/8");
        assert_eq!(format_angle(2.0 * PI), "2*pi");
        assert_eq!(format_angle(0.0), "0");
        assert_eq!(format_angle(0.5), "0.5");
    }

    #[test]
    fn test_to_pi_string() {
        assert_eq!(ParameterExpression::symbol("phi").to_pi_string(), "phi");
        let p = -(ParameterExpression::symbol("phi") * (PI / 2.0)) + PI;
        assert_eq!(p.to_pi_string(), "-pi/2*phi + pi");
        let q = ParameterExpression::symbol("phi") + (-PI / 4.0);
        assert_eq!(q.to_pi_string(), "phi - pi/4");
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn dyadic_angles_print_as_pi_fractions(k in -64i64..64, bits in 0u32..8) {
                prop_assume!(k != 0);
                #[allow(clippy::cast_precision_loss)]
                let angle = PI * k as f64 / f64::from(1u32 << bits);
                let text = format_angle(angle);
                prop_assert!(text.contains("pi"), "{} printed as {}", angle, text);
            }

            #[test]
            fn binding_commutes_with_scaling(scale in -4.0f64..4.0, offset in -4.0f64..4.0, value in -4.0f64..4.0, factor in -4.0f64..4.0) {
                let expr = ParameterExpression::symbol("x") * scale + offset;
                let a = expr.scaled(factor).bind("x", value).as_f64().unwrap();
                let b = expr.bind("x", value).scaled(factor).as_f64().unwrap();
                prop_assert!((a - b).abs() < 1e-9);
            }
        }
    }
}
