//! Qubit and classical bit types.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! bit_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Position of this bit as a `usize`.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                $name(id)
            }
        }

        impl From<usize> for $name {
            fn from(id: usize) -> Self {
                $name(u32::try_from(id).expect(concat!(stringify!($name), " overflow: exceeds u32::MAX")))
            }
        }
    };
}

bit_id!(
    /// Unique identifier for a qubit within a circuit.
    QubitId,
    "q"
);

bit_id!(
    /// Unique identifier for a classical bit within a circuit.
    ClbitId,
    "c"
);

/// Register membership of a bit: the register name and the offset inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitLocation {
    /// Register name.
    pub register: String,
    /// Offset within the register (0 is the least significant bit).
    pub index: u32,
}

/// A quantum bit with optional register membership.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Qubit {
    /// The unique identifier.
    pub id: QubitId,
    /// Register membership, if the qubit was allocated through a register.
    pub location: Option<BitLocation>,
}

impl Qubit {
    /// Create a loose qubit.
    pub fn new(id: QubitId) -> Self {
        Self { id, location: None }
    }

    /// Create a qubit that belongs to a register.
    pub fn with_register(id: QubitId, register: impl Into<String>, index: u32) -> Self {
        Self {
            id,
            location: Some(BitLocation {
                register: register.into(),
                index,
            }),
        }
    }
}

impl fmt::Display for Qubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{}[{}]", loc.register, loc.index),
            None => write!(f, "{}", self.id),
        }
    }
}

/// A classical bit with optional register membership.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clbit {
    /// The unique identifier.
    pub id: ClbitId,
    /// Register membership, if any.
    pub location: Option<BitLocation>,
}

impl Clbit {
    /// Create a loose classical bit.
    pub fn new(id: ClbitId) -> Self {
        Self { id, location: None }
    }

    /// Create a classical bit that belongs to a register.
    pub fn with_register(id: ClbitId, register: impl Into<String>, index: u32) -> Self {
        Self {
            id,
            location: Some(BitLocation {
                register: register.into(),
                index,
            }),
        }
    }
}

impl fmt::Display for Clbit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{}[{}]", loc.register, loc.index),
            None => write!(f, "{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qubit_display() {
        assert_eq!(Qubit::new(QubitId(0)).to_string(), "q0");
        assert_eq!(Qubit::with_register(QubitId(5), "A", 2).to_string(), "A[2]");
    }

    #[test]
    fn test_clbit_display() {
        assert_eq!(Clbit::new(ClbitId(1)).to_string(), "c1");
        assert_eq!(Clbit::with_register(ClbitId(1), "meas", 0).to_string(), "meas[0]");
    }

    #[test]
    fn test_id_conversions() {
        assert_eq!(QubitId::from(3usize), QubitId(3));
        assert_eq!(QubitId(7).index(), 7);
        assert!(ClbitId(1) < ClbitId(2));
    }
}
