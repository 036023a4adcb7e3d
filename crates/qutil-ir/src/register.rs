//! Named register descriptors.
//!
//! A register descriptor is a name plus a width. It exists independently of any
//! circuit so that callers can create registers up front and hand them to
//! several circuit builders; a [`Circuit`](crate::Circuit) materializes the
//! descriptor into concrete qubit or classical-bit ids when the register is added.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};

/// A named quantum register of fixed width.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuantumRegister {
    name: String,
    size: u32,
}

impl QuantumRegister {
    /// Create a quantum register descriptor.
    ///
    /// The name must be a valid identifier and the size must be non-zero.
    pub fn new(name: impl Into<String>, size: u32) -> IrResult<Self> {
        let name = name.into();
        validate(&name, size)?;
        Ok(Self { name, size })
    }

    /// The register name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of qubits in the register.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of qubits as `usize`.
    pub fn len(&self) -> usize {
        self.size as usize
    }

    /// Registers are never empty, but clippy wants the pair.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

impl fmt::Display for QuantumRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "qubit[{}] {}", self.size, self.name)
    }
}

/// A named classical register of fixed width.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassicalRegister {
    name: String,
    size: u32,
}

impl ClassicalRegister {
    /// Create a classical register descriptor.
    pub fn new(name: impl Into<String>, size: u32) -> IrResult<Self> {
        let name = name.into();
        validate(&name, size)?;
        Ok(Self { name, size })
    }

    /// The register name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of bits in the register.
    pub fn size(&self) -> u32 {
        self.size
    }
}

impl fmt::Display for ClassicalRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bit[{}] {}", self.size, self.name)
    }
}

/// Check whether `name` is usable as a register or gate identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate(name: &str, size: u32) -> IrResult<()> {
    if !is_identifier(name) {
        return Err(IrError::InvalidRegister {
            name: name.to_string(),
            reason: "name must match [A-Za-z_][A-Za-z0-9_]*".into(),
        });
    }
    if size == 0 {
        return Err(IrError::InvalidRegister {
            name: name.to_string(),
            reason: "size must be at least 1".into(),
        });
    }
    Ok(())
}
