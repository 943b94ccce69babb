//! # Core Domain Entities
//!
//! Defines the identity and structure types every procedure works with.
//!
//! ## Clusters
//!
//! - **Identity**: `ObjectId`, `KeywordSetId`
//! - **Structure**: `Molecule`
//! - **Computation**: `Driver`

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// IDENTITY
// =============================================================================

/// The universal 24-character lowercase-hex entity key.
///
/// Used for molecules, keyword sets and results alike. Construction always
/// validates; there is no way to hold an `ObjectId` with a bad payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Required length in characters.
    pub const LENGTH: usize = 24;

    /// Validate and wrap an identifier.
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let valid = value.len() == Self::LENGTH
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));

        if valid {
            Ok(Self(value))
        } else {
            Err(ValidationError::InvalidObjectId { value })
        }
    }

    /// Build an identifier from a store-side sequence number.
    ///
    /// Intended for store adapters only. A `u64` renders to at most 16 hex
    /// digits, so the zero-padded form is always a valid 24-character id.
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("{:024x}", sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObjectId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl FromStr for ObjectId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a keyword set: either store-assigned or a batch-local integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeywordSetId {
    /// Id assigned by the persistent store.
    Object(ObjectId),
    /// Provisional id used before the keyword set reaches the store.
    Local(i64),
}

impl fmt::Display for KeywordSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(id) => write!(f, "{}", id),
            Self::Local(n) => write!(f, "{}", n),
        }
    }
}

impl From<ObjectId> for KeywordSetId {
    fn from(id: ObjectId) -> Self {
        Self::Object(id)
    }
}

// =============================================================================
// STRUCTURE
// =============================================================================

/// A molecular structure as exchanged with the store and the execution layer.
///
/// The structural representation itself belongs to the chemistry library;
/// this type only fixes the fields the pipeline relies on and keeps every
/// other field in `extras`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Molecule {
    /// Store id, present once the molecule has been registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Element symbols, one per atom.
    pub symbols: Vec<String>,
    /// Flattened cartesian coordinates, three per atom.
    pub geometry: Vec<f64>,
    /// Any additional fields (charge, multiplicity, connectivity, ...).
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl Molecule {
    pub fn new(symbols: Vec<String>, geometry: Vec<f64>) -> Self {
        Self {
            id: None,
            symbols,
            geometry,
            extras: Map::new(),
        }
    }

    /// Return a copy carrying the given store id.
    pub fn with_id(mut self, id: ObjectId) -> Self {
        self.id = Some(id);
        self
    }

    /// Return a copy with the store id stripped (content only).
    pub fn without_id(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }
}

// =============================================================================
// COMPUTATION
// =============================================================================

/// What quantity a single-point computation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    Energy,
    Gradient,
    Hessian,
    Properties,
}

impl Driver {
    /// Accepted spellings, for error messages.
    pub const EXPECTED: &'static str = "energy, gradient, hessian, properties";

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Gradient => "gradient",
            Self::Hessian => "hessian",
            Self::Properties => "properties",
        }
    }
}

impl FromStr for Driver {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "energy" => Ok(Self::Energy),
            "gradient" => Ok(Self::Gradient),
            "hessian" => Ok(Self::Hessian),
            "properties" => Ok(Self::Properties),
            other => Err(ValidationError::InvalidEnum {
                field: "driver",
                value: other.to_string(),
                expected: Self::EXPECTED,
            }),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
