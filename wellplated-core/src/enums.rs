//! Enum types for wellplated records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity type discriminator for error reporting and polymorphic references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Format,
    Container,
    Position,
    Plan,
    Transfer,
}

impl EntityType {
    /// Convert to database table name.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            EntityType::Format => "format",
            EntityType::Container => "container",
            EntityType::Position => "position",
            EntityType::Plan => "plan",
            EntityType::Transfer => "transfer",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// Source of the numeric suffix of a container code.
///
/// A container uses exactly one mode, chosen when it is minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Numbering {
    /// Sequence number reserved from the format's counter.
    Internal(u64),
    /// Operator-supplied number from a pre-printed or manufacturer barcode.
    External(u64),
}

impl Numbering {
    /// The number that fills the code's sequence field.
    pub fn sequence(&self) -> u64 {
        match self {
            Numbering::Internal(n) | Numbering::External(n) => *n,
        }
    }

    /// The external id, if this container was externally barcoded.
    pub fn external_id(&self) -> Option<u64> {
        match self {
            Numbering::Internal(_) => None,
            Numbering::External(n) => Some(*n),
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Numbering::Internal(_))
    }
}
