//! Error types for wellplated operations

use crate::{EntityIdType, EntityType};
use thiserror::Error;

/// Malformed format or container parameters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Batch size {requested} outside 1..={max}")]
    BatchSize { requested: u64, max: u64 },
}

/// Uniqueness constraint violations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollisionError {
    #[error("Format boundary key {boundary_key} already exists")]
    BoundaryKey { boundary_key: String },

    #[error("Format purpose {purpose:?} already exists")]
    Purpose { purpose: String },

    #[error("Container code {code} already exists")]
    Code { code: String },

    #[error("Position {row}{column:02} already exists on container {container_code}")]
    Position {
        container_code: String,
        row: char,
        column: u8,
    },

    #[error("Duplicate {entity_type} id {id}")]
    Id { entity_type: EntityType, id: String },
}

/// A sequence number does not fit in the digits left after a boundary key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Sequence {sequence} needs more than the {width} digits left after {boundary_key}")]
pub struct OverflowError {
    pub boundary_key: String,
    pub sequence: u64,
    pub width: usize,
}

/// A string that cannot be a container code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedCodeError {
    #[error("Code {code:?} has length {length}, expected {expected}")]
    Length {
        code: String,
        length: usize,
        expected: usize,
    },

    #[error("Code {code:?} contains non-printable or non-ASCII characters")]
    Charset { code: String },

    #[error("Code {code:?} bottom row {found:?} outside 'A'..='P'")]
    BottomRow { code: String, found: char },

    #[error("Code {code:?} right column {found:?} is not a number in 01..=24")]
    RightColumn { code: String, found: String },

    #[error("Code {code:?} prefix is invalid: {reason}")]
    Prefix { code: String, reason: String },

    #[error("Code {code:?} has no sequence digits")]
    MissingSequence { code: String },
}

/// A well outside the bounds embedded in its container code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoundsError {
    #[error("Row {row:?} outside 'A'..={bottom_row:?} for container {container_code}")]
    Row {
        container_code: String,
        row: char,
        bottom_row: char,
    },

    #[error("Column {column} outside 1..={right_column} for container {container_code}")]
    Column {
        container_code: String,
        column: u8,
        right_column: u8,
    },

    #[error("Well label {label:?} is not a row letter followed by a column number")]
    Label { label: String },
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type} {key}")]
    NotFound { entity_type: EntityType, key: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all wellplated errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WellplatedError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Collision error: {0}")]
    Collision(#[from] CollisionError),

    #[error("Overflow error: {0}")]
    Overflow(#[from] OverflowError),

    #[error("Malformed code: {0}")]
    MalformedCode(#[from] MalformedCodeError),

    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl WellplatedError {
    /// Shorthand for a not-found storage error.
    pub fn not_found(entity_type: EntityType, key: impl ToString) -> Self {
        WellplatedError::Storage(StorageError::NotFound {
            entity_type,
            key: key.to_string(),
        })
    }

    /// Not-found error for a row identifier, typed by the id itself.
    pub fn missing<I: EntityIdType>(id: I) -> Self {
        Self::not_found(I::ENTITY_TYPE, id)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WellplatedError::Storage(StorageError::NotFound { .. }))
    }
}

/// Result type alias for wellplated operations.
pub type WellplatedResult<T> = Result<T, WellplatedError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            entity_type: EntityType::Container,
            key: "H12PLATE0000007".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("container"));
        assert!(msg.contains("H12PLATE0000007"));
    }

    #[test]
    fn test_overflow_error_display() {
        let err = OverflowError {
            boundary_key: "P24abcdefghijk".to_string(),
            sequence: 10,
            width: 1,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("10"));
        assert!(msg.contains("1 digits"));
        assert!(msg.contains("P24abcdefghijk"));
    }

    #[test]
    fn test_bounds_error_display_row() {
        let err = BoundsError::Row {
            container_code: "H12PLATE0000007".to_string(),
            row: 'I',
            bottom_row: 'H',
        };
        let msg = format!("{}", err);
        assert!(msg.contains("'I'"));
        assert!(msg.contains("'H'"));
        assert!(msg.contains("H12PLATE0000007"));
    }

    #[test]
    fn test_collision_error_display_position() {
        let err = CollisionError::Position {
            container_code: "H12PLATE0000007".to_string(),
            row: 'A',
            column: 1,
        };
        assert_eq!(
            err.to_string(),
            "Position A01 already exists on container H12PLATE0000007"
        );
    }

    #[test]
    fn test_validation_error_display_invalid_value() {
        let err = ValidationError::InvalidValue {
            field: "right_column".to_string(),
            value: "25".to_string(),
            reason: "must be between 1 and 24".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("right_column"));
        assert!(msg.contains("25"));
        assert!(msg.contains("must be between 1 and 24"));
    }

    #[test]
    fn test_wellplated_error_from_variants() {
        let storage = WellplatedError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, WellplatedError::Storage(_)));

        let validation = WellplatedError::from(ValidationError::RequiredFieldMissing {
            field: "purpose".to_string(),
        });
        assert!(matches!(validation, WellplatedError::Validation(_)));

        let collision = WellplatedError::from(CollisionError::Purpose {
            purpose: "plate".to_string(),
        });
        assert!(matches!(collision, WellplatedError::Collision(_)));

        let malformed = WellplatedError::from(MalformedCodeError::MissingSequence {
            code: "A01abcdefghijkl".to_string(),
        });
        assert!(matches!(malformed, WellplatedError::MalformedCode(_)));

        let config = WellplatedError::from(ConfigError::InvalidValue {
            field: "max_batch_size".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        });
        assert!(matches!(config, WellplatedError::Config(_)));
    }

    #[test]
    fn test_not_found_helper() {
        let err = WellplatedError::not_found(EntityType::Plan, "plan 1");
        assert!(err.is_not_found());
        assert!(!WellplatedError::from(StorageError::LockPoisoned).is_not_found());
    }

    #[test]
    fn test_missing_names_entity_from_id() {
        let id = crate::PositionId::nil();
        match WellplatedError::missing(id) {
            WellplatedError::Storage(StorageError::NotFound { entity_type, key }) => {
                assert_eq!(entity_type, EntityType::Position);
                assert_eq!(key, id.to_string());
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
        assert!(WellplatedError::missing(crate::PlanId::now_v7())
            .to_string()
            .contains("plan"));
    }
}
