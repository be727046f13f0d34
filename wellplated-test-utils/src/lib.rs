//! Wellplated Test Utilities
//!
//! Shared test infrastructure for the wellplated workspace:
//! - Proptest generators for formats, codes, and wells
//! - Fixtures for a seeded in-memory lab
//! - Assertions for wellplated error categories

pub use wellplated_storage::{
    FormatRegistry, InMemoryStorage, Inventory, SequenceAllocator, StorageTrait, TransferLedger,
    UntrackedPositions, Wellplated,
};

pub use wellplated_core::{
    BoundaryKey, BoundsError, CollisionError, Container, ContainerCode, EntityIdType, EntityType,
    Format, Numbering, Plan, PlanId, Position, PositionId, StorageError, Transfer,
    ValidationError, WellAddress, WellplatedConfig, WellplatedError, WellplatedResult,
    MAX_BOTTOM_ROW, MAX_RIGHT_COLUMN, PREFIX_MAX_LENGTH, TOP_ROW,
};

use uuid::Uuid;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for wellplated value types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    pub fn arb_position_id() -> impl Strategy<Value = PositionId> {
        arb_uuid().prop_map(PositionId::new)
    }

    pub fn arb_plan_id() -> impl Strategy<Value = PlanId> {
        arb_uuid().prop_map(PlanId::new)
    }

    /// Generate a bottom row letter, `A` through `P`.
    pub fn arb_bottom_row() -> impl Strategy<Value = char> {
        (TOP_ROW as u8..=MAX_BOTTOM_ROW as u8).prop_map(char::from)
    }

    /// Generate a right column, 1 through 24.
    pub fn arb_right_column() -> impl Strategy<Value = u8> {
        1u8..=MAX_RIGHT_COLUMN
    }

    /// Generate a valid prefix: printable ASCII, no `.`, not ending in a digit.
    pub fn arb_prefix() -> impl Strategy<Value = String> {
        "([!-~&&[^.]]{0,10}[!-/:-~&&[^.]])?"
    }

    pub fn arb_boundary_key() -> impl Strategy<Value = BoundaryKey> {
        (arb_bottom_row(), arb_right_column(), arb_prefix()).prop_map(|(row, column, prefix)| {
            BoundaryKey::derive(row, column, &prefix).expect("generated parts are valid")
        })
    }

    /// Generate a sequence that fits `key`'s sequence field.
    pub fn arb_sequence_for(key: &BoundaryKey) -> impl Strategy<Value = u64> {
        0..=key.capacity()
    }

    /// Generate a boundary key together with a sequence that fits it.
    pub fn arb_key_and_sequence() -> impl Strategy<Value = (BoundaryKey, u64)> {
        arb_boundary_key().prop_flat_map(|key| {
            let sequences = arb_sequence_for(&key);
            (Just(key), sequences)
        })
    }

    pub fn arb_container_code() -> impl Strategy<Value = ContainerCode> {
        arb_key_and_sequence().prop_map(|(key, sequence)| {
            ContainerCode::encode(&key, sequence).expect("sequence fits key")
        })
    }

    /// Generate a well inside a container of `bottom_row` by `right_column`.
    pub fn arb_well_within(
        bottom_row: char,
        right_column: u8,
    ) -> impl Strategy<Value = WellAddress> {
        (TOP_ROW as u8..=bottom_row as u8, 1u8..=right_column)
            .prop_map(|(row, column)| WellAddress::new(char::from(row), column))
    }

    /// Generate any well address on the largest supported grid.
    pub fn arb_well() -> impl Strategy<Value = WellAddress> {
        arb_well_within(MAX_BOTTOM_ROW, MAX_RIGHT_COLUMN)
    }

    pub fn arb_valid_config() -> impl Strategy<Value = WellplatedConfig> {
        (1u64..=100_000, 0u64..=1_000, any::<bool>()).prop_map(
            |(max_batch_size, first_sequence, seed_untracked)| WellplatedConfig {
                max_batch_size,
                first_sequence,
                seed_untracked,
            },
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built wellplated values for common test scenarios.

    use super::*;

    pub const PLATE_PURPOSE: &str = "96-well plate";
    pub const TUBE_PURPOSE: &str = "final-tube";

    pub fn plate_96() -> Format {
        Format::new('H', 12, "PLATE", PLATE_PURPOSE).expect("96-well format is valid")
    }

    pub fn plate_384() -> Format {
        Format::new('P', 24, "PLATE", "384-well plate").expect("384-well format is valid")
    }

    pub fn tube() -> Format {
        Format::new('A', 1, "t", TUBE_PURPOSE).expect("tube format is valid")
    }

    /// A lab over fresh in-memory storage with the untracked positions seeded.
    pub fn seeded_lab() -> Wellplated {
        Wellplated::in_memory(&WellplatedConfig::default()).expect("default config is valid")
    }

    /// A seeded lab with the 96-well plate and tube formats defined.
    pub fn lab_with_formats() -> (Wellplated, Format, Format) {
        let lab = seeded_lab();
        let plate = lab
            .registry
            .define('H', 12, "PLATE", PLATE_PURPOSE)
            .expect("plate format defines");
        let tube = lab
            .registry
            .define('A', 1, "t", TUBE_PURPOSE)
            .expect("tube format defines");
        (lab, plate, tube)
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for wellplated error categories.

    use super::*;

    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &WellplatedResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a result is a NotFound storage error for `entity_type`.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(
        result: &WellplatedResult<T>,
        entity_type: EntityType,
    ) {
        match result {
            Err(WellplatedError::Storage(StorageError::NotFound { entity_type: et, .. })) => {
                assert_eq!(*et, entity_type, "Wrong entity type in NotFound error");
            }
            other => panic!("Expected NotFound error for {:?}, got: {:?}", entity_type, other),
        }
    }

    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &WellplatedResult<T>) {
        match result {
            Err(WellplatedError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_collision<T: std::fmt::Debug>(result: &WellplatedResult<T>) {
        match result {
            Err(WellplatedError::Collision(_)) => {}
            other => panic!("Expected Collision error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_overflow<T: std::fmt::Debug>(result: &WellplatedResult<T>) {
        match result {
            Err(WellplatedError::Overflow(_)) => {}
            other => panic!("Expected Overflow error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_bounds_error<T: std::fmt::Debug>(result: &WellplatedResult<T>) {
        match result {
            Err(WellplatedError::Bounds(_)) => {}
            other => panic!("Expected Bounds error, got: {:?}", other),
        }
    }
}
