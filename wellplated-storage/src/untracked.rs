//! Untracked start and end positions
//!
//! Material arriving from, or leaving to, somewhere the lab does not track
//! is recorded as a transfer from the start position or to the end
//! position. Both are single-well containers with fixed external ids.

use crate::{FormatRegistry, Inventory};
use wellplated_core::{BoundaryKey, ContainerCode, Numbering, Position, WellplatedResult};

pub const START_PURPOSE: &str = "start";
pub const END_PURPOSE: &str = "end";
pub const START_EXTERNAL_ID: u64 = 0;
pub const END_EXTERNAL_ID: u64 = 999;

const UNTRACKED_WELL: &str = "A01";

/// The seeded sentinel positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UntrackedPositions {
    pub start: Position,
    pub end: Position,
}

/// Create the start and end formats, containers, and positions.
///
/// Safe to call repeatedly; existing rows are reused.
pub fn seed_untracked(
    registry: &FormatRegistry,
    inventory: &Inventory,
) -> WellplatedResult<UntrackedPositions> {
    let start = seed_one(registry, inventory, START_PURPOSE, START_EXTERNAL_ID)?;
    let end = seed_one(registry, inventory, END_PURPOSE, END_EXTERNAL_ID)?;
    tracing::info!(start = %start, end = %end, "Untracked positions ready");
    Ok(UntrackedPositions { start, end })
}

fn seed_one(
    registry: &FormatRegistry,
    inventory: &Inventory,
    purpose: &str,
    external_id: u64,
) -> WellplatedResult<Position> {
    let format = match registry.by_purpose(purpose) {
        Ok(format) => format,
        Err(e) if e.is_not_found() => registry.define('A', 1, purpose, purpose)?,
        Err(e) => return Err(e),
    };
    let key: &BoundaryKey = format.boundary_key();

    let code = ContainerCode::encode_numbering(key, Numbering::External(external_id))?;
    let container = existing_or(inventory.container(&code), || {
        inventory.register_external(key, external_id)
    })?;

    existing_or(inventory.position_at(container.code(), UNTRACKED_WELL), || {
        inventory.add_position_label(container.code(), UNTRACKED_WELL)
    })
}

fn existing_or<T>(
    found: WellplatedResult<T>,
    create: impl FnOnce() -> WellplatedResult<T>,
) -> WellplatedResult<T> {
    match found {
        Err(e) if e.is_not_found() => create(),
        other => other,
    }
}

/// Look up the untracked positions without creating anything.
pub fn find_untracked(
    registry: &FormatRegistry,
    inventory: &Inventory,
) -> WellplatedResult<UntrackedPositions> {
    let find = |purpose: &str, external_id: u64| -> WellplatedResult<Position> {
        let format = registry.by_purpose(purpose)?;
        let numbering = Numbering::External(external_id);
        let code = ContainerCode::encode_numbering(format.boundary_key(), numbering)?;
        inventory.position_at(&code, UNTRACKED_WELL)
    };
    Ok(UntrackedPositions {
        start: find(START_PURPOSE, START_EXTERNAL_ID)?,
        end: find(END_PURPOSE, END_EXTERNAL_ID)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryStorage, SequenceAllocator, StorageTrait, TransferLedger};
    use std::sync::Arc;
    use wellplated_core::new_actor_id;

    fn services() -> (Arc<InMemoryStorage>, FormatRegistry, Inventory) {
        let storage = Arc::new(InMemoryStorage::new());
        let registry = FormatRegistry::new(storage.clone());
        let inventory = Inventory::new(storage.clone(), Arc::new(SequenceAllocator::default()));
        (storage, registry, inventory)
    }

    #[test]
    fn test_seed_creates_sentinels() {
        let (_, registry, inventory) = services();
        let untracked = seed_untracked(&registry, &inventory).unwrap();

        assert_eq!(untracked.start.container_code().as_str(), "A01start0000000");
        assert_eq!(untracked.end.container_code().as_str(), "A01end000000999");
        assert_eq!(untracked.start.address().to_string(), "A01");

        let start = inventory.container(untracked.start.container_code()).unwrap();
        assert_eq!(start.external_id(), Some(START_EXTERNAL_ID));
        assert_eq!(registry.by_purpose(END_PURPOSE).unwrap().boundary_key().as_str(), "A01end");
    }

    #[test]
    fn test_seed_is_idempotent() {
        let (storage, registry, inventory) = services();
        let first = seed_untracked(&registry, &inventory).unwrap();
        let second = seed_untracked(&registry, &inventory).unwrap();

        assert_eq!(first, second);
        assert_eq!(storage.format_count(), 2);
        assert_eq!(storage.container_count(), 2);
        assert_eq!(storage.position_count(), 2);
    }

    #[test]
    fn test_find_untracked() {
        let (_, registry, inventory) = services();
        assert!(find_untracked(&registry, &inventory).unwrap_err().is_not_found());

        let seeded = seed_untracked(&registry, &inventory).unwrap();
        assert_eq!(find_untracked(&registry, &inventory).unwrap(), seeded);
    }

    #[test]
    fn test_sentinel_transfer_description() {
        let (storage, registry, inventory) = services();
        let untracked = seed_untracked(&registry, &inventory).unwrap();
        let ledger = TransferLedger::new(storage.clone() as Arc<dyn StorageTrait>);

        let plan = ledger.create_plan(new_actor_id()).unwrap();
        let transfer = ledger
            .record_between(&plan, &untracked.start, &untracked.end)
            .unwrap();
        assert_eq!(
            ledger.describe(&transfer).unwrap(),
            "start0000000.A01 -> end000000999.A01"
        );
    }
}
