//! Wellplated Storage - Append-Only Storage, Allocation, and Ledger
//!
//! Defines the storage abstraction for wellplated records and the services
//! built on it: format registry, per-format sequence allocation, container
//! and position inventory, and the transfer ledger.
//!
//! Records are append-only. The storage trait exposes inserts and reads
//! only; there is no update or delete to call.

pub mod allocator;
pub mod inventory;
pub mod ledger;
pub mod registry;
pub mod untracked;

pub use allocator::{SequenceAllocator, SequenceBlock};
pub use inventory::Inventory;
pub use ledger::TransferLedger;
pub use registry::FormatRegistry;
pub use untracked::{
    find_untracked, seed_untracked, UntrackedPositions, END_EXTERNAL_ID, END_PURPOSE,
    START_EXTERNAL_ID, START_PURPOSE,
};

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use wellplated_core::{
    BoundaryKey, CollisionError, Container, ContainerCode, EntityType, Format, Plan, PlanId,
    Position, PositionId, StorageError, Transfer, TransferId, WellplatedConfig, WellplatedError,
    WellplatedResult,
};

// ============================================================================
// STORAGE TRAIT
// ============================================================================

/// Append-only storage for wellplated records.
///
/// Implementations enforce the same uniqueness and reference constraints as
/// the production schema: unique boundary key, purpose, container code,
/// and (container, row, column); every reference must point at an
/// existing row.
pub trait StorageTrait: Send + Sync {
    // === Format Operations ===

    /// Insert a new format.
    fn format_insert(&self, f: &Format) -> WellplatedResult<()>;

    /// Get a format by boundary key.
    fn format_get(&self, key: &BoundaryKey) -> WellplatedResult<Option<Format>>;

    /// Get a format by purpose.
    fn format_get_by_purpose(&self, purpose: &str) -> WellplatedResult<Option<Format>>;

    /// List all formats ordered by boundary key.
    fn format_list(&self) -> WellplatedResult<Vec<Format>>;

    // === Container Operations ===

    /// Insert a batch of containers; either all are stored or none are.
    fn container_insert_batch(&self, containers: &[Container]) -> WellplatedResult<()>;

    /// Insert a single container.
    fn container_insert(&self, c: &Container) -> WellplatedResult<()> {
        self.container_insert_batch(std::slice::from_ref(c))
    }

    /// Get a container by code.
    fn container_get(&self, code: &ContainerCode) -> WellplatedResult<Option<Container>>;

    /// List containers of a format ordered by code.
    fn container_list_by_format(&self, key: &BoundaryKey) -> WellplatedResult<Vec<Container>>;

    /// Highest internal sequence stored for a format.
    fn container_max_internal_sequence(&self, key: &BoundaryKey) -> WellplatedResult<Option<u64>>;

    // === Position Operations ===

    /// Insert a new position.
    fn position_insert(&self, p: &Position) -> WellplatedResult<()>;

    /// Get a position by ID.
    fn position_get(&self, id: PositionId) -> WellplatedResult<Option<Position>>;

    /// Get the position at a row and column of a container.
    fn position_get_at(
        &self,
        code: &ContainerCode,
        row: char,
        column: u8,
    ) -> WellplatedResult<Option<Position>>;

    /// List positions of a container in row-major order.
    fn position_list_by_container(&self, code: &ContainerCode) -> WellplatedResult<Vec<Position>>;

    // === Plan Operations ===

    /// Insert a new plan.
    fn plan_insert(&self, p: &Plan) -> WellplatedResult<()>;

    /// Get a plan by ID.
    fn plan_get(&self, id: PlanId) -> WellplatedResult<Option<Plan>>;

    // === Transfer Operations ===

    /// Append a transfer.
    fn transfer_insert(&self, t: &Transfer) -> WellplatedResult<()>;

    /// Get a transfer by ID.
    fn transfer_get(&self, id: TransferId) -> WellplatedResult<Option<Transfer>>;

    /// List transfers of a plan in recording order.
    fn transfer_list_by_plan(&self, plan_id: PlanId) -> WellplatedResult<Vec<Transfer>>;

    /// List transfers leaving a position in recording order.
    fn transfer_list_by_source(&self, source_id: PositionId) -> WellplatedResult<Vec<Transfer>>;

    /// List transfers entering a position in recording order.
    fn transfer_list_by_sink(&self, sink_id: PositionId) -> WellplatedResult<Vec<Transfer>>;
}

// ============================================================================
// IN-MEMORY STORAGE
// ============================================================================

fn read<T>(lock: &RwLock<T>) -> WellplatedResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| WellplatedError::Storage(StorageError::LockPoisoned))
}

fn write<T>(lock: &RwLock<T>) -> WellplatedResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| WellplatedError::Storage(StorageError::LockPoisoned))
}

#[derive(Debug, Default)]
struct FormatTable {
    by_key: HashMap<BoundaryKey, Format>,
    key_by_purpose: HashMap<String, BoundaryKey>,
}

#[derive(Debug, Default)]
struct PositionTable {
    by_id: HashMap<PositionId, Position>,
    id_by_address: HashMap<(ContainerCode, char, u8), PositionId>,
}

#[derive(Debug, Default)]
struct TransferLog {
    entries: Vec<Transfer>,
    ids: HashSet<TransferId>,
}

/// In-memory storage for tests and single-process use.
///
/// Tables are locked independently, always in declaration order, so
/// reference checks never deadlock.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    formats: Arc<RwLock<FormatTable>>,
    containers: Arc<RwLock<HashMap<ContainerCode, Container>>>,
    positions: Arc<RwLock<PositionTable>>,
    plans: Arc<RwLock<HashMap<PlanId, Plan>>>,
    transfers: Arc<RwLock<TransferLog>>,
}

impl InMemoryStorage {
    /// Create a new in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get count of stored formats.
    pub fn format_count(&self) -> usize {
        read(&self.formats).map(|t| t.by_key.len()).unwrap_or(0)
    }

    /// Get count of stored containers.
    pub fn container_count(&self) -> usize {
        read(&self.containers).map(|t| t.len()).unwrap_or(0)
    }

    /// Get count of stored positions.
    pub fn position_count(&self) -> usize {
        read(&self.positions).map(|t| t.by_id.len()).unwrap_or(0)
    }

    /// Get count of stored transfers.
    pub fn transfer_count(&self) -> usize {
        read(&self.transfers).map(|t| t.entries.len()).unwrap_or(0)
    }

    fn require_position(&self, id: PositionId) -> WellplatedResult<()> {
        if read(&self.positions)?.by_id.contains_key(&id) {
            Ok(())
        } else {
            Err(WellplatedError::missing(id))
        }
    }
}

impl StorageTrait for InMemoryStorage {
    // === Format Operations ===

    fn format_insert(&self, f: &Format) -> WellplatedResult<()> {
        let mut formats = write(&self.formats)?;
        if formats.by_key.contains_key(f.boundary_key()) {
            return Err(CollisionError::BoundaryKey {
                boundary_key: f.boundary_key().to_string(),
            }
            .into());
        }
        if formats.key_by_purpose.contains_key(f.purpose()) {
            return Err(CollisionError::Purpose {
                purpose: f.purpose().to_string(),
            }
            .into());
        }
        formats
            .key_by_purpose
            .insert(f.purpose().to_string(), f.boundary_key().clone());
        formats.by_key.insert(f.boundary_key().clone(), f.clone());
        Ok(())
    }

    fn format_get(&self, key: &BoundaryKey) -> WellplatedResult<Option<Format>> {
        Ok(read(&self.formats)?.by_key.get(key).cloned())
    }

    fn format_get_by_purpose(&self, purpose: &str) -> WellplatedResult<Option<Format>> {
        let formats = read(&self.formats)?;
        Ok(formats
            .key_by_purpose
            .get(purpose)
            .and_then(|key| formats.by_key.get(key))
            .cloned())
    }

    fn format_list(&self) -> WellplatedResult<Vec<Format>> {
        let mut result: Vec<Format> = read(&self.formats)?.by_key.values().cloned().collect();
        result.sort_by(|a, b| a.boundary_key().cmp(b.boundary_key()));
        Ok(result)
    }

    // === Container Operations ===

    fn container_insert_batch(&self, containers: &[Container]) -> WellplatedResult<()> {
        {
            let formats = read(&self.formats)?;
            for c in containers {
                if !formats.by_key.contains_key(c.format_key()) {
                    return Err(WellplatedError::not_found(EntityType::Format, c.format_key()));
                }
            }
        }

        let mut stored = write(&self.containers)?;
        let mut batch_codes = HashSet::with_capacity(containers.len());
        for c in containers {
            if stored.contains_key(c.code()) || !batch_codes.insert(c.code()) {
                return Err(CollisionError::Code {
                    code: c.code().to_string(),
                }
                .into());
            }
        }
        for c in containers {
            stored.insert(c.code().clone(), c.clone());
        }
        Ok(())
    }

    fn container_get(&self, code: &ContainerCode) -> WellplatedResult<Option<Container>> {
        Ok(read(&self.containers)?.get(code).cloned())
    }

    fn container_list_by_format(&self, key: &BoundaryKey) -> WellplatedResult<Vec<Container>> {
        let mut result: Vec<Container> = read(&self.containers)?
            .values()
            .filter(|c| c.format_key() == key)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.code().cmp(b.code()));
        Ok(result)
    }

    fn container_max_internal_sequence(&self, key: &BoundaryKey) -> WellplatedResult<Option<u64>> {
        Ok(read(&self.containers)?
            .values()
            .filter(|c| c.format_key() == key && c.numbering().is_internal())
            .map(|c| c.numbering().sequence())
            .max())
    }

    // === Position Operations ===

    fn position_insert(&self, p: &Position) -> WellplatedResult<()> {
        if !read(&self.containers)?.contains_key(p.container_code()) {
            return Err(WellplatedError::not_found(
                EntityType::Container,
                p.container_code(),
            ));
        }

        let mut positions = write(&self.positions)?;
        let address = (p.container_code().clone(), p.row(), p.column());
        if positions.id_by_address.contains_key(&address) {
            return Err(CollisionError::Position {
                container_code: p.container_code().to_string(),
                row: p.row(),
                column: p.column(),
            }
            .into());
        }
        if positions.by_id.contains_key(&p.id()) {
            return Err(CollisionError::Id {
                entity_type: EntityType::Position,
                id: p.id().to_string(),
            }
            .into());
        }
        positions.id_by_address.insert(address, p.id());
        positions.by_id.insert(p.id(), p.clone());
        Ok(())
    }

    fn position_get(&self, id: PositionId) -> WellplatedResult<Option<Position>> {
        Ok(read(&self.positions)?.by_id.get(&id).cloned())
    }

    fn position_get_at(
        &self,
        code: &ContainerCode,
        row: char,
        column: u8,
    ) -> WellplatedResult<Option<Position>> {
        let positions = read(&self.positions)?;
        Ok(positions
            .id_by_address
            .get(&(code.clone(), row, column))
            .and_then(|id| positions.by_id.get(id))
            .cloned())
    }

    fn position_list_by_container(&self, code: &ContainerCode) -> WellplatedResult<Vec<Position>> {
        let mut result: Vec<Position> = read(&self.positions)?
            .by_id
            .values()
            .filter(|p| p.container_code() == code)
            .cloned()
            .collect();
        result.sort_by_key(|p| p.address());
        Ok(result)
    }

    // === Plan Operations ===

    fn plan_insert(&self, p: &Plan) -> WellplatedResult<()> {
        let mut plans = write(&self.plans)?;
        if plans.contains_key(&p.id) {
            return Err(CollisionError::Id {
                entity_type: EntityType::Plan,
                id: p.id.to_string(),
            }
            .into());
        }
        plans.insert(p.id, p.clone());
        Ok(())
    }

    fn plan_get(&self, id: PlanId) -> WellplatedResult<Option<Plan>> {
        Ok(read(&self.plans)?.get(&id).cloned())
    }

    // === Transfer Operations ===

    fn transfer_insert(&self, t: &Transfer) -> WellplatedResult<()> {
        self.require_position(t.source_id)?;
        self.require_position(t.sink_id)?;
        if !read(&self.plans)?.contains_key(&t.plan_id) {
            return Err(WellplatedError::missing(t.plan_id));
        }

        let mut transfers = write(&self.transfers)?;
        if !transfers.ids.insert(t.id) {
            return Err(CollisionError::Id {
                entity_type: EntityType::Transfer,
                id: t.id.to_string(),
            }
            .into());
        }
        transfers.entries.push(t.clone());
        Ok(())
    }

    fn transfer_get(&self, id: TransferId) -> WellplatedResult<Option<Transfer>> {
        Ok(read(&self.transfers)?
            .entries
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    fn transfer_list_by_plan(&self, plan_id: PlanId) -> WellplatedResult<Vec<Transfer>> {
        Ok(read(&self.transfers)?
            .entries
            .iter()
            .filter(|t| t.plan_id == plan_id)
            .cloned()
            .collect())
    }

    fn transfer_list_by_source(&self, source_id: PositionId) -> WellplatedResult<Vec<Transfer>> {
        Ok(read(&self.transfers)?
            .entries
            .iter()
            .filter(|t| t.source_id == source_id)
            .cloned()
            .collect())
    }

    fn transfer_list_by_sink(&self, sink_id: PositionId) -> WellplatedResult<Vec<Transfer>> {
        Ok(read(&self.transfers)?
            .entries
            .iter()
            .filter(|t| t.sink_id == sink_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// FACADE
// ============================================================================

/// All wellplated services sharing one storage and one allocator.
pub struct Wellplated {
    pub registry: FormatRegistry,
    pub inventory: Inventory,
    pub ledger: TransferLedger,
    untracked: Option<UntrackedPositions>,
}

impl Wellplated {
    /// Wire the services over `storage`, seeding untracked positions if configured.
    pub fn new(
        storage: Arc<dyn StorageTrait>,
        config: &WellplatedConfig,
    ) -> WellplatedResult<Self> {
        config.validate()?;
        let allocator = Arc::new(SequenceAllocator::new(config));
        let registry = FormatRegistry::new(Arc::clone(&storage));
        let inventory = Inventory::new(Arc::clone(&storage), allocator);
        let ledger = TransferLedger::new(storage);
        let untracked = if config.seed_untracked {
            Some(seed_untracked(&registry, &inventory)?)
        } else {
            None
        };
        Ok(Self {
            registry,
            inventory,
            ledger,
            untracked,
        })
    }

    /// Services over a fresh [`InMemoryStorage`].
    pub fn in_memory(config: &WellplatedConfig) -> WellplatedResult<Self> {
        Self::new(Arc::new(InMemoryStorage::new()), config)
    }

    /// Services over `storage`, configured from `WELLPLATED_*` environment
    /// variables.
    pub fn from_env(storage: Arc<dyn StorageTrait>) -> WellplatedResult<Self> {
        let config = WellplatedConfig::from_env();
        tracing::debug!(?config, "Loaded configuration from environment");
        Self::new(storage, &config)
    }

    /// Untracked source and sink, if seeded.
    pub fn untracked(&self) -> Option<&UntrackedPositions> {
        self.untracked.as_ref()
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use wellplated_core::{EntityIdType, Numbering};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Missing records come back as Ok(None), never as errors.
        #[test]
        fn prop_storage_not_found_returns_none(sequence in 0u64..10_000_000) {
            let storage = InMemoryStorage::new();
            let key = BoundaryKey::derive('H', 12, "PLATE").unwrap();
            let code = ContainerCode::encode(&key, sequence).unwrap();

            prop_assert!(storage.format_get(&key).unwrap().is_none());
            prop_assert!(storage.container_get(&code).unwrap().is_none());
            prop_assert!(storage.position_get_at(&code, 'A', 1).unwrap().is_none());
            prop_assert!(storage.plan_get(PlanId::nil()).unwrap().is_none());
        }

        /// Inserting a container batch either stores all of it or none of it.
        #[test]
        fn prop_batch_insert_atomic(
            existing in prop::collection::hash_set(1u64..50, 0..5),
            batch in prop::collection::vec(1u64..50, 1..10),
        ) {
            let storage = InMemoryStorage::new();
            let format = Format::new('H', 12, "PLATE", "plate").unwrap();
            storage.format_insert(&format).unwrap();
            for s in &existing {
                let c = Container::mint(format.boundary_key(), Numbering::Internal(*s)).unwrap();
                storage.container_insert(&c).unwrap();
            }

            let containers: Vec<Container> = batch
                .iter()
                .map(|s| Container::mint(format.boundary_key(), Numbering::Internal(*s)).unwrap())
                .collect();
            let distinct: HashSet<u64> = batch.iter().copied().collect();
            let clean = distinct.len() == batch.len() && distinct.is_disjoint(&existing);

            let result = storage.container_insert_batch(&containers);
            prop_assert_eq!(result.is_ok(), clean);
            let expected = if clean { existing.len() + batch.len() } else { existing.len() };
            prop_assert_eq!(storage.container_count(), expected);
        }
    }
}
