//! Container and position inventory
//!
//! Minting reserves a block from the [`SequenceAllocator`] first, then
//! builds codes and stores the batch with no allocator lock held.

use crate::{SequenceAllocator, StorageTrait};
use std::sync::Arc;
use wellplated_core::{
    all_addresses, BoundaryKey, CollisionError, Container, ContainerCode, EntityType, Numbering,
    Position, WellAddress, WellplatedError, WellplatedResult,
};

/// Mints containers and registers their positions.
pub struct Inventory {
    storage: Arc<dyn StorageTrait>,
    allocator: Arc<SequenceAllocator>,
}

impl Inventory {
    pub fn new(storage: Arc<dyn StorageTrait>, allocator: Arc<SequenceAllocator>) -> Self {
        Self { storage, allocator }
    }

    pub fn allocator(&self) -> &SequenceAllocator {
        &self.allocator
    }

    fn require_format(&self, key: &BoundaryKey) -> WellplatedResult<()> {
        match self.storage.format_get(key)? {
            Some(_) => Ok(()),
            None => Err(WellplatedError::not_found(EntityType::Format, key)),
        }
    }

    /// Mint `count` internally numbered containers of one format.
    ///
    /// The whole batch is stored or none of it is. A format's counter starts
    /// after the highest internal sequence already in storage. Numbers from a
    /// failed batch go back to the allocator when no later block was reserved,
    /// unless the failure was a code collision.
    pub fn mint(&self, key: &BoundaryKey, count: u64) -> WellplatedResult<Vec<Container>> {
        self.require_format(key)?;

        let block = self.allocator.allocate_after(key, count, || {
            self.storage.container_max_internal_sequence(key)
        })?;
        let containers = block
            .iter()
            .map(|sequence| Container::mint(key, Numbering::Internal(sequence)))
            .collect::<WellplatedResult<Vec<_>>>()?;

        if let Err(e) = self.storage.container_insert_batch(&containers) {
            // A taken code would be handed out again.
            let released = !matches!(e, WellplatedError::Collision(CollisionError::Code { .. }))
                && self.allocator.release(key, block).unwrap_or(false);
            tracing::warn!(
                boundary_key = %key,
                start = block.start(),
                count = block.count(),
                released,
                error = %e,
                "Container batch rejected"
            );
            return Err(e);
        }
        tracing::debug!(
            boundary_key = %key,
            start = block.start(),
            count = block.count(),
            "Minted containers"
        );
        Ok(containers)
    }

    pub fn mint_one(&self, key: &BoundaryKey) -> WellplatedResult<Container> {
        let mut minted = self.mint(key, 1)?;
        minted
            .pop()
            .ok_or_else(|| WellplatedError::not_found(EntityType::Container, key))
    }

    /// Register a container that carries an identifier assigned elsewhere.
    ///
    /// The allocator is not consulted. A clash with an existing code is a
    /// collision.
    pub fn register_external(
        &self,
        key: &BoundaryKey,
        external_id: u64,
    ) -> WellplatedResult<Container> {
        self.require_format(key)?;
        let container = Container::mint(key, Numbering::External(external_id))?;
        self.storage.container_insert(&container)?;
        tracing::debug!(code = %container.code(), external_id, "Registered external container");
        Ok(container)
    }

    pub fn container(&self, code: &ContainerCode) -> WellplatedResult<Container> {
        self.storage
            .container_get(code)?
            .ok_or_else(|| WellplatedError::not_found(EntityType::Container, code))
    }

    /// Look up a container from its textual code.
    pub fn container_str(&self, code: &str) -> WellplatedResult<Container> {
        let code = ContainerCode::parse(code)?;
        self.container(&code)
    }

    pub fn containers(&self, key: &BoundaryKey) -> WellplatedResult<Vec<Container>> {
        self.storage.container_list_by_format(key)
    }

    /// Register the well at `row`, `column` of an existing container.
    pub fn add_position(
        &self,
        code: &ContainerCode,
        row: char,
        column: u8,
    ) -> WellplatedResult<Position> {
        self.container(code)?;
        let position = Position::new(code.clone(), row, column)?;
        self.storage.position_insert(&position)?;
        Ok(position)
    }

    /// Register a well by label, e.g. `H12` or `A1`.
    pub fn add_position_label(
        &self,
        code: &ContainerCode,
        label: &str,
    ) -> WellplatedResult<Position> {
        let address: WellAddress = label.parse()?;
        self.add_position(code, address.row, address.column)
    }

    /// Register every well of a container that is not registered yet.
    ///
    /// Returns the full row-major list of positions afterwards.
    pub fn fill_positions(&self, code: &ContainerCode) -> WellplatedResult<Vec<Position>> {
        self.container(code)?;
        for address in all_addresses(code) {
            if self
                .storage
                .position_get_at(code, address.row, address.column)?
                .is_none()
            {
                self.storage.position_insert(&Position::at(code.clone(), address)?)?;
            }
        }
        self.positions(code)
    }

    /// Find the registered well at `label`.
    pub fn position_at(&self, code: &ContainerCode, label: &str) -> WellplatedResult<Position> {
        let address: WellAddress = label.parse()?;
        self.storage
            .position_get_at(code, address.row, address.column)?
            .ok_or_else(|| {
                let label = format!("{}.{address}", code.label());
                WellplatedError::not_found(EntityType::Position, label)
            })
    }

    pub fn positions(&self, code: &ContainerCode) -> WellplatedResult<Vec<Position>> {
        self.storage.position_list_by_container(code)
    }
}
