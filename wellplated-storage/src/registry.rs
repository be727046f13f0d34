//! Format registry

use crate::StorageTrait;
use std::sync::Arc;
use wellplated_core::{BoundaryKey, EntityType, Format, WellplatedError, WellplatedResult};

/// Defines and looks up container formats.
pub struct FormatRegistry {
    storage: Arc<dyn StorageTrait>,
}

impl FormatRegistry {
    pub fn new(storage: Arc<dyn StorageTrait>) -> Self {
        Self { storage }
    }

    /// Validate and store a new format.
    ///
    /// Fails with a validation error for bad parameters, or a collision when
    /// the boundary key or purpose is already taken.
    pub fn define(
        &self,
        bottom_row: char,
        right_column: u8,
        prefix: &str,
        purpose: &str,
    ) -> WellplatedResult<Format> {
        let format = Format::new(bottom_row, right_column, prefix, purpose)?;
        if let Err(e) = self.storage.format_insert(&format) {
            tracing::warn!(
                boundary_key = %format.boundary_key(),
                purpose = %format.purpose(),
                error = %e,
                "Format rejected"
            );
            return Err(e);
        }
        tracing::info!(
            boundary_key = %format.boundary_key(),
            purpose = %format.purpose(),
            wells = format.well_count(),
            "Defined format"
        );
        Ok(format)
    }

    pub fn lookup(&self, key: &BoundaryKey) -> WellplatedResult<Format> {
        self.storage
            .format_get(key)?
            .ok_or_else(|| WellplatedError::not_found(EntityType::Format, key))
    }

    /// Look up a format from the textual boundary key, e.g. `H12PLATE`.
    pub fn lookup_str(&self, key: &str) -> WellplatedResult<Format> {
        let key: BoundaryKey = key.parse()?;
        self.lookup(&key)
    }

    pub fn by_purpose(&self, purpose: &str) -> WellplatedResult<Format> {
        self.storage
            .format_get_by_purpose(purpose)?
            .ok_or_else(|| WellplatedError::not_found(EntityType::Format, purpose))
    }

    pub fn list(&self) -> WellplatedResult<Vec<Format>> {
        self.storage.format_list()
    }
}
