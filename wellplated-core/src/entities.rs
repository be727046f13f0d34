//! Core entity structures
//!
//! Every entity is immutable once constructed. Derived columns (boundary
//! key, container code) are computed at construction and re-checked when a
//! record is deserialized, so a stored row can never disagree with its inputs.

use crate::codec::{check_bottom_row, check_prefix, check_right_column};
use crate::{
    validate_position, ActorId, BoundaryKey, BoundsError, ContainerCode, ContainerId,
    EntityIdType, FormatId, Numbering, OverflowError, PlanId, PositionId, Timestamp, TransferId,
    ValidationError, WellAddress, WellplatedResult, MAX_EXTERNAL_ID, POSITION_SEPARATOR,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// FORMAT
// ============================================================================

/// Rows, columns, code prefix, and planned usage of a kind of container.
///
/// 1-well tubes are `A01`, 96-well plates `H12`, 384-well plates `P24`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FormatRecord")]
pub struct Format {
    id: FormatId,
    bottom_row: char,
    right_column: u8,
    prefix: String,
    boundary_key: BoundaryKey,
    purpose: String,
    created_at: Timestamp,
}

impl Format {
    /// Validate parameters and derive the boundary key.
    pub fn new(
        bottom_row: char,
        right_column: u8,
        prefix: impl Into<String>,
        purpose: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let prefix = prefix.into();
        let purpose = purpose.into();
        check_bottom_row(bottom_row)?;
        check_right_column(right_column)?;
        check_prefix(&prefix)?;
        if purpose.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "purpose".to_string(),
            });
        }
        let boundary_key = BoundaryKey::derive(bottom_row, right_column, &prefix)?;
        Ok(Self {
            id: FormatId::now_v7(),
            bottom_row,
            right_column,
            prefix,
            boundary_key,
            purpose,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> FormatId {
        self.id
    }

    pub fn bottom_row(&self) -> char {
        self.bottom_row
    }

    pub fn right_column(&self) -> u8 {
        self.right_column
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn boundary_key(&self) -> &BoundaryKey {
        &self.boundary_key
    }

    /// How container contents should be interpreted.
    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Number of wells in containers of this format.
    pub fn well_count(&self) -> usize {
        (self.bottom_row as usize - 'A' as usize + 1) * self.right_column as usize
    }

    /// Mint a code for `sequence` under this format.
    pub fn encode(&self, sequence: u64) -> Result<ContainerCode, OverflowError> {
        ContainerCode::encode(&self.boundary_key, sequence)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix)
    }
}

/// Persisted shape of a format row.
#[derive(Debug, Clone, Deserialize)]
struct FormatRecord {
    id: FormatId,
    bottom_row: char,
    right_column: u8,
    prefix: String,
    boundary_key: String,
    purpose: String,
    created_at: Timestamp,
}

impl TryFrom<FormatRecord> for Format {
    type Error = ValidationError;

    fn try_from(record: FormatRecord) -> Result<Self, Self::Error> {
        let mut format = Format::new(
            record.bottom_row,
            record.right_column,
            record.prefix,
            record.purpose,
        )?;
        if format.boundary_key.as_str() != record.boundary_key {
            return Err(ValidationError::InvalidValue {
                field: "boundary_key".to_string(),
                value: record.boundary_key,
                reason: format!("does not match derived key {}", format.boundary_key),
            });
        }
        format.id = record.id;
        format.created_at = record.created_at;
        Ok(format)
    }
}

// ============================================================================
// CONTAINER
// ============================================================================

/// A plate, tube, vial, or trough, uniquely identified by its code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ContainerRecord")]
pub struct Container {
    id: ContainerId,
    numbering: Numbering,
    code: ContainerCode,
    format_key: BoundaryKey,
    created_at: Timestamp,
}

impl Container {
    /// Build a container and derive its code.
    ///
    /// External ids above [`MAX_EXTERNAL_ID`] fail with a validation error;
    /// any number wider than the format leaves room for fails with overflow.
    pub fn mint(format_key: &BoundaryKey, numbering: Numbering) -> WellplatedResult<Self> {
        if let Numbering::External(external_id) = numbering {
            if external_id > MAX_EXTERNAL_ID {
                return Err(ValidationError::InvalidValue {
                    field: "external_id".to_string(),
                    value: external_id.to_string(),
                    reason: format!("must be at most {MAX_EXTERNAL_ID}"),
                }
                .into());
            }
        }
        let code = ContainerCode::encode_numbering(format_key, numbering)?;
        Ok(Self {
            id: ContainerId::now_v7(),
            numbering,
            code,
            format_key: format_key.clone(),
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn numbering(&self) -> Numbering {
        self.numbering
    }

    pub fn external_id(&self) -> Option<u64> {
        self.numbering.external_id()
    }

    pub fn code(&self) -> &ContainerCode {
        &self.code
    }

    pub fn format_key(&self) -> &BoundaryKey {
        &self.format_key
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code.label())
    }
}

/// Persisted shape of a container row.
#[derive(Debug, Clone, Deserialize)]
struct ContainerRecord {
    id: ContainerId,
    numbering: Numbering,
    code: String,
    format_key: BoundaryKey,
    created_at: Timestamp,
}

impl TryFrom<ContainerRecord> for Container {
    type Error = String;

    fn try_from(record: ContainerRecord) -> Result<Self, Self::Error> {
        let mut container =
            Container::mint(&record.format_key, record.numbering).map_err(|e| e.to_string())?;
        if container.code.as_str() != record.code {
            return Err(format!(
                "code {} does not match derived code {}",
                record.code, container.code
            ));
        }
        container.id = record.id;
        container.created_at = record.created_at;
        Ok(container)
    }
}

// ============================================================================
// POSITION
// ============================================================================

/// One well of a plate, or the single position of a tube.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PositionRecord")]
pub struct Position {
    id: PositionId,
    container_code: ContainerCode,
    row: char,
    column: u8,
}

impl Position {
    /// Build a position, rejecting wells outside the container's bounds.
    pub fn new(container_code: ContainerCode, row: char, column: u8) -> Result<Self, BoundsError> {
        validate_position(&container_code, row, column)?;
        Ok(Self {
            id: PositionId::now_v7(),
            container_code,
            row,
            column,
        })
    }

    pub fn at(container_code: ContainerCode, address: WellAddress) -> Result<Self, BoundsError> {
        Self::new(container_code, address.row, address.column)
    }

    pub fn id(&self) -> PositionId {
        self.id
    }

    pub fn container_code(&self) -> &ContainerCode {
        &self.container_code
    }

    pub fn row(&self) -> char {
        self.row
    }

    pub fn column(&self) -> u8 {
        self.column
    }

    pub fn address(&self) -> WellAddress {
        WellAddress::new(self.row, self.column)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.container_code.label(),
            POSITION_SEPARATOR,
            self.address()
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PositionRecord {
    id: PositionId,
    container_code: ContainerCode,
    row: char,
    column: u8,
}

impl TryFrom<PositionRecord> for Position {
    type Error = BoundsError;

    fn try_from(record: PositionRecord) -> Result<Self, Self::Error> {
        let mut position = Position::new(record.container_code, record.row, record.column)?;
        position.id = record.id;
        Ok(position)
    }
}

// ============================================================================
// PLAN & TRANSFER
// ============================================================================

/// A set of transfers describing what should happen.
///
/// Lifecycle bookkeeping (started, finished, canceled) belongs to the
/// application layer; a plan here only groups transfers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub created_by: ActorId,
    pub created_at: Timestamp,
}

impl Plan {
    pub fn new(created_by: ActorId) -> Self {
        Self {
            id: PlanId::now_v7(),
            created_by,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plan {}", self.id)
    }
}

/// Movement of liquid from one position to another.
///
/// The same (source, sink) pair may repeat within a plan, e.g. to move a
/// volume larger than one pipette tip, and across plans for multiple rounds
/// of transfer and drying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub plan_id: PlanId,
    pub source_id: PositionId,
    pub sink_id: PositionId,
}

impl Transfer {
    pub fn new(plan_id: PlanId, source_id: PositionId, sink_id: PositionId) -> Self {
        Self {
            id: TransferId::now_v7(),
            plan_id,
            source_id,
            sink_id,
        }
    }
}

/// Human-readable `source -> sink` form of a transfer.
pub fn describe_transfer(source: &Position, sink: &Position) -> String {
    format!("{source} -> {sink}")
}

// =============================================================================
// TESTS
// =============================================================================
