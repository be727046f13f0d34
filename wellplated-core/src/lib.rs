//! Wellplated Core - Entity Types, Codec, and Validation
//!
//! Pure data structures and pure functions for tracking multi-well plates,
//! tubes, and the liquid transfers between their wells. No I/O and no
//! locking; storage and sequence allocation live in `wellplated-storage`.

pub mod codec;
pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;
pub mod position;

pub use codec::{
    BoundaryKey, ContainerCode, DecodedCode, BOUNDARY_KEY_MAX_LENGTH, CODE_LENGTH, HEADER_LENGTH,
    MAX_BOTTOM_ROW, MAX_EXTERNAL_ID, MAX_RIGHT_COLUMN, MIN_COLUMN, POSITION_SEPARATOR,
    PREFIX_MAX_LENGTH, TOP_ROW,
};
pub use config::WellplatedConfig;
pub use entities::{describe_transfer, Container, Format, Plan, Position, Transfer};
pub use enums::{EntityType, Numbering};
pub use error::{
    BoundsError, CollisionError, ConfigError, MalformedCodeError, OverflowError, StorageError,
    ValidationError, WellplatedError, WellplatedResult,
};
pub use identity::{
    new_actor_id, ActorId, ContainerId, EntityIdType, FormatId, PlanId, PositionId, Timestamp,
    TransferId,
};
pub use position::{all_addresses, validate_position, validate_position_str, WellAddress};
