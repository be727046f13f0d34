//! Identity types for wellplated records

use crate::EntityType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Identifier of the person or system that created a plan.
pub type ActorId = Uuid;

/// Common behavior for strongly-typed row identifiers.
///
/// Row identifiers are UUIDv7 so they sort by creation time. They are
/// distinct from a container's internal sequence number, which is counted
/// per format and embedded in the container code.
pub trait EntityIdType: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync {
    /// Entity type this identifier refers to.
    const ENTITY_TYPE: EntityType;

    /// Wrap an existing UUID.
    fn new(id: Uuid) -> Self;

    /// Access the underlying UUID.
    fn as_uuid(&self) -> Uuid;

    /// Generate a new timestamp-sortable identifier.
    fn now_v7() -> Self {
        Self::new(Uuid::now_v7())
    }

    /// The all-zero identifier.
    fn nil() -> Self {
        Self::new(Uuid::nil())
    }
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident => $entity:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl EntityIdType for $name {
            const ENTITY_TYPE: EntityType = EntityType::$entity;

            fn new(id: Uuid) -> Self {
                Self(id)
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

define_entity_id!(
    /// Row identifier of a [`Format`](crate::Format).
    FormatId => Format
);
define_entity_id!(
    /// Row identifier of a [`Container`](crate::Container).
    ContainerId => Container
);
define_entity_id!(
    /// Row identifier of a [`Position`](crate::Position).
    PositionId => Position
);
define_entity_id!(
    /// Row identifier of a [`Plan`](crate::Plan).
    PlanId => Plan
);
define_entity_id!(
    /// Row identifier of a [`Transfer`](crate::Transfer).
    TransferId => Transfer
);

/// Generate a new actor identifier.
pub fn new_actor_id() -> ActorId {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let first = PlanId::now_v7();
        let second = PlanId::now_v7();
        assert_ne!(first, second);
    }

    #[test]
    fn test_id_display_matches_uuid() {
        let uuid = Uuid::now_v7();
        let id = ContainerId::new(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
        assert_eq!(Uuid::from(id), uuid);
        assert_eq!(ContainerId::ENTITY_TYPE, EntityType::Container);
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = PositionId::nil();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }
}
