use std::fmt;

use thiserror::Error;

use crate::ecs::{RideId, RideState, RiderId};
use crate::geometry::Location;

/// Kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Driver,
    Rider,
    Ride,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Driver => "driver",
            EntityKind::Rider => "rider",
            EntityKind::Ride => "ride request",
        };
        f.write_str(name)
    }
}

/// Errors returned by dispatch operations. A failed operation leaves state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("{0} {1} not found")]
    NotFound(EntityKind, u64),

    #[error("ride request {ride} is {status:?}: {reason}")]
    InvalidStateTransition {
        ride: RideId,
        status: RideState,
        reason: &'static str,
    },

    #[error("{0} {1} is part of an active ride")]
    EntityInUse(EntityKind, u64),

    #[error("location {0} is outside the grid")]
    OutOfBounds(Location),

    #[error("rider {0} already has a ride in progress")]
    RideInProgress(RiderId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl DispatchError {
    pub fn not_found(kind: EntityKind, bits: u64) -> Self {
        Self::NotFound(kind, bits)
    }

    pub fn in_use(kind: EntityKind, bits: u64) -> Self {
        Self::EntityInUse(kind, bits)
    }

    pub(crate) fn invalid(ride: RideId, status: RideState, reason: &'static str) -> Self {
        Self::InvalidStateTransition {
            ride,
            status,
            reason,
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
