//! Components stored in the dispatch world: drivers, riders and ride requests.
//!
//! Status fields are closed enums carrying the entity they refer to, so a ride can
//! only be `Assigned` together with its driver and a driver can only be `OnTrip`
//! together with its ride. The flat identifiers the boundary needs
//! (`current_ride_id`, `assigned_driver_id`, ...) are derived from them on read.

use std::collections::VecDeque;
use std::fmt;

use bevy_ecs::prelude::{Component, Entity};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::geometry::Location;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub Entity);

        impl $name {
            pub fn entity(self) -> Entity {
                self.0
            }

            pub fn to_bits(self) -> u64 {
                self.0.to_bits()
            }

            pub fn try_from_bits(bits: u64) -> Option<Self> {
                Entity::try_from_bits(bits).ok().map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.to_bits())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_u64(self.to_bits())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let bits = u64::deserialize(deserializer)?;
                Self::try_from_bits(bits)
                    .ok_or_else(|| D::Error::custom(format!("invalid identifier {bits}")))
            }
        }
    };
}

entity_id!(
    /// Identifier of a driver entity.
    DriverId
);
entity_id!(
    /// Identifier of a rider entity.
    RiderId
);
entity_id!(
    /// Identifier of a ride request entity.
    RideId
);

/// Coarse driver status exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    Available,
    OnTrip,
    Offline,
}

/// What a driver is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverDuty {
    /// Free for work; `offer` is set while a ride offer awaits this driver's answer.
    Available {
        offer: Option<RideId>,
    },
    OnTrip { ride: RideId },
    Offline,
}

/// Completion ticks of the rides a driver finished inside the fairness window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentRides {
    completed_at: VecDeque<u64>,
}

impl RecentRides {
    pub fn from_ticks(ticks: impl IntoIterator<Item = u64>) -> Self {
        let mut completed_at: Vec<u64> = ticks.into_iter().collect();
        completed_at.sort_unstable();
        Self {
            completed_at: completed_at.into(),
        }
    }

    pub fn record(&mut self, tick: u64) {
        self.completed_at.push_back(tick);
    }

    /// Drop completions older than `window` ticks before `now`.
    pub fn prune(&mut self, now: u64, window: u64) {
        let oldest_kept = now.saturating_sub(window);
        while self
            .completed_at
            .front()
            .is_some_and(|tick| *tick < oldest_kept)
        {
            self.completed_at.pop_front();
        }
    }

    pub fn count(&self) -> u32 {
        self.completed_at.len() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Component)]
pub struct Driver {
    pub name: String,
    pub duty: DriverDuty,
    pub completed_rides: u32,
    /// Ticks spent available since the last accepted ride.
    pub idle_time_minutes: u64,
    pub recent_rides: RecentRides,
}

impl Driver {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            duty: DriverDuty::Available { offer: None },
            completed_rides: 0,
            idle_time_minutes: 0,
            recent_rides: RecentRides::default(),
        }
    }

    pub fn status(&self) -> DriverStatus {
        match self.duty {
            DriverDuty::Available { .. } => DriverStatus::Available,
            DriverDuty::OnTrip { .. } => DriverStatus::OnTrip,
            DriverDuty::Offline => DriverStatus::Offline,
        }
    }

    /// The ride this driver is bound to: an outstanding offer or the active trip.
    pub fn current_ride_id(&self) -> Option<RideId> {
        match self.duty {
            DriverDuty::Available { offer } => offer,
            DriverDuty::OnTrip { ride } => Some(ride),
            DriverDuty::Offline => None,
        }
    }

    pub fn pending_offer(&self) -> Option<RideId> {
        match self.duty {
            DriverDuty::Available { offer } => offer,
            _ => None,
        }
    }

    /// Available and not already holding an offer.
    pub fn can_receive_offer(&self) -> bool {
        matches!(self.duty, DriverDuty::Available { offer: None })
    }

    pub fn recent_rides_count(&self) -> u32 {
        self.recent_rides.count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Component)]
pub struct Position(pub Location);

#[derive(Debug, Clone, PartialEq, Eq, Component)]
pub struct Rider {
    pub name: String,
    pub pickup: Location,
    pub dropoff: Location,
}

/// Flat ride status exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideState {
    Waiting,
    PendingAcceptance,
    Assigned,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideStatus {
    Waiting,
    PendingAcceptance { driver: DriverId },
    Assigned { driver: DriverId },
    /// Terminal; keeps the driver that carried the ride for history.
    Completed { driver: DriverId },
    /// Terminal; the rejection budget ran out.
    Failed,
}

impl RideStatus {
    pub fn state(&self) -> RideState {
        match self {
            RideStatus::Waiting => RideState::Waiting,
            RideStatus::PendingAcceptance { .. } => RideState::PendingAcceptance,
            RideStatus::Assigned { .. } => RideState::Assigned,
            RideStatus::Completed { .. } => RideState::Completed,
            RideStatus::Failed => RideState::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RideStatus::Completed { .. } | RideStatus::Failed)
    }
}

/// Tick at which each milestone of a ride happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideTiming {
    pub requested_at: u64,
    pub assigned_at: Option<u64>,
    /// Set when the driver reaches pickup.
    pub picked_up_at: Option<u64>,
    /// Set on completion or failure.
    pub finished_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Component)]
pub struct RideRequest {
    pub rider: RiderId,
    pub pickup: Location,
    pub dropoff: Location,
    pub status: RideStatus,
    /// Drivers that declined this request, in rejection order. Never shrinks.
    pub rejected_by: Vec<DriverId>,
    pub pickup_completed: bool,
    pub timing: RideTiming,
}

impl RideRequest {
    pub fn new(rider: RiderId, pickup: Location, dropoff: Location, requested_at: u64) -> Self {
        Self {
            rider,
            pickup,
            dropoff,
            status: RideStatus::Waiting,
            rejected_by: Vec::new(),
            pickup_completed: false,
            timing: RideTiming {
                requested_at,
                ..Default::default()
            },
        }
    }

    pub fn offered_to(&self) -> Option<DriverId> {
        match self.status {
            RideStatus::PendingAcceptance { driver } => Some(driver),
            _ => None,
        }
    }

    pub fn assigned_driver(&self) -> Option<DriverId> {
        match self.status {
            RideStatus::Assigned { driver } | RideStatus::Completed { driver } => Some(driver),
            _ => None,
        }
    }

    pub fn rejection_count(&self) -> u32 {
        self.rejected_by.len() as u32
    }

    pub fn has_rejected(&self, driver: DriverId) -> bool {
        self.rejected_by.contains(&driver)
    }

    /// Where the assigned driver is heading: pickup first, then dropoff.
    pub fn waypoint(&self) -> Location {
        if self.pickup_completed {
            self.dropoff
        } else {
            self.pickup
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ride_id(raw: u32) -> RideId {
        RideId(Entity::from_raw(raw))
    }

    #[test]
    fn driver_duty_drives_status_and_current_ride() {
        let mut driver = Driver::new("Ada");
        assert_eq!(driver.status(), DriverStatus::Available);
        assert!(driver.can_receive_offer());
        assert_eq!(driver.current_ride_id(), None);

        driver.duty = DriverDuty::Available {
            offer: Some(ride_id(7)),
        };
        assert_eq!(driver.status(), DriverStatus::Available);
        assert!(!driver.can_receive_offer());
        assert_eq!(driver.current_ride_id(), Some(ride_id(7)));

        driver.duty = DriverDuty::OnTrip { ride: ride_id(7) };
        assert_eq!(driver.status(), DriverStatus::OnTrip);
        assert_eq!(driver.pending_offer(), None);
        assert_eq!(driver.current_ride_id(), Some(ride_id(7)));
    }

    #[test]
    fn recent_rides_prune_outside_window() {
        let mut recent = RecentRides::from_ticks([3, 10, 50]);
        recent.prune(60, 50);
        assert_eq!(recent.count(), 2);
        recent.prune(101, 50);
        assert_eq!(recent.count(), 0);
    }

    #[test]
    fn waypoint_switches_after_pickup() {
        let rider = RiderId(Entity::from_raw(1));
        let mut ride = RideRequest::new(rider, Location::new(1, 1), Location::new(9, 9), 0);
        assert_eq!(ride.waypoint(), Location::new(1, 1));
        ride.pickup_completed = true;
        assert_eq!(ride.waypoint(), Location::new(9, 9));
    }

    #[test]
    fn identifiers_serialize_as_entity_bits() {
        let id = DriverId(Entity::from_raw(42));
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, id.to_bits().to_string());
        let back: DriverId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }
}
