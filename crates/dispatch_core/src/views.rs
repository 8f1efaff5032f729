//! Read-only views of the store, shaped for callers and serialization.

use serde::{Deserialize, Serialize};

use crate::ecs::{DriverId, DriverStatus, RideId, RideState, RideStatus, RideTiming, RiderId};
use crate::geometry::{distance, Location};
use crate::store::EntityStore;
use crate::telemetry::DispatchCounts;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverView {
    pub id: DriverId,
    pub name: String,
    pub location: Location,
    pub status: DriverStatus,
    pub current_ride_id: Option<RideId>,
    pub completed_rides: u32,
    pub idle_time_minutes: u64,
    pub recent_rides_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderView {
    pub id: RiderId,
    pub name: String,
    pub pickup: Location,
    pub dropoff: Location,
    /// Where the rider is now: with the driver once aboard, at dropoff after a
    /// completed ride, otherwise at pickup.
    pub current_location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideView {
    pub id: RideId,
    pub rider_id: RiderId,
    pub pickup: Location,
    pub dropoff: Location,
    pub status: RideState,
    pub assigned_driver_id: Option<DriverId>,
    pub offered_to_driver_id: Option<DriverId>,
    pub rejected_by: Vec<DriverId>,
    pub rejection_count: u32,
    pub pickup_completed: bool,
    pub timing: RideTiming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripPhase {
    ToPickup,
    ToDropoff,
}

/// An ASSIGNED ride as seen from the road.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRideView {
    pub ride: RideView,
    pub driver_id: DriverId,
    pub driver_location: Location,
    pub rider_location: Location,
    pub phase: TripPhase,
    pub waypoint: Location,
    /// Grid units left until dropoff, through pickup if it is still ahead.
    pub remaining_distance: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSnapshot {
    pub tick: u64,
    pub drivers: Vec<DriverView>,
    pub riders: Vec<RiderView>,
    pub rides: Vec<RideView>,
    pub counts: DispatchCounts,
}

pub fn driver_view<S: EntityStore>(store: &S, id: DriverId) -> Option<DriverView> {
    let driver = store.driver(id)?;
    Some(DriverView {
        id,
        name: driver.name.clone(),
        location: store.driver_location(id)?,
        status: driver.status(),
        current_ride_id: driver.current_ride_id(),
        completed_rides: driver.completed_rides,
        idle_time_minutes: driver.idle_time_minutes,
        recent_rides_count: driver.recent_rides_count(),
    })
}

pub fn ride_view<S: EntityStore>(store: &S, id: RideId) -> Option<RideView> {
    let ride = store.ride(id)?;
    Some(RideView {
        id,
        rider_id: ride.rider,
        pickup: ride.pickup,
        dropoff: ride.dropoff,
        status: ride.status.state(),
        assigned_driver_id: ride.assigned_driver(),
        offered_to_driver_id: ride.offered_to(),
        rejected_by: ride.rejected_by.clone(),
        rejection_count: ride.rejection_count(),
        pickup_completed: ride.pickup_completed,
        timing: ride.timing,
    })
}

pub fn rider_view<S: EntityStore>(store: &S, id: RiderId) -> Option<RiderView> {
    let rider = store.rider(id)?;
    // The rider's most recent ride decides where they are.
    let latest = store
        .ride_ids()
        .into_iter()
        .rev()
        .find_map(|ride_id| store.ride(ride_id).filter(|ride| ride.rider == id));
    let current_location = match latest {
        Some(ride) => match ride.status {
            RideStatus::Assigned { driver } if ride.pickup_completed => {
                store.driver_location(driver).unwrap_or(ride.pickup)
            }
            RideStatus::Completed { .. } => ride.dropoff,
            _ => rider.pickup,
        },
        None => rider.pickup,
    };
    Some(RiderView {
        id,
        name: rider.name.clone(),
        pickup: rider.pickup,
        dropoff: rider.dropoff,
        current_location,
    })
}

pub fn active_rides<S: EntityStore>(store: &S) -> Vec<ActiveRideView> {
    store
        .ride_ids()
        .into_iter()
        .filter_map(|id| {
            let ride = store.ride(id)?;
            let RideStatus::Assigned { driver } = ride.status else {
                return None;
            };
            let driver_location = store.driver_location(driver)?;
            let (phase, rider_location, remaining_distance) = if ride.pickup_completed {
                (
                    TripPhase::ToDropoff,
                    driver_location,
                    distance(driver_location, ride.dropoff),
                )
            } else {
                (
                    TripPhase::ToPickup,
                    ride.pickup,
                    distance(driver_location, ride.pickup) + distance(ride.pickup, ride.dropoff),
                )
            };
            Some(ActiveRideView {
                ride: ride_view(store, id)?,
                driver_id: driver,
                driver_location,
                rider_location,
                phase,
                waypoint: ride.waypoint(),
                remaining_distance,
            })
        })
        .collect()
}

/// Rides currently offered to `driver` and awaiting its answer.
pub fn pending_offers<S: EntityStore>(store: &S, driver: DriverId) -> Vec<RideView> {
    store
        .ride_ids()
        .into_iter()
        .filter(|id| {
            store
                .ride(*id)
                .is_some_and(|ride| ride.offered_to() == Some(driver))
        })
        .filter_map(|id| ride_view(store, id))
        .collect()
}

pub fn snapshot<S: EntityStore>(store: &S) -> SystemSnapshot {
    let drivers: Vec<DriverView> = store
        .driver_ids()
        .into_iter()
        .filter_map(|id| driver_view(store, id))
        .collect();
    let riders = store
        .rider_ids()
        .into_iter()
        .filter_map(|id| rider_view(store, id))
        .collect();
    let rides: Vec<RideView> = store
        .ride_ids()
        .into_iter()
        .filter_map(|id| ride_view(store, id))
        .collect();

    let mut counts = DispatchCounts::default();
    drivers.iter().for_each(|d| counts.add_driver(d.status));
    rides.iter().for_each(|r| counts.add_ride(r.status));

    SystemSnapshot {
        tick: store.now(),
        drivers,
        riders,
        rides,
        counts,
    }
}
