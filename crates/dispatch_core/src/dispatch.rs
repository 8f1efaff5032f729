//! Dispatch orchestrator: the ride request state machine.
//!
//! ```text
//! WAITING --offer--> PENDING_ACCEPTANCE --accept--> ASSIGNED --dropoff--> COMPLETED
//!    ^                      |
//!    +------reject----------+ (re-offered at once; FAILED once the budget is spent)
//! ```
//!
//! Every operation validates first and mutates second, so an `Err` leaves the
//! store exactly as it was. Dropoff completion lives in the tick systems.

use serde::Serialize;
use tracing::{debug, info};

use crate::ecs::{
    Driver, DriverDuty, DriverId, RideId, RideRequest, RideStatus, Rider, RiderId,
};
use crate::error::{DispatchError, DispatchResult, EntityKind};
use crate::geometry::{distance, Location};
use crate::matching::{CandidateDriver, MatchingAlgorithm};
use crate::store::EntityStore;
use crate::telemetry::FailedRideRecord;

/// Result of one attempt to place a ride with a driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The ride now awaits this driver's answer.
    Offered { driver: DriverId, score: f64 },
    /// Nobody is eligible right now; the ride stays WAITING.
    NoCandidate,
    /// The rejection budget is spent; the ride is terminal.
    Failed,
}

fn check_bounds<S: EntityStore>(store: &S, location: Location) -> DispatchResult<()> {
    if store.config().bounds().contains(location) {
        Ok(())
    } else {
        Err(DispatchError::OutOfBounds(location))
    }
}

pub fn create_driver<S: EntityStore>(
    store: &mut S,
    name: impl Into<String>,
    location: Location,
) -> DispatchResult<DriverId> {
    check_bounds(store, location)?;
    let id = store.spawn_driver(Driver::new(name), location);
    debug!(driver = %id, %location, "driver created");
    Ok(id)
}

/// Remove a driver that holds neither an offer nor a trip.
pub fn remove_driver<S: EntityStore>(store: &mut S, id: DriverId) -> DispatchResult<()> {
    let driver = store
        .driver(id)
        .ok_or(DispatchError::not_found(EntityKind::Driver, id.to_bits()))?;
    if driver.current_ride_id().is_some() {
        return Err(DispatchError::in_use(EntityKind::Driver, id.to_bits()));
    }
    store.despawn_driver(id);
    debug!(driver = %id, "driver removed");
    Ok(())
}

pub fn create_rider<S: EntityStore>(
    store: &mut S,
    name: impl Into<String>,
    pickup: Location,
    dropoff: Location,
) -> DispatchResult<RiderId> {
    check_bounds(store, pickup)?;
    check_bounds(store, dropoff)?;
    let id = store.spawn_rider(Rider {
        name: name.into(),
        pickup,
        dropoff,
    });
    debug!(rider = %id, %pickup, %dropoff, "rider created");
    Ok(id)
}

/// The rider's non-terminal ride request, if any.
pub fn active_ride_of<S: EntityStore>(store: &S, rider: RiderId) -> Option<RideId> {
    store.ride_ids().into_iter().find(|id| {
        store
            .ride(*id)
            .is_some_and(|ride| ride.rider == rider && !ride.status.is_terminal())
    })
}

pub fn remove_rider<S: EntityStore>(store: &mut S, id: RiderId) -> DispatchResult<()> {
    if store.rider(id).is_none() {
        return Err(DispatchError::not_found(EntityKind::Rider, id.to_bits()));
    }
    if active_ride_of(store, id).is_some() {
        return Err(DispatchError::in_use(EntityKind::Rider, id.to_bits()));
    }
    store.despawn_rider(id);
    debug!(rider = %id, "rider removed");
    Ok(())
}

/// Take a driver off duty. Drivers bound to an offer or a trip must finish it first.
pub fn set_driver_offline<S: EntityStore>(store: &mut S, id: DriverId) -> DispatchResult<()> {
    let driver = store
        .driver_mut(id)
        .ok_or(DispatchError::not_found(EntityKind::Driver, id.to_bits()))?;
    if driver.current_ride_id().is_some() {
        return Err(DispatchError::in_use(EntityKind::Driver, id.to_bits()));
    }
    driver.duty = DriverDuty::Offline;
    Ok(())
}

pub fn set_driver_online<S: EntityStore>(store: &mut S, id: DriverId) -> DispatchResult<()> {
    let driver = store
        .driver_mut(id)
        .ok_or(DispatchError::not_found(EntityKind::Driver, id.to_bits()))?;
    if driver.duty == DriverDuty::Offline {
        driver.duty = DriverDuty::Available { offer: None };
    }
    Ok(())
}

/// Available drivers with no outstanding offer that have not declined `ride`.
pub fn eligible_candidates<S: EntityStore>(
    store: &S,
    ride: &RideRequest,
) -> Vec<CandidateDriver> {
    store
        .driver_ids()
        .into_iter()
        .filter(|id| !ride.has_rejected(*id))
        .filter_map(|id| {
            let driver = store.driver(id)?;
            if !driver.can_receive_offer() {
                return None;
            }
            let location = store.driver_location(id)?;
            Some(CandidateDriver {
                driver: id,
                eta: distance(location, ride.pickup),
                recent_rides: driver.recent_rides_count(),
                idle_minutes: driver.idle_time_minutes,
            })
        })
        .collect()
}

/// Score the eligible drivers for a WAITING ride and offer it to the best one.
fn offer_next<S: EntityStore>(
    store: &mut S,
    matcher: &dyn MatchingAlgorithm,
    ride_id: RideId,
) -> DispatchOutcome {
    let best = match store.ride(ride_id) {
        Some(ride) => matcher.find_match(&eligible_candidates(store, ride)),
        None => None,
    };

    let Some(best) = best else {
        store.telemetry_mut().no_candidate_attempts += 1;
        debug!(ride = %ride_id, "no eligible driver, ride stays waiting");
        return DispatchOutcome::NoCandidate;
    };

    if let Some(ride) = store.ride_mut(ride_id) {
        ride.status = RideStatus::PendingAcceptance {
            driver: best.driver,
        };
    }
    if let Some(driver) = store.driver_mut(best.driver) {
        driver.duty = DriverDuty::Available {
            offer: Some(ride_id),
        };
    }
    store.telemetry_mut().offers_made += 1;
    debug!(
        ride = %ride_id,
        driver = %best.driver,
        score = best.score,
        eta = best.eta,
        "ride offered"
    );
    DispatchOutcome::Offered {
        driver: best.driver,
        score: best.score,
    }
}

/// Create a ride request for `rider` and try to offer it straight away.
pub fn request_ride<S: EntityStore>(
    store: &mut S,
    matcher: &dyn MatchingAlgorithm,
    rider_id: RiderId,
) -> DispatchResult<(RideId, DispatchOutcome)> {
    let rider = store
        .rider(rider_id)
        .ok_or(DispatchError::not_found(EntityKind::Rider, rider_id.to_bits()))?;
    let (pickup, dropoff) = (rider.pickup, rider.dropoff);
    if active_ride_of(store, rider_id).is_some() {
        return Err(DispatchError::RideInProgress(rider_id));
    }

    let now = store.now();
    let ride_id = store.spawn_ride(RideRequest::new(rider_id, pickup, dropoff, now));
    debug!(ride = %ride_id, rider = %rider_id, "ride requested");
    let outcome = offer_next(store, matcher, ride_id);
    Ok((ride_id, outcome))
}

/// Load a ride that is awaiting `driver_id`'s answer, or explain why it is not.
fn pending_offer<S: EntityStore>(
    store: &S,
    ride_id: RideId,
    driver_id: DriverId,
) -> DispatchResult<&RideRequest> {
    let ride = store
        .ride(ride_id)
        .ok_or(DispatchError::not_found(EntityKind::Ride, ride_id.to_bits()))?;
    if store.driver(driver_id).is_none() {
        return Err(DispatchError::not_found(
            EntityKind::Driver,
            driver_id.to_bits(),
        ));
    }
    match ride.status {
        RideStatus::PendingAcceptance { driver } if driver == driver_id => Ok(ride),
        RideStatus::PendingAcceptance { .. } => Err(DispatchError::invalid(
            ride_id,
            ride.status.state(),
            "ride is offered to a different driver",
        )),
        _ => Err(DispatchError::invalid(
            ride_id,
            ride.status.state(),
            "ride is not awaiting acceptance",
        )),
    }
}

/// The offered driver takes the ride and starts heading to pickup on the next tick.
pub fn accept_ride<S: EntityStore>(
    store: &mut S,
    ride_id: RideId,
    driver_id: DriverId,
) -> DispatchResult<()> {
    pending_offer(store, ride_id, driver_id)?;

    let now = store.now();
    if let Some(ride) = store.ride_mut(ride_id) {
        ride.status = RideStatus::Assigned { driver: driver_id };
        ride.timing.assigned_at = Some(now);
    }
    if let Some(driver) = store.driver_mut(driver_id) {
        driver.duty = DriverDuty::OnTrip { ride: ride_id };
        driver.idle_time_minutes = 0;
    }
    store.telemetry_mut().offers_accepted += 1;
    debug!(ride = %ride_id, driver = %driver_id, "ride accepted");
    Ok(())
}

/// The offered driver declines. The ride falls back to the next-best driver, stays
/// waiting if nobody is left, or fails once the rejection budget is exhausted.
pub fn reject_ride<S: EntityStore>(
    store: &mut S,
    matcher: &dyn MatchingAlgorithm,
    ride_id: RideId,
    driver_id: DriverId,
) -> DispatchResult<DispatchOutcome> {
    pending_offer(store, ride_id, driver_id)?;

    let max_rejections = store.config().max_rejections;
    let now = store.now();
    if let Some(driver) = store.driver_mut(driver_id) {
        driver.duty = DriverDuty::Available { offer: None };
    }
    store.telemetry_mut().offers_rejected += 1;

    let Some(ride) = store.ride_mut(ride_id) else {
        return Err(DispatchError::not_found(EntityKind::Ride, ride_id.to_bits()));
    };
    ride.rejected_by.push(driver_id);
    ride.status = RideStatus::Waiting;
    debug!(
        ride = %ride_id,
        driver = %driver_id,
        rejections = ride.rejection_count(),
        "ride rejected"
    );

    if ride.rejection_count() >= max_rejections {
        ride.status = RideStatus::Failed;
        ride.timing.finished_at = Some(now);
        let record = FailedRideRecord {
            ride: ride_id,
            rider: ride.rider,
            failed_at: now,
            rejected_by: ride.rejected_by.clone(),
        };
        info!(ride = %ride_id, rejections = record.rejected_by.len(), "ride failed");
        store.telemetry_mut().failed_rides.push(record);
        return Ok(DispatchOutcome::Failed);
    }

    Ok(offer_next(store, matcher, ride_id))
}

/// Try again to place a ride that was left WAITING for lack of drivers.
pub fn retry_ride<S: EntityStore>(
    store: &mut S,
    matcher: &dyn MatchingAlgorithm,
    ride_id: RideId,
) -> DispatchResult<DispatchOutcome> {
    let ride = store
        .ride(ride_id)
        .ok_or(DispatchError::not_found(EntityKind::Ride, ride_id.to_bits()))?;
    if ride.status != RideStatus::Waiting {
        return Err(DispatchError::invalid(
            ride_id,
            ride.status.state(),
            "only waiting rides can be retried",
        ));
    }
    Ok(offer_next(store, matcher, ride_id))
}

/// Retry every WAITING ride, oldest id first. Returns the rides that got an offer.
pub fn dispatch_waiting<S: EntityStore>(
    store: &mut S,
    matcher: &dyn MatchingAlgorithm,
) -> Vec<(RideId, DriverId)> {
    let waiting: Vec<RideId> = store
        .ride_ids()
        .into_iter()
        .filter(|id| {
            store
                .ride(*id)
                .is_some_and(|ride| ride.status == RideStatus::Waiting)
        })
        .collect();

    waiting
        .into_iter()
        .filter_map(|ride_id| match offer_next(store, matcher, ride_id) {
            DispatchOutcome::Offered { driver, .. } => Some((ride_id, driver)),
            _ => None,
        })
        .collect()
}
