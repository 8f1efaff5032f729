//! Test helpers shared by unit tests, integration tests and benches.

use crate::config::DispatchConfig;
use crate::ecs::{DriverId, RideId, RiderId};
use crate::engine::DispatchEngine;
use crate::geometry::Location;
use crate::matching::CandidateDriver;

/// Pickup used by the reference scenarios.
pub const TEST_PICKUP: Location = Location::new(10, 10);
/// Dropoff used by the reference scenarios.
pub const TEST_DROPOFF: Location = Location::new(50, 50);

/// Engine with the default configuration.
pub fn create_test_engine() -> DispatchEngine {
    create_test_engine_with(DispatchConfig::default())
}

/// Engine with `config`.
///
/// # Panics
///
/// Panics if `config` does not validate.
pub fn create_test_engine_with(config: DispatchConfig) -> DispatchEngine {
    DispatchEngine::new(config).expect("test config should validate")
}

/// One rider at [`TEST_PICKUP`] heading to [`TEST_DROPOFF`], plus one driver per
/// location in `drivers`, created in order.
///
/// # Panics
///
/// Panics if any location is outside the default grid.
pub fn engine_with_drivers(drivers: &[Location]) -> (DispatchEngine, Vec<DriverId>, RiderId) {
    let mut engine = create_test_engine();
    let ids = drivers
        .iter()
        .enumerate()
        .map(|(i, location)| {
            engine
                .create_driver(format!("driver-{i}"), *location)
                .expect("driver location should be on the grid")
                .id
        })
        .collect();
    let rider = engine
        .create_rider("rider", TEST_PICKUP, TEST_DROPOFF)
        .expect("test rider should be on the grid")
        .id;
    (engine, ids, rider)
}

/// Request a ride for `rider` and have whoever is offered it accept.
///
/// # Panics
///
/// Panics if the request fails or nobody is offered the ride.
pub fn request_and_accept(engine: &mut DispatchEngine, rider: RiderId) -> (RideId, DriverId) {
    let ride = engine.request_ride(rider).expect("request should succeed");
    let driver = ride
        .offered_to_driver_id
        .expect("some driver should be offered the ride");
    engine
        .accept_ride(ride.id, driver)
        .expect("offered driver should be able to accept");
    (ride.id, driver)
}

/// Candidate list with ids drawn from raw entity indices starting at 1.
pub fn candidates(specs: &[(u32, u32, u64)]) -> Vec<CandidateDriver> {
    specs
        .iter()
        .enumerate()
        .map(|(i, &(eta, recent_rides, idle_minutes))| CandidateDriver {
            driver: DriverId(bevy_ecs::entity::Entity::from_raw(i as u32 + 1)),
            eta,
            recent_rides,
            idle_minutes,
        })
        .collect()
}
