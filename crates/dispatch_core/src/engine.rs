//! Dispatch engine: owns the world, the tick schedule and the matcher, and exposes
//! the operations callers use. Results come back as views.

use std::sync::{Arc, Mutex};

use bevy_ecs::prelude::{Schedule, World};

use crate::config::DispatchConfig;
use crate::dispatch::{self, DispatchOutcome};
use crate::ecs::{DriverId, RideId, RiderId};
use crate::error::{DispatchError, DispatchResult, EntityKind};
use crate::geometry::Location;
use crate::matching::{MatchingAlgorithm, WeightedMatching};
use crate::runner::{run_tick, tick_schedule, TickReport};
use crate::store::{new_dispatch_world, EntityStore};
use crate::telemetry::DispatchTelemetry;
use crate::views::{self, ActiveRideView, DriverView, RideView, RiderView, SystemSnapshot};

/// Engine shared between threads; lock once per logical operation.
pub type SharedDispatchEngine = Arc<Mutex<DispatchEngine>>;

pub struct DispatchEngine {
    world: World,
    schedule: Schedule,
    matcher: Box<dyn MatchingAlgorithm>,
}

impl Default for DispatchEngine {
    fn default() -> Self {
        let config = DispatchConfig::default();
        Self::build(config, Box::new(WeightedMatching::new(config.weights)))
    }
}

impl DispatchEngine {
    /// Engine with weighted matching built from `config.weights`. Fails with
    /// `InvalidConfig` when the configuration does not validate.
    pub fn new(config: DispatchConfig) -> DispatchResult<Self> {
        Self::with_matcher(config, Box::new(WeightedMatching::new(config.weights)))
    }

    pub fn with_matcher(
        config: DispatchConfig,
        matcher: Box<dyn MatchingAlgorithm>,
    ) -> DispatchResult<Self> {
        config.validate()?;
        Ok(Self::build(config, matcher))
    }

    fn build(config: DispatchConfig, matcher: Box<dyn MatchingAlgorithm>) -> Self {
        Self {
            world: new_dispatch_world(config),
            schedule: tick_schedule(),
            matcher,
        }
    }

    pub fn into_shared(self) -> SharedDispatchEngine {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> DispatchConfig {
        self.world.config()
    }

    /// Current tick.
    pub fn now(&self) -> u64 {
        self.world.now()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn create_driver(
        &mut self,
        name: impl Into<String>,
        location: Location,
    ) -> DispatchResult<DriverView> {
        let id = dispatch::create_driver(&mut self.world, name, location)?;
        self.driver(id)
    }

    pub fn remove_driver(&mut self, id: DriverId) -> DispatchResult<()> {
        dispatch::remove_driver(&mut self.world, id)
    }

    pub fn create_rider(
        &mut self,
        name: impl Into<String>,
        pickup: Location,
        dropoff: Location,
    ) -> DispatchResult<RiderView> {
        let id = dispatch::create_rider(&mut self.world, name, pickup, dropoff)?;
        self.rider(id)
    }

    pub fn remove_rider(&mut self, id: RiderId) -> DispatchResult<()> {
        dispatch::remove_rider(&mut self.world, id)
    }

    pub fn set_driver_offline(&mut self, id: DriverId) -> DispatchResult<DriverView> {
        dispatch::set_driver_offline(&mut self.world, id)?;
        self.driver(id)
    }

    pub fn set_driver_online(&mut self, id: DriverId) -> DispatchResult<DriverView> {
        dispatch::set_driver_online(&mut self.world, id)?;
        self.driver(id)
    }

    /// Create a ride for `rider` and offer it to the best-scoring driver. A request
    /// nobody can take comes back WAITING.
    pub fn request_ride(&mut self, rider: RiderId) -> DispatchResult<RideView> {
        let (ride, _) = self.request_ride_with_outcome(rider)?;
        self.ride(ride)
    }

    pub fn request_ride_with_outcome(
        &mut self,
        rider: RiderId,
    ) -> DispatchResult<(RideId, DispatchOutcome)> {
        dispatch::request_ride(&mut self.world, self.matcher.as_ref(), rider)
    }

    pub fn accept_ride(&mut self, ride: RideId, driver: DriverId) -> DispatchResult<RideView> {
        dispatch::accept_ride(&mut self.world, ride, driver)?;
        self.ride(ride)
    }

    pub fn reject_ride(&mut self, ride: RideId, driver: DriverId) -> DispatchResult<RideView> {
        dispatch::reject_ride(&mut self.world, self.matcher.as_ref(), ride, driver)?;
        self.ride(ride)
    }

    pub fn retry_ride(&mut self, ride: RideId) -> DispatchResult<RideView> {
        dispatch::retry_ride(&mut self.world, self.matcher.as_ref(), ride)?;
        self.ride(ride)
    }

    /// Offer every WAITING ride again. Returns the rides that found a driver.
    pub fn dispatch_waiting(&mut self) -> Vec<RideId> {
        dispatch::dispatch_waiting(&mut self.world, self.matcher.as_ref())
            .into_iter()
            .map(|(ride, _)| ride)
            .collect()
    }

    pub fn tick(&mut self) -> TickReport {
        run_tick(&mut self.world, &mut self.schedule)
    }

    pub fn run_ticks(&mut self, count: u64) -> Vec<TickReport> {
        (0..count).map(|_| self.tick()).collect()
    }

    pub fn snapshot(&self) -> SystemSnapshot {
        views::snapshot(&self.world)
    }

    pub fn active_rides(&self) -> Vec<ActiveRideView> {
        views::active_rides(&self.world)
    }

    pub fn pending_offers(&self, driver: DriverId) -> DispatchResult<Vec<RideView>> {
        if self.world.driver(driver).is_none() {
            return Err(DispatchError::not_found(
                EntityKind::Driver,
                driver.to_bits(),
            ));
        }
        Ok(views::pending_offers(&self.world, driver))
    }

    pub fn telemetry(&self) -> &DispatchTelemetry {
        self.world.resource::<DispatchTelemetry>()
    }

    pub fn driver(&self, id: DriverId) -> DispatchResult<DriverView> {
        views::driver_view(&self.world, id)
            .ok_or(DispatchError::not_found(EntityKind::Driver, id.to_bits()))
    }

    pub fn rider(&self, id: RiderId) -> DispatchResult<RiderView> {
        views::rider_view(&self.world, id)
            .ok_or(DispatchError::not_found(EntityKind::Rider, id.to_bits()))
    }

    pub fn ride(&self, id: RideId) -> DispatchResult<RideView> {
        views::ride_view(&self.world, id)
            .ok_or(DispatchError::not_found(EntityKind::Ride, id.to_bits()))
    }

    pub fn drivers(&self) -> Vec<DriverView> {
        self.world
            .driver_ids()
            .into_iter()
            .filter_map(|id| views::driver_view(&self.world, id))
            .collect()
    }

    pub fn rides(&self) -> Vec<RideView> {
        self.world
            .ride_ids()
            .into_iter()
            .filter_map(|id| views::ride_view(&self.world, id))
            .collect()
    }
}
