use dispatch_core::config::DispatchConfig;
use dispatch_core::ecs::{DriverId, RideId, RiderId};
use dispatch_core::engine::DispatchEngine;
use dispatch_core::geometry::Location;
use dispatch_core::runner::TickReport;

/// Builder for engines pre-populated with named drivers and riders.
#[derive(Clone, Debug, Default)]
pub struct FixtureBuilder {
    config: DispatchConfig,
    drivers: Vec<Location>,
    riders: Vec<(Location, Location)>,
}

impl FixtureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn driver(mut self, x: i32, y: i32) -> Self {
        self.drivers.push(Location::new(x, y));
        self
    }

    pub fn rider(mut self, pickup: (i32, i32), dropoff: (i32, i32)) -> Self {
        self.riders.push((pickup.into(), dropoff.into()));
        self
    }

    pub fn build(self) -> Fixture {
        let mut engine = DispatchEngine::new(self.config).expect("fixture config");
        let drivers = self
            .drivers
            .into_iter()
            .enumerate()
            .map(|(i, at)| {
                engine
                    .create_driver(format!("driver-{i}"), at)
                    .expect("driver")
                    .id
            })
            .collect();
        let riders = self
            .riders
            .into_iter()
            .enumerate()
            .map(|(i, (pickup, dropoff))| {
                engine
                    .create_rider(format!("rider-{i}"), pickup, dropoff)
                    .expect("rider")
                    .id
            })
            .collect();
        Fixture {
            engine,
            drivers,
            riders,
        }
    }
}

/// Engine plus the ids created by [`FixtureBuilder`], in creation order.
pub struct Fixture {
    pub engine: DispatchEngine,
    pub drivers: Vec<DriverId>,
    pub riders: Vec<RiderId>,
}

impl Fixture {
    pub fn driver_at(&self, index: usize) -> Location {
        self.engine
            .driver(self.drivers[index])
            .expect("driver")
            .location
    }

    /// Request a ride for rider `index` and return it with the driver offered it.
    pub fn request(&mut self, index: usize) -> (RideId, Option<DriverId>) {
        let ride = self
            .engine
            .request_ride(self.riders[index])
            .expect("request");
        (ride.id, ride.offered_to_driver_id)
    }

    pub fn ticks(&mut self, count: u64) -> Vec<TickReport> {
        self.engine.run_ticks(count)
    }
}
