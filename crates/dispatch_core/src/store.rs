//! Entity store: the single authoritative registry of drivers, riders and rides.
//!
//! Dispatch logic talks to the store through [`EntityStore`]; the in-process
//! implementation is a `bevy_ecs::World`, which the tick schedule also runs against.

use bevy_ecs::prelude::World;

use crate::clock::TickClock;
use crate::config::DispatchConfig;
use crate::ecs::{Driver, DriverId, Position, RideId, RideRequest, Rider, RiderId};
use crate::geometry::Location;
use crate::systems::TickActivity;
use crate::telemetry::DispatchTelemetry;

pub trait EntityStore {
    fn config(&self) -> DispatchConfig;

    /// Current tick.
    fn now(&self) -> u64;

    fn spawn_driver(&mut self, driver: Driver, location: Location) -> DriverId;
    fn spawn_rider(&mut self, rider: Rider) -> RiderId;
    fn spawn_ride(&mut self, ride: RideRequest) -> RideId;

    fn driver(&self, id: DriverId) -> Option<&Driver>;
    fn driver_mut(&mut self, id: DriverId) -> Option<&mut Driver>;
    fn driver_location(&self, id: DriverId) -> Option<Location>;
    fn rider(&self, id: RiderId) -> Option<&Rider>;
    fn ride(&self, id: RideId) -> Option<&RideRequest>;
    fn ride_mut(&mut self, id: RideId) -> Option<&mut RideRequest>;

    /// Returns `false` when no such driver exists.
    fn despawn_driver(&mut self, id: DriverId) -> bool;
    /// Returns `false` when no such rider exists.
    fn despawn_rider(&mut self, id: RiderId) -> bool;

    /// All driver ids in ascending order.
    fn driver_ids(&self) -> Vec<DriverId>;
    /// All rider ids in ascending order.
    fn rider_ids(&self) -> Vec<RiderId>;
    /// All ride ids in ascending order.
    fn ride_ids(&self) -> Vec<RideId>;

    fn telemetry_mut(&mut self) -> &mut DispatchTelemetry;
}

/// Build a world holding every resource the dispatch engine and tick schedule read.
pub fn new_dispatch_world(config: DispatchConfig) -> World {
    let mut world = World::new();
    world.insert_resource(config);
    world.insert_resource(TickClock::default());
    world.insert_resource(DispatchTelemetry::default());
    world.insert_resource(TickActivity::default());
    world
}

impl EntityStore for World {
    fn config(&self) -> DispatchConfig {
        self.get_resource::<DispatchConfig>()
            .copied()
            .unwrap_or_default()
    }

    fn now(&self) -> u64 {
        self.get_resource::<TickClock>()
            .map(|clock| clock.now())
            .unwrap_or(0)
    }

    fn spawn_driver(&mut self, driver: Driver, location: Location) -> DriverId {
        DriverId(self.spawn((driver, Position(location))).id())
    }

    fn spawn_rider(&mut self, rider: Rider) -> RiderId {
        RiderId(self.spawn(rider).id())
    }

    fn spawn_ride(&mut self, ride: RideRequest) -> RideId {
        RideId(self.spawn(ride).id())
    }

    fn driver(&self, id: DriverId) -> Option<&Driver> {
        self.get::<Driver>(id.0)
    }

    fn driver_mut(&mut self, id: DriverId) -> Option<&mut Driver> {
        self.get_mut::<Driver>(id.0).map(|driver| driver.into_inner())
    }

    fn driver_location(&self, id: DriverId) -> Option<Location> {
        self.get::<Driver>(id.0)?;
        self.get::<Position>(id.0).map(|position| position.0)
    }

    fn rider(&self, id: RiderId) -> Option<&Rider> {
        self.get::<Rider>(id.0)
    }

    fn ride(&self, id: RideId) -> Option<&RideRequest> {
        self.get::<RideRequest>(id.0)
    }

    fn ride_mut(&mut self, id: RideId) -> Option<&mut RideRequest> {
        self.get_mut::<RideRequest>(id.0).map(|ride| ride.into_inner())
    }

    fn despawn_driver(&mut self, id: DriverId) -> bool {
        self.get::<Driver>(id.0).is_some() && self.despawn(id.0)
    }

    fn despawn_rider(&mut self, id: RiderId) -> bool {
        self.get::<Rider>(id.0).is_some() && self.despawn(id.0)
    }

    fn driver_ids(&self) -> Vec<DriverId> {
        let mut ids: Vec<DriverId> = self
            .iter_entities()
            .filter(|entity| entity.contains::<Driver>())
            .map(|entity| DriverId(entity.id()))
            .collect();
        ids.sort_unstable();
        ids
    }

    fn rider_ids(&self) -> Vec<RiderId> {
        let mut ids: Vec<RiderId> = self
            .iter_entities()
            .filter(|entity| entity.contains::<Rider>())
            .map(|entity| RiderId(entity.id()))
            .collect();
        ids.sort_unstable();
        ids
    }

    fn ride_ids(&self) -> Vec<RideId> {
        let mut ids: Vec<RideId> = self
            .iter_entities()
            .filter(|entity| entity.contains::<RideRequest>())
            .map(|entity| RideId(entity.id()))
            .collect();
        ids.sort_unstable();
        ids
    }

    fn telemetry_mut(&mut self) -> &mut DispatchTelemetry {
        self.resource_mut::<DispatchTelemetry>().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kinds_do_not_alias() {
        let mut world = new_dispatch_world(DispatchConfig::default());
        let driver = world.spawn_driver(Driver::new("Ada"), Location::new(1, 2));
        let rider = world.spawn_rider(Rider {
            name: "Bo".into(),
            pickup: Location::new(0, 0),
            dropoff: Location::new(5, 5),
        });

        assert!(world.driver(driver).is_some());
        assert_eq!(world.driver_location(driver), Some(Location::new(1, 2)));
        assert!(world.rider(RiderId(driver.0)).is_none());
        assert!(world.driver(DriverId(rider.0)).is_none());
        assert!(!world.despawn_driver(DriverId(rider.0)));
        assert!(world.rider(rider).is_some());
    }

    #[test]
    fn listings_are_sorted_and_skip_despawned() {
        let mut world = new_dispatch_world(DispatchConfig::default());
        let first = world.spawn_driver(Driver::new("a"), Location::new(0, 0));
        let second = world.spawn_driver(Driver::new("b"), Location::new(0, 0));
        let third = world.spawn_driver(Driver::new("c"), Location::new(0, 0));
        assert!(world.despawn_driver(second));

        assert_eq!(world.driver_ids(), vec![first, third]);
        assert!(world.driver(second).is_none());
    }

    #[test]
    fn resources_are_initialized() {
        let config = DispatchConfig::default().with_max_rejections(5);
        let world = new_dispatch_world(config);
        assert_eq!(world.config(), config);
        assert_eq!(world.now(), 0);
    }
}
