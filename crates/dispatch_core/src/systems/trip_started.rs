use bevy_ecs::prelude::{Query, Res, ResMut};
use tracing::debug;

use crate::clock::TickClock;
use crate::ecs::{Driver, DriverDuty, Position, RideRequest};

use super::TickActivity;

/// Marks the rider as boarded once the assigned driver stands on the pickup location.
///
/// Runs after movement in the same tick. The rider's displayed position follows
/// the driver from here on; no rider component changes.
pub fn trip_started_system(
    clock: Res<TickClock>,
    mut activity: ResMut<TickActivity>,
    drivers: Query<(&Driver, &Position)>,
    mut rides: Query<&mut RideRequest>,
) {
    for (driver, position) in drivers.iter() {
        let DriverDuty::OnTrip { ride } = driver.duty else {
            continue;
        };
        let Ok(mut request) = rides.get_mut(ride.entity()) else {
            continue;
        };
        if request.pickup_completed || position.0 != request.pickup {
            continue;
        }

        request.pickup_completed = true;
        request.timing.picked_up_at = Some(clock.now());
        activity.pickups.push(ride);
        debug!(%ride, driver = %driver.name, tick = clock.now(), "rider picked up");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::ecs::{RideId, RiderId};
    use crate::geometry::Location;

    #[test]
    fn pickup_flag_flips_once_on_arrival() {
        let mut world = World::new();
        world.insert_resource(TickClock::default());
        world.insert_resource(TickActivity::default());
        let rider = RiderId(world.spawn_empty().id());
        let pickup = Location::new(4, 4);
        let ride = RideId(
            world
                .spawn(RideRequest::new(rider, pickup, Location::new(9, 9), 0))
                .id(),
        );
        world.spawn((
            Driver {
                duty: DriverDuty::OnTrip { ride },
                ..Driver::new("arriving")
            },
            Position(pickup),
        ));

        let mut schedule = Schedule::default();
        schedule.add_systems(trip_started_system);
        schedule.run(&mut world);
        schedule.run(&mut world);

        let request = world.get::<RideRequest>(ride.entity()).expect("ride");
        assert!(request.pickup_completed);
        assert_eq!(request.timing.picked_up_at, Some(0));
        assert_eq!(world.resource::<TickActivity>().pickups, vec![ride]);
    }
}
