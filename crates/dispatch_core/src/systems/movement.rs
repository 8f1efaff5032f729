//! Movement system: advances every ON_TRIP driver one grid unit per tick.
//!
//! The waypoint is the ride's pickup until the rider boards, then its dropoff.
//! Steps resolve the horizontal leg before the vertical one. Each driver reads only
//! its own ride, so iteration order never changes the outcome of a tick.

use bevy_ecs::prelude::{Entity, Query, ResMut};
use tracing::{trace, warn};

use crate::ecs::{Driver, DriverDuty, Position, RideRequest};
use crate::geometry::step_toward;

use super::TickActivity;

pub fn movement_system(
    mut activity: ResMut<TickActivity>,
    rides: Query<&RideRequest>,
    mut drivers: Query<(Entity, &Driver, &mut Position)>,
) {
    for (entity, driver, mut position) in drivers.iter_mut() {
        let DriverDuty::OnTrip { ride } = driver.duty else {
            continue;
        };
        let Ok(request) = rides.get(ride.entity()) else {
            warn!(driver = ?entity, %ride, "on-trip driver references a missing ride");
            continue;
        };

        let waypoint = request.waypoint();
        let next = step_toward(position.0, waypoint);
        if next == position.0 {
            // Already on the waypoint; pickup or completion picks it up this tick.
            continue;
        }
        trace!(driver = ?entity, from = %position.0, to = %next, %waypoint, "driver step");
        position.0 = next;
        activity.drivers_moved += 1;
    }
}
