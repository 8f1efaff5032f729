use bevy_ecs::prelude::{Entity, Query, Res, ResMut};
use tracing::info;

use crate::clock::TickClock;
use crate::ecs::{Driver, DriverDuty, DriverId, Position, RideRequest, RideStatus};
use crate::telemetry::{CompletedRideRecord, DispatchTelemetry};

use super::TickActivity;

/// Completes a ride on the same tick its driver reaches dropoff with the rider aboard.
///
/// The driver becomes available again, its completed-ride counter and fairness
/// window are updated and a [`CompletedRideRecord`] is appended to telemetry.
pub fn trip_completed_system(
    clock: Res<TickClock>,
    mut telemetry: ResMut<DispatchTelemetry>,
    mut activity: ResMut<TickActivity>,
    mut drivers: Query<(Entity, &mut Driver, &Position)>,
    mut rides: Query<&mut RideRequest>,
) {
    let now = clock.now();
    for (entity, mut driver, position) in drivers.iter_mut() {
        let DriverDuty::OnTrip { ride } = driver.duty else {
            continue;
        };
        let Ok(mut request) = rides.get_mut(ride.entity()) else {
            continue;
        };
        if !request.pickup_completed || position.0 != request.dropoff {
            continue;
        }

        let driver_id = DriverId(entity);
        request.status = RideStatus::Completed { driver: driver_id };
        request.timing.finished_at = Some(now);

        driver.duty = DriverDuty::Available { offer: None };
        driver.completed_rides += 1;
        driver.recent_rides.record(now);

        telemetry.completed_rides.push(CompletedRideRecord {
            ride,
            rider: request.rider,
            driver: driver_id,
            requested_at: request.timing.requested_at,
            assigned_at: request.timing.assigned_at.unwrap_or(request.timing.requested_at),
            picked_up_at: request.timing.picked_up_at.unwrap_or(now),
            completed_at: now,
            rejections: request.rejection_count(),
        });
        activity.completions.push(ride);
        info!(%ride, driver = %driver_id, tick = now, "ride completed");
    }
}
