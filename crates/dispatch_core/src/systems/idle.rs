use bevy_ecs::prelude::Query;

use crate::ecs::{Driver, DriverDuty};

/// Every available driver, with or without an outstanding offer, idles one more minute.
pub fn idle_accrual_system(mut drivers: Query<&mut Driver>) {
    for mut driver in drivers.iter_mut() {
        if matches!(driver.duty, DriverDuty::Available { .. }) {
            driver.idle_time_minutes += 1;
        }
    }
}
