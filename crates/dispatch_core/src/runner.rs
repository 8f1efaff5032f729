//! Tick runner: advances the clock and runs the tick schedule against the world.
//!
//! Clock progression happens here, outside systems. Each tick bumps
//! [`TickClock`], clears [`TickActivity`], runs the schedule once and turns the
//! collected activity into a [`TickReport`].

use bevy_ecs::prelude::{IntoSystemConfigs, Schedule, World};
use bevy_ecs::schedule::ExecutorKind;
use serde::Serialize;
use tracing::debug;

use crate::clock::TickClock;
use crate::ecs::RideId;
use crate::systems::{
    fairness_window::fairness_window_system, idle::idle_accrual_system,
    movement::movement_system, trip_completed::trip_completed_system,
    trip_started::trip_started_system, TickActivity,
};

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Tick counter after this tick.
    pub tick: u64,
    /// Drivers whose position changed this tick.
    pub drivers_moved: usize,
    pub pickups: Vec<RideId>,
    pub completions: Vec<RideId>,
}

/// Builds the tick schedule. Systems are chained: idle accrual runs before movement
/// so a driver freed by a completion does not also idle on the same tick, and the
/// phase checks see the positions written by movement.
pub fn tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            fairness_window_system,
            idle_accrual_system,
            movement_system,
            trip_started_system,
            trip_completed_system,
        )
            .chain(),
    );
    schedule
}

/// Advances simulated time by one tick.
pub fn run_tick(world: &mut World, schedule: &mut Schedule) -> TickReport {
    let tick = world.resource_mut::<TickClock>().advance();
    *world.resource_mut::<TickActivity>() = TickActivity::default();

    schedule.run(world);

    let activity = std::mem::take(&mut *world.resource_mut::<TickActivity>());
    debug!(
        tick,
        drivers_moved = activity.drivers_moved,
        pickups = activity.pickups.len(),
        completions = activity.completions.len(),
        "tick finished"
    );
    TickReport {
        tick,
        drivers_moved: activity.drivers_moved,
        pickups: activity.pickups,
        completions: activity.completions,
    }
}

/// Runs `count` ticks and returns their reports in order.
pub fn run_ticks(world: &mut World, schedule: &mut Schedule, count: u64) -> Vec<TickReport> {
    (0..count).map(|_| run_tick(world, schedule)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DispatchConfig;
    use crate::ecs::{Driver, Position};
    use crate::geometry::Location;
    use crate::store::new_dispatch_world;

    #[test]
    fn empty_tick_only_advances_clock() {
        let mut world = new_dispatch_world(DispatchConfig::default());
        let driver = world
            .spawn((Driver::new("idle"), Position(Location::new(5, 5))))
            .id();
        let mut schedule = tick_schedule();

        let reports = run_ticks(&mut world, &mut schedule, 3);

        assert_eq!(reports.last().map(|r| r.tick), Some(3));
        assert!(reports.iter().all(|r| r.drivers_moved == 0));
        assert_eq!(world.resource::<TickClock>().now(), 3);
        assert_eq!(
            world.get::<Position>(driver).expect("position").0,
            Location::new(5, 5)
        );
        assert_eq!(
            world.get::<Driver>(driver).expect("driver").idle_time_minutes,
            3
        );
    }
}
