use bevy_ecs::prelude::{Query, Res};

use crate::clock::TickClock;
use crate::config::DispatchConfig;
use crate::ecs::Driver;

/// Forget completions that have slid out of the fairness window.
pub fn fairness_window_system(
    clock: Res<TickClock>,
    config: Option<Res<DispatchConfig>>,
    mut drivers: Query<&mut Driver>,
) {
    let window = config
        .as_deref()
        .copied()
        .unwrap_or_default()
        .fairness_window_ticks;
    let now = clock.now();
    for mut driver in drivers.iter_mut() {
        if driver.recent_rides.count() > 0 {
            driver.recent_rides.prune(now, window);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::ecs::RecentRides;

    #[test]
    fn old_completions_stop_counting() {
        let mut world = World::new();
        world.insert_resource(DispatchConfig::default().with_fairness_window_ticks(10));
        let mut clock = TickClock::default();
        for _ in 0..25 {
            clock.advance();
        }
        world.insert_resource(clock);
        let driver = world
            .spawn(Driver {
                recent_rides: RecentRides::from_ticks([5, 16, 20]),
                ..Driver::new("busy")
            })
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(fairness_window_system);
        schedule.run(&mut world);

        let driver = world.get::<Driver>(driver).expect("driver");
        assert_eq!(driver.recent_rides_count(), 2);
    }
}
