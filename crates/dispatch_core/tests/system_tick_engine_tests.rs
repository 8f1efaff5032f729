mod support;

use dispatch_core::ecs::DriverStatus;
use dispatch_core::geometry::{distance, step_toward, Location};
use proptest::prelude::*;
use support::fixture::FixtureBuilder;

#[test]
fn driver_resolves_horizontal_leg_before_vertical() {
    let mut fx = FixtureBuilder::new()
        .driver(20, 20)
        .rider((10, 10), (10, 30))
        .build();
    let (ride, offered) = fx.request(0);
    fx.engine
        .accept_ride(ride, offered.expect("offer"))
        .expect("accept");

    let mut path = Vec::new();
    for _ in 0..20 {
        fx.ticks(1);
        path.push(fx.driver_at(0));
    }
    let expected: Vec<Location> = (10..20)
        .rev()
        .map(|x| Location::new(x, 20))
        .chain((10..20).rev().map(|y| Location::new(10, y)))
        .collect();
    assert_eq!(path, expected);
}

#[test]
fn ticking_an_idle_world_only_accrues_idle_time() {
    let mut fx = FixtureBuilder::new()
        .driver(3, 4)
        .driver(90, 1)
        .rider((5, 5), (6, 6))
        .build();
    let before = fx.engine.snapshot();
    let reports = fx.ticks(7);

    assert!(reports
        .iter()
        .all(|r| r.drivers_moved == 0 && r.pickups.is_empty() && r.completions.is_empty()));
    let after = fx.engine.snapshot();
    assert_eq!(after.tick, before.tick + 7);
    assert_eq!(after.rides, before.rides);
    assert_eq!(after.riders, before.riders);
    for (b, a) in before.drivers.iter().zip(&after.drivers) {
        assert_eq!(a.location, b.location);
        assert_eq!(a.status, DriverStatus::Available);
        assert_eq!(a.idle_time_minutes, b.idle_time_minutes + 7);
    }
}

#[test]
fn freed_driver_does_not_idle_on_its_completion_tick() {
    let mut fx = FixtureBuilder::new()
        .driver(1, 0)
        .rider((0, 0), (0, 1))
        .build();
    let (ride, offered) = fx.request(0);
    fx.engine
        .accept_ride(ride, offered.expect("offer"))
        .expect("accept");

    let reports = fx.ticks(2);
    assert_eq!(reports[1].completions, vec![ride]);
    assert_eq!(
        fx.engine.driver(fx.drivers[0]).expect("driver").idle_time_minutes,
        0
    );
    fx.ticks(1);
    assert_eq!(
        fx.engine.driver(fx.drivers[0]).expect("driver").idle_time_minutes,
        1
    );
}

proptest! {
    #[test]
    fn each_step_closes_distance_by_exactly_one(
        fx in 0i32..100, fy in 0i32..100, tx in 0i32..100, ty in 0i32..100
    ) {
        let from = Location::new(fx, fy);
        let to = Location::new(tx, ty);
        let next = step_toward(from, to);
        if from == to {
            prop_assert_eq!(next, to);
        } else {
            prop_assert_eq!(distance(next, to) + 1, distance(from, to));
            prop_assert_eq!(distance(from, next), 1);
        }
    }
}
