//! Tick systems. Each tick runs them in order against the dispatch world:
//! fairness window pruning, idle accrual, movement, pickup, completion.

pub mod fairness_window;
pub mod idle;
pub mod movement;
pub mod trip_completed;
pub mod trip_started;

use bevy_ecs::prelude::Resource;

use crate::ecs::RideId;

/// What happened during the tick currently being run. Reset before every tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Resource)]
pub struct TickActivity {
    /// ON_TRIP drivers that changed position. A driver already on its waypoint
    /// does not count.
    pub drivers_moved: usize,
    /// Rides whose driver reached pickup this tick.
    pub pickups: Vec<RideId>,
    /// Rides completed this tick.
    pub completions: Vec<RideId>,
}
