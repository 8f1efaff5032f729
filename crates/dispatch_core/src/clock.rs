use bevy_ecs::prelude::Resource;

/// Discrete simulation time. Only advances when a caller asks for a tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Resource)]
pub struct TickClock {
    now: u64,
}

impl TickClock {
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Move to the next tick and return it.
    pub fn advance(&mut self) -> u64 {
        self.now += 1;
        self.now
    }
}
