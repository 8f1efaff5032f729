pub mod clock;
pub mod config;
pub mod dispatch;
pub mod ecs;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod matching;
pub mod runner;
pub mod scenario;
pub mod store;
pub mod systems;
pub mod telemetry;
pub mod views;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use config::{DispatchConfig, ScoringWeights};
pub use engine::{DispatchEngine, SharedDispatchEngine};
pub use error::{DispatchError, DispatchResult, EntityKind};
pub use geometry::Location;
