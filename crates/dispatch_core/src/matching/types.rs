use serde::Serialize;

use crate::ecs::DriverId;

/// Raw signals of one driver considered for a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateDriver {
    pub driver: DriverId,
    /// Manhattan distance from the driver to the pickup location.
    pub eta: u32,
    pub recent_rides: u32,
    pub idle_minutes: u64,
}

/// Normalized signal contributions, each in [0, 1] before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// `1 - norm(eta)`; closer drivers score higher.
    pub eta: f64,
    /// `1 - norm(recent rides)`; drivers with fewer recent rides score higher.
    pub fairness: f64,
    /// `norm(idle)`; longer-idle drivers score higher.
    pub idle: f64,
}

/// A candidate with its composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub driver: DriverId,
    pub eta: u32,
    pub breakdown: ScoreBreakdown,
    pub score: f64,
}
