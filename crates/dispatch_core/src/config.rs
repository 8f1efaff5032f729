use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, DispatchResult};
use crate::geometry::GridBounds;

/// Default side length of the square city grid.
pub const DEFAULT_GRID_SIZE: i32 = 100;

/// Rejections a single ride request survives before it fails.
pub const DEFAULT_MAX_REJECTIONS: u32 = 3;

/// Largest accepted grid side. Keeps every summed grid distance well inside `u32`.
pub const MAX_GRID_SIZE: i32 = 1 << 20;

/// Allowed drift of the weight total from 1.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Ticks a completed ride keeps counting toward a driver's fairness signal.
pub const DEFAULT_FAIRNESS_WINDOW_TICKS: u64 = 100;

/// Weights of the composite driver score. They sum to 1 so the score stays in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Weight of the inverted, normalized pickup distance.
    pub eta: f64,
    /// Weight of the inverted, normalized recent-ride count.
    pub fairness: f64,
    /// Weight of the normalized idle time.
    pub idle: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            eta: 0.6,
            fairness: 0.25,
            idle: 0.15,
        }
    }
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.eta + self.fairness + self.idle
    }

    /// Weights must be finite, non-negative and sum to 1.
    pub fn validate(&self) -> DispatchResult<()> {
        let weights = [self.eta, self.fairness, self.idle];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(DispatchError::InvalidConfig(
                "scoring weights must be finite and non-negative",
            ));
        }
        if (self.total() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(DispatchError::InvalidConfig("scoring weights must sum to 1"));
        }
        Ok(())
    }
}

/// Dispatch and simulation parameters shared by every component.
#[derive(Debug, Clone, Copy, PartialEq, Resource, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Side length of the grid; valid coordinates are `0..grid_size`.
    pub grid_size: i32,
    /// Rejections after which a request is marked failed.
    pub max_rejections: u32,
    /// Sliding window (ticks) for the recent-ride fairness signal.
    pub fairness_window_ticks: u64,
    pub weights: ScoringWeights,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            max_rejections: DEFAULT_MAX_REJECTIONS,
            fairness_window_ticks: DEFAULT_FAIRNESS_WINDOW_TICKS,
            weights: ScoringWeights::default(),
        }
    }
}

impl DispatchConfig {
    /// Reject configurations the engine cannot run with. Every engine constructor
    /// calls this, so loaded files fail here instead of deep inside dispatch.
    pub fn validate(&self) -> DispatchResult<()> {
        if self.grid_size <= 0 {
            return Err(DispatchError::InvalidConfig("grid_size must be positive"));
        }
        if self.grid_size > MAX_GRID_SIZE {
            return Err(DispatchError::InvalidConfig("grid_size is too large"));
        }
        if self.max_rejections == 0 {
            return Err(DispatchError::InvalidConfig(
                "max_rejections must be at least 1",
            ));
        }
        self.weights.validate()
    }

    pub fn bounds(&self) -> GridBounds {
        GridBounds::new(self.grid_size)
    }

    pub fn with_grid_size(mut self, size: i32) -> Self {
        self.grid_size = size;
        self
    }

    pub fn with_max_rejections(mut self, max_rejections: u32) -> Self {
        self.max_rejections = max_rejections;
        self
    }

    pub fn with_fairness_window_ticks(mut self, ticks: u64) -> Self {
        self.fairness_window_ticks = ticks;
        self
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let weights = ScoringWeights::default();
        assert!((weights.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(DispatchConfig::default().validate(), Ok(()));
        assert_eq!(
            DispatchConfig::default()
                .with_grid_size(MAX_GRID_SIZE)
                .validate(),
            Ok(())
        );
    }

    #[test]
    fn grid_size_must_be_positive_and_bounded() {
        for size in [0, -5, MAX_GRID_SIZE + 1, i32::MAX] {
            assert!(
                matches!(
                    DispatchConfig::default().with_grid_size(size).validate(),
                    Err(DispatchError::InvalidConfig(_))
                ),
                "grid size {size} accepted"
            );
        }
    }

    #[test]
    fn zero_rejection_budget_is_refused() {
        assert_eq!(
            DispatchConfig::default().with_max_rejections(0).validate(),
            Err(DispatchError::InvalidConfig(
                "max_rejections must be at least 1"
            ))
        );
    }

    #[test]
    fn weights_must_be_non_negative_and_sum_to_one() {
        let rejected = [
            ScoringWeights {
                eta: 2.0,
                ..ScoringWeights::default()
            },
            ScoringWeights {
                eta: 0.5,
                fairness: 0.25,
                idle: 0.15,
            },
            ScoringWeights {
                eta: 1.2,
                fairness: -0.2,
                idle: 0.0,
            },
            ScoringWeights {
                eta: f64::NAN,
                fairness: 0.5,
                idle: 0.5,
            },
        ];
        for weights in rejected {
            assert!(
                DispatchConfig::default()
                    .with_weights(weights)
                    .validate()
                    .is_err(),
                "{weights:?} accepted"
            );
        }

        let eta_only = ScoringWeights {
            eta: 1.0,
            fairness: 0.0,
            idle: 0.0,
        };
        assert_eq!(eta_only.validate(), Ok(()));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: DispatchConfig =
            serde_json::from_str(r#"{ "max_rejections": 5, "weights": { "eta": 0.5 } }"#)
                .expect("config json");
        assert_eq!(config.max_rejections, 5);
        assert_eq!(config.grid_size, DEFAULT_GRID_SIZE);
        assert_eq!(config.weights.eta, 0.5);
        assert_eq!(config.weights.fairness, 0.25);
    }
}
