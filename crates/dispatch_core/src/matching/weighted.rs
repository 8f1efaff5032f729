use std::cmp::Ordering;

use crate::config::ScoringWeights;

use super::algorithm::MatchingAlgorithm;
use super::types::{CandidateDriver, ScoreBreakdown, ScoredCandidate};

/// Weighted multi-factor matching: pickup distance, fairness and idle time.
///
/// Each signal is min-max normalized across the candidate set, so scores are
/// relative to the drivers competing for the same request:
///
/// ```text
/// score = w_eta * (1 - norm(eta)) + w_fair * (1 - norm(recent)) + w_idle * norm(idle)
/// ```
///
/// A signal that is equal for every candidate normalizes to 0 everywhere. The
/// highest score wins; ties go to the smaller ETA and then the smaller driver id.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedMatching {
    pub weights: ScoringWeights,
}

impl WeightedMatching {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    fn score(&self, breakdown: &ScoreBreakdown) -> f64 {
        self.weights.eta * breakdown.eta
            + self.weights.fairness * breakdown.fairness
            + self.weights.idle * breakdown.idle
    }
}

/// Min-max scale `values` into [0, 1]; a degenerate range maps everything to 0.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    values
        .iter()
        .map(|v| if range > 0.0 { (v - min) / range } else { 0.0 })
        .collect()
}

fn compare_ranked(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.eta.cmp(&b.eta))
        .then_with(|| a.driver.cmp(&b.driver))
}

impl MatchingAlgorithm for WeightedMatching {
    fn rank(&self, candidates: &[CandidateDriver]) -> Vec<ScoredCandidate> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let etas: Vec<f64> = candidates.iter().map(|c| f64::from(c.eta)).collect();
        let recent: Vec<f64> = candidates
            .iter()
            .map(|c| f64::from(c.recent_rides))
            .collect();
        let idle: Vec<f64> = candidates.iter().map(|c| c.idle_minutes as f64).collect();

        let norm_eta = min_max_normalize(&etas);
        let norm_recent = min_max_normalize(&recent);
        let norm_idle = min_max_normalize(&idle);

        let mut ranked: Vec<ScoredCandidate> = candidates
            .iter()
            .enumerate()
            .map(|(i, candidate)| {
                let breakdown = ScoreBreakdown {
                    eta: 1.0 - norm_eta[i],
                    fairness: 1.0 - norm_recent[i],
                    idle: norm_idle[i],
                };
                ScoredCandidate {
                    driver: candidate.driver,
                    eta: candidate.eta,
                    score: self.score(&breakdown),
                    breakdown,
                }
            })
            .collect();
        ranked.sort_by(compare_ranked);
        ranked
    }
}
