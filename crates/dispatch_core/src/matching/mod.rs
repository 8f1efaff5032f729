pub mod algorithm;
pub mod types;
pub mod weighted;

pub use algorithm::MatchingAlgorithm;
pub use types::{CandidateDriver, ScoreBreakdown, ScoredCandidate};
pub use weighted::WeightedMatching;
