use super::types::{CandidateDriver, ScoredCandidate};

/// Trait for driver selection policies.
///
/// An algorithm receives every eligible driver for one request (already filtered
/// for availability, outstanding offers and prior rejections) and orders them from
/// most to least desirable. The order must be total and deterministic: the same
/// candidates always produce the same ranking, whatever order they arrive in.
pub trait MatchingAlgorithm: Send + Sync {
    /// Score and order the candidates, best first.
    fn rank(&self, candidates: &[CandidateDriver]) -> Vec<ScoredCandidate>;

    /// Pick the single best candidate, or `None` for an empty candidate set.
    fn find_match(&self, candidates: &[CandidateDriver]) -> Option<ScoredCandidate> {
        self.rank(candidates).into_iter().next()
    }
}
