use std::sync::Arc;

use crate::models::UserProfile;
use crate::services::similarity::SimilarityScorer;

/// Tuning knobs for candidate selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingPolicy {
    /// Maximum number of candidates passed on to enrichment
    pub top_k: usize,
    /// Candidates must score strictly above this to be kept
    pub inclusion_threshold: f64,
    /// Score assigned to everyone when nobody clears the threshold
    pub fallback_baseline: f64,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            top_k: 10,
            inclusion_threshold: 0.05,
            fallback_baseline: 0.1,
        }
    }
}

/// A candidate paired with its requester and deterministic score
///
/// Lives only for the duration of one pipeline run.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub requester: Arc<UserProfile>,
    pub candidate: UserProfile,
    pub score: f64,
}

/// Scores a requester against a population and keeps the best top-K
#[derive(Debug, Clone)]
pub struct CandidateRanker {
    scorer: SimilarityScorer,
    policy: RankingPolicy,
}

impl CandidateRanker {
    pub fn new(scorer: SimilarityScorer, policy: RankingPolicy) -> Self {
        Self { scorer, policy }
    }

    /// Ranks the population, highest score first, capped at top-K
    ///
    /// The population must already exclude the requester, suspended users
    /// and blocked relationships. If nobody clears the inclusion threshold
    /// the whole population is admitted at the fallback baseline, so a
    /// non-empty population never produces an empty ranking.
    pub fn rank(
        &self,
        requester: &Arc<UserProfile>,
        population: Vec<UserProfile>,
    ) -> Vec<ScoredCandidate> {
        if population.is_empty() {
            return Vec::new();
        }

        let scores: Vec<f64> = population
            .iter()
            .map(|candidate| self.scorer.score(&requester.traits, &candidate.traits))
            .collect();

        let above_threshold = scores
            .iter()
            .filter(|&&score| score > self.policy.inclusion_threshold)
            .count();

        let mut ranked: Vec<ScoredCandidate> = if above_threshold == 0 {
            tracing::info!(
                requester = %requester.id,
                population = population.len(),
                "No candidate cleared the inclusion threshold, admitting full population"
            );
            population
                .into_iter()
                .map(|candidate| ScoredCandidate {
                    requester: Arc::clone(requester),
                    candidate,
                    score: self.policy.fallback_baseline,
                })
                .collect()
        } else {
            population
                .into_iter()
                .zip(scores)
                .filter(|(_, score)| *score > self.policy.inclusion_threshold)
                .map(|(candidate, score)| ScoredCandidate {
                    requester: Arc::clone(requester),
                    candidate,
                    score,
                })
                .collect()
        };

        // Stable sort keeps population order among equal scores
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(self.policy.top_k);
        ranked
    }
}
