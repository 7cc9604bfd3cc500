use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display};

use super::{FeatureScore, ProfileSnapshot, UserId};

/// Stable identifier of a (requester, candidate) match
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    pub fn for_pair(requester: &UserId, candidate: &UserId) -> Self {
        Self(format!("match_{}_{}", requester, candidate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The persisted unit of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: MatchId,
    pub requester: ProfileSnapshot,
    pub candidate: ProfileSnapshot,
    /// Jaccard-based score in [0, 1]
    pub deterministic_score: f64,
    /// Model score normalized to [0, 1]; `None` when the record was built without enrichment
    pub enrichment_score: Option<f64>,
    pub final_score: f64,
    pub summary: String,
    pub features: BTreeMap<String, FeatureScore>,
    pub generated_at: DateTime<Utc>,
}
