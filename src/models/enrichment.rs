use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sub-score and reasoning for a single named similarity feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureScore {
    /// 0-100
    pub score: u8,
    pub explanation: String,
}

/// Structured compatibility report produced by the language model
///
/// A report is only ever constructed after full validation, so `features`
/// is never empty and every score lies in 0-100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentReport {
    pub summary: String,
    /// 0-100
    pub total_score: u8,
    pub features: BTreeMap<String, FeatureScore>,
}

impl EnrichmentReport {
    /// Static report substituted for failed enrichment calls under the fallback policy
    pub fn fallback() -> Self {
        let features = [
            (
                "Creative Expression",
                85,
                "Both users show strong creative tendencies in their traits and interests.",
            ),
            (
                "Thoughtful Observation",
                70,
                "Shared appreciation for careful observation and mindful presence.",
            ),
            (
                "Storytelling",
                80,
                "Common interest in narrative creation and world-building activities.",
            ),
        ]
        .into_iter()
        .map(|(name, score, explanation)| {
            (
                name.to_string(),
                FeatureScore {
                    score,
                    explanation: explanation.to_string(),
                },
            )
        })
        .collect();

        Self {
            summary: "Two creative souls destined to collaborate on amazing projects!".to_string(),
            total_score: 75,
            features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_report_is_well_formed() {
        let report = EnrichmentReport::fallback();
        assert_eq!(report.total_score, 75);
        assert_eq!(report.features.len(), 3);
        assert!(!report.summary.is_empty());
        assert!(report.features.values().all(|f| f.score <= 100));
    }
}
