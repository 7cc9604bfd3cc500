use std::collections::HashSet;

/// Similarity of two profiles that both carry no traits
pub const DEFAULT_EMPTY_TRAITS_BASELINE: f64 = 0.2;

/// Deterministic trait-set similarity (Jaccard index)
#[derive(Debug, Clone, Copy)]
pub struct SimilarityScorer {
    empty_traits_baseline: f64,
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(DEFAULT_EMPTY_TRAITS_BASELINE)
    }
}

impl SimilarityScorer {
    pub fn new(empty_traits_baseline: f64) -> Self {
        Self {
            empty_traits_baseline,
        }
    }

    /// Scores two trait sets in [0, 1]
    ///
    /// Tags compare case-sensitively. Duplicates within one side are ignored.
    pub fn score<S: AsRef<str>>(&self, a: &[S], b: &[S]) -> f64 {
        let a: HashSet<&str> = a.iter().map(AsRef::as_ref).collect();
        let b: HashSet<&str> = b.iter().map(AsRef::as_ref).collect();

        if a.is_empty() && b.is_empty() {
            return self.empty_traits_baseline;
        }

        let intersection = a.intersection(&b).count();
        let union = a.len() + b.len() - intersection;

        intersection as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_both_empty_returns_baseline() {
        let scorer = SimilarityScorer::default();
        let empty: Vec<String> = Vec::new();
        assert_eq!(scorer.score(&empty, &empty), DEFAULT_EMPTY_TRAITS_BASELINE);
    }

    #[test]
    fn test_one_side_empty_scores_zero() {
        let scorer = SimilarityScorer::default();
        assert_eq!(scorer.score(&tags(&["a"]), &tags(&[])), 0.0);
    }

    #[test]
    fn test_identical_sets_score_one() {
        let scorer = SimilarityScorer::default();
        let a = tags(&["hiking", "jazz", "tea"]);
        assert_eq!(scorer.score(&a, &a), 1.0);
    }

    #[test]
    fn test_partial_overlap_is_jaccard() {
        let scorer = SimilarityScorer::default();
        let score = scorer.score(&tags(&["A", "B"]), &tags(&["A", "C"]));
        assert!((score - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_case_sensitive() {
        let scorer = SimilarityScorer::default();
        assert_eq!(scorer.score(&tags(&["Jazz"]), &tags(&["jazz"])), 0.0);
    }

    #[test]
    fn test_duplicates_do_not_inflate_score() {
        let scorer = SimilarityScorer::default();
        let score = scorer.score(&tags(&["a", "a", "b"]), &tags(&["a"]));
        assert!((score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_and_bounded() {
        let scorer = SimilarityScorer::default();
        let sets = [
            tags(&[]),
            tags(&["a"]),
            tags(&["a", "b"]),
            tags(&["b", "c", "d"]),
            tags(&["x", "y"]),
        ];

        for a in &sets {
            for b in &sets {
                let ab = scorer.score(a, b);
                let ba = scorer.score(b, a);
                assert_eq!(ab, ba);
                assert!((0.0..=1.0).contains(&ab));
            }
        }
    }
}
