pub mod blender;
pub mod enrichment;
pub mod pipeline;
pub mod ranker;
pub mod similarity;

pub use blender::ScoreBlender;
pub use enrichment::{EnrichmentError, EnrichmentFailureKind, Enricher, GeminiEnricher};
pub use pipeline::{EnrichmentPolicy, MatchPipeline, PipelineConfig, PipelineOutcome};
pub use ranker::{CandidateRanker, RankingPolicy, ScoredCandidate};
pub use similarity::SimilarityScorer;
