mod enrichment;
mod gemini;
mod match_record;
mod profile;

pub use enrichment::{EnrichmentReport, FeatureScore};
pub use gemini::{
    GeminiCandidate, GeminiCandidateContent, GeminiContent, GeminiErrorBody, GeminiPart,
    GeminiPartResponse, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
};
pub use match_record::{MatchId, MatchRecord};
pub use profile::{dedup_traits, CallerIdentity, ProfileSnapshot, UserId, UserProfile};
