//! Language-model enrichment of ranked candidates
//!
//! An [`Enricher`] turns one (requester, candidate) pair into a validated
//! [`EnrichmentReport`] or a typed [`EnrichmentError`]. Failures are always
//! scoped to that one candidate; the pipeline decides whether to drop the
//! candidate or substitute the fallback report.
use crate::models::{EnrichmentReport, UserProfile};

pub mod gemini;
pub mod parser;
pub mod prompt;

pub use gemini::GeminiEnricher;

/// Coarse classification of an enrichment failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentFailureKind {
    /// The model answered but the answer is unusable
    InvalidResponse,
    /// The endpoint could not be reached or refused the request
    UpstreamUnavailable,
}

/// Per-candidate enrichment failure
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("language model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("language model returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("language model returned an error: {0}")]
    UpstreamError(String),

    #[error("generation did not stop cleanly: {0}")]
    IncompleteGeneration(String),

    #[error("response carried no candidates")]
    NoCandidates,

    #[error("response carried no text")]
    EmptyText,

    #[error("reply is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("reply is missing `{0}`")]
    MissingField(String),

    #[error("reply field `{field}` is out of range: {value}")]
    OutOfRange { field: String, value: f64 },

    #[error("reply has no similarity features")]
    NoFeatures,
}

impl EnrichmentError {
    pub fn kind(&self) -> EnrichmentFailureKind {
        match self {
            EnrichmentError::Transport(_)
            | EnrichmentError::UpstreamStatus { .. }
            | EnrichmentError::UpstreamError(_) => EnrichmentFailureKind::UpstreamUnavailable,
            _ => EnrichmentFailureKind::InvalidResponse,
        }
    }
}

/// Produces a compatibility report for one candidate
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(
        &self,
        requester: &UserProfile,
        candidate: &UserProfile,
    ) -> Result<EnrichmentReport, EnrichmentError>;

    /// Enricher name for logging and debugging
    fn name(&self) -> &'static str;
}
