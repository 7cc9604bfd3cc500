//! Match generation pipeline
//!
//! One invocation walks `Ranking -> Enriching -> Blending -> Persisting -> Done`
//! for a single requester under an overall deadline. Enrichment fans out one
//! task per ranked candidate; a failed candidate only affects itself.
use std::{collections::BTreeMap, fmt::Display, sync::Arc, time::Duration};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::{
    db::{MatchStore, ProfileStore},
    error::{AppError, AppResult},
    models::{
        CallerIdentity, EnrichmentReport, MatchId, MatchRecord, ProfileSnapshot, UserId,
        UserProfile,
    },
    services::{
        blender::{normalize, ScoreBlender},
        enrichment::{Enricher, EnrichmentError},
        ranker::{CandidateRanker, RankingPolicy, ScoredCandidate},
        similarity::SimilarityScorer,
    },
};

/// Summary stored on records built without enrichment
pub const SIMPLE_SUMMARY: &str = "Matched on shared traits.";

/// How the pipeline treats the language-model step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentPolicy {
    /// Every record is enriched; candidates whose call fails are dropped
    #[default]
    Required,
    /// Failed calls are backed by the static fallback report
    Fallback,
    /// No calls at all; records carry the deterministic score only
    Simple,
}

impl Display for EnrichmentPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EnrichmentPolicy::Required => "required",
            EnrichmentPolicy::Fallback => "fallback",
            EnrichmentPolicy::Simple => "simple",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Ranking,
    Enriching,
    Blending,
    Persisting,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub policy: EnrichmentPolicy,
    pub ranking: RankingPolicy,
    pub empty_traits_baseline: f64,
    pub formula_weight: f64,
    pub deadline: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            policy: EnrichmentPolicy::default(),
            ranking: RankingPolicy::default(),
            empty_traits_baseline: crate::services::similarity::DEFAULT_EMPTY_TRAITS_BASELINE,
            formula_weight: crate::services::blender::DEFAULT_FORMULA_WEIGHT,
            deadline: Duration::from_secs(300),
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// Records persisted for the requester
    pub matches_found: usize,
    /// Candidates that came out of ranking
    pub ranked: usize,
    /// Candidates whose enrichment failed
    pub failed: usize,
}

struct EnrichedCandidate {
    scored: ScoredCandidate,
    report: Option<EnrichmentReport>,
}

pub struct MatchPipeline {
    profiles: Arc<dyn ProfileStore>,
    matches: Arc<dyn MatchStore>,
    enricher: Option<Arc<dyn Enricher>>,
    ranker: CandidateRanker,
    blender: ScoreBlender,
    policy: EnrichmentPolicy,
    fallback_report: EnrichmentReport,
    deadline: Duration,
}

impl MatchPipeline {
    /// `enricher` may be `None` when no API key is configured; runs that need
    /// it then fail with `ConfigurationMissing`.
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        matches: Arc<dyn MatchStore>,
        enricher: Option<Arc<dyn Enricher>>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            profiles,
            matches,
            enricher,
            ranker: CandidateRanker::new(
                SimilarityScorer::new(config.empty_traits_baseline),
                config.ranking,
            ),
            blender: ScoreBlender::new(config.formula_weight),
            policy: config.policy,
            fallback_report: EnrichmentReport::fallback(),
            deadline: config.deadline,
        }
    }

    pub fn policy(&self) -> EnrichmentPolicy {
        self.policy
    }

    /// Generates and stores a fresh match set for the caller
    ///
    /// Returns the number of stored records, which may be zero. Every
    /// successful run replaces the stored set, including with an empty one
    /// when nobody is eligible. Exceeding the deadline aborts all
    /// outstanding enrichment calls and fails the run.
    pub async fn run(&self, caller: &CallerIdentity) -> AppResult<PipelineOutcome> {
        match tokio::time::timeout(self.deadline, self.run_stages(caller)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    requester = %caller.id,
                    deadline_secs = self.deadline.as_secs(),
                    "Match pipeline exceeded its deadline"
                );
                Err(AppError::DeadlineExceeded(self.deadline))
            }
        }
    }

    async fn run_stages(&self, caller: &CallerIdentity) -> AppResult<PipelineOutcome> {
        let requester = Arc::new(self.resolve_requester(caller).await?);
        let population = self.profiles.list_eligible(&requester.id).await?;

        enter(PipelineStage::Ranking, &requester.id);
        let ranked = self.ranker.rank(&requester, population);
        if ranked.is_empty() {
            tracing::info!(requester = %requester.id, "No candidates available");
            enter(PipelineStage::Persisting, &requester.id);
            self.persist(&requester.id, Vec::new()).await?;
            return Ok(PipelineOutcome::default());
        }
        let ranked_count = ranked.len();

        enter(PipelineStage::Enriching, &requester.id);
        let (enriched, failed) = self.enrich(ranked).await?;

        enter(PipelineStage::Blending, &requester.id);
        let records = self.assemble(enriched);
        let matches_found = records.len();

        enter(PipelineStage::Persisting, &requester.id);
        self.persist(&requester.id, records).await?;

        enter(PipelineStage::Done, &requester.id);
        tracing::info!(
            requester = %requester.id,
            policy = %self.policy,
            ranked = ranked_count,
            failed,
            matches_found,
            "Match pipeline completed"
        );

        Ok(PipelineOutcome {
            matches_found,
            ranked: ranked_count,
            failed,
        })
    }

    async fn persist(&self, requester: &UserId, records: Vec<MatchRecord>) -> AppResult<()> {
        self.matches
            .replace_all(requester, records)
            .await
            .map_err(|e| match e {
                AppError::PersistenceFailure(_) => e,
                other => AppError::PersistenceFailure(other.to_string()),
            })
    }

    /// Loads the requester, creating an empty profile on first contact
    async fn resolve_requester(&self, caller: &CallerIdentity) -> AppResult<UserProfile> {
        if let Some(profile) = self.profiles.get(&caller.id).await? {
            return Ok(profile);
        }

        let profile = self.profiles.create_default(caller).await?;
        tracing::info!(requester = %caller.id, "Created requester profile on first match request");
        Ok(profile)
    }

    /// Runs one enrichment task per candidate and collects tagged results
    ///
    /// Returns the surviving candidates and the number of failed calls.
    async fn enrich(
        &self,
        ranked: Vec<ScoredCandidate>,
    ) -> AppResult<(Vec<EnrichedCandidate>, usize)> {
        if self.policy == EnrichmentPolicy::Simple {
            let enriched = ranked
                .into_iter()
                .map(|scored| EnrichedCandidate {
                    scored,
                    report: None,
                })
                .collect();
            return Ok((enriched, 0));
        }

        let enricher = self.enricher.clone().ok_or_else(|| {
            AppError::ConfigurationMissing("GEMINI_API_KEY is not set".to_string())
        })?;

        tracing::info!(
            candidates = ranked.len(),
            enricher = enricher.name(),
            policy = %self.policy,
            "Enriching ranked candidates"
        );

        let mut tasks = JoinSet::new();
        for (index, scored) in ranked.iter().enumerate() {
            let enricher = Arc::clone(&enricher);
            let requester = Arc::clone(&scored.requester);
            let candidate = scored.candidate.clone();
            tasks.spawn(async move {
                let result = enricher.enrich(&requester, &candidate).await;
                (index, result)
            });
        }

        // `None` after the join loop means the task never reported back
        let mut results: Vec<Option<Result<EnrichmentReport, EnrichmentError>>> =
            std::iter::repeat_with(|| None).take(ranked.len()).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => tracing::error!(error = %e, "Enrichment task did not complete"),
            }
        }

        let mut enriched = Vec::with_capacity(ranked.len());
        let mut failed = 0;

        for (scored, result) in ranked.into_iter().zip(results) {
            let report = match result {
                Some(Ok(report)) => Some(report),
                Some(Err(e)) => {
                    tracing::warn!(
                        requester = %scored.requester.id,
                        candidate = %scored.candidate.id,
                        kind = ?e.kind(),
                        error = %e,
                        "Enrichment failed for candidate"
                    );
                    None
                }
                None => None,
            };

            match report {
                Some(report) => enriched.push(EnrichedCandidate {
                    scored,
                    report: Some(report),
                }),
                None => {
                    failed += 1;
                    if self.policy == EnrichmentPolicy::Fallback {
                        enriched.push(EnrichedCandidate {
                            scored,
                            report: Some(self.fallback_report.clone()),
                        });
                    }
                }
            }
        }

        Ok((enriched, failed))
    }

    /// Blends scores and builds records, best match first
    fn assemble(&self, enriched: Vec<EnrichedCandidate>) -> Vec<MatchRecord> {
        let generated_at = Utc::now();

        let mut records: Vec<MatchRecord> = enriched
            .into_iter()
            .map(|EnrichedCandidate { scored, report }| {
                let deterministic_score = scored.score;
                let (enrichment_score, final_score, summary, features) = match report {
                    Some(report) => (
                        Some(normalize(report.total_score)),
                        self.blender.blend(deterministic_score, report.total_score),
                        report.summary,
                        report.features,
                    ),
                    None => (
                        None,
                        deterministic_score,
                        SIMPLE_SUMMARY.to_string(),
                        BTreeMap::new(),
                    ),
                };

                MatchRecord {
                    id: MatchId::for_pair(&scored.requester.id, &scored.candidate.id),
                    requester: ProfileSnapshot::from(scored.requester.as_ref()),
                    candidate: ProfileSnapshot::from(&scored.candidate),
                    deterministic_score,
                    enrichment_score,
                    final_score,
                    summary,
                    features,
                    generated_at,
                }
            })
            .collect();

        records.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
        records
    }
}

fn enter(stage: PipelineStage, requester: &UserId) {
    tracing::debug!(requester = %requester, stage = ?stage, "Pipeline stage");
}
