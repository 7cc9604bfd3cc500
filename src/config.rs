use serde::Deserialize;
use std::time::Duration;

use crate::services::{EnrichmentPolicy, PipelineConfig, RankingPolicy};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL; in-memory stores are used when unset
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL; enrichment reports are not cached when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Gemini API key, required unless the enrichment policy is `simple`
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// Gemini API base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    #[serde(default)]
    pub enrichment_policy: EnrichmentPolicy,

    /// Seconds a cached enrichment report stays valid
    #[serde(default = "default_enrichment_cache_ttl_secs")]
    pub enrichment_cache_ttl_secs: u64,

    #[serde(default = "default_match_top_k")]
    pub match_top_k: usize,

    #[serde(default = "default_match_inclusion_threshold")]
    pub match_inclusion_threshold: f64,

    /// Similarity of two profiles that both have no traits
    #[serde(default = "default_match_empty_traits_baseline")]
    pub match_empty_traits_baseline: f64,

    /// Score given to every candidate when no one clears the inclusion threshold
    #[serde(default = "default_match_fallback_baseline")]
    pub match_fallback_baseline: f64,

    /// Weight of the deterministic score in the final blend
    #[serde(default = "default_match_formula_weight")]
    pub match_formula_weight: f64,

    #[serde(default = "default_match_deadline_secs")]
    pub match_deadline_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_enrichment_cache_ttl_secs() -> u64 {
    86400 // 1 day
}

fn default_match_top_k() -> usize {
    10
}

fn default_match_inclusion_threshold() -> f64 {
    0.05
}

fn default_match_empty_traits_baseline() -> f64 {
    0.2
}

fn default_match_fallback_baseline() -> f64 {
    0.1
}

fn default_match_formula_weight() -> f64 {
    0.3
}

fn default_match_deadline_secs() -> u64 {
    300
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects tuning values the pipeline cannot work with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.match_top_k == 0 {
            anyhow::bail!("MATCH_TOP_K must be at least 1");
        }

        let unit_interval = [
            ("MATCH_INCLUSION_THRESHOLD", self.match_inclusion_threshold),
            ("MATCH_EMPTY_TRAITS_BASELINE", self.match_empty_traits_baseline),
            ("MATCH_FALLBACK_BASELINE", self.match_fallback_baseline),
            ("MATCH_FORMULA_WEIGHT", self.match_formula_weight),
        ];
        for (name, value) in unit_interval {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{} must be within [0, 1], got {}", name, value);
            }
        }

        if self.match_deadline_secs == 0 {
            anyhow::bail!("MATCH_DEADLINE_SECS must be at least 1");
        }

        Ok(())
    }

    /// Returns the API key only when it is present and non-blank
    pub fn gemini_api_key(&self) -> Option<&str> {
        self.gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            policy: self.enrichment_policy,
            ranking: RankingPolicy {
                top_k: self.match_top_k,
                inclusion_threshold: self.match_inclusion_threshold,
                fallback_baseline: self.match_fallback_baseline,
            },
            empty_traits_baseline: self.match_empty_traits_baseline,
            formula_weight: self.match_formula_weight,
            deadline: Duration::from_secs(self.match_deadline_secs),
        }
    }
}
