use std::sync::Arc;

use crate::{
    config::Config,
    db::{
        create_pool, create_redis_client, run_migrations, Cache, CacheWriterHandle,
        InMemoryMatchStore, InMemoryProfileStore, MatchStore, PgMatchStore, PgProfileStore,
        ProfileStore,
    },
    services::{Enricher, GeminiEnricher, MatchPipeline},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<MatchPipeline>,
}

impl AppState {
    pub fn new(pipeline: MatchPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Wires stores, cache and enricher from configuration
    ///
    /// Returns the cache writer handle when Redis is configured so the caller
    /// can flush pending writes on shutdown.
    pub async fn from_config(config: &Config) -> anyhow::Result<(Self, Option<CacheWriterHandle>)> {
        let (profiles, matches): (Arc<dyn ProfileStore>, Arc<dyn MatchStore>) =
            match config.database_url.as_deref() {
                Some(database_url) => {
                    let pool = create_pool(database_url).await?;
                    run_migrations(&pool).await?;
                    tracing::info!("Using PostgreSQL stores");
                    (
                        Arc::new(PgProfileStore::new(pool.clone())),
                        Arc::new(PgMatchStore::new(pool)),
                    )
                }
                None => {
                    tracing::warn!("DATABASE_URL not set, matches are kept in memory only");
                    (
                        Arc::new(InMemoryProfileStore::new()),
                        Arc::new(InMemoryMatchStore::new()),
                    )
                }
            };

        let mut cache_handle = None;
        let enricher: Option<Arc<dyn Enricher>> = match config.gemini_api_key() {
            Some(api_key) => {
                let mut enricher = GeminiEnricher::new(
                    api_key.to_string(),
                    config.gemini_api_url.clone(),
                    config.gemini_model.clone(),
                );

                if let Some(redis_url) = config.redis_url.as_deref() {
                    let (cache, handle) = Cache::new(create_redis_client(redis_url)?);
                    enricher = enricher.with_cache(cache, config.enrichment_cache_ttl_secs);
                    cache_handle = Some(handle);
                    tracing::info!("Enrichment reports are cached in Redis");
                }

                Some(Arc::new(enricher))
            }
            None => {
                tracing::warn!(
                    policy = %config.enrichment_policy,
                    "GEMINI_API_KEY not set, enrichment is unavailable"
                );
                None
            }
        };

        let pipeline = MatchPipeline::new(profiles, matches, enricher, config.pipeline_config());
        Ok((Self::new(pipeline), cache_handle))
    }
}
