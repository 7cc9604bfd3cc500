/// Gemini enrichment provider
///
/// Sends one `generateContent` request per (requester, candidate) pair and
/// validates the reply with [`parser`]. When a Redis cache is attached,
/// successful reports are cached under a fingerprint of both profiles so an
/// unchanged pair is not re-sent to the model.
use crate::{
    cached,
    db::{Cache, CacheKey},
    models::{EnrichmentReport, GenerateContentRequest, GenerationConfig, UserProfile},
    services::enrichment::{parser, prompt, EnrichmentError, Enricher},
};
use reqwest::Client as HttpClient;
use uuid::Uuid;

/// Fixed sampling parameters; not user-configurable
const GENERATION_CONFIG: GenerationConfig = GenerationConfig {
    temperature: 0.8,
    top_k: 40,
    top_p: 0.95,
};

#[derive(Clone)]
pub struct GeminiEnricher {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
    cache: Option<(Cache, u64)>,
}

impl GeminiEnricher {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
            cache: None,
        }
    }

    /// Caches successful reports for `ttl` seconds
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some((cache, ttl));
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }

    /// Content fingerprint of a pair; changes whenever either profile or the model changes
    fn fingerprint(&self, requester: &UserProfile, candidate: &UserProfile) -> String {
        let material = serde_json::json!({
            "model": self.model,
            "a": [&requester.display_name, &requester.traits, &requester.bio],
            "b": [&candidate.display_name, &candidate.traits, &candidate.bio],
        });
        Uuid::new_v5(&Uuid::NAMESPACE_OID, material.to_string().as_bytes())
            .simple()
            .to_string()
    }

    /// Sends a prompt and returns the validated reply text
    async fn generate(&self, prompt: String) -> Result<String, EnrichmentError> {
        let request = GenerateContentRequest::from_prompt(prompt, GENERATION_CONFIG);

        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| EnrichmentError::Transport(e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| EnrichmentError::Transport(e.without_url()))?;
        tracing::debug!(response_len = body.len(), "Raw Gemini response received");

        parser::parse_envelope(&body)
    }

    async fn fetch_report(
        &self,
        requester: &UserProfile,
        candidate: &UserProfile,
    ) -> Result<EnrichmentReport, EnrichmentError> {
        let prompt = prompt::build_match_prompt(requester, candidate);
        let text = self.generate(prompt).await?;
        let report = parser::parse_report(&text)?;

        tracing::info!(
            requester = %requester.id,
            candidate = %candidate.id,
            total_score = report.total_score,
            features = report.features.len(),
            provider = "gemini",
            "Enrichment report received"
        );

        Ok(report)
    }
}

#[async_trait::async_trait]
impl Enricher for GeminiEnricher {
    async fn enrich(
        &self,
        requester: &UserProfile,
        candidate: &UserProfile,
    ) -> Result<EnrichmentReport, EnrichmentError> {
        let Some((cache, ttl)) = &self.cache else {
            return self.fetch_report(requester, candidate).await;
        };

        let key = CacheKey::Enrichment {
            requester: requester.id.clone(),
            candidate: candidate.id.clone(),
            fingerprint: self.fingerprint(requester, candidate),
        };

        let report: Result<EnrichmentReport, EnrichmentError> =
            cached!(cache, key, *ttl, self.fetch_report(requester, candidate));
        report
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;
    use crate::services::enrichment::EnrichmentFailureKind;
    use axum::{
        extract::{Query, State},
        http::StatusCode,
        routing::post,
        Json, Router,
    };
    use serde_json::Value;
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    fn create_test_enricher() -> GeminiEnricher {
        GeminiEnricher::new(
            "test_key".to_string(),
            "http://test.local/v1beta/".to_string(),
            "gemini-2.5-flash".to_string(),
        )
    }

    fn profile(id: &str, traits: &[&str]) -> UserProfile {
        UserProfile::new(UserId::new(id), id).with_traits(traits.iter().copied())
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let enricher = create_test_enricher();
        assert_eq!(
            enricher.endpoint(),
            "http://test.local/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let enricher = create_test_enricher();
        let a = profile("a", &["x", "y"]);
        let b = profile("b", &["y"]);

        assert_eq!(enricher.fingerprint(&a, &b), enricher.fingerprint(&a, &b));
    }

    #[test]
    fn test_fingerprint_changes_with_profile_content() {
        let enricher = create_test_enricher();
        let a = profile("a", &["x"]);
        let b = profile("b", &["y"]);
        let b_edited = profile("b", &["y"]).with_bio("new bio");

        assert_ne!(
            enricher.fingerprint(&a, &b),
            enricher.fingerprint(&a, &b_edited)
        );
    }

    #[test]
    fn test_fingerprint_is_directional() {
        let enricher = create_test_enricher();
        let a = profile("a", &["x"]);
        let b = profile("b", &["y"]);

        assert_ne!(enricher.fingerprint(&a, &b), enricher.fingerprint(&b, &a));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_upstream_unavailable() {
        let enricher = GeminiEnricher::new(
            "test_key".to_string(),
            "http://127.0.0.1:9".to_string(),
            "gemini-2.5-flash".to_string(),
        );

        let err = enricher
            .enrich(&profile("a", &["x"]), &profile("b", &["x"]))
            .await
            .unwrap_err();

        assert_eq!(
            err.kind(),
            crate::services::enrichment::EnrichmentFailureKind::UpstreamUnavailable
        );
        assert!(!err.to_string().contains("test_key"));
    }

    type SeenRequests = Arc<Mutex<Vec<(HashMap<String, String>, Value)>>>;

    #[derive(Clone)]
    struct StubReply {
        status: StatusCode,
        body: String,
        seen: SeenRequests,
    }

    async fn stub_generate(
        State(stub): State<StubReply>,
        Query(query): Query<HashMap<String, String>>,
        Json(body): Json<Value>,
    ) -> (StatusCode, String) {
        stub.seen.lock().unwrap().push((query, body));
        (stub.status, stub.body.clone())
    }

    /// Serves a fixed reply on a local port and returns its base URL
    async fn spawn_stub(status: StatusCode, body: String) -> (String, SeenRequests) {
        let seen = SeenRequests::default();
        let app = Router::new()
            .route("/v1beta/models/:action", post(stub_generate))
            .with_state(StubReply {
                status,
                body,
                seen: seen.clone(),
            });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/v1beta", addr), seen)
    }

    fn envelope(finish_reason: &str) -> String {
        let reply = serde_json::json!({
            "summary": "Two night owls.",
            "totalScore": 82,
            "similarFeatures": {
                "Late Nights": { "score": 90, "explanation": "Both are up past midnight." }
            }
        });
        serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": format!("```json\n{}\n```", reply) }] },
                "finishReason": finish_reason
            }]
        })
        .to_string()
    }

    fn enricher_at(api_url: String) -> GeminiEnricher {
        GeminiEnricher::new(
            "test_key".to_string(),
            api_url,
            "gemini-2.5-flash".to_string(),
        )
    }

    #[tokio::test]
    async fn test_clean_stop_reply_produces_report() {
        let (api_url, seen) = spawn_stub(StatusCode::OK, envelope("STOP")).await;

        let report = enricher_at(api_url)
            .enrich(&profile("a", &["night"]), &profile("b", &["night"]))
            .await
            .unwrap();

        assert_eq!(report.summary, "Two night owls.");
        assert_eq!(report.total_score, 82);
        assert_eq!(report.features["Late Nights"].score, 90);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (query, body) = &seen[0];
        assert_eq!(query.get("key").map(String::as_str), Some("test_key"));

        let config = &body["generationConfig"];
        assert!((config["temperature"].as_f64().unwrap() - 0.8).abs() < 1e-6);
        assert_eq!(config["topK"], 40);
        assert!((config["topP"].as_f64().unwrap() - 0.95).abs() < 1e-6);
        assert!(!body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_upstream_unavailable() {
        let (api_url, _) =
            spawn_stub(StatusCode::SERVICE_UNAVAILABLE, "overloaded".to_string()).await;

        let err = enricher_at(api_url)
            .enrich(&profile("a", &["x"]), &profile("b", &["x"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EnrichmentError::UpstreamStatus { status: 503, ref body } if body == "overloaded"
        ));
        assert_eq!(err.kind(), EnrichmentFailureKind::UpstreamUnavailable);
    }

    #[tokio::test]
    async fn test_truncated_generation_is_invalid_response() {
        let (api_url, _) = spawn_stub(StatusCode::OK, envelope("MAX_TOKENS")).await;

        let err = enricher_at(api_url)
            .enrich(&profile("a", &["x"]), &profile("b", &["x"]))
            .await
            .unwrap_err();

        assert!(matches!(err, EnrichmentError::IncompleteGeneration(ref r) if r == "MAX_TOKENS"));
        assert_eq!(err.kind(), EnrichmentFailureKind::InvalidResponse);
    }
}
