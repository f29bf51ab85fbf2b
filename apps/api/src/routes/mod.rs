pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Skill Gap API
        .route("/api/v1/skills/extract", post(handlers::handle_extract))
        .route("/api/v1/skills/match", post(handlers::handle_match))
        .route("/api/v1/skills/analyze", post(handlers::handle_analyze))
        .route("/api/v1/skills/report", post(handlers::handle_report))
        .route("/api/v1/resumes/upload", post(handlers::handle_upload))
        .route(
            "/api/v1/embeddings/cache",
            delete(handlers::handle_clear_cache),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::embedding::cache::EmbeddingCache;
    use crate::embedding::{EmbeddingError, EmbeddingProvider};
    use crate::extraction::skill_lister::KeywordSkillLister;

    /// Identical labels get identical vectors; "Postgres"/"PostgreSQL" share one.
    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, labels: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(labels
                .iter()
                .map(|l| match l.as_str() {
                    "Python" => vec![1.0, 0.0, 0.0],
                    "Postgres" | "PostgreSQL" => vec![0.0, 1.0, 0.0],
                    _ => vec![0.0, 0.0, 1.0],
                })
                .collect())
        }

        fn model_id(&self) -> &str {
            "stub"
        }
    }

    struct DownEmbedder;

    #[async_trait]
    impl EmbeddingProvider for DownEmbedder {
        async fn embed(&self, _labels: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Err(EmbeddingError::Api {
                status: 503,
                message: "unavailable".to_string(),
            })
        }

        fn model_id(&self) -> &str {
            "down"
        }
    }

    /// Returns a NaN-poisoned vector for every label on its first call only.
    #[derive(Default)]
    struct FlakyNanEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for FlakyNanEmbedder {
        async fn embed(&self, labels: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            let first = self.calls.fetch_add(1, Ordering::SeqCst) == 0;
            Ok(labels
                .iter()
                .map(|_| if first { vec![f32::NAN, 1.0] } else { vec![1.0, 0.0] })
                .collect())
        }

        fn model_id(&self) -> &str {
            "flaky"
        }
    }

    fn test_state(embedder: Arc<dyn EmbeddingProvider>) -> AppState {
        AppState {
            config: Config::from_lookup(|_| None).unwrap(),
            skill_lister: Arc::new(KeywordSkillLister),
            llm: None,
            embedder,
            embedding_cache: Arc::new(EmbeddingCache::new(NonZeroUsize::new(100).unwrap())),
        }
    }

    async fn send(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let router = build_router(test_state(Arc::new(StubEmbedder)));
        let (status, body) = send(router, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["skill_lister"], "keyword");
        assert_eq!(body["embedding_model"], "stub");
        assert_eq!(body["embedding_cache"]["entries"], 0);
        assert_eq!(body["embedding_cache"]["capacity"], 100);
    }

    #[tokio::test]
    async fn test_match_endpoint() {
        let router = build_router(test_state(Arc::new(StubEmbedder)));
        let (status, body) = send(
            router,
            "POST",
            "/api/v1/skills/match",
            Some(json!({
                "resume_skills": ["Python", "Postgres"],
                "jd_skills": ["Python", "PostgreSQL", "Java"]
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["threshold"], 0.7);
        assert_eq!(body["embedding_model"], "stub");
        assert_eq!(body["result"]["score"], 66.67);
        assert_eq!(body["result"]["matched"][1]["resume_skill"], "Postgres");
        assert_eq!(body["result"]["missing"], json!(["Java"]));
        assert_eq!(body["result"]["additional"], json!(["Postgres"]));
    }

    #[tokio::test]
    async fn test_match_endpoint_rejects_bad_threshold() {
        let router = build_router(test_state(Arc::new(StubEmbedder)));
        let (status, body) = send(
            router,
            "POST",
            "/api/v1/skills/match",
            Some(json!({ "resume_skills": [], "jd_skills": [], "threshold": 1.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_match_endpoint_surfaces_embedding_failure() {
        let router = build_router(test_state(Arc::new(DownEmbedder)));
        let (status, body) = send(
            router,
            "POST",
            "/api/v1/skills/match",
            Some(json!({ "resume_skills": ["Rust"], "jd_skills": ["Rust"] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "EMBEDDING_ERROR");
    }

    #[tokio::test]
    async fn test_match_endpoint_does_not_cache_non_finite_vectors() {
        let embedder = Arc::new(FlakyNanEmbedder::default());
        let state = test_state(embedder.clone());
        let cache = state.embedding_cache.clone();
        let router = build_router(state);
        let body = json!({ "resume_skills": ["Rust"], "jd_skills": ["Rust"] });

        let (status, error) = send(
            router.clone(),
            "POST",
            "/api/v1/skills/match",
            Some(body.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(error["error"]["code"], "EMBEDDING_ERROR");
        assert_eq!(cache.len().await, 0);

        let (status, result) = send(router, "POST", "/api/v1/skills/match", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["result"]["score"], 100.0);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_extract_endpoint_accepts_allowed_model() {
        let router = build_router(test_state(Arc::new(StubEmbedder)));
        let (status, body) = send(
            router,
            "POST",
            "/api/v1/skills/extract",
            Some(json!({ "text": "Rust and SQL", "model": "mixtral-8x7b-32768" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["skills"], json!(["Rust", "SQL"]));
    }

    #[tokio::test]
    async fn test_extract_endpoint_rejects_unlisted_model() {
        let router = build_router(test_state(Arc::new(StubEmbedder)));
        let (status, body) = send(
            router,
            "POST",
            "/api/v1/skills/extract",
            Some(json!({ "text": "Rust", "model": "gpt-4o" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"].as_str().unwrap().contains("gpt-4o"));
    }

    #[tokio::test]
    async fn test_analyze_endpoint_rejects_unlisted_model() {
        let router = build_router(test_state(Arc::new(StubEmbedder)));
        let (status, _) = send(
            router,
            "POST",
            "/api/v1/skills/analyze",
            Some(json!({
                "resume_text": "Python",
                "jd_text": "Python",
                "model": "not-a-model"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_extract_endpoint() {
        let router = build_router(test_state(Arc::new(StubEmbedder)));
        let (status, body) = send(
            router,
            "POST",
            "/api/v1/skills/extract",
            Some(json!({ "text": "Python and Docker on AWS" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "found");
        assert_eq!(body["skills"], json!(["Python", "Docker", "AWS"]));
        assert_eq!(body["backend"], "keyword");
    }

    #[tokio::test]
    async fn test_analyze_requires_both_texts() {
        let router = build_router(test_state(Arc::new(StubEmbedder)));
        let (status, _) = send(
            router,
            "POST",
            "/api/v1/skills/analyze",
            Some(json!({ "resume_text": "Python", "jd_text": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analyze_endpoint() {
        let router = build_router(test_state(Arc::new(StubEmbedder)));
        let (status, body) = send(
            router,
            "POST",
            "/api/v1/skills/analyze",
            Some(json!({
                "resume_text": "Python and PostgreSQL",
                "jd_text": "Python, PostgreSQL",
                "threshold": 0.9
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["score"], 100.0);
        assert_eq!(body["threshold"], 0.9);
        assert!(body["analysis_id"].is_string());
    }

    #[tokio::test]
    async fn test_report_endpoint_is_markdown_attachment() {
        let router = build_router(test_state(Arc::new(StubEmbedder)));
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/skills/report")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({
                    "candidate_name": "Jane Doe",
                    "resume_skills": ["Python"],
                    "jd_skills": ["Python"],
                    "result": {
                        "matched": [{"jd_skill": "Python", "resume_skill": "Python", "similarity": 1.0}],
                        "missing": [],
                        "additional": [],
                        "score": 100.0
                    }
                })
                .to_string(),
            ))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Jane_Doe_resume_skill_report.md\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("## Match Score: 100%"));
    }

    #[tokio::test]
    async fn test_clear_cache_endpoint() {
        let state = test_state(Arc::new(StubEmbedder));
        let cache = state.embedding_cache.clone();
        let router = build_router(state);

        let (status, _) = send(
            router.clone(),
            "POST",
            "/api/v1/skills/match",
            Some(json!({ "resume_skills": ["Python"], "jd_skills": ["Rust"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache.len().await, 2);

        let (status, body) = send(router, "DELETE", "/api/v1/embeddings/cache", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cleared"], 2);
        assert_eq!(body["remaining"], 0);
        assert_eq!(cache.len().await, 0);
    }
}
