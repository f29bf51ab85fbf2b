use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Reports the service version, the active backends and embedding cache usage.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let cache = &state.embedding_cache;

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "skillgap-api",
        "skill_lister": state.skill_lister.backend(),
        "embedding_model": state.embedder.model_id(),
        "embedding_cache": {
            "entries": cache.len().await,
            "capacity": cache.capacity()
        }
    }))
}
