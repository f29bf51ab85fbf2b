mod analysis;
mod config;
mod embedding;
mod errors;
mod extraction;
mod llm_client;
mod matching;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::embedding::cache::EmbeddingCache;
use crate::embedding::ollama::OllamaEmbedder;
use crate::extraction::skill_lister::{KeywordSkillLister, LlmSkillLister, SkillLister};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Skill Gap API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client and skill lister (keyword by default, LLM when a Groq key is configured)
    let llm = config
        .groq_api_key
        .clone()
        .map(|key| LlmClient::new(key, config.groq_model.clone()))
        .transpose()?;
    let skill_lister: Arc<dyn SkillLister> = match &llm {
        Some(llm) => {
            info!(
                "Skill lister: LLM (model: {}, allowed: {})",
                llm.model(),
                config.groq_allowed_models.join(", ")
            );
            Arc::new(LlmSkillLister(llm.clone()))
        }
        None => {
            info!("No GROQ_API_KEY set; skill lister: keyword vocabulary, heuristic name extraction");
            Arc::new(KeywordSkillLister)
        }
    };

    // Initialize embedding provider and its cache
    let embedder = OllamaEmbedder::new(&config.embedding_url, config.embedding_model.clone())?;
    info!(
        "Embedding provider: {} (model: {})",
        config.embedding_url, config.embedding_model
    );
    let embedding_cache = Arc::new(EmbeddingCache::new(config.embedding_cache_capacity));

    // Build app state
    let state = AppState {
        config: config.clone(),
        skill_lister,
        llm,
        embedder: Arc::new(embedder),
        embedding_cache,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
