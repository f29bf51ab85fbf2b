use std::sync::Arc;

use crate::config::Config;
use crate::embedding::cache::EmbeddingCache;
use crate::embedding::EmbeddingProvider;
use crate::extraction::skill_lister::SkillLister;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable skill lister. Default: KeywordSkillLister; LlmSkillLister when GROQ_API_KEY is set.
    pub skill_lister: Arc<dyn SkillLister>,
    /// Present when GROQ_API_KEY is set; used for candidate name extraction.
    pub llm: Option<LlmClient>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// Label vectors keyed by (model id, label); least recently used evicted first.
    pub embedding_cache: Arc<EmbeddingCache>,
}
