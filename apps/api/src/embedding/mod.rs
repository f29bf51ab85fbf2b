//! Embedding Provider — maps skill labels to vectors in a shared semantic space.
//!
//! `AppState` holds an `Arc<dyn EmbeddingProvider>` plus an `EmbeddingCache`.
//! Handlers never call a provider directly; they go through
//! `cache::embed_labels`, which serves cached vectors and checks the batch
//! contract (one vector per label, uniform dimension, finite components)
//! on fresh ones before they are cached.

use async_trait::async_trait;
use thiserror::Error;

pub mod cache;
pub mod ollama;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Embedding contract violated: {0}")]
    ContractViolation(String),
}

/// A source of embedding vectors. Implement this to swap the model backend
/// without touching the matcher or the handlers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns exactly one vector per label, in input order.
    async fn embed(&self, labels: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Identity of the model configuration; vectors from different ids are not comparable.
    fn model_id(&self) -> &str;
}

/// Verifies a provider batch: `expected` vectors, all of the same dimension,
/// with no NaN or infinite component.
pub fn check_batch(expected: usize, vectors: &[Vec<f32>]) -> Result<(), EmbeddingError> {
    if vectors.len() != expected {
        return Err(EmbeddingError::ContractViolation(format!(
            "expected {expected} vectors, got {}",
            vectors.len()
        )));
    }

    if let Some(first) = vectors.first() {
        let dim = first.len();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(EmbeddingError::ContractViolation(format!(
                "mixed dimensions in batch: {dim} and {}",
                bad.len()
            )));
        }
    }

    if let Some(index) = vectors
        .iter()
        .position(|v| v.iter().any(|x| !x.is_finite()))
    {
        return Err(EmbeddingError::ContractViolation(format!(
            "vector {index} contains a non-finite component"
        )));
    }

    Ok(())
}
