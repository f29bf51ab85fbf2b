//! Embedding cache — label vectors keyed by (model id, label).
//!
//! Owned by the orchestration layer (`AppState`), never by the matcher.
//! Bounded LRU: once full, the least recently used vector makes room.
//! `clear()` drops everything, e.g. after the embedding model behind a
//! model id has been replaced.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::Mutex;
use tracing::debug;

use crate::embedding::{check_batch, EmbeddingError, EmbeddingProvider};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    model_id: String,
    label: String,
}

impl CacheKey {
    fn new(model_id: &str, label: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            label: label.to_string(),
        }
    }
}

pub struct EmbeddingCache {
    entries: Mutex<LruCache<CacheKey, Vec<f32>>>,
    capacity: NonZeroUsize,
}

impl EmbeddingCache {
    /// Holds at most `capacity` vectors; the least recently used one is evicted first.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            capacity,
        }
    }

    /// Looks up every label; `None` marks a miss. Hits count as a use.
    pub async fn get_many(&self, model_id: &str, labels: &[String]) -> Vec<Option<Vec<f32>>> {
        let mut entries = self.entries.lock().await;
        labels
            .iter()
            .map(|label| entries.get(&CacheKey::new(model_id, label)).cloned())
            .collect()
    }

    pub async fn insert_many(&self, model_id: &str, labels: &[String], vectors: &[Vec<f32>]) {
        let mut entries = self.entries.lock().await;
        for (label, vector) in labels.iter().zip(vectors) {
            let key = CacheKey::new(model_id, label);
            if let Some((evicted, _)) = entries.push(key.clone(), vector.clone()) {
                if evicted != key {
                    debug!("Embedding cache full, evicted '{}'", evicted.label);
                }
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Removes every entry and returns how many were dropped.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let evicted = entries.len();
        entries.clear();
        evicted
    }
}

/// Embeds `labels` in order, serving cached vectors and sending the distinct
/// misses to `provider` in a single call.
pub async fn embed_labels(
    provider: &dyn EmbeddingProvider,
    cache: &EmbeddingCache,
    labels: &[String],
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let model_id = provider.model_id();
    let cached = cache.get_many(model_id, labels).await;

    let mut misses: Vec<String> = Vec::new();
    for (label, hit) in labels.iter().zip(&cached) {
        if hit.is_none() && !misses.contains(label) {
            misses.push(label.clone());
        }
    }

    debug!(
        "Embedding {} labels: {} cached, {} to fetch",
        labels.len(),
        labels.len() - cached.iter().filter(|c| c.is_none()).count(),
        misses.len()
    );

    let fresh: HashMap<String, Vec<f32>> = if misses.is_empty() {
        HashMap::new()
    } else {
        let vectors = provider.embed(&misses).await?;
        check_batch(misses.len(), &vectors)?;
        cache.insert_many(model_id, &misses, &vectors).await;
        misses.into_iter().zip(vectors).collect()
    };

    let vectors: Vec<Vec<f32>> = labels
        .iter()
        .zip(cached)
        .map(|(label, hit)| match hit {
            Some(vector) => Ok(vector),
            None => fresh.get(label).cloned().ok_or_else(|| {
                EmbeddingError::ContractViolation(format!("no vector returned for '{label}'"))
            }),
        })
        .collect::<Result<_, _>>()?;

    // Cached and fresh vectors must still agree on dimension.
    check_batch(labels.len(), &vectors)?;

    Ok(vectors)
}
