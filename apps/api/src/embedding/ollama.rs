//! Ollama-compatible embedding backend (`POST /api/embed`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::embedding::{check_batch, EmbeddingError, EmbeddingProvider};

const MAX_ATTEMPTS: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

/// Embeds skill labels with a model served by Ollama (default `all-minilm`,
/// the MiniLM sentence encoder).
#[derive(Clone)]
pub struct OllamaEmbedder {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: String) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: embed_endpoint(base_url),
            model,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    /// Retries connection failures and 5xx responses with exponential backoff.
    async fn embed(&self, labels: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if labels.is_empty() {
            return Ok(vec![]);
        }

        let body = EmbedRequest {
            model: &self.model,
            input: labels,
        };

        let mut last_error: Option<EmbeddingError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                // 500ms, 1s
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                warn!(
                    "Embedding attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(&self.endpoint).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(EmbeddingError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                last_error = Some(EmbeddingError::Api {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<OllamaError>(&text)
                    .map(|e| e.error)
                    .unwrap_or(text);
                return Err(EmbeddingError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: EmbedResponse = response.json().await?;
            check_batch(labels.len(), &parsed.embeddings)?;

            debug!(
                "Embedded {} labels with {} (dim={})",
                labels.len(),
                self.model,
                parsed.embeddings.first().map(Vec::len).unwrap_or(0)
            );

            return Ok(parsed.embeddings);
        }

        Err(last_error.unwrap_or_else(|| {
            EmbeddingError::ContractViolation("no embedding attempt was made".to_string())
        }))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

fn embed_endpoint(base_url: &str) -> String {
    format!("{}/api/embed", base_url.trim_end_matches('/'))
}
