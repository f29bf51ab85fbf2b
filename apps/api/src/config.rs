use std::num::NonZeroUsize;

use anyhow::{bail, Context, Result};

use crate::llm_client::DEFAULT_MODEL;
use crate::matching::matcher::DEFAULT_THRESHOLD;

/// Models a request may pick when `GROQ_ALLOWED_MODELS` is unset.
pub const DEFAULT_ALLOWED_MODELS: &str = "llama-3.1-8b-instant,mixtral-8x7b-32768";

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unset → the offline keyword skill lister is used.
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    /// Models a request may select per call; always contains `groq_model`.
    pub groq_allowed_models: Vec<String>,
    pub embedding_url: String,
    pub embedding_model: String,
    pub match_threshold: f64,
    pub embedding_cache_capacity: NonZeroUsize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let match_threshold = var("MATCH_THRESHOLD", &DEFAULT_THRESHOLD.to_string())
            .parse::<f64>()
            .context("MATCH_THRESHOLD must be a number")?;
        if !(0.0..=1.0).contains(&match_threshold) {
            bail!("MATCH_THRESHOLD must be within [0, 1], got {match_threshold}");
        }

        let groq_model = var("GROQ_MODEL", DEFAULT_MODEL);
        let mut groq_allowed_models: Vec<String> =
            var("GROQ_ALLOWED_MODELS", DEFAULT_ALLOWED_MODELS)
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
        if !groq_allowed_models.contains(&groq_model) {
            groq_allowed_models.insert(0, groq_model.clone());
        }

        Ok(Config {
            groq_api_key: lookup("GROQ_API_KEY").filter(|k| !k.trim().is_empty()),
            groq_model,
            groq_allowed_models,
            embedding_url: var("EMBEDDING_URL", "http://localhost:11434"),
            embedding_model: var("EMBEDDING_MODEL", "all-minilm"),
            match_threshold,
            embedding_cache_capacity: var("EMBEDDING_CACHE_CAPACITY", "10000")
                .parse::<NonZeroUsize>()
                .context("EMBEDDING_CACHE_CAPACITY must be a positive integer")?,
            port: var("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG", "info"),
        })
    }

    /// Resolves a per-request model choice: `None` means the configured default.
    /// Returns `None` when the requested model is not allowed.
    pub fn resolve_model<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        match requested.map(str::trim) {
            None | Some("") => Some(self.groq_model.as_str()),
            Some(model) => self
                .groq_allowed_models
                .iter()
                .any(|allowed| allowed == model)
                .then_some(model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert!(config.groq_api_key.is_none());
        assert_eq!(config.groq_model, "llama-3.1-8b-instant");
        assert_eq!(config.embedding_url, "http://localhost:11434");
        assert_eq!(config.embedding_model, "all-minilm");
        assert_eq!(config.match_threshold, 0.7);
        assert_eq!(
            config.groq_allowed_models,
            vec!["llama-3.1-8b-instant", "mixtral-8x7b-32768"]
        );
        assert_eq!(config.embedding_cache_capacity.get(), 10_000);
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("GROQ_API_KEY", "gsk_test"),
            ("MATCH_THRESHOLD", "0.55"),
            ("PORT", "3000"),
        ])
        .unwrap();
        assert_eq!(config.groq_api_key.as_deref(), Some("gsk_test"));
        assert_eq!(config.match_threshold, 0.55);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        let config = config_from(&[("GROQ_API_KEY", "  ")]).unwrap();
        assert!(config.groq_api_key.is_none());
    }

    #[test]
    fn test_threshold_out_of_range_fails() {
        assert!(config_from(&[("MATCH_THRESHOLD", "1.2")]).is_err());
        assert!(config_from(&[("MATCH_THRESHOLD", "high")]).is_err());
    }

    #[test]
    fn test_invalid_port_fails() {
        assert!(config_from(&[("PORT", "99999")]).is_err());
    }

    #[test]
    fn test_zero_cache_capacity_fails() {
        assert!(config_from(&[("EMBEDDING_CACHE_CAPACITY", "0")]).is_err());
        assert!(config_from(&[("EMBEDDING_CACHE_CAPACITY", "-5")]).is_err());
    }

    #[test]
    fn test_allowed_models_always_include_default() {
        let config = config_from(&[
            ("GROQ_MODEL", "llama-3.3-70b-versatile"),
            ("GROQ_ALLOWED_MODELS", " gemma2-9b-it , ,mixtral-8x7b-32768"),
        ])
        .unwrap();
        assert_eq!(
            config.groq_allowed_models,
            vec!["llama-3.3-70b-versatile", "gemma2-9b-it", "mixtral-8x7b-32768"]
        );
    }

    #[test]
    fn test_resolve_model() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.resolve_model(None), Some("llama-3.1-8b-instant"));
        assert_eq!(config.resolve_model(Some("  ")), Some("llama-3.1-8b-instant"));
        assert_eq!(
            config.resolve_model(Some("mixtral-8x7b-32768")),
            Some("mixtral-8x7b-32768")
        );
        assert_eq!(config.resolve_model(Some("gpt-4o")), None);
    }
}
