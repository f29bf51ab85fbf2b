//! Skill Lister — turns plain document text into a list of skill labels.
//!
//! Default: `KeywordSkillLister` (offline vocabulary scan, deterministic).
//! With `GROQ_API_KEY` set: `LlmSkillLister` (model-backed, open vocabulary).
//!
//! `AppState` holds an `Arc<dyn SkillLister>`, chosen at startup via config.
//! A request may name an allowed LLM model; backends without a model ignore it.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::extraction::prompts::{skill_list_system, SKILL_LIST_PROMPT};
use crate::llm_client::{strip_json_fences, LlmClient};

// ────────────────────────────────────────────────────────────────────────────
// Output data model
// ────────────────────────────────────────────────────────────────────────────

/// Outcome of listing skills. `ParseFailed` (the model answered, but not with
/// a skill list) is kept distinct from `Empty` (no skills in the document).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SkillListing {
    Found { skills: Vec<String> },
    Empty,
    ParseFailed { raw_output: String },
}

impl SkillListing {
    /// Normalizes `labels` and wraps them as `Found`, or `Empty` if none survive.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let skills = normalize_labels(labels);
        if skills.is_empty() {
            SkillListing::Empty
        } else {
            SkillListing::Found { skills }
        }
    }
}

/// Trims labels, drops empty ones and removes case-insensitive duplicates,
/// keeping the first spelling seen.
pub fn normalize_labels<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    labels
        .into_iter()
        .filter_map(|label| {
            let trimmed = label.as_ref().trim();
            if trimmed.is_empty() || !seen.insert(trimmed.to_lowercase()) {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait SkillLister: Send + Sync {
    /// `model` overrides the configured LLM model for this call only.
    async fn list_skills(&self, text: &str, model: Option<&str>)
        -> Result<SkillListing, AppError>;

    /// "keyword" | "llm" — reported to callers for transparency.
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordSkillLister
// ────────────────────────────────────────────────────────────────────────────

/// Canonical spellings recognised by the keyword lister. Matching is
/// case-insensitive and requires a non-alphanumeric boundary on both sides,
/// so "Java" does not fire inside "JavaScript" nor "SQL" inside "PostgreSQL".
const SKILL_VOCABULARY: &[&str] = &[
    // Languages
    "Python", "Java", "JavaScript", "TypeScript", "C++", "C#", "Rust", "Golang", "Kotlin",
    "Swift", "Scala", "Ruby", "PHP", "Perl", "MATLAB", "Bash", "PowerShell", "SQL", "HTML",
    "CSS", "Dart", "Haskell", "Elixir",
    // Frameworks and libraries
    "React", "Angular", "Vue.js", "Next.js", "Node.js", "Express", "Django", "Flask",
    "FastAPI", "Spring Boot", "Ruby on Rails", ".NET", "Tokio", "Axum", "jQuery",
    "TensorFlow", "PyTorch", "Keras", "Scikit-learn", "Pandas", "NumPy", "Matplotlib",
    "Hugging Face", "LangChain", "Spark", "Hadoop", "Airflow", "Kafka", "GraphQL",
    // Data stores
    "PostgreSQL", "MySQL", "SQLite", "MongoDB", "Redis", "Elasticsearch", "Cassandra",
    "DynamoDB", "Snowflake", "BigQuery",
    // Platforms and tooling
    "AWS", "Azure", "GCP", "Docker", "Kubernetes", "Terraform", "Ansible", "Jenkins",
    "GitHub Actions", "Git", "Linux", "Nginx", "REST", "gRPC", "CI/CD", "Excel", "Power BI",
    "Tableau", "WordPress", "Jira", "Figma", "Postman", "Jupyter", "VS Code",
    // Practices
    "Machine Learning", "Deep Learning", "NLP", "Computer Vision", "Data Analysis",
    "Microservices", "Agile", "Scrum",
];

/// Offline, deterministic lister. Returns vocabulary labels in order of
/// first appearance in the text.
pub struct KeywordSkillLister;

#[async_trait]
impl SkillLister for KeywordSkillLister {
    async fn list_skills(
        &self,
        text: &str,
        _model: Option<&str>,
    ) -> Result<SkillListing, AppError> {
        Ok(SkillListing::from_labels(scan_vocabulary(text)))
    }

    fn backend(&self) -> &'static str {
        "keyword"
    }
}

fn scan_vocabulary(text: &str) -> Vec<&'static str> {
    let haystack = text.to_lowercase();

    let mut found: Vec<(usize, &'static str)> = SKILL_VOCABULARY
        .iter()
        .filter_map(|&skill| {
            first_bounded_match(&haystack, &skill.to_lowercase()).map(|pos| (pos, skill))
        })
        .collect();

    found.sort_by_key(|&(pos, _)| pos);
    found.into_iter().map(|(_, skill)| skill).collect()
}

/// Byte offset of the first occurrence of `needle` not glued to an
/// alphanumeric character on either side.
fn first_bounded_match(haystack: &str, needle: &str) -> Option<usize> {
    haystack.match_indices(needle).map(|(pos, _)| pos).find(|&pos| {
        let before = haystack[..pos].chars().next_back();
        let after = haystack[pos + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

// ────────────────────────────────────────────────────────────────────────────
// LlmSkillLister
// ────────────────────────────────────────────────────────────────────────────

/// Model-backed lister. An unparsable answer becomes `ParseFailed` instead
/// of an empty list.
pub struct LlmSkillLister(pub LlmClient);

#[async_trait]
impl SkillLister for LlmSkillLister {
    async fn list_skills(
        &self,
        text: &str,
        model: Option<&str>,
    ) -> Result<SkillListing, AppError> {
        let client = match model {
            Some(model) if model != self.0.model() => self.0.with_model(model),
            _ => self.0.clone(),
        };

        let prompt = SKILL_LIST_PROMPT.replace("{text}", text);
        let output = client
            .call_text(&prompt, &skill_list_system())
            .await
            .map_err(|e| AppError::Llm(format!("Skill listing failed: {e}")))?;

        let listing = parse_skill_list(&output);
        if let SkillListing::ParseFailed { raw_output } = &listing {
            warn!("Could not parse skill list from {}: {raw_output}", client.model());
        }
        Ok(listing)
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

/// Parses model output into a listing. Accepts the whole (fence-stripped)
/// output, its first line, or the outermost `[...]` span as a JSON array;
/// non-string elements are ignored.
pub fn parse_skill_list(output: &str) -> SkillListing {
    let body = strip_json_fences(output);

    let first_line = body.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let bracketed = match (body.find('['), body.rfind(']')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => "",
    };

    for candidate in [body, first_line, bracketed] {
        if let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(candidate.trim()) {
            return SkillListing::from_labels(values.iter().filter_map(|v| v.as_str()));
        }
    }

    SkillListing::ParseFailed {
        raw_output: output.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
