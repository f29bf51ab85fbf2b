//! Skill gap pipeline: texts → skill lists → cached embeddings → matcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::embedding::cache::{embed_labels, EmbeddingCache};
use crate::embedding::EmbeddingProvider;
use crate::errors::AppError;
use crate::extraction::skill_lister::{SkillLister, SkillListing};
use crate::extraction::text::{clean_text, MAX_TEXT_CHARS};
use crate::matching::matcher::{find_matches, validate_threshold, MatchResult};

/// A match result plus the parameters that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub result: MatchResult,
    pub threshold: f64,
    pub embedding_model: String,
}

/// Full analysis of one resume against one job description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub analysis_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub resume_skills: Vec<String>,
    pub jd_skills: Vec<String>,
    pub skill_lister: String,
    #[serde(flatten)]
    pub outcome: MatchOutcome,
}

/// Embeds both skill lists (one provider call for all cache misses) and runs the matcher.
pub async fn run_match(
    embedder: &dyn EmbeddingProvider,
    cache: &EmbeddingCache,
    resume_skills: &[String],
    jd_skills: &[String],
    threshold: f64,
) -> Result<MatchOutcome, AppError> {
    validate_threshold(threshold)?;

    let all_labels: Vec<String> = resume_skills.iter().chain(jd_skills).cloned().collect();
    let mut resume_vecs = embed_labels(embedder, cache, &all_labels).await?;
    let jd_vecs = resume_vecs.split_off(resume_skills.len());

    let result = find_matches(resume_skills, jd_skills, &resume_vecs, &jd_vecs, threshold)?;

    info!(
        "Matched {}/{} JD skills (score {}%, {} additional)",
        result.matched.len(),
        jd_skills.len(),
        result.score,
        result.additional.len()
    );

    Ok(MatchOutcome {
        result,
        threshold,
        embedding_model: embedder.model_id().to_string(),
    })
}

/// Lists skills in both documents, then matches them. `model` overrides the
/// lister's default LLM model for this call.
pub async fn run_analysis(
    lister: &dyn SkillLister,
    embedder: &dyn EmbeddingProvider,
    cache: &EmbeddingCache,
    resume_text: &str,
    jd_text: &str,
    threshold: f64,
    model: Option<&str>,
) -> Result<Analysis, AppError> {
    validate_threshold(threshold)?;

    let resume_listing = lister
        .list_skills(&clean_text(resume_text, MAX_TEXT_CHARS), model)
        .await?;
    let jd_listing = lister
        .list_skills(&clean_text(jd_text, MAX_TEXT_CHARS), model)
        .await?;

    let resume_skills = listing_into_skills(resume_listing, "resume")?;
    let jd_skills = listing_into_skills(jd_listing, "job description")?;

    let outcome = run_match(embedder, cache, &resume_skills, &jd_skills, threshold).await?;

    Ok(Analysis {
        analysis_id: Uuid::new_v4(),
        created_at: Utc::now(),
        resume_skills,
        jd_skills,
        skill_lister: lister.backend().to_string(),
        outcome,
    })
}

fn listing_into_skills(listing: SkillListing, document: &str) -> Result<Vec<String>, AppError> {
    match listing {
        SkillListing::Found { skills } => Ok(skills),
        SkillListing::Empty => Ok(vec![]),
        SkillListing::ParseFailed { .. } => Err(AppError::UnprocessableEntity(format!(
            "Could not parse a skill list for the {document}"
        ))),
    }
}
