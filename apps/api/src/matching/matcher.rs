//! Greedy nearest-neighbour matcher between resume skills and JD skills.
//!
//! Algorithm, for each JD skill in input order:
//! 1. score it against every resume skill vector (cosine similarity)
//! 2. keep the strictly best resume skill; the running best starts at 0.0
//!    with no label, so the earliest index wins ties
//! 3. best ≥ threshold → `MatchRecord`, otherwise the JD skill is missing
//!
//! One resume skill may satisfy several JD skills; no one-to-one assignment
//! is attempted. "Additional" skills are computed by exact label membership,
//! not by similarity, so a semantically matched resume skill can still be
//! listed as additional when its spelling differs from every JD label.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::matching::similarity::cosine_similarity;
use crate::matching::MatchError;

/// Minimum similarity for a JD skill to count as covered.
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// A JD skill together with the resume skill that covers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub jd_skill: String,
    /// `None` only when no resume skill scored above 0.0 and the threshold is 0.
    pub resume_skill: Option<String>,
    /// Rounded to 3 decimal places.
    pub similarity: f64,
}

/// Output of one matching pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub matched: Vec<MatchRecord>,
    pub missing: Vec<String>,
    pub additional: Vec<String>,
    /// Percentage of JD skills matched, 0–100, rounded to 2 decimal places.
    pub score: f64,
}

/// Classifies every JD skill as matched or missing and every resume skill
/// absent from the JD labels as additional.
pub fn find_matches(
    resume_skills: &[String],
    jd_skills: &[String],
    resume_vecs: &[Vec<f32>],
    jd_vecs: &[Vec<f32>],
    threshold: f64,
) -> Result<MatchResult, MatchError> {
    validate_inputs(resume_skills, jd_skills, resume_vecs, jd_vecs, threshold)?;

    let additional = additional_skills(resume_skills, jd_skills);

    if jd_skills.is_empty() {
        return Ok(MatchResult {
            matched: vec![],
            missing: vec![],
            additional,
            score: 0.0,
        });
    }

    let mut matched = Vec::new();
    let mut missing = Vec::new();

    for (jd_skill, jd_vec) in jd_skills.iter().zip(jd_vecs) {
        let mut best_sim = 0.0_f64;
        let mut best_resume_skill: Option<&String> = None;

        for (resume_skill, resume_vec) in resume_skills.iter().zip(resume_vecs) {
            let sim = cosine_similarity(resume_vec, jd_vec)?;
            if sim > best_sim {
                best_sim = sim;
                best_resume_skill = Some(resume_skill);
            }
        }

        if best_sim >= threshold {
            matched.push(MatchRecord {
                jd_skill: jd_skill.clone(),
                resume_skill: best_resume_skill.cloned(),
                similarity: round_to(best_sim, 3),
            });
        } else {
            missing.push(jd_skill.clone());
        }
    }

    let score = round_to(matched.len() as f64 / jd_skills.len() as f64 * 100.0, 2);

    Ok(MatchResult {
        matched,
        missing,
        additional,
        score,
    })
}

fn validate_inputs(
    resume_skills: &[String],
    jd_skills: &[String],
    resume_vecs: &[Vec<f32>],
    jd_vecs: &[Vec<f32>],
    threshold: f64,
) -> Result<(), MatchError> {
    if resume_skills.len() != resume_vecs.len() {
        return Err(MatchError::InvalidInput(format!(
            "{} resume skills but {} resume vectors",
            resume_skills.len(),
            resume_vecs.len()
        )));
    }
    if jd_skills.len() != jd_vecs.len() {
        return Err(MatchError::InvalidInput(format!(
            "{} JD skills but {} JD vectors",
            jd_skills.len(),
            jd_vecs.len()
        )));
    }
    validate_threshold(threshold)
}

/// Rejects thresholds outside [0, 1] (NaN included).
pub fn validate_threshold(threshold: f64) -> Result<(), MatchError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(MatchError::InvalidInput(format!(
            "threshold must be within [0, 1], got {threshold}"
        )));
    }
    Ok(())
}

/// Resume skills whose exact label does not appear among the JD labels.
fn additional_skills(resume_skills: &[String], jd_skills: &[String]) -> Vec<String> {
    let jd_labels: HashSet<&str> = jd_skills.iter().map(String::as_str).collect();
    resume_skills
        .iter()
        .filter(|skill| !jd_labels.contains(skill.as_str()))
        .cloned()
        .collect()
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}
