//! Markdown skill gap report, ready for download.

use serde::{Deserialize, Serialize};

use crate::matching::matcher::MatchResult;

const PROGRESS_CELLS: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInput {
    pub candidate_name: String,
    pub resume_skills: Vec<String>,
    pub jd_skills: Vec<String>,
    pub result: MatchResult,
}

pub fn render_report(input: &ReportInput) -> String {
    let result = &input.result;
    let matched: Vec<String> = result.matched.iter().map(|m| m.jd_skill.clone()).collect();

    let mut doc = String::new();
    doc.push_str("# AI Resume Skill Extractor Report\n\n");
    doc.push_str(&format!("_{}_\n\n---\n\n", input.candidate_name));
    doc.push_str(&format!("## Match Score: {}%\n\n", result.score));
    doc.push_str(&format!("`{}`\n\n", progress_bar(result.score)));

    push_section(&mut doc, "Resume Skills", &input.resume_skills, "");
    push_section(&mut doc, "Job Description Skills", &input.jd_skills, "");
    push_section(&mut doc, "Matched Skills", &matched, "");
    push_section(&mut doc, "Missing Skills", &result.missing, "None");
    push_section(
        &mut doc,
        "Additional Skills in Resume",
        &result.additional,
        "None",
    );

    doc
}

fn push_section(doc: &mut String, title: &str, skills: &[String], if_empty: &str) {
    let body = if skills.is_empty() {
        if_empty.to_string()
    } else {
        skills.join(", ")
    };
    doc.push_str(&format!("### {title}:\n\n{body}\n\n"));
}

/// `[#########---------------------]`, one cell per 1/30th of the score.
fn progress_bar(score: f64) -> String {
    let filled = ((score.clamp(0.0, 100.0) / 100.0) * PROGRESS_CELLS as f64).round() as usize;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(PROGRESS_CELLS - filled)
    )
}

/// `{candidate}_resume_skill_report.md`, with the name reduced to filename-safe characters.
pub fn report_filename(candidate_name: &str) -> String {
    let safe: String = candidate_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = if safe.is_empty() { "candidate".to_string() } else { safe };
    format!("{safe}_resume_skill_report.md")
}
