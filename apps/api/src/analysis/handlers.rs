//! Axum route handlers for the Skill Gap API.

use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::analysis::pipeline::{run_analysis, run_match, Analysis, MatchOutcome};
use crate::analysis::report::{render_report, report_filename, ReportInput};
use crate::errors::AppError;
use crate::extraction::skill_lister::SkillListing;
use crate::extraction::text::{clean_text, extract_candidate_name, extract_pdf_text, MAX_TEXT_CHARS};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
    /// LLM model for this call; must be in GROQ_ALLOWED_MODELS.
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    #[serde(flatten)]
    pub listing: SkillListing,
    pub backend: String,
}

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub resume_skills: Vec<String>,
    pub jd_skills: Vec<String>,
    /// Falls back to MATCH_THRESHOLD.
    pub threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub resume_text: String,
    pub jd_text: String,
    pub threshold: Option<f64>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub text: String,
    pub candidate_name: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// Checks a requested model against the allow-list; `None` keeps the default.
fn allowed_model<'a>(
    state: &'a AppState,
    requested: Option<&'a str>,
) -> Result<Option<&'a str>, AppError> {
    let Some(model) = requested else {
        return Ok(None);
    };

    state.config.resolve_model(Some(model)).map(Some).ok_or_else(|| {
        AppError::Validation(format!(
            "Model '{model}' is not allowed; choose one of: {}",
            state.config.groq_allowed_models.join(", ")
        ))
    })
}

/// POST /api/v1/skills/extract
///
/// Lists the skills found in a single document.
pub async fn handle_extract(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let model = allowed_model(&state, request.model.as_deref())?;

    let listing = state
        .skill_lister
        .list_skills(&clean_text(&request.text, MAX_TEXT_CHARS), model)
        .await?;

    Ok(Json(ExtractResponse {
        listing,
        backend: state.skill_lister.backend().to_string(),
    }))
}

/// POST /api/v1/skills/match
///
/// Matches two already-extracted skill lists.
pub async fn handle_match(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchOutcome>, AppError> {
    let threshold = request.threshold.unwrap_or(state.config.match_threshold);

    let outcome = run_match(
        state.embedder.as_ref(),
        &state.embedding_cache,
        &request.resume_skills,
        &request.jd_skills,
        threshold,
    )
    .await?;

    Ok(Json(outcome))
}

/// POST /api/v1/skills/analyze
///
/// Full pipeline: list skills in both texts → embed → match.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<Analysis>, AppError> {
    if request.resume_text.trim().is_empty() || request.jd_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Please provide both resume_text and jd_text".to_string(),
        ));
    }

    let threshold = request.threshold.unwrap_or(state.config.match_threshold);
    let model = allowed_model(&state, request.model.as_deref())?;

    let analysis = run_analysis(
        state.skill_lister.as_ref(),
        state.embedder.as_ref(),
        &state.embedding_cache,
        &request.resume_text,
        &request.jd_text,
        threshold,
        model,
    )
    .await?;

    info!(
        "Analysis {} complete: {}%",
        analysis.analysis_id, analysis.outcome.result.score
    );

    Ok(Json(analysis))
}

/// POST /api/v1/skills/report
///
/// Renders a match result as a downloadable Markdown report.
pub async fn handle_report(Json(input): Json<ReportInput>) -> impl IntoResponse {
    let filename = report_filename(&input.candidate_name);
    let body = render_report(&input);

    (
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
}

/// POST /api/v1/resumes/upload
///
/// Accepts a multipart `file` field holding a PDF resume and returns its cleaned
/// text and the candidate's name.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("resume.pdf").to_string();
        let is_pdf = filename.to_lowercase().ends_with(".pdf")
            || field.content_type() == Some("application/pdf");
        if !is_pdf {
            return Err(AppError::UnprocessableEntity(format!(
                "Only PDF resumes are supported, got '{filename}'"
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;

        let raw = extract_pdf_text(bytes.to_vec()).await?;
        let text = clean_text(&raw, MAX_TEXT_CHARS);
        if text.is_empty() {
            return Err(AppError::UnprocessableEntity(
                "No text could be extracted from the PDF".to_string(),
            ));
        }

        let candidate_name = extract_candidate_name(&text, state.llm.as_ref()).await;

        return Ok(Json(UploadResponse {
            filename,
            candidate_name,
            text,
        }));
    }

    Err(AppError::Validation("Missing multipart field 'file'".to_string()))
}

/// DELETE /api/v1/embeddings/cache
pub async fn handle_clear_cache(State(state): State<AppState>) -> Json<Value> {
    let cleared = state.embedding_cache.clear().await;
    info!("Embedding cache cleared ({cleared} entries)");
    Json(json!({
        "cleared": cleared,
        "remaining": state.embedding_cache.len().await
    }))
}
