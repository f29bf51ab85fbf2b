//! Plain-text extraction from uploaded resumes.

use anyhow::anyhow;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::extraction::prompts::{candidate_name_system, CANDIDATE_NAME_PROMPT};
use crate::llm_client::{strip_json_fences, LlmClient};

/// Cleaned text is truncated to this many characters before skill listing.
pub const MAX_TEXT_CHARS: usize = 3000;

/// Extracts text from a PDF held in memory. Parsing runs on the blocking pool.
pub async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String, AppError> {
    let size = bytes.len();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow!("PDF extraction task failed: {e}")))?
        .map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))?;

    debug!("Extracted {} chars from {size}-byte PDF", text.len());
    Ok(text)
}

/// Collapses all whitespace runs to single spaces and keeps at most
/// `max_chars` characters.
pub fn clean_text(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(max_chars) {
        Some((cut, _)) => collapsed[..cut].to_string(),
        None => collapsed,
    }
}

/// Best-effort candidate name: the leading run of two or three capitalised
/// alphabetic words (resumes usually open with the name).
pub fn guess_candidate_name(text: &str) -> Option<String> {
    let words: Vec<&str> = text
        .split_whitespace()
        .take_while(|w| looks_like_name_part(w))
        .take(3)
        .collect();

    if words.len() >= 2 {
        Some(words.join(" "))
    } else {
        None
    }
}

/// Names longer than this are treated as the model rambling.
const MAX_NAME_WORDS: usize = 5;

#[derive(Debug, Deserialize)]
struct NameAnswer {
    name: Option<String>,
}

/// Candidate name for an uploaded resume. Asks the LLM when one is
/// configured; falls back to `guess_candidate_name` without a client, on an
/// LLM failure, or when the answer is not a usable name.
pub async fn extract_candidate_name(text: &str, llm: Option<&LlmClient>) -> Option<String> {
    let Some(llm) = llm else {
        return guess_candidate_name(text);
    };

    let prompt = CANDIDATE_NAME_PROMPT.replace("{text}", text);
    match llm.call_text(&prompt, &candidate_name_system()).await {
        Ok(output) => parse_candidate_name(&output).or_else(|| {
            debug!("LLM gave no usable name ({output}); falling back to heuristic");
            guess_candidate_name(text)
        }),
        Err(e) => {
            warn!("Candidate name extraction failed, using heuristic: {e}");
            guess_candidate_name(text)
        }
    }
}

/// Reads `{"name": ...}` from model output. `null`, blanks, placeholders
/// and anything that does not look like a personal name yield `None`.
pub fn parse_candidate_name(output: &str) -> Option<String> {
    let body = strip_json_fences(output);
    let answer: NameAnswer = serde_json::from_str(body).ok()?;
    let name = answer.name?.split_whitespace().collect::<Vec<_>>().join(" ");

    let word_count = name.split(' ').count();
    let placeholder = ["unknown", "n/a", "none", "null"].contains(&name.to_lowercase().as_str());
    let plausible = name.chars().all(|c| c.is_alphabetic() || " -'.".contains(c));

    if name.is_empty() || placeholder || !plausible || word_count > MAX_NAME_WORDS {
        None
    } else {
        Some(name)
    }
}

fn looks_like_name_part(word: &str) -> bool {
    let mut chars = word.chars();
    chars.next().is_some_and(char::is_uppercase)
        && chars.all(|c| c.is_alphabetic() || c == '-' || c == '\'' || c == '.')
}
