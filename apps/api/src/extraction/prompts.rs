// Skill extraction LLM prompt templates.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

pub fn skill_list_system() -> String {
    format!(
        "{JSON_ONLY_SYSTEM} You extract technical skills from resumes and job descriptions."
    )
}

pub const SKILL_LIST_PROMPT: &str = r#"From the following document, extract all technical skills: programming languages, frameworks, libraries, tools, platforms (e.g. WordPress, Excel) and development environments.

Do NOT include job titles, roles, sentences, categories or notes.
Return a single JSON array of strings on one line, for example:
["Python", "Excel", "Scikit-learn", "Power BI", "WordPress"]

DOCUMENT:
{text}"#;

pub fn candidate_name_system() -> String {
    format!("{JSON_ONLY_SYSTEM} You read resumes and identify who they belong to.")
}

pub const CANDIDATE_NAME_PROMPT: &str = r#"Identify the full name of the person this resume belongs to.

Return a single JSON object on one line: {"name": "First Last"}.
If the resume does not state a name, return {"name": null}.

RESUME:
{text}"#;
