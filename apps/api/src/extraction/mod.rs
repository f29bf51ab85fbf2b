// Document text and skill-list extraction.
// Feeds the matching engine; all model calls go through llm_client.

pub mod prompts;
pub mod skill_lister;
pub mod text;
