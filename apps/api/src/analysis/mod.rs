// Skill Gap Analysis
// Orchestrates extraction, embedding (with cache) and matching; renders reports.
// The matcher itself stays pure; everything with I/O lives here.

pub mod handlers;
pub mod pipeline;
pub mod report;
