// Skill Matching Engine
// Pure, synchronous scoring of resume skills against JD skills over embedding vectors.
// No I/O and no shared state here; embedding and caching live in `embedding`.

pub mod matcher;
pub mod similarity;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    /// Caller bug: mismatched lengths or dimensions, or a threshold outside [0, 1].
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Corrupt embedding vector: {0}")]
    CorruptVector(String),
}
