//! Cosine similarity between two embedding vectors.

use crate::matching::MatchError;

/// Computes `dot(a, b) / (|a| * |b|)`.
///
/// Zero-magnitude vectors (including empty ones) have similarity `0.0` to
/// everything, themselves included. Accumulation happens in `f64` so the
/// result is stable regardless of the embedding's `f32` storage.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, MatchError> {
    if a.len() != b.len() {
        return Err(MatchError::InvalidInput(format!(
            "cannot compare vectors of dimension {} and {}",
            a.len(),
            b.len()
        )));
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (&x, &y) in a.iter().zip(b) {
        if !x.is_finite() || !y.is_finite() {
            return Err(MatchError::CorruptVector(
                "vector contains a non-finite component".to_string(),
            ));
        }
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}
