use crate::error::DimensionMismatch;

/// Cosine similarity between two equal-length vectors, in [-1.0, 1.0].
///
/// A zero-magnitude vector yields 0.0 rather than an error: absent-content
/// embeddings must not explode downstream aggregation.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, DimensionMismatch> {
    if a.len() != b.len() {
        return Err(DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}
