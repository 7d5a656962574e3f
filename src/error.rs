use thiserror::Error;

/// Two vectors of unequal length were handed to the similarity primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("embedding dimension mismatch: {left} vs {right}")]
pub struct DimensionMismatch {
    pub left: usize,
    pub right: usize,
}

/// Failure of a single match evaluation.
///
/// A dimension mismatch aborts the whole evaluation with the category that
/// triggered it; a silently wrong score would be worse than no score.
/// Everything else (unparseable items, absent sections) degrades to an
/// unmatched item or a zero section score and is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("{category} comparison failed: {source}")]
    Dimension {
        category: &'static str,
        #[source]
        source: DimensionMismatch,
    },
}

impl MatchError {
    pub fn dimension(category: &'static str, source: DimensionMismatch) -> Self {
        MatchError::Dimension { category, source }
    }
}
