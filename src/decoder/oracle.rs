use ndarray::ShapeError;

use super::state::{ScoringContext, TokenId};

#[derive(thiserror::Error, Debug)]
pub enum InferenceError {
    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),
    #[error("ndarray shape error: {0}")]
    Shape(#[from] ShapeError),
    #[error("Model input not found: {0}")]
    InputNotFound(String),
    #[error("Model output not found: {0}")]
    OutputNotFound(String),
    #[error("Score vector has {actual} entries, expected {expected}")]
    ScoreLength { expected: usize, actual: usize },
    #[error("Model session is poisoned by an earlier panic")]
    LockPoisoned,
    #[error("Inference backend failed: {0}")]
    Backend(String),
}

/// Next-token scorer consulted once per decoding step.
///
/// Implementations must return the same scores for the same `history` and
/// context; whether they cache decoder state between calls is their own
/// business. The returned vector holds one score per vocabulary id, higher
/// meaning more likely.
pub trait ScoringOracle {
    fn score(
        &self,
        history: &[TokenId],
        context: &ScoringContext<'_>,
    ) -> Result<Vec<f32>, InferenceError>;
}

impl<F> ScoringOracle for F
where
    F: Fn(&[TokenId], &ScoringContext<'_>) -> Result<Vec<f32>, InferenceError>,
{
    fn score(
        &self,
        history: &[TokenId],
        context: &ScoringContext<'_>,
    ) -> Result<Vec<f32>, InferenceError> {
        self(history, context)
    }
}
