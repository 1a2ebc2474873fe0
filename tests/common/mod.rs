#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::Array2;
use nmt_decode_lib::decoder::{
    InferenceError, ScoringContext, ScoringOracle, SpecialTokens, TokenId,
};

pub const VOCAB: usize = 32;
pub const START: TokenId = 0;
pub const END: TokenId = 1;

pub const TOKENS: SpecialTokens = SpecialTokens {
    start_token_id: START,
    end_token_id: END,
    pad_token_id: None,
    vocab_size: VOCAB,
};

pub fn encoder_states() -> Array2<f32> {
    Array2::zeros((4, 8))
}

/// Flat scores with `token` far ahead of the rest.
pub fn peaked(vocab: usize, token: TokenId) -> Vec<f32> {
    let mut scores = vec![0.0; vocab];
    scores[token as usize] = 10.0;
    scores
}

/// Emits `script[i]` on the i-th call, then the end token.
pub struct ScriptedOracle {
    script: Vec<TokenId>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new(script: &[TokenId]) -> Self {
        Self {
            script: script.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ScoringOracle for ScriptedOracle {
    fn score(
        &self,
        _history: &[TokenId],
        context: &ScoringContext<'_>,
    ) -> Result<Vec<f32>, InferenceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let token = self
            .script
            .get(call)
            .copied()
            .unwrap_or(context.end_token_id);
        Ok(peaked(context.vocab_size, token))
    }
}

/// Scores computed from the history alone.
pub struct HistoryOracle<F> {
    score_fn: F,
    calls: AtomicUsize,
}

pub fn history_oracle<F>(score_fn: F) -> HistoryOracle<F>
where
    F: Fn(&[TokenId]) -> Result<Vec<f32>, InferenceError>,
{
    HistoryOracle {
        score_fn,
        calls: AtomicUsize::new(0),
    }
}

impl<F> HistoryOracle<F> {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<F> ScoringOracle for HistoryOracle<F>
where
    F: Fn(&[TokenId]) -> Result<Vec<f32>, InferenceError>,
{
    fn score(
        &self,
        history: &[TokenId],
        _context: &ScoringContext<'_>,
    ) -> Result<Vec<f32>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.score_fn)(history)
    }
}

/// Deterministic pseudo-random scores seeded by the history, with the start
/// and end tokens pinned to negative infinity.
pub fn noisy_scores(history: &[TokenId], vocab: usize) -> Vec<f32> {
    let mut state = history.iter().fold(0x9E37_79B9_7F4A_7C15_u64, |acc, &t| {
        (acc ^ u64::from(t))
            .wrapping_mul(0x100_0000_01B3)
            .rotate_left(17)
    });
    let mut scores = Vec::with_capacity(vocab);
    for _ in 0..vocab {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        scores.push((state % 10_000) as f32 / 1_000.0);
    }
    scores[START as usize] = f32::NEG_INFINITY;
    scores[END as usize] = f32::NEG_INFINITY;
    scores
}
