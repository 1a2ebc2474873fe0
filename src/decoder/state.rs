use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use super::config::DecodeError;
use super::termination::TerminationReason;

pub type TokenId = u32;

/// Model-level token ids shared by every request against the same model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokens {
    pub start_token_id: TokenId,
    pub end_token_id: TokenId,
    pub pad_token_id: Option<TokenId>,
    pub vocab_size: usize,
}

impl SpecialTokens {
    pub fn context<'a>(&self, encoder_states: ArrayView2<'a, f32>) -> ScoringContext<'a> {
        ScoringContext::new(encoder_states, *self)
    }
}

/// Read-only inputs of one decode call: the encoder output for the source
/// sentence (`[source_len, hidden]`) and the vocabulary layout.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub encoder_states: ArrayView2<'a, f32>,
    pub start_token_id: TokenId,
    pub end_token_id: TokenId,
    pub vocab_size: usize,
    pub pad_token_id: Option<TokenId>,
}

impl<'a> ScoringContext<'a> {
    pub fn new(encoder_states: ArrayView2<'a, f32>, tokens: SpecialTokens) -> Self {
        Self {
            encoder_states,
            start_token_id: tokens.start_token_id,
            end_token_id: tokens.end_token_id,
            vocab_size: tokens.vocab_size,
            pad_token_id: tokens.pad_token_id,
        }
    }

    pub fn special_tokens(&self) -> SpecialTokens {
        SpecialTokens {
            start_token_id: self.start_token_id,
            end_token_id: self.end_token_id,
            pad_token_id: self.pad_token_id,
            vocab_size: self.vocab_size,
        }
    }

    /// Marian-style models reuse the pad id as decoder start, so either id
    /// being emitted means the decoder is trying to restart the sequence.
    pub fn is_start_collision(&self, token: TokenId) -> bool {
        token == self.start_token_id || self.pad_token_id == Some(token)
    }

    pub(crate) fn validate(&self) -> Result<(), DecodeError> {
        if self.vocab_size == 0 {
            return Err(DecodeError::InvalidContext(
                "vocabulary size must be positive".to_string(),
            ));
        }
        for (name, id) in [
            ("start", self.start_token_id),
            ("end", self.end_token_id),
        ] {
            if id as usize >= self.vocab_size {
                return Err(DecodeError::InvalidContext(format!(
                    "{name} token {id} is outside the vocabulary of {}",
                    self.vocab_size
                )));
            }
        }
        if self.start_token_id == self.end_token_id {
            return Err(DecodeError::InvalidContext(format!(
                "start and end token share id {}",
                self.start_token_id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationState {
    history: Vec<TokenId>,
    start_token: TokenId,
    step: usize,
}

impl GenerationState {
    pub fn new(start_token: TokenId, max_length: usize) -> Self {
        let mut history = Vec::with_capacity(max_length.saturating_add(1).min(1024));
        history.push(start_token);
        Self {
            history,
            start_token,
            step: 0,
        }
    }

    pub fn history(&self) -> &[TokenId] {
        &self.history
    }

    /// Tokens produced so far, without the leading start token.
    pub fn generated(&self) -> &[TokenId] {
        &self.history[1..]
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn last_token(&self) -> TokenId {
        self.history.last().copied().unwrap_or(self.start_token)
    }

    /// Length of the run of `token` at the tail of the history.
    pub fn trailing_run(&self, token: TokenId) -> usize {
        self.history
            .iter()
            .rev()
            .take_while(|&&t| t == token)
            .count()
    }

    pub(crate) fn push(&mut self, token: TokenId) {
        self.history.push(token);
        self.step += 1;
    }

    pub(crate) fn skip(&mut self) {
        self.step += 1;
    }

    pub(crate) fn into_result(self, reason: TerminationReason) -> DecodeResult {
        let trace_len = self.history.len();
        let mut sequence = self.history;
        sequence.remove(0);
        DecodeResult {
            sequence,
            reason,
            trace_len,
            steps: self.step,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeResult {
    pub sequence: Vec<TokenId>,
    pub reason: TerminationReason,
    /// Raw history length, start token included.
    pub trace_len: usize,
    pub steps: usize,
}
