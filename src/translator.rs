use std::time::Instant;

use ndarray::Array2;
use serde::Serialize;

use crate::codec::{normalize_whitespace, TextCodec};
use crate::decoder::{
    CancelToken, DecodeConfig, DecodeController, InferenceError, ScoringOracle, SpecialTokens,
    TerminationReason, TokenId,
};
use crate::error::TranslateError;

/// Encoder/decoder model: a source encoder plus a next-token scorer over its
/// hidden states.
pub trait Seq2SeqModel: ScoringOracle {
    fn special_tokens(&self) -> SpecialTokens;

    /// Longest output the model supports, if it declares one.
    fn generation_limit(&self) -> Option<usize> {
        None
    }

    /// Returns encoder hidden states shaped `[source_len, hidden]`.
    fn encode(&self, input_ids: &[TokenId]) -> Result<Array2<f32>, InferenceError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    pub text: String,
    pub tokens: Vec<TokenId>,
    pub reason: TerminationReason,
    pub steps: usize,
}

pub struct Translator<M, C> {
    model: M,
    codec: C,
    config: DecodeConfig,
}

impl<M: Seq2SeqModel, C: TextCodec> Translator<M, C> {
    /// `config.max_length` is capped at the model's own generation limit.
    pub fn new(model: M, codec: C, mut config: DecodeConfig) -> Result<Self, TranslateError> {
        config.validate()?;
        if let Some(limit) = model.generation_limit() {
            if config.max_length > limit {
                log::info!(
                    "Capping max_length {} to the model limit {}",
                    config.max_length,
                    limit
                );
                config.max_length = limit;
            }
        }
        Ok(Self {
            model,
            codec,
            config,
        })
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    pub fn translate(&self, text: &str) -> Result<Translation, TranslateError> {
        self.run(text, None)
    }

    pub fn translate_with_cancel(
        &self,
        text: &str,
        cancel: &CancelToken,
    ) -> Result<Translation, TranslateError> {
        self.run(text, Some(cancel))
    }

    fn run(&self, text: &str, cancel: Option<&CancelToken>) -> Result<Translation, TranslateError> {
        let start = Instant::now();
        let input = normalize_whitespace(text);
        if input.is_empty() {
            return Err(TranslateError::EmptyInput);
        }

        let tokens = self.model.special_tokens();
        let mut source_ids = self.codec.encode(&input)?;
        if source_ids.last() != Some(&tokens.end_token_id) {
            source_ids.push(tokens.end_token_id);
        }
        log::debug!("Source: {} chars -> {} tokens", input.len(), source_ids.len());

        let hidden = self.model.encode(&source_ids)?;
        let context = tokens.context(hidden.view());
        let mut controller = DecodeController::new(&self.model, context, &self.config)?;
        if let Some(token) = cancel {
            controller = controller.with_cancel_token(token);
        }
        let result = controller.run()?;

        match result.reason {
            TerminationReason::MaxLength => log::warn!(
                "Translation truncated at max_length={} ({} tokens)",
                self.config.max_length,
                result.sequence.len()
            ),
            TerminationReason::ForcedStop => log::warn!(
                "Translation stopped early after {} steps ({} tokens)",
                result.steps,
                result.sequence.len()
            ),
            TerminationReason::EndToken => {}
        }

        let output = self.codec.decode(&result.sequence)?;
        if output.is_empty() {
            return Err(TranslateError::EmptyOutput(result.reason));
        }

        log::info!(
            "Translated {} chars -> {} chars in {:?} ({})",
            input.chars().count(),
            output.chars().count(),
            start.elapsed(),
            result.reason
        );
        Ok(Translation {
            text: output,
            tokens: result.sequence,
            reason: result.reason,
            steps: result.steps,
        })
    }
}
