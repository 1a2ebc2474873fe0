use std::time::Instant;

use super::cancel::CancelToken;
use super::config::{DecodeConfig, DecodeError};
use super::oracle::{InferenceError, ScoringOracle};
use super::select::{CandidateSelector, Selection};
use super::state::{DecodeResult, GenerationState, ScoringContext};
use super::termination::{Admission, TerminationPolicy, TerminationReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    Running,
    Completed(TerminationReason),
}

impl DecodeStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Drives one greedy decode: query the oracle, pick a token, admit or stop.
pub struct DecodeController<'a, O: ScoringOracle + ?Sized> {
    oracle: &'a O,
    context: ScoringContext<'a>,
    selector: CandidateSelector,
    policy: TerminationPolicy,
    state: GenerationState,
    status: DecodeStatus,
    cancel: Option<&'a CancelToken>,
}

impl<'a, O: ScoringOracle + ?Sized> DecodeController<'a, O> {
    pub fn new(
        oracle: &'a O,
        context: ScoringContext<'a>,
        config: &DecodeConfig,
    ) -> Result<Self, DecodeError> {
        config.validate()?;
        context.validate()?;

        Ok(Self {
            oracle,
            context,
            selector: CandidateSelector::new(&config.heuristics),
            policy: TerminationPolicy::new(config),
            state: GenerationState::new(context.start_token_id, config.max_length),
            status: DecodeStatus::Running,
            cancel: None,
        })
    }

    pub fn with_cancel_token(mut self, token: &'a CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    /// Advances by one step. Once completed, further calls return the same
    /// terminal status without touching the oracle.
    pub fn step(&mut self) -> Result<DecodeStatus, DecodeError> {
        if self.status.is_completed() {
            return Ok(self.status);
        }
        if self.cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(DecodeError::Cancelled {
                step: self.state.step(),
            });
        }
        if let Some(reason) = self.policy.budget_exhausted(&self.state) {
            return Ok(self.complete(reason));
        }

        let mut scores = self.query_scores()?;
        let token = match self.selector.select(&mut scores, self.state.history()) {
            Selection::Token(token) => token,
            Selection::ForcedStop => {
                log::warn!(
                    "No admissible continuation at step {}, stopping",
                    self.state.step()
                );
                return Ok(self.complete(TerminationReason::ForcedStop));
            }
        };

        match self.policy.admit(token, &self.state, &self.context) {
            Admission::Append => self.state.push(token),
            Admission::Skip => self.state.skip(),
            Admission::Terminate(reason) => return Ok(self.complete(reason)),
        }
        Ok(self.status)
    }

    pub fn run(mut self) -> Result<DecodeResult, DecodeError> {
        let start = Instant::now();
        loop {
            if let DecodeStatus::Completed(reason) = self.step()? {
                let result = self.state.into_result(reason);
                log::debug!(
                    "Decode finished in {:?} (steps: {}, tokens: {}, reason: {})",
                    start.elapsed(),
                    result.steps,
                    result.sequence.len(),
                    reason
                );
                return Ok(result);
            }
        }
    }

    fn query_scores(&self) -> Result<Vec<f32>, DecodeError> {
        let mut scores = self.oracle.score(self.state.history(), &self.context)?;
        let vocab_size = self.context.vocab_size;
        if scores.len() < vocab_size {
            return Err(InferenceError::ScoreLength {
                expected: vocab_size,
                actual: scores.len(),
            }
            .into());
        }
        scores.truncate(vocab_size);
        Ok(scores)
    }

    fn complete(&mut self, reason: TerminationReason) -> DecodeStatus {
        self.status = DecodeStatus::Completed(reason);
        self.status
    }
}

pub fn decode<'a, O: ScoringOracle + ?Sized>(
    oracle: &'a O,
    context: ScoringContext<'a>,
    config: &DecodeConfig,
) -> Result<DecodeResult, DecodeError> {
    DecodeController::new(oracle, context, config)?.run()
}
