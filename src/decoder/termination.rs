use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::DecodeConfig;
use super::state::{GenerationState, ScoringContext, TokenId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The model emitted the end token.
    EndToken,
    /// `max_length` steps ran before an end token appeared.
    MaxLength,
    /// The heuristics left no admissible continuation.
    ForcedStop,
}

impl TerminationReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EndToken => "end_token",
            Self::MaxLength => "max_length",
            Self::ForcedStop => "forced_stop",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the controller does with the token the selector picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Append,
    /// Consume the step without touching the history.
    Skip,
    Terminate(TerminationReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationPolicy {
    max_length: usize,
    max_consecutive_repeats: Option<usize>,
}

impl TerminationPolicy {
    pub fn new(config: &DecodeConfig) -> Self {
        Self {
            max_length: config.max_length,
            max_consecutive_repeats: config.heuristics.max_consecutive_repeats,
        }
    }

    pub fn budget_exhausted(&self, state: &GenerationState) -> Option<TerminationReason> {
        (state.step() >= self.max_length).then_some(TerminationReason::MaxLength)
    }

    pub fn admit(
        &self,
        token: TokenId,
        state: &GenerationState,
        context: &ScoringContext<'_>,
    ) -> Admission {
        if token == context.end_token_id {
            return Admission::Terminate(TerminationReason::EndToken);
        }

        if context.is_start_collision(token) {
            if context.is_start_collision(state.last_token()) {
                log::warn!(
                    "Start token {} emitted right after {} at step {}, stopping",
                    token,
                    state.last_token(),
                    state.step()
                );
                return Admission::Terminate(TerminationReason::ForcedStop);
            }
            log::debug!("Dropping start token {} at step {}", token, state.step());
            return Admission::Skip;
        }

        if let Some(limit) = self.max_consecutive_repeats {
            let run = state.trailing_run(token);
            if run >= limit {
                log::warn!(
                    "Token {} repeated {} times in a row at step {}, stopping",
                    token,
                    run + 1,
                    state.step()
                );
                return Admission::Terminate(TerminationReason::ForcedStop);
            }
        }

        Admission::Append
    }
}
