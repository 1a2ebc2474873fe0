use std::cmp::Ordering;

use super::config::HeuristicConfig;
use super::guard::DegenerateTokenGuard;
use super::ngram::NgramBlocker;
use super::penalty::RepetitionPenalizer;
use super::state::TokenId;

const TRACE_TOP_K: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Token(TokenId),
    /// Every ranked candidate would repeat an n-gram.
    ForcedStop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSelector {
    penalizer: RepetitionPenalizer,
    guard: DegenerateTokenGuard,
    blocker: NgramBlocker,
}

impl CandidateSelector {
    pub fn new(config: &HeuristicConfig) -> Self {
        Self {
            penalizer: RepetitionPenalizer::new(config.repetition_penalty),
            guard: DegenerateTokenGuard::new(config.degenerate_token_id, config.degenerate_margin),
            blocker: NgramBlocker::new(config.no_repeat_ngram_size),
        }
    }

    /// Picks the next token. `scores` is penalized in place.
    pub fn select(&self, scores: &mut [f32], history: &[TokenId]) -> Selection {
        self.penalizer.apply(scores, history);
        let ranked = rank_candidates(scores);
        if ranked.is_empty() {
            return Selection::ForcedStop;
        }
        log::trace!(
            "Top candidates after penalty: {:?}",
            &ranked[..ranked.len().min(TRACE_TOP_K)]
        );

        let (token, _) = ranked[self.guard.pick(&ranked)];
        if !self.blocker.is_blocked(history, token) {
            return Selection::Token(token);
        }

        // The arg-max is never revisited, even when the guard moved off it.
        let fallback = ranked
            .iter()
            .skip(1)
            .map(|&(candidate, _)| candidate)
            .find(|&candidate| !self.blocker.is_blocked(history, candidate));

        match fallback {
            Some(candidate) => {
                log::debug!("Token {} repeats an n-gram, falling back to {}", token, candidate);
                Selection::Token(candidate)
            }
            None => Selection::ForcedStop,
        }
    }
}

/// All ids ordered by descending score. Ties keep the lower id first and
/// NaN ranks as negative infinity.
pub fn rank_candidates(scores: &[f32]) -> Vec<(TokenId, f32)> {
    let mut ranked: Vec<(TokenId, f32)> = scores
        .iter()
        .enumerate()
        .map(|(idx, &score)| {
            let score = if score.is_nan() { f32::NEG_INFINITY } else { score };
            (idx as TokenId, score)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked
}
