mod cancel;
mod config;
mod controller;
mod guard;
mod ngram;
mod oracle;
mod penalty;
mod select;
mod state;
mod termination;

pub use cancel::CancelToken;
pub use config::{ConfigError, DecodeConfig, DecodeError, HeuristicConfig, ENV_PREFIX};
pub use controller::{decode, DecodeController, DecodeStatus};
pub use guard::DegenerateTokenGuard;
pub use ngram::NgramBlocker;
pub use oracle::{InferenceError, ScoringOracle};
pub use penalty::RepetitionPenalizer;
pub use select::{rank_candidates, CandidateSelector, Selection};
pub use state::*;
pub use termination::{Admission, TerminationPolicy, TerminationReason};
