use std::path::Path;

use serde::{Deserialize, Serialize};

use super::oracle::InferenceError;
use super::state::TokenId;

pub const ENV_PREFIX: &str = "DECODE_";

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),
    #[error("Invalid decode configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid scoring context: {0}")]
    InvalidContext(String),
    #[error("Decoding cancelled at step {step}")]
    Cancelled { step: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    pub repetition_penalty: f32,
    /// 0 disables blocking.
    pub no_repeat_ngram_size: usize,
    pub degenerate_token_id: Option<TokenId>,
    pub degenerate_margin: f32,
    pub max_consecutive_repeats: Option<usize>,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            repetition_penalty: 1.0,
            no_repeat_ngram_size: 0,
            degenerate_token_id: None,
            degenerate_margin: 0.0,
            max_consecutive_repeats: None,
        }
    }
}

impl HeuristicConfig {
    /// Values tuned against opus-mt-en-zh, where token 8 swamps short inputs.
    pub fn opus_mt() -> Self {
        Self {
            repetition_penalty: 1.5,
            no_repeat_ngram_size: 2,
            degenerate_token_id: Some(8),
            degenerate_margin: 2.0,
            max_consecutive_repeats: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    pub max_length: usize,
    pub heuristics: HeuristicConfig,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_length: 150,
            heuristics: HeuristicConfig::default(),
        }
    }
}

impl DecodeConfig {
    pub fn opus_mt() -> Self {
        Self {
            heuristics: HeuristicConfig::opus_mt(),
            ..Default::default()
        }
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides(ENV_PREFIX);
        config
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn apply_env_overrides(&mut self, prefix: &str) {
        self.apply_overrides(prefix, |key| std::env::var(key).ok());
    }

    pub fn apply_overrides<F>(&mut self, prefix: &str, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |suffix: &str| lookup(&format!("{prefix}{suffix}"));
        let h = &mut self.heuristics;

        if let Some(v) = read("MAX_LENGTH").and_then(|s| s.trim().parse().ok()) {
            self.max_length = v;
        }
        if let Some(v) = read("REPETITION_PENALTY").and_then(|s| s.trim().parse().ok()) {
            h.repetition_penalty = v;
        }
        if let Some(v) = read("NO_REPEAT_NGRAM_SIZE").and_then(|s| s.trim().parse().ok()) {
            h.no_repeat_ngram_size = v;
        }
        if let Some(v) = read("DEGENERATE_MARGIN").and_then(|s| s.trim().parse().ok()) {
            h.degenerate_margin = v;
        }
        if let Some(v) = read("DEGENERATE_TOKEN_ID") {
            h.degenerate_token_id = parse_optional(&v, h.degenerate_token_id);
        }
        if let Some(v) = read("MAX_CONSECUTIVE_REPEATS") {
            h.max_consecutive_repeats = parse_optional(&v, h.max_consecutive_repeats);
        }
    }

    pub fn validate(&self) -> Result<(), DecodeError> {
        let h = &self.heuristics;
        if !h.repetition_penalty.is_finite() || h.repetition_penalty <= 0.0 {
            return Err(DecodeError::InvalidConfig(format!(
                "repetition_penalty must be a positive number, got {}",
                h.repetition_penalty
            )));
        }
        if !h.degenerate_margin.is_finite() {
            return Err(DecodeError::InvalidConfig(format!(
                "degenerate_margin must be finite, got {}",
                h.degenerate_margin
            )));
        }
        if h.max_consecutive_repeats == Some(0) {
            return Err(DecodeError::InvalidConfig(
                "max_consecutive_repeats must be at least 1".to_string(),
            ));
        }
        if h.no_repeat_ngram_size == 1 {
            return Err(DecodeError::InvalidConfig(
                "no_repeat_ngram_size must be 0 (disabled) or at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

/// `none`/empty clears the value, unparsable input keeps the current one.
fn parse_optional<T: std::str::FromStr>(raw: &str, current: Option<T>) -> Option<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return None;
    }
    match trimmed.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring unparsable override value '{trimmed}'");
            current
        }
    }
}
