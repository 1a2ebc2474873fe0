use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decoder::{SpecialTokens, TokenId};

pub const CONFIG_FILE: &str = "config.json";

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed model config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Model file not found: {0}")]
    ModelNotFound(String),
    #[error("Model has no outputs: {0}")]
    NoOutputs(String),
}

impl ModelError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ModelNotFound(_) | Self::NoOutputs(_) => {
                "Translation model files are missing or incomplete. Check the model folder."
            }
            Self::Json(_) => "The model configuration could not be read.",
            Self::Ort(_) => {
                "The translation engine failed to start. Check the ONNX Runtime installation."
            }
            Self::Io(_) => "The model folder could not be read. Check permissions.",
        }
    }
}

/// Subset of a HuggingFace `config.json` the decoder needs. Defaults match
/// opus-mt-en-zh, whose pad id doubles as the decoder start token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub decoder_start_token_id: TokenId,
    pub eos_token_id: TokenId,
    pub pad_token_id: Option<TokenId>,
    pub vocab_size: usize,
    pub max_length: Option<usize>,
    pub max_position_embeddings: Option<usize>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            decoder_start_token_id: 65000,
            eos_token_id: 0,
            pad_token_id: Some(65000),
            vocab_size: 65001,
            max_length: None,
            max_position_embeddings: None,
        }
    }
}

impl ModelConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn from_model_dir<P: AsRef<Path>>(model_dir: P) -> Result<Self, ModelError> {
        let path = model_dir.as_ref().join(CONFIG_FILE);
        if path.exists() {
            return Self::load(path);
        }
        log::warn!(
            "No {} under {}, using opus-mt defaults",
            CONFIG_FILE,
            model_dir.as_ref().display()
        );
        Ok(Self::default())
    }

    pub fn special_tokens(&self) -> SpecialTokens {
        SpecialTokens {
            start_token_id: self.decoder_start_token_id,
            end_token_id: self.eos_token_id,
            pad_token_id: self.pad_token_id,
            vocab_size: self.vocab_size,
        }
    }

    /// Longest output the model was trained for, if it says.
    pub fn generation_limit(&self) -> Option<usize> {
        self.max_length.or(self.max_position_embeddings)
    }
}
