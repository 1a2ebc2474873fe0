use thiserror::Error;

use crate::codec::CodecError;
use crate::decoder::{ConfigError, DecodeError, InferenceError, TerminationReason};
use crate::onnx::ModelError;

/// Errors surfaced by a translation request.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("Decode: {0}")]
    Decode(#[from] DecodeError),

    #[error("Inference: {0}")]
    Inference(#[from] InferenceError),

    #[error("Codec: {0}")]
    Codec(#[from] CodecError),

    #[error("Model: {0}")]
    Model(#[from] ModelError),

    #[error("Config: {0}")]
    Config(#[from] ConfigError),

    #[error("Input is empty after normalization")]
    EmptyInput,

    #[error("Translation produced no text (stopped by {0})")]
    EmptyOutput(TerminationReason),
}

impl TranslateError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyInput => "Nothing to translate.",
            Self::EmptyOutput(_) => "The model produced an empty translation. Try rephrasing.",
            Self::Decode(DecodeError::Cancelled { .. }) => "Translation was cancelled.",
            Self::Decode(DecodeError::InvalidConfig(_)) | Self::Config(_) => {
                "Decoding settings are invalid. Check the configuration."
            }
            Self::Decode(DecodeError::InvalidContext(_)) => {
                "The model's special tokens are inconsistent. Check config.json."
            }
            Self::Decode(DecodeError::Inference(_)) | Self::Inference(_) => {
                "Translation failed inside the model. Please try again."
            }
            Self::Codec(_) => "The tokenizer could not process this text.",
            Self::Model(e) => e.user_message(),
        }
    }
}

impl serde::Serialize for TranslateError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
