use std::path::Path;
use std::time::Instant;

use tokenizers::Tokenizer;

use super::{clean_word_markers, CodecError, TextCodec};
use crate::decoder::TokenId;

pub const TOKENIZER_FILE: &str = "tokenizer.json";

pub struct TokenizerCodec {
    inner: Tokenizer,
}

impl TokenizerCodec {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CodecError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CodecError::NotFound(path.display().to_string()));
        }
        let start = Instant::now();
        let inner =
            Tokenizer::from_file(path).map_err(|e| CodecError::Tokenizer(e.to_string()))?;
        log::info!(
            "Tokenizer loaded from {} in {:?} (vocab: {})",
            path.display(),
            start.elapsed(),
            inner.get_vocab_size(true)
        );
        Ok(Self { inner })
    }

    pub fn from_model_dir<P: AsRef<Path>>(model_dir: P) -> Result<Self, CodecError> {
        Self::from_file(model_dir.as_ref().join(TOKENIZER_FILE))
    }
}

impl TextCodec for TokenizerCodec {
    fn encode(&self, text: &str) -> Result<Vec<TokenId>, CodecError> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| CodecError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[TokenId]) -> Result<String, CodecError> {
        let raw = self
            .inner
            .decode(ids, true)
            .map_err(|e| CodecError::Tokenizer(e.to_string()))?;
        Ok(clean_word_markers(&raw))
    }
}
