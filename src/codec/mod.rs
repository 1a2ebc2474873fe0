mod tokenizer;

use std::sync::LazyLock;

use regex::Regex;

use crate::decoder::TokenId;

pub use tokenizer::TokenizerCodec;

/// SentencePiece word-boundary marker.
pub const WORD_MARKER: char = '\u{2581}';

static WHITESPACE_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\s+"));

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("Tokenizer file not found: {0}")]
    NotFound(String),
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),
}

/// Text <-> token id conversion used on both ends of a translation.
pub trait TextCodec {
    fn encode(&self, text: &str) -> Result<Vec<TokenId>, CodecError>;
    fn decode(&self, ids: &[TokenId]) -> Result<String, CodecError>;
}

/// Collapses whitespace runs into single spaces and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    match &*WHITESPACE_RE {
        Ok(re) => re.replace_all(text.trim(), " ").into_owned(),
        Err(_) => text.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}

/// Turns leftover SentencePiece markers into spaces.
pub fn clean_word_markers(text: &str) -> String {
    if text.contains(WORD_MARKER) {
        normalize_whitespace(&text.replace(WORD_MARKER, " "))
    } else {
        text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(normalize_whitespace("  hello \t  world\n"), "hello world");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn word_markers_become_spaces() {
        assert_eq!(clean_word_markers("\u{2581}Hello\u{2581}world"), "Hello world");
        assert_eq!(clean_word_markers("  你好世界 "), "你好世界");
    }
}
