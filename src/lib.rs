pub mod codec;
pub mod decoder;
pub mod onnx;
pub mod translator;

mod error;

pub use error::TranslateError;
pub use translator::{Seq2SeqModel, Translation, Translator};
