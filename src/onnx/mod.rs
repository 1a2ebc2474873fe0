mod config;
mod model;

pub use config::{ModelConfig, ModelError, CONFIG_FILE};
pub use model::OnnxSeq2Seq;
