use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use ndarray::{s, Array2, Axis, Ix3};
use num_cpus::get_physical;
use ort::{
    execution_providers::CPUExecutionProvider,
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};

use super::config::{ModelConfig, ModelError};
use crate::decoder::{InferenceError, ScoringContext, ScoringOracle, SpecialTokens, TokenId};
use crate::translator::Seq2SeqModel;

const THREAD_ENV: &str = "ORT_THREADS";
const ENCODER_MODEL: &str = "encoder_model";
const DECODER_MODEL: &str = "decoder_model";

fn resolve_thread_count() -> usize {
    std::env::var(THREAD_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(get_physical)
}

/// Encoder/decoder pair exported without KV cache: every step re-runs the
/// decoder over the full history.
pub struct OnnxSeq2Seq {
    encoder: Mutex<Session>,
    decoder: Mutex<Session>,
    encoder_output: String,
    config: ModelConfig,
}

impl OnnxSeq2Seq {
    pub fn new<P: AsRef<Path>>(model_dir: P, quantized: bool) -> Result<Self, ModelError> {
        let start = Instant::now();
        let dir = model_dir.as_ref();
        let config = ModelConfig::from_model_dir(dir)?;
        let threads = resolve_thread_count();
        let encoder = Self::init_session(dir, ENCODER_MODEL, threads, quantized)?;
        let decoder = Self::init_session(dir, DECODER_MODEL, threads, quantized)?;

        let encoder_output = encoder
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| ModelError::NoOutputs(ENCODER_MODEL.to_string()))?;

        log::info!(
            "Translation model initialized from {} in {:?} (vocab: {}, start: {}, eos: {})",
            dir.display(),
            start.elapsed(),
            config.vocab_size,
            config.decoder_start_token_id,
            config.eos_token_id
        );
        Ok(Self {
            encoder: Mutex::new(encoder),
            decoder: Mutex::new(decoder),
            encoder_output,
            config,
        })
    }

    fn init_session(
        dir: &Path,
        name: &str,
        threads: usize,
        try_q: bool,
    ) -> Result<Session, ModelError> {
        let mut file = format!("{name}.onnx");
        if try_q {
            let q = format!("{name}.int8.onnx");
            if dir.join(&q).exists() {
                file = q;
            }
        }
        let path = dir.join(&file);
        if !path.exists() {
            return Err(ModelError::ModelNotFound(path.display().to_string()));
        }
        let opt = if cfg!(target_os = "windows") {
            GraphOptimizationLevel::Level1
        } else {
            GraphOptimizationLevel::Level3
        };
        log::debug!("Loading {} with {} threads", path.display(), threads);
        Ok(Session::builder()?
            .with_optimization_level(opt)?
            .with_execution_providers(vec![CPUExecutionProvider::default().build()])?
            .with_intra_threads(threads)?
            .commit_from_file(path)?)
    }
}

impl ScoringOracle for OnnxSeq2Seq {
    fn score(
        &self,
        history: &[TokenId],
        context: &ScoringContext<'_>,
    ) -> Result<Vec<f32>, InferenceError> {
        let source_len = context.encoder_states.nrows();
        let mask = Array2::<i64>::ones((1, source_len));
        let ids = Array2::from_shape_vec(
            (1, history.len()),
            history.iter().map(|&t| i64::from(t)).collect(),
        )?;
        let states = context.encoder_states.as_standard_layout();
        let states = states.view().insert_axis(Axis(0));

        let start = Instant::now();
        let mut session = self
            .decoder
            .lock()
            .map_err(|_| InferenceError::LockPoisoned)?;
        let outputs = session.run(inputs![
            "encoder_attention_mask" => TensorRef::from_array_view(mask.view())?,
            "input_ids" => TensorRef::from_array_view(ids.view())?,
            "encoder_hidden_states" => TensorRef::from_array_view(states.view())?,
        ])?;

        let logits = outputs
            .get("logits")
            .ok_or_else(|| InferenceError::OutputNotFound("logits".to_string()))?
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix3>()?;
        let last = logits
            .shape()
            .get(1)
            .and_then(|len| len.checked_sub(1))
            .ok_or_else(|| InferenceError::OutputNotFound("logits[-1]".to_string()))?;
        let scores = logits.slice(s![0, last, ..]).to_vec();

        log::trace!(
            "Decoder step over {} tokens took {:?}",
            history.len(),
            start.elapsed()
        );
        Ok(scores)
    }
}

impl Seq2SeqModel for OnnxSeq2Seq {
    fn special_tokens(&self) -> SpecialTokens {
        self.config.special_tokens()
    }

    fn generation_limit(&self) -> Option<usize> {
        self.config.generation_limit()
    }

    fn encode(&self, input_ids: &[TokenId]) -> Result<Array2<f32>, InferenceError> {
        let ids = Array2::from_shape_vec(
            (1, input_ids.len()),
            input_ids.iter().map(|&t| i64::from(t)).collect(),
        )?;
        let mask = Array2::<i64>::ones((1, input_ids.len()));

        let start = Instant::now();
        let mut session = self
            .encoder
            .lock()
            .map_err(|_| InferenceError::LockPoisoned)?;
        let outputs = session.run(inputs![
            "input_ids" => TensorRef::from_array_view(ids.view())?,
            "attention_mask" => TensorRef::from_array_view(mask.view())?,
        ])?;

        let hidden = outputs
            .get(self.encoder_output.as_str())
            .ok_or_else(|| InferenceError::OutputNotFound(self.encoder_output.clone()))?
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix3>()?
            .index_axis(Axis(0), 0)
            .to_owned();
        log::debug!(
            "Encoder inference completed in {:?} ({} tokens)",
            start.elapsed(),
            input_ids.len()
        );
        Ok(hidden)
    }
}
