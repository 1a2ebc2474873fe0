use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use nmt_decode_lib::codec::TokenizerCodec;
use nmt_decode_lib::decoder::{CancelToken, DecodeConfig, ENV_PREFIX};
use nmt_decode_lib::onnx::OnnxSeq2Seq;
use nmt_decode_lib::{TranslateError, Translator};

#[derive(Parser)]
#[command(name = "nmt-decode")]
#[command(about = "Translate text with an ONNX encoder/decoder model")]
struct Cli {
    /// Model directory (encoder_model.onnx, decoder_model.onnx, config.json)
    #[arg(short, long)]
    model_dir: PathBuf,

    /// Tokenizer file, defaults to <model-dir>/tokenizer.json
    #[arg(short, long)]
    tokenizer: Option<PathBuf>,

    /// JSON decode config
    #[arg(short, long, conflicts_with = "opus_mt")]
    config: Option<PathBuf>,

    /// Use the opus-mt heuristic preset
    #[arg(long)]
    opus_mt: bool,

    /// Prefer *.int8.onnx graphs when present
    #[arg(short, long)]
    quantized: bool,

    /// Per-text timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Texts to translate
    #[arg(required = true)]
    text: Vec<String>,
}

fn load_config(cli: &Cli) -> Result<DecodeConfig, TranslateError> {
    let mut config = match &cli.config {
        Some(path) => DecodeConfig::from_json_file(path)?,
        None if cli.opus_mt => DecodeConfig::opus_mt(),
        None => DecodeConfig::default(),
    };
    config.apply_env_overrides(ENV_PREFIX);
    Ok(config)
}

fn run(cli: &Cli) -> Result<bool, TranslateError> {
    let config = load_config(cli)?;
    let codec = match &cli.tokenizer {
        Some(path) => TokenizerCodec::from_file(path)?,
        None => TokenizerCodec::from_model_dir(&cli.model_dir)?,
    };
    let model = OnnxSeq2Seq::new(&cli.model_dir, cli.quantized)?;
    let translator = Translator::new(model, codec, config)?;

    let mut all_ok = true;
    for text in &cli.text {
        let token = match cli.timeout_ms {
            Some(ms) => CancelToken::with_timeout(Duration::from_millis(ms)),
            None => CancelToken::new(),
        };
        match translator.translate_with_cancel(text, &token) {
            Ok(translation) => println!("{}\t{}", translation.reason, translation.text),
            Err(e) => {
                log::error!("Failed to translate {:?}: {}", text, e);
                eprintln!("{}", e.user_message());
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e}");
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
