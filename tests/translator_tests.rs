mod common;

use std::sync::{Arc, Mutex};
use std::thread;

use common::{peaked, END, TOKENS};
use ndarray::Array2;
use nmt_decode_lib::codec::{CodecError, TextCodec};
use nmt_decode_lib::decoder::{
    CancelToken, DecodeConfig, DecodeError, HeuristicConfig, InferenceError, ScoringContext,
    ScoringOracle, SpecialTokens, TerminationReason, TokenId,
};
use nmt_decode_lib::{Seq2SeqModel, TranslateError, Translator};

/// Replies with a fixed token list regardless of the source.
struct FakeModel {
    reply: Vec<TokenId>,
    limit: Option<usize>,
    last_source: Arc<Mutex<Vec<TokenId>>>,
}

impl FakeModel {
    fn new(reply: &[TokenId]) -> Self {
        Self {
            reply: reply.to_vec(),
            limit: None,
            last_source: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl ScoringOracle for FakeModel {
    fn score(
        &self,
        history: &[TokenId],
        context: &ScoringContext<'_>,
    ) -> Result<Vec<f32>, InferenceError> {
        assert_eq!(context.encoder_states.ncols(), 4);
        let token = self
            .reply
            .get(history.len() - 1)
            .copied()
            .unwrap_or(context.end_token_id);
        Ok(peaked(context.vocab_size, token))
    }
}

impl Seq2SeqModel for FakeModel {
    fn special_tokens(&self) -> SpecialTokens {
        TOKENS
    }

    fn generation_limit(&self) -> Option<usize> {
        self.limit
    }

    fn encode(&self, input_ids: &[TokenId]) -> Result<Array2<f32>, InferenceError> {
        *self.last_source.lock().unwrap() = input_ids.to_vec();
        Ok(Array2::zeros((input_ids.len(), 4)))
    }
}

/// One id per word (`2 + len`), rendered back as `w<id>`.
struct WordCodec {
    append_eos: bool,
}

impl TextCodec for WordCodec {
    fn encode(&self, text: &str) -> Result<Vec<TokenId>, CodecError> {
        let mut ids: Vec<TokenId> = text.split(' ').map(|w| 2 + w.len() as TokenId).collect();
        if self.append_eos {
            ids.push(END);
        }
        Ok(ids)
    }

    fn decode(&self, ids: &[TokenId]) -> Result<String, CodecError> {
        Ok(ids
            .iter()
            .map(|id| format!("w{id}"))
            .collect::<Vec<_>>()
            .join(" "))
    }
}

fn translator(reply: &[TokenId], config: DecodeConfig) -> Translator<FakeModel, WordCodec> {
    Translator::new(
        FakeModel::new(reply),
        WordCodec { append_eos: false },
        config,
    )
    .unwrap()
}

#[test]
fn translates_and_reports_reason() {
    let model = FakeModel::new(&[5, 6, 7]);
    let source = Arc::clone(&model.last_source);
    let translator = Translator::new(
        model,
        WordCodec { append_eos: false },
        DecodeConfig::default(),
    )
    .unwrap();

    let translation = translator.translate("  hello \n world ").unwrap();

    assert_eq!(translation.text, "w5 w6 w7");
    assert_eq!(translation.tokens, vec![5, 6, 7]);
    assert_eq!(translation.reason, TerminationReason::EndToken);
    assert_eq!(translation.steps, 3);
    assert_eq!(*source.lock().unwrap(), vec![7, 7, END]);
}

#[test]
fn end_token_is_not_appended_twice() {
    let model = FakeModel::new(&[5]);
    let source = Arc::clone(&model.last_source);
    let translator = Translator::new(
        model,
        WordCodec { append_eos: true },
        DecodeConfig::default(),
    )
    .unwrap();

    translator.translate("hi").unwrap();

    assert_eq!(*source.lock().unwrap(), vec![4, END]);
}

#[test]
fn blank_input_is_rejected() {
    let model = FakeModel::new(&[5]);
    let source = Arc::clone(&model.last_source);
    let translator = Translator::new(
        model,
        WordCodec { append_eos: false },
        DecodeConfig::default(),
    )
    .unwrap();

    let err = translator.translate(" \t\n ").unwrap_err();

    assert!(matches!(err, TranslateError::EmptyInput));
    assert!(source.lock().unwrap().is_empty());
}

#[test]
fn empty_output_carries_the_reason() {
    let translator = translator(&[], DecodeConfig::default());

    let err = translator.translate("hello").unwrap_err();

    assert!(matches!(
        err,
        TranslateError::EmptyOutput(TerminationReason::EndToken)
    ));
}

#[test]
fn truncated_output_is_returned() {
    let config = DecodeConfig {
        max_length: 2,
        ..Default::default()
    };
    let translator = translator(&[5, 6, 7], config);

    let translation = translator.translate("hello").unwrap();

    assert_eq!(translation.text, "w5 w6");
    assert_eq!(translation.reason, TerminationReason::MaxLength);
}

#[test]
fn max_length_is_capped_by_the_model_limit() {
    let translator = Translator::new(
        FakeModel::new(&[5, 6, 7]).with_limit(2),
        WordCodec { append_eos: false },
        DecodeConfig::default(),
    )
    .unwrap();

    assert_eq!(translator.config().max_length, 2);
    let translation = translator.translate("hello").unwrap();
    assert_eq!(translation.text, "w5 w6");
    assert_eq!(translation.reason, TerminationReason::MaxLength);
}

#[test]
fn shorter_max_length_survives_the_model_limit() {
    let config = DecodeConfig {
        max_length: 1,
        ..Default::default()
    };
    let translator = Translator::new(
        FakeModel::new(&[5, 6, 7]).with_limit(2),
        WordCodec { append_eos: false },
        config,
    )
    .unwrap();

    assert_eq!(translator.config().max_length, 1);
}

#[test]
fn cancelled_request_fails() {
    let translator = translator(&[5, 6], DecodeConfig::default());
    let token = CancelToken::new();
    token.cancel();

    let err = translator.translate_with_cancel("hello", &token).unwrap_err();

    assert!(matches!(
        err,
        TranslateError::Decode(DecodeError::Cancelled { step: 0 })
    ));
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let config = DecodeConfig {
        heuristics: HeuristicConfig {
            max_consecutive_repeats: Some(0),
            ..Default::default()
        },
        ..Default::default()
    };

    let result = Translator::new(
        FakeModel::new(&[5]),
        WordCodec { append_eos: false },
        config,
    );

    assert!(matches!(
        result,
        Err(TranslateError::Decode(DecodeError::InvalidConfig(_)))
    ));
}

#[test]
fn concurrent_requests_share_one_translator() {
    let translator = Arc::new(translator(&[9, 10, 11], DecodeConfig::opus_mt()));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let translator = Arc::clone(&translator);
            thread::spawn(move || translator.translate(&format!("request {i}")).unwrap())
        })
        .collect();

    for handle in handles {
        let translation = handle.join().unwrap();
        assert_eq!(translation.text, "w9 w10 w11");
        assert_eq!(translation.reason, TerminationReason::EndToken);
    }
}
