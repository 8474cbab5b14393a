use super::test_runtime::{ScriptedTextPipeline, TestRuntime};
use crate::ai_sdk_core::{LanguageModel, PipelineTask, RuntimeError, SdkError};
use crate::ai_sdk_provider::ProviderSettings;
use crate::ai_sdk_types::v2 as v2t;
use crate::provider_transformers::{
    estimate_tokens, GenerationMode, TransformersModelSettings, TransformersProvider,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const MODEL_ID: &str = "onnx-community/Qwen2.5-0.5B-Instruct";

fn provider_with(runtime: Arc<TestRuntime>) -> TransformersProvider {
    TransformersProvider::new(ProviderSettings::new("local").with_api_key("hf_token"), runtime)
}

fn france_prompt() -> v2t::CallOptions {
    v2t::CallOptions::new(vec![v2t::PromptMessage::user(
        "What is the capital of France?",
    )])
}

#[tokio::test]
async fn default_generation_options_are_deterministic() {
    let runtime = Arc::new(TestRuntime::with_text(ScriptedTextPipeline::new(&["Paris."])));
    let model = provider_with(runtime.clone()).chat_model(MODEL_ID, Default::default());

    let resp = model.do_generate(france_prompt()).await.unwrap();

    let calls = runtime.text.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].prompt, "user: What is the capital of France?");
    assert!(!calls[0].streamed);
    let opts = &calls[0].options;
    assert_eq!(opts.max_new_tokens, 512);
    assert_eq!(opts.temperature, 0.0);
    assert!(!opts.do_sample);
    assert!(!opts.return_full_text);

    assert_eq!(resp.text, "Paris.");
    assert_eq!(resp.finish_reason, v2t::FinishReason::Stop);
    assert_eq!(
        resp.request_body,
        json!({
            "prompt": "user: What is the capital of France?",
            "max_new_tokens": 512,
            "temperature": 0.0,
            "do_sample": false,
            "return_full_text": false
        })
    );
    assert_eq!(resp.raw_call.raw_prompt, "user: What is the capital of France?");
    assert!(resp.warnings.is_empty());
}

#[tokio::test]
async fn usage_is_estimated_from_characters() {
    let runtime = Arc::new(TestRuntime::with_text(ScriptedTextPipeline::new(&["Paris"])));
    let model = provider_with(runtime).completion_model(MODEL_ID, Default::default());

    let resp = model
        .do_generate(v2t::CallOptions::new("abcdefghi"))
        .await
        .unwrap();

    assert_eq!(resp.usage.prompt_tokens, 3);
    assert_eq!(resp.usage.completion_tokens, 2);
    assert_eq!(resp.usage.total_tokens(), 5);
    assert_eq!(estimate_tokens(""), 0);
    assert_eq!(estimate_tokens("abcd"), 1);
    assert_eq!(estimate_tokens("héllo"), 2);
}

#[tokio::test]
async fn raw_response_carries_outputs_and_identity() {
    let runtime = Arc::new(TestRuntime::with_text(ScriptedTextPipeline::new(&["ok"])));
    let model = provider_with(runtime).completion_model(MODEL_ID, Default::default());
    assert_eq!(model.mode(), GenerationMode::Completion);

    let resp = model.do_generate(v2t::CallOptions::new("hi")).await.unwrap();
    let raw = resp.raw_response.unwrap();
    assert_eq!(raw["modelId"], MODEL_ID);
    assert_eq!(raw["mode"], "completion");
    assert_eq!(raw["outputs"][0]["generated_text"], "ok");
    assert!(raw["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(raw["timestampMs"].as_i64().is_some());
}

#[tokio::test]
async fn sampling_follows_temperature() {
    let runtime = Arc::new(TestRuntime::with_text(ScriptedTextPipeline::new(&["x"])));
    let model = provider_with(runtime.clone()).chat_model(MODEL_ID, Default::default());

    model
        .do_generate(
            v2t::CallOptions::new("hi")
                .with_temperature(0.7)
                .with_max_output_tokens(32),
        )
        .await
        .unwrap();

    let opts = &runtime.text.calls()[0].options;
    assert!(opts.do_sample);
    assert_eq!(opts.max_new_tokens, 32);
    assert!((opts.temperature - 0.7).abs() < f32::EPSILON);
}

#[tokio::test]
async fn pipeline_loads_once_per_instance() {
    let runtime = Arc::new(TestRuntime::with_text(ScriptedTextPipeline::new(&["x"])));
    let model = provider_with(runtime.clone()).chat_model(MODEL_ID, Default::default());
    assert!(!model.is_ready());

    model.ensure_pipeline().await.unwrap();
    model.ensure_pipeline().await.unwrap();
    model.do_generate(v2t::CallOptions::new("a")).await.unwrap();

    assert!(model.is_ready());
    assert_eq!(runtime.loads(), 1);
    let (task, model_id, load) = runtime.last_load().unwrap();
    assert_eq!(task, PipelineTask::TextGeneration);
    assert_eq!(model_id, MODEL_ID);
    assert_eq!(load.access_token.as_deref(), Some("hf_token"));
}

#[tokio::test]
async fn concurrent_first_calls_share_one_load() {
    let runtime = Arc::new(TestRuntime::with_text(ScriptedTextPipeline::new(&["x"])));
    let model = provider_with(runtime.clone()).chat_model(MODEL_ID, Default::default());

    let (a, b, c) = tokio::join!(
        model.ensure_pipeline(),
        model.ensure_pipeline(),
        model.do_generate(v2t::CallOptions::new("hi")),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(runtime.loads(), 1);
}

#[tokio::test]
async fn load_settings_reach_the_runtime() {
    let runtime = Arc::new(TestRuntime::with_text(ScriptedTextPipeline::new(&["x"])));
    let settings = TransformersModelSettings::default()
        .with_dtype("q4")
        .with_device("wasm")
        .with_revision("main");
    let model = provider_with(runtime.clone()).chat_model(MODEL_ID, settings);

    model.ensure_pipeline().await.unwrap();

    let (_, _, load) = runtime.last_load().unwrap();
    assert_eq!(load.dtype.as_deref(), Some("q4"));
    assert_eq!(load.device.as_deref(), Some("wasm"));
    assert_eq!(load.revision.as_deref(), Some("main"));
    assert!(!load.local_files_only);
}

#[tokio::test]
async fn failed_load_surfaces_and_is_retried() {
    let runtime = Arc::new(
        TestRuntime::with_text(ScriptedTextPipeline::new(&["x"])).fail_next_loads(1),
    );
    let model = provider_with(runtime.clone()).chat_model(MODEL_ID, Default::default());

    let err = model
        .do_generate(v2t::CallOptions::new("hi"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SdkError::Runtime(RuntimeError::Load { .. })
    ));
    assert!(err.format_details().contains("weights not found"));
    assert!(!model.is_ready());

    model.do_generate(v2t::CallOptions::new("hi")).await.unwrap();
    assert_eq!(runtime.loads(), 2);
}

#[tokio::test]
async fn inference_errors_propagate_unchanged() {
    let runtime = Arc::new(TestRuntime::with_text(
        ScriptedTextPipeline::new(&[]).failing(RuntimeError::Inference("out of memory".into())),
    ));
    let model = provider_with(runtime).chat_model(MODEL_ID, Default::default());

    let err = model
        .do_generate(v2t::CallOptions::new("hi"))
        .await
        .unwrap_err();
    match err {
        SdkError::Runtime(RuntimeError::Inference(msg)) => assert_eq!(msg, "out of memory"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn openai_compatible_mode_maps_runtime_finish_reason() {
    let runtime = Arc::new(TestRuntime::with_text(
        ScriptedTextPipeline::new(&["truncated"]).with_finish_reason("max_length"),
    ));
    let provider = provider_with(runtime);

    let compat = provider.openai_compatible_model(MODEL_ID, Default::default());
    let resp = compat.do_generate(v2t::CallOptions::new("hi")).await.unwrap();
    assert_eq!(resp.finish_reason, v2t::FinishReason::Length);

    let chat = provider.chat_model(MODEL_ID, Default::default());
    let resp = chat.do_generate(v2t::CallOptions::new("hi")).await.unwrap();
    assert_eq!(resp.finish_reason, v2t::FinishReason::Stop);
}

#[tokio::test]
async fn openai_compatible_mode_defaults_to_stop() {
    let runtime = Arc::new(TestRuntime::with_text(ScriptedTextPipeline::new(&["done"])));
    let model = provider_with(runtime).openai_compatible_model(MODEL_ID, Default::default());

    let resp = model.do_generate(v2t::CallOptions::new("hi")).await.unwrap();
    assert_eq!(resp.finish_reason, v2t::FinishReason::Stop);
}

#[tokio::test]
async fn cancelled_before_start_skips_runtime() {
    let runtime = Arc::new(TestRuntime::with_text(ScriptedTextPipeline::new(&["x"])));
    let model = provider_with(runtime.clone()).chat_model(MODEL_ID, Default::default());
    let token = CancellationToken::new();
    token.cancel();

    let err = model
        .do_generate(v2t::CallOptions::new("hi").with_abort_signal(token))
        .await
        .unwrap_err();
    assert!(matches!(err, SdkError::Cancelled));
    assert_eq!(runtime.loads(), 0);
}

#[tokio::test]
async fn cancellation_interrupts_pending_generation() {
    let notify = Arc::new(tokio::sync::Notify::new());
    let runtime = Arc::new(TestRuntime::with_text(
        ScriptedTextPipeline::new(&["x"]).held(notify),
    ));
    let model = provider_with(runtime.clone()).chat_model(MODEL_ID, Default::default());
    let token = CancellationToken::new();

    let canceller = token.clone();
    let (res, _) = tokio::join!(
        model.do_generate(v2t::CallOptions::new("hi").with_abort_signal(token)),
        async move {
            tokio::task::yield_now().await;
            canceller.cancel();
        }
    );
    assert!(matches!(res, Err(SdkError::Cancelled)));
}

#[tokio::test]
async fn model_defaults_and_provider_options_shape_generation() {
    let runtime = Arc::new(TestRuntime::with_text(ScriptedTextPipeline::new(&["x"])));
    let defaults = HashMap::from([(
        "local".to_string(),
        HashMap::from([
            ("repetitionPenalty".to_string(), json!(1.1)),
            ("topK".to_string(), json!(50)),
        ]),
    )]);
    let settings = TransformersModelSettings::default().with_default_options(defaults);
    let model = provider_with(runtime.clone()).chat_model(MODEL_ID, settings);

    let mut opts = v2t::CallOptions::new("hi");
    opts.provider_options = HashMap::from([(
        "local".to_string(),
        HashMap::from([
            ("topK".to_string(), json!(10)),
            ("num_beams".to_string(), json!(2)),
        ]),
    )]);
    opts.seed = Some(1);
    let resp = model.do_generate(opts).await.unwrap();

    let call = &runtime.text.calls()[0].options;
    assert_eq!(call.top_k, Some(10));
    assert_eq!(call.repetition_penalty, Some(1.1));
    assert_eq!(call.extra.get("num_beams"), Some(&json!(2)));
    assert_eq!(resp.request_body["num_beams"], 2);
    assert!(matches!(
        resp.warnings.as_slice(),
        [v2t::CallWarning::UnsupportedSetting { setting, .. }] if setting == "seed"
    ));
}

#[tokio::test]
async fn identity_comes_from_provider_settings() {
    let runtime = Arc::new(TestRuntime::with_text(ScriptedTextPipeline::new(&[])));
    let model = provider_with(runtime).chat_model(MODEL_ID, Default::default());
    assert_eq!(model.provider(), "local");
    assert_eq!(model.model_id(), MODEL_ID);
    assert_eq!(model.specification_version(), "v1");
    assert_eq!(model.default_object_generation_mode(), None);
}

#[tokio::test]
async fn generic_scope_options_and_defaults_reach_the_runtime() {
    let runtime = Arc::new(TestRuntime::with_text(ScriptedTextPipeline::new(&["x"])));
    let defaults = HashMap::from([(
        "transformers".to_string(),
        HashMap::from([("noRepeatNgramSize".to_string(), json!(3))]),
    )]);
    let settings = TransformersModelSettings::default().with_default_options(defaults);
    let model = provider_with(runtime.clone()).chat_model(MODEL_ID, settings);

    let mut opts = v2t::CallOptions::new("hi");
    opts.provider_options = HashMap::from([(
        "transformers".to_string(),
        HashMap::from([
            ("topK".to_string(), json!(7)),
            ("num_beams".to_string(), json!(4)),
        ]),
    )]);
    let resp = model.do_generate(opts).await.unwrap();

    let call = &runtime.text.calls()[0].options;
    assert_eq!(call.top_k, Some(7));
    assert_eq!(call.no_repeat_ngram_size, Some(3));
    assert_eq!(call.extra.get("num_beams"), Some(&json!(4)));
    assert_eq!(resp.request_body["num_beams"], 4);
}

#[tokio::test]
async fn request_body_matches_typed_options_despite_snake_case_extras() {
    let runtime = Arc::new(TestRuntime::with_text(ScriptedTextPipeline::new(&["x"])));
    let model = provider_with(runtime.clone()).chat_model(MODEL_ID, Default::default());

    let mut opts = v2t::CallOptions::new("hi");
    opts.top_k = Some(5);
    opts.provider_options = HashMap::from([(
        "local".to_string(),
        HashMap::from([("top_k".to_string(), json!(99))]),
    )]);
    let resp = model.do_generate(opts).await.unwrap();

    assert_eq!(runtime.text.calls()[0].options.top_k, Some(5));
    assert_eq!(resp.request_body["top_k"], 5);
    assert_eq!(resp.raw_call.raw_settings["top_k"], 5);
    assert!(matches!(
        resp.warnings.as_slice(),
        [v2t::CallWarning::Other { message }] if message.contains("top_k")
    ));
}
