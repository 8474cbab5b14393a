use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use tokio_util::sync::CancellationToken;

use crate::ai_sdk_core::request_builder::defaults::build_call_options;
use crate::ai_sdk_core::{
    GenerateResponse, GenerationOptions, LanguageModel, PipelineCell, PipelineTask, SdkError,
    StreamResponse, TextGenerationOutput, TextGenerationPipeline, TransformersRuntime,
};
use crate::ai_sdk_provider::ModelConfig;
use crate::ai_sdk_types::v2 as v2t;

use crate::provider_transformers::finish_reason::map_finish_reason;
use crate::provider_transformers::options::{
    build_generation_options, TransformersModelSettings, GENERIC_SCOPE,
};
use crate::provider_transformers::prompt::normalize_prompt;
use crate::provider_transformers::stream::{spawn_token_stream, StreamJob};

/// How a language model reports its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Chat,
    Completion,
    /// Finish reasons come from the runtime output instead of a fixed `stop`.
    OpenAICompatible,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Chat => "chat",
            GenerationMode::Completion => "completion",
            GenerationMode::OpenAICompatible => "openai-compatible",
        }
    }
}

/// Rough token estimate: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

struct PreparedCall {
    prompt: String,
    generation: GenerationOptions,
    warnings: Vec<v2t::CallWarning>,
    abort_signal: Option<CancellationToken>,
}

impl PreparedCall {
    fn settings_json(&self) -> Result<JsonValue, SdkError> {
        Ok(serde_json::to_value(&self.generation)?)
    }

    /// `{prompt, ...generationOptions}`, kept for diagnostics and replay.
    fn request_body(&self) -> Result<JsonValue, SdkError> {
        let mut body = JsonMap::new();
        body.insert("prompt".into(), JsonValue::String(self.prompt.clone()));
        if let JsonValue::Object(settings) = self.settings_json()? {
            body.extend(settings);
        }
        Ok(JsonValue::Object(body))
    }

    fn raw_call(&self) -> Result<v2t::RawCall, SdkError> {
        Ok(v2t::RawCall {
            raw_prompt: self.prompt.clone(),
            raw_settings: self.settings_json()?,
        })
    }
}

pub struct TransformersLanguageModel {
    model_id: String,
    mode: GenerationMode,
    config: Arc<ModelConfig>,
    settings: TransformersModelSettings,
    runtime: Arc<dyn TransformersRuntime>,
    pipeline: PipelineCell<dyn TextGenerationPipeline>,
}

impl TransformersLanguageModel {
    pub fn new(
        model_id: impl Into<String>,
        mode: GenerationMode,
        config: Arc<ModelConfig>,
        settings: TransformersModelSettings,
        runtime: Arc<dyn TransformersRuntime>,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            mode,
            config,
            settings,
            runtime,
            pipeline: PipelineCell::new(),
        }
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    pub fn config(&self) -> &Arc<ModelConfig> {
        &self.config
    }

    /// True once the text-generation pipeline has been loaded.
    pub fn is_ready(&self) -> bool {
        self.pipeline.is_ready()
    }

    /// Load the text-generation pipeline on first use and reuse it afterwards.
    pub async fn ensure_pipeline(&self) -> Result<Arc<dyn TextGenerationPipeline>, SdkError> {
        self.pipeline
            .get_or_load(|| async {
                let load_options = self.settings.load_options(&self.config);
                tracing::info!(
                    "[TRANSFORMERS]: loading {} pipeline model={} options={:?}",
                    PipelineTask::TextGeneration,
                    self.model_id,
                    load_options
                );
                let pipeline = self
                    .runtime
                    .load_pipeline(PipelineTask::TextGeneration, &self.model_id, &load_options)
                    .await?;
                let pipeline: Arc<dyn TextGenerationPipeline> = pipeline.into_text_generation()?;
                Ok::<_, SdkError>(pipeline)
            })
            .await
    }

    fn prepare(&self, options: v2t::CallOptions) -> PreparedCall {
        let scope_names = [GENERIC_SCOPE, self.config.provider.as_str()];
        let defaults = self.settings.default_options.as_ref();
        let options = scope_names
            .iter()
            .fold(options, |opts, scope| build_call_options(opts, scope, defaults));
        let (generation, warnings) = build_generation_options(&options, &scope_names);
        PreparedCall {
            prompt: normalize_prompt(&options.prompt),
            generation,
            warnings,
            abort_signal: options.abort_signal,
        }
    }

    fn finish_reason(&self, output: Option<&TextGenerationOutput>) -> v2t::FinishReason {
        match self.mode {
            GenerationMode::OpenAICompatible => output
                .and_then(|o| o.finish_reason.as_deref())
                .map(|reason| map_finish_reason(Some(reason)))
                .unwrap_or(v2t::FinishReason::Stop),
            GenerationMode::Chat | GenerationMode::Completion => v2t::FinishReason::Stop,
        }
    }
}

fn ensure_not_cancelled(token: Option<&CancellationToken>) -> Result<(), SdkError> {
    match token {
        Some(t) if t.is_cancelled() => Err(SdkError::Cancelled),
        _ => Ok(()),
    }
}

#[async_trait]
impl LanguageModel for TransformersLanguageModel {
    fn provider(&self) -> &str {
        &self.config.provider
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn do_generate(&self, options: v2t::CallOptions) -> Result<GenerateResponse, SdkError> {
        let call = self.prepare(options);
        ensure_not_cancelled(call.abort_signal.as_ref())?;
        let pipeline = self.ensure_pipeline().await?;
        let request_body = call.request_body()?;
        let raw_call = call.raw_call()?;

        let generation = pipeline.generate(&call.prompt, &call.generation, None);
        let outputs = match &call.abort_signal {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(SdkError::Cancelled),
                res = generation => res?,
            },
            None => generation.await?,
        };

        let first = outputs.first();
        let text = first.map(|o| o.generated_text.clone()).unwrap_or_default();
        let usage = v2t::Usage {
            prompt_tokens: estimate_tokens(&call.prompt),
            completion_tokens: estimate_tokens(&text),
        };
        let finish_reason = self.finish_reason(first);
        let raw_response = json!({
            "id": uuid::Uuid::new_v4().to_string(),
            "timestampMs": chrono::Utc::now().timestamp_millis(),
            "modelId": self.model_id,
            "mode": self.mode.as_str(),
            "outputs": serde_json::to_value(&outputs)?,
        });

        Ok(GenerateResponse {
            text,
            finish_reason,
            usage,
            raw_call,
            raw_response: Some(raw_response),
            request_body,
            warnings: call.warnings,
        })
    }

    async fn do_stream(&self, options: v2t::CallOptions) -> Result<StreamResponse, SdkError> {
        let call = self.prepare(options);
        ensure_not_cancelled(call.abort_signal.as_ref())?;
        let pipeline = self.ensure_pipeline().await?;
        let request_body = call.request_body()?;
        let raw_call = call.raw_call()?;

        let PreparedCall {
            prompt,
            generation,
            warnings,
            abort_signal,
        } = call;
        let stream = spawn_token_stream(StreamJob {
            pipeline,
            prompt,
            options: generation,
            abort_signal,
        });

        Ok(StreamResponse {
            stream,
            raw_call,
            request_body,
            warnings,
        })
    }
}
