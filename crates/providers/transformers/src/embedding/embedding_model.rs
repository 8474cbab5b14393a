use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use crate::ai_sdk_core::request_builder::defaults::build_embed_options;
use crate::ai_sdk_core::{
    EmbedResponse, EmbeddingModel, FeatureExtractionOptions, FeatureExtractionPipeline,
    PipelineCell, PipelineTask, Pooling, SdkError, TransformersRuntime,
};
use crate::ai_sdk_provider::ModelConfig;
use crate::ai_sdk_types::embedding::{EmbedOptions, EmbedUsage, Embedding};
use crate::ai_sdk_types::v2 as v2t;

use crate::provider_transformers::embedding::extract::{
    extract_token_vectors, l2_normalize, mean_pool,
};
use crate::provider_transformers::options::{TransformersModelSettings, GENERIC_SCOPE};

pub const MAX_EMBEDDINGS_PER_CALL: usize = 2048;

pub struct TransformersEmbeddingModel {
    model_id: String,
    config: Arc<ModelConfig>,
    settings: TransformersModelSettings,
    runtime: Arc<dyn TransformersRuntime>,
    pipeline: PipelineCell<dyn FeatureExtractionPipeline>,
}

impl TransformersEmbeddingModel {
    pub fn new(
        model_id: impl Into<String>,
        config: Arc<ModelConfig>,
        settings: TransformersModelSettings,
        runtime: Arc<dyn TransformersRuntime>,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            config,
            settings,
            runtime,
            pipeline: PipelineCell::new(),
        }
    }

    pub fn config(&self) -> &Arc<ModelConfig> {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.pipeline.is_ready()
    }

    pub async fn ensure_pipeline(&self) -> Result<Arc<dyn FeatureExtractionPipeline>, SdkError> {
        self.pipeline
            .get_or_load(|| async {
                let load_options = self.settings.load_options(&self.config);
                tracing::info!(
                    "[TRANSFORMERS]: loading {} pipeline model={} options={:?}",
                    PipelineTask::FeatureExtraction,
                    self.model_id,
                    load_options
                );
                let pipeline = self
                    .runtime
                    .load_pipeline(PipelineTask::FeatureExtraction, &self.model_id, &load_options)
                    .await?;
                let pipeline: Arc<dyn FeatureExtractionPipeline> =
                    pipeline.into_feature_extraction()?;
                Ok::<_, SdkError>(pipeline)
            })
            .await
    }

    async fn embed_one(&self, value: &str, normalize: bool) -> Result<Embedding, SdkError> {
        let pipeline = self.ensure_pipeline().await?;
        // Token-level output; pooling happens here so every runtime shape is handled alike.
        let options = FeatureExtractionOptions {
            pooling: Pooling::None,
            normalize: false,
        };
        let output = pipeline.extract(value, &options).await?;
        let vectors = match extract_token_vectors(&output) {
            Some(vectors) => vectors,
            None => {
                tracing::warn!(
                    "[TRANSFORMERS]: unrecognised feature output for model={}: {:?}",
                    self.model_id,
                    output
                );
                Vec::new()
            }
        };
        let pooled = mean_pool(&vectors);
        Ok(if normalize { l2_normalize(pooled) } else { pooled })
    }
}

/// Reads the boolean `normalize` key from the generic or provider scope; the provider scope wins.
fn normalize_requested(provider_options: &v2t::ProviderOptions, scopes: &[&str]) -> bool {
    scopes
        .iter()
        .filter_map(|scope| provider_options.get(*scope))
        .filter_map(|map| map.get("normalize").and_then(JsonValue::as_bool))
        .last()
        .unwrap_or(false)
}

#[async_trait]
impl EmbeddingModel for TransformersEmbeddingModel {
    fn provider(&self) -> &str {
        &self.config.provider
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn max_embeddings_per_call(&self) -> Option<usize> {
        Some(MAX_EMBEDDINGS_PER_CALL)
    }

    fn supports_parallel_calls(&self) -> bool {
        false
    }

    async fn do_embed(&self, options: EmbedOptions) -> Result<EmbedResponse, SdkError> {
        if options.values.len() > MAX_EMBEDDINGS_PER_CALL {
            return Err(SdkError::TooManyEmbeddingValues {
                provider: self.config.provider.clone(),
                model_id: self.model_id.clone(),
                max_embeddings_per_call: MAX_EMBEDDINGS_PER_CALL,
                values: options.values,
            });
        }
        let scopes = [GENERIC_SCOPE, self.config.provider.as_str()];
        let defaults = self.settings.default_options.as_ref();
        let options = scopes
            .iter()
            .fold(options, |opts, scope| build_embed_options(opts, scope, defaults));
        let normalize = normalize_requested(&options.provider_options, &scopes);
        // No transport to carry them; names are echoed, values never are.
        let mut ignored_headers: Vec<&str> = options.headers.keys().map(String::as_str).collect();
        ignored_headers.sort_unstable();
        if !ignored_headers.is_empty() {
            tracing::debug!(
                "[TRANSFORMERS]: headers ignored by local runtime: {:?}",
                ignored_headers
            );
        }

        let mut embeddings = Vec::with_capacity(options.values.len());
        let mut failures = Vec::new();
        for (index, value) in options.values.iter().enumerate() {
            match self.embed_one(value, normalize).await {
                Ok(embedding) => embeddings.push(embedding),
                Err(err) => {
                    tracing::warn!(
                        "[TRANSFORMERS]: embedding failed model={} index={}: {}",
                        self.model_id,
                        index,
                        err.format_details()
                    );
                    failures.push(json!({ "index": index, "error": err.format_details() }));
                    embeddings.push(Vec::new());
                }
            }
        }

        let raw_response = json!({
            "modelId": self.model_id,
            "count": embeddings.len(),
            "dimensions": embeddings.iter().map(Vec::len).max().unwrap_or(0),
            "normalized": normalize,
            "failures": failures,
            "ignoredHeaders": ignored_headers,
        });
        Ok(EmbedResponse {
            usage: Some(EmbedUsage {
                tokens: options.values.len() as u64,
            }),
            embeddings,
            raw_response: Some(raw_response),
        })
    }
}
