//! Seam to the local transformer runtime.
//!
//! The runtime owns tokenization, model loading and inference. Providers only
//! see pipelines: a text-generation pipeline (with its tokenizer) and a
//! feature-extraction pipeline, both created through [`TransformersRuntime`].

use crate::core::error::RuntimeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fmt;
use std::sync::Arc;

/// Task names understood by the runtime's pipeline factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineTask {
    TextGeneration,
    FeatureExtraction,
}

impl PipelineTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineTask::TextGeneration => "text-generation",
            PipelineTask::FeatureExtraction => "feature-extraction",
        }
    }
}

impl fmt::Display for PipelineTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options forwarded to the runtime when a pipeline is created.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PipelineLoadOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default)]
    pub local_files_only: bool,
    /// Hub access token; never logged.
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

impl fmt::Debug for PipelineLoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineLoadOptions")
            .field("dtype", &self.dtype)
            .field("device", &self.device)
            .field("revision", &self.revision)
            .field("local_files_only", &self.local_files_only)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Options handed to a text-generation pipeline call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub do_sample: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_repeat_ngram_size: Option<u32>,
    pub return_full_text: bool,
    /// Runtime-specific extras passed through untouched.
    #[serde(flatten)]
    pub extra: JsonMap<String, JsonValue>,
}

/// One generated sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TextGenerationOutput {
    pub generated_text: String,
    /// Runtime-specific stop code, when the runtime reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Pooling requested from the feature-extraction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Pooling {
    #[default]
    None,
    Mean,
    Cls,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FeatureExtractionOptions {
    pub pooling: Pooling,
    pub normalize: bool,
}

/// Dense tensor with a flat row-major data buffer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tensor {
    pub data: Vec<f32>,
    pub dims: Vec<usize>,
}

impl Tensor {
    pub fn new(data: Vec<f32>, dims: Vec<usize>) -> Self {
        Self { data, dims }
    }
}

/// Outputs that know how to turn themselves into nested lists.
pub trait ToNestedList: Send + Sync {
    fn to_list(&self) -> Option<Vec<Vec<f32>>>;
}

/// Raw output of a feature-extraction call. The shape depends on the runtime
/// build and the model, so several forms are accepted.
pub enum FeatureOutput {
    Tensor(Tensor),
    Nested(Vec<Vec<f32>>),
    Convertible(Box<dyn ToNestedList>),
    Json(JsonValue),
}

impl fmt::Debug for FeatureOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureOutput::Tensor(t) => f.debug_tuple("Tensor").field(&t.dims).finish(),
            FeatureOutput::Nested(rows) => f.debug_tuple("Nested").field(&rows.len()).finish(),
            FeatureOutput::Convertible(_) => f.write_str("Convertible(..)"),
            FeatureOutput::Json(v) => f.debug_tuple("Json").field(v).finish(),
        }
    }
}

/// Decodes token ids produced during generation.
pub trait Tokenizer: Send + Sync {
    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String, RuntimeError>;
}

/// Forwards every generated token to a callback.
///
/// Runtimes call [`TextStreamer::put_text`] when they already have decoded text,
/// or [`TextStreamer::put`] with raw ids, which are decoded with the wrapped
/// tokenizer.
pub struct TextStreamer {
    tokenizer: Option<Arc<dyn Tokenizer>>,
    skip_special_tokens: bool,
    callback: Box<dyn FnMut(String) + Send>,
    ended: bool,
}

impl TextStreamer {
    pub fn new<F>(tokenizer: Option<Arc<dyn Tokenizer>>, callback: F) -> Self
    where
        F: FnMut(String) + Send + 'static,
    {
        Self {
            tokenizer,
            skip_special_tokens: true,
            callback: Box::new(callback),
            ended: false,
        }
    }

    pub fn put_text(&mut self, text: &str) {
        if self.ended || text.is_empty() {
            return;
        }
        (self.callback)(text.to_string());
    }

    pub fn put(&mut self, ids: &[u32]) -> Result<(), RuntimeError> {
        if self.ended || ids.is_empty() {
            return Ok(());
        }
        let tokenizer = self
            .tokenizer
            .as_ref()
            .ok_or_else(|| RuntimeError::Other("streamer has no tokenizer".into()))?;
        let text = tokenizer.decode(ids, self.skip_special_tokens)?;
        self.put_text(&text);
        Ok(())
    }

    /// Marks the end of generation; later tokens are dropped.
    pub fn end(&mut self) {
        self.ended = true;
    }
}

#[async_trait]
pub trait TextGenerationPipeline: Send + Sync {
    fn tokenizer(&self) -> Option<Arc<dyn Tokenizer>>;

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
        streamer: Option<TextStreamer>,
    ) -> Result<Vec<TextGenerationOutput>, RuntimeError>;
}

#[async_trait]
pub trait FeatureExtractionPipeline: Send + Sync {
    async fn extract(
        &self,
        text: &str,
        options: &FeatureExtractionOptions,
    ) -> Result<FeatureOutput, RuntimeError>;
}

/// Pipeline handle returned by the runtime.
#[derive(Clone)]
pub enum Pipeline {
    TextGeneration(Arc<dyn TextGenerationPipeline>),
    FeatureExtraction(Arc<dyn FeatureExtractionPipeline>),
}

impl Pipeline {
    pub fn task(&self) -> PipelineTask {
        match self {
            Pipeline::TextGeneration(_) => PipelineTask::TextGeneration,
            Pipeline::FeatureExtraction(_) => PipelineTask::FeatureExtraction,
        }
    }

    pub fn into_text_generation(self) -> Result<Arc<dyn TextGenerationPipeline>, RuntimeError> {
        match self {
            Pipeline::TextGeneration(p) => Ok(p),
            other => Err(RuntimeError::TaskMismatch {
                expected: PipelineTask::TextGeneration.to_string(),
                actual: other.task().to_string(),
            }),
        }
    }

    pub fn into_feature_extraction(
        self,
    ) -> Result<Arc<dyn FeatureExtractionPipeline>, RuntimeError> {
        match self {
            Pipeline::FeatureExtraction(p) => Ok(p),
            other => Err(RuntimeError::TaskMismatch {
                expected: PipelineTask::FeatureExtraction.to_string(),
                actual: other.task().to_string(),
            }),
        }
    }
}

/// Pipeline factory of the local runtime.
#[async_trait]
pub trait TransformersRuntime: Send + Sync {
    async fn load_pipeline(
        &self,
        task: PipelineTask,
        model_id: &str,
        options: &PipelineLoadOptions,
    ) -> Result<Pipeline, RuntimeError>;
}
