//! Vercel-compatible LanguageModel interface and helpers.

use crate::ai_sdk_types::v2 as v2t;
use crate::core::SdkError;
use futures_core::Stream;
use std::pin::Pin;

/// Stream of structured parts from the model.
pub type PartStream = Pin<Box<dyn Stream<Item = Result<v2t::StreamPart, SdkError>> + Send>>;

/// Generate response payload.
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    pub text: String,
    pub finish_reason: v2t::FinishReason,
    /// Estimated from character counts.
    pub usage: v2t::Usage,
    pub raw_call: v2t::RawCall,
    pub raw_response: Option<serde_json::Value>,
    pub request_body: serde_json::Value,
    pub warnings: Vec<v2t::CallWarning>,
}

/// Stream response envelope.
pub struct StreamResponse {
    pub stream: PartStream,
    pub raw_call: v2t::RawCall,
    pub request_body: serde_json::Value,
    pub warnings: Vec<v2t::CallWarning>,
}

/// Language model interface (Vercel AI SDK parity).
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Interface version; constant "v1" for local runtimes.
    fn specification_version(&self) -> &'static str {
        "v1"
    }
    /// Provider tag for logging/telemetry.
    fn provider(&self) -> &str;
    /// Provider-specific model identifier.
    fn model_id(&self) -> &str;
    /// Default object generation mode; local pipelines only produce text.
    fn default_object_generation_mode(&self) -> Option<&'static str> {
        None
    }

    async fn do_generate(&self, options: v2t::CallOptions) -> Result<GenerateResponse, SdkError>;
    async fn do_stream(&self, options: v2t::CallOptions) -> Result<StreamResponse, SdkError>;
}
