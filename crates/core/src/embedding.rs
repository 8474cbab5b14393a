use crate::ai_sdk_types::embedding as embt;

use crate::core::SdkError;

/// Response from an embedding model call.
#[derive(Debug, Clone)]
pub struct EmbedResponse {
    /// One vector per input value, in input order. Failed items are empty.
    pub embeddings: Vec<embt::Embedding>,
    pub usage: Option<embt::EmbedUsage>,
    pub raw_response: Option<serde_json::Value>,
}

/// Embedding model interface (parity with Vercel EmbeddingModelV1).
#[async_trait::async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Interface version; constant "v1" for local runtimes.
    fn specification_version(&self) -> &'static str {
        "v1"
    }
    /// Provider tag for logging/telemetry.
    fn provider(&self) -> &str;
    /// Provider-specific model identifier.
    fn model_id(&self) -> &str;
    /// Limit of embeddings per call, if enforced by the provider.
    fn max_embeddings_per_call(&self) -> Option<usize> {
        None
    }
    /// Whether multiple embedding calls may be executed in parallel.
    fn supports_parallel_calls(&self) -> bool {
        true
    }

    async fn do_embed(&self, options: embt::EmbedOptions) -> Result<EmbedResponse, SdkError>;
}
