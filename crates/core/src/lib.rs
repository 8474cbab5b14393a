pub mod embedding;
pub mod error;
pub mod options;
pub mod pipeline_cell;
pub mod request_builder {
    pub mod defaults;
}
pub mod runtime;
pub mod stream_collect;
pub mod v2;

pub use crate::core::embedding::{EmbedResponse, EmbeddingModel};
pub use crate::core::error::{RuntimeError, SdkError};
pub use crate::core::pipeline_cell::PipelineCell;
pub use crate::core::runtime::{
    FeatureExtractionOptions, FeatureExtractionPipeline, FeatureOutput, GenerationOptions,
    Pipeline, PipelineLoadOptions, PipelineTask, Pooling, Tensor, TextGenerationOutput,
    TextGenerationPipeline, TextStreamer, ToNestedList, Tokenizer, TransformersRuntime,
};

// Re-export model trait and typed surfaces at the crate root
pub use crate::core::v2::{GenerateResponse, LanguageModel, PartStream, StreamResponse};
// Convenience re-exports of common types
pub use crate::ai_sdk_types::embedding::{EmbedOptions, EmbedUsage, Embedding};
pub use crate::ai_sdk_types::v2 as types;
