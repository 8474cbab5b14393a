//! Local transformer-runtime provider for the uniform language and embedding model traits.

pub mod finish_reason;
pub mod language_model;
pub mod options;
pub mod prompt;
pub mod provider;
mod stream;
pub mod embedding {
    pub mod embedding_model;
    pub mod extract;
}

pub use embedding::embedding_model::{TransformersEmbeddingModel, MAX_EMBEDDINGS_PER_CALL};
pub use language_model::{estimate_tokens, GenerationMode, TransformersLanguageModel};
pub use options::{TransformersModelSettings, TransformersProviderOptions};
pub use prompt::normalize_prompt;
pub use provider::{create_transformers, TransformersProvider};

#[cfg(test)]
#[path = "../tests/test_runtime.rs"]
mod test_runtime;

#[cfg(test)]
#[path = "../tests/prompt_tests.rs"]
mod prompt_tests;

#[cfg(test)]
#[path = "../tests/language_model_tests.rs"]
mod language_model_tests;

#[cfg(test)]
#[path = "../tests/stream_tests.rs"]
mod stream_tests;

#[cfg(test)]
#[path = "../tests/embedding_model_tests.rs"]
mod embedding_model_tests;

#[cfg(test)]
#[path = "../tests/provider_tests.rs"]
mod provider_tests;
