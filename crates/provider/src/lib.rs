//! Provider settings and the uniform "model by id" surface.
//!
//! This crate defines the settings supplied by the application layer, the
//! configuration record shared by every model a provider creates, and the
//! [`Provider`] trait implemented by provider factories.

use crate::ai_sdk_core::{EmbeddingModel, LanguageModel, SdkError};
use std::fmt;
use std::sync::Arc;

/// Default provider tag when the application does not pick one.
pub const DEFAULT_PROVIDER_NAME: &str = "transformers";

/// Settings provided by the application layer.
#[derive(Clone)]
pub struct ProviderSettings {
    /// Provider tag propagated into every model configuration.
    pub name: String,
    /// Optional key; interpreted by the runtime (e.g. as a model hub token).
    pub api_key: Option<String>,
}

impl ProviderSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self::new(DEFAULT_PROVIDER_NAME)
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("name", &self.name)
            .field("api_key", &redacted(&self.api_key))
            .finish()
    }
}

/// Configuration shared by all models created by one provider instance.
#[derive(Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub provider: String,
    pub api_key: Option<String>,
}

impl ModelConfig {
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self {
            provider: settings.name.clone(),
            api_key: settings.api_key.clone(),
        }
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("api_key", &redacted(&self.api_key))
            .finish()
    }
}

fn redacted(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "<redacted>")
}

/// Uniform model lookup exposed by provider factories.
pub trait Provider: Send + Sync {
    fn language_model(&self, model_id: &str) -> Result<Arc<dyn LanguageModel>, SdkError>;
    fn text_embedding_model(&self, model_id: &str) -> Result<Arc<dyn EmbeddingModel>, SdkError>;
}
