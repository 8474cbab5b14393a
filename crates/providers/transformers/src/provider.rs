use std::sync::Arc;

use crate::ai_sdk_core::{EmbeddingModel, LanguageModel, SdkError, TransformersRuntime};
use crate::ai_sdk_provider::{ModelConfig, Provider, ProviderSettings};

use crate::provider_transformers::embedding::embedding_model::TransformersEmbeddingModel;
use crate::provider_transformers::language_model::{GenerationMode, TransformersLanguageModel};
use crate::provider_transformers::options::TransformersModelSettings;

/// Factory for models backed by one local runtime.
///
/// Every call builds a fresh adapter with its own pipeline handle; only the
/// derived configuration and the runtime are shared.
#[derive(Clone)]
pub struct TransformersProvider {
    config: Arc<ModelConfig>,
    runtime: Arc<dyn TransformersRuntime>,
}

impl TransformersProvider {
    pub fn new(settings: ProviderSettings, runtime: Arc<dyn TransformersRuntime>) -> Self {
        tracing::debug!("[TRANSFORMERS]: provider created name={}", settings.name);
        Self {
            config: Arc::new(ModelConfig::from_settings(&settings)),
            runtime,
        }
    }

    pub fn config(&self) -> &Arc<ModelConfig> {
        &self.config
    }

    /// Alias of [`TransformersProvider::chat_model`].
    pub fn language_model(
        &self,
        model_id: &str,
        settings: TransformersModelSettings,
    ) -> TransformersLanguageModel {
        self.chat_model(model_id, settings)
    }

    pub fn chat_model(
        &self,
        model_id: &str,
        settings: TransformersModelSettings,
    ) -> TransformersLanguageModel {
        self.build_language_model(model_id, GenerationMode::Chat, settings)
    }

    pub fn completion_model(
        &self,
        model_id: &str,
        settings: TransformersModelSettings,
    ) -> TransformersLanguageModel {
        self.build_language_model(model_id, GenerationMode::Completion, settings)
    }

    pub fn openai_compatible_model(
        &self,
        model_id: &str,
        settings: TransformersModelSettings,
    ) -> TransformersLanguageModel {
        self.build_language_model(model_id, GenerationMode::OpenAICompatible, settings)
    }

    pub fn text_embedding_model(
        &self,
        model_id: &str,
        settings: TransformersModelSettings,
    ) -> TransformersEmbeddingModel {
        TransformersEmbeddingModel::new(
            model_id,
            self.config.clone(),
            settings,
            self.runtime.clone(),
        )
    }

    fn build_language_model(
        &self,
        model_id: &str,
        mode: GenerationMode,
        settings: TransformersModelSettings,
    ) -> TransformersLanguageModel {
        TransformersLanguageModel::new(
            model_id,
            mode,
            self.config.clone(),
            settings,
            self.runtime.clone(),
        )
    }
}

impl Provider for TransformersProvider {
    fn language_model(&self, model_id: &str) -> Result<Arc<dyn LanguageModel>, SdkError> {
        if model_id.trim().is_empty() {
            return Err(SdkError::InvalidArgument {
                message: "model id must not be empty".into(),
            });
        }
        Ok(Arc::new(self.chat_model(
            model_id,
            TransformersModelSettings::default(),
        )))
    }

    fn text_embedding_model(&self, model_id: &str) -> Result<Arc<dyn EmbeddingModel>, SdkError> {
        if model_id.trim().is_empty() {
            return Err(SdkError::InvalidArgument {
                message: "model id must not be empty".into(),
            });
        }
        Ok(Arc::new(TransformersProvider::text_embedding_model(
            self,
            model_id,
            TransformersModelSettings::default(),
        )))
    }
}

/// Convenience constructor mirroring the other provider factories.
pub fn create_transformers(
    settings: ProviderSettings,
    runtime: Arc<dyn TransformersRuntime>,
) -> TransformersProvider {
    TransformersProvider::new(settings, runtime)
}
