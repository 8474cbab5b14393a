use serde::{Deserialize, Serialize};

use crate::types::v2::{headers_is_empty, provider_options_is_empty, Headers, ProviderOptions};

/// Single embedding vector.
pub type Embedding = Vec<f32>;

/// Input options for embedding calls.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EmbedOptions {
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "headers_is_empty")]
    pub headers: Headers,
    #[serde(
        default,
        skip_serializing_if = "provider_options_is_empty",
        rename = "providerOptions"
    )]
    pub provider_options: ProviderOptions,
}

impl EmbedOptions {
    pub fn new(values: Vec<String>) -> Self {
        Self {
            values,
            ..Default::default()
        }
    }
}

/// Usage for an embedding call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EmbedUsage {
    pub tokens: u64,
}
