//! LanguageModel parity types inspired by Vercel AI SDK.
//! These types are provider-agnostic and designed for interop with adapters.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

// ---------- Provider plumbing ----------

/// Provider-specific input options passed through to providers.
/// Outer key is the provider id; inner keys are provider-defined option names.
pub type ProviderOptions = HashMap<String, HashMap<String, JsonValue>>;

/// Header map attached to calls.
pub type Headers = HashMap<String, String>;

pub(crate) fn headers_is_empty(map: &HashMap<String, String>) -> bool {
    map.is_empty()
}

pub(crate) fn provider_options_is_empty(map: &ProviderOptions) -> bool {
    map.is_empty()
}

// ---------- Prompt ----------

/// Prompt accepted by language models: a raw string or role-tagged messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prompt {
    Text(String),
    Messages(Vec<PromptMessage>),
}

impl Default for Prompt {
    fn default() -> Self {
        Prompt::Text(String::new())
    }
}

impl From<&str> for Prompt {
    fn from(value: &str) -> Self {
        Prompt::Text(value.to_string())
    }
}

impl From<String> for Prompt {
    fn from(value: String) -> Self {
        Prompt::Text(value)
    }
}

impl From<Vec<PromptMessage>> for Prompt {
    fn from(value: Vec<PromptMessage>) -> Self {
        Prompt::Messages(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: MessageContent,
}

impl PromptMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn system<S: Into<String>>(s: S) -> Self {
        Self::new("system", s)
    }

    pub fn user<S: Into<String>>(s: S) -> Self {
        Self::new("user", s)
    }

    pub fn assistant<S: Into<String>>(s: S) -> Self {
        Self::new("assistant", s)
    }

    pub fn with_parts(role: impl Into<String>, parts: Vec<PromptPart>) -> Self {
        Self {
            role: role.into(),
            content: MessageContent::Parts(parts),
        }
    }
}

/// Message content. Anything that is neither a string nor a part list is
/// kept as raw JSON so that decoding never fails on odd inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(#[serde(deserialize_with = "parts_lenient")] Vec<PromptPart>),
    Other(JsonValue),
}

/// Decodes each part on its own so one odd part cannot drop its siblings.
fn parts_lenient<'de, D>(deserializer: D) -> Result<Vec<PromptPart>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<JsonValue>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(PromptPart::from_json_lenient).collect())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PromptPart {
    Text {
        text: String,
    },
    Reasoning {
        text: String,
    },
    Image {
        #[serde(default)]
        image: JsonValue,
        #[serde(default, skip_serializing_if = "Option::is_none", rename = "mediaType")]
        media_type: Option<String>,
    },
    File {
        #[serde(default)]
        data: JsonValue,
        #[serde(default, skip_serializing_if = "Option::is_none", rename = "mediaType")]
        media_type: Option<String>,
    },
    /// Any part type this adapter does not understand.
    #[serde(other)]
    Unsupported,
}

impl PromptPart {
    pub fn text(text: impl Into<String>) -> Self {
        PromptPart::Text { text: text.into() }
    }

    /// Decode a single part. Parts that do not decode, or decode as an
    /// unknown type, keep a string `text` field when they carry one.
    pub fn from_json_lenient(value: JsonValue) -> Self {
        let text = value
            .get("text")
            .and_then(JsonValue::as_str)
            .map(str::to_string);
        match serde_json::from_value::<PromptPart>(value) {
            Ok(PromptPart::Unsupported) | Err(_) => match text {
                Some(text) => PromptPart::Text { text },
                None => PromptPart::Unsupported,
            },
            Ok(part) => part,
        }
    }

    /// Text carried by the part, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PromptPart::Text { text } | PromptPart::Reasoning { text } => Some(text.as_str()),
            _ => None,
        }
    }
}

// ---------- Call options ----------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CallOptions {
    pub prompt: Prompt,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub top_p: Option<f32>,
    #[serde(default)]
    pub top_k: Option<u32>,
    #[serde(default)]
    pub presence_penalty: Option<f32>,
    #[serde(default)]
    pub frequency_penalty: Option<f32>,
    #[serde(default)]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub response_format: Option<ResponseFormat>,
    #[serde(default)]
    pub tools: Vec<JsonValue>,
    #[serde(default)]
    pub tool_choice: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "headers_is_empty")]
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "provider_options_is_empty")]
    pub provider_options: ProviderOptions,
    /// Best-effort cancellation; cannot interrupt runtime work that never yields.
    #[serde(skip)]
    pub abort_signal: Option<CancellationToken>,
}

impl CallOptions {
    pub fn new(prompt: impl Into<Prompt>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }
    pub fn with_temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }
    pub fn with_max_output_tokens(mut self, n: u32) -> Self {
        self.max_output_tokens = Some(n);
        self
    }
    pub fn with_abort_signal(mut self, token: CancellationToken) -> Self {
        self.abort_signal = Some(token);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResponseFormat {
    Text,
    Json {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<JsonValue>,
    },
}

// ---------- Warnings / finish / usage ----------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CallWarning {
    UnsupportedSetting {
        setting: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    Other {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    Error,
    Other,
    #[default]
    Unknown,
}

/// Token usage. Local models report estimates, not tokenizer counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl Usage {
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// What was actually handed to the runtime.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawCall {
    pub raw_prompt: String,
    pub raw_settings: JsonValue,
}

// ---------- Streaming ----------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamPart {
    TextDelta { text: String },
}
