use crate::ai_sdk_core::options::merge_options_with_disallow;
use crate::ai_sdk_core::{GenerationOptions, PipelineLoadOptions};
use crate::ai_sdk_provider::ModelConfig;
use crate::ai_sdk_types::v2 as v2t;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Scope name accepted for provider options regardless of the provider tag.
pub const GENERIC_SCOPE: &str = "transformers";

/// Keys owned by typed generation fields; extras may not override them.
const RESERVED_KEYS: &[&str] = &[
    "max_new_tokens",
    "temperature",
    "do_sample",
    "return_full_text",
    "top_k",
    "top_p",
    "repetition_penalty",
    "no_repeat_ngram_size",
];

const KNOWN_KEYS: &[&str] = &["topK", "topP", "repetitionPenalty", "noRepeatNgramSize"];

/// Per-model settings supplied when a model is created.
#[derive(Debug, Clone, Default)]
pub struct TransformersModelSettings {
    pub dtype: Option<String>,
    pub device: Option<String>,
    pub revision: Option<String>,
    pub local_files_only: bool,
    /// Provider-scoped defaults merged into every call; explicit call options win.
    pub default_options: Option<v2t::ProviderOptions>,
}

impl TransformersModelSettings {
    pub fn with_dtype(mut self, dtype: impl Into<String>) -> Self {
        self.dtype = Some(dtype.into());
        self
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn with_local_files_only(mut self, local_files_only: bool) -> Self {
        self.local_files_only = local_files_only;
        self
    }

    pub fn with_default_options(mut self, defaults: v2t::ProviderOptions) -> Self {
        self.default_options = Some(defaults);
        self
    }

    pub(crate) fn load_options(&self, config: &ModelConfig) -> PipelineLoadOptions {
        PipelineLoadOptions {
            dtype: self.dtype.clone(),
            device: self.device.clone(),
            revision: self.revision.clone(),
            local_files_only: self.local_files_only,
            access_token: config.api_key.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformersProviderOptions {
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub repetition_penalty: Option<f32>,
    pub no_repeat_ngram_size: Option<u32>,
}

/// Parse providerOptions for the given provider scope names.
/// Later scopes override earlier scopes, for known keys and extras alike.
pub fn parse_transformers_provider_options(
    provider_options: &v2t::ProviderOptions,
    provider_scope_names: &[&str],
) -> (TransformersProviderOptions, Option<JsonMap<String, JsonValue>>) {
    let mut merged = TransformersProviderOptions::default();
    let mut extras = JsonMap::new();
    let mut found = false;
    for name in provider_scope_names {
        let Some(map) = provider_options.get(*name) else {
            continue;
        };
        found = true;
        if let Some(v) = map
            .get("topK")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
        {
            merged.top_k = Some(v);
        }
        if let Some(v) = map.get("topP").and_then(|v| v.as_f64()) {
            merged.top_p = Some(v as f32);
        }
        if let Some(v) = map.get("repetitionPenalty").and_then(|v| v.as_f64()) {
            merged.repetition_penalty = Some(v as f32);
        }
        if let Some(v) = map
            .get("noRepeatNgramSize")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
        {
            merged.no_repeat_ngram_size = Some(v);
        }
        for (k, v) in map.iter() {
            if !KNOWN_KEYS.contains(&k.as_str()) {
                extras.insert(k.clone(), v.clone());
            }
        }
    }

    if !found {
        return (TransformersProviderOptions::default(), None);
    }
    (merged, Some(extras))
}

/// Sampling is enabled exactly when the temperature is positive.
pub fn do_sample_for(temperature: f32) -> bool {
    temperature > 0.0
}

/// Derive the runtime generation options for a call.
pub fn build_generation_options(
    options: &v2t::CallOptions,
    provider_scope_names: &[&str],
) -> (GenerationOptions, Vec<v2t::CallWarning>) {
    let mut warnings = unsupported_setting_warnings(options);
    let (prov_opts, prov_extras) =
        parse_transformers_provider_options(&options.provider_options, provider_scope_names);

    let temperature = options.temperature.unwrap_or(DEFAULT_TEMPERATURE);
    let mut extra = JsonMap::new();
    if let Some(extras) = prov_extras {
        let skipped = merge_options_with_disallow(&mut extra, &extras, RESERVED_KEYS);
        for key in skipped {
            warnings.push(v2t::CallWarning::Other {
                message: format!(
                    "provider option '{key}' shadows a typed generation option and was ignored"
                ),
            });
        }
    }

    let generation = GenerationOptions {
        max_new_tokens: options.max_output_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        temperature,
        do_sample: do_sample_for(temperature),
        top_p: options.top_p.or(prov_opts.top_p),
        top_k: options.top_k.or(prov_opts.top_k),
        repetition_penalty: prov_opts.repetition_penalty,
        no_repeat_ngram_size: prov_opts.no_repeat_ngram_size,
        return_full_text: false,
        extra,
    };
    tracing::debug!(
        "[TRANSFORMERS]: generation max_new_tokens={} temperature={} do_sample={}",
        generation.max_new_tokens,
        generation.temperature,
        generation.do_sample
    );
    (generation, warnings)
}

fn unsupported_setting_warnings(options: &v2t::CallOptions) -> Vec<v2t::CallWarning> {
    let mut warnings = Vec::new();
    let mut unsupported = |setting: &str, details: Option<&str>| {
        warnings.push(v2t::CallWarning::UnsupportedSetting {
            setting: setting.into(),
            details: details.map(str::to_string),
        });
    };
    if !options.tools.is_empty() {
        unsupported("tools", None);
    }
    if options.tool_choice.is_some() {
        unsupported("toolChoice", None);
    }
    if matches!(options.response_format, Some(v2t::ResponseFormat::Json { .. })) {
        unsupported(
            "responseFormat",
            Some("JSON response format is not supported."),
        );
    }
    if options.stop_sequences.as_ref().is_some_and(|s| !s.is_empty()) {
        unsupported("stopSequences", None);
    }
    if options.presence_penalty.is_some() {
        unsupported("presencePenalty", None);
    }
    if options.frequency_penalty.is_some() {
        unsupported("frequencyPenalty", None);
    }
    if options.seed.is_some() {
        unsupported("seed", None);
    }
    warnings
}
