//! Provider defaults for call and embedding options.
//!
//! Precedence order:
//! 1) Explicit call options take priority.
//! 2) Model defaults fill missing values for the exact provider scope.
//!
//! Only exact provider scope keys are accepted; inline or aliased scopes are ignored.

use std::collections::HashMap;

use crate::ai_sdk_types::embedding::EmbedOptions;
use crate::ai_sdk_types::v2 as v2t;
use serde_json::Value as JsonValue;

fn merge_json_defaults(target: &mut JsonValue, defaults: &JsonValue) {
    if let (JsonValue::Object(target_map), JsonValue::Object(defaults_map)) = (target, defaults) {
        for (k, v) in defaults_map {
            match target_map.get_mut(k) {
                Some(existing) => merge_json_defaults(existing, v),
                None => {
                    target_map.insert(k.clone(), v.clone());
                }
            }
        }
    }
}

fn merge_scope_defaults(
    target: &mut v2t::ProviderOptions,
    provider_scope: &str,
    defaults: &HashMap<String, JsonValue>,
) {
    let entry = target.entry(provider_scope.to_string()).or_default();
    for (key, val) in defaults {
        match entry.get_mut(key) {
            Some(existing) => merge_json_defaults(existing, val),
            None => {
                entry.insert(key.clone(), val.clone());
            }
        }
    }
}

/// Merge config defaults into call options for the exact provider scope.
/// Returns the merged options for chaining convenience.
pub fn build_call_options(
    mut opts: v2t::CallOptions,
    provider_scope: &str,
    config_defaults: Option<&v2t::ProviderOptions>,
) -> v2t::CallOptions {
    if let Some(defaults) = config_defaults {
        if let Some(scope_defaults) = defaults.get(provider_scope) {
            merge_scope_defaults(&mut opts.provider_options, provider_scope, scope_defaults);
        }
    }
    opts
}

/// Merge config defaults into embedding options for the exact provider scope.
pub fn build_embed_options(
    mut opts: EmbedOptions,
    provider_scope: &str,
    config_defaults: Option<&v2t::ProviderOptions>,
) -> EmbedOptions {
    if let Some(defaults) = config_defaults {
        if let Some(scope_defaults) = defaults.get(provider_scope) {
            merge_scope_defaults(&mut opts.provider_options, provider_scope, scope_defaults);
        }
    }
    opts
}
