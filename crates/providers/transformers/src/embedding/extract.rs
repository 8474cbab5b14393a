//! Reshaping of feature-extraction output into per-token vectors.
//!
//! Runtimes hand back tensors, nested lists, convertible wrappers or plain
//! JSON objects depending on version and model. Detectors run in order; the
//! first one that recognises the shape wins.

use serde_json::Value as JsonValue;

use crate::ai_sdk_core::{FeatureOutput, Tensor};

pub type TokenVectors = Vec<Vec<f32>>;

type Detector = fn(&FeatureOutput) -> Option<TokenVectors>;

const NAMED_FIELDS: &[&str] = &["embedding", "embeddings", "vector", "vectors", "features"];

const DETECTORS: &[(&str, Detector)] = &[
    ("tensor", from_tensor),
    ("nested-array", from_nested_array),
    ("to-list", from_convertible),
    ("array-like", from_array_like),
    ("named-field", from_named_field),
];

/// Run the detector chain; `None` when no detector recognises the shape.
pub fn extract_token_vectors(output: &FeatureOutput) -> Option<TokenVectors> {
    DETECTORS.iter().find_map(|(name, detect)| {
        let vectors = detect(output)?;
        tracing::trace!("[TRANSFORMERS]: feature output matched {name}");
        Some(vectors)
    })
}

/// Component-wise mean over the token axis.
///
/// The first vector fixes the width; vectors of another width are left out
/// of both the sum and the count. No tokens or zero width yields an empty
/// vector.
pub fn mean_pool(vectors: &[Vec<f32>]) -> Vec<f32> {
    let width = match vectors.first() {
        Some(first) if !first.is_empty() => first.len(),
        _ => return Vec::new(),
    };
    let mut sum = vec![0.0_f32; width];
    let mut count = 0usize;
    for vector in vectors.iter().filter(|v| v.len() == width) {
        for (acc, x) in sum.iter_mut().zip(vector) {
            *acc += *x;
        }
        count += 1;
    }
    let denom = count as f32;
    sum.iter_mut().for_each(|x| *x /= denom);
    sum
}

/// Scale a vector to unit L2 norm; zero vectors are returned unchanged.
pub fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
    vector
}

fn from_tensor(output: &FeatureOutput) -> Option<TokenVectors> {
    match output {
        FeatureOutput::Tensor(tensor) => reshape_flat(tensor),
        FeatureOutput::Json(JsonValue::Object(map)) => {
            let data = map.get("data")?;
            match map.get("dims").and_then(json_dims) {
                Some(dims) if data.as_array().is_some_and(|a| a.iter().all(|v| v.is_number())) => {
                    reshape_flat(&Tensor::new(json_numbers(data)?, dims))
                }
                _ => json_to_vectors(data),
            }
        }
        _ => None,
    }
}

fn from_nested_array(output: &FeatureOutput) -> Option<TokenVectors> {
    match output {
        FeatureOutput::Nested(rows) => Some(rows.clone()),
        FeatureOutput::Json(value @ JsonValue::Array(_)) => json_to_vectors(value),
        _ => None,
    }
}

fn from_convertible(output: &FeatureOutput) -> Option<TokenVectors> {
    match output {
        FeatureOutput::Convertible(wrapper) => wrapper.to_list(),
        _ => None,
    }
}

/// Objects keyed by consecutive indices ("0", "1", ...), e.g. serialized typed arrays.
fn from_array_like(output: &FeatureOutput) -> Option<TokenVectors> {
    let FeatureOutput::Json(JsonValue::Object(map)) = output else {
        return None;
    };
    if map.is_empty() {
        return None;
    }
    let mut indexed = map
        .iter()
        .map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v.clone())))
        .collect::<Option<Vec<_>>>()?;
    indexed.sort_by_key(|(i, _)| *i);
    if indexed.iter().enumerate().any(|(pos, (i, _))| pos != *i) {
        return None;
    }
    json_to_vectors(&JsonValue::Array(
        indexed.into_iter().map(|(_, v)| v).collect(),
    ))
}

fn from_named_field(output: &FeatureOutput) -> Option<TokenVectors> {
    let FeatureOutput::Json(JsonValue::Object(map)) = output else {
        return None;
    };
    NAMED_FIELDS.iter().find_map(|field| {
        let value = map.get(*field)?;
        match value {
            JsonValue::Object(_) => from_tensor(&FeatureOutput::Json(value.clone())),
            other => json_to_vectors(other),
        }
    })
}

fn reshape_flat(tensor: &Tensor) -> Option<TokenVectors> {
    let width = match tensor.dims.last() {
        Some(w) => *w,
        None if tensor.data.is_empty() => return Some(Vec::new()),
        None => tensor.data.len(),
    };
    if width == 0 {
        return Some(Vec::new());
    }
    if tensor.data.len() % width != 0 {
        return None;
    }
    Some(tensor.data.chunks(width).map(<[f32]>::to_vec).collect())
}

fn json_dims(value: &JsonValue) -> Option<Vec<usize>> {
    value
        .as_array()?
        .iter()
        .map(|d| d.as_u64().and_then(|d| usize::try_from(d).ok()))
        .collect()
}

fn json_numbers(value: &JsonValue) -> Option<Vec<f32>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect()
}

/// Accepts a single vector, a list of vectors, or a batch of lists of vectors.
fn json_to_vectors(value: &JsonValue) -> Option<TokenVectors> {
    let items = value.as_array()?;
    if items.is_empty() {
        return Some(Vec::new());
    }
    if items.iter().all(JsonValue::is_number) {
        return Some(vec![json_numbers(value)?]);
    }
    if items.iter().all(|row| row.as_array().is_some_and(|r| r.iter().all(JsonValue::is_number))) {
        return items.iter().map(json_numbers).collect();
    }
    if items.iter().all(JsonValue::is_array) {
        let mut rows = Vec::new();
        for batch in items {
            rows.extend(json_to_vectors(batch)?);
        }
        return Some(rows);
    }
    None
}
