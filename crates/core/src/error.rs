use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("cancelled")]
    Cancelled,
    #[error("too many embedding values for {provider}/{model_id}: {} (max {max_embeddings_per_call} per call)", .values.len())]
    TooManyEmbeddingValues {
        provider: String,
        model_id: String,
        max_embeddings_per_call: usize,
        values: Vec<String>,
    },
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl SdkError {
    /// Format error details for better debugging visibility
    pub fn format_details(&self) -> String {
        match self {
            SdkError::TooManyEmbeddingValues {
                provider,
                model_id,
                max_embeddings_per_call,
                values,
            } => format!(
                "{provider}/{model_id} accepts at most {max_embeddings_per_call} values per call, got {}",
                values.len()
            ),
            SdkError::Runtime(re) => match re {
                RuntimeError::Load {
                    task,
                    model_id,
                    message,
                } => format!("failed to load {task} pipeline for {model_id}: {message}"),
                other => format!("runtime error: {}", other),
            },
            SdkError::Cancelled => "cancelled".to_string(),
            SdkError::Serde(se) => format!("serde error: {}", se),
            SdkError::InvalidArgument { message } => format!("invalid argument: {}", message),
        }
    }

    /// True when the error was raised before any runtime work happened.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SdkError::TooManyEmbeddingValues { .. } | SdkError::InvalidArgument { .. }
        )
    }
}

/// Failures reported by the local transformer runtime.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    #[error("failed to load {task} pipeline for {model_id}: {message}")]
    Load {
        task: String,
        model_id: String,
        message: String,
    },
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("runtime returned a {actual} pipeline where {expected} was requested")]
    TaskMismatch {
        expected: String,
        actual: String,
    },
    #[error("other: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::{RuntimeError, SdkError};

    #[test]
    fn too_many_values_reports_limit_and_count() {
        let err = SdkError::TooManyEmbeddingValues {
            provider: "transformers".into(),
            model_id: "Xenova/all-MiniLM-L6-v2".into(),
            max_embeddings_per_call: 2,
            values: vec!["a".into(), "b".into(), "c".into()],
        };
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "too many embedding values for transformers/Xenova/all-MiniLM-L6-v2: 3 (max 2 per call)"
        );
        assert_eq!(
            err.format_details(),
            "transformers/Xenova/all-MiniLM-L6-v2 accepts at most 2 values per call, got 3"
        );
    }

    #[test]
    fn runtime_errors_convert_and_are_not_validation() {
        let err: SdkError = RuntimeError::Load {
            task: "text-generation".into(),
            model_id: "onnx-community/Qwen2.5-0.5B-Instruct".into(),
            message: "missing weights".into(),
        }
        .into();
        assert!(!err.is_validation());
        assert_eq!(
            err.format_details(),
            "failed to load text-generation pipeline for onnx-community/Qwen2.5-0.5B-Instruct: missing weights"
        );
    }

    #[test]
    fn every_runtime_error_renders_its_cause() {
        let cases = [
            RuntimeError::Load {
                task: "feature-extraction".into(),
                model_id: "m".into(),
                message: "no onnx file".into(),
            },
            RuntimeError::Inference("nan logits".into()),
            RuntimeError::TaskMismatch {
                expected: "text-generation".into(),
                actual: "feature-extraction".into(),
            },
            RuntimeError::Other("busy".into()),
        ];
        for err in cases {
            let needle = match &err {
                RuntimeError::Load { message, .. } => message.clone(),
                RuntimeError::Inference(msg) | RuntimeError::Other(msg) => msg.clone(),
                RuntimeError::TaskMismatch { actual, .. } => actual.clone(),
            };
            assert!(SdkError::from(err).format_details().contains(&needle));
        }
    }

    #[test]
    fn inference_errors_keep_message() {
        let err = SdkError::from(RuntimeError::Inference("out of memory".into()));
        match err {
            SdkError::Runtime(RuntimeError::Inference(msg)) => assert_eq!(msg, "out of memory"),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }
}
