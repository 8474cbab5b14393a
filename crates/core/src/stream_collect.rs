use futures_util::StreamExt;

use crate::ai_sdk_types::v2 as v2t;
use crate::core::{PartStream, SdkError};

/// Concatenate all text deltas of a stream.
///
/// Stops at the first error, which is returned as-is.
pub async fn collect_text(stream: PartStream) -> Result<String, SdkError> {
    let mut text = String::new();
    futures_util::pin_mut!(stream);
    while let Some(item) = stream.next().await {
        match item? {
            v2t::StreamPart::TextDelta { text: delta } => text.push_str(&delta),
        }
    }
    Ok(text)
}
