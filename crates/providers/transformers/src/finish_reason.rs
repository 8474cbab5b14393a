use crate::ai_sdk_types::v2::FinishReason;

/// Map a runtime stop code onto the closed finish-reason set.
pub fn map_finish_reason(reason: Option<&str>) -> FinishReason {
    let normalized = reason
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
        .replace('-', "_");
    match normalized.as_str() {
        "" => FinishReason::Unknown,
        "stop" | "eos" | "eos_token" | "stop_sequence" | "end_turn" => FinishReason::Stop,
        "length" | "max_length" | "max_tokens" | "max_new_tokens" => FinishReason::Length,
        "content_filter" => FinishReason::ContentFilter,
        "function_call" | "tool_calls" => FinishReason::ToolCalls,
        "error" => FinishReason::Error,
        _ => FinishReason::Other,
    }
}
