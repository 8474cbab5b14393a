use crate::ai_sdk_types::v2 as v2t;

/// Flatten a prompt into the single string a text-generation pipeline takes.
///
/// String prompts pass through untouched. Each message renders as one line:
/// part lists keep only parts carrying text, joined by a space; string
/// content renders as `"<role>: <content>"`; anything else renders empty.
pub fn normalize_prompt(prompt: &v2t::Prompt) -> String {
    match prompt {
        v2t::Prompt::Text(text) => text.clone(),
        v2t::Prompt::Messages(messages) => messages
            .iter()
            .map(render_message)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn render_message(message: &v2t::PromptMessage) -> String {
    match &message.content {
        v2t::MessageContent::Text(content) => format!("{}: {}", message.role, content),
        v2t::MessageContent::Parts(parts) => parts
            .iter()
            .filter_map(v2t::PromptPart::as_text)
            .collect::<Vec<_>>()
            .join(" "),
        v2t::MessageContent::Other(_) => String::new(),
    }
}
