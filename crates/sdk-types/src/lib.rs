//! Unified type definitions for the local transformer provider.
//!
//! This crate provides the provider-agnostic types used for prompts, call
//! options, streaming parts and embedding calls.

pub mod embedding;
pub mod v2;

// Re-export commonly used types at the crate root
pub use self::v2::{MessageContent, Prompt, PromptMessage, PromptPart};
