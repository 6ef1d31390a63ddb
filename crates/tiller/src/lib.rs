//! Tiller is the provider-facing core of the tiller agent stack.
//!
//! # Overview
//! This crate defines the vocabulary shared between an agent loop and the
//! language-model backends that drive it:
//!
//! - The chat message model (user, assistant, tool-result messages and their
//!   content blocks)
//! - The streaming adapter interface, by which a backend produces an
//!   assistant message incrementally
//! - Model handles, usage accounting, and reasoning levels
//!
//! Concrete wire protocols (HTTP clients, token accounting, prompt caching)
//! are deliberately absent: backends implement [`stream::StreamAdapter`] and
//! stay behind that seam.

use serde::{Deserialize, Serialize};

/// Chat message model shared by adapters and agent loops
pub mod chat;

/// Error types and handling
pub mod error;

/// Streaming adapter interface and its event protocol
pub mod stream;

pub use chat::{
    AssistantBlock, AssistantMessage, ChatMessage, ContentBlock, StopReason, ToolCall,
    ToolResultMessage, UserMessage,
};
pub use error::LlmError;
pub use stream::{AssistantEvent, AssistantStream, LlmRequest, StreamAdapter, StreamOptions};

/// Handle naming a model within a provider.
///
/// The provider half exists so API-key resolvers can be keyed by provider
/// while the id is what the adapter forwards on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef {
    /// The provider that serves the model (e.g. "anthropic").
    pub provider: String,
    /// The provider-scoped model identifier.
    pub id: String,
}

impl ModelRef {
    pub fn new(provider: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for ModelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.id)
    }
}

/// Reasoning effort requested from the model for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningEffort {
    /// Low reasoning effort
    Low,
    /// Medium reasoning effort
    Medium,
    /// High reasoning effort
    High,
}

impl std::fmt::Display for ReasoningEffort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReasoningEffort::Low => write!(f, "low"),
            ReasoningEffort::Medium => write!(f, "medium"),
            ReasoningEffort::High => write!(f, "high"),
        }
    }
}

/// Token usage reported for one assistant message, supporting the JSON field
/// names of the common providers.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct Usage {
    /// Number of input tokens.
    #[serde(
        alias = "prompt_tokens", // OpenAI, xAI, DeepSeek, Mistral, OpenRouter
        alias = "input_tokens"   // Anthropic
    )]
    pub input_tokens: u32,
    /// Number of output tokens.
    #[serde(
        alias = "completion_tokens", // OpenAI, xAI, DeepSeek, Mistral, OpenRouter
        alias = "output_tokens"      // Anthropic
    )]
    pub output_tokens: u32,
}

impl Usage {
    /// Fold another usage record into this one, saturating on overflow.
    pub fn add(&mut self, other: &Usage) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }
}
