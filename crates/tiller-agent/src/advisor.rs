//! Advisor sub-agents: recursively nested runs fired after tool results.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tiller::chat::ToolResultMessage;
use tiller::{ModelRef, ReasoningEffort};

use crate::config::ApiKeyResolver;
use crate::model::Message;
use crate::projection::{Projection, StandardProjection};
use crate::tools::Tool;

/// What a tool execution looked like, handed to advisor hooks.
pub struct AdvisorParams<'a> {
    /// The parent log, including the tool result.
    pub messages: &'a [Message],
    pub tool_name: &'a str,
    pub tool_args: &'a Value,
    pub tool_result: &'a ToolResultMessage,
}

/// Starting state for an advisor's nested run. The seed messages become the
/// first pending batch of the child run.
pub struct AdvisorSeed {
    pub system_prompt: String,
    pub messages: Vec<Message>,
}

/// Caller-supplied behavior of an advisor.
///
/// `trigger` and `create_context` may fail; a failure surfaces as an
/// `advisor_error` event and skips the advisor without affecting the parent
/// run.
#[async_trait]
pub trait AdvisorHooks: Send + Sync {
    /// Decide whether this advisor fires for the given tool result.
    async fn trigger(&self, params: &AdvisorParams<'_>) -> anyhow::Result<bool>;

    /// Build the nested run's starting state.
    async fn create_context(&self, params: &AdvisorParams<'_>) -> anyhow::Result<AdvisorSeed>;

    /// Distill the child's new messages into the verdict injected into the
    /// parent log. An empty string injects nothing.
    fn extract_result(&self, messages: &[Message]) -> String {
        extract_last_assistant_text(messages)
    }
}

/// Default verdict extraction: text blocks of the last assistant message
/// joined with newlines. Thinking blocks are excluded.
pub fn extract_last_assistant_text(messages: &[Message]) -> String {
    messages
        .iter()
        .rev()
        .find_map(Message::as_assistant)
        .map(|assistant| assistant.text())
        .unwrap_or_default()
}

/// Configuration of one advisor.
pub struct Advisor {
    /// Stable identifier used in events and message tags.
    pub name: String,
    pub model: ModelRef,
    pub reasoning: Option<ReasoningEffort>,
    pub api_key: Option<String>,
    pub key_resolver: Option<Arc<dyn ApiKeyResolver>>,
    /// Tools available to the nested run; empty makes the advisor a
    /// single-shot LLM call.
    pub tools: Vec<Arc<dyn Tool>>,
    /// Nested advisors; arbitrary depth is supported.
    pub advisors: Vec<Arc<Advisor>>,
    /// Projection for the nested run.
    pub projection: Arc<dyn Projection>,
    pub hooks: Arc<dyn AdvisorHooks>,
}

impl Advisor {
    pub fn new(name: impl Into<String>, model: ModelRef, hooks: Arc<dyn AdvisorHooks>) -> Self {
        Self {
            name: name.into(),
            model,
            reasoning: None,
            api_key: None,
            key_resolver: None,
            tools: Vec::new(),
            advisors: Vec::new(),
            projection: Arc::new(StandardProjection),
            hooks,
        }
    }

    pub fn with_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_advisors(mut self, advisors: Vec<Arc<Advisor>>) -> Self {
        self.advisors = advisors;
        self
    }

    pub fn with_reasoning(mut self, reasoning: ReasoningEffort) -> Self {
        self.reasoning = Some(reasoning);
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_key_resolver(mut self, resolver: Arc<dyn ApiKeyResolver>) -> Self {
        self.key_resolver = Some(resolver);
        self
    }

    pub fn with_projection(mut self, projection: Arc<dyn Projection>) -> Self {
        self.projection = projection;
        self
    }
}
