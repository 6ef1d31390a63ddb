use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Usage;

/// A block of user-visible content, carried by user messages and tool
/// results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// A text block
    Text { text: String },
    /// A base64-encoded image with its MIME type
    Image { mime_type: String, data: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    /// The text of a `Text` block, or `None` for other block types.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// A message authored by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    pub content: Vec<ContentBlock>,
    /// Unix timestamp (seconds) of when the message was authored.
    pub created_at: i64,
}

impl UserMessage {
    pub fn new(content: Vec<ContentBlock>) -> Self {
        Self {
            content,
            created_at: now_unix(),
        }
    }

    /// Single text-block user message.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![ContentBlock::text(text)])
    }
}

/// A tool invocation requested by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// The provider-assigned id pairing this call with its result.
    pub id: String,
    /// The name of the tool being called.
    pub name: String,
    /// Parsed JSON arguments for the call.
    pub arguments: Value,
}

/// One block of an assistant message, in the order the model produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantBlock {
    /// Visible response text
    Text { text: String },
    /// Reasoning text; providers may omit these blocks entirely
    Thinking { thinking: String },
    /// A tool invocation request
    ToolCall(ToolCall),
}

/// Why the model stopped producing the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of turn
    Stop,
    /// The message ends in tool calls awaiting results
    ToolUse,
    /// The provider or transport failed
    Error,
    /// The caller cancelled the stream
    Aborted,
    /// The model hit its output token limit
    Length,
}

impl StopReason {
    /// True for the reasons that terminate a run without running tools.
    pub fn is_failure(self) -> bool {
        matches!(self, StopReason::Error | StopReason::Aborted)
    }
}

/// A complete (or in-progress) assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub blocks: Vec<AssistantBlock>,
    pub stop_reason: StopReason,
    /// Identifier of the model that produced the message.
    pub model: String,
    pub usage: Usage,
    /// Transport/provider error detail when `stop_reason` is a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AssistantMessage {
    /// Empty skeleton for a message about to be streamed.
    pub fn partial(model: impl Into<String>) -> Self {
        Self {
            blocks: Vec::new(),
            stop_reason: StopReason::Stop,
            model: model.into(),
            usage: Usage::default(),
            error: None,
        }
    }

    /// Terminal message representing a failed or aborted stream.
    pub fn failed(model: impl Into<String>, stop_reason: StopReason, error: String) -> Self {
        Self {
            blocks: Vec::new(),
            stop_reason,
            model: model.into(),
            usage: Usage::default(),
            error: Some(error),
        }
    }

    /// Tool calls in declaration order.
    pub fn tool_calls(&self) -> Vec<&ToolCall> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                AssistantBlock::ToolCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    /// All text blocks joined with newlines; thinking blocks are excluded.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                AssistantBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The outcome of one tool call, paired to it by `tool_call_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultMessage {
    pub tool_call_id: String,
    pub tool_name: String,
    pub content: Vec<ContentBlock>,
    /// Opaque payload for consumers; never sent to the model.
    #[serde(default)]
    pub details: Value,
    pub is_error: bool,
    pub created_at: i64,
}

impl ToolResultMessage {
    pub fn new(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: Vec<ContentBlock>,
        details: Value,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            content,
            details,
            is_error: false,
            created_at: now_unix(),
        }
    }

    /// Error result carrying a single text block.
    pub fn error(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            content: vec![ContentBlock::text(message)],
            details: Value::Null,
            is_error: true,
            created_at: now_unix(),
        }
    }
}

/// A message in the closed, adapter-facing vocabulary.
///
/// Agent-level logs carry richer variants; they are lowered into this set
/// before a model call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ChatMessage {
    User(UserMessage),
    Assistant(AssistantMessage),
    ToolResult(ToolResultMessage),
}

impl ChatMessage {
    pub fn role(&self) -> &'static str {
        match self {
            ChatMessage::User(_) => "user",
            ChatMessage::Assistant(_) => "assistant",
            ChatMessage::ToolResult(_) => "tool_result",
        }
    }
}

pub(crate) fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
