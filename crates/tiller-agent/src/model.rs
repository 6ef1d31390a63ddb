use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiller::chat::{AssistantMessage, ToolResultMessage, UserMessage};

/// A sub-agent's verdict, recorded in the parent log after the tool result
/// that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorMessage {
    /// Stable advisor name, also used to tag the projection.
    pub advisor: String,
    pub content: String,
    /// Identifier of the model that produced the verdict.
    pub model: String,
    pub created_at: i64,
}

impl AdvisorMessage {
    pub fn new(
        advisor: impl Into<String>,
        content: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            advisor: advisor.into(),
            content: content.into(),
            model: model.into(),
            created_at: time::OffsetDateTime::now_utc().unix_timestamp(),
        }
    }
}

/// A message in the agent-level log.
///
/// The first three variants mirror the adapter vocabulary; `Advisor` and
/// `Extension` exist only at this level and reach the model solely through a
/// [`crate::projection::Projection`]. The loop appends monotonically and
/// never reorders; everything else treats the log as read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    User(UserMessage),
    Assistant(AssistantMessage),
    ToolResult(ToolResultMessage),
    Advisor(AdvisorMessage),
    /// App-defined message; the loop carries it opaquely.
    Extension { tag: String, payload: Value },
}

impl Message {
    pub fn role(&self) -> &str {
        match self {
            Message::User(_) => "user",
            Message::Assistant(_) => "assistant",
            Message::ToolResult(_) => "tool_result",
            Message::Advisor(_) => "advisor",
            Message::Extension { tag, .. } => tag,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Message::User(UserMessage::text(text))
    }

    pub fn as_assistant(&self) -> Option<&AssistantMessage> {
        match self {
            Message::Assistant(message) => Some(message),
            _ => None,
        }
    }
}

impl From<UserMessage> for Message {
    fn from(message: UserMessage) -> Self {
        Message::User(message)
    }
}

impl From<AssistantMessage> for Message {
    fn from(message: AssistantMessage) -> Self {
        Message::Assistant(message)
    }
}

impl From<ToolResultMessage> for Message {
    fn from(message: ToolResultMessage) -> Self {
        Message::ToolResult(message)
    }
}

impl From<AdvisorMessage> for Message {
    fn from(message: AdvisorMessage) -> Self {
        Message::Advisor(message)
    }
}
