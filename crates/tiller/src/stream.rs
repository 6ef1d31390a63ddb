use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::chat::{AssistantMessage, ChatMessage};
use crate::error::LlmError;
use crate::{ModelRef, ReasoningEffort};

/// Declaration of a tool offered to the model for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON schema of the tool's arguments object.
    pub parameters: Value,
}

/// One model request: the projected conversation plus the tools on offer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDescriptor>,
}

/// Per-call knobs for a streaming request.
#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
    /// Key resolved immediately before this call; adapters must not cache it.
    pub api_key: Option<String>,
    pub reasoning: Option<ReasoningEffort>,
    /// Cooperative cancellation; adapters end the stream with an `aborted`
    /// message when it fires.
    pub cancel: CancellationToken,
    /// Provider-specific knobs, forwarded opaquely.
    pub extra: Value,
}

/// Incremental events produced while an assistant message is streamed.
///
/// Every non-terminal event carries a consistent `partial` snapshot of the
/// evolving message; consumers treat that snapshot as authoritative rather
/// than replaying deltas. `index` addresses the block the event grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantEvent {
    /// Initial skeleton, required before any delta.
    Start { partial: AssistantMessage },

    /// A text block opened.
    TextStart {
        index: usize,
        partial: AssistantMessage,
    },
    /// A text block grew.
    TextDelta {
        index: usize,
        delta: String,
        partial: AssistantMessage,
    },
    /// A text block completed.
    TextEnd {
        index: usize,
        partial: AssistantMessage,
    },

    /// A reasoning block opened; providers may omit thinking events.
    ThinkingStart {
        index: usize,
        partial: AssistantMessage,
    },
    /// A reasoning block grew.
    ThinkingDelta {
        index: usize,
        delta: String,
        partial: AssistantMessage,
    },
    /// A reasoning block completed.
    ThinkingEnd {
        index: usize,
        partial: AssistantMessage,
    },

    /// A tool-call block opened.
    ToolCallStart {
        index: usize,
        partial: AssistantMessage,
    },
    /// A tool-call block received partial argument JSON.
    ToolCallDelta {
        index: usize,
        delta: String,
        partial: AssistantMessage,
    },
    /// A tool-call block completed with parsed arguments.
    ToolCallEnd {
        index: usize,
        partial: AssistantMessage,
    },

    /// Terminal: the stream finished normally.
    Done { message: AssistantMessage },
    /// Terminal: the stream failed or was aborted; `message.stop_reason` is
    /// `Error` or `Aborted`.
    Error { message: AssistantMessage },
}

impl AssistantEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssistantEvent::Done { .. } | AssistantEvent::Error { .. })
    }

    /// The snapshot carried by a non-terminal event.
    pub fn partial(&self) -> Option<&AssistantMessage> {
        match self {
            AssistantEvent::Start { partial }
            | AssistantEvent::TextStart { partial, .. }
            | AssistantEvent::TextDelta { partial, .. }
            | AssistantEvent::TextEnd { partial, .. }
            | AssistantEvent::ThinkingStart { partial, .. }
            | AssistantEvent::ThinkingDelta { partial, .. }
            | AssistantEvent::ThinkingEnd { partial, .. }
            | AssistantEvent::ToolCallStart { partial, .. }
            | AssistantEvent::ToolCallDelta { partial, .. }
            | AssistantEvent::ToolCallEnd { partial, .. } => Some(partial),
            AssistantEvent::Done { .. } | AssistantEvent::Error { .. } => None,
        }
    }

    /// The final message carried by a terminal event.
    pub fn final_message(&self) -> Option<&AssistantMessage> {
        match self {
            AssistantEvent::Done { message } | AssistantEvent::Error { message } => Some(message),
            _ => None,
        }
    }
}

/// The handle returned by a streaming adapter: an ordered sequence of
/// [`AssistantEvent`]s ending with exactly one terminal event.
pub type AssistantStream = Pin<Box<dyn Stream<Item = AssistantEvent> + Send>>;

/// Contract by which the agent loop asks an external model for an assistant
/// message.
///
/// Implementations own the wire protocol. A conforming stream emits
/// `Start` first, then any number of block events, then one `Done` or
/// `Error`. Failures after the request is accepted are reported through the
/// terminal event, not through `Err`.
#[async_trait]
pub trait StreamAdapter: Send + Sync {
    async fn stream(
        &self,
        model: &ModelRef,
        request: LlmRequest,
        options: StreamOptions,
    ) -> Result<AssistantStream, LlmError>;
}
