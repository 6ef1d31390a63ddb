use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiller::chat::{AssistantMessage, ToolResultMessage};
use tiller::stream::AssistantEvent;

use crate::model::Message;
use crate::tools::ToolOutput;

/// Events emitted by a run, in the order they happen.
///
/// Message payloads are defensive clones: the log itself stays owned by the
/// loop. For an assistant message the sequence is strictly
/// `MessageStart → MessageUpdate* → MessageEnd`, and a run emits exactly one
/// `AgentEnd`, its last event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    AgentStart,
    /// Terminal; `messages` is the log suffix appended by this run.
    AgentEnd { messages: Vec<Message> },

    TurnStart,
    TurnEnd {
        message: AssistantMessage,
        tool_results: Vec<ToolResultMessage>,
    },

    MessageStart {
        message: Message,
    },
    /// Streaming update; carries the originating adapter event plus a fresh
    /// snapshot of the in-progress message.
    MessageUpdate {
        message: Message,
        event: AssistantEvent,
    },
    MessageEnd {
        message: Message,
    },

    ToolExecutionStart {
        tool_call_id: String,
        tool_name: String,
        args: Value,
    },
    ToolExecutionUpdate {
        tool_call_id: String,
        tool_name: String,
        partial: ToolOutput,
    },
    ToolExecutionEnd {
        tool_call_id: String,
        tool_name: String,
        is_error: bool,
        result: ToolResultMessage,
    },

    AdvisorStart {
        advisor: String,
        tool_name: String,
    },
    /// A child-run event, forwarded verbatim inside the parent stream.
    AdvisorEvent {
        advisor: String,
        event: Box<AgentEvent>,
    },
    AdvisorEnd {
        advisor: String,
        content: String,
    },
    AdvisorError {
        advisor: String,
        error: String,
    },
}

impl AgentEvent {
    /// True for the event that seals a run's stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentEvent::AgentEnd { .. })
    }

    /// Short name matching the serialized `type` tag, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            AgentEvent::AgentStart => "agent_start",
            AgentEvent::AgentEnd { .. } => "agent_end",
            AgentEvent::TurnStart => "turn_start",
            AgentEvent::TurnEnd { .. } => "turn_end",
            AgentEvent::MessageStart { .. } => "message_start",
            AgentEvent::MessageUpdate { .. } => "message_update",
            AgentEvent::MessageEnd { .. } => "message_end",
            AgentEvent::ToolExecutionStart { .. } => "tool_execution_start",
            AgentEvent::ToolExecutionUpdate { .. } => "tool_execution_update",
            AgentEvent::ToolExecutionEnd { .. } => "tool_execution_end",
            AgentEvent::AdvisorStart { .. } => "advisor_start",
            AgentEvent::AdvisorEvent { .. } => "advisor_event",
            AgentEvent::AdvisorEnd { .. } => "advisor_end",
            AgentEvent::AdvisorError { .. } => "advisor_error",
        }
    }
}
