//! Shared fixtures and helpers for the test suites.

pub mod mocks;

use tiller::chat::ToolResultMessage;

use crate::event_stream::AgentEventStream;
use crate::events::AgentEvent;
use crate::model::Message;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Consume a run to completion: every event plus the sealed new messages.
pub async fn drain(stream: AgentEventStream) -> (Vec<AgentEvent>, Vec<Message>) {
    let (events, result) = stream.collect().await;
    let messages = result.expect("run must seal its stream");
    (events, messages)
}

pub fn event_names(events: &[AgentEvent]) -> Vec<&'static str> {
    events.iter().map(AgentEvent::name).collect()
}

/// Event names with the streaming noise removed, for coarse sequence
/// assertions.
pub fn event_names_without_updates(events: &[AgentEvent]) -> Vec<&'static str> {
    events
        .iter()
        .filter(|event| !matches!(event, AgentEvent::MessageUpdate { .. }))
        .map(AgentEvent::name)
        .collect()
}

/// All text content of a tool result, joined.
pub fn result_text(result: &ToolResultMessage) -> String {
    result
        .content
        .iter()
        .filter_map(|block| block.as_text())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Asserts the pairing invariant: every tool call id in an assistant message
/// is answered by exactly one tool result before the next assistant message.
pub fn assert_tool_pairing(log: &[Message]) {
    let mut open: Vec<String> = Vec::new();
    for message in log {
        match message {
            Message::Assistant(assistant) => {
                assert!(
                    open.is_empty(),
                    "unanswered tool calls before next assistant message: {open:?}"
                );
                open = assistant
                    .tool_calls()
                    .into_iter()
                    .map(|call| call.id.clone())
                    .collect();
            }
            Message::ToolResult(result) => {
                let position = open.iter().position(|id| *id == result.tool_call_id);
                match position {
                    Some(index) => {
                        open.remove(index);
                    }
                    None => panic!("tool result without open call: {}", result.tool_call_id),
                }
            }
            // Advisor messages may appear while other calls are still open;
            // nothing to track for them.
            _ => {}
        }
    }
    assert!(open.is_empty(), "run ended with unanswered tool calls: {open:?}");
}
