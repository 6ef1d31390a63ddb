//! The tool dispatcher: sequential, declaration-order execution of one
//! assistant message's tool calls.

use log::debug;
use serde_json::Value;
use tiller::chat::{ToolCall, ToolResultMessage};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::config::AgentConfig;
use crate::context::AgentContext;
use crate::event_stream::AgentEventSink;
use crate::events::AgentEvent;
use crate::model::Message;
use crate::tools::{ToolOutput, ToolProgress};

use super::advisors;

pub(crate) const SKIP_MESSAGE: &str = "Skipped due to queued user message.";

/// Outcome of one dispatcher pass.
#[derive(Default)]
pub(crate) struct ToolPass {
    pub results: Vec<ToolResultMessage>,
    /// Steering messages that interrupted the pass; the tail of the calls
    /// was skipped when non-empty.
    pub steering: Vec<Message>,
}

/// Run every tool call of one assistant message.
///
/// Each call yields exactly one tool result: executed, or synthesized on
/// lookup/validation/execution failure, or synthesized as a skip once
/// steering messages arrive. Advisors run after each executed result; they
/// never run on skipped ones.
pub(crate) async fn run_tool_calls(
    calls: &[ToolCall],
    context: &AgentContext,
    config: &AgentConfig,
    cancel: &CancellationToken,
    sink: &AgentEventSink,
    new_messages: &mut Vec<Message>,
) -> ToolPass {
    let mut pass = ToolPass::default();

    for call in calls {
        if !pass.steering.is_empty() {
            let result = skip_tool_call(call, sink);
            record_result(context, sink, new_messages, &result);
            pass.results.push(result);
            continue;
        }

        let result = execute_tool_call(call, context, cancel, sink).await;
        record_result(context, sink, new_messages, &result);
        pass.results.push(result.clone());

        advisors::run_advisors(config, context, cancel, sink, new_messages, call, &result).await;

        let steering = config.poll_steering().await;
        if !steering.is_empty() {
            debug!(
                "steering arrived after tool {}, skipping remaining calls",
                call.name
            );
            pass.steering = steering;
        }
    }

    pass
}

#[instrument(
    name = "agent.tool_call",
    skip(call, context, cancel, sink),
    fields(
        tool_name = %call.name,
        tool_call_id = %call.id,
        is_error = tracing::field::Empty
    )
)]
async fn execute_tool_call(
    call: &ToolCall,
    context: &AgentContext,
    cancel: &CancellationToken,
    sink: &AgentEventSink,
) -> ToolResultMessage {
    debug!("executing tool: {}", call.name);
    sink.push(AgentEvent::ToolExecutionStart {
        tool_call_id: call.id.clone(),
        tool_name: call.name.clone(),
        args: call.arguments.clone(),
    });

    let outcome = match context.tool(&call.name) {
        None => Err(format!("Tool {} not found", call.name)),
        Some(tool) => match validate_arguments(&tool.parameters(), &call.arguments) {
            Err(message) => Err(message),
            Ok(()) => {
                let progress = progress_reporter(call, sink);
                tool.execute(&call.id, call.arguments.clone(), cancel, &progress)
                    .await
                    .map_err(|error| error.to_string())
            }
        },
    };

    let result = match outcome {
        Ok(output) => {
            ToolResultMessage::new(&call.id, &call.name, output.content, output.details)
        }
        Err(message) => ToolResultMessage::error(&call.id, &call.name, message),
    };

    tracing::Span::current().record("is_error", result.is_error);
    sink.push(AgentEvent::ToolExecutionEnd {
        tool_call_id: call.id.clone(),
        tool_name: call.name.clone(),
        is_error: result.is_error,
        result: result.clone(),
    });
    result
}

/// Synthesize the skip result for a call overtaken by steering, keeping the
/// start/end event pairing uniform with executed calls.
fn skip_tool_call(call: &ToolCall, sink: &AgentEventSink) -> ToolResultMessage {
    sink.push(AgentEvent::ToolExecutionStart {
        tool_call_id: call.id.clone(),
        tool_name: call.name.clone(),
        args: call.arguments.clone(),
    });
    let result = ToolResultMessage::error(&call.id, &call.name, SKIP_MESSAGE);
    sink.push(AgentEvent::ToolExecutionEnd {
        tool_call_id: call.id.clone(),
        tool_name: call.name.clone(),
        is_error: true,
        result: result.clone(),
    });
    result
}

fn validate_arguments(schema: &Value, args: &Value) -> Result<(), String> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|error| format!("invalid tool parameter schema: {error}"))?;
    validator
        .validate(args)
        .map_err(|error| error.to_string())
}

fn progress_reporter(call: &ToolCall, sink: &AgentEventSink) -> ToolProgress {
    let sink = sink.clone();
    let tool_call_id = call.id.clone();
    let tool_name = call.name.clone();
    ToolProgress::new(move |partial: ToolOutput| {
        sink.push(AgentEvent::ToolExecutionUpdate {
            tool_call_id: tool_call_id.clone(),
            tool_name: tool_name.clone(),
            partial,
        });
    })
}

/// Append a tool result to the log and accumulator, with its message events.
fn record_result(
    context: &AgentContext,
    sink: &AgentEventSink,
    new_messages: &mut Vec<Message>,
    result: &ToolResultMessage,
) {
    let message = Message::ToolResult(result.clone());
    sink.push(AgentEvent::MessageStart {
        message: message.clone(),
    });
    context.append(message.clone());
    new_messages.push(message.clone());
    sink.push(AgentEvent::MessageEnd { message });
}
