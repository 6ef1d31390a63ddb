//! STREAM_ASSISTANT: obtain one assistant message from the adapter while
//! keeping the log's in-progress slot and the event stream in sync.

use futures::StreamExt;
use log::{debug, warn};
use serde_json::Value;
use tiller::chat::{AssistantMessage, StopReason};
use tiller::stream::{AssistantEvent, LlmRequest, StreamOptions};
use tokio_util::sync::CancellationToken;

use crate::config::AgentConfig;
use crate::context::AgentContext;
use crate::event_stream::AgentEventSink;
use crate::events::AgentEvent;
use crate::model::Message;

/// Stream one assistant response into the log.
///
/// The final message is persisted in the slot the partial occupied and is
/// returned; every failure mode (projection, request, mid-stream vanishing)
/// resolves to an assistant message with a failure `stop_reason` rather than
/// an error, so the caller only ever inspects `stop_reason`.
pub(crate) async fn stream_assistant(
    context: &AgentContext,
    config: &AgentConfig,
    cancel: &CancellationToken,
    sink: &AgentEventSink,
) -> AssistantMessage {
    let request = match build_request(context, config).await {
        Ok(request) => request,
        Err(error) => {
            warn!("context projection failed: {error}");
            return fail(context, config, sink, None, cancel, error);
        }
    };

    let options = StreamOptions {
        api_key: config.resolve_api_key().await,
        reasoning: config.reasoning,
        cancel: cancel.clone(),
        extra: Value::Null,
    };

    let mut stream = match config
        .adapter
        .stream(&config.model, request, options)
        .await
    {
        Ok(stream) => stream,
        Err(error) => {
            warn!("stream request failed: {error}");
            return fail(context, config, sink, None, cancel, error.to_string());
        }
    };

    // Slot in the log occupied by the in-progress message. Each streaming
    // event replaces the slot with the event's snapshot; nothing aliases it.
    let mut slot: Option<usize> = None;

    while let Some(event) = stream.next().await {
        match event {
            AssistantEvent::Done { message } | AssistantEvent::Error { message } => {
                return finish(context, sink, slot, message);
            }
            event => {
                let Some(partial) = event.partial() else {
                    continue;
                };
                let snapshot = Message::Assistant(partial.clone());
                match slot {
                    None => {
                        slot = Some(context.append(snapshot.clone()));
                        sink.push(AgentEvent::MessageStart { message: snapshot });
                    }
                    Some(index) => {
                        context.replace(index, snapshot.clone());
                        sink.push(AgentEvent::MessageUpdate {
                            message: snapshot,
                            event,
                        });
                    }
                }
            }
        }
    }

    // The adapter hung up without a terminal event.
    debug!("assistant stream ended without a terminal event");
    fail(
        context,
        config,
        sink,
        slot,
        cancel,
        "stream ended without a terminal event".to_string(),
    )
}

async fn build_request(context: &AgentContext, config: &AgentConfig) -> Result<LlmRequest, String> {
    let mut log = context.snapshot();
    if let Some(transform) = &config.transform {
        log = transform
            .transform(log)
            .await
            .map_err(|e| format!("context transform failed: {e}"))?;
    }
    let messages = config
        .projection
        .convert(&log)
        .await
        .map_err(|e| format!("context projection failed: {e}"))?;

    Ok(LlmRequest {
        system_prompt: (!context.system_prompt.is_empty()).then(|| context.system_prompt.clone()),
        messages,
        tools: context.tool_descriptors(),
    })
}

/// Persist the terminal message into the slot and close the message events.
fn finish(
    context: &AgentContext,
    sink: &AgentEventSink,
    slot: Option<usize>,
    message: AssistantMessage,
) -> AssistantMessage {
    let logged = Message::Assistant(message.clone());
    match slot {
        Some(index) => context.replace(index, logged),
        None => {
            // Terminal with no preceding Start; open the message first so
            // observers still see start → end.
            context.append(logged.clone());
            sink.push(AgentEvent::MessageStart { message: logged });
        }
    }
    sink.push(AgentEvent::MessageEnd {
        message: Message::Assistant(message.clone()),
    });
    message
}

/// Synthesize a failed assistant message for errors the adapter could not
/// report itself.
fn fail(
    context: &AgentContext,
    config: &AgentConfig,
    sink: &AgentEventSink,
    slot: Option<usize>,
    cancel: &CancellationToken,
    error: String,
) -> AssistantMessage {
    let stop_reason = if cancel.is_cancelled() {
        StopReason::Aborted
    } else {
        StopReason::Error
    };
    let message = AssistantMessage::failed(config.model.id.clone(), stop_reason, error);
    finish(context, sink, slot, message)
}
