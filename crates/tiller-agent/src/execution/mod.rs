//! The turn-driving state machine.
//!
//! ```text
//! INIT ─► TURN_START ─► INJECT_PENDING ─► STREAM_ASSISTANT ─► DECIDE
//!                                                             │
//!                             ┌───────────────────────────────┤
//!                        has_tool_calls                   no_tool_calls
//!                             ▼                               ▼
//!                        RUN_TOOLS ─► POLL_STEERING      POLL_FOLLOWUP
//!                             │              │                │
//!                             └──► TURN_END ◄┘           followup? ──► TERMINATE
//! ```
//!
//! One `run` drives a single conversation to its `agent_end`. The loop is a
//! plain cooperative task: it suspends at streaming events, tool executions,
//! advisor runs, and the steering/follow-up polls, and at most one assistant
//! stream or tool execution is in flight at a time.
//!
//! The implementation is split across focused submodules:
//!
//! - `mod` (this file) — entry points and the turn loop
//! - `streaming` — STREAM_ASSISTANT: projection, key resolution, partial-slot
//!   maintenance
//! - `tool_calls` — the dispatcher: validation, execution, steering skips
//! - `advisors` — recursive advisor runs and event forwarding

mod advisors;
mod streaming;
mod tool_calls;


use futures::FutureExt;
use futures::future::BoxFuture;
use log::{debug, trace};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::config::AgentConfig;
use crate::context::AgentContext;
use crate::error::AgentError;
use crate::event_stream::{self, AgentEventSink, AgentEventStream};
use crate::events::AgentEvent;
use crate::model::Message;

/// How a run was entered.
pub(crate) enum Entry {
    /// Fresh prompts; steering is pre-polled once before the first turn.
    Start { prompts: Vec<Message> },
    /// Continue from the context's existing log. No pre-poll.
    Resume,
}

/// Start a run with fresh prompt messages.
///
/// An empty prompt list is legal: the first turn still streams an assistant
/// response against the existing log.
pub fn start(
    prompts: Vec<Message>,
    context: AgentContext,
    config: AgentConfig,
    cancel: CancellationToken,
) -> AgentEventStream {
    let (sink, stream) = event_stream::channel();
    tokio::spawn(run(Entry::Start { prompts }, context, config, cancel, sink));
    stream
}

/// Continue a run from the context's existing log.
///
/// Fails synchronously, before any event is emitted, when the log is empty
/// or its last message is an assistant message.
pub fn resume(
    context: AgentContext,
    config: AgentConfig,
    cancel: CancellationToken,
) -> Result<AgentEventStream, AgentError> {
    if context.message_count() == 0 {
        return Err(AgentError::ContinueWithoutMessages);
    }
    if context.ends_with_assistant() {
        return Err(AgentError::ContinueFromRole {
            role: "assistant".to_string(),
        });
    }
    let (sink, stream) = event_stream::channel();
    tokio::spawn(run(Entry::Resume, context, config, cancel, sink));
    Ok(stream)
}

/// The run future. Boxed so advisor sub-runs can recurse.
pub(crate) fn run(
    entry: Entry,
    context: AgentContext,
    config: AgentConfig,
    cancel: CancellationToken,
    sink: AgentEventSink,
) -> BoxFuture<'static, ()> {
    run_inner(entry, context, config, cancel, sink).boxed()
}

#[instrument(name = "agent.run", skip_all, fields(model = %config.model))]
async fn run_inner(
    entry: Entry,
    context: AgentContext,
    config: AgentConfig,
    cancel: CancellationToken,
    sink: AgentEventSink,
) {
    sink.push(AgentEvent::AgentStart);

    let mut new_messages: Vec<Message> = Vec::new();
    let mut pending: Vec<Message> = match entry {
        Entry::Start { prompts } => {
            let mut pending = prompts;
            pending.extend(config.poll_steering().await);
            pending
        }
        Entry::Resume => Vec::new(),
    };

    let mut turn = 0usize;
    loop {
        turn += 1;
        trace!("turn {turn}: starting with {} pending message(s)", pending.len());
        sink.push(AgentEvent::TurnStart);

        for message in pending.drain(..) {
            inject_message(&context, &sink, &mut new_messages, message);
        }

        let assistant = streaming::stream_assistant(&context, &config, &cancel, &sink).await;
        new_messages.push(Message::Assistant(assistant.clone()));

        if assistant.stop_reason.is_failure() {
            debug!(
                "turn {turn}: assistant stream ended with {:?}, terminating run",
                assistant.stop_reason
            );
            sink.push(AgentEvent::TurnEnd {
                message: assistant,
                tool_results: Vec::new(),
            });
            break;
        }

        let calls: Vec<_> = assistant.tool_calls().into_iter().cloned().collect();
        let had_tool_calls = !calls.is_empty();

        let pass = if had_tool_calls {
            tool_calls::run_tool_calls(&calls, &context, &config, &cancel, &sink, &mut new_messages)
                .await
        } else {
            tool_calls::ToolPass::default()
        };

        sink.push(AgentEvent::TurnEnd {
            message: assistant,
            tool_results: pass.results.clone(),
        });

        // Steering collected by the dispatcher wins; otherwise poll now.
        let mut next_pending = pass.steering;
        if next_pending.is_empty() {
            next_pending = config.poll_steering().await;
        }

        if had_tool_calls || !next_pending.is_empty() {
            pending = next_pending;
            continue;
        }

        let follow_up = config.poll_follow_up().await;
        if !follow_up.is_empty() {
            debug!("turn {turn}: continuing with {} follow-up message(s)", follow_up.len());
            pending = follow_up;
            continue;
        }

        break;
    }

    debug!("run finished after {turn} turn(s), {} new message(s)", new_messages.len());
    sink.push(AgentEvent::AgentEnd {
        messages: new_messages.clone(),
    });
    sink.end(new_messages);
}

/// INJECT_PENDING: record one pending message in the log, the accumulator,
/// and the event stream.
fn inject_message(
    context: &AgentContext,
    sink: &AgentEventSink,
    new_messages: &mut Vec<Message>,
    message: Message,
) {
    sink.push(AgentEvent::MessageStart {
        message: message.clone(),
    });
    context.append(message.clone());
    new_messages.push(message.clone());
    sink.push(AgentEvent::MessageEnd { message });
}
