//! Advisor runner: nested agent runs fired after tool results, with their
//! events forwarded into the parent stream.

use std::sync::Arc;

use log::debug;
use tiller::chat::{ToolCall, ToolResultMessage};
use tokio_util::sync::CancellationToken;

use crate::advisor::{Advisor, AdvisorParams};
use crate::config::AgentConfig;
use crate::context::AgentContext;
use crate::event_stream::{self, AgentEventSink};
use crate::events::AgentEvent;
use crate::model::{AdvisorMessage, Message};

use super::Entry;

/// Run the configured advisors for one executed tool result, sequentially
/// and in declaration order. Each advisor sees the log with prior advisor
/// messages already appended.
pub(crate) async fn run_advisors(
    config: &AgentConfig,
    context: &AgentContext,
    cancel: &CancellationToken,
    sink: &AgentEventSink,
    new_messages: &mut Vec<Message>,
    call: &ToolCall,
    result: &ToolResultMessage,
) {
    for advisor in &config.advisors {
        run_advisor(advisor, config, context, cancel, sink, new_messages, call, result).await;
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_advisor(
    advisor: &Arc<Advisor>,
    config: &AgentConfig,
    context: &AgentContext,
    cancel: &CancellationToken,
    sink: &AgentEventSink,
    new_messages: &mut Vec<Message>,
    call: &ToolCall,
    result: &ToolResultMessage,
) {
    let log = context.snapshot();
    let params = AdvisorParams {
        messages: &log,
        tool_name: &call.name,
        tool_args: &call.arguments,
        tool_result: result,
    };

    match advisor.hooks.trigger(&params).await {
        Ok(true) => {}
        Ok(false) => return,
        Err(error) => {
            sink.push(AgentEvent::AdvisorError {
                advisor: advisor.name.clone(),
                error: error.to_string(),
            });
            return;
        }
    }

    debug!("advisor {} triggered by tool {}", advisor.name, call.name);
    sink.push(AgentEvent::AdvisorStart {
        advisor: advisor.name.clone(),
        tool_name: call.name.clone(),
    });

    let seed = match advisor.hooks.create_context(&params).await {
        Ok(seed) => seed,
        Err(error) => {
            sink.push(AgentEvent::AdvisorError {
                advisor: advisor.name.clone(),
                error: error.to_string(),
            });
            return;
        }
    };

    // The child run gets an empty log: the seed messages become its first
    // pending batch.
    let child_context = AgentContext::new(seed.system_prompt).with_tools(advisor.tools.clone());
    let child_config = AgentConfig {
        model: advisor.model.clone(),
        adapter: config.adapter.clone(),
        projection: advisor.projection.clone(),
        transform: None,
        api_key: advisor.api_key.clone(),
        key_resolver: advisor.key_resolver.clone(),
        inbox: None,
        advisors: advisor.advisors.clone(),
        reasoning: advisor.reasoning,
    };

    let (child_sink, mut child_stream) = event_stream::channel();
    let child_run = super::run(
        Entry::Start {
            prompts: seed.messages,
        },
        child_context,
        child_config,
        cancel.clone(),
        child_sink,
    );
    let forward = async {
        while let Some(event) = child_stream.next().await {
            sink.push(AgentEvent::AdvisorEvent {
                advisor: advisor.name.clone(),
                event: Box::new(event),
            });
        }
        child_stream.result().await
    };
    let ((), child_messages) = tokio::join!(child_run, forward);

    let Some(child_messages) = child_messages else {
        sink.push(AgentEvent::AdvisorError {
            advisor: advisor.name.clone(),
            error: "advisor run ended without a result".to_string(),
        });
        return;
    };

    let content = advisor.hooks.extract_result(&child_messages);
    if !content.is_empty() {
        let message = Message::Advisor(AdvisorMessage::new(
            &advisor.name,
            &content,
            advisor.model.id.clone(),
        ));
        sink.push(AgentEvent::MessageStart {
            message: message.clone(),
        });
        context.append(message.clone());
        new_messages.push(message.clone());
        sink.push(AgentEvent::MessageEnd { message });
    }

    sink.push(AgentEvent::AdvisorEnd {
        advisor: advisor.name.clone(),
        content,
    });
}
