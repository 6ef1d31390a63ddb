//! Mock implementations for testing: a scripted streaming adapter that
//! queues predetermined responses and records what it was asked, plus small
//! tools and inbox fixtures.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tiller::chat::{
    AssistantBlock, AssistantMessage, StopReason, ToolCall, UserMessage,
};
use tiller::error::LlmError;
use tiller::stream::{AssistantEvent, AssistantStream, LlmRequest, StreamAdapter, StreamOptions};
use tiller::{ModelRef, Usage};
use tokio_util::sync::CancellationToken;

use crate::advisor::{AdvisorHooks, AdvisorParams, AdvisorSeed};
use crate::config::{ApiKeyResolver, MessageInbox};
use crate::model::Message;
use crate::tools::{Tool, ToolError, ToolOutput, ToolProgress};

pub const MOCK_MODEL: &str = "mock-model";

pub fn mock_model() -> ModelRef {
    ModelRef::new("mock", MOCK_MODEL)
}

// ============================================================================
// Message builders
// ============================================================================

pub fn assistant_text(text: &str) -> AssistantMessage {
    AssistantMessage {
        blocks: vec![AssistantBlock::Text { text: text.into() }],
        stop_reason: StopReason::Stop,
        model: MOCK_MODEL.into(),
        usage: Usage {
            input_tokens: 10,
            output_tokens: 5,
        },
        error: None,
    }
}

pub fn assistant_tool_use(calls: Vec<ToolCall>) -> AssistantMessage {
    AssistantMessage {
        blocks: calls.into_iter().map(AssistantBlock::ToolCall).collect(),
        stop_reason: StopReason::ToolUse,
        model: MOCK_MODEL.into(),
        usage: Usage {
            input_tokens: 10,
            output_tokens: 5,
        },
        error: None,
    }
}

pub fn tool_call(id: &str, name: &str, arguments: Value) -> ToolCall {
    ToolCall {
        id: id.into(),
        name: name.into(),
        arguments,
    }
}

pub fn user(text: &str) -> Message {
    Message::User(UserMessage::text(text))
}

// ============================================================================
// ScriptedAdapter — queues predetermined responses
// ============================================================================

pub enum ScriptedResponse {
    /// Expanded into the canonical event sequence (start, block events,
    /// done/error).
    Message(AssistantMessage),
    /// Played back verbatim.
    Events(Vec<AssistantEvent>),
    /// `stream()` itself fails.
    Fail(LlmError),
}

/// Streaming adapter that pops one scripted response per call and records
/// each request and resolved API key for assertions.
pub struct ScriptedAdapter {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    requests: Mutex<Vec<LlmRequest>>,
    api_keys: Mutex<Vec<Option<String>>>,
}

impl ScriptedAdapter {
    pub fn new(responses: Vec<ScriptedResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
            api_keys: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Script of complete messages, each expanded to canonical events.
    pub fn with_messages(messages: Vec<AssistantMessage>) -> Self {
        Self::new(messages.into_iter().map(ScriptedResponse::Message).collect())
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn seen_api_keys(&self) -> Vec<Option<String>> {
        self.api_keys.lock().clone()
    }
}

#[async_trait]
impl StreamAdapter for ScriptedAdapter {
    async fn stream(
        &self,
        _model: &ModelRef,
        request: LlmRequest,
        options: StreamOptions,
    ) -> Result<AssistantStream, LlmError> {
        self.requests.lock().push(request);
        self.api_keys.lock().push(options.api_key.clone());

        let next = self.responses.lock().pop_front();
        match next {
            Some(ScriptedResponse::Message(message)) => {
                Ok(Box::pin(futures::stream::iter(canonical_events(message))))
            }
            Some(ScriptedResponse::Events(events)) => {
                Ok(Box::pin(futures::stream::iter(events)))
            }
            Some(ScriptedResponse::Fail(error)) => Err(error),
            None => Err(LlmError::Provider(
                "no more scripted responses available".to_string(),
            )),
        }
    }
}

/// Expand a final message into the event sequence a streaming provider would
/// emit: a start skeleton, per-block start/delta/end growth with consistent
/// partial snapshots, then the terminal event.
pub fn canonical_events(message: AssistantMessage) -> Vec<AssistantEvent> {
    let mut events = Vec::new();
    let mut partial = AssistantMessage::partial(message.model.clone());
    events.push(AssistantEvent::Start {
        partial: partial.clone(),
    });

    for (index, block) in message.blocks.iter().enumerate() {
        match block {
            AssistantBlock::Text { text } => {
                partial.blocks.push(AssistantBlock::Text { text: String::new() });
                events.push(AssistantEvent::TextStart {
                    index,
                    partial: partial.clone(),
                });
                partial.blocks[index] = AssistantBlock::Text { text: text.clone() };
                events.push(AssistantEvent::TextDelta {
                    index,
                    delta: text.clone(),
                    partial: partial.clone(),
                });
                events.push(AssistantEvent::TextEnd {
                    index,
                    partial: partial.clone(),
                });
            }
            AssistantBlock::Thinking { thinking } => {
                partial.blocks.push(AssistantBlock::Thinking {
                    thinking: String::new(),
                });
                events.push(AssistantEvent::ThinkingStart {
                    index,
                    partial: partial.clone(),
                });
                partial.blocks[index] = AssistantBlock::Thinking {
                    thinking: thinking.clone(),
                };
                events.push(AssistantEvent::ThinkingDelta {
                    index,
                    delta: thinking.clone(),
                    partial: partial.clone(),
                });
                events.push(AssistantEvent::ThinkingEnd {
                    index,
                    partial: partial.clone(),
                });
            }
            AssistantBlock::ToolCall(call) => {
                partial.blocks.push(AssistantBlock::ToolCall(ToolCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments: json!({}),
                }));
                events.push(AssistantEvent::ToolCallStart {
                    index,
                    partial: partial.clone(),
                });
                partial.blocks[index] = AssistantBlock::ToolCall(call.clone());
                events.push(AssistantEvent::ToolCallDelta {
                    index,
                    delta: call.arguments.to_string(),
                    partial: partial.clone(),
                });
                events.push(AssistantEvent::ToolCallEnd {
                    index,
                    partial: partial.clone(),
                });
            }
        }
    }

    if message.stop_reason.is_failure() {
        events.push(AssistantEvent::Error { message });
    } else {
        events.push(AssistantEvent::Done { message });
    }
    events
}

// ============================================================================
// Tools
// ============================================================================

/// Echoes its `value` argument back as `echoed: <value>`.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the given value back"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "value": { "type": "string" }
            },
            "required": ["value"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        _tool_call_id: &str,
        args: Value,
        _cancel: &CancellationToken,
        _progress: &ToolProgress,
    ) -> Result<ToolOutput, ToolError> {
        let value = args["value"].as_str().unwrap_or_default();
        Ok(ToolOutput::text(format!("echoed: {value}")).with_details(json!({ "value": value })))
    }
}

/// Reports two progress updates before finishing.
pub struct UpdatingTool;

#[async_trait]
impl Tool for UpdatingTool {
    fn name(&self) -> &str {
        "updating"
    }

    fn description(&self) -> &str {
        "Reports progress while running"
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object" })
    }

    async fn execute(
        &self,
        _tool_call_id: &str,
        _args: Value,
        _cancel: &CancellationToken,
        progress: &ToolProgress,
    ) -> Result<ToolOutput, ToolError> {
        progress.report(ToolOutput::text("step 1"));
        tokio::task::yield_now().await;
        progress.report(ToolOutput::text("step 2"));
        Ok(ToolOutput::text("finished"))
    }
}

/// Fails, either synchronously or after one await point; both paths must
/// produce identical tool-result shapes.
pub struct FailingTool {
    pub message: String,
    pub delayed: bool,
}

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "failing"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object" })
    }

    async fn execute(
        &self,
        _tool_call_id: &str,
        _args: Value,
        _cancel: &CancellationToken,
        _progress: &ToolProgress,
    ) -> Result<ToolOutput, ToolError> {
        if self.delayed {
            tokio::task::yield_now().await;
        }
        Err(ToolError::ExecutionFailed(self.message.clone()))
    }
}

/// Honors the cancellation token: fails with an interruption error once the
/// signal is asserted, succeeds otherwise.
pub struct CancelObservingTool;

#[async_trait]
impl Tool for CancelObservingTool {
    fn name(&self) -> &str {
        "cancellable"
    }

    fn description(&self) -> &str {
        "Stops cooperatively when cancelled"
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object" })
    }

    async fn execute(
        &self,
        _tool_call_id: &str,
        _args: Value,
        cancel: &CancellationToken,
        _progress: &ToolProgress,
    ) -> Result<ToolOutput, ToolError> {
        if cancel.is_cancelled() {
            return Err(ToolError::Interrupted("operation cancelled".into()));
        }
        Ok(ToolOutput::text("completed"))
    }
}

// ============================================================================
// QueueInbox — one queued batch per poll
// ============================================================================

/// Inbox that pops one queued batch per poll, draining as the loop contract
/// requires. Queue empty batches to represent polls that find nothing.
#[derive(Default)]
pub struct QueueInbox {
    steering: Mutex<VecDeque<Vec<Message>>>,
    follow_ups: Mutex<VecDeque<Vec<Message>>>,
    pub steering_polls: AtomicUsize,
    pub follow_up_polls: AtomicUsize,
}

impl QueueInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_steering(&self, batch: Vec<Message>) {
        self.steering.lock().push_back(batch);
    }

    pub fn queue_follow_up(&self, batch: Vec<Message>) {
        self.follow_ups.lock().push_back(batch);
    }
}

#[async_trait]
impl MessageInbox for QueueInbox {
    async fn steering_messages(&self) -> Vec<Message> {
        self.steering_polls.fetch_add(1, Ordering::SeqCst);
        self.steering.lock().pop_front().unwrap_or_default()
    }

    async fn follow_up_messages(&self) -> Vec<Message> {
        self.follow_up_polls.fetch_add(1, Ordering::SeqCst);
        self.follow_ups.lock().pop_front().unwrap_or_default()
    }
}

// ============================================================================
// CountingResolver — fresh key per LLM call
// ============================================================================

#[derive(Default)]
pub struct CountingResolver {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ApiKeyResolver for CountingResolver {
    async fn resolve(&self, provider: &str) -> Option<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Some(format!("key-{provider}-{n}"))
    }
}

// ============================================================================
// Advisor hooks
// ============================================================================

/// Fires on a single tool name with a fixed seed.
pub struct OnToolHooks {
    pub tool: String,
    pub prompt: String,
}

impl OnToolHooks {
    pub fn new(tool: &str, prompt: &str) -> Arc<Self> {
        Arc::new(Self {
            tool: tool.into(),
            prompt: prompt.into(),
        })
    }
}

#[async_trait]
impl AdvisorHooks for OnToolHooks {
    async fn trigger(&self, params: &AdvisorParams<'_>) -> anyhow::Result<bool> {
        Ok(params.tool_name == self.tool)
    }

    async fn create_context(&self, _params: &AdvisorParams<'_>) -> anyhow::Result<AdvisorSeed> {
        Ok(AdvisorSeed {
            system_prompt: "You are a reviewer.".to_string(),
            messages: vec![user(&self.prompt)],
        })
    }
}

/// Hooks whose trigger or context creation fails.
pub struct BrokenHooks {
    pub fail_trigger: bool,
    pub error: String,
}

#[async_trait]
impl AdvisorHooks for BrokenHooks {
    async fn trigger(&self, _params: &AdvisorParams<'_>) -> anyhow::Result<bool> {
        if self.fail_trigger {
            anyhow::bail!("{}", self.error);
        }
        Ok(true)
    }

    async fn create_context(&self, _params: &AdvisorParams<'_>) -> anyhow::Result<AdvisorSeed> {
        anyhow::bail!("{}", self.error);
    }
}
