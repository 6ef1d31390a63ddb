use async_trait::async_trait;
use tiller::chat::{ChatMessage, ContentBlock, UserMessage};

use crate::model::Message;

/// Maps the full agent log to the messages the model understands.
///
/// This is the single point where agent-only variants (advisor verdicts,
/// app extensions) are interpreted. The persistent log is never touched;
/// the returned projection exists only for the duration of one LLM call.
#[async_trait]
pub trait Projection: Send + Sync {
    async fn convert(&self, messages: &[Message]) -> anyhow::Result<Vec<ChatMessage>>;
}

/// Optional log-level projection (pruning, compaction) applied before
/// [`Projection::convert`].
///
/// A transform that drops the trailing user or tool-result message may make
/// the provider reject the request; that is on the transform, not policed
/// here.
#[async_trait]
pub trait ContextTransform: Send + Sync {
    async fn transform(&self, messages: Vec<Message>) -> anyhow::Result<Vec<Message>>;
}

/// The default projection.
///
/// Standard variants pass through unchanged. Advisor verdicts become
/// synthetic user messages tagged `[Advisor: <name>]`. Extension messages
/// are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardProjection;

#[async_trait]
impl Projection for StandardProjection {
    async fn convert(&self, messages: &[Message]) -> anyhow::Result<Vec<ChatMessage>> {
        Ok(messages.iter().filter_map(project_message).collect())
    }
}

fn project_message(message: &Message) -> Option<ChatMessage> {
    match message {
        Message::User(user) => Some(ChatMessage::User(user.clone())),
        Message::Assistant(assistant) => Some(ChatMessage::Assistant(assistant.clone())),
        Message::ToolResult(result) => Some(ChatMessage::ToolResult(result.clone())),
        Message::Advisor(advisor) => Some(ChatMessage::User(UserMessage {
            content: vec![ContentBlock::text(format!(
                "[Advisor: {}] {}",
                advisor.advisor, advisor.content
            ))],
            created_at: advisor.created_at,
        })),
        Message::Extension { .. } => None,
    }
}
