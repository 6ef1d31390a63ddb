//! The uniform tool interface consumed by the dispatcher.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiller::chat::ContentBlock;
use tokio_util::sync::CancellationToken;

/// What a tool hands back: user-visible content plus an opaque payload for
/// consumers (never sent to the model).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub details: Value,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            details: Value::Null,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// Unified error type for tool execution.
///
/// Whatever the variant, the dispatcher folds it into an `is_error` tool
/// result; nothing here ever aborts a run.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    ExecutionFailed(String),
    #[error("Interrupted: {0}")]
    Interrupted(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Progress callback handed to [`Tool::execute`]; each report surfaces as a
/// `tool_execution_update` event.
pub struct ToolProgress {
    report: Box<dyn Fn(ToolOutput) + Send + Sync>,
}

impl ToolProgress {
    pub fn new(report: impl Fn(ToolOutput) + Send + Sync + 'static) -> Self {
        Self {
            report: Box::new(report),
        }
    }

    /// Callback that drops every report.
    pub fn sink() -> Self {
        Self::new(|_| {})
    }

    pub fn report(&self, partial: ToolOutput) {
        (self.report)(partial);
    }
}

/// A tool the assistant can call.
///
/// Implementations observe `cancel` cooperatively and return promptly when
/// it fires; the loop never force-kills an execution.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model calls the tool by.
    fn name(&self) -> &str;

    /// Short human-facing label. Defaults to the name.
    fn label(&self) -> &str {
        self.name()
    }

    fn description(&self) -> &str;

    /// JSON schema of the arguments object. Arguments are validated against
    /// it before `execute` is invoked.
    fn parameters(&self) -> Value;

    async fn execute(
        &self,
        tool_call_id: &str,
        args: Value,
        cancel: &CancellationToken,
        progress: &ToolProgress,
    ) -> Result<ToolOutput, ToolError>;
}
