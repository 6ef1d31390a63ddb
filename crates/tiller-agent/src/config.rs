use std::sync::Arc;

use async_trait::async_trait;
use tiller::stream::StreamAdapter;
use tiller::{ModelRef, ReasoningEffort};

use crate::advisor::Advisor;
use crate::model::Message;
use crate::projection::{ContextTransform, Projection, StandardProjection};

/// Resolves a possibly-rotating API key immediately before each LLM call.
///
/// The loop never caches the result across calls, so short-lived OAuth-style
/// tokens stay valid through long tool phases.
#[async_trait]
pub trait ApiKeyResolver: Send + Sync {
    async fn resolve(&self, provider: &str) -> Option<String>;
}

/// Source of user messages injected mid-run.
///
/// Steering messages are polled before each LLM call and after each tool
/// result; follow-up messages are polled when the agent would otherwise
/// stop. Both must drain on read: a second poll at the same position returns
/// nothing.
#[async_trait]
pub trait MessageInbox: Send + Sync {
    async fn steering_messages(&self) -> Vec<Message> {
        Vec::new()
    }

    async fn follow_up_messages(&self) -> Vec<Message> {
        Vec::new()
    }
}

/// Configuration for one agent run.
#[derive(Clone)]
pub struct AgentConfig {
    pub model: ModelRef,
    /// The streaming backend driving assistant responses.
    pub adapter: Arc<dyn StreamAdapter>,
    /// Projects the log into LLM-compatible messages. Defaults to
    /// [`StandardProjection`].
    pub projection: Arc<dyn Projection>,
    /// Optional log-level projection applied before `projection`.
    pub transform: Option<Arc<dyn ContextTransform>>,
    /// Static key, used when `key_resolver` is absent or abstains.
    pub api_key: Option<String>,
    pub key_resolver: Option<Arc<dyn ApiKeyResolver>>,
    pub inbox: Option<Arc<dyn MessageInbox>>,
    pub advisors: Vec<Arc<Advisor>>,
    pub reasoning: Option<ReasoningEffort>,
}

impl AgentConfig {
    pub fn new(model: ModelRef, adapter: Arc<dyn StreamAdapter>) -> Self {
        Self {
            model,
            adapter,
            projection: Arc::new(StandardProjection),
            transform: None,
            api_key: None,
            key_resolver: None,
            inbox: None,
            advisors: Vec::new(),
            reasoning: None,
        }
    }

    pub fn with_projection(mut self, projection: Arc<dyn Projection>) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_transform(mut self, transform: Arc<dyn ContextTransform>) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_key_resolver(mut self, resolver: Arc<dyn ApiKeyResolver>) -> Self {
        self.key_resolver = Some(resolver);
        self
    }

    pub fn with_inbox(mut self, inbox: Arc<dyn MessageInbox>) -> Self {
        self.inbox = Some(inbox);
        self
    }

    pub fn with_advisors(mut self, advisors: Vec<Arc<Advisor>>) -> Self {
        self.advisors = advisors;
        self
    }

    pub fn with_reasoning(mut self, reasoning: ReasoningEffort) -> Self {
        self.reasoning = Some(reasoning);
        self
    }

    /// Fresh key for the next LLM call: resolver first, static key as the
    /// fallback.
    pub(crate) async fn resolve_api_key(&self) -> Option<String> {
        if let Some(resolver) = &self.key_resolver
            && let Some(key) = resolver.resolve(&self.model.provider).await
        {
            return Some(key);
        }
        self.api_key.clone()
    }

    pub(crate) async fn poll_steering(&self) -> Vec<Message> {
        match &self.inbox {
            Some(inbox) => inbox.steering_messages().await,
            None => Vec::new(),
        }
    }

    pub(crate) async fn poll_follow_up(&self) -> Vec<Message> {
        match &self.inbox {
            Some(inbox) => inbox.follow_up_messages().await,
            None => Vec::new(),
        }
    }
}
