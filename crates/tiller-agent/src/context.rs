use std::sync::Arc;

use parking_lot::Mutex;
use tiller::stream::ToolDescriptor;

use crate::model::Message;
use crate::tools::Tool;

/// The conversation a run operates on: system prompt, message log, and the
/// tool set offered to the model.
///
/// The log is owned by the caller and shared with at most one running loop,
/// which is its only writer. Observers receive clones in event payloads and
/// must treat them as snapshots. Locks are held only for the duration of a
/// single append/replace/read, never across an await point.
#[derive(Clone)]
pub struct AgentContext {
    pub system_prompt: String,
    messages: Arc<Mutex<Vec<Message>>>,
    pub tools: Vec<Arc<dyn Tool>>,
}

impl AgentContext {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: Arc::new(Mutex::new(Vec::new())),
            tools: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.tools = tools;
        self
    }

    /// Seed the log, replacing whatever it held.
    pub fn with_messages(self, messages: Vec<Message>) -> Self {
        *self.messages.lock() = messages;
        self
    }

    /// A point-in-time copy of the log.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().len()
    }

    /// Role tag of the last logged message, if any.
    pub fn last_role(&self) -> Option<String> {
        self.messages.lock().last().map(|m| m.role().to_string())
    }

    /// True when the last logged message is an assistant message. Checks the
    /// variant itself, so an extension tag that spells "assistant" does not
    /// count.
    pub fn ends_with_assistant(&self) -> bool {
        matches!(self.messages.lock().last(), Some(Message::Assistant(_)))
    }

    /// Append a message, returning its slot index.
    pub(crate) fn append(&self, message: Message) -> usize {
        let mut messages = self.messages.lock();
        messages.push(message);
        messages.len() - 1
    }

    /// Replace the message at `index`; used for in-progress assistant slots.
    pub(crate) fn replace(&self, index: usize, message: Message) {
        let mut messages = self.messages.lock();
        if index < messages.len() {
            messages[index] = message;
        }
    }

    /// Look up a tool by the name the model calls it by.
    pub fn tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name).cloned()
    }

    /// Declarations of the tool set, as offered to the model.
    pub fn tool_descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|tool| ToolDescriptor {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect()
    }
}
