//! Turn-based agent execution core.
//!
//! The crate drives a single conversation: it interleaves streamed LLM
//! responses with sequential tool executions, injects steering and follow-up
//! messages between turns, runs recursive advisor sub-agents after tool
//! results, and reports everything on an ordered event stream with a single
//! terminal value.
//!
//! Start a run with [`execution::start`] (fresh prompts) or
//! [`execution::resume`] (continue an existing log), then consume the
//! returned [`AgentEventStream`].

pub mod advisor;
pub mod config;
pub mod context;
pub mod error;
pub mod event_stream;
pub mod events;
pub mod execution;
pub mod model;
pub mod projection;
pub mod tools;

#[cfg(test)]
pub mod test_utils;

pub use advisor::{Advisor, AdvisorHooks, AdvisorParams, AdvisorSeed};
pub use config::{AgentConfig, ApiKeyResolver, MessageInbox};
pub use context::AgentContext;
pub use error::AgentError;
pub use event_stream::{AgentEventSink, AgentEventStream, EventSink, EventStream};
pub use events::AgentEvent;
pub use execution::{resume, start};
pub use model::{AdvisorMessage, Message};
pub use projection::{ContextTransform, Projection, StandardProjection};
pub use tools::{Tool, ToolError, ToolOutput, ToolProgress};
