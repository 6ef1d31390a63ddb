//! Structured error type for the agent crate.
//!
//! Failures *inside* a run never surface here: tool errors become error tool
//! results, stream failures become assistant messages with a failure
//! `stop_reason`, and advisor failures become `advisor_error` events. The
//! variants below are caller-side programming errors, raised synchronously
//! before any event is emitted.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AgentError {
    /// `resume` was called on a context whose log is empty.
    #[error("Cannot continue: no messages in context")]
    ContinueWithoutMessages,

    /// `resume` was called while the last logged message is an assistant
    /// message awaiting nothing.
    #[error("Cannot continue from message role: {role}")]
    ContinueFromRole { role: String },
}
