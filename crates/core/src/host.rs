//! Session Host Interface
//!
//! The host owns the real-time connection and the speech and language
//! backends. The core only asks it to produce replies, to interrupt the reply
//! in flight, and to tear down the room once the session is over.

use crate::agent::{AgentRole, BackendSelection};
use crate::history::ChatMessage;
use async_trait::async_trait;

/// Everything the host needs to generate one reply on behalf of an agent.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyRequest {
    pub agent: AgentRole,
    /// The agent's system prompt.
    pub system_prompt: String,
    pub history: Vec<ChatMessage>,
    /// Extra, one-off instructions for this reply only.
    pub instructions: Option<String>,
    pub allow_interruptions: bool,
    pub backends: BackendSelection,
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Reply generation failed: {0}")]
    Generation(String),
    #[error("Reply was interrupted before completion")]
    Interrupted,
    #[error("Failed to delete room '{room}': {reason}")]
    RoomDeletion { room: String, reason: String },
    #[error("Host unavailable: {0}")]
    Unavailable(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionHost: Send + Sync {
    /// Generates and delivers a reply, resolving once it has been fully played out.
    async fn generate_reply(&self, request: &ReplyRequest) -> Result<String, HostError>;

    /// Delivers a fixed notice to the user, such as a handoff announcement.
    async fn announce(&self, text: &str) -> Result<(), HostError>;

    /// Cancels whatever reply is currently being generated.
    async fn interrupt(&self) -> Result<(), HostError>;

    async fn delete_room(&self, room: &str) -> Result<(), HostError>;
}
