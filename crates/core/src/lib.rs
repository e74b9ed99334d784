pub mod agent;
pub mod handoff;
pub mod history;
pub mod host;
pub mod llm_client;
pub mod prompts;
pub mod search;
pub mod session;
pub mod story;
pub mod tools;

pub use agent::{Agent, AgentRole, BackendOverrides, BackendSelection, Specialty};
pub use host::{HostError, ReplyRequest, SessionHost};
pub use session::{AgentSession, SessionOptions, ToolReply};
pub use story::{CharacterData, StoryData};
pub use tools::{ToolError, ToolOutcome};
