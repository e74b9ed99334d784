//! Agent Session
//!
//! Holds the one active agent and the one story record of a conversation,
//! dispatches tool calls by name, applies handoffs and runs the termination
//! sequence. All methods take `&mut self`, so tool calls within a session are
//! strictly sequential.

use crate::agent::{Agent, AgentRole, BackendSelection, Specialty};
use crate::handoff::hand_off;
use crate::history::ChatMessage;
use crate::host::{HostError, ReplyRequest, SessionHost};
use crate::prompts::EditorPrompts;
use crate::search::{DEFAULT_MAX_RESULTS, SearchClient, format_hits};
use crate::story::StoryData;
use crate::tools::{ToolError, ToolInvocation, ToolOutcome};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Ended,
}

/// What the caller should surface after a successful tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolReply {
    /// Text to hand back to the model as the tool result, if any.
    Output(Option<String>),
    /// The active agent changed. The host announced it before the new agent greeted the user.
    Handoff {
        from: AgentRole,
        to: AgentRole,
        announcement: String,
    },
    /// The session is over and the room has been deleted.
    Finished,
}

/// Settings fixed for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub room: String,
    pub prompts: EditorPrompts,
    pub backends: BackendSelection,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            room: "story-room".to_string(),
            prompts: EditorPrompts::default(),
            backends: BackendSelection::default(),
        }
    }
}

pub struct AgentSession {
    id: Uuid,
    options: SessionOptions,
    active: Agent,
    story: StoryData,
    state: SessionState,
    host: Arc<dyn SessionHost>,
    search: Option<Arc<dyn SearchClient>>,
    /// Optional channel for broadcasting story changes to subscribers.
    story_tx: Option<mpsc::Sender<StoryData>>,
}

impl AgentSession {
    /// Creates a session whose active agent is the lead editor.
    pub fn new(host: Arc<dyn SessionHost>, options: SessionOptions) -> Self {
        let active = Agent::lead_editor(&options.prompts);
        Self {
            id: Uuid::new_v4(),
            options,
            active,
            story: StoryData::new(),
            state: SessionState::Active,
            host,
            search: None,
            story_tx: None,
        }
    }

    pub fn with_search(mut self, search: Arc<dyn SearchClient>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_story_updates(mut self, story_tx: mpsc::Sender<StoryData>) -> Self {
        self.story_tx = Some(story_tx);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn room(&self) -> &str {
        &self.options.room
    }

    pub fn active(&self) -> &Agent {
        &self.active
    }

    pub fn story(&self) -> &StoryData {
        &self.story
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ended(&self) -> bool {
        self.state == SessionState::Ended
    }

    /// Activates the lead editor, which opens the conversation.
    #[instrument(skip_all, fields(session_id = %self.id))]
    pub async fn start(&mut self) -> Result<(), HostError> {
        info!(agent = %self.active.role(), room = %self.options.room, "starting session");
        self.enter().await
    }

    pub fn record_user_turn(&mut self, text: impl Into<String>) {
        self.active.history_mut().push(ChatMessage::user(text));
    }

    pub fn record_assistant_turn(&mut self, text: impl Into<String>) {
        self.active.history_mut().push(ChatMessage::assistant(text));
    }

    /// Builds the request the host needs to reply as the active agent.
    pub fn reply_request(&self, instructions: Option<&str>, allow_interruptions: bool) -> ReplyRequest {
        ReplyRequest {
            agent: self.active.role(),
            system_prompt: self.active.instructions().to_string(),
            history: self.active.history().messages().to_vec(),
            instructions: instructions.map(str::to_string),
            allow_interruptions,
            backends: self.active.backends().resolve(&self.options.backends),
        }
    }

    /// Dispatches a tool call by name against the active agent.
    ///
    /// A failure leaves the active agent and the story untouched.
    #[instrument(skip(self, arguments), fields(session_id = %self.id, agent = %self.active.role()))]
    pub async fn call_tool(&mut self, tool: &str, arguments: Value) -> Result<ToolReply, ToolError> {
        if self.is_ended() {
            return Err(ToolError::SessionEnded);
        }
        let editor_tool = self.active.tools().get(tool).ok_or_else(|| ToolError::UnknownTool {
            tool: tool.to_string(),
            role: self.active.role().to_string(),
        })?;
        let invocation = ToolInvocation::parse(editor_tool, arguments)?;
        info!("Executing tool '{}'", tool);

        let outcome = self.execute(invocation).await.inspect_err(|e| {
            warn!(error = %e, "tool call failed");
        })?;

        match outcome {
            ToolOutcome::Continue(output) => Ok(ToolReply::Output(output)),
            ToolOutcome::HandoffTo { next, announcement } => {
                let from = self.active.role();
                self.active = *next;
                let to = self.active.role();
                info!(%from, %to, story = ?self.story, "handoff complete");
                if let Err(e) = self.host.announce(&announcement).await {
                    warn!(error = %e, "failed to announce the handoff");
                }
                if let Err(e) = self.enter().await {
                    error!(error = %e, "new agent failed to greet the user");
                }
                Ok(ToolReply::Handoff {
                    from,
                    to,
                    announcement,
                })
            }
            ToolOutcome::Finished => Ok(ToolReply::Finished),
        }
    }

    async fn execute(&mut self, invocation: ToolInvocation) -> Result<ToolOutcome, ToolError> {
        match invocation {
            ToolInvocation::CharacterIntroduction(args) => {
                self.story.append_character(args.name, args.background);
                self.broadcast_story().await;
                Ok(ToolOutcome::Continue(None))
            }
            ToolInvocation::LocationIntroduction(args) => {
                self.story.append_location(args.location);
                self.broadcast_story().await;
                Ok(ToolOutcome::Continue(None))
            }
            ToolInvocation::ThemeIntroduction(args) => {
                self.story.set_theme(args.theme);
                self.broadcast_story().await;
                Ok(ToolOutcome::Continue(None))
            }
            ToolInvocation::DetectedChildrensBook => {
                Ok(hand_off(&self.active, Specialty::ChildrensBooks, &self.options.prompts)?.into())
            }
            ToolInvocation::DetectedNovel => {
                Ok(hand_off(&self.active, Specialty::Novels, &self.options.prompts)?.into())
            }
            ToolInvocation::SearchReferences(args) => {
                let search = self
                    .search
                    .as_ref()
                    .ok_or_else(|| ToolError::MissingCredential("SEARCH_API_KEY".to_string()))?;
                let hits = search
                    .search(&args.query, args.max_results.unwrap_or(DEFAULT_MAX_RESULTS))
                    .await?;
                Ok(ToolOutcome::Continue(Some(format_hits(&hits))))
            }
            ToolInvocation::StoryFinished => {
                self.finish_story().await?;
                Ok(ToolOutcome::Finished)
            }
        }
    }

    /// Runs the active agent's on-enter behavior: an immediate reply.
    async fn enter(&mut self) -> Result<(), HostError> {
        let request = self.reply_request(None, true);
        let reply = self.host.generate_reply(&request).await?;
        self.record_assistant_turn(reply);
        Ok(())
    }

    /// Interrupts, delivers a final uninterruptible reply, then deletes the room.
    ///
    /// The room is only deleted once the final reply has been delivered. If the
    /// reply fails, the room is left up and the session stays active.
    async fn finish_story(&mut self) -> Result<(), ToolError> {
        if let Err(e) = self.host.interrupt().await {
            warn!(error = %e, "failed to interrupt the reply in flight");
        }

        let request = self.reply_request(Some(self.options.prompts.final_feedback()), false);
        let reply = self.host.generate_reply(&request).await.inspect_err(|e| {
            error!(error = %e, "final reply failed, leaving the room up");
        })?;
        self.record_assistant_turn(reply);
        self.state = SessionState::Ended;

        self.host.delete_room(&self.options.room).await?;
        info!(room = %self.options.room, story = ?self.story, "story finished, room deleted");
        Ok(())
    }

    async fn broadcast_story(&self) {
        if let Some(tx) = &self.story_tx {
            if tx.send(self.story.clone()).await.is_err() {
                warn!("Failed to broadcast story update: receiver dropped.");
            }
        }
    }
}
