//! Editor Agents
//!
//! An agent is a conversational role: rendered instructions, optional backend
//! overrides, the conversation history it carries, and the tools it exposes.
//! Two roles exist, the lead editor who triages the idea and the specialist
//! editors who refine it.

use crate::history::ChatHistory;
use crate::prompts::EditorPrompts;
use crate::tools::ToolRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Voice used by every specialist so the user hears the switch.
pub const SPECIALIST_TTS_VOICE: &str = "echo";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    ChildrensBooks,
    Novels,
}

impl Specialty {
    /// Label baked into the specialist's instructions.
    pub fn label(self) -> &'static str {
        match self {
            Specialty::ChildrensBooks => "children's books",
            Specialty::Novels => "novels",
        }
    }

    /// How the lead refers to this specialist when announcing a handoff.
    pub fn editor_title(self) -> &'static str {
        match self {
            Specialty::ChildrensBooks => "children's book editor",
            Specialty::Novels => "novel editor",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(tag = "role", content = "specialty", rename_all = "snake_case")]
pub enum AgentRole {
    LeadEditor,
    SpecialistEditor(Specialty),
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentRole::LeadEditor => write!(f, "lead editor"),
            AgentRole::SpecialistEditor(specialty) => write!(f, "{}", specialty.editor_title()),
        }
    }
}

/// Backend services used for a reply once per-agent overrides are applied.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BackendSelection {
    pub llm_model: String,
    pub stt_model: String,
    pub tts_voice: String,
}

impl Default for BackendSelection {
    fn default() -> Self {
        Self {
            llm_model: "gpt-4o-mini".to_string(),
            stt_model: "nova-3".to_string(),
            tts_voice: "ash".to_string(),
        }
    }
}

/// Per-agent replacements for the session's default backends.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendOverrides {
    pub llm_model: Option<String>,
    pub stt_model: Option<String>,
    pub tts_voice: Option<String>,
}

impl BackendOverrides {
    pub fn resolve(&self, defaults: &BackendSelection) -> BackendSelection {
        BackendSelection {
            llm_model: self
                .llm_model
                .clone()
                .unwrap_or_else(|| defaults.llm_model.clone()),
            stt_model: self
                .stt_model
                .clone()
                .unwrap_or_else(|| defaults.stt_model.clone()),
            tts_voice: self
                .tts_voice
                .clone()
                .unwrap_or_else(|| defaults.tts_voice.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    role: AgentRole,
    instructions: String,
    backends: BackendOverrides,
    history: ChatHistory,
    tools: ToolRegistry,
}

impl Agent {
    /// The lead editor always opens the session, so it starts with no history.
    pub fn lead_editor(prompts: &EditorPrompts) -> Self {
        let role = AgentRole::LeadEditor;
        Self {
            role,
            instructions: prompts.lead_instructions(),
            backends: BackendOverrides::default(),
            history: ChatHistory::new(),
            tools: ToolRegistry::for_role(&role),
        }
    }

    /// Creates a specialist that continues the conversation in `history`.
    pub fn specialist_editor(
        specialty: Specialty,
        prompts: &EditorPrompts,
        history: ChatHistory,
    ) -> Self {
        let role = AgentRole::SpecialistEditor(specialty);
        Self {
            role,
            instructions: prompts.specialist_instructions(specialty.label()),
            backends: BackendOverrides {
                tts_voice: Some(SPECIALIST_TTS_VOICE.to_string()),
                ..Default::default()
            },
            history,
            tools: ToolRegistry::for_role(&role),
        }
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn specialty(&self) -> Option<Specialty> {
        match self.role {
            AgentRole::LeadEditor => None,
            AgentRole::SpecialistEditor(specialty) => Some(specialty),
        }
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn backends(&self) -> &BackendOverrides {
        &self.backends
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub(crate) fn history_mut(&mut self) -> &mut ChatHistory {
        &mut self.history
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }
}
