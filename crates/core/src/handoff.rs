//! Handoff Protocol
//!
//! Control moves one way only: from the lead editor to exactly one
//! specialist. The specialist inherits the lead's history verbatim; the story
//! context is owned by the session and is never part of the transfer, so both
//! agents write to the same record.

use crate::agent::{Agent, AgentRole, Specialty};
use crate::prompts::EditorPrompts;
use crate::tools::ToolOutcome;
use tracing::info;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HandoffError {
    #[error("The {from} cannot hand the conversation to the {to}")]
    NotFromLead { from: AgentRole, to: AgentRole },
}

/// The agent to activate next and the line surfaced to the user.
#[derive(Debug)]
pub struct Handoff {
    pub next: Agent,
    pub announcement: String,
}

impl From<Handoff> for ToolOutcome {
    fn from(handoff: Handoff) -> Self {
        ToolOutcome::HandoffTo {
            next: Box::new(handoff.next),
            announcement: handoff.announcement,
        }
    }
}

/// Builds the specialist that takes over from `current`.
pub fn hand_off(
    current: &Agent,
    target: Specialty,
    prompts: &EditorPrompts,
) -> Result<Handoff, HandoffError> {
    let to = AgentRole::SpecialistEditor(target);
    if current.role() != AgentRole::LeadEditor {
        return Err(HandoffError::NotFromLead {
            from: current.role(),
            to,
        });
    }

    let next = Agent::specialist_editor(target, prompts, current.history().clone());
    info!(
        from = %current.role(),
        %to,
        history_len = next.history().len(),
        "switching to the specialist editor"
    );

    Ok(Handoff {
        next,
        announcement: format!("Let's switch to the {}.", target.editor_title()),
    })
}
