//! Editor prompt texts.
//!
//! Prompts are an immutable configuration value handed to every agent at
//! construction time. Built-in defaults can be replaced per key, which is how
//! the service applies a prompts directory.

use std::collections::HashMap;

const COMMON_INSTRUCTIONS: &str = "You are an editor at a leading publishing house, with a strong \
track record of discovering and nurturing new talent. You are a great communicator and ask the \
right questions to get the best out of people. You want the best for your authors, and you are \
not afraid to tell them when their ideas are not good enough.";

const LEAD_EDITOR: &str = "You are the lead editor at this business, and are yourself a \
generalist, but employ several specialist editors, specializing in children's books and fiction, \
respectively. You trust your editors to do their jobs, and will hand off the conversation to them \
when you feel you have an idea of the right one. Your goal is to gather a few pieces of \
information from the user about their next idea for a short story, and then hand off to the right \
agent. Start the conversation with a short introduction, then get straight to the details. You \
may hand off to either editor as soon as you know which one is the right fit.";

const SPECIALIST_EDITOR: &str = "You specialize in {specialty}, and have worked with some of the \
greats, and have even written a few books yourself.";

const FINAL_FEEDBACK: &str = "give brief but honest feedback on the story idea";

pub const KEY_COMMON: &str = "common_instructions";
pub const KEY_LEAD: &str = "lead_editor";
pub const KEY_SPECIALIST: &str = "specialist_editor";
pub const KEY_FINAL_FEEDBACK: &str = "final_feedback";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorPrompts {
    common: String,
    lead: String,
    specialist_template: String,
    final_feedback: String,
}

impl Default for EditorPrompts {
    fn default() -> Self {
        Self {
            common: COMMON_INSTRUCTIONS.to_string(),
            lead: LEAD_EDITOR.to_string(),
            specialist_template: SPECIALIST_EDITOR.to_string(),
            final_feedback: FINAL_FEEDBACK.to_string(),
        }
    }
}

impl EditorPrompts {
    /// Builds prompts from the defaults, replacing any text whose key is present
    /// in `overrides`. Unknown keys are ignored.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut prompts = Self::default();
        let slots = [
            (KEY_COMMON, &mut prompts.common),
            (KEY_LEAD, &mut prompts.lead),
            (KEY_SPECIALIST, &mut prompts.specialist_template),
            (KEY_FINAL_FEEDBACK, &mut prompts.final_feedback),
        ];
        for (key, slot) in slots {
            if let Some(text) = overrides.get(key) {
                *slot = text.trim().to_string();
            }
        }
        prompts
    }

    /// Appends a directive forcing every reply into `language`.
    pub fn with_response_language(mut self, language: &str) -> Self {
        self.common = format!(
            "{}\n\n**IMPORTANT: Always respond in {}.**",
            self.common, language
        );
        self
    }

    pub fn lead_instructions(&self) -> String {
        format!("{} {}", self.common, self.lead)
    }

    pub fn specialist_instructions(&self, specialty: &str) -> String {
        format!(
            "{} {}",
            self.common,
            self.specialist_template.replace("{specialty}", specialty)
        )
    }

    pub fn final_feedback(&self) -> &str {
        &self.final_feedback
    }
}
