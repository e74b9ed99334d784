//! Editor Tools
//!
//! This module defines the closed set of tools the driving model may call,
//! their typed arguments and JSON schemas, which tools each agent role exposes,
//! and the typed outcome and failure of a tool call.

use crate::agent::{Agent, AgentRole};
use crate::handoff::HandoffError;
use crate::host::HostError;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::time::Duration;

// --- Arguments ---

#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct CharacterIntroductionArgs {
    /// The character's name.
    pub name: String,
    /// A short description of who the character is.
    pub background: String,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct LocationIntroductionArgs {
    /// The name or short description of the location.
    pub location: String,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct ThemeIntroductionArgs {
    /// The central theme of the story.
    pub theme: String,
}

#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct SearchReferencesArgs {
    /// What to look up, e.g. a historical period or comparable titles.
    pub query: String,
    /// Upper bound on the number of results to return.
    #[schemars(description = "Maximum number of results (1-10), defaults to 5")]
    #[serde(default)]
    pub max_results: Option<u8>,
}

// --- Tool catalogue ---

/// Every tool known to the editors, keyed by the name the model sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EditorTool {
    CharacterIntroduction,
    LocationIntroduction,
    ThemeIntroduction,
    DetectedChildrensBook,
    DetectedNovel,
    SearchReferences,
    StoryFinished,
}

impl EditorTool {
    pub const ALL: [EditorTool; 7] = [
        EditorTool::CharacterIntroduction,
        EditorTool::LocationIntroduction,
        EditorTool::ThemeIntroduction,
        EditorTool::DetectedChildrensBook,
        EditorTool::DetectedNovel,
        EditorTool::SearchReferences,
        EditorTool::StoryFinished,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EditorTool::CharacterIntroduction => "character_introduction",
            EditorTool::LocationIntroduction => "location_introduction",
            EditorTool::ThemeIntroduction => "theme_introduction",
            EditorTool::DetectedChildrensBook => "detected_childrens_book",
            EditorTool::DetectedNovel => "detected_novel",
            EditorTool::SearchReferences => "search_references",
            EditorTool::StoryFinished => "story_finished",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            EditorTool::CharacterIntroduction => "Called when the user has provided a character.",
            EditorTool::LocationIntroduction => "Called when the user has provided a location.",
            EditorTool::ThemeIntroduction => "Called when the user has provided a theme.",
            EditorTool::DetectedChildrensBook => {
                "Hand off to the children's book specialist once enough information is gathered."
            }
            EditorTool::DetectedNovel => {
                "Hand off to the novel specialist once enough information is gathered."
            }
            EditorTool::SearchReferences => {
                "Search the web for reference material relevant to the story (settings, periods, comparable works)."
            }
            EditorTool::StoryFinished => {
                "Wrap up the session once the story outline is complete. Gives final feedback and hangs up."
            }
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    /// JSON schema of the tool's arguments.
    pub fn parameters(self) -> Value {
        let schema = match self {
            EditorTool::CharacterIntroduction => schema_for!(CharacterIntroductionArgs),
            EditorTool::LocationIntroduction => schema_for!(LocationIntroductionArgs),
            EditorTool::ThemeIntroduction => schema_for!(ThemeIntroductionArgs),
            EditorTool::SearchReferences => schema_for!(SearchReferencesArgs),
            EditorTool::DetectedChildrensBook
            | EditorTool::DetectedNovel
            | EditorTool::StoryFinished => {
                return json!({ "type": "object", "properties": {} });
            }
        };
        serde_json::to_value(schema).unwrap_or_else(|_| json!({ "type": "object" }))
    }

    pub fn spec(self) -> ToolSpec {
        ToolSpec {
            name: self.name(),
            description: self.description(),
            parameters: self.parameters(),
        }
    }
}

/// Declaration handed to the driving model.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// A tool call with its arguments already decoded into their typed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    CharacterIntroduction(CharacterIntroductionArgs),
    LocationIntroduction(LocationIntroductionArgs),
    ThemeIntroduction(ThemeIntroductionArgs),
    DetectedChildrensBook,
    DetectedNovel,
    SearchReferences(SearchReferencesArgs),
    StoryFinished,
}

impl ToolInvocation {
    pub fn parse(tool: EditorTool, arguments: Value) -> Result<Self, ToolError> {
        Ok(match tool {
            EditorTool::CharacterIntroduction => {
                Self::CharacterIntroduction(decode(tool, arguments)?)
            }
            EditorTool::LocationIntroduction => Self::LocationIntroduction(decode(tool, arguments)?),
            EditorTool::ThemeIntroduction => Self::ThemeIntroduction(decode(tool, arguments)?),
            EditorTool::SearchReferences => Self::SearchReferences(decode(tool, arguments)?),
            EditorTool::DetectedChildrensBook => Self::DetectedChildrensBook,
            EditorTool::DetectedNovel => Self::DetectedNovel,
            EditorTool::StoryFinished => Self::StoryFinished,
        })
    }
}

fn decode<T: DeserializeOwned>(tool: EditorTool, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: tool.name().to_string(),
        reason: e.to_string(),
    })
}

// --- Registry ---

/// The tools one agent exposes, looked up by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, EditorTool>,
}

impl ToolRegistry {
    pub fn for_role(role: &AgentRole) -> Self {
        let story_tools = [
            EditorTool::CharacterIntroduction,
            EditorTool::LocationIntroduction,
            EditorTool::ThemeIntroduction,
        ];
        let role_tools: &[EditorTool] = match role {
            AgentRole::LeadEditor => &[EditorTool::DetectedChildrensBook, EditorTool::DetectedNovel],
            AgentRole::SpecialistEditor(_) => {
                &[EditorTool::SearchReferences, EditorTool::StoryFinished]
            }
        };
        let tools = story_tools
            .iter()
            .chain(role_tools)
            .map(|tool| (tool.name(), *tool))
            .collect();
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<EditorTool> {
        self.tools.get(name).copied()
    }

    pub fn contains(&self, tool: EditorTool) -> bool {
        self.tools.contains_key(tool.name())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tools.keys().copied()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|tool| tool.spec()).collect()
    }
}

// --- Outcome and failure ---

/// What a successful tool call asks the session to do next.
#[derive(Debug)]
pub enum ToolOutcome {
    /// Stay with the current agent, optionally reporting text back to the model.
    Continue(Option<String>),
    /// Make `next` the active agent and surface `announcement` to the user.
    HandoffTo {
        next: Box<Agent>,
        announcement: String,
    },
    /// The final reply was delivered and the room torn down.
    Finished,
}

/// Typed failure of a single tool call. None of these change the active agent.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Missing credential: {0}")]
    MissingCredential(String),
    #[error("Upstream service returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
    #[error("Tool call timed out after {0:?}")]
    Timeout(Duration),
    #[error("Unexpected tool failure: {0}")]
    Unexpected(String),
    #[error("Tool '{tool}' is not available to the {role}")]
    UnknownTool { tool: String, role: String },
    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },
    #[error("The session has already ended")]
    SessionEnded,
    #[error(transparent)]
    Handoff(#[from] HandoffError),
    #[error(transparent)]
    Host(#[from] HostError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Specialty;

    #[test]
    fn test_tool_names_round_trip() {
        for tool in EditorTool::ALL {
            assert_eq!(EditorTool::from_name(tool.name()), Some(tool));
        }
        assert_eq!(EditorTool::from_name("delete_story"), None);
    }

    #[test]
    fn test_lead_registry_has_handoff_tools_only() {
        let registry = ToolRegistry::for_role(&AgentRole::LeadEditor);
        let names: Vec<_> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "character_introduction",
                "detected_childrens_book",
                "detected_novel",
                "location_introduction",
                "theme_introduction",
            ]
        );
        assert!(!registry.contains(EditorTool::StoryFinished));
        assert!(!registry.contains(EditorTool::SearchReferences));
    }

    #[test]
    fn test_specialist_registry_cannot_hand_off() {
        let registry = ToolRegistry::for_role(&AgentRole::SpecialistEditor(Specialty::Novels));
        assert_eq!(registry.get("story_finished"), Some(EditorTool::StoryFinished));
        assert_eq!(registry.get("search_references"), Some(EditorTool::SearchReferences));
        assert_eq!(registry.get("detected_novel"), None);
        assert_eq!(registry.get("detected_childrens_book"), None);
        assert_eq!(registry.specs().len(), 5);
    }

    #[test]
    fn test_character_schema_lists_required_fields() {
        let schema = EditorTool::CharacterIntroduction.parameters();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["name"].is_object());
        assert!(schema["properties"]["background"].is_object());
        let required: Vec<_> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"name"));
        assert!(required.contains(&"background"));
    }

    #[test]
    fn test_argumentless_tools_have_empty_object_schema() {
        let schema = EditorTool::StoryFinished.parameters();
        assert_eq!(schema, json!({ "type": "object", "properties": {} }));
    }

    #[test]
    fn test_parse_typed_arguments() {
        let invocation = ToolInvocation::parse(
            EditorTool::CharacterIntroduction,
            json!({ "name": "Aria", "background": "orphaned blacksmith" }),
        )
        .unwrap();
        assert_eq!(
            invocation,
            ToolInvocation::CharacterIntroduction(CharacterIntroductionArgs {
                name: "Aria".into(),
                background: "orphaned blacksmith".into(),
            })
        );

        let search =
            ToolInvocation::parse(EditorTool::SearchReferences, json!({ "query": "tides" })).unwrap();
        assert_eq!(
            search,
            ToolInvocation::SearchReferences(SearchReferencesArgs {
                query: "tides".into(),
                max_results: None,
            })
        );
    }

    #[test]
    fn test_parse_ignores_arguments_of_argumentless_tools() {
        let invocation = ToolInvocation::parse(EditorTool::DetectedNovel, Value::Null).unwrap();
        assert_eq!(invocation, ToolInvocation::DetectedNovel);
    }

    #[test]
    fn test_parse_rejects_missing_argument() {
        let err = ToolInvocation::parse(EditorTool::LocationIntroduction, json!({})).unwrap_err();
        match err {
            ToolError::InvalidArguments { tool, reason } => {
                assert_eq!(tool, "location_introduction");
                assert!(reason.contains("location"));
            }
            other => panic!("Expected InvalidArguments, got {other:?}"),
        }
    }

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::UpstreamStatus {
            status: 503,
            body: "busy".into(),
        };
        assert_eq!(err.to_string(), "Upstream service returned status 503: busy");
        assert_eq!(
            ToolError::MissingCredential("SEARCH_API_KEY".into()).to_string(),
            "Missing credential: SEARCH_API_KEY"
        );
    }
}
