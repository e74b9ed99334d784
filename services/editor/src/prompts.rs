//! Loads prompt overrides from a directory of markdown files.

use anyhow::{Context, Result};
use std::{collections::HashMap, fs, path::Path};
use story_editor_core::prompts::EditorPrompts;
use tracing::info;

/// Reads every `*.md` file in `prompts_path`, keyed by file stem.
pub fn load_prompts(prompts_path: &Path) -> Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();
    let entries = fs::read_dir(prompts_path)
        .with_context(|| format!("Failed to read prompts directory {}", prompts_path.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let prompt_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?
                .to_string();
            let content = fs::read_to_string(&path)?;
            prompts.insert(prompt_key, content);
        }
    }
    Ok(prompts)
}

/// Resolves the editor prompts from the built-in texts, an optional override
/// directory and an optional response language.
pub fn editor_prompts(
    prompts_path: Option<&Path>,
    response_language: Option<&str>,
) -> Result<EditorPrompts> {
    let mut prompts = match prompts_path {
        Some(path) => {
            let overrides = load_prompts(path)?;
            info!(path = %path.display(), overrides = overrides.len(), "Loaded prompt overrides.");
            EditorPrompts::with_overrides(&overrides)
        }
        None => EditorPrompts::default(),
    };
    if let Some(language) = response_language {
        prompts = prompts.with_response_language(language);
    }
    Ok(prompts)
}
