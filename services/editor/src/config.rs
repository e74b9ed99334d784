use std::path::PathBuf;
use std::time::Duration;
use story_editor_core::BackendSelection;
use story_editor_core::search::{DEFAULT_SEARCH_ENDPOINT, SearchSettings};
use tracing::Level;

/// Language the editors answer in unless `RESPONSE_LANGUAGE` says otherwise.
pub const DEFAULT_RESPONSE_LANGUAGE: &str = "Japanese";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Defines the supported OpenAI-compatible backends for the language model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Gemini,
}

impl Provider {
    pub fn api_base(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub provider: Provider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub backends: BackendSelection,
    pub room_name: String,
    pub response_language: Option<String>,
    pub prompts_path: Option<PathBuf>,
    pub search_api_key: Option<String>,
    pub search_endpoint: String,
    pub search_timeout: Duration,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let provider_str = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "openai" => Provider::OpenAI,
            "gemini" => Provider::Gemini,
            other => {
                return Err(ConfigError::InvalidValue(
                    "LLM_PROVIDER".to_string(),
                    format!("'{}' is not one of 'openai', 'gemini'", other),
                ));
            }
        };

        let openai_api_key = non_empty_var("OPENAI_API_KEY");
        let gemini_api_key = non_empty_var("GEMINI_API_KEY");

        match provider {
            Provider::OpenAI if openai_api_key.is_none() => {
                return Err(ConfigError::MissingVar(
                    "OPENAI_API_KEY must be set for 'openai' provider".to_string(),
                ));
            }
            Provider::Gemini if gemini_api_key.is_none() => {
                return Err(ConfigError::MissingVar(
                    "GEMINI_API_KEY must be set for 'gemini' provider".to_string(),
                ));
            }
            _ => {}
        }

        let defaults = BackendSelection::default();
        let backends = BackendSelection {
            llm_model: std::env::var("CHAT_MODEL").unwrap_or(defaults.llm_model),
            stt_model: std::env::var("STT_MODEL").unwrap_or(defaults.stt_model),
            tts_voice: std::env::var("TTS_VOICE").unwrap_or(defaults.tts_voice),
        };

        let room_name = std::env::var("ROOM_NAME").unwrap_or_else(|_| "story-room".to_string());
        // Set but blank turns the language directive off.
        let response_language = match std::env::var("RESPONSE_LANGUAGE") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(value.trim().to_string()),
            Err(_) => Some(DEFAULT_RESPONSE_LANGUAGE.to_string()),
        };
        let prompts_path = non_empty_var("PROMPTS_PATH").map(PathBuf::from);

        let search_api_key = non_empty_var("SEARCH_API_KEY");
        let search_endpoint =
            std::env::var("SEARCH_ENDPOINT").unwrap_or_else(|_| DEFAULT_SEARCH_ENDPOINT.to_string());
        let search_timeout_str =
            std::env::var("SEARCH_TIMEOUT_SECS").unwrap_or_else(|_| "10".to_string());
        let search_timeout = search_timeout_str
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "SEARCH_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", search_timeout_str),
                )
            })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            provider,
            openai_api_key,
            gemini_api_key,
            backends,
            room_name,
            response_language,
            prompts_path,
            search_api_key,
            search_endpoint,
            search_timeout,
            log_level,
        })
    }

    /// The API key for the selected provider.
    pub fn provider_api_key(&self) -> Option<&str> {
        match self.provider {
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
        }
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            api_key: self.search_api_key.clone(),
            endpoint: self.search_endpoint.clone(),
            timeout: self.search_timeout,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    const VARS: [&str; 13] = [
        "LLM_PROVIDER",
        "OPENAI_API_KEY",
        "GEMINI_API_KEY",
        "CHAT_MODEL",
        "STT_MODEL",
        "TTS_VOICE",
        "ROOM_NAME",
        "RESPONSE_LANGUAGE",
        "PROMPTS_PATH",
        "SEARCH_API_KEY",
        "SEARCH_ENDPOINT",
        "SEARCH_TIMEOUT_SECS",
        "RUST_LOG",
    ];

    fn clear_env_vars() {
        unsafe {
            for var in VARS {
                env::remove_var(var);
            }
        }
    }

    fn set_minimal_env_openai() {
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal_openai() {
        clear_env_vars();
        set_minimal_env_openai();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.provider, Provider::OpenAI);
        assert_eq!(config.provider_api_key(), Some("test-openai-key"));
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.backends, BackendSelection::default());
        assert_eq!(config.room_name, "story-room");
        assert_eq!(config.response_language.as_deref(), Some(DEFAULT_RESPONSE_LANGUAGE));
        assert_eq!(config.prompts_path, None);
        assert_eq!(config.search_api_key, None);
        assert_eq!(config.search_endpoint, DEFAULT_SEARCH_ENDPOINT);
        assert_eq!(config.search_timeout, Duration::from_secs(10));
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    #[serial]
    fn test_config_from_env_gemini_provider() {
        clear_env_vars();
        unsafe {
            env::set_var("LLM_PROVIDER", "Gemini");
            env::set_var("GEMINI_API_KEY", "test-gemini-key");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.provider_api_key(), Some("test-gemini-key"));
        assert!(config.provider.api_base().contains("generativelanguage"));
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        set_minimal_env_openai();
        unsafe {
            env::set_var("CHAT_MODEL", "gpt-4o");
            env::set_var("TTS_VOICE", "alloy");
            env::set_var("ROOM_NAME", "writers-room");
            env::set_var("RESPONSE_LANGUAGE", "French");
            env::set_var("PROMPTS_PATH", "/custom/prompts");
            env::set_var("SEARCH_API_KEY", "tvly-test");
            env::set_var("SEARCH_TIMEOUT_SECS", "3");
            env::set_var("RUST_LOG", "debug");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.backends.llm_model, "gpt-4o");
        assert_eq!(config.backends.stt_model, "nova-3");
        assert_eq!(config.backends.tts_voice, "alloy");
        assert_eq!(config.room_name, "writers-room");
        assert_eq!(config.response_language.as_deref(), Some("French"));
        assert_eq!(config.prompts_path, Some(PathBuf::from("/custom/prompts")));
        assert_eq!(config.log_level, Level::DEBUG);

        let search = config.search_settings();
        assert_eq!(search.api_key.as_deref(), Some("tvly-test"));
        assert_eq!(search.timeout, Duration::from_secs(3));
    }

    #[test]
    #[serial]
    fn test_config_blank_response_language_disables_directive() {
        clear_env_vars();
        set_minimal_env_openai();
        unsafe {
            env::set_var("RESPONSE_LANGUAGE", "  ");
        }

        let config = Config::from_env().expect("Config should load successfully");
        assert_eq!(config.response_language, None);
    }

    #[test]
    #[serial]
    fn test_config_invalid_provider() {
        clear_env_vars();
        set_minimal_env_openai();
        unsafe {
            env::set_var("LLM_PROVIDER", "carrier-pigeon");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "LLM_PROVIDER"),
            _ => panic!("Expected InvalidValue for LLM_PROVIDER"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_search_timeout() {
        clear_env_vars();
        set_minimal_env_openai();
        unsafe {
            env::set_var("SEARCH_TIMEOUT_SECS", "0");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "SEARCH_TIMEOUT_SECS"),
            _ => panic!("Expected InvalidValue for SEARCH_TIMEOUT_SECS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        set_minimal_env_openai();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }

    #[test]
    #[serial]
    fn test_config_missing_openai_key() {
        clear_env_vars();

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => assert!(msg.contains("OPENAI_API_KEY")),
            _ => panic!("Expected MissingVar for OPENAI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_blank_gemini_key_is_missing() {
        clear_env_vars();
        unsafe {
            env::set_var("LLM_PROVIDER", "gemini");
            env::set_var("GEMINI_API_KEY", "   ");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => assert!(msg.contains("GEMINI_API_KEY")),
            _ => panic!("Expected MissingVar for GEMINI_API_KEY"),
        }
    }
}
