//! Layered configuration for Chunkchat.
//!
//! Reads configuration from multiple sources with precedence:
//! CLI flags > env vars > config file > defaults

use chunkchat_types::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The default OpenAI-compatible endpoint (Alibaba Cloud DashScope).
pub const DEFAULT_API_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

/// The default model to use.
pub const DEFAULT_MODEL: &str = "deepseek-r1-distill-llama-70b";

/// The default max tokens for a response.
pub const DEFAULT_MAX_TOKENS: u32 = 400;

/// The default system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// The default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

const API_KEY_ENV: &str = "DASHSCOPE_API_KEY";
const MODEL_ENV: &str = "CHUNKCHAT_MODEL";
const BASE_URL_ENV: &str = "CHUNKCHAT_BASE_URL";
const CONFIG_DIR_ENV: &str = "CHUNKCHAT_CONFIG_DIR";

/// Resolved configuration for a Chunkchat run.
#[derive(Debug, Clone)]
pub struct ChunkchatConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
    pub max_history_turns: Option<usize>,
    pub request_timeout_secs: u64,
    pub retry: RetrySettings,
    pub chunk: ChunkSettings,
    pub config_dir: PathBuf,
}

/// Settings that can be read from a TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub chunk: ChunkSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSettings {
    /// An empty string disables the system prompt.
    pub system_prompt: Option<String>,
    pub max_history_turns: Option<usize>,
}

/// Backoff parameters for retried completion requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_attempts: u32,
    pub multiplier_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            min_delay_ms: 1_000,
            max_delay_ms: 60_000,
            max_attempts: 20,
            multiplier_ms: 1_000,
        }
    }
}

/// Default chunking parameters for the `chunk` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkSettings {
    pub max_words: usize,
    pub overlap: usize,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            max_words: 300,
            overlap: 0,
        }
    }
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
    pub max_attempts: Option<u32>,
}

impl ChunkchatConfig {
    /// Load configuration from all sources, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables
    /// 3. Config file (~/.chunkchat/config.toml)
    /// 4. Defaults
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let config_dir = config_dir();
        let settings = load_settings_file(&config_dir.join("config.toml"));
        Self::resolve(overrides, settings, |key| std::env::var(key).ok(), config_dir)
    }

    /// Resolve a configuration from explicit sources.
    pub fn resolve(
        overrides: CliOverrides,
        settings: SettingsFile,
        env: impl Fn(&str) -> Option<String>,
        config_dir: PathBuf,
    ) -> Result<Self, ConfigError> {
        // Resolve API key: CLI > env > config file
        let api_key = overrides
            .api_key
            .or_else(|| env(API_KEY_ENV))
            .or(settings.api.api_key)
            .ok_or_else(|| ConfigError::MissingKey {
                key: format!("api_key (set {API_KEY_ENV} or add to ~/.chunkchat/config.toml)"),
            })?;

        let model = overrides
            .model
            .or_else(|| env(MODEL_ENV))
            .or(settings.api.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_tokens = overrides
            .max_tokens
            .or(settings.api.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS);
        if max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_tokens".into(),
                message: "must be at least 1".into(),
            });
        }

        let api_base_url = env(BASE_URL_ENV)
            .or(settings.api.base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let system_prompt = overrides
            .system_prompt
            .or(settings.session.system_prompt)
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
        let system_prompt = (!system_prompt.is_empty()).then_some(system_prompt);

        let mut retry = settings.retry;
        if let Some(attempts) = overrides.max_attempts {
            retry.max_attempts = attempts;
        }
        validate_retry(&retry)?;

        Ok(ChunkchatConfig {
            api_key,
            api_base_url,
            model,
            max_tokens,
            system_prompt,
            max_history_turns: settings.session.max_history_turns,
            request_timeout_secs: settings
                .api
                .timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            retry,
            chunk: settings.chunk,
            config_dir,
        })
    }
}

fn validate_retry(retry: &RetrySettings) -> Result<(), ConfigError> {
    if retry.max_attempts == 0 {
        return Err(ConfigError::InvalidValue {
            key: "retry.max_attempts".into(),
            message: "must be at least 1".into(),
        });
    }
    if retry.min_delay_ms > retry.max_delay_ms {
        return Err(ConfigError::InvalidValue {
            key: "retry.min_delay_ms".into(),
            message: format!(
                "{} exceeds retry.max_delay_ms ({})",
                retry.min_delay_ms, retry.max_delay_ms
            ),
        });
    }
    Ok(())
}

/// Get the Chunkchat config directory path (~/.chunkchat/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chunkchat")
}

/// Load and parse a TOML settings file, returning defaults on any error.
pub fn load_settings_file(path: &Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            SettingsFile::default()
        }),
        Err(_) => SettingsFile::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn resolve(
        overrides: CliOverrides,
        settings: SettingsFile,
        env: &[(&str, &str)],
    ) -> Result<ChunkchatConfig, ConfigError> {
        ChunkchatConfig::resolve(overrides, settings, env_from(env), PathBuf::from("/tmp/cc"))
    }

    #[test]
    fn test_default_settings() {
        let settings = SettingsFile::default();
        assert!(settings.api.api_key.is_none());
        assert_eq!(settings.retry, RetrySettings::default());
        assert_eq!(settings.chunk.max_words, 300);
    }

    #[test]
    fn test_settings_toml_parse() {
        let toml_str = r#"
[api]
model = "llama-4-scout-17b-16e-instruct"
max_tokens = 800

[session]
system_prompt = "Answer tersely."
max_history_turns = 10

[retry]
max_attempts = 5

[chunk]
max_words = 400
overlap = 20
"#;
        let settings: SettingsFile = toml::from_str(toml_str).unwrap();
        assert_eq!(
            settings.api.model.as_deref(),
            Some("llama-4-scout-17b-16e-instruct")
        );
        assert_eq!(settings.api.max_tokens, Some(800));
        assert_eq!(settings.session.max_history_turns, Some(10));
        assert_eq!(settings.retry.max_attempts, 5);
        // Unspecified retry fields keep their defaults.
        assert_eq!(settings.retry.max_delay_ms, 60_000);
        assert_eq!(settings.chunk.overlap, 20);
    }

    #[test]
    fn test_defaults_applied() {
        let config = resolve(
            CliOverrides::default(),
            SettingsFile::default(),
            &[("DASHSCOPE_API_KEY", "sk-env")],
        )
        .unwrap();
        assert_eq!(config.api_key, "sk-env");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.system_prompt.as_deref(), Some(DEFAULT_SYSTEM_PROMPT));
        assert_eq!(config.max_history_turns, None);
        assert_eq!(config.retry.max_attempts, 20);
    }

    #[test]
    fn test_missing_api_key() {
        let err = resolve(CliOverrides::default(), SettingsFile::default(), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { .. }));
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let mut settings = SettingsFile::default();
        settings.api.api_key = Some("sk-file".into());
        settings.api.model = Some("file-model".into());

        let env = [("DASHSCOPE_API_KEY", "sk-env"), ("CHUNKCHAT_MODEL", "env-model")];
        let config = resolve(CliOverrides::default(), settings.clone(), &env).unwrap();
        assert_eq!(config.api_key, "sk-env");
        assert_eq!(config.model, "env-model");

        let overrides = CliOverrides {
            model: Some("cli-model".into()),
            ..CliOverrides::default()
        };
        let config = resolve(overrides, settings.clone(), &env).unwrap();
        assert_eq!(config.model, "cli-model");

        let config = resolve(CliOverrides::default(), settings, &[]).unwrap();
        assert_eq!(config.api_key, "sk-file");
        assert_eq!(config.model, "file-model");
    }

    #[test]
    fn test_empty_system_prompt_disables_it() {
        let overrides = CliOverrides {
            api_key: Some("k".into()),
            system_prompt: Some(String::new()),
            ..CliOverrides::default()
        };
        let config = resolve(overrides, SettingsFile::default(), &[]).unwrap();
        assert!(config.system_prompt.is_none());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let overrides = CliOverrides {
            api_key: Some("k".into()),
            max_attempts: Some(0),
            ..CliOverrides::default()
        };
        let err = resolve(overrides, SettingsFile::default(), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "retry.max_attempts"));
    }

    #[test]
    fn test_inverted_delays_rejected() {
        let mut settings = SettingsFile::default();
        settings.api.api_key = Some("k".into());
        settings.retry.min_delay_ms = 10_000;
        settings.retry.max_delay_ms = 5_000;
        assert!(resolve(CliOverrides::default(), settings, &[]).is_err());
    }

    #[test]
    fn test_load_settings_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nbase_url = \"http://localhost:8000/v1\"\n").unwrap();
        let settings = load_settings_file(&path);
        assert_eq!(
            settings.api.base_url.as_deref(),
            Some("http://localhost:8000/v1")
        );
    }

    #[test]
    fn test_invalid_settings_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();
        let settings = load_settings_file(&path);
        assert!(settings.api.model.is_none());
    }

    #[test]
    fn test_missing_settings_file_is_default() {
        let settings = load_settings_file(Path::new("/nonexistent/chunkchat/config.toml"));
        assert!(settings.api.api_key.is_none());
    }
}
