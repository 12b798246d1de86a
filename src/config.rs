use crate::error::{InterpreterError, Result};
use crate::llm::{LLMConfig, LLMProvider};
use crate::storage::history::HISTORY_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the video interpreter
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// LLM provider settings
    pub llm: LLMConfig,

    /// Metadata lookup settings
    pub metadata: MetadataConfig,

    /// Local persistence settings
    pub storage: StorageConfig,

    /// Export and logging settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// oEmbed-style endpoint queried with `?url=<video url>`
    pub endpoint: String,

    /// HTTP request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the history and preference documents
    pub data_dir: Option<PathBuf>,

    /// Maximum number of history entries kept
    pub history_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory markdown exports are written to
    pub export_dir: PathBuf,

    /// Log filter used when RUST_LOG is not set
    pub log_level: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://noembed.com/embed".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            history_limit: HISTORY_LIMIT,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("./exports"),
            log_level: "info".to_string(),
        }
    }
}

impl StorageConfig {
    /// Resolved data directory: configured path, else the platform data dir
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("video-interpreter")
        })
    }
}

impl Config {
    /// Load configuration from the first readable file, then apply
    /// environment overrides. Falls back to defaults when no file exists.
    pub fn load() -> Result<Self> {
        let mut config_paths = vec![
            PathBuf::from("video-interpreter.toml"),
            PathBuf::from("config/video-interpreter.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            config_paths.push(dir.join("video-interpreter").join("config.toml"));
        }

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path.display());
                        config.apply_env_overrides();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
                    }
                }
            }
        }

        Ok(Self::from_env())
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&config_str)
            .map_err(|e| InterpreterError::Configuration(format!("{}: {}", path.display(), e)))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Defaults with environment variables applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(api_key) = std::env::var("VIDEO_INTERPRETER_API_KEY").or_else(|_| std::env::var("GEMINI_API_KEY")) {
            if !api_key.is_empty() {
                self.llm.api_key = Some(api_key);
            }
        }

        if let Ok(model) = std::env::var("VIDEO_INTERPRETER_MODEL") {
            self.llm.model = model;
        }

        if let Ok(data_dir) = std::env::var("VIDEO_INTERPRETER_DATA_DIR") {
            self.storage.data_dir = Some(PathBuf::from(data_dir));
        }

        if let Ok(log_level) = std::env::var("VIDEO_INTERPRETER_LOG_LEVEL") {
            self.output.log_level = log_level;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)
            .map_err(|e| InterpreterError::Configuration(e.to_string()))?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        match self.llm.provider {
            LLMProvider::Gemini | LLMProvider::OpenAI => {
                if self.llm.api_key.as_deref().map_or(true, str::is_empty) {
                    return Err(InterpreterError::Configuration(format!(
                        "API key required for {:?} (set VIDEO_INTERPRETER_API_KEY)",
                        self.llm.provider
                    )));
                }
            }
            LLMProvider::LMStudio => {
                if self.llm.endpoint.is_none() {
                    return Err(InterpreterError::Configuration(
                        "endpoint required for LMStudio provider".to_string(),
                    ));
                }
            }
        }

        if self.llm.timeout_seconds == 0 || self.metadata.timeout_seconds == 0 {
            return Err(InterpreterError::Configuration("timeouts must be greater than 0".to_string()));
        }

        if self.storage.history_limit == 0 {
            return Err(InterpreterError::Configuration("history_limit must be greater than 0".to_string()));
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Video Interpreter Configuration:\n\
            - Provider: {:?}\n\
            - Model: {}\n\
            - Metadata Endpoint: {}\n\
            - Data Directory: {}\n\
            - History Limit: {}\n\
            - Export Directory: {}",
            self.llm.provider,
            self.llm.model,
            self.metadata.endpoint,
            self.storage.resolve_data_dir().display(),
            self.storage.history_limit,
            self.output.export_dir.display(),
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_provider(mut self, provider: LLMProvider) -> Self {
        self.config.llm.provider = provider;
        self
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.config.llm.api_key = Some(api_key);
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.config.llm.model = model;
        self
    }

    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        self.config.storage.data_dir = Some(dir);
        self
    }

    pub fn with_export_dir(mut self, dir: PathBuf) -> Self {
        self.config.output.export_dir = dir;
        self
    }

    pub fn with_metadata_endpoint(mut self, endpoint: String) -> Self {
        self.config.metadata.endpoint = endpoint;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
