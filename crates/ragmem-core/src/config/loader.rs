//! Configuration loading and persistence.

use super::{Config, EmbeddingConfig};
use crate::env::{self, vars};
use crate::error::ConfigError;
use crate::paths;
use crate::secret::SecretString;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        config.apply_env_overrides();
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load configuration from the default path, falling back to defaults if no file exists.
    ///
    /// Either way the environment is applied, so `OPENAI_API_KEY` alone is
    /// enough to enable the remote embedding provider.
    pub fn load_or_default() -> Self {
        match Self::load_default() {
            Ok(config) => config,
            Err(ConfigError::NotFound(_)) => Self::from_env_defaults(),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable configuration, using defaults");
                Self::from_env_defaults()
            }
        }
    }

    /// Defaults plus whatever the environment provides.
    pub fn from_env_defaults() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Parse configuration from a string. The environment is not consulted.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 has no serializer; plain JSON is valid JSON5
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply the process environment on top of the loaded values.
    pub fn apply_env_overrides(&mut self) {
        self.embeddings.apply_env_overrides();
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.embeddings.model.trim().is_empty() {
            errors.push("Embedding model cannot be empty".to_string());
        }

        if !(self.embeddings.base_url.starts_with("http://")
            || self.embeddings.base_url.starts_with("https://"))
        {
            errors.push(format!(
                "Embedding base_url must be an http(s) URL, got '{}'",
                self.embeddings.base_url
            ));
        }

        if self.embeddings.timeout_secs == 0 {
            errors.push("Embedding timeout_secs must be greater than 0".to_string());
        }

        if self.embeddings.max_input_chars == 0 {
            errors.push("Embedding max_input_chars must be greater than 0".to_string());
        }

        if self.defaults.list_limit == 0
            || self.defaults.recent_limit == 0
            || self.defaults.search_limit == 0
        {
            errors.push("Default limits must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }
}

impl EmbeddingConfig {
    /// Apply environment overrides.
    ///
    /// `OPENAI_API_KEY` only fills a missing key; a key present in the config
    /// file wins. `RAGMEM_EMBEDDINGS_URL` and `RAGMEM_EMBEDDINGS_TIMEOUT`
    /// replace the file's values whenever they are set.
    pub fn apply_env_overrides(&mut self) {
        if !self.has_api_key() {
            self.api_key = env::get_var(vars::OPENAI_API_KEY).and_then(SecretString::non_empty);
        }
        if let Some(url) = env::get_var(vars::RAGMEM_EMBEDDINGS_URL) {
            self.base_url = url;
        }
        if let Some(secs) = env::get_u64(vars::RAGMEM_EMBEDDINGS_TIMEOUT) {
            self.timeout_secs = secs;
        }
    }
}
