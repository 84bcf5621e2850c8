//! Kernel configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional JSON
//! file, then `PHOENIX_*` environment variables (`__` separates nested keys,
//! e.g. `PHOENIX_LLM__MODE=stub`).

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KernelConfig {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub kernel: RunSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Generator selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LlmMode {
    #[default]
    Stub,
    ModelBacked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub mode: LlmMode,

    /// Required when `mode` is model-backed.
    #[serde(default)]
    pub model_path: Option<String>,

    #[serde(default = "default_context_length")]
    pub context_length: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_output_chars")]
    pub max_output_chars: usize,

    /// Base sampling seed; derived from the spec hash when unset.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f64,

    /// Local inference executable.
    #[serde(default = "default_command")]
    pub command: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            mode: LlmMode::Stub,
            model_path: None,
            context_length: default_context_length(),
            timeout_ms: default_timeout_ms(),
            max_output_chars: default_max_output_chars(),
            seed: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            command: default_command(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default)]
    pub require_backward_compat: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            registry_path: default_registry_path(),
            max_iterations: default_max_iterations(),
            require_backward_compat: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_context_length() -> u32 {
    4096
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_output_chars() -> usize {
    16_000
}

fn default_temperature() -> f64 {
    0.2
}

fn default_max_tokens() -> u32 {
    512
}

fn default_top_p() -> f64 {
    0.9
}

fn default_command() -> String {
    "llama-cli".to_string()
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("./var/registry.json")
}

fn default_max_iterations() -> u32 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

impl KernelConfig {
    /// Loads and validates the layered configuration. A missing file falls
    /// back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&KernelConfig::default())?);

        if let Some(path) = path {
            if path.exists() {
                builder = builder.add_source(
                    config::File::from(path).format(config::FileFormat::Json),
                );
            } else {
                tracing::info!(path = %path.display(), "config file not found, using defaults");
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PHOENIX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: KernelConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if self.llm.mode == LlmMode::ModelBacked
            && self.llm.model_path.as_deref().map_or(true, |p| p.trim().is_empty())
        {
            return invalid("llm.model_path is required when llm.mode is model-backed");
        }
        if self.llm.timeout_ms == 0 {
            return invalid("llm.timeout_ms must be positive");
        }
        if self.llm.max_output_chars == 0 {
            return invalid("llm.max_output_chars must be positive");
        }
        if self.kernel.max_iterations == 0 {
            return invalid("kernel.max_iterations must be positive");
        }
        Ok(())
    }
}
