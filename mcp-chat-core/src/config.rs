use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat};
use serde::Deserialize;

use crate::error::ChatError;

pub const DEFAULT_CONFIG_PATH: &str = "mcp-chat.toml";

/// Questions offered on an empty conversation.
pub const DEFAULT_SUGGESTIONS: [&str; 6] = [
    "What's 142 × 37? Show me the calculation steps",
    "Calculate the compound interest on $5000 at 3.5% for 7 years",
    "Find the square root of 2048 and explain the method",
    "What's 15% of 890 plus 25% of 340?",
    "Solve: (125 + 75) ÷ 8 × 3 - 12",
    "Calculate how many days are in 5 years and 7 months",
];

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChatConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AgentConfig {
    pub base_url: String,
    pub chat_path: String,
    pub timeout_seconds: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            chat_path: "/chat".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl AgentConfig {
    pub fn chat_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.chat_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UiConfig {
    /// Shown as a character counter next to the input; not enforced.
    pub input_limit: usize,
    pub suggestions: Vec<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            input_limit: 500,
            suggestions: DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ChatConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &str) -> Result<Self, ChatError> {
        Self::from_builder(Config::builder().add_source(File::with_name(path).required(false)))
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, ChatError> {
        Self::from_builder(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ChatError> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        let url = &self.agent.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ChatError::InvalidConfig(format!(
                "agent.base_url must be an http(s) URL, got `{}`",
                url
            )));
        }
        if !self.agent.chat_path.starts_with('/') {
            return Err(ChatError::InvalidConfig(format!(
                "agent.chat_path must start with '/', got `{}`",
                self.agent.chat_path
            )));
        }
        if self.agent.timeout_seconds == 0 {
            return Err(ChatError::InvalidConfig(
                "agent.timeout_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
