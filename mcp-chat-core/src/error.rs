use thiserror::Error;

use crate::client::AgentError;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Transport error: {0}")]
    Transport(#[from] AgentError),
}
