//! Agent client: the single outbound request/response call.
//!
//! Provides an `AgentClient` trait with one implementation:
//! - **HttpAgentClient**: `POST {base_url}{chat_path}` with a JSON body
//!
//! Every way the call can go wrong (connect error, timeout, non-2xx status,
//! unusable body) comes back as an [`AgentError`]. There is no retry.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::config::AgentConfig;
use crate::protocol::{ChatReply, ChatRequest};

// ============================================================================
// AgentClient trait
// ============================================================================

#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, AgentError>;

    /// Endpoint description for logging.
    fn endpoint(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

/// Transport failure. The `Display` text is shown to the user verbatim.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("agent returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("unusable agent response: {0}")]
    InvalidBody(String),

    #[error("{0}")]
    Transport(String),
}

// ============================================================================
// HttpAgentClient
// ============================================================================

#[derive(Debug, Clone)]
pub struct HttpAgentClient {
    client: Client,
    url: String,
}

impl HttpAgentClient {
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            url: config.chat_url(),
        })
    }

    /// Create a client against a different base URL (for testing / overrides).
    pub fn with_base_url(config: &AgentConfig, base_url: String) -> Result<Self, AgentError> {
        let config = AgentConfig {
            base_url,
            ..config.clone()
        };
        Self::new(&config)
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, AgentError> {
        tracing::debug!(url = %self.url, chars = request.message.len(), "Sending chat request");

        let response = self.client.post(&self.url).json(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(code = status.as_u16(), body = %body, "Agent endpoint error");
            return Err(AgentError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<ChatReply>(&body)
            .map_err(|e| AgentError::InvalidBody(e.to_string()))
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

// ============================================================================
// TESTS
// ============================================================================
