//! Wire types for the agent endpoint.

use serde::{Deserialize, Serialize};

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Successful reply from the agent endpoint.
///
/// `mcp_details` is kept as raw JSON: its shape is only trusted field by field
/// when the trace is built (see [`crate::trace::Trace::from_details`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default)]
    pub mcp_details: Option<serde_json::Value>,
}

impl ChatReply {
    pub fn new(reply: impl Into<String>, mcp_details: Option<serde_json::Value>) -> Self {
        Self {
            reply: reply.into(),
            mcp_details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(ChatRequest::new("2+2")).unwrap();
        assert_eq!(body, json!({"message": "2+2"}));
    }

    #[test]
    fn test_reply_without_details() {
        let reply: ChatReply = serde_json::from_value(json!({"reply": "4"})).unwrap();
        assert_eq!(reply.reply, "4");
        assert!(reply.mcp_details.is_none());
    }

    #[test]
    fn test_reply_keeps_malformed_details_raw() {
        let reply: ChatReply =
            serde_json::from_value(json!({"reply": "4", "mcp_details": {"steps": "nope"}})).unwrap();
        assert_eq!(reply.mcp_details, Some(json!({"steps": "nope"})));
    }

    #[test]
    fn test_reply_requires_reply_text() {
        let result = serde_json::from_value::<ChatReply>(json!({"mcp_details": {}}));
        assert!(result.is_err());
    }
}
