//! Conversation store: the ordered message list and the pending flag.
//!
//! State machine: `Idle → Awaiting` on [`ConversationStore::append_user_message`],
//! `Awaiting → Idle` on [`ConversationStore::on_reply_settled`] (either branch).
//! Sends while `Awaiting` are dropped, never queued.
//!
//! `clear()` is allowed while `Awaiting`. The in-flight request is left alone
//! and its settlement lands as the first message of the emptied conversation:
//! an agent reply with no visible question.

use chrono::{DateTime, Utc};

use crate::client::AgentError;
use crate::message::{Message, MessageId};
use crate::protocol::{ChatReply, ChatRequest};
use crate::trace::Trace;

/// Text of the agent message appended when the request itself failed.
pub const APOLOGY: &str =
    "Sorry, I encountered an error while processing your request. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Idle,
    Awaiting,
}

#[derive(Debug, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    pending: bool,
    // Survives `clear()` so timestamps never go backwards within a session.
    last_timestamp: Option<DateTime<Utc>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn state(&self) -> ConversationState {
        if self.pending {
            ConversationState::Awaiting
        } else {
            ConversationState::Idle
        }
    }

    /// Append a user message and return the request to send.
    ///
    /// Blank input or a send while a request is outstanding is a silent
    /// no-op and returns `None`.
    pub fn append_user_message(&mut self, text: &str) -> Option<ChatRequest> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            tracing::debug!("Ignoring blank message");
            return None;
        }
        if self.pending {
            tracing::debug!("Ignoring send while a request is pending");
            return None;
        }

        let timestamp = self.next_timestamp();
        self.messages.push(Message::user(text, timestamp));
        self.pending = true;
        tracing::debug!(messages = self.messages.len(), "Conversation awaiting reply");

        Some(ChatRequest::new(trimmed))
    }

    /// Record the outcome of the outstanding request and return to `Idle`.
    pub fn on_reply_settled(&mut self, result: Result<ChatReply, AgentError>) -> &Message {
        if !self.pending {
            tracing::debug!("Reply settled with no request pending");
        }

        let message = match result {
            Ok(reply) => {
                let trace = reply
                    .mcp_details
                    .as_ref()
                    .filter(|details| !details.is_null())
                    .map(Trace::from_details);
                Message::agent(reply.reply, trace, self.next_timestamp())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Agent request failed");
                Message::agent(
                    APOLOGY,
                    Some(Trace::transport_failure(e.to_string())),
                    self.next_timestamp(),
                )
            }
        };

        self.pending = false;
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Empty the conversation. Returns the number of messages removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.messages.len();
        self.messages.clear();
        if self.pending {
            tracing::debug!("Cleared while a request is pending; its reply will still be appended");
        }
        removed
    }

    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }
}
