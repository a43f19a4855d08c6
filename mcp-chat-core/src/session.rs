//! Chat session: named commands dispatched against the conversation.
//!
//! A [`ChatSession`] owns the screen, the draft input, the
//! [`ConversationStore`] and the [`DisplayState`]. Rendering surfaces turn
//! user gestures into [`ChatCommand`]s and read state back through accessors;
//! they never mutate the store directly.
//!
//! Every request is tagged with the conversation it was sent from. `Back`
//! starts a new conversation, and a reply that settles after it is dropped.

use std::sync::Arc;

use crate::client::{AgentClient, AgentError, HttpAgentClient};
use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::message::{Message, MessageId};
use crate::protocol::{ChatReply, ChatRequest};
use crate::store::{ConversationState, ConversationStore};
use crate::summary::{summarize, DisplayState, TraceSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Leave the welcome screen.
    Start,
    /// Return to the welcome screen, discarding the conversation.
    Back,
    SetDraft(String),
    /// Copy a suggested question into the draft.
    PickSuggestion(usize),
    /// Send the current draft.
    SendDraft,
    Send(String),
    Clear,
    ToggleDetails(MessageId),
}

/// What a command did, for the rendering surface to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    Navigated(Screen),
    DraftUpdated,
    Replied(MessageId),
    Cleared(usize),
    Toggled { id: MessageId, expanded: bool },
}

/// A request returned by [`ChatSession::begin_send`], to be handed back to
/// [`ChatSession::settle`] with its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub request: ChatRequest,
    conversation: u64,
}

pub struct ChatSession {
    client: Arc<dyn AgentClient>,
    suggestions: Vec<String>,
    screen: Screen,
    draft: String,
    store: ConversationStore,
    display: DisplayState,
    // Bumped each time the conversation is discarded.
    conversation: u64,
}

impl ChatSession {
    pub fn new(client: Arc<dyn AgentClient>, suggestions: Vec<String>) -> Self {
        Self {
            client,
            suggestions,
            screen: Screen::Welcome,
            draft: String::new(),
            store: ConversationStore::new(),
            display: DisplayState::new(),
            conversation: 0,
        }
    }

    /// Session talking HTTP to the configured agent endpoint.
    pub fn from_config(config: &ChatConfig) -> Result<Self, ChatError> {
        let client = HttpAgentClient::new(&config.agent)?;
        Ok(Self::new(Arc::new(client), config.ui.suggestions.clone()))
    }

    pub async fn dispatch(&mut self, command: ChatCommand) -> Outcome {
        tracing::debug!(?command, screen = ?self.screen, "Dispatching command");

        match (self.screen, command) {
            (Screen::Welcome, ChatCommand::Start) => {
                self.screen = Screen::Chat;
                Outcome::Navigated(Screen::Chat)
            }
            (Screen::Chat, ChatCommand::Back) => {
                // Leaving the view drops the conversation with it.
                self.store = ConversationStore::new();
                self.display = DisplayState::new();
                self.conversation += 1;
                self.draft.clear();
                self.screen = Screen::Welcome;
                Outcome::Navigated(Screen::Welcome)
            }
            (Screen::Chat, ChatCommand::SetDraft(text)) => {
                self.draft = text;
                Outcome::DraftUpdated
            }
            (Screen::Chat, ChatCommand::PickSuggestion(index)) => {
                match self.suggestions.get(index) {
                    Some(question) => {
                        self.draft = question.clone();
                        Outcome::DraftUpdated
                    }
                    None => Outcome::Ignored,
                }
            }
            (Screen::Chat, ChatCommand::SendDraft) => {
                let text = self.draft.clone();
                match self.send(&text).await {
                    Some(id) => Outcome::Replied(id),
                    None => Outcome::Ignored,
                }
            }
            (Screen::Chat, ChatCommand::Send(text)) => match self.send(&text).await {
                Some(id) => Outcome::Replied(id),
                None => Outcome::Ignored,
            },
            (Screen::Chat, ChatCommand::Clear) => {
                let removed = self.store.clear();
                self.display.reset();
                Outcome::Cleared(removed)
            }
            (Screen::Chat, ChatCommand::ToggleDetails(id)) => match self.toggle_details(id) {
                Some(expanded) => Outcome::Toggled { id, expanded },
                None => Outcome::Ignored,
            },
            (screen, command) => {
                tracing::debug!(?command, ?screen, "Command not applicable on this screen");
                Outcome::Ignored
            }
        }
    }

    /// Send `text` and wait for the reply. Returns the id of the agent message.
    pub async fn send(&mut self, text: &str) -> Option<MessageId> {
        let pending = self.begin_send(text)?;
        let result = self.client.send(&pending.request).await;
        self.settle(&pending, result).map(|message| message.id)
    }

    /// First half of [`ChatSession::send`], for surfaces that drive the call themselves.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingSend> {
        let request = self.store.append_user_message(text)?;
        self.draft.clear();
        tracing::info!(endpoint = %self.client.endpoint(), "Message sent");
        Some(PendingSend {
            request,
            conversation: self.conversation,
        })
    }

    /// Second half of [`ChatSession::send`]. Must be called once per `begin_send`.
    ///
    /// Returns `None` when the conversation the request belonged to has been
    /// discarded; the result is dropped and the current one is left untouched.
    pub fn settle(
        &mut self,
        pending: &PendingSend,
        result: Result<ChatReply, AgentError>,
    ) -> Option<&Message> {
        if pending.conversation != self.conversation {
            tracing::debug!(
                sent_in = pending.conversation,
                current = self.conversation,
                "Dropping reply for a discarded conversation"
            );
            return None;
        }
        Some(self.store.on_reply_settled(result))
    }

    /// Flip the details panel of an agent message. `None` if it has no trace.
    pub fn toggle_details(&mut self, id: MessageId) -> Option<bool> {
        let has_trace = self.store.get(id).is_some_and(|m| m.trace.is_some());
        if !has_trace {
            return None;
        }
        Some(self.display.toggle(id))
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn state(&self) -> ConversationState {
        self.store.state()
    }

    pub fn is_expanded(&self, id: MessageId) -> bool {
        self.display.is_expanded(id)
    }

    pub fn summary(&self, id: MessageId) -> Option<TraceSummary> {
        self.store.get(id)?.trace.as_ref().map(summarize)
    }
}
