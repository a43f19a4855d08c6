pub mod client;
pub mod config;
pub mod error;
pub mod message;
pub mod protocol;
pub mod session;
pub mod store;
pub mod summary;
pub mod trace;

pub use client::{AgentClient, AgentError, HttpAgentClient};
pub use config::ChatConfig;
pub use error::ChatError;
pub use message::{Message, MessageId, Role};
pub use protocol::{ChatReply, ChatRequest};
pub use session::{ChatCommand, ChatSession, Outcome, PendingSend, Screen};
pub use store::{ConversationState, ConversationStore, APOLOGY};
pub use summary::{summarize, Badge, DisplayState, TraceSummary};
pub use trace::{
    MetaValue, Step, StepAction, StepStatus, ToolInvocation, ToolStatus, Trace, TraceError,
};
