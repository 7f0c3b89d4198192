//! Message and chat history domain types.
//!
//! Two families of messages flow through the system:
//! - [`ChatMessage`] / [`ChatHistory`]: the creator ↔ fan conversation itself,
//!   also the shape of the training data.
//! - [`Message`]: a prompt message on the wire to the LLM provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single turn in a creator ↔ fan conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `true` when the creator sent this message, `false` for the fan.
    #[serde(default)]
    pub from_creator: bool,

    /// The text content
    #[serde(default)]
    pub content: String,

    /// When the message was sent. Absent in training data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// A message from the fan.
    pub fn fan(content: impl Into<String>) -> Self {
        Self {
            from_creator: false,
            content: content.into(),
            sent_at: None,
        }
    }

    /// A message from the creator.
    pub fn creator(content: impl Into<String>) -> Self {
        Self {
            from_creator: true,
            content: content.into(),
            sent_at: None,
        }
    }

    /// Stamp the message with the time it was sent.
    pub fn at(mut self, sent_at: DateTime<Utc>) -> Self {
        self.sent_at = Some(sent_at);
        self
    }

    /// Speaker label used in transcripts.
    pub fn speaker(&self) -> &'static str {
        if self.from_creator { "Creator" } else { "User" }
    }

    /// One transcript line: `Creator: hi` / `User: hello`.
    pub fn transcript_line(&self) -> String {
        format!("{}: {}", self.speaker(), self.content)
    }
}

/// Render messages as a transcript, one line per message.
pub fn transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(ChatMessage::transcript_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// An ordered creator ↔ fan conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatHistory {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    /// Append a turn.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// The most recent message, if any.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Render the whole history as a transcript.
    pub fn transcript(&self) -> String {
        transcript(&self.messages)
    }
}

/// The role of a prompt message sent to the LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Prompt input
    User,
    /// Model output
    Assistant,
    /// Instructions
    System,
}

/// A single prompt message exchanged with the LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }
}
