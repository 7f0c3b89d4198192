//! Chatter: derives conversational features and hands off to the responder.

use crate::responder::{Completion, Responder};
use chrono::{DateTime, FixedOffset, Local, Timelike, Utc};
use parlor_core::clock::{Clock, SystemClock};
use parlor_core::error::Error;
use parlor_core::message::{ChatHistory, ChatMessage};
use parlor_memory::Demo;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..12 => Self::Morning,
            12..18 => Self::Afternoon,
            _ => Self::Evening,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationDuration {
    Short,
    Moderate,
    Long,
}

impl ConversationDuration {
    pub fn from_elapsed(elapsed: chrono::Duration) -> Self {
        match elapsed.num_seconds() {
            s if s < 300 => Self::Short,
            s if s < 900 => Self::Moderate,
            _ => Self::Long,
        }
    }
}

impl fmt::Display for ConversationDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Short => "short",
            Self::Moderate => "moderate",
            Self::Long => "long",
        })
    }
}

pub struct Chatter {
    responder: Responder,
    clock: Arc<dyn Clock>,
    started_at: DateTime<Utc>,
    /// `None` means the machine's local zone.
    utc_offset: Option<FixedOffset>,
}

impl Chatter {
    pub fn new(responder: Responder) -> Self {
        Self::with_clock(responder, Arc::new(SystemClock))
    }

    /// The conversation starts at the clock's current time.
    pub fn with_clock(responder: Responder, clock: Arc<dyn Clock>) -> Self {
        Self {
            responder,
            started_at: clock.now(),
            clock,
            utc_offset: None,
        }
    }

    /// Compute time of day in a fixed zone instead of the local one.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = Some(offset);
        self
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        let now = self.clock.now();
        let hour = match self.utc_offset {
            Some(offset) => now.with_timezone(&offset).hour(),
            None => now.with_timezone(&Local).hour(),
        };
        TimeOfDay::from_hour(hour)
    }

    pub fn conversation_duration(&self) -> ConversationDuration {
        ConversationDuration::from_elapsed(self.clock.now() - self.started_at)
    }

    /// Reply to a conversation.
    pub async fn forward(
        &self,
        history: &ChatHistory,
        demos: &[&Demo],
    ) -> Result<Completion, Error> {
        self.responder
            .respond(
                history,
                self.time_of_day(),
                self.conversation_duration(),
                demos,
            )
            .await
    }

    /// Reply to a single fan message.
    pub async fn forward_question(
        &self,
        question: &str,
        demos: &[&Demo],
    ) -> Result<Completion, Error> {
        let history = ChatHistory::from_messages(vec![ChatMessage::fan(question)]);
        self.forward(&history, demos).await
    }
}
