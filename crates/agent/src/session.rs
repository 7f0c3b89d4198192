//! Chat session: one creator ↔ fan conversation driven line by line.

use crate::context::{ChatContextManager, ContextStatistics};
use crate::optimizer::CompiledProgram;
use crate::responder::Completion;
use parlor_core::clock::{Clock, SystemClock};
use parlor_core::error::Error;
use parlor_core::message::{ChatHistory, ChatMessage};
use std::sync::Arc;
use tracing::debug;

/// What a line of input produced.
#[derive(Debug, Clone)]
pub enum SessionReply {
    Exit,
    Topics(Vec<String>),
    Stats(ContextStatistics),
    Context(String),
    Response(Completion),
}

/// A command typed in place of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Topics,
    Stats,
    Context,
    Exit,
}

impl Command {
    /// Exact match only; anything else is chat text.
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "/topics" => Some(Self::Topics),
            "/stats" => Some(Self::Stats),
            "/context" => Some(Self::Context),
            "/exit" => Some(Self::Exit),
            _ => None,
        }
    }

    pub const HELP: &'static [(&'static str, &'static str)] = &[
        ("/topics", "Show relevant topics from history"),
        ("/stats", "Show conversation statistics"),
        ("/context", "Show current context summary"),
        ("/exit", "Exit the chat"),
    ];
}

pub struct ChatSession {
    history: ChatHistory,
    context: ChatContextManager,
    program: CompiledProgram,
    clock: Arc<dyn Clock>,
}

impl ChatSession {
    pub fn new(context: ChatContextManager, program: CompiledProgram) -> Self {
        Self {
            history: ChatHistory::new(),
            context,
            program,
            clock: Arc::new(SystemClock),
        }
    }

    /// Clock used to stamp messages.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn context(&self) -> &ChatContextManager {
        &self.context
    }

    /// Handle one line of input.
    pub async fn handle(&mut self, input: &str) -> Result<SessionReply, Error> {
        let input = input.trim();

        match Command::parse(input) {
            Some(Command::Exit) => Ok(SessionReply::Exit),
            Some(Command::Topics) => {
                let query = self.history.last().map(|m| m.content.as_str()).unwrap_or("");
                Ok(SessionReply::Topics(self.context.get_relevant_topics(query)))
            }
            Some(Command::Stats) => Ok(SessionReply::Stats(self.context.get_statistics())),
            Some(Command::Context) => Ok(SessionReply::Context(
                self.context.generate_context(&self.history.messages),
            )),
            None => self.chat_turn(input).await.map(SessionReply::Response),
        }
    }

    /// Append the fan's message, compress history, and generate a reply.
    pub async fn chat_turn(&mut self, text: &str) -> Result<Completion, Error> {
        self.history
            .push(ChatMessage::fan(text).at(self.clock.now()));

        let messages = std::mem::take(&mut self.history.messages);
        let processed = self.context.process_messages(messages).await;
        self.history.messages = processed.active_messages;
        debug!(active = self.history.len(), "History compressed");

        let completion = self.program.forward(&self.history).await?;
        self.history
            .push(ChatMessage::creator(&completion.output).at(self.clock.now()));
        Ok(completion)
    }
}
