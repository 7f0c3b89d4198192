//! The prompting layer: how Parlor turns a fan's message into a reply.
//!
//! One chat turn runs:
//!
//! 1. **Record** the fan's message in the session history
//! 2. **Compress** history through the [`ChatContextManager`] (rolling summaries)
//! 3. **Retrieve** the `k` training demos closest to the conversation
//! 4. **Derive** time of day and conversation length ([`Chatter`])
//! 5. **Generate** the reply with a reasoning-chain prompt ([`Responder`])
//! 6. **Filter** the reply through the content filter and record it

pub mod chatter;
pub mod context;
pub mod fields;
pub mod optimizer;
pub mod responder;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use chatter::{Chatter, ConversationDuration, TimeOfDay};
pub use context::{
    ChatContextManager, ChatSummary, ContextStatistics, LlmSummarizer, ProcessedContext,
    Summarizer, SummaryDraft,
};
pub use optimizer::{CompiledProgram, KnnOptimizer};
pub use responder::{Completion, Responder};
pub use session::{ChatSession, Command, SessionReply};
