//! Rolling conversation context.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`ChatContextManager`] | bounds the live history, keeps summaries |
//! | [`Summarizer`] | turns a transcript into a summary + topic list |
//! | [`LlmSummarizer`] | the provider-backed summarizer |

pub mod manager;
pub mod summarizer;

pub use manager::{
    ChatContextManager, ChatSummary, ContextStatistics, ProcessedContext, DEFAULT_MAX_MESSAGES,
    DEFAULT_MAX_SUMMARIES, DEFAULT_SUMMARY_INTERVAL,
};
pub use summarizer::{LlmSummarizer, Summarizer, SummaryDraft};
