//! Rolling chat context.
//!
//! Once the message buffer reaches `summary_interval`, the most recent
//! `summary_interval` messages are summarized and the buffer is cut back to
//! `min(max_messages / 2, len)` messages. Summaries are kept in a bounded
//! ring; running totals survive eviction.

use super::summarizer::Summarizer;
use chrono::{DateTime, Duration, Utc};
use parlor_config::ContextConfig;
use parlor_core::clock::{Clock, SystemClock};
use parlor_core::message::{self, ChatMessage};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_MAX_MESSAGES: usize = 50;
pub const DEFAULT_SUMMARY_INTERVAL: usize = 10;
pub const DEFAULT_MAX_SUMMARIES: usize = 100;

/// Summaries shown by [`ChatContextManager::generate_context`].
const CONTEXT_SUMMARIES: usize = 2;

/// A compressed slice of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub summary: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub key_topics: Vec<String>,
    pub message_count: usize,
}

/// Result of [`ChatContextManager::process_messages`].
#[derive(Debug, Clone)]
pub struct ProcessedContext {
    /// The messages to keep in the live history
    pub active_messages: Vec<ChatMessage>,
    /// Retained summaries, oldest first
    pub summaries: Vec<ChatSummary>,
    /// Rendered prompt context
    pub total_context: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextStatistics {
    pub total_summaries: usize,
    pub total_messages_summarized: usize,
    pub all_topics: Vec<String>,
    pub time_span: Duration,
}

impl fmt::Display for ContextStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Summaries: {}", self.total_summaries)?;
        writeln!(
            f,
            "Total Messages Summarized: {}",
            self.total_messages_summarized
        )?;
        writeln!(f, "All Topics: {}", self.all_topics.join(", "))?;
        write!(f, "Time Span: {}", format_span(self.time_span))
    }
}

/// `H:MM:SS`, prefixed with `N day(s), ` from one day up.
fn format_span(span: Duration) -> String {
    let secs = span.num_seconds().max(0);
    let (days, secs) = (secs / 86_400, secs % 86_400);
    let clock = format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60);
    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        n => format!("{n} days, {clock}"),
    }
}

pub struct ChatContextManager {
    max_messages: usize,
    summary_interval: usize,
    max_summaries: usize,
    summaries: VecDeque<ChatSummary>,
    total_summaries: usize,
    total_messages_summarized: usize,
    created_at: DateTime<Utc>,
    clock: Arc<dyn Clock>,
    summarizer: Arc<dyn Summarizer>,
}

impl ChatContextManager {
    pub fn new(
        max_messages: usize,
        summary_interval: usize,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            max_messages,
            summary_interval: summary_interval.max(1),
            max_summaries: DEFAULT_MAX_SUMMARIES,
            summaries: VecDeque::new(),
            total_summaries: 0,
            total_messages_summarized: 0,
            created_at: clock.now(),
            clock,
            summarizer,
        }
    }

    /// 50 messages, summarizing every 10.
    pub fn with_default_limits(summarizer: Arc<dyn Summarizer>) -> Self {
        Self::new(DEFAULT_MAX_MESSAGES, DEFAULT_SUMMARY_INTERVAL, summarizer)
    }

    pub fn from_config(config: &ContextConfig, summarizer: Arc<dyn Summarizer>) -> Self {
        Self::new(config.max_messages, config.summary_interval, summarizer)
            .with_max_summaries(config.max_summaries)
    }

    /// Replace the clock. Also restarts the creation time.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.created_at = clock.now();
        self.clock = clock;
        self
    }

    pub fn with_max_summaries(mut self, max: usize) -> Self {
        self.max_summaries = max.max(1);
        while self.summaries.len() > self.max_summaries {
            self.summaries.pop_front();
        }
        self
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn summary_interval(&self) -> usize {
        self.summary_interval
    }

    /// Retained summaries, oldest first.
    pub fn summaries(&self) -> impl Iterator<Item = &ChatSummary> {
        self.summaries.iter()
    }

    /// Summarize and trim `messages` when the interval is reached.
    ///
    /// A failed summary is logged and leaves the messages untouched.
    pub async fn process_messages(&mut self, messages: Vec<ChatMessage>) -> ProcessedContext {
        let mut messages = messages;

        if messages.len() >= self.summary_interval {
            let window = &messages[messages.len() - self.summary_interval..];
            let transcript = message::transcript(window);

            match self.summarizer.summarize(&transcript).await {
                Ok(draft) => {
                    let start_time = self.start_time_for(window);
                    let summary = ChatSummary {
                        summary: draft.summary,
                        start_time,
                        end_time: self.clock.now(),
                        key_topics: split_topics(&draft.key_topics),
                        message_count: window.len(),
                    };
                    debug!(
                        messages = summary.message_count,
                        topics = summary.key_topics.len(),
                        "Conversation summarized"
                    );
                    self.record(summary);

                    let retain = (self.max_messages / 2).min(messages.len());
                    messages = messages.split_off(messages.len() - retain);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to generate summary");
                }
            }
        }

        let total_context = self.generate_context(&messages);
        ProcessedContext {
            active_messages: messages,
            summaries: self.summaries.iter().cloned().collect(),
            total_context,
        }
    }

    fn start_time_for(&self, window: &[ChatMessage]) -> DateTime<Utc> {
        window
            .first()
            .and_then(|m| m.sent_at)
            .or_else(|| self.summaries.back().map(|s| s.end_time))
            .unwrap_or(self.created_at)
    }

    fn record(&mut self, summary: ChatSummary) {
        self.total_summaries += 1;
        self.total_messages_summarized += summary.message_count;
        if self.summaries.len() == self.max_summaries {
            self.summaries.pop_front();
        }
        self.summaries.push_back(summary);
    }

    /// Recent summaries followed by the last `max_messages` messages.
    pub fn generate_context(&self, messages: &[ChatMessage]) -> String {
        let mut parts: Vec<String> = Vec::new();

        if !self.summaries.is_empty() {
            parts.push("Previous Context:".into());
            let skip = self.summaries.len().saturating_sub(CONTEXT_SUMMARIES);
            for summary in self.summaries.iter().skip(skip) {
                parts.push(format!("- {}", summary.summary));
                parts.push(format!("  Topics: {}", summary.key_topics.join(", ")));
            }
            parts.push("\nRecent Messages:".into());
        }

        let skip = messages.len().saturating_sub(self.max_messages);
        parts.extend(messages[skip..].iter().map(ChatMessage::transcript_line));

        parts.join("\n")
    }

    /// Known topics sharing at least one word with `query`.
    pub fn get_relevant_topics(&self, query: &str) -> Vec<String> {
        let query = query.to_lowercase();
        let query_words: Vec<&str> = query.split_whitespace().collect();
        if query_words.is_empty() {
            return Vec::new();
        }

        self.unique_topics()
            .into_iter()
            .filter(|topic| {
                let topic = topic.to_lowercase();
                topic.split_whitespace().any(|w| query_words.contains(&w))
            })
            .collect()
    }

    pub fn get_statistics(&self) -> ContextStatistics {
        let time_span = match (self.summaries.front(), self.summaries.back()) {
            (Some(first), Some(last)) => last.end_time - first.start_time,
            _ => Duration::zero(),
        };

        ContextStatistics {
            total_summaries: self.total_summaries,
            total_messages_summarized: self.total_messages_summarized,
            all_topics: self.unique_topics(),
            time_span,
        }
    }

    fn unique_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = Vec::new();
        for topic in self.summaries.iter().flat_map(|s| s.key_topics.iter()) {
            if !topics.contains(topic) {
                topics.push(topic.clone());
            }
        }
        topics
    }
}

fn split_topics(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}
