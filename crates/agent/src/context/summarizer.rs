//! Summarizer: compresses a transcript into a summary and topic tags.

use crate::fields::{self, Field, SECTION_BREAK};
use async_trait::async_trait;
use parlor_core::error::Error;
use parlor_core::message::Message;
use parlor_core::provider::{Provider, ProviderRequest, SamplingParams};
use std::sync::Arc;
use tracing::debug;

const CONTEXT: Field = Field::new("Context", "Recent chat messages to summarize");
const SUMMARY: Field = Field::new("Summary", "A concise summary of the conversation context");
const KEY_TOPICS: Field = Field::new(
    "Key Topics",
    "Key topics discussed, as a comma-separated list",
);

/// Raw summarizer output; topics are still one comma-separated string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryDraft {
    pub summary: String,
    pub key_topics: String,
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript: &str) -> Result<SummaryDraft, Error>;
}

/// Summarizer backed by one LLM completion.
pub struct LlmSummarizer {
    provider: Arc<dyn Provider>,
    model: String,
    sampling: SamplingParams,
}

impl LlmSummarizer {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        sampling: SamplingParams,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            sampling,
        }
    }

    fn build_messages(transcript: &str) -> Vec<Message> {
        let system = format!(
            "Summarize the chat so the conversation can continue without the full transcript.{SECTION_BREAK}{}{SECTION_BREAK}",
            fields::format_block(&[CONTEXT, SUMMARY, KEY_TOPICS])
        );
        let prompt = format!("{}\n{}:", CONTEXT.line(transcript), SUMMARY.label);
        vec![Message::system(system), Message::user(prompt)]
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, transcript: &str) -> Result<SummaryDraft, Error> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: Self::build_messages(transcript),
            sampling: self.sampling.clone(),
        };

        let response = self.provider.complete(request).await?;
        debug!(model = %response.model, "Summary completion received");
        parse_summary(&response.message.content)
    }
}

/// Read `Summary:` and `Key Topics:` out of a completion.
///
/// The prompt ends with `Summary:`, so a reply without the marker is taken
/// to be the summary itself. An empty summary is an error.
fn parse_summary(text: &str) -> Result<SummaryDraft, Error> {
    let mut values = fields::extract(text, &[SUMMARY.label, KEY_TOPICS.label]).into_iter();
    let summary = values.next().flatten();
    let key_topics = values.next().flatten().unwrap_or_default();

    let summary = match summary {
        Some(s) => s,
        None => match fields::find_label(text, KEY_TOPICS.label) {
            Some((start, _)) => text[..start].trim().to_string(),
            None => text.trim().to_string(),
        },
    };

    if summary.is_empty() {
        return Err(Error::MalformedCompletion(
            "summary completion has no Summary field".into(),
        ));
    }

    Ok(SummaryDraft {
        summary,
        key_topics,
    })
}
