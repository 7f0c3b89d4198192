//! Responder: one reasoning-chain LLM call per creator reply.
//!
//! The prompt has four fields:
//!
//! ```text
//! Chat History: the chat history
//! Reasoning Context: context about timing and duration
//! Reasoning: Let's think step by step to decide on our message. We ...
//! Your Message: the exact text of the message you will send to the fan.
//! ```
//!
//! Retrieved demos are shown first, then the live conversation with the
//! reasoning seeded so the model continues the thought and ends with
//! `Your Message:`. The message is passed through the content filter before
//! it is returned.

use crate::chatter::{ConversationDuration, TimeOfDay};
use crate::fields::{self, Field, SECTION_BREAK};
use parlor_core::error::Error;
use parlor_core::message::{ChatHistory, Message};
use parlor_core::provider::{Provider, ProviderRequest, SamplingParams};
use parlor_memory::Demo;
use parlor_security::ContentFilter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const CHAT_HISTORY: Field = Field::new("Chat History", "the chat history");
const REASONING_CONTEXT: Field = Field::new(
    "Reasoning Context",
    "context about timing and duration",
);
const REASONING: Field = Field::new(
    "Reasoning",
    "Let's think step by step to decide on our message. We ...",
);
const YOUR_MESSAGE: Field = Field::new(
    "Your Message",
    "the exact text of the message you will send to the fan.",
);

/// Seed placed after the live conversation.
pub const REASONING_SEED: &str = "Reasoning: Let's think step by step to decide on our message. We";

/// A generated reply and the reasoning behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub reasoning_steps: String,
    pub output: String,
}

pub struct Responder {
    provider: Arc<dyn Provider>,
    model: String,
    sampling: SamplingParams,
    instructions: String,
    filter: ContentFilter,
}

impl Responder {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        sampling: SamplingParams,
        instructions: impl Into<String>,
        filter: ContentFilter,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            sampling,
            instructions: instructions.into(),
            filter,
        }
    }

    /// Generate the creator's next message.
    pub async fn respond(
        &self,
        history: &ChatHistory,
        time_of_day: TimeOfDay,
        duration: ConversationDuration,
        demos: &[&Demo],
    ) -> Result<Completion, Error> {
        let reasoning_context = reasoning_context(time_of_day, duration);
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: self.build_messages(history, &reasoning_context, demos),
            sampling: self.sampling.clone(),
        };

        debug!(
            model = %self.model,
            demos = demos.len(),
            history = history.len(),
            "Requesting reply"
        );

        let response = self.provider.complete(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Reply received"
            );
        }

        let completion = parse_completion(&response.message.content);
        Ok(self.apply_filter(completion))
    }

    fn build_messages(
        &self,
        history: &ChatHistory,
        reasoning_context: &str,
        demos: &[&Demo],
    ) -> Vec<Message> {
        let system = format!(
            "{}{SECTION_BREAK}{}",
            self.instructions,
            fields::format_block(&[CHAT_HISTORY, REASONING_CONTEXT, REASONING, YOUR_MESSAGE])
        );

        let mut sections: Vec<String> = demos
            .iter()
            .map(|demo| {
                format!(
                    "{}\n{}",
                    CHAT_HISTORY.line(&demo.question),
                    YOUR_MESSAGE.line(&demo.answer)
                )
            })
            .collect();

        sections.push(format!(
            "{}\n{}\n{REASONING_SEED}",
            CHAT_HISTORY.line(&history.transcript()),
            REASONING_CONTEXT.line(reasoning_context)
        ));

        vec![Message::system(system), Message::user(sections.join(SECTION_BREAK))]
    }

    /// Redact disallowed content and note what was removed.
    fn apply_filter(&self, mut completion: Completion) -> Completion {
        let report = self.filter.check_message(&completion.output);
        if report.is_safe() {
            return completion;
        }

        let suggestions = self.filter.suggest_alternatives(&completion.output);
        debug!(violations = report.violations.len(), "Reply filtered");

        completion.reasoning_steps.push_str("\n\nMessage was filtered to remove: ");
        completion
            .reasoning_steps
            .push_str(&report.descriptions().join(", "));
        if !suggestions.is_empty() {
            completion.reasoning_steps.push_str("\nSuggested alternatives: ");
            completion.reasoning_steps.push_str("\n- ");
            completion.reasoning_steps.push_str(&suggestions.join("\n- "));
        }

        completion.output = self.filter.filter_message(&completion.output);
        completion
    }
}

/// `It's currently {time}, and the conversation duration is {duration}. `
pub fn reasoning_context(time_of_day: TimeOfDay, duration: ConversationDuration) -> String {
    format!("It's currently {time_of_day}, and the conversation duration is {duration}. ")
}

/// Split a completion into reasoning and message.
///
/// Without a `Your Message:` marker the whole text is the message.
fn parse_completion(text: &str) -> Completion {
    match fields::find_label(text, YOUR_MESSAGE.label) {
        Some((marker_start, value_start)) => {
            let before = text[..marker_start].trim();
            let reasoning = match fields::find_label(before, REASONING.label) {
                Some((_, start)) => before[start..].trim(),
                None => before,
            };
            Completion {
                reasoning_steps: reasoning.to_string(),
                output: text[value_start..].trim().to_string(),
            }
        }
        None => Completion {
            reasoning_steps: String::new(),
            output: text.trim().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use parlor_core::error::ProviderError;
    use parlor_core::message::ChatMessage;

    fn responder(provider: Arc<SequentialMockProvider>) -> Responder {
        Responder::new(
            provider,
            "mock-model",
            SamplingParams::default(),
            "You are an OnlyFans creator chatting on OnlyFans with a fan.",
            ContentFilter::builtin().unwrap(),
        )
    }

    fn history() -> ChatHistory {
        ChatHistory::from_messages(vec![ChatMessage::fan("hey, what are you up to?")])
    }

    fn demo(question: &str, answer: &str) -> Demo {
        Demo {
            question: question.into(),
            answer: answer.into(),
            embedding: vec![],
        }
    }

    #[test]
    fn reasoning_context_text() {
        assert_eq!(
            reasoning_context(TimeOfDay::Evening, ConversationDuration::Short),
            "It's currently evening, and the conversation duration is short. "
        );
    }

    #[test]
    fn parse_splits_on_marker() {
        let c = parse_completion(" need to be playful.\n\nYour Message: just got home, you?");
        assert_eq!(c.reasoning_steps, "need to be playful.");
        assert_eq!(c.output, "just got home, you?");
    }

    #[test]
    fn parse_strips_repeated_reasoning_label() {
        let c = parse_completion("Reasoning: We should ask back.\nYour Message: and you?");
        assert_eq!(c.reasoning_steps, "We should ask back.");
        assert_eq!(c.output, "and you?");
    }

    #[test]
    fn parse_without_marker_is_all_output() {
        let c = parse_completion("  hey you  ");
        assert_eq!(c.reasoning_steps, "");
        assert_eq!(c.output, "hey you");
    }

    #[tokio::test]
    async fn prompt_has_demos_history_and_seed() {
        let provider = Arc::new(SequentialMockProvider::single_text(
            " should be warm.\nYour Message: thinking of you",
        ));
        let r = responder(provider.clone());
        let d = demo("User: hi", "hi babe");

        let completion = r
            .respond(&history(), TimeOfDay::Morning, ConversationDuration::Moderate, &[&d])
            .await
            .unwrap();
        assert_eq!(completion.output, "thinking of you");
        assert_eq!(completion.reasoning_steps, "should be warm.");

        let requests = provider.requests();
        let system = &requests[0].messages[0].content;
        assert!(system.starts_with("You are an OnlyFans creator"));
        assert!(system.contains("Follow the following format."));
        assert!(system.contains("Reasoning Context: context about timing and duration"));

        let prompt = &requests[0].messages[1].content;
        assert_eq!(
            prompt,
            "Chat History: User: hi\nYour Message: hi babe\
             \n\n---\n\n\
             Chat History: User: hey, what are you up to?\n\
             Reasoning Context: It's currently morning, and the conversation duration is moderate. \n\
             Reasoning: Let's think step by step to decide on our message. We"
        );
    }

    #[tokio::test]
    async fn sampling_is_forwarded() {
        let provider = Arc::new(SequentialMockProvider::single_text("Your Message: ok"));
        let sampling = SamplingParams {
            temperature: 0.5,
            top_k: Some(50),
            stop: vec!["---".into()],
            ..SamplingParams::default()
        };
        let r = Responder::new(
            provider.clone(),
            "m",
            sampling.clone(),
            "persona",
            ContentFilter::builtin().unwrap(),
        );
        r.respond(&history(), TimeOfDay::Afternoon, ConversationDuration::Long, &[])
            .await
            .unwrap();
        assert_eq!(provider.requests()[0].sampling, sampling);
    }

    #[tokio::test]
    async fn unsafe_output_is_filtered_and_explained() {
        let provider = Arc::new(SequentialMockProvider::single_text(
            "We want to connect.\nYour Message: add me on Instagram and let's grab coffee",
        ));
        let completion = responder(provider)
            .respond(&history(), TimeOfDay::Evening, ConversationDuration::Short, &[])
            .await
            .unwrap();

        assert_eq!(
            completion.output,
            "add me on [FILTERED] and let's grab [FILTERED]"
        );
        assert!(completion.reasoning_steps.starts_with("We want to connect."));
        assert!(completion.reasoning_steps.contains(
            "\n\nMessage was filtered to remove: Contains social media references: Instagram, \
             Contains in-person meeting suggestions: coffee"
        ));
        assert!(completion
            .reasoning_steps
            .contains("\nSuggested alternatives: \n- Instead of referring to other platforms"));
        assert!(completion.reasoning_steps.contains("\n- Instead of suggesting meetings"));
    }

    #[tokio::test]
    async fn safe_output_is_untouched() {
        let provider = Arc::new(SequentialMockProvider::single_text(
            "We keep it light.\nYour Message: new set drops tonight",
        ));
        let completion = responder(provider)
            .respond(&history(), TimeOfDay::Evening, ConversationDuration::Short, &[])
            .await
            .unwrap();
        assert_eq!(completion.output, "new set drops tonight");
        assert_eq!(completion.reasoning_steps, "We keep it light.");
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let provider = Arc::new(SequentialMockProvider::failing(
            ProviderError::AuthenticationFailed("bad key".into()),
        ));
        let err = responder(provider)
            .respond(&history(), TimeOfDay::Evening, ConversationDuration::Short, &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Provider(ProviderError::AuthenticationFailed(_))
        ));
    }

    /// Collects formatted log output.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn reply_is_quiet_at_info_level() {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let provider = Arc::new(SequentialMockProvider::single_text(
            "Your Message: come over, add me on snapchat",
        ));
        responder(provider)
            .respond(&history(), TimeOfDay::Evening, ConversationDuration::Short, &[])
            .await
            .unwrap();
        tracing::info!("turn done");

        let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("turn done"));
        assert!(!logs.contains("Requesting reply"));
        assert!(!logs.contains("Reply filtered"));
    }
}
