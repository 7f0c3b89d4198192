//! Content filter: keeps generated replies on-platform.
//!
//! Two term sets are matched case-insensitively on whole-word boundaries:
//! - names of other social platforms (moving the fan off-platform)
//! - phrases suggesting an in-person meeting
//!
//! Matching is a single regex pass per set. Filtering replaces each match
//! with a placeholder; the result is not re-checked, so a placeholder that
//! either set would match is rejected when the filter is built.

use parlor_config::FilterConfig;
use regex_lite::{NoExpand, Regex};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Social platforms other than the creator's own.
const SOCIAL_MEDIA_TERMS: &[&str] = &[
    "facebook", "fb", "instagram", "ig", "insta", "twitter", "tweet", "x.com", "tiktok",
    "snapchat", "snap", "reddit", "telegram", "whatsapp", "discord", "linkedin", "pinterest",
    "youtube", "tumblr",
];

/// Phrases that suggest meeting in person.
const MEETING_TERMS: &[&str] = &[
    "meet up",
    "meetup",
    "meet in person",
    "get together",
    "coffee",
    "dinner",
    "lunch",
    "drinks",
    "hang out",
    "hangout",
    "see you in",
    "meet you at",
    "come over",
    "my place",
    "your place",
    "address",
    "location",
    "where are you located",
    "what city",
];

/// Category of a filter hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    SocialMedia,
    Meeting,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SocialMedia => "social media",
            Self::Meeting => "in-person meeting",
        })
    }
}

/// One category of disallowed content found in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Distinct matched terms, as written, in order of first appearance.
    pub terms: Vec<String>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            ViolationKind::SocialMedia => "Contains social media references",
            ViolationKind::Meeting => "Contains in-person meeting suggestions",
        };
        write!(f, "{label}: {}", self.terms.join(", "))
    }
}

/// Outcome of checking a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub violations: Vec<Violation>,
}

impl FilterReport {
    pub fn is_safe(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable description per violation.
    pub fn descriptions(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid filter term: {0}")]
    Pattern(#[from] regex_lite::Error),

    #[error("Placeholder '{placeholder}' matches the {kind} terms")]
    PlaceholderMatchesTerm {
        placeholder: String,
        kind: ViolationKind,
    },
}

/// Regex-based detector and redactor for disallowed terms.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    social_pattern: Regex,
    meeting_pattern: Regex,
    placeholder: String,
    platform: String,
}

impl ContentFilter {
    /// Build a filter from the built-in term sets plus configured extras.
    ///
    /// Fails when the placeholder itself contains a term, since filtered
    /// text would then be flagged again and grow on every pass.
    pub fn new(config: &FilterConfig, platform: &str) -> Result<Self, FilterError> {
        let social = merge_terms(SOCIAL_MEDIA_TERMS, &config.extra_social_terms);
        let meeting = merge_terms(MEETING_TERMS, &config.extra_meeting_terms);

        let filter = Self {
            social_pattern: word_pattern(&social)?,
            meeting_pattern: word_pattern(&meeting)?,
            placeholder: config.placeholder.clone(),
            platform: platform.to_string(),
        };

        for (pattern, kind) in [
            (&filter.social_pattern, ViolationKind::SocialMedia),
            (&filter.meeting_pattern, ViolationKind::Meeting),
        ] {
            if pattern.is_match(&filter.placeholder) {
                return Err(FilterError::PlaceholderMatchesTerm {
                    placeholder: filter.placeholder.clone(),
                    kind,
                });
            }
        }

        Ok(filter)
    }

    /// The built-in term sets with the default placeholder.
    pub fn builtin() -> Result<Self, FilterError> {
        Self::new(&FilterConfig::default(), "OnlyFans")
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Check a message for disallowed content.
    pub fn check_message(&self, message: &str) -> FilterReport {
        let mut violations = Vec::new();

        let social = distinct_matches(&self.social_pattern, message);
        if !social.is_empty() {
            violations.push(Violation {
                kind: ViolationKind::SocialMedia,
                terms: social,
            });
        }

        let meeting = distinct_matches(&self.meeting_pattern, message);
        if !meeting.is_empty() {
            violations.push(Violation {
                kind: ViolationKind::Meeting,
                terms: meeting,
            });
        }

        if !violations.is_empty() {
            debug!(count = violations.len(), "Content filter flagged message");
        }

        FilterReport { violations }
    }

    /// Replace every disallowed term with the placeholder.
    pub fn filter_message(&self, message: &str) -> String {
        let message = self
            .social_pattern
            .replace_all(message, NoExpand(&self.placeholder));
        self.meeting_pattern
            .replace_all(&message, NoExpand(&self.placeholder))
            .into_owned()
    }

    /// Suggest on-platform rewrites for each category present in the message.
    pub fn suggest_alternatives(&self, message: &str) -> Vec<String> {
        let mut suggestions = Vec::new();

        if self.social_pattern.is_match(message) {
            suggestions.push(format!(
                "Instead of referring to other platforms, try focusing on {p} features: \
                 'Check out my latest content here' or 'Send me a message on {p}'",
                p = self.platform
            ));
        }

        if self.meeting_pattern.is_match(message) {
            suggestions.push(
                "Instead of suggesting meetings, try: \
                 'Let's chat more here' or 'I love connecting with you through my content'"
                    .to_string(),
            );
        }

        suggestions
    }
}

fn merge_terms(builtin: &[&str], extra: &[String]) -> Vec<String> {
    let mut terms: Vec<String> = builtin.iter().map(|t| t.to_string()).collect();
    for term in extra {
        let term = term.trim().to_lowercase();
        if !term.is_empty() && !terms.contains(&term) {
            terms.push(term);
        }
    }
    // Longest first so a phrase wins over its own prefix.
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    terms
}

fn word_pattern(terms: &[String]) -> Result<Regex, regex_lite::Error> {
    let alternation = terms
        .iter()
        .map(|t| regex_lite::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))
}

fn distinct_matches(pattern: &Regex, message: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in pattern.find_iter(message) {
        let term = m.as_str().to_string();
        if !found.contains(&term) {
            found.push(term);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> ContentFilter {
        ContentFilter::builtin().unwrap()
    }

    #[test]
    fn clean_message_is_safe() {
        let report = filter().check_message("Thanks for subscribing, you made my day!");
        assert!(report.is_safe());
        assert!(report.descriptions().is_empty());
    }

    #[test]
    fn flags_social_platform_case_insensitively() {
        let report = filter().check_message("Add me on SnapChat babe");
        assert!(!report.is_safe());
        assert_eq!(report.violations[0].kind, ViolationKind::SocialMedia);
        assert_eq!(report.violations[0].terms, vec!["SnapChat".to_string()]);
        assert_eq!(
            report.descriptions()[0],
            "Contains social media references: SnapChat"
        );
    }

    #[test]
    fn flags_meeting_phrases() {
        let report = filter().check_message("We should grab coffee and hang out sometime");
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::Meeting);
        assert_eq!(report.violations[0].terms, vec!["coffee", "hang out"]);
    }

    #[test]
    fn reports_both_categories_in_order() {
        let report = filter().check_message("dm me on instagram and come over later");
        let descriptions = report.descriptions();
        assert_eq!(descriptions.len(), 2);
        assert!(descriptions[0].starts_with("Contains social media references"));
        assert!(descriptions[1].starts_with("Contains in-person meeting suggestions"));
    }

    #[test]
    fn respects_word_boundaries() {
        // "ig" inside "big", "snap" inside "snapped", "lunch" inside "lunchbox"
        let report = filter().check_message("That big surprise snapped my lunchbox");
        assert!(report.is_safe());
    }

    #[test]
    fn repeated_terms_reported_once() {
        let report = filter().check_message("fb fb FB");
        assert_eq!(report.violations[0].terms, vec!["fb", "FB"]);
    }

    #[test]
    fn dotted_term_matches_literally() {
        assert!(!filter().check_message("find me on x.com").is_safe());
        assert!(filter().check_message("find me on xacom").is_safe());
    }

    #[test]
    fn filter_replaces_every_occurrence() {
        let filtered = filter().filter_message("Telegram or WhatsApp? Or dinner at my place?");
        assert_eq!(
            filtered,
            "[FILTERED] or [FILTERED]? Or [FILTERED] at [FILTERED]?"
        );
    }

    #[test]
    fn filtering_is_idempotent() {
        let f = filter();
        let once = f.filter_message("Snap me, then meet up for drinks at your place, ok? TikTok!");
        assert!(f.check_message(&once).is_safe());
        assert_eq!(f.filter_message(&once), once);
    }

    #[test]
    fn longer_phrase_wins_over_prefix() {
        let filtered = filter().filter_message("let's meet in person");
        assert_eq!(filtered, "let's [FILTERED]");
    }

    #[test]
    fn extra_terms_and_placeholder_from_config() {
        let config = FilterConfig {
            placeholder: "***".into(),
            extra_social_terms: vec!["  Kik ".into()],
            extra_meeting_terms: vec![],
        };
        let f = ContentFilter::new(&config, "Fansly").unwrap();
        assert_eq!(f.filter_message("kik me"), "*** me");
        assert_eq!(f.placeholder(), "***");
    }

    #[test]
    fn placeholder_with_dollar_is_literal() {
        let config = FilterConfig {
            placeholder: "$1".into(),
            ..FilterConfig::default()
        };
        let f = ContentFilter::new(&config, "OnlyFans").unwrap();
        assert_eq!(f.filter_message("reddit"), "$1");
    }

    #[test]
    fn suggestions_per_category() {
        let f = ContentFilter::new(&FilterConfig::default(), "Fansly").unwrap();
        let suggestions = f.suggest_alternatives("youtube then lunch");
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions[0].contains("Fansly"));
        assert!(suggestions[1].starts_with("Instead of suggesting meetings"));
        assert!(f.suggest_alternatives("hello").is_empty());
    }

    #[test]
    fn placeholder_containing_a_term_is_rejected() {
        let config = FilterConfig {
            placeholder: "[address removed]".into(),
            ..FilterConfig::default()
        };
        let err = ContentFilter::new(&config, "OnlyFans").unwrap_err();
        assert!(matches!(
            err,
            FilterError::PlaceholderMatchesTerm {
                kind: ViolationKind::Meeting,
                ..
            }
        ));
        assert!(err.to_string().contains("[address removed]"));
    }

    #[test]
    fn extra_term_matching_placeholder_is_rejected() {
        let config = FilterConfig {
            extra_social_terms: vec!["filtered".into()],
            ..FilterConfig::default()
        };
        let err = ContentFilter::new(&config, "OnlyFans").unwrap_err();
        assert!(matches!(
            err,
            FilterError::PlaceholderMatchesTerm {
                kind: ViolationKind::SocialMedia,
                ..
            }
        ));
    }

    #[test]
    fn accepted_config_filters_idempotently() {
        let config = FilterConfig {
            placeholder: "[removed]".into(),
            extra_social_terms: vec!["onlychat".into()],
            extra_meeting_terms: vec!["my address".into()],
        };
        let f = ContentFilter::new(&config, "OnlyFans").unwrap();
        let once = f.filter_message("dm me on onlychat, here's my address and location");
        assert_eq!(once, "dm me on [removed], here's [removed] and [removed]");
        assert!(f.check_message(&once).is_safe());
        assert_eq!(f.filter_message(&once), once);
    }
}
