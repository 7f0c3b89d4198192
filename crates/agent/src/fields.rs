//! Labeled-field prompts.
//!
//! Prompts describe their inputs and outputs as `Label: description` lines
//! and the model is asked to answer in the same shape. This module renders
//! that format block and reads labeled values back out of a completion.

/// One labeled field in a prompt.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub label: &'static str,
    pub description: &'static str,
}

impl Field {
    pub const fn new(label: &'static str, description: &'static str) -> Self {
        Self { label, description }
    }

    /// `Label: value`
    pub fn line(&self, value: &str) -> String {
        format!("{}: {}", self.label, value)
    }
}

/// Separator between prompt sections and between demos.
pub const SECTION_BREAK: &str = "\n\n---\n\n";

/// Render the "Follow the following format." block.
pub fn format_block(fields: &[Field]) -> String {
    let mut out = String::from("Follow the following format.\n\n");
    let lines: Vec<String> = fields.iter().map(|f| f.line(f.description)).collect();
    out.push_str(&lines.join("\n"));
    out
}

/// Byte offsets of `Label:` in `text` as (marker start, value start).
///
/// A marker at the start of a line wins over one mid-line.
pub fn find_label(text: &str, label: &str) -> Option<(usize, usize)> {
    let marker = format!("{label}:");
    let mut fallback = None;

    for (idx, _) in text.match_indices(&marker) {
        let at_line_start = idx == 0 || text[..idx].ends_with('\n');
        if at_line_start {
            return Some((idx, idx + marker.len()));
        }
        if fallback.is_none() {
            fallback = Some((idx, idx + marker.len()));
        }
    }

    fallback
}

/// Extract the value of each label, in the order given.
///
/// A value runs from its marker to the next label found after it (or the end
/// of the text) and is trimmed. Missing labels yield `None`.
pub fn extract(text: &str, labels: &[&str]) -> Vec<Option<String>> {
    let found: Vec<Option<(usize, usize)>> = labels.iter().map(|l| find_label(text, l)).collect();

    found
        .iter()
        .map(|pos| {
            let (_, value_start) = (*pos)?;
            let value_end = found
                .iter()
                .flatten()
                .map(|(marker_start, _)| *marker_start)
                .filter(|start| *start >= value_start)
                .min()
                .unwrap_or(text.len());
            Some(text[value_start..value_end].trim().to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_block_lists_fields() {
        let block = format_block(&[
            Field::new("Context", "recent chat messages"),
            Field::new("Summary", "a concise summary"),
        ]);
        assert_eq!(
            block,
            "Follow the following format.\n\nContext: recent chat messages\nSummary: a concise summary"
        );
    }

    #[test]
    fn extract_in_any_order() {
        let text = "Summary: they talked about pets\nKey Topics: dogs, cats";
        let values = extract(text, &["Key Topics", "Summary"]);
        assert_eq!(values[0].as_deref(), Some("dogs, cats"));
        assert_eq!(values[1].as_deref(), Some("they talked about pets"));
    }

    #[test]
    fn missing_label_is_none() {
        let values = extract("Summary: only this", &["Summary", "Key Topics"]);
        assert_eq!(values[0].as_deref(), Some("only this"));
        assert!(values[1].is_none());
    }

    #[test]
    fn multiline_values_are_kept() {
        let text = "Summary: line one\nline two\n\nKey Topics: a";
        let values = extract(text, &["Summary", "Key Topics"]);
        assert_eq!(values[0].as_deref(), Some("line one\nline two"));
    }

    #[test]
    fn line_start_marker_preferred() {
        let text = "I'll write Your Message: soon\nYour Message: hi there";
        let (start, _) = find_label(text, "Your Message").unwrap();
        assert_eq!(&text[start..], "Your Message: hi there");
    }

    #[test]
    fn mid_line_marker_used_as_fallback() {
        let text = "need to be warm. Your Message: hey you";
        let values = extract(text, &["Your Message"]);
        assert_eq!(values[0].as_deref(), Some("hey you"));
    }
}
