//! Message assembly - addressing-prefix removal
//!
//! Dictated text often opens with addressing language ("send to Rahul:",
//! "hey Bob,") that names the recipient instead of being part of the body.
//! Each pattern here is an independent matcher, applied at most once, in a
//! fixed order.

use crate::directory::ResolvedTarget;
use once_cell::sync::Lazy;
use regex::Regex;

/// "send/message/tell/text [to] @handle [that|saying|:]" at the start
static HANDLE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:send|message|tell|text)\s+(?:to\s+)?@\w+\s*(?:that|saying|:)?\s*")
        .expect("Invalid handle prefix regex")
});

/// "hey/hi/hello <word>," at the start
static GREETING_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:hey|hi|hello)\s+\w+\s*,?\s*").expect("Invalid greeting prefix regex")
});

/// A message ready for the delivery collaborator
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub body: String,
    pub target: ResolvedTarget,
}

/// Remove addressing prefixes naming the resolved recipient, a raw handle,
/// or a bare greeting. Case-insensitive, anchored to the start, one shot per
/// pattern. Returns the trimmed remainder.
pub fn strip_addressing(text: &str, recipient_name: &str) -> String {
    let mut result = text.to_string();

    // With an empty name the recipient pattern degenerates into stripping
    // the bare verb, so it only runs when a name is known.
    if !recipient_name.trim().is_empty() {
        let pattern = Regex::new(&format!(
            r"(?i)^(?:send|message|tell|text)\s+(?:to\s+)?{}\s*(?:that|saying|:)?\s*",
            regex::escape(recipient_name)
        ))
        .expect("Invalid recipient prefix regex");
        result = pattern.replacen(&result, 1, "").into_owned();
    }

    result = HANDLE_PREFIX.replacen(&result, 1, "").into_owned();
    result = GREETING_PREFIX.replacen(&result, 1, "").into_owned();

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_recipient_prefix() {
        assert_eq!(
            strip_addressing("Send to Rahul: see you tomorrow.", "Rahul"),
            "see you tomorrow."
        );
        assert_eq!(
            strip_addressing("tell rahul that lunch is at noon.", "Rahul"),
            "lunch is at noon."
        );
        assert_eq!(
            strip_addressing("Text Priya saying the mockups look great.", "Priya"),
            "the mockups look great."
        );
    }

    #[test]
    fn test_strip_handle_prefix() {
        assert_eq!(
            strip_addressing("Message @priya_designs the mockups look great.", ""),
            "the mockups look great."
        );
    }

    #[test]
    fn test_strip_greeting() {
        assert_eq!(
            strip_addressing("Hey Bob, lunch at noon?", "Bob"),
            "lunch at noon?"
        );
    }

    #[test]
    fn test_patterns_chain_in_order() {
        // Recipient prefix then greeting, each stripped once
        assert_eq!(
            strip_addressing("Tell Rahul hey Rahul, the build is green.", "Rahul"),
            "the build is green."
        );
    }

    #[test]
    fn test_each_pattern_applies_at_most_once() {
        assert_eq!(
            strip_addressing("tell rahul tell rahul hi", "Rahul"),
            "tell rahul hi"
        );
    }

    #[test]
    fn test_empty_recipient_skips_recipient_pattern() {
        assert_eq!(
            strip_addressing("Send the report to finance.", ""),
            "Send the report to finance."
        );
    }

    #[test]
    fn test_no_prefix_is_untouched() {
        assert_eq!(
            strip_addressing("The meeting went well.", "Rahul"),
            "The meeting went well."
        );
    }

    #[test]
    fn test_recipient_name_is_escaped() {
        // Regex metacharacters in a name must not break matching
        assert_eq!(strip_addressing("tell a.b hello there", "a.b"), "hello there");
        assert_eq!(strip_addressing("tell axb hello there", "a.b"), "tell axb hello there");
    }
}
