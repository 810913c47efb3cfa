//! Pattern-based recipient hint extraction
//!
//! Deterministic fallback for the AI adapter: guesses who a dictated message
//! is for using handle literals, known aliases, and verb/role patterns.

use once_cell::sync::Lazy;
use regex::Regex;

/// "@username" literal anywhere in the text
static HANDLE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w+").expect("Invalid handle regex"));

/// "send/message/tell/text [to] <word>"
static VERB_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:send|message|tell|text)\s+(?:to\s+)?(\w+)").expect("Invalid verb regex")
});

/// "[my] boss/manager/lead"
static ROLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:my\s+)?(boss|manager|lead)").expect("Invalid role regex"));

/// Extract a recipient hint from raw text, or `None` when nothing matches.
///
/// Priority: handle literal, then known alias substring (returned exactly as
/// supplied, first in list order), then verb-prefix pattern, then role word.
/// Never fails; absence of a match is a normal outcome.
pub fn extract_hint(text: &str, known_aliases: &[String]) -> Option<String> {
    if let Some(m) = HANDLE_PATTERN.find(text) {
        return Some(m.as_str().to_string());
    }

    let text_lower = text.to_lowercase();

    for alias in known_aliases {
        if text_lower.contains(&alias.to_lowercase()) {
            return Some(alias.clone());
        }
    }

    if let Some(caps) = VERB_PATTERN.captures(&text_lower) {
        return Some(caps[1].to_string());
    }

    if let Some(caps) = ROLE_PATTERN.captures(&text_lower) {
        return Some(caps[1].to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_handle_literal_wins() {
        // Handle beats a known alias that also appears in the text
        let hint = extract_hint("message @priya_designs the mockups", &aliases(&["priya"]));
        assert_eq!(hint, Some("@priya_designs".to_string()));
    }

    #[test]
    fn test_known_alias_substring() {
        let hint = extract_hint(
            "send message to rahul saying hello",
            &aliases(&["rahul", "priya"]),
        );
        assert_eq!(hint, Some("rahul".to_string()));
    }

    #[test]
    fn test_alias_case_insensitive_returns_as_supplied() {
        let hint = extract_hint("tell Rahul the news", &aliases(&["rahul"]));
        assert_eq!(hint, Some("rahul".to_string()));

        let hint = extract_hint("tell rahul the news", &aliases(&["Rahul"]));
        assert_eq!(hint, Some("Rahul".to_string()));
    }

    #[test]
    fn test_alias_list_order_wins() {
        let hint = extract_hint("ping anna and bob please", &aliases(&["bob", "anna"]));
        assert_eq!(hint, Some("bob".to_string()));
    }

    #[test]
    fn test_verb_pattern() {
        let hint = extract_hint("tell steve the build is green", &aliases(&[]));
        assert_eq!(hint, Some("steve".to_string()));

        let hint = extract_hint("text to maria running late", &aliases(&[]));
        assert_eq!(hint, Some("maria".to_string()));
    }

    #[test]
    fn test_role_pattern() {
        let hint = extract_hint("my boss needs the report", &aliases(&[]));
        assert_eq!(hint, Some("boss".to_string()));

        let hint = extract_hint("ask the manager about it", &aliases(&[]));
        assert_eq!(hint, Some("manager".to_string()));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(extract_hint("the weather is nice today", &aliases(&[])), None);
        assert_eq!(extract_hint("", &aliases(&["rahul"])), None);
    }
}
