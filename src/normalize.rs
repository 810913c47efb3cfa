//! Deterministic text cleanup
//!
//! AI-free normalization of speech-to-text output: casing, terminal
//! punctuation, and a fixed table of common transcription errors.

use once_cell::sync::Lazy;
use regex::Regex;

/// Ordered replacement table for common speech-to-text errors.
/// Each entry is applied independently, once, over the whole text.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("im", "I'm"),
    ("i", "I"),
    ("dont", "don't"),
    ("cant", "can't"),
    ("wont", "won't"),
    ("didnt", "didn't"),
    ("doesnt", "doesn't"),
    ("isnt", "isn't"),
    ("arent", "aren't"),
    ("wasnt", "wasn't"),
    ("werent", "weren't"),
    ("youre", "you're"),
    ("theyre", "they're"),
    ("hes", "he's"),
    ("shes", "she's"),
    ("its", "it's"), // context dependent
    ("weve", "we've"),
    ("ive", "I've"),
    ("teh", "the"),
    ("taht", "that"),
    ("wiht", "with"),
    ("tommorow", "tomorrow"),
    ("tommorrow", "tomorrow"),
];

static REPLACEMENT_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    REPLACEMENTS
        .iter()
        .map(|(old, new)| {
            let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(old)))
                .expect("Invalid replacement pattern");
            (pattern, *new)
        })
        .collect()
});

/// Basic cleanup without AI: trim, capitalize, terminal punctuation,
/// whole-word typo fixes. Total and deterministic; empty input stays empty.
pub fn normalize(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    // Capitalize the first character
    let mut chars = trimmed.chars();
    let first = chars.next().unwrap();
    let mut result: String = first.to_uppercase().chain(chars).collect();

    // Ensure terminal punctuation
    if !result.ends_with(['.', '!', '?']) {
        result.push('.');
    }

    // Fix common speech-to-text errors, one table entry at a time
    for (pattern, new) in REPLACEMENT_PATTERNS.iter() {
        result = pattern.replace_all(&result, *new).into_owned();
    }

    result
}
