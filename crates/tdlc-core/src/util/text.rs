//! Text helpers shared by the matcher and the rewriter.
//!
//! All lengths are counted in Unicode scalar values, which is what a
//! carrier's 160-character budget refers to for GSM-7 text.

use regex::Regex;

/// Regex crate's notion of a word character, close enough for boundaries.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Builds a case-insensitive, whole-word pattern for a literal phrase.
///
/// `\b` is only emitted on an edge whose character is itself a word
/// character; a phrase such as `"100%"` would otherwise never match at the
/// end of a sentence.
pub fn word_pattern(phrase: &str) -> String {
    let lead = match phrase.chars().next() {
        Some(c) if is_word_char(c) => r"\b",
        _ => "",
    };
    let tail = match phrase.chars().last() {
        Some(c) if is_word_char(c) => r"\b",
        _ => "",
    };
    format!("(?i){lead}{}{tail}", regex::escape(phrase))
}

pub fn word_regex(phrase: &str) -> Result<Regex, regex::Error> {
    Regex::new(&word_pattern(phrase))
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Truncates `text` so that the result, ellipsis included, fits in `budget`
/// characters.
///
/// The cut lands on the last whitespace at or before the budget; a word is
/// never split unless the kept prefix contains no whitespace at all, in
/// which case the prefix is hard-cut.
pub fn truncate_words(text: &str, budget: usize, ellipsis: &str) -> String {
    if char_len(text) <= budget {
        return text.to_string();
    }

    let keep = budget.saturating_sub(char_len(ellipsis));
    let cut: String = text.chars().take(keep).collect();

    // The kept prefix already ends on a word when the next char is a space.
    let boundary_follows = text.chars().nth(keep).is_some_and(char::is_whitespace);

    let body = if boundary_follows {
        cut.as_str()
    } else {
        match cut.rfind(char::is_whitespace) {
            Some(idx) if idx > 0 => &cut[..idx],
            _ => cut.as_str(),
        }
    };

    format!("{}{}", body.trim_end(), ellipsis)
}
