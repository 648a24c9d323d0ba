use once_cell::sync::Lazy;
use regex::Regex;

use crate::signals::model::MessageSignals;
use crate::util::text;

pub(crate) static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)https?://\S+").expect("static regex"));

/// Pictographic blocks counted as emoji: Misc Symbols and Pictographs
/// through Symbols and Pictographs Extended-A, plus Misc Symbols/Dingbats.
fn is_emoji(c: char) -> bool {
    matches!(c as u32, 0x1F300..=0x1FAFF | 0x2600..=0x27BF)
}

/// Measures a message in a single pass over its characters.
///
/// Pure mapping from text to `MessageSignals`; no thresholds are applied.
pub fn extract_signals(message: &str) -> MessageSignals {
    let mut signals = MessageSignals {
        length: text::char_len(message),
        word_count: text::word_count(message),
        link_count: LINK.find_iter(message).count(),
        ..Default::default()
    };

    let mut run_char: Option<char> = None;
    let mut run_len = 0usize;

    for c in message.chars() {
        if is_emoji(c) {
            signals.emoji_count += 1;
        }
        if c.is_ascii_alphabetic() {
            signals.letter_count += 1;
            if c.is_ascii_uppercase() {
                signals.uppercase_count += 1;
            }
        }

        if c == '!' || c == '?' {
            if run_char == Some(c) {
                run_len += 1;
            } else {
                run_char = Some(c);
                run_len = 1;
            }
            signals.longest_punctuation_run = signals.longest_punctuation_run.max(run_len);
        } else {
            run_char = None;
            run_len = 0;
        }
    }

    signals
}

/// Returns every `http(s)://` link in message order.
pub fn links(message: &str) -> impl Iterator<Item = &str> {
    LINK.find_iter(message).map(|m| m.as_str())
}
