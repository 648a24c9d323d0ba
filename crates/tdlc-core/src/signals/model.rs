/// Structural measurements of a single message.
///
/// Extracted once per evaluation and consulted by structural rules.
/// Carries no policy: thresholds live on the rules, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageSignals {
    /// Length in characters.
    pub length: usize,
    pub word_count: usize,
    /// Count of `http://` / `https://` links.
    pub link_count: usize,
    pub emoji_count: usize,
    /// ASCII letters only; used for the all-caps ratio.
    pub letter_count: usize,
    pub uppercase_count: usize,
    /// Longest run of a repeated `!` or `?`.
    pub longest_punctuation_run: usize,
}

impl MessageSignals {
    /// Share of ASCII letters that are uppercase, `0.0` without letters.
    pub fn uppercase_ratio(&self) -> f64 {
        if self.letter_count == 0 {
            return 0.0;
        }
        self.uppercase_count as f64 / self.letter_count as f64
    }
}
