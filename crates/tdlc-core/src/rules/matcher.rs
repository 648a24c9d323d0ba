//! Decides whether a single rule fires on a message.
//!
//! The matcher is a pure function of `(rule, message, signals, channel)`.
//! It never looks at other rules and never assigns scores.

use crate::rules::catalog::{Channel, Check, Rule, RuleKind};
use crate::signals::model::MessageSignals;
use crate::util::deterministic::dedup_stable_by_key;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub fired: bool,
    /// Keyword rules: matching phrases in declared order.
    /// Pattern rules: distinct matched substrings in message order.
    pub matched_terms: Vec<String>,
    /// Quantity a structural check measured (length, count, percent).
    pub measure: Option<usize>,
}

impl MatchResult {
    fn miss() -> Self {
        Self::default()
    }

    fn from_terms(terms: Vec<String>) -> Self {
        Self {
            fired: !terms.is_empty(),
            matched_terms: terms,
            measure: None,
        }
    }

    fn structural(fired: bool, measure: Option<usize>) -> Self {
        Self {
            fired,
            matched_terms: vec![],
            measure,
        }
    }
}

pub fn matches(
    rule: &Rule,
    message: &str,
    signals: &MessageSignals,
    channel: Channel,
) -> MatchResult {
    if !rule.scope.applies_to(channel) {
        return MatchResult::miss();
    }

    match &rule.kind {
        RuleKind::Keyword(keywords) => MatchResult::from_terms(
            keywords
                .iter()
                .filter(|k| k.is_match(message))
                .map(|k| k.phrase.clone())
                .collect(),
        ),
        RuleKind::Pattern(regex) => {
            let found: Vec<String> = regex
                .find_iter(message)
                .map(|m| m.as_str().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            MatchResult::from_terms(dedup_stable_by_key(found, |t| t.clone()))
        }
        RuleKind::Structural(check) => structural(check, message, signals),
    }
}

fn structural(check: &Check, message: &str, signals: &MessageSignals) -> MatchResult {
    match check {
        Check::MaxLength { limit, up_to } => {
            let within = up_to.is_none_or(|upper| signals.length <= upper);
            MatchResult::structural(signals.length > *limit && within, Some(signals.length))
        }
        Check::Missing(keyword) => MatchResult::structural(!keyword.is_match(message), None),
        Check::MaxLinks(max) => {
            MatchResult::structural(signals.link_count > *max, Some(signals.link_count))
        }
        Check::Emoji(threshold) => {
            MatchResult::structural(signals.emoji_count >= *threshold, Some(signals.emoji_count))
        }
        Check::RepeatedPunctuation(run) => MatchResult::structural(
            signals.longest_punctuation_run >= *run,
            Some(signals.longest_punctuation_run),
        ),
        Check::AllCaps { min_letters, ratio } => {
            let observed = signals.uppercase_ratio();
            MatchResult::structural(
                signals.letter_count >= *min_letters && observed >= *ratio,
                Some((observed * 100.0).round() as usize),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::catalog::RuleSet;
    use crate::signals::extract::extract_signals;
    use serde_json::json;

    fn run(rules: &RuleSet, key: &str, message: &str) -> MatchResult {
        matches(
            rules.get(key).unwrap(),
            message,
            &extract_signals(message),
            Channel::Sms,
        )
    }

    fn builtin() -> RuleSet {
        RuleSet::builtin().unwrap()
    }

    #[test]
    fn keyword_terms_follow_declared_order() {
        let rules = builtin();
        // Declared order: "payday loan" before "bitcoin".
        let r = run(&rules, "highRiskFinancial", "Bitcoin or a PAYDAY LOAN?");
        assert!(r.fired);
        assert_eq!(r.matched_terms, vec!["payday loan", "bitcoin"]);
    }

    #[test]
    fn keyword_requires_whole_words() {
        let rules = builtin();
        assert!(!run(&rules, "personalInfo", "reset password123 today").fired);
        assert!(run(&rules, "personalInfo", "reset your password today").fired);
        // "gun" inside "begun" is not a match.
        assert!(!run(&rules, "shaft", "we have begun").fired);
    }

    #[test]
    fn pattern_collects_distinct_matches() {
        let rules = builtin();
        let r = run(&rules, "urlSecurity", "bit.ly/a then BIT.LY/b then bit.ly/c");
        assert!(r.fired);
        assert_eq!(r.matched_terms, vec!["bit.ly", "BIT.LY"]);
    }

    #[test]
    fn pattern_fires_without_scheme() {
        let rules = builtin();
        assert!(run(&rules, "urlSecurity", "go to bit.ly/xyz").fired);
        assert!(!run(&rules, "urlSecurity", "go to comfort.com").fired);
    }

    #[test]
    fn empty_message_fires_only_absence_checks() {
        let rules = builtin();
        assert!(run(&rules, "missingStop", "").fired);
        assert!(run(&rules, "missingHelp", "").fired);
        assert!(!run(&rules, "characterLimit", "").fired);
        assert!(!run(&rules, "scams", "").fired);
        assert!(!run(&rules, "urlSecurity", "").fired);
    }

    #[test]
    fn absence_check_is_whole_word_and_case_insensitive() {
        let rules = builtin();
        assert!(!run(&rules, "missingStop", "reply stop to end").fired);
        assert!(run(&rules, "missingStop", "nonstop savings").fired);
        assert!(run(&rules, "missingStop", "STOPPED").fired);
    }

    #[test]
    fn length_check_is_an_upper_bound() {
        let rules = builtin();
        let at_limit = "a".repeat(160);
        let over = "a".repeat(161);
        assert!(!run(&rules, "characterLimit", &at_limit).fired);
        let r = run(&rules, "characterLimit", &over);
        assert!(r.fired);
        assert_eq!(r.measure, Some(161));
    }

    #[test]
    fn length_bands_do_not_overlap() {
        let rules = builtin();
        let long = "a".repeat(918);
        assert!(run(&rules, "characterLimit", &long).fired);
        assert!(!run(&rules, "veryLongSms", &long).fired);

        let very_long = "a".repeat(919);
        assert!(!run(&rules, "characterLimit", &very_long).fired);
        let r = run(&rules, "veryLongSms", &very_long);
        assert!(r.fired);
        assert_eq!(r.measure, Some(919));
    }

    #[test]
    fn scope_excludes_other_channels() {
        let rules = builtin();
        let over = "a".repeat(200);
        let rule = rules.get("characterLimit").unwrap();
        let signals = extract_signals(&over);
        assert!(matches(rule, &over, &signals, Channel::Sms).fired);
        assert!(!matches(rule, &over, &signals, Channel::Mms).fired);
    }

    #[test]
    fn style_checks_measure_their_signal() {
        let rules = RuleSet::from_json(
            &json!({
                "version": "t",
                "evaluationOrder": ["links", "emoji", "punct", "caps"],
                "rules": {
                    "links": { "check": { "type": "maxLinks", "max": 1 }, "severity": "low", "message": "m" },
                    "emoji": { "check": { "type": "emoji", "threshold": 3 }, "severity": "low", "message": "m" },
                    "punct": { "check": { "type": "repeatedPunctuation", "run": 3 }, "severity": "low", "message": "m" },
                    "caps": { "check": { "type": "allCaps", "minLetters": 12, "ratio": 0.7 }, "severity": "low", "message": "m" }
                }
            })
            .to_string(),
        )
        .unwrap();

        let r = run(&rules, "links", "https://a.com https://b.com");
        assert!(r.fired);
        assert_eq!(r.measure, Some(2));
        assert!(!run(&rules, "links", "https://a.com").fired);

        assert!(run(&rules, "emoji", "🎉🎉🎉").fired);
        assert!(!run(&rules, "emoji", "🎉🎉").fired);

        assert!(run(&rules, "punct", "Wow!!!").fired);
        assert!(!run(&rules, "punct", "Wow!!").fired);

        let r = run(&rules, "caps", "BIG SALE TODAY ONLY");
        assert!(r.fired);
        assert_eq!(r.measure, Some(100));
        // Too few letters to judge.
        assert!(!run(&rules, "caps", "OK THANKS").fired);
    }
}
