//! Ordered evaluation pass over a ruleset.

use tracing::debug;

use crate::error::CheckError;
use crate::report::model::ComplianceReport;
use crate::rules::catalog::{Category, Channel, Rule, RuleKind, RuleSet, Severity, SeverityTier};
use crate::rules::classify::classify;
use crate::rules::matcher::{MatchResult, matches};
use crate::signals::extract::extract_signals;
use crate::util::deterministic::dedup_triggered;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggeredRule {
    pub rule_key: String,
    pub severity: Severity,
    pub tier: SeverityTier,
    /// Rendered message template.
    pub message: String,
    pub suggestion: String,
    pub matched_terms: Vec<String>,
    pub category: Option<Category>,
}

/// Evaluates `message` against `rules` for the default channel (SMS).
pub fn evaluate(message: &str, rules: &RuleSet) -> Result<ComplianceReport, CheckError> {
    evaluate_for(message, rules, Channel::default())
}

/// Evaluates `message` against `rules` for a given channel.
///
/// Determinism guarantees:
/// - Issues follow the ruleset's evaluation order
/// - Identical rendered messages are reported once, first occurrence wins
/// - The score is summed over the reported issues only
pub fn evaluate_for(
    message: &str,
    rules: &RuleSet,
    channel: Channel,
) -> Result<ComplianceReport, CheckError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(CheckError::EmptyMessage);
    }

    let signals = extract_signals(message);

    let mut triggered = Vec::new();
    for rule in rules.rules_in_order().filter(|r| r.enabled) {
        let result = matches(rule, message, &signals, channel);
        if !result.fired {
            continue;
        }
        debug!(
            rule = %rule.key,
            severity = rule.severity.as_str(),
            terms = result.matched_terms.len(),
            "rule fired"
        );
        triggered.push(trigger(rule, result));
    }

    let triggered = dedup_triggered(triggered);
    let classification = classify(&triggered);

    Ok(ComplianceReport::new(triggered, classification, &signals))
}

fn trigger(rule: &Rule, result: MatchResult) -> TriggeredRule {
    TriggeredRule {
        rule_key: rule.key.clone(),
        severity: rule.severity,
        tier: rule.tier,
        message: render_message(rule, &result),
        suggestion: rule.suggestion.clone(),
        matched_terms: result.matched_terms,
        category: rule.category.clone(),
    }
}

/// Fills the `{matches}`, `{length}` and `{count}` placeholders.
///
/// Keyword rules without a `{matches}` placeholder get the quoted terms
/// appended, so the issue always names what was found.
pub fn render_message(rule: &Rule, result: &MatchResult) -> String {
    let quoted = result
        .matched_terms
        .iter()
        .map(|t| format!("\"{t}\""))
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = rule.message.clone();
    if out.contains("{matches}") {
        out = out.replace("{matches}", &quoted);
    } else if matches!(rule.kind, RuleKind::Keyword(_)) && !quoted.is_empty() {
        out.push_str(": ");
        out.push_str(&quoted);
    }

    if let Some(measure) = result.measure {
        let measure = measure.to_string();
        out = out.replace("{length}", &measure).replace("{count}", &measure);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::model::Status;
    use serde_json::json;

    fn keys(report: &ComplianceReport) -> Vec<&str> {
        report.issues.iter().map(|i| i.rule_key.as_str()).collect()
    }

    fn custom(rules: serde_json::Value) -> RuleSet {
        RuleSet::from_json(&rules.to_string()).unwrap()
    }

    #[test]
    fn empty_message_is_rejected() {
        let rules = RuleSet::builtin().unwrap();
        assert_eq!(evaluate("", &rules), Err(CheckError::EmptyMessage));
        assert_eq!(evaluate("  \n\t ", &rules), Err(CheckError::EmptyMessage));
    }

    #[test]
    fn clean_message_passes() {
        let rules = RuleSet::builtin().unwrap();
        let report = evaluate(
            "Hi Sam, your table for 2 is ready. Reply STOP to opt out. HELP for help.",
            &rules,
        )
        .unwrap();
        assert_eq!(report.status, Status::Pass);
        assert!(report.issues.is_empty());
        assert_eq!(report.score, 0);
        assert_eq!(report.exit_code, 0);
    }

    #[test]
    fn message_is_trimmed_before_measuring() {
        let rules = RuleSet::builtin().unwrap();
        let report = evaluate("   Reply STOP or HELP   ", &rules).unwrap();
        assert_eq!(report.message_length, 18);
        assert_eq!(report.word_count, 4);
    }

    #[test]
    fn keyword_message_names_matched_terms() {
        let rules = custom(json!({
            "version": "t",
            "evaluationOrder": ["a", "b"],
            "rules": {
                "a": { "keywords": ["foo", "bar"], "severity": "low", "message": "Found {matches} here" },
                "b": { "keywords": ["baz"], "severity": "low", "message": "Flagged" }
            }
        }));
        let report = evaluate("bar and foo and baz", &rules).unwrap();
        assert_eq!(report.issues[0].message, "Found \"foo\", \"bar\" here");
        assert_eq!(report.issues[1].message, "Flagged: \"baz\"");
    }

    #[test]
    fn structural_message_interpolates_measure() {
        let rules = RuleSet::builtin().unwrap();
        let message = format!("{} STOP HELP", "a".repeat(170));
        let report = evaluate(&message, &rules).unwrap();
        let issue = report
            .issues
            .iter()
            .find(|i| i.rule_key == "characterLimit")
            .unwrap();
        assert!(issue.message.contains("180"), "{}", issue.message);
    }

    #[test]
    fn disabled_rules_never_fire() {
        let rules = custom(json!({
            "version": "t",
            "evaluationOrder": ["on", "off"],
            "rules": {
                "on": { "keywords": ["alpha"], "severity": "low", "message": "on" },
                "off": { "keywords": ["alpha"], "severity": "high", "message": "off", "enabled": false }
            }
        }));
        let report = evaluate("alpha", &rules).unwrap();
        assert_eq!(keys(&report), vec!["on"]);
        assert_eq!(report.status, Status::Warn);
    }

    #[test]
    fn duplicate_messages_are_reported_and_scored_once() {
        let rules = custom(json!({
            "version": "t",
            "evaluationOrder": ["first", "second"],
            "rules": {
                "first": { "keywords": ["alpha"], "severity": "medium", "message": "same" },
                "second": { "pattern": "alp", "severity": "high", "message": "same" }
            }
        }));
        let report = evaluate("alpha", &rules).unwrap();
        assert_eq!(keys(&report), vec!["first"]);
        assert_eq!(report.score, 3);
        assert_eq!(report.status, Status::Warn);
    }

    #[test]
    fn issues_follow_evaluation_order_not_message_order() {
        let rules = custom(json!({
            "version": "t",
            "evaluationOrder": ["z", "a"],
            "rules": {
                "a": { "keywords": ["first"], "severity": "low", "message": "a" },
                "z": { "keywords": ["second"], "severity": "low", "message": "z" }
            }
        }));
        let report = evaluate("first then second", &rules).unwrap();
        assert_eq!(keys(&report), vec!["z", "a"]);
    }

    #[test]
    fn categories_come_only_from_rules_with_metadata() {
        let rules = custom(json!({
            "version": "t",
            "evaluationOrder": ["plain", "tagged"],
            "rules": {
                "plain": { "keywords": ["alpha"], "severity": "low", "message": "plain" },
                "tagged": {
                    "keywords": ["beta"],
                    "severity": "medium",
                    "message": "tagged",
                    "category": { "name": "Tagged" }
                }
            }
        }));
        let report = evaluate("alpha beta", &rules).unwrap();
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.detected_categories.len(), 1);
        assert_eq!(report.detected_categories[0].name, "Tagged");
        assert_eq!(report.detected_categories[0].keywords, vec!["beta"]);
    }

    #[test]
    fn mms_channel_skips_sms_only_rules() {
        let rules = RuleSet::builtin().unwrap();
        let message = format!("{} STOP HELP", "a ".repeat(100));
        let sms = evaluate_for(&message, &rules, Channel::Sms).unwrap();
        let mms = evaluate_for(&message, &rules, Channel::Mms).unwrap();
        assert!(keys(&sms).contains(&"characterLimit"));
        assert!(!keys(&mms).contains(&"characterLimit"));
    }
}
