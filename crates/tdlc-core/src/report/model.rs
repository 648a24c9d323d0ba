use serde::{Deserialize, Serialize};

use crate::SCHEMA_VERSION;
use crate::counter::Totals;
use crate::rules::catalog::{Channel, Impact, Severity, SeverityTier};
use crate::rules::classify::Classification;
use crate::rules::eval::TriggeredRule;
use crate::signals::model::MessageSignals;

/// Compliance verdict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Warn,
    Fail,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Status::Pass => "pass",
            Status::Warn => "warn",
            Status::Fail => "fail",
        };
        f.write_str(label)
    }
}

/// One fired rule as presented to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub rule_key: String,
    pub severity: Severity,
    /// Carrier label from the rules document, when it is richer than
    /// `severity`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<SeverityTier>,
    pub message: String,
    pub suggestion: String,
}

/// Presentation view over fired rules that carry category metadata.
/// Never contributes to the score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DetectedCategory {
    pub name: String,
    pub impact: Impact,
    pub keywords: Vec<String>,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Evaluator output, derived entirely from the message and the ruleset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub status: Status,
    pub issues: Vec<Issue>,
    pub detected_categories: Vec<DetectedCategory>,
    pub message_length: usize,
    pub word_count: usize,
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highest_severity: Option<Severity>,
    pub exit_code: i32,
}

impl ComplianceReport {
    /// Assembles the report from evaluator outputs.
    ///
    /// Assumes `triggered` is already in evaluation order and de-duplicated.
    pub fn new(
        triggered: Vec<TriggeredRule>,
        classification: Classification,
        signals: &MessageSignals,
    ) -> Self {
        let detected_categories = triggered
            .iter()
            .filter_map(|r| {
                r.category.as_ref().map(|c| DetectedCategory {
                    name: c.name.clone(),
                    impact: c.impact,
                    keywords: r.matched_terms.clone(),
                    severity: r.severity,
                    detail: c.detail.clone(),
                })
            })
            .collect();

        let issues = triggered
            .into_iter()
            .map(|r| Issue {
                rule_key: r.rule_key,
                severity: r.severity,
                tier: r.tier.is_extended().then_some(r.tier),
                message: r.message,
                suggestion: r.suggestion,
            })
            .collect();

        Self {
            status: classification.status,
            issues,
            detected_categories,
            message_length: signals.length,
            word_count: signals.word_count,
            score: classification.score,
            highest_severity: classification.highest_severity,
            exit_code: classification.exit_code,
        }
    }

    /// Advisory result used when evaluation itself failed unexpectedly.
    ///
    /// Keeps callers unblocked: the verdict is `warn`, never `pass`.
    pub fn degraded(signals: &MessageSignals) -> Self {
        Self {
            status: Status::Warn,
            issues: vec![Issue {
                rule_key: "analyzerError".into(),
                severity: Severity::Medium,
                tier: None,
                message: "Analyzer error: the message could not be fully checked".into(),
                suggestion: "Review the message manually; retry later if this persists".into(),
            }],
            detected_categories: vec![],
            message_length: signals.length,
            word_count: signals.word_count,
            score: 0,
            highest_severity: None,
            exit_code: 1,
        }
    }
}

/// Tool metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Ruleset snapshot the response was computed against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RulesetInfo {
    pub version: String,
    pub generation: u64,
}

/// Identity of the checked message without its content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageInfo {
    pub length: usize,
    /// Hex-encoded SHA-256 of the trimmed message.
    pub sha256: String,
}

/// Request echo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetaInfo {
    pub mode: String,
    pub channel: Channel,
}

/// Evaluation status.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AnalysisInfo {
    pub status: String,
    pub warnings: Vec<String>,
}

impl AnalysisInfo {
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
            warnings: vec![],
        }
    }

    pub fn degraded(msg: impl Into<String>) -> Self {
        Self {
            status: "degraded".into(),
            warnings: vec![msg.into()],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Top-level response of a compliance check.
///
/// This struct is the stable JSON contract; it must remain deterministic
/// for identical message, ruleset and counter state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub schema_version: String,
    pub tool: ToolInfo,
    pub ruleset: RulesetInfo,
    pub message: MessageInfo,
    #[serde(flatten)]
    pub report: ComplianceReport,
    pub suggestion: String,
    pub tips: Vec<String>,
    pub meta: MetaInfo,
    pub totals: Totals,
    pub analysis: AnalysisInfo,
}

impl CheckResponse {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tool: ToolInfo,
        ruleset: RulesetInfo,
        message: MessageInfo,
        report: ComplianceReport,
        suggestion: String,
        tips: Vec<String>,
        meta: MetaInfo,
        totals: Totals,
        analysis: AnalysisInfo,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tool,
            ruleset,
            message,
            report,
            suggestion,
            tips,
            meta,
            totals,
            analysis,
        }
    }

    pub fn status(&self) -> Status {
        self.report.status
    }

    pub fn exit_code(&self) -> i32 {
        self.report.exit_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::catalog::Category;
    use crate::rules::classify::classify;

    fn triggered() -> Vec<TriggeredRule> {
        vec![
            TriggeredRule {
                rule_key: "characterLimit".into(),
                severity: Severity::Low,
                tier: SeverityTier::Low,
                message: "too long".into(),
                suggestion: "shorten".into(),
                matched_terms: vec![],
                category: None,
            },
            TriggeredRule {
                rule_key: "scams".into(),
                severity: Severity::High,
                tier: SeverityTier::Prohibited,
                message: "scam: \"fraud\"".into(),
                suggestion: "be honest".into(),
                matched_terms: vec!["fraud".into()],
                category: Some(Category {
                    name: "Suspicious/Scam Content".into(),
                    impact: Impact::Prohibited,
                    detail: None,
                }),
            },
        ]
    }

    #[test]
    fn report_maps_issues_and_categories_in_order() {
        let rules = triggered();
        let classification = classify(&rules);
        let signals = MessageSignals {
            length: 170,
            word_count: 30,
            ..Default::default()
        };

        let report = ComplianceReport::new(rules, classification, &signals);

        let keys: Vec<&str> = report.issues.iter().map(|i| i.rule_key.as_str()).collect();
        assert_eq!(keys, vec!["characterLimit", "scams"]);
        assert_eq!(report.detected_categories.len(), 1);
        assert_eq!(report.detected_categories[0].keywords, vec!["fraud"]);
        assert_eq!(report.score, 6);
        assert_eq!(report.highest_severity, Some(Severity::High));
        assert_eq!(report.status, Status::Fail);
        assert_eq!(report.issues[0].tier, None);
        assert_eq!(report.issues[1].tier, Some(SeverityTier::Prohibited));
        assert_eq!(report.message_length, 170);
        assert_eq!(report.word_count, 30);
    }

    #[test]
    fn degraded_report_warns() {
        let report = ComplianceReport::degraded(&MessageSignals::default());
        assert_eq!(report.status, Status::Warn);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.exit_code, 1);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Status::Fail).unwrap(), "\"fail\"");
        assert_eq!(Status::Warn.to_string(), "warn");
    }

    #[test]
    fn report_uses_camel_case_keys() {
        let report = ComplianceReport::new(vec![], classify(&[]), &MessageSignals::default());
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("detectedCategories").is_some());
        assert!(value.get("messageLength").is_some());
        assert!(value.get("wordCount").is_some());
        assert!(value.get("highestSeverity").is_none());
        assert_eq!(value["status"], "pass");
    }

    #[test]
    fn issue_tier_is_serialized_only_when_extended() {
        let rules = triggered();
        let classification = classify(&rules);
        let report = ComplianceReport::new(rules, classification, &MessageSignals::default());
        let value = serde_json::to_value(&report).unwrap();
        assert!(value["issues"][0].get("tier").is_none());
        assert_eq!(value["issues"][1]["tier"], "prohibited");
        assert_eq!(value["highestSeverity"], "high");
    }

    #[test]
    fn analysis_info_factories() {
        let degraded = AnalysisInfo::degraded("boom");
        assert_eq!(degraded.status, "degraded");
        assert_eq!(degraded.warnings, vec!["boom"]);
        assert!(!degraded.is_ok());
        assert!(AnalysisInfo::ok().is_ok());
    }
}
