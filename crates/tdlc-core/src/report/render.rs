use std::fmt::Write;

use crate::report::model::CheckResponse;

pub fn render_text(response: &CheckResponse) -> String {
    let report = &response.report;
    let mut out = String::new();

    let _ = writeln!(out, "{} {}", response.tool.name, response.tool.version);
    let _ = writeln!(
        out,
        "Ruleset: {} (generation {})",
        response.ruleset.version, response.ruleset.generation
    );
    let _ = writeln!(
        out,
        "Message: {} characters, {} words",
        report.message_length, report.word_count
    );
    let status = report.status.to_string().to_uppercase();
    match report.highest_severity {
        Some(highest) => {
            let _ = writeln!(
                out,
                "Status: {status} (score {}, highest {})",
                report.score,
                highest.as_str()
            );
        }
        None => {
            let _ = writeln!(out, "Status: {status} (score {})", report.score);
        }
    }
    if !response.analysis.is_ok() {
        for w in &response.analysis.warnings {
            let _ = writeln!(out, "Warning: {w}");
        }
    }

    if report.issues.is_empty() {
        out.push_str("Issues: none\n");
    } else {
        out.push_str("Issues:\n");
        for issue in &report.issues {
            let label = match issue.tier {
                Some(tier) => format!("{}/{}", issue.severity.as_str(), tier.as_str()),
                None => issue.severity.as_str().to_string(),
            };
            let _ = writeln!(out, "  - {} [{label}] {}", issue.rule_key, issue.message);
            if !issue.suggestion.is_empty() {
                let _ = writeln!(out, "      fix: {}", issue.suggestion);
            }
        }
    }

    if !report.detected_categories.is_empty() {
        out.push_str("Categories:\n");
        for c in &report.detected_categories {
            let _ = writeln!(
                out,
                "  - {} ({:?}): {}",
                c.name,
                c.impact,
                c.keywords.join(", ")
            );
        }
    }

    let _ = writeln!(out, "Suggestion: {}", response.suggestion);
    for tip in &response.tips {
        let _ = writeln!(out, "Tip: {tip}");
    }
    out
}
