//! Request/response boundary around the evaluator and the rewriter.
//!
//! One request pins one ruleset snapshot. An unexpected panic inside the
//! analysis is turned into an advisory `warn` response so callers are never
//! left without an answer.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::TOOL_NAME;
use crate::counter::{Counter, Totals, record_check};
use crate::error::CheckError;
use crate::report::model::{
    AnalysisInfo, CheckResponse, ComplianceReport, MessageInfo, MetaInfo, RulesetInfo, ToolInfo,
};
use crate::rewrite::rewrite;
use crate::rules::catalog::{Channel, RuleSet};
use crate::rules::eval::evaluate_for;
use crate::rules::store::{RuleSnapshot, RuleStore};
use crate::signals::extract::{extract_signals, links};
use crate::util::text::char_len;

/// Mode reported when the caller does not name one.
pub const DEFAULT_MODE: &str = "unknown";

const DEGRADED_TIP: &str = "Using the bundled offline rules is OK if this persists.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    #[serde(alias = "text")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default)]
    pub channel: Channel,
}

impl CheckRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    pub fn mode(&self) -> &str {
        self.mode.as_deref().unwrap_or(DEFAULT_MODE)
    }
}

pub struct Checker {
    store: Arc<RuleStore>,
    counter: Arc<dyn Counter>,
    tool: ToolInfo,
}

impl Checker {
    pub fn new(store: Arc<RuleStore>, counter: Arc<dyn Counter>) -> Self {
        Self {
            store,
            counter,
            tool: ToolInfo {
                name: TOOL_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    pub fn with_tool(mut self, tool: ToolInfo) -> Self {
        self.tool = tool;
        self
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    pub fn check(&self, request: &CheckRequest) -> Result<CheckResponse, CheckError> {
        self.respond(request, analyze)
    }

    fn respond<F>(&self, request: &CheckRequest, analysis: F) -> Result<CheckResponse, CheckError>
    where
        F: FnOnce(&str, &RuleSet, Channel) -> Result<(ComplianceReport, String), CheckError>,
    {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(CheckError::EmptyMessage);
        }

        let snapshot = self.store.snapshot();
        let digest = sha256_hex(message);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            analysis(message, &snapshot.rules, request.channel)
        }));

        let (report, suggestion, tips, totals, status) = match outcome {
            Ok(result) => {
                let (report, suggestion) = result?;
                let totals = record_check(self.counter.as_ref());
                let tips = tips(message, request.mode(), &snapshot.rules);
                debug!(
                    sha256 = %digest,
                    status = %report.status,
                    score = report.score,
                    issues = report.issues.len(),
                    "message checked"
                );
                (report, suggestion, tips, totals, AnalysisInfo::ok())
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!(sha256 = %digest, reason, "analysis panicked, returning degraded result");
                (
                    ComplianceReport::degraded(&extract_signals(message)),
                    message.to_string(),
                    vec![DEGRADED_TIP.to_string()],
                    Totals::untouched(),
                    AnalysisInfo::degraded(format!("analyzer error: {reason}")),
                )
            }
        };

        Ok(CheckResponse::new(
            self.tool.clone(),
            ruleset_info(&snapshot),
            MessageInfo {
                length: char_len(message),
                sha256: digest,
            },
            report,
            suggestion,
            tips,
            MetaInfo {
                mode: request.mode().to_string(),
                channel: request.channel,
            },
            totals,
            status,
        ))
    }
}

fn analyze(
    message: &str,
    rules: &RuleSet,
    channel: Channel,
) -> Result<(ComplianceReport, String), CheckError> {
    let report = evaluate_for(message, rules, channel)?;
    Ok((report, rewrite(message, rules)))
}

fn ruleset_info(snapshot: &RuleSnapshot) -> RulesetInfo {
    RulesetInfo {
        version: snapshot.rules.version.clone(),
        generation: snapshot.generation,
    }
}

/// Practical advice attached to every successful check.
pub fn tips(message: &str, mode: &str, rules: &RuleSet) -> Vec<String> {
    let advice = &rules.advice;
    let mut out = Vec::new();

    if links(message).next().is_none() {
        if let Some(tip) = &advice.link_tip {
            out.push(tip.clone());
        }
    }
    if !advice.opt_out_tip_exclude_modes.iter().any(|m| m == mode) {
        if let Some(tip) = &advice.opt_out_tip {
            out.push(tip.clone());
        }
    }
    out
}

pub fn sha256_hex(message: &str) -> String {
    hex::encode(Sha256::digest(message.as_bytes()))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
