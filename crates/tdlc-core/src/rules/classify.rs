//! Classification engine for compliance verdicts.
//!
//! This module derives the final verdict from a set of triggered rules.
//!
//! Responsibilities:
//! - Convert severities into points and sum them into a score
//! - Map the score onto pass / warn / fail
//! - Compute CI-compatible exit codes
//!
//! Non-responsibilities:
//! - Deciding whether a rule fires (handled in `rules::matcher`)
//! - Ordering or de-duplicating issues (handled in `rules::eval`)
//!
//! Points: low = 1, medium = 3, high = 5.
//!
//!   - score == 0      → PASS
//!   - 0 < score < 5   → WARN
//!   - score >= 5      → FAIL
//!
//! A single high-severity issue is therefore enough to fail a message.

use crate::report::model::Status;
use crate::rules::catalog::Severity;
use crate::rules::eval::TriggeredRule;

/// Score at or above which a message fails.
pub const FAIL_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: Status,
    pub score: u32,
    pub highest_severity: Option<Severity>,
    pub exit_code: i32,
}

pub fn score(triggered: &[TriggeredRule]) -> u32 {
    triggered.iter().map(|r| r.severity.points()).sum()
}

pub fn status_for_score(score: u32) -> Status {
    match score {
        0 => Status::Pass,
        s if s < FAIL_THRESHOLD => Status::Warn,
        _ => Status::Fail,
    }
}

/// Exit code mapping:
/// - PASS → 0
/// - WARN → 1
/// - FAIL → 2
pub fn exit_code(status: Status) -> i32 {
    match status {
        Status::Pass => 0,
        Status::Warn => 1,
        Status::Fail => 2,
    }
}

/// Derives the verdict for already de-duplicated triggered rules.
///
/// Independent of the order of `triggered`.
pub fn classify(triggered: &[TriggeredRule]) -> Classification {
    let score = score(triggered);
    let status = status_for_score(score);

    Classification {
        status,
        score,
        highest_severity: triggered.iter().map(|r| r.severity).max(),
        exit_code: exit_code(status),
    }
}
