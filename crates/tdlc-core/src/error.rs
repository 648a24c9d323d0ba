//! Error taxonomy for the compliance core.
//!
//! - `ConfigError`: a rules document that cannot become a `RuleSet`.
//!   Raised at load time only; evaluation never sees a partial ruleset.
//! - `CheckError`: caller-facing input problems.
//! - `CounterError`: telemetry failures, always swallowed by the caller.
//! - `StoreError`: rejected ruleset replacements.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read rules document {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rules document is not valid JSON")]
    Parse(#[from] serde_json::Error),

    #[error("rule `{rule}` declares no matcher (expected one of keywords, pattern, check)")]
    MissingMatcher { rule: String },

    #[error("rule `{rule}` declares more than one matcher ({found})")]
    AmbiguousMatcher { rule: String, found: String },

    #[error("rule `{rule}` has an empty keyword list")]
    EmptyKeywords { rule: String },

    #[error("rule `{rule}` contains a blank keyword")]
    BlankKeyword { rule: String },

    #[error("rule `{rule}` has an invalid pattern")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule `{rule}` has an empty message template")]
    EmptyMessage { rule: String },

    #[error("rule `{rule}` has an invalid structural check: {reason}")]
    InvalidCheck { rule: String, reason: String },

    #[error("evaluation order references unknown rule `{key}`")]
    UnknownRuleInOrder { key: String },

    #[error("evaluation order lists rule `{key}` more than once")]
    DuplicateInOrder { key: String },

    #[error("rule `{key}` is missing from the evaluation order")]
    UnorderedRule { key: String },

    #[error("invalid rewrite policy: {reason}")]
    Rewrite { reason: String },

    #[error("invalid rewrite pattern `{pattern}`")]
    RewritePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckError {
    #[error("message is empty")]
    EmptyMessage,
}

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("counter unavailable: {0}")]
    Unavailable(String),

    #[error("counter storage error")]
    Io(#[from] std::io::Error),

    #[error("counter storage is corrupt")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("admin key rejected")]
    Unauthorized,

    #[error(transparent)]
    Config(#[from] ConfigError),
}
