//! Compiled rule catalog.
//!
//! A `RuleSet` is built once from a rules document (see `rules::document`)
//! and is immutable afterwards. Every rule has exactly one matching mode,
//! resolved at load time into `RuleKind`, so the matcher dispatches on the
//! variant instead of probing optional fields.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rules::document::RuleDocument;
use crate::util::text;

/// Rules document bundled into the binary; the fallback when no other
/// source can be loaded.
pub const BUILTIN_RULES: &str = include_str!("../../rules/default.json");

/// Ordinal risk tier used for scoring. Ordering is semantic:
/// `Low < Medium < High`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Points contributed to the compliance score.
    pub fn points(self) -> u32 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 3,
            Severity::High => 5,
        }
    }

    pub fn default_impact(self) -> Impact {
        match self {
            Severity::Low => Impact::Warning,
            Severity::Medium => Impact::Restricted,
            Severity::High => Impact::Prohibited,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// Severity labels accepted in rules documents.
///
/// Some rule feeds use the carrier vocabulary (watchlist / restricted /
/// prohibited); it folds onto the three scoring tiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Low,
    Medium,
    High,
    Watchlist,
    Restricted,
    Prohibited,
}

impl SeverityTier {
    pub fn normalize(self) -> Severity {
        match self {
            SeverityTier::Low | SeverityTier::Watchlist => Severity::Low,
            SeverityTier::Medium | SeverityTier::Restricted => Severity::Medium,
            SeverityTier::High | SeverityTier::Prohibited => Severity::High,
        }
    }

    /// True for the carrier labels that carry more than the scoring tier.
    pub fn is_extended(self) -> bool {
        matches!(
            self,
            SeverityTier::Watchlist | SeverityTier::Restricted | SeverityTier::Prohibited
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeverityTier::Low => "low",
            SeverityTier::Medium => "medium",
            SeverityTier::High => "high",
            SeverityTier::Watchlist => "watchlist",
            SeverityTier::Restricted => "restricted",
            SeverityTier::Prohibited => "prohibited",
        }
    }
}

/// Campaign impact label shown alongside detected categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Prohibited,
    Restricted,
    Warning,
    Branding,
}

/// Delivery channel a message is checked for.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Sms,
    Mms,
}

/// Channels a rule applies to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    All,
    Sms,
    Mms,
}

impl Scope {
    pub fn applies_to(self, channel: Channel) -> bool {
        matches!(
            (self, channel),
            (Scope::All, _) | (Scope::Sms, Channel::Sms) | (Scope::Mms, Channel::Mms)
        )
    }
}

/// A literal phrase with its compiled whole-word matcher.
#[derive(Debug, Clone)]
pub struct Keyword {
    pub phrase: String,
    regex: Regex,
}

impl Keyword {
    pub fn new(phrase: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            phrase: phrase.to_string(),
            regex: text::word_regex(phrase)?,
        })
    }

    pub fn is_match(&self, message: &str) -> bool {
        self.regex.is_match(message)
    }
}

/// Bespoke predicates over a message that are not keyword-driven.
#[derive(Debug, Clone)]
pub enum Check {
    /// Fires when the message is longer than `limit` characters and, if
    /// `up_to` is set, no longer than `up_to`.
    MaxLength { limit: usize, up_to: Option<usize> },
    /// Fires when the whole-word keyword is absent.
    Missing(Keyword),
    /// Fires when there are more than `max` links.
    MaxLinks(usize),
    /// Fires when at least `threshold` emoji are present.
    Emoji(usize),
    /// Fires on a run of at least `run` identical `!` or `?`.
    RepeatedPunctuation(usize),
    AllCaps { min_letters: usize, ratio: f64 },
}

#[derive(Debug, Clone)]
pub enum RuleKind {
    Keyword(Vec<Keyword>),
    Pattern(Regex),
    Structural(Check),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub impact: Impact,
    pub detail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub key: String,
    pub severity: Severity,
    /// Label as written in the document, kept for display.
    pub tier: SeverityTier,
    pub scope: Scope,
    pub kind: RuleKind,
    pub message: String,
    pub suggestion: String,
    pub enabled: bool,
    pub category: Option<Category>,
}

/// One softening substitution applied by the rewriter.
#[derive(Debug, Clone)]
pub struct Softening {
    pub phrase: String,
    pub regex: Regex,
    pub replacement: String,
}

/// Parameters of the suggested-rewrite transform.
#[derive(Debug, Clone)]
pub struct RewritePolicy {
    pub limit: usize,
    pub ellipsis: String,
    pub softening: Vec<Softening>,
    pub placeholder_url: String,
    /// Matches a shortener domain anywhere in a string.
    pub shortener: Regex,
    /// Matches a bare shortener link (domain plus optional path).
    pub bare_shortener: Regex,
    pub help: Keyword,
    pub help_line: String,
    pub stop: Keyword,
    pub stop_line: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Advice {
    pub link_tip: Option<String>,
    pub opt_out_tip: Option<String>,
    pub opt_out_tip_exclude_modes: Vec<String>,
}

/// Immutable, validated ruleset.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub version: String,
    pub(crate) order: Vec<String>,
    pub(crate) rules: HashMap<String, Rule>,
    pub rewrite: RewritePolicy,
    pub advice: Advice,
    pub(crate) document: RuleDocument,
}

impl RuleSet {
    /// The bundled default ruleset.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_RULES)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let document: RuleDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn from_document(document: RuleDocument) -> Result<Self, ConfigError> {
        document.compile()
    }

    pub fn get(&self, key: &str) -> Option<&Rule> {
        self.rules.get(key)
    }

    pub fn evaluation_order(&self) -> &[String] {
        &self.order
    }

    /// Rules in declared evaluation order, disabled ones included.
    pub fn rules_in_order(&self) -> impl Iterator<Item = &Rule> {
        self.order.iter().filter_map(|key| self.rules.get(key))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The document this set was compiled from.
    pub fn document(&self) -> &RuleDocument {
        &self.document
    }
}
