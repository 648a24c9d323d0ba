//! Rules document: the serialized form of a ruleset.
//!
//! Documents are plain JSON (camelCase keys) so they can be shipped with the
//! binary, loaded from disk, or replaced through an admin update. A document
//! is only useful once `compile` has validated it into a `RuleSet`; any
//! malformed entry rejects the whole document.

use std::collections::{BTreeMap, HashMap, HashSet};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rules::catalog::{
    Advice, Category, Check, Impact, Keyword, RewritePolicy, Rule, RuleKind, RuleSet, Scope,
    SeverityTier, Softening,
};
use crate::util::text;

pub const DEFAULT_SHORTENER_PATTERN: &str = r"\b(?:bit\.ly|bitly\.com|tinyurl\.com|goo\.gl|t\.co|is\.gd|ow\.ly|buff\.ly|rebrand\.ly|shorturl\.at|rb\.gy|lnkd\.in|cutt\.ly)\b";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDocument {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    pub evaluation_order: Vec<String>,
    pub rules: BTreeMap<String, RuleEntry>,
    #[serde(default)]
    pub rewrite: RewriteEntry,
    #[serde(default)]
    pub advice: AdviceEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<CheckEntry>,
    pub severity: SeverityTier,
    #[serde(default)]
    pub scope: Scope,
    pub message: String,
    #[serde(default)]
    pub suggestion: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryEntry>,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CheckEntry {
    MaxLength {
        limit: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        up_to: Option<usize>,
    },
    MissingKeyword { keyword: String },
    MaxLinks { max: usize },
    Emoji { threshold: usize },
    RepeatedPunctuation { run: usize },
    AllCaps { min_letters: usize, ratio: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SofteningEntry {
    pub phrase: String,
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RewriteEntry {
    pub limit: usize,
    pub ellipsis: String,
    pub softening: Vec<SofteningEntry>,
    pub placeholder_url: String,
    pub shortener_pattern: String,
    pub help_keyword: String,
    pub help_line: String,
    pub stop_keyword: String,
    pub stop_line: String,
}

impl Default for RewriteEntry {
    fn default() -> Self {
        let soften = |phrase: &str, replacement: &str| SofteningEntry {
            phrase: phrase.to_string(),
            replacement: replacement.to_string(),
        };
        Self {
            limit: 160,
            ellipsis: "…".to_string(),
            softening: vec![
                soften("act now", "get started"),
                soften("limited time", "limited-time"),
                soften("guaranteed", "designed to"),
                soften("urgent", "important"),
                soften("click here now", "learn more"),
            ],
            placeholder_url: "https://yourbrand.com/sms".to_string(),
            shortener_pattern: DEFAULT_SHORTENER_PATTERN.to_string(),
            help_keyword: "HELP".to_string(),
            help_line: "HELP: support@example.com".to_string(),
            stop_keyword: "STOP".to_string(),
            stop_line: "Reply STOP to opt out.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdviceEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_tip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opt_out_tip: Option<String>,
    pub opt_out_tip_exclude_modes: Vec<String>,
}

impl RuleDocument {
    /// Validates the document and compiles every matcher.
    ///
    /// Fails on the first malformed entry; rules are visited in key order so
    /// the reported error is stable for a given document.
    pub fn compile(self) -> Result<RuleSet, ConfigError> {
        let mut rules = HashMap::with_capacity(self.rules.len());
        for (key, entry) in &self.rules {
            rules.insert(key.clone(), entry.compile(key)?);
        }

        let order = validate_order(&self.evaluation_order, &self.rules)?;
        let rewrite = self.rewrite.compile()?;
        let advice = Advice {
            link_tip: self.advice.link_tip.clone(),
            opt_out_tip: self.advice.opt_out_tip.clone(),
            opt_out_tip_exclude_modes: self.advice.opt_out_tip_exclude_modes.clone(),
        };

        Ok(RuleSet {
            version: self.version.clone(),
            order,
            rules,
            rewrite,
            advice,
            document: self,
        })
    }
}

fn validate_order(
    order: &[String],
    rules: &BTreeMap<String, RuleEntry>,
) -> Result<Vec<String>, ConfigError> {
    let mut seen = HashSet::with_capacity(order.len());
    for key in order {
        if !rules.contains_key(key) {
            return Err(ConfigError::UnknownRuleInOrder { key: key.clone() });
        }
        if !seen.insert(key.as_str()) {
            return Err(ConfigError::DuplicateInOrder { key: key.clone() });
        }
    }

    if let Some(key) = rules.keys().find(|k| !seen.contains(k.as_str())) {
        return Err(ConfigError::UnorderedRule { key: key.clone() });
    }

    Ok(order.to_vec())
}

impl RuleEntry {
    fn compile(&self, key: &str) -> Result<Rule, ConfigError> {
        let declared: Vec<&str> = [
            ("keywords", self.keywords.is_some()),
            ("pattern", self.pattern.is_some()),
            ("check", self.check.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect();

        if declared.len() > 1 {
            return Err(ConfigError::AmbiguousMatcher {
                rule: key.to_string(),
                found: declared.join(", "),
            });
        }

        let kind = match (&self.keywords, &self.pattern, &self.check) {
            (Some(keywords), None, None) => RuleKind::Keyword(compile_keywords(key, keywords)?),
            (None, Some(pattern), None) if !pattern.trim().is_empty() => {
                RuleKind::Pattern(compile_pattern(pattern).map_err(|source| {
                    ConfigError::InvalidPattern {
                        rule: key.to_string(),
                        source,
                    }
                })?)
            }
            (None, None, Some(check)) => RuleKind::Structural(check.compile(key)?),
            _ => {
                return Err(ConfigError::MissingMatcher {
                    rule: key.to_string(),
                });
            }
        };

        if self.message.trim().is_empty() {
            return Err(ConfigError::EmptyMessage {
                rule: key.to_string(),
            });
        }

        let severity = self.severity.normalize();
        let category = self.category.as_ref().map(|c| Category {
            name: c.name.clone(),
            impact: c.impact.unwrap_or_else(|| severity.default_impact()),
            detail: c.detail.clone(),
        });

        Ok(Rule {
            key: key.to_string(),
            severity,
            tier: self.severity,
            scope: self.scope,
            kind,
            message: self.message.clone(),
            suggestion: self.suggestion.clone(),
            enabled: self.enabled,
            category,
        })
    }
}

fn compile_keywords(key: &str, phrases: &[String]) -> Result<Vec<Keyword>, ConfigError> {
    if phrases.is_empty() {
        return Err(ConfigError::EmptyKeywords {
            rule: key.to_string(),
        });
    }

    phrases
        .iter()
        .map(|phrase| {
            if phrase.trim().is_empty() {
                return Err(ConfigError::BlankKeyword {
                    rule: key.to_string(),
                });
            }
            Keyword::new(phrase.trim()).map_err(|source| ConfigError::InvalidPattern {
                rule: key.to_string(),
                source,
            })
        })
        .collect()
}

fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

impl CheckEntry {
    fn compile(&self, key: &str) -> Result<Check, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidCheck {
            rule: key.to_string(),
            reason: reason.to_string(),
        };

        let check = match self {
            CheckEntry::MaxLength { limit, up_to } => {
                if up_to.is_some_and(|upper| upper <= *limit) {
                    return Err(invalid("upTo must be greater than limit"));
                }
                Check::MaxLength {
                    limit: *limit,
                    up_to: *up_to,
                }
            }
            CheckEntry::MissingKeyword { keyword } => {
                if keyword.trim().is_empty() {
                    return Err(invalid("keyword must not be blank"));
                }
                Check::Missing(Keyword::new(keyword.trim()).map_err(|source| {
                    ConfigError::InvalidPattern {
                        rule: key.to_string(),
                        source,
                    }
                })?)
            }
            CheckEntry::MaxLinks { max } => Check::MaxLinks(*max),
            CheckEntry::Emoji { threshold } => {
                if *threshold == 0 {
                    return Err(invalid("threshold must be at least 1"));
                }
                Check::Emoji(*threshold)
            }
            CheckEntry::RepeatedPunctuation { run } => {
                if *run < 2 {
                    return Err(invalid("run must be at least 2"));
                }
                Check::RepeatedPunctuation(*run)
            }
            CheckEntry::AllCaps { min_letters, ratio } => {
                if !(*ratio > 0.0 && *ratio <= 1.0) {
                    return Err(invalid("ratio must be in (0, 1]"));
                }
                Check::AllCaps {
                    min_letters: *min_letters,
                    ratio: *ratio,
                }
            }
        };

        Ok(check)
    }
}

impl RewriteEntry {
    fn compile(&self) -> Result<RewritePolicy, ConfigError> {
        let reject = |reason: String| ConfigError::Rewrite { reason };

        if self.help_keyword.trim().is_empty() || self.stop_keyword.trim().is_empty() {
            return Err(reject("help and stop keywords must not be blank".into()));
        }

        let help = Keyword::new(self.help_keyword.trim()).map_err(|source| {
            ConfigError::RewritePattern {
                pattern: self.help_keyword.clone(),
                source,
            }
        })?;
        let stop = Keyword::new(self.stop_keyword.trim()).map_err(|source| {
            ConfigError::RewritePattern {
                pattern: self.stop_keyword.clone(),
                source,
            }
        })?;

        if !help.is_match(&self.help_line) {
            return Err(reject(format!(
                "help line must contain `{}`",
                self.help_keyword
            )));
        }
        if !stop.is_match(&self.stop_line) {
            return Err(reject(format!(
                "stop line must contain `{}`",
                self.stop_keyword
            )));
        }

        // Room for the body's terminator, both separators, both lines and
        // at least one character of body plus the ellipsis.
        let boilerplate = text::char_len(&self.help_line)
            + text::char_len(&self.stop_line)
            + text::char_len(&self.ellipsis)
            + 4;
        if self.limit < boilerplate {
            return Err(reject(format!(
                "limit {} cannot hold the opt-out boilerplate ({boilerplate} chars)",
                self.limit
            )));
        }

        let softening = self
            .softening
            .iter()
            .map(|entry| {
                if entry.phrase.trim().is_empty() {
                    return Err(reject("softening phrase must not be blank".into()));
                }
                let regex = text::word_regex(entry.phrase.trim()).map_err(|source| {
                    ConfigError::RewritePattern {
                        pattern: entry.phrase.clone(),
                        source,
                    }
                })?;
                Ok(Softening {
                    phrase: entry.phrase.clone(),
                    regex,
                    replacement: entry.replacement.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let shortener = compile_pattern(&self.shortener_pattern).map_err(|source| {
            ConfigError::RewritePattern {
                pattern: self.shortener_pattern.clone(),
                source,
            }
        })?;
        let bare_pattern = format!(r"(?:{})(?:/\S*)?", self.shortener_pattern);
        let bare_shortener =
            compile_pattern(&bare_pattern).map_err(|source| ConfigError::RewritePattern {
                pattern: bare_pattern.clone(),
                source,
            })?;

        if shortener.is_match(&self.placeholder_url) {
            return Err(reject(
                "placeholder url must not itself match the shortener pattern".into(),
            ));
        }

        Ok(RewritePolicy {
            limit: self.limit,
            ellipsis: self.ellipsis.clone(),
            softening,
            placeholder_url: self.placeholder_url.clone(),
            shortener,
            bare_shortener,
            help,
            help_line: self.help_line.clone(),
            stop,
            stop_line: self.stop_line.clone(),
        })
    }
}
