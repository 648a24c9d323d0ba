//! Where rulesets come from.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::ConfigError;
use crate::rules::catalog::RuleSet;

pub trait RuleSource {
    fn load(&self) -> Result<RuleSet, ConfigError>;

    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;
}

/// The document compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinRules;

impl RuleSource for BuiltinRules {
    fn load(&self) -> Result<RuleSet, ConfigError> {
        RuleSet::builtin()
    }

    fn describe(&self) -> String {
        "builtin".to_string()
    }
}

/// A JSON rules document on disk.
#[derive(Debug, Clone)]
pub struct FileRules {
    path: PathBuf,
}

impl FileRules {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RuleSource for FileRules {
    fn load(&self) -> Result<RuleSet, ConfigError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        RuleSet::from_json(&raw)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Loads from `source`, falling back to the built-in rules on any error.
pub fn load_or_builtin(source: &dyn RuleSource) -> Result<RuleSet, ConfigError> {
    match source.load() {
        Ok(rules) => Ok(rules),
        Err(err) => {
            warn!(
                source = %source.describe(),
                error = %err,
                "failed to load rules, using built-in defaults"
            );
            RuleSet::builtin()
        }
    }
}
