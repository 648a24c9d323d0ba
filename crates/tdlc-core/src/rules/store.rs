//! Versioned ruleset snapshots.
//!
//! Readers pin an `Arc<RuleSnapshot>` for the duration of a check; a
//! replacement swaps the pointer and never mutates a published snapshot.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::error::{ConfigError, StoreError};
use crate::rules::catalog::RuleSet;
use crate::rules::document::RuleDocument;
use crate::rules::source::RuleSource;

#[derive(Debug)]
pub struct RuleSnapshot {
    pub generation: u64,
    pub rules: RuleSet,
}

#[derive(Debug)]
pub struct RuleStore {
    current: RwLock<Arc<RuleSnapshot>>,
    admin_key: Option<String>,
}

impl RuleStore {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            current: RwLock::new(Arc::new(RuleSnapshot {
                generation: 1,
                rules,
            })),
            admin_key: None,
        }
    }

    /// Enables `update`; without a key every update is unauthorized.
    pub fn with_admin_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.admin_key = (!key.is_empty()).then_some(key);
        self
    }

    pub fn snapshot(&self) -> Arc<RuleSnapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// Publishes `rules` as the next generation.
    pub fn replace(&self, rules: RuleSet) -> Arc<RuleSnapshot> {
        let mut current = self.current.write();
        let next = Arc::new(RuleSnapshot {
            generation: current.generation + 1,
            rules,
        });
        *current = Arc::clone(&next);
        info!(
            generation = next.generation,
            version = %next.rules.version,
            rules = next.rules.len(),
            "ruleset replaced"
        );
        next
    }

    /// Admin-gated replacement from a rules document.
    pub fn update(
        &self,
        admin_key: &str,
        document: RuleDocument,
    ) -> Result<Arc<RuleSnapshot>, StoreError> {
        match &self.admin_key {
            Some(expected) if expected == admin_key => {}
            _ => {
                warn!("ruleset update rejected: admin key mismatch");
                return Err(StoreError::Unauthorized);
            }
        }
        let rules = RuleSet::from_document(document)?;
        Ok(self.replace(rules))
    }

    /// Replaces the ruleset from `source`; on failure the current snapshot
    /// stays published.
    pub fn reload(&self, source: &dyn RuleSource) -> Result<Arc<RuleSnapshot>, ConfigError> {
        match source.load() {
            Ok(rules) => Ok(self.replace(rules)),
            Err(err) => {
                warn!(source = %source.describe(), error = %err, "ruleset reload failed");
                Err(err)
            }
        }
    }
}
