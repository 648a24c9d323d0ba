//! Check counter collaborator.
//!
//! The counter is telemetry only: a failing or missing counter never changes
//! a compliance verdict.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::CounterError;

/// Key incremented once per accepted evaluation.
pub const COUNTER_KEY: &str = "tdlc:checks_total";

/// Durable integer counters keyed by name.
///
/// `Ok(None)` means the backend is not configured or has no value.
pub trait Counter: Send + Sync {
    fn increment(&self, key: &str) -> Result<Option<i64>, CounterError>;
    fn get(&self, key: &str) -> Result<Option<i64>, CounterError>;
}

/// No backend configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl Counter for Unconfigured {
    fn increment(&self, _key: &str) -> Result<Option<i64>, CounterError> {
        Ok(None)
    }

    fn get(&self, _key: &str) -> Result<Option<i64>, CounterError> {
        Ok(None)
    }
}

/// Process-local counters.
#[derive(Debug, Default)]
pub struct MemoryCounter {
    values: Mutex<BTreeMap<String, i64>>,
}

impl MemoryCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Counter for MemoryCounter {
    fn increment(&self, key: &str) -> Result<Option<i64>, CounterError> {
        let mut values = self.values.lock();
        let value = values.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(Some(*value))
    }

    fn get(&self, key: &str) -> Result<Option<i64>, CounterError> {
        Ok(self.values.lock().get(key).copied())
    }
}

/// Counters persisted as a JSON object `{ key: value }`.
///
/// Read-modify-write is serialized within the process; concurrent writers in
/// other processes are not coordinated. Each write goes to a temporary file
/// in the same directory and is renamed over the target, so an interrupted
/// write leaves the previous contents intact.
#[derive(Debug)]
pub struct FileCounter {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCounter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, i64>, CounterError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, values: &BTreeMap<String, i64>) -> Result<(), CounterError> {
        let raw = serde_json::to_string_pretty(values)?;
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(raw.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Counter for FileCounter {
    fn increment(&self, key: &str) -> Result<Option<i64>, CounterError> {
        let _guard = self.lock.lock();
        let mut values = self.read()?;
        let value = values.entry(key.to_string()).or_insert(0);
        *value += 1;
        let value = *value;
        self.write(&values)?;
        Ok(Some(value))
    }

    fn get(&self, key: &str) -> Result<Option<i64>, CounterError> {
        let _guard = self.lock.lock();
        Ok(self.read()?.get(key).copied())
    }
}

/// Outcome of the best-effort increment, as reported to the caller.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Totals {
    pub incremented: bool,
    pub total: Option<i64>,
}

impl Totals {
    pub fn untouched() -> Self {
        Self::default()
    }
}

/// Increments `COUNTER_KEY` once, swallowing any failure.
pub fn record_check(counter: &dyn Counter) -> Totals {
    match counter.increment(COUNTER_KEY) {
        Ok(Some(total)) => Totals {
            incremented: true,
            total: Some(total),
        },
        Ok(None) => Totals::untouched(),
        Err(err) => {
            debug!(error = %err, key = COUNTER_KEY, "counter increment failed");
            Totals::untouched()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct Broken;

    impl Counter for Broken {
        fn increment(&self, _key: &str) -> Result<Option<i64>, CounterError> {
            Err(CounterError::Unavailable("offline".into()))
        }

        fn get(&self, _key: &str) -> Result<Option<i64>, CounterError> {
            Err(CounterError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn unconfigured_reports_nothing() {
        assert_eq!(record_check(&Unconfigured), Totals::untouched());
        assert_eq!(Unconfigured.get(COUNTER_KEY).unwrap(), None);
    }

    #[test]
    fn memory_counter_counts_per_key() {
        let counter = MemoryCounter::new();
        assert_eq!(counter.get("a").unwrap(), None);
        assert_eq!(counter.increment("a").unwrap(), Some(1));
        assert_eq!(counter.increment("a").unwrap(), Some(2));
        assert_eq!(counter.increment("b").unwrap(), Some(1));
        assert_eq!(counter.get("a").unwrap(), Some(2));
    }

    #[test]
    fn failures_are_swallowed() {
        let totals = record_check(&Broken);
        assert!(!totals.incremented);
        assert_eq!(totals.total, None);
    }

    #[test]
    fn record_check_reports_new_total() {
        let counter = MemoryCounter::new();
        record_check(&counter);
        let totals = record_check(&counter);
        assert_eq!(
            totals,
            Totals {
                incremented: true,
                total: Some(2)
            }
        );
    }

    #[test]
    fn file_counter_persists_between_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counts.json");

        assert_eq!(FileCounter::new(&path).increment(COUNTER_KEY).unwrap(), Some(1));
        assert_eq!(FileCounter::new(&path).increment(COUNTER_KEY).unwrap(), Some(2));
        assert_eq!(FileCounter::new(&path).get(COUNTER_KEY).unwrap(), Some(2));
    }

    #[test]
    fn file_counter_rejects_corrupt_storage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counts.json");
        fs::write(&path, "not json").unwrap();

        let counter = FileCounter::new(&path);
        assert!(matches!(
            counter.increment(COUNTER_KEY),
            Err(CounterError::Corrupt(_))
        ));
        assert_eq!(record_check(&counter), Totals::untouched());
    }

    #[test]
    fn file_counter_write_replaces_whole_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counts.json");
        fs::write(&path, r#"{ "tdlc:checks_total": 41 }"#).unwrap();

        let counter = FileCounter::new(&path);
        assert_eq!(counter.increment(COUNTER_KEY).unwrap(), Some(42));

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["counts.json"]);

        let stored: BTreeMap<String, i64> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored.get(COUNTER_KEY), Some(&42));
    }

    #[test]
    fn file_counter_in_missing_directory_is_swallowed() {
        let dir = tempdir().unwrap();
        let counter = FileCounter::new(dir.path().join("missing").join("counts.json"));

        assert!(matches!(counter.increment(COUNTER_KEY), Err(CounterError::Io(_))));
        assert_eq!(record_check(&counter), Totals::untouched());
    }
}
