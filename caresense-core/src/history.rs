//! Bounded local history of prior risk levels.
//!
//! Persistence is an injected dependency so the trend calculation never
//! couples to a concrete storage mechanism and tests can swap in memory.

use std::path::PathBuf;

use chrono::Utc;

use crate::error::Result;
use crate::types::{HistoryEntry, RiskLevel};

/// Maximum number of retained entries; the oldest is evicted on overflow.
pub const MAX_HISTORY_ENTRIES: usize = 3;

/// Key-value style persistence seam for prior results.
pub trait HistoryStore {
    /// Prepend a new entry with the current timestamp, truncate to
    /// [`MAX_HISTORY_ENTRIES`], and persist.
    fn record(&mut self, level: RiskLevel) -> Result<()>;

    /// The current sequence, newest first. Absent or corrupt storage yields
    /// an empty sequence; this never fails.
    fn read(&self) -> Vec<HistoryEntry>;
}

/// History persisted as a single JSON file under the data directory.
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store backed by the default `$XDG_DATA_HOME/caresense/history.json`.
    pub fn default_location() -> Self {
        Self::new(crate::config::Config::history_path())
    }
}

impl HistoryStore for FileHistoryStore {
    fn record(&mut self, level: RiskLevel) -> Result<()> {
        let mut entries = self.read();
        entries.insert(
            0,
            HistoryEntry {
                risk_level: level,
                date: Utc::now(),
            },
        );
        entries.truncate(MAX_HISTORY_ENTRIES);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn read(&self) -> Vec<HistoryEntry> {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<HistoryEntry>>(&content) {
            Ok(mut entries) => {
                entries.truncate(MAX_HISTORY_ENTRIES);
                entries
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Unreadable history file, treating as empty");
                Vec::new()
            }
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: Vec<HistoryEntry>,
}

impl HistoryStore for MemoryHistoryStore {
    fn record(&mut self, level: RiskLevel) -> Result<()> {
        self.entries.insert(
            0,
            HistoryEntry {
                risk_level: level,
                date: Utc::now(),
            },
        );
        self.entries.truncate(MAX_HISTORY_ENTRIES);
        Ok(())
    }

    fn read(&self) -> Vec<HistoryEntry> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileHistoryStore) {
        let dir = TempDir::new().unwrap();
        let store = FileHistoryStore::new(dir.path().join("history.json"));
        (dir, store)
    }

    #[test]
    fn missing_file_reads_empty() {
        let (_dir, store) = temp_store();
        assert!(store.read().is_empty());
    }

    #[test]
    fn record_prepends_newest_first() {
        let (_dir, mut store) = temp_store();
        store.record(RiskLevel::Low).unwrap();
        store.record(RiskLevel::High).unwrap();

        let entries = store.read();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].risk_level, RiskLevel::High);
        assert_eq!(entries[1].risk_level, RiskLevel::Low);
    }

    #[test]
    fn history_is_capped_at_three() {
        let (_dir, mut store) = temp_store();
        for level in [
            RiskLevel::Low,
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::Low,
        ] {
            store.record(level).unwrap();
        }

        let entries = store.read();
        assert_eq!(entries.len(), MAX_HISTORY_ENTRIES);
        // The 3 most recent, insertion order preserved newest first
        assert_eq!(entries[0].risk_level, RiskLevel::Low);
        assert_eq!(entries[1].risk_level, RiskLevel::High);
        assert_eq!(entries[2].risk_level, RiskLevel::Medium);
    }

    #[test]
    fn corrupt_file_reads_empty() {
        let (dir, store) = temp_store();
        std::fs::write(dir.path().join("history.json"), "not json at all").unwrap();
        assert!(store.read().is_empty());
    }

    #[test]
    fn record_recovers_from_corrupt_file() {
        let (dir, mut store) = temp_store();
        std::fs::write(dir.path().join("history.json"), "{{{{").unwrap();
        store.record(RiskLevel::Medium).unwrap();
        assert_eq!(store.read().len(), 1);
    }

    #[test]
    fn wire_format_uses_risk_level_and_date() {
        let (dir, mut store) = temp_store();
        store.record(RiskLevel::Low).unwrap();
        let content = std::fs::read_to_string(dir.path().join("history.json")).unwrap();
        assert!(content.contains("\"riskLevel\""));
        assert!(content.contains("\"date\""));
    }

    #[test]
    fn memory_store_obeys_cap() {
        let mut store = MemoryHistoryStore::default();
        for _ in 0..5 {
            store.record(RiskLevel::Medium).unwrap();
        }
        assert_eq!(store.read().len(), MAX_HISTORY_ENTRIES);
    }
}
