//! ProcessingLedger: which entries of which archive went into which batch
//!
//! Persisted as pretty-printed JSON, `archive → { entry → batch file }`.
//! Entries that produced no document map to `null`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use rdcorpus_core::write_atomic;

/// Ledger section of one archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchiveLedger {
    entries: BTreeMap<String, Option<String>>,
}

impl ArchiveLedger {
    pub fn is_processed(&self, entry: &str) -> bool {
        self.entries.contains_key(entry)
    }

    /// Mark `entry` as processed, written to `batch` (or to nothing).
    pub fn record(&mut self, entry: impl Into<String>, batch: Option<String>) {
        self.entries.insert(entry.into(), batch);
    }

    pub fn batch_of(&self, entry: &str) -> Option<&str> {
        self.entries.get(entry).and_then(|b| b.as_deref())
    }

    /// Distinct batch files referenced by this archive.
    pub fn batches(&self) -> BTreeSet<&str> {
        self.entries.values().filter_map(|b| b.as_deref()).collect()
    }

    /// Number for the next batch file: one past the distinct batches recorded.
    pub fn next_batch_index(&self) -> usize {
        self.batches().len() + 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Processed entries that produced no document.
    pub fn empty_entries(&self) -> usize {
        self.entries.values().filter(|b| b.is_none()).count()
    }
}

/// Ledger over all archives, loaded once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    archives: BTreeMap<String, ArchiveLedger>,
}

impl Ledger {
    /// Read the ledger at `path`; a missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read ledger {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("failed to parse ledger {}", path.display()))
    }

    /// Rewrite the whole ledger atomically.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let mut json = serde_json::to_string_pretty(self).context("failed to serialize ledger")?;
        json.push('\n');
        write_atomic(path, json.as_bytes())
            .with_context(|| format!("failed to write ledger {}", path.display()))
    }

    /// Copy of one archive's section (empty if the archive is new).
    pub fn archive(&self, name: &str) -> ArchiveLedger {
        self.archives.get(name).cloned().unwrap_or_default()
    }

    pub fn set_archive(&mut self, name: impl Into<String>, section: ArchiveLedger) {
        self.archives.insert(name.into(), section);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArchiveLedger)> {
        self.archives.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_index_counts_distinct_batches() {
        let mut section = ArchiveLedger::default();
        assert_eq!(section.next_batch_index(), 1);

        section.record("a.xml", Some("bet-2018-2021-1.xml".into()));
        section.record("b.xml", Some("bet-2018-2021-1.xml".into()));
        section.record("c.xml", None);
        section.record("d.xml", Some("bet-2018-2021-2.xml".into()));

        assert_eq!(section.next_batch_index(), 3);
        assert_eq!(section.empty_entries(), 1);
        assert!(section.is_processed("c.xml"));
        assert_eq!(section.batch_of("c.xml"), None);
        assert_eq!(section.batch_of("d.xml"), Some("bet-2018-2021-2.xml"));
    }

    #[test]
    fn missing_file_is_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::load(&dir.path().join("processed.json")).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn persisted_json_keeps_nulls_and_non_ascii() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed.json");

        let mut section = ArchiveLedger::default();
        section.record("fråga.xml", Some("Skriftliga+frågor-1990-1997-1.xml".into()));
        section.record("tom.xml", None);
        let mut ledger = Ledger::default();
        ledger.set_archive("Skriftliga+frågor-1990-1997.xml.zip", section);
        ledger.persist(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"fråga.xml\": \"Skriftliga+frågor-1990-1997-1.xml\""));
        assert!(text.contains("\"tom.xml\": null"));

        let back = Ledger::load(&path).unwrap();
        assert_eq!(back, ledger);
    }

    #[test]
    fn corrupt_ledger_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Ledger::load(&path).is_err());
    }

    #[test]
    fn unknown_archive_gives_empty_section() {
        let ledger = Ledger::default();
        assert!(ledger.archive("mot-2018-2021.xml.zip").is_empty());
    }
}
