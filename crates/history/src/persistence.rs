//! On-disk history: a JSON array of entries, most recent first.
//!
//! ```json
//! [{"content":"hello","isText":true,"timestamp":1700000000000,"isFavorite":false}]
//! ```
//!
//! Every save rewrites the whole file through a sibling temp file and a
//! rename, so a crash mid-write leaves the previous history intact.

use anyhow::{Context, Result};
use clipshelf_core::{ClipboardEntry, EntryId, EntryKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    content: String,
    is_text: bool,
    timestamp: u64,
    #[serde(default)]
    is_favorite: bool,
}

impl From<&ClipboardEntry> for StoredEntry {
    fn from(entry: &ClipboardEntry) -> Self {
        Self {
            content: entry.content.clone(),
            is_text: entry.is_text(),
            timestamp: entry.created_at,
            is_favorite: entry.favorite,
        }
    }
}

impl StoredEntry {
    fn into_entry(self, id: EntryId) -> ClipboardEntry {
        ClipboardEntry {
            id,
            kind: if self.is_text { EntryKind::Text } else { EntryKind::Image },
            content: self.content,
            created_at: self.timestamp,
            favorite: self.is_favorite,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries in file order, with ids `1..=n`. A missing file is an empty
    /// history; read or parse failures are returned as errors.
    pub fn try_load(&self) -> Result<Vec<ClipboardEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read history file {}", self.path.display()))?;
        let stored: Vec<StoredEntry> = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse history file {}", self.path.display()))?;

        Ok(stored
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.into_entry(EntryId(i as u64 + 1)))
            .collect())
    }

    /// Like [`try_load`](Self::try_load), but a damaged file yields an empty
    /// history. The whole file is discarded; no partial recovery.
    pub fn load(&self) -> Vec<ClipboardEntry> {
        match self.try_load() {
            Ok(entries) => {
                tracing::debug!("Loaded {} history entries from {}", entries.len(), self.path.display());
                entries
            }
            Err(e) => {
                tracing::error!("Discarding clipboard history: {:#}", e);
                Vec::new()
            }
        }
    }

    pub fn try_save(&self, entries: &[ClipboardEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let stored: Vec<StoredEntry> = entries.iter().map(StoredEntry::from).collect();
        let payload = serde_json::to_string(&stored).context("Failed to serialize history")?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, payload.as_bytes())
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to move history into place at {}", self.path.display()))?;
        Ok(())
    }

    /// Returns whether the write succeeded. Failures are logged only; the
    /// in-memory history stays authoritative.
    pub fn save(&self, entries: &[ClipboardEntry]) -> bool {
        match self.try_save(entries) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to save clipboard history: {:#}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(id: u64, kind: EntryKind, content: &str, favorite: bool) -> ClipboardEntry {
        ClipboardEntry {
            id: EntryId(id),
            kind,
            content: content.to_string(),
            created_at: 1_700_000_000_000 + id,
            favorite,
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let file = HistoryFile::new(dir.path().join("clipboard-history.json"));
        let entries = vec![
            entry(1, EntryKind::Text, "newest", false),
            entry(2, EntryKind::Image, "data:image/png;base64,AAAA", true),
            entry(3, EntryKind::Text, "oldest", true),
        ];

        assert!(file.save(&entries));
        assert_eq!(file.load(), entries);
    }

    #[test]
    fn missing_file_is_empty_history() {
        let dir = TempDir::new().unwrap();
        let file = HistoryFile::new(dir.path().join("absent.json"));
        assert!(file.try_load().unwrap().is_empty());
        assert!(file.load().is_empty());
    }

    #[test]
    fn corrupt_file_is_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clipboard-history.json");
        fs::write(&path, "[{\"content\": \"half").unwrap();

        let file = HistoryFile::new(&path);
        assert!(file.try_load().is_err());
        assert!(file.load().is_empty());
    }

    #[test]
    fn wrong_shape_is_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clipboard-history.json");
        fs::write(&path, r#"{"content":"not an array"}"#).unwrap();
        assert!(HistoryFile::new(&path).load().is_empty());
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("clipboard-history.json");
        let file = HistoryFile::new(&path);

        assert!(file.save(&[entry(1, EntryKind::Text, "x", false)]));
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn file_uses_camel_case_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clipboard-history.json");
        HistoryFile::new(&path).save(&[entry(7, EntryKind::Text, "hi", true)]);

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!([{
                "content": "hi",
                "isText": true,
                "timestamp": 1_700_000_000_007u64,
                "isFavorite": true
            }])
        );
    }

    #[test]
    fn missing_favorite_flag_defaults_to_false() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clipboard-history.json");
        fs::write(&path, r#"[{"content":"old","isText":true,"timestamp":5}]"#).unwrap();

        let loaded = HistoryFile::new(&path).load();
        assert_eq!(loaded.len(), 1);
        assert!(!loaded[0].favorite);
        assert_eq!(loaded[0].id, EntryId(1));
    }

    #[test]
    fn save_replaces_previous_content() {
        let dir = TempDir::new().unwrap();
        let file = HistoryFile::new(dir.path().join("clipboard-history.json"));
        file.save(&[entry(1, EntryKind::Text, "a", false), entry(2, EntryKind::Text, "b", false)]);
        file.save(&[entry(1, EntryKind::Text, "c", false)]);

        let loaded = file.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].content, "c");
    }

    #[test]
    fn unwritable_target_reports_failure() {
        let dir = TempDir::new().unwrap();
        // Parent "directory" is a regular file
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let file = HistoryFile::new(blocker.join("clipboard-history.json"));
        assert!(!file.save(&[entry(1, EntryKind::Text, "a", false)]));
    }
}
