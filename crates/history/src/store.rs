//! In-memory clipboard history, most recent first.
//!
//! The store is the only owner of the entry list. Every mutation is followed
//! by a full rewrite of the history file when one is attached.
//!
//! # Identity
//! Entries are looked up by [`ContentFingerprint`] through an index kept in
//! step with the list; a hit is confirmed against the stored content before
//! it counts as the same entry.
//!
//! # Capacity
//! After each `add`, the oldest non-favorite entries are dropped until the
//! total (favorites included) is back under `max_items`. Favorites are never
//! evicted; if they alone exceed the cap, the store simply stays over it.

use crate::persistence::HistoryFile;
use clipshelf_core::{now_millis, ClipboardEntry, ContentFingerprint, EntryId, EntryKind};
use std::collections::HashMap;

/// Partitioned listing for the presentation layer. Each section keeps the
/// store's recency order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryView {
    pub favorites: Vec<ClipboardEntry>,
    pub history: Vec<ClipboardEntry>,
}

impl HistoryView {
    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty() && self.history.is_empty()
    }

    pub fn len(&self) -> usize {
        self.favorites.len() + self.history.len()
    }
}

pub struct HistoryStore {
    entries: Vec<ClipboardEntry>,
    index: HashMap<ContentFingerprint, EntryId>,
    max_items: usize,
    next_id: u64,
    file: Option<HistoryFile>,
}

impl HistoryStore {
    /// Empty store without persistence.
    pub fn new(max_items: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            max_items,
            next_id: 1,
            file: None,
        }
    }

    /// Loads the history file and attaches it for subsequent writes.
    ///
    /// A hand-edited or older file may repeat an identity or hold more plain
    /// entries than the cap allows. Repeats collapse into the most recent
    /// copy, which becomes a favorite if any copy was one, and the cap is
    /// applied before the store is used.
    pub fn open(file: HistoryFile, max_items: usize) -> Self {
        let loaded = file.load();
        let loaded_len = loaded.len();
        let next_id = loaded.iter().map(|e| e.id.0).max().unwrap_or(0) + 1;

        let mut store = Self {
            entries: Vec::with_capacity(loaded_len),
            index: HashMap::with_capacity(loaded_len),
            max_items,
            next_id,
            file: Some(file),
        };
        for entry in loaded {
            match store.position(entry.kind, &entry.content, &entry.fingerprint()) {
                Some(index) => {
                    tracing::debug!("Merging repeated {} entry {}", entry.kind, store.entries[index].id);
                    store.entries[index].favorite |= entry.favorite;
                }
                None => store.push_back(entry),
            }
        }
        store.evict();

        if let Some(file) = &store.file {
            tracing::info!("Opened clipboard history at {} ({} entries)", file.path().display(), store.len());
        }
        if store.len() != loaded_len {
            tracing::warn!("Normalised clipboard history from {} to {} entries", loaded_len, store.len());
            store.persist();
        }
        store
    }

    /// Final flush. The store stays usable afterwards.
    pub fn close(&mut self) {
        if self.file.is_some() {
            tracing::debug!("Flushing clipboard history ({} entries)", self.entries.len());
            self.persist();
        }
    }

    /// Records a capture. An entry with the same `(kind, content)` is moved
    /// to the front with a fresh timestamp, keeping its id and favorite flag.
    /// Callers are expected to have rejected empty payloads.
    pub fn add(&mut self, content: String, kind: EntryKind) -> EntryId {
        let fingerprint = ContentFingerprint::of(kind, &content);
        let entry = match self.position(kind, &content, &fingerprint) {
            Some(index) => {
                let mut existing = self.entries.remove(index);
                existing.created_at = now_millis();
                tracing::debug!("Refreshed {} entry {} ({})", kind, existing.id, fingerprint);
                existing
            }
            None => {
                let entry = ClipboardEntry::new(self.allocate_id(), kind, content);
                tracing::debug!("New {} entry {} ({})", kind, entry.id, fingerprint);
                self.index.insert(fingerprint, entry.id);
                entry
            }
        };

        let id = entry.id;
        self.entries.insert(0, entry);
        self.evict();
        self.persist();
        id
    }

    /// Id of the stored entry with this identity, if any.
    pub fn find(&self, kind: EntryKind, content: &str) -> Option<EntryId> {
        let fingerprint = ContentFingerprint::of(kind, content);
        self.position(kind, content, &fingerprint).map(|i| self.entries[i].id)
    }

    /// Flips the favorite flag. Returns the new value, `None` for an unknown id.
    pub fn toggle_favorite(&mut self, id: EntryId) -> Option<bool> {
        let entry = self.entries.iter_mut().find(|e| e.id == id)?;
        entry.favorite = !entry.favorite;
        let favorite = entry.favorite;
        self.persist();
        Some(favorite)
    }

    pub fn remove(&mut self, id: EntryId) -> Option<ClipboardEntry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        let removed = self.entries.remove(index);
        self.unindex(&removed);
        self.persist();
        Some(removed)
    }

    /// Drops every non-favorite entry.
    pub fn clear_history(&mut self) {
        self.entries.retain(|e| e.favorite);
        self.reindex();
        self.persist();
    }

    /// Drops everything, favorites included.
    pub fn clear_all(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.persist();
    }

    pub fn list(&self) -> HistoryView {
        let (favorites, history) = self.entries.iter().cloned().partition(|e| e.favorite);
        HistoryView { favorites, history }
    }

    pub fn get(&self, id: EntryId) -> Option<&ClipboardEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries(&self) -> &[ClipboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn allocate_id(&mut self) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        id
    }

    // Index lookup, confirmed by content. A miss on confirmation falls back
    // to a scan so a digest collision can neither merge nor duplicate entries.
    fn position(&self, kind: EntryKind, content: &str, fingerprint: &ContentFingerprint) -> Option<usize> {
        if let Some(id) = self.index.get(fingerprint) {
            if let Some(i) = self.entries.iter().position(|e| e.id == *id) {
                if self.entries[i].same_content(kind, content) {
                    return Some(i);
                }
            }
        }
        self.entries.iter().position(|e| e.same_content(kind, content))
    }

    fn push_back(&mut self, entry: ClipboardEntry) {
        self.index.insert(entry.fingerprint(), entry.id);
        self.entries.push(entry);
    }

    fn unindex(&mut self, entry: &ClipboardEntry) {
        let fingerprint = entry.fingerprint();
        if self.index.get(&fingerprint) == Some(&entry.id) {
            self.index.remove(&fingerprint);
        }
    }

    fn reindex(&mut self) {
        self.index = self.entries.iter().map(|e| (e.fingerprint(), e.id)).collect();
    }

    // Tail-first scan, skipping favorites
    fn evict(&mut self) {
        if self.entries.len() <= self.max_items {
            return;
        }
        let mut excess = self.entries.len() - self.max_items;
        let mut i = self.entries.len();
        while excess > 0 && i > 0 {
            i -= 1;
            if !self.entries[i].favorite {
                let evicted = self.entries.remove(i);
                tracing::debug!("Evicted entry {} ({})", evicted.id, evicted.fingerprint());
                self.unindex(&evicted);
                excess -= 1;
            }
        }
    }

    fn persist(&self) {
        if let Some(file) = &self.file {
            file.save(&self.entries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn contents(entries: &[ClipboardEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.content.as_str()).collect()
    }

    #[test]
    fn add_inserts_at_front() {
        let mut store = HistoryStore::new(10);
        store.add("a".into(), EntryKind::Text);
        store.add("b".into(), EntryKind::Text);
        assert_eq!(contents(store.entries()), ["b", "a"]);
    }

    #[test]
    fn repeated_capture_is_idempotent() {
        let mut store = HistoryStore::new(10);
        store.add("x".into(), EntryKind::Text);
        let first = store.add("same".into(), EntryKind::Text);
        let second = store.add("same".into(), EntryKind::Text);

        assert_eq!(first, second);
        assert_eq!(contents(store.entries()), ["same", "x"]);
        assert!(!store.entries()[0].favorite);
    }

    #[test]
    fn recapture_moves_to_front_and_keeps_favorite() {
        let mut store = HistoryStore::new(10);
        let id = store.add("fav".into(), EntryKind::Text);
        store.toggle_favorite(id);
        store.add("other".into(), EntryKind::Text);

        let again = store.add("fav".into(), EntryKind::Text);
        assert_eq!(again, id);
        assert_eq!(store.len(), 2);
        assert_eq!(store.entries()[0].content, "fav");
        assert!(store.entries()[0].favorite);
    }

    #[test]
    fn same_content_different_kind_is_distinct() {
        let mut store = HistoryStore::new(10);
        store.add("data:image/png;base64,AA".into(), EntryKind::Text);
        store.add("data:image/png;base64,AA".into(), EntryKind::Image);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn recapture_refreshes_timestamp() {
        let mut store = HistoryStore::new(10);
        let id = store.add("t".into(), EntryKind::Text);
        if let Some(entry) = store.entries.iter_mut().find(|e| e.id == id) {
            entry.created_at = 1;
        }
        store.add("t".into(), EntryKind::Text);
        assert!(store.get(id).unwrap().created_at > 1);
    }

    #[test]
    fn eviction_drops_oldest_plain_entry() {
        let mut store = HistoryStore::new(2);
        for c in ["a", "b", "c"] {
            store.add(c.into(), EntryKind::Text);
        }
        assert_eq!(contents(store.entries()), ["c", "b"]);
    }

    #[test]
    fn eviction_skips_favorites() {
        let mut store = HistoryStore::new(2);
        let f = store.add("f".into(), EntryKind::Text);
        store.toggle_favorite(f);

        store.add("a".into(), EntryKind::Text);
        store.add("b".into(), EntryKind::Text);
        assert_eq!(contents(store.entries()), ["b", "f"]);

        store.add("c".into(), EntryKind::Text);
        assert_eq!(contents(store.entries()), ["c", "f"]);
        assert!(store.get(f).is_some());
    }

    #[test]
    fn favorites_alone_may_exceed_cap() {
        let mut store = HistoryStore::new(3);
        for c in ["f1", "f2", "f3"] {
            let id = store.add(c.into(), EntryKind::Text);
            store.toggle_favorite(id);
        }
        // As if reopened with a smaller cap
        store.max_items = 2;
        assert_eq!(store.len(), 3);

        // A new plain entry is the only evictable one and goes immediately
        store.add("plain".into(), EntryKind::Text);
        assert_eq!(contents(store.entries()), ["f3", "f2", "f1"]);
    }

    #[test]
    fn toggle_unknown_id_is_noop() {
        let mut store = HistoryStore::new(10);
        store.add("a".into(), EntryKind::Text);
        assert_eq!(store.toggle_favorite(EntryId(999)), None);
        assert!(!store.entries()[0].favorite);
    }

    #[test]
    fn toggle_twice_restores_flag() {
        let mut store = HistoryStore::new(10);
        let id = store.add("a".into(), EntryKind::Text);
        assert_eq!(store.toggle_favorite(id), Some(true));
        assert_eq!(store.toggle_favorite(id), Some(false));
    }

    #[test]
    fn list_partitions_and_keeps_order() {
        let mut store = HistoryStore::new(10);
        let ids: Vec<EntryId> = ["a", "b", "c", "d"]
            .iter()
            .map(|c| store.add(c.to_string(), EntryKind::Text))
            .collect();
        store.toggle_favorite(ids[0]);
        store.toggle_favorite(ids[2]);

        let view = store.list();
        assert_eq!(contents(&view.favorites), ["c", "a"]);
        assert_eq!(contents(&view.history), ["d", "b"]);
        assert_eq!(view.len(), 4);
    }

    #[test]
    fn clear_history_keeps_favorites_in_order() {
        let mut store = HistoryStore::new(10);
        for c in ["f1", "x", "f2", "y"] {
            let id = store.add(c.into(), EntryKind::Text);
            if c.starts_with('f') {
                store.toggle_favorite(id);
            }
        }
        store.clear_history();
        assert_eq!(contents(store.entries()), ["f2", "f1"]);
        assert!(store.entries().iter().all(|e| e.favorite));
    }

    #[test]
    fn clear_all_empties_store() {
        let mut store = HistoryStore::new(10);
        let id = store.add("f".into(), EntryKind::Text);
        store.toggle_favorite(id);
        store.add("x".into(), EntryKind::Text);
        store.clear_all();
        assert!(store.is_empty());
        assert!(store.list().is_empty());
    }

    #[test]
    fn remove_drops_single_entry() {
        let mut store = HistoryStore::new(10);
        let a = store.add("a".into(), EntryKind::Text);
        store.add("b".into(), EntryKind::Text);
        assert_eq!(store.remove(a).map(|e| e.content), Some("a".to_string()));
        assert!(store.remove(a).is_none());
        assert_eq!(contents(store.entries()), ["b"]);
    }

    #[test]
    fn ids_stay_unique_after_eviction() {
        let mut store = HistoryStore::new(1);
        let a = store.add("a".into(), EntryKind::Text);
        let b = store.add("b".into(), EntryKind::Text);
        assert_ne!(a, b);
    }

    #[test]
    fn every_mutation_reaches_disk() {
        let dir = TempDir::new().unwrap();
        let file = HistoryFile::new(dir.path().join("clipboard-history.json"));
        let mut store = HistoryStore::open(file.clone(), 10);

        let id = store.add("a".into(), EntryKind::Text);
        assert_eq!(file.load().len(), 1);

        store.toggle_favorite(id);
        assert!(file.load()[0].favorite);

        store.add("b".into(), EntryKind::Text);
        store.clear_history();
        assert_eq!(contents(&file.load()), ["a"]);

        store.clear_all();
        assert!(file.load().is_empty());
    }

    #[test]
    fn reopen_restores_order_and_continues_ids() {
        let dir = TempDir::new().unwrap();
        let file = HistoryFile::new(dir.path().join("clipboard-history.json"));
        {
            let mut store = HistoryStore::open(file.clone(), 10);
            let id = store.add("first".into(), EntryKind::Text);
            store.add("second".into(), EntryKind::Text);
            store.toggle_favorite(id);
            store.close();
        }

        let mut store = HistoryStore::open(file, 10);
        assert_eq!(contents(store.entries()), ["second", "first"]);
        assert!(store.entries()[1].favorite);

        let fresh = store.add("third".into(), EntryKind::Text);
        assert!(store.entries().iter().filter(|e| e.id == fresh).count() == 1);
        assert_eq!(store.len(), 3);
    }

    fn stored(id: u64, content: &str, favorite: bool) -> ClipboardEntry {
        ClipboardEntry {
            id: EntryId(id),
            kind: EntryKind::Text,
            content: content.to_string(),
            created_at: 1_000 - id,
            favorite,
        }
    }

    #[test]
    fn open_merges_repeated_entries_and_applies_cap() {
        let dir = TempDir::new().unwrap();
        let file = HistoryFile::new(dir.path().join("clipboard-history.json"));
        file.save(&[stored(1, "a", false), stored(2, "b", false), stored(3, "a", true)]);

        let mut store = HistoryStore::open(file.clone(), 2);
        assert_eq!(contents(store.entries()), ["a", "b"]);
        assert!(store.entries()[0].favorite);
        assert_eq!(contents(&file.load()), ["a", "b"]);

        store.add("a".into(), EntryKind::Text);
        assert_eq!(contents(store.entries()), ["a", "b"]);
        assert_eq!(store.entries().iter().filter(|e| e.content == "a").count(), 1);
    }

    #[test]
    fn open_evicts_plain_entries_over_cap() {
        let dir = TempDir::new().unwrap();
        let file = HistoryFile::new(dir.path().join("clipboard-history.json"));
        file.save(&[stored(1, "new", false), stored(2, "fav", true), stored(3, "old", false)]);

        let store = HistoryStore::open(file, 2);
        assert_eq!(contents(store.entries()), ["new", "fav"]);
    }

    #[test]
    fn lookup_goes_through_fingerprint_index() {
        let mut store = HistoryStore::new(10);
        let a = store.add("a".into(), EntryKind::Text);
        assert_eq!(store.find(EntryKind::Text, "a"), Some(a));
        assert_eq!(store.index.get(&ContentFingerprint::of(EntryKind::Text, "a")), Some(&a));
        assert_eq!(store.find(EntryKind::Image, "a"), None);

        store.remove(a);
        assert!(store.index.is_empty());
        assert_eq!(store.find(EntryKind::Text, "a"), None);
    }

    #[test]
    fn colliding_fingerprint_is_confirmed_by_content() {
        let mut store = HistoryStore::new(10);
        let a = store.add("a".into(), EntryKind::Text);
        // Pretend "b" hashes to the same digest as an existing entry
        store.index.insert(ContentFingerprint::of(EntryKind::Text, "b"), a);

        let b = store.add("b".into(), EntryKind::Text);
        assert_ne!(a, b);
        assert_eq!(contents(store.entries()), ["b", "a"]);
        assert_eq!(store.find(EntryKind::Text, "a"), Some(a));
    }

    #[test]
    fn index_follows_eviction_and_clearing() {
        let mut store = HistoryStore::new(2);
        let f = store.add("f".into(), EntryKind::Text);
        store.toggle_favorite(f);
        store.add("x".into(), EntryKind::Text);
        store.add("y".into(), EntryKind::Text);
        assert_eq!(store.find(EntryKind::Text, "x"), None);
        assert_eq!(store.index.len(), store.len());

        store.clear_history();
        assert_eq!(store.find(EntryKind::Text, "f"), Some(f));
        assert_eq!(store.index.len(), 1);

        store.clear_all();
        assert!(store.index.is_empty());
    }

    #[test]
    fn failed_writes_do_not_block_mutations() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let mut store = HistoryStore::open(HistoryFile::new(blocker.join("h.json")), 10);

        let id = store.add("a".into(), EntryKind::Text);
        assert_eq!(store.toggle_favorite(id), Some(true));
        assert!(store.entries()[0].favorite);
    }
}
