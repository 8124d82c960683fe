use crate::fingerprint::ContentFingerprint;
use crate::payload;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

const PREVIEW_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Text,
    /// PNG stored as a `data:image/png;base64,` string
    Image,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Text => f.write_str("text"),
            EntryKind::Image => f.write_str("image"),
        }
    }
}

/// Handle used by the presentation layer to address a stored entry.
/// Ids are assigned by the store and are not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardEntry {
    pub id: EntryId,
    pub kind: EntryKind,
    pub content: String,
    /// Milliseconds since the Unix epoch at capture time
    pub created_at: u64,
    pub favorite: bool,
}

impl ClipboardEntry {
    pub fn new(id: EntryId, kind: EntryKind, content: String) -> Self {
        Self {
            id,
            kind,
            content,
            created_at: now_millis(),
            favorite: false,
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind == EntryKind::Text
    }

    pub fn fingerprint(&self) -> ContentFingerprint {
        ContentFingerprint::of(self.kind, &self.content)
    }

    /// Identity check used for deduplication. Timestamp and favorite flag
    /// do not take part in it.
    pub fn same_content(&self, kind: EntryKind, content: &str) -> bool {
        self.kind == kind && self.content == content
    }

    /// Single-line label for menus and listings.
    pub fn preview(&self) -> String {
        match self.kind {
            EntryKind::Text => {
                let trimmed = self.content.trim();
                let shown = if trimmed.chars().count() > PREVIEW_MAX_CHARS {
                    let mut s: String = trimmed.chars().take(PREVIEW_MAX_CHARS - 3).collect();
                    s.push_str("...");
                    s
                } else {
                    trimmed.to_string()
                };
                shown.replace(['\r', '\n'], " ")
            }
            EntryKind::Image => match payload::image_dimensions(&self.content) {
                Some((w, h)) => format!("[image {}x{}]", w, h),
                None => "[image]".to_string(),
            },
        }
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
