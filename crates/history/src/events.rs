use crate::store::HistoryView;
use clipshelf_core::{EntryId, EntryKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub enum HistoryEvent {
    Log { level: LogLevel, message: String },
    /// Sent after every change to the stored entries, and once at startup.
    Updated(HistoryView),
    Captured { id: EntryId, kind: EntryKind },
    Restored(EntryId),
    PasteInjected,
    Stopped,
}
