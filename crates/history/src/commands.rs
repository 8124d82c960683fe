use crate::store::HistoryView;
use clipshelf_core::EntryId;
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum HistoryCommand {
    /// Put the entry on the clipboard, then auto-paste if configured.
    Paste(EntryId),
    /// Put the entry on the clipboard only.
    Copy(EntryId),
    ToggleFavorite(EntryId),
    Remove(EntryId),
    ClearHistory,
    ClearAll,
    List(oneshot::Sender<HistoryView>),
    Shutdown,
}
