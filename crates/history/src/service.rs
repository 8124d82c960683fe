use crate::commands::HistoryCommand;
use crate::events::HistoryEvent;
use crate::paste::PasteEngine;
use crate::persistence::HistoryFile;
use crate::store::HistoryStore;
use crate::watcher::{ChangeWatcher, ClipboardRead};
use crate::{log_debug, log_error, log_info, log_warn};
use anyhow::{anyhow, Result};
use clipshelf_clipboard::ClipboardPort;
use clipshelf_core::config::AppConfig;
use clipshelf_core::{EntryId, EntryKind};
use clipshelf_input::InputSink;
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::time::Instant;

/// Everything the event loop owns. Built once, then moved into
/// [`run_history_service`].
pub struct HistoryService {
    pub store: HistoryStore,
    pub watcher: ChangeWatcher,
    pub paste: PasteEngine,
    pub clipboard: Arc<dyn ClipboardPort>,
}

impl HistoryService {
    pub fn new(
        store: HistoryStore,
        watcher: ChangeWatcher,
        paste: PasteEngine,
        clipboard: Arc<dyn ClipboardPort>,
    ) -> Self {
        Self {
            store,
            watcher,
            paste,
            clipboard,
        }
    }

    /// Opens the configured history file and wires the components together.
    pub fn open(
        config: &AppConfig,
        clipboard: Arc<dyn ClipboardPort>,
        sink: Option<Box<dyn InputSink>>,
    ) -> Self {
        let store = HistoryStore::open(
            HistoryFile::new(&config.history.storage_path),
            config.history.max_items,
        );
        Self::new(
            store,
            ChangeWatcher::new(&config.watcher),
            PasteEngine::new(sink, config.paste.clone()),
            clipboard,
        )
    }

    async fn capture_pass(&mut self, event_tx: &Sender<HistoryEvent>) {
        let mut reads = FuturesUnordered::new();
        reads.push(read_clipboard(self.clipboard.clone(), EntryKind::Text));
        if self.watcher.captures_images() {
            reads.push(read_clipboard(self.clipboard.clone(), EntryKind::Image));
        }

        // Results are handled in completion order
        let mut changed = false;
        while let Some(read) = reads.next().await {
            if let Some(id) = self.watcher.on_read(read, &mut self.store) {
                changed = true;
                if let Some(entry) = self.store.get(id) {
                    let kind = entry.kind;
                    log_debug!(event_tx, "Captured {} entry {}", kind, id);
                    let _ = event_tx.send(HistoryEvent::Captured { id, kind }).await;
                }
            }
        }

        if changed {
            let _ = event_tx.send(HistoryEvent::Updated(self.store.list())).await;
        }
    }

    async fn restore_entry(&mut self, id: EntryId, auto_paste: bool, event_tx: &Sender<HistoryEvent>) {
        let Some(entry) = self.store.get(id).cloned() else {
            log_warn!(event_tx, "No clipboard entry with id {}", id);
            return;
        };
        let restored = if auto_paste {
            self.paste.restore(self.clipboard.as_ref(), &entry, Instant::now())
        } else {
            self.paste.set_clipboard(self.clipboard.as_ref(), &entry)
        };
        if restored {
            log_info!(event_tx, "Restored entry {} to the clipboard", id);
            let _ = event_tx.send(HistoryEvent::Restored(id)).await;
        }
    }

    async fn handle_command(&mut self, cmd: HistoryCommand, event_tx: &Sender<HistoryEvent>) {
        match cmd {
            HistoryCommand::Paste(id) => self.restore_entry(id, true, event_tx).await,
            HistoryCommand::Copy(id) => self.restore_entry(id, false, event_tx).await,
            HistoryCommand::ToggleFavorite(id) => match self.store.toggle_favorite(id) {
                Some(favorite) => {
                    log_debug!(event_tx, "Entry {} favorite = {}", id, favorite);
                    let _ = event_tx.send(HistoryEvent::Updated(self.store.list())).await;
                }
                None => log_debug!(event_tx, "Ignoring favorite toggle for unknown entry {}", id),
            },
            HistoryCommand::Remove(id) => {
                if self.store.remove(id).is_some() {
                    let _ = event_tx.send(HistoryEvent::Updated(self.store.list())).await;
                }
            }
            HistoryCommand::ClearHistory => {
                self.store.clear_history();
                log_info!(event_tx, "Cleared history ({} favorites kept)", self.store.len());
                let _ = event_tx.send(HistoryEvent::Updated(self.store.list())).await;
            }
            HistoryCommand::ClearAll => {
                self.store.clear_all();
                log_info!(event_tx, "Cleared history including favorites");
                let _ = event_tx.send(HistoryEvent::Updated(self.store.list())).await;
            }
            HistoryCommand::List(reply) => {
                let _ = reply.send(self.store.list());
            }
            HistoryCommand::Shutdown => {}
        }
    }
}

async fn read_clipboard(port: Arc<dyn ClipboardPort>, kind: EntryKind) -> ClipboardRead {
    let task = tokio::task::spawn_blocking(move || match kind {
        EntryKind::Text => ClipboardRead::Text(port.read_text()),
        EntryKind::Image => ClipboardRead::Image(port.read_image()),
    });
    match task.await {
        Ok(read) => read,
        Err(e) => {
            let err = anyhow!("Clipboard read task failed: {}", e);
            match kind {
                EntryKind::Text => ClipboardRead::Text(Err(err)),
                EntryKind::Image => ClipboardRead::Image(Err(err)),
            }
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Runs the history engine until `Shutdown` arrives or the command channel
/// closes. All store mutations happen on this task; the host listener only
/// posts wake-ups into a channel.
pub async fn run_history_service(
    mut service: HistoryService,
    mut cmd_rx: Receiver<HistoryCommand>,
    event_tx: Sender<HistoryEvent>,
) -> Result<()> {
    let (note_tx, mut note_rx) = mpsc::channel::<()>(64);

    // A full queue means a capture is already pending; dropping the
    // wake-up loses nothing.
    let listener = match service.clipboard.start_listener(Box::new(move || {
        let _ = note_tx.try_send(());
    })) {
        Ok(handle) => Some(handle),
        Err(e) => {
            log_error!(&event_tx, "Failed to start clipboard listener: {}", e);
            None
        }
    };

    log_info!(&event_tx, "Watching clipboard ({} entries loaded)", service.store.len());
    let _ = event_tx.send(HistoryEvent::Updated(service.store.list())).await;

    loop {
        let capture_at = service.watcher.deadline();
        let paste_at = service.paste.pending_deadline();

        tokio::select! {
            biased;

            Some(()) = note_rx.recv() => {
                service.watcher.on_change(Instant::now());
            }

            _ = sleep_until_opt(capture_at) => {
                if service.watcher.fire_if_due(Instant::now()) {
                    service.capture_pass(&event_tx).await;
                }
            }

            _ = sleep_until_opt(paste_at) => {
                if service.paste.fire_if_due(Instant::now()) && service.paste.inject_paste_gesture() {
                    let _ = event_tx.send(HistoryEvent::PasteInjected).await;
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(HistoryCommand::Shutdown) | None => break,
                    Some(cmd) => service.handle_command(cmd, &event_tx).await,
                }
            }
        }
    }

    // Teardown: nothing may fire into the store after this point
    drop(listener);
    service.watcher.cancel();
    service.paste.cancel();
    service.store.close();

    log_info!(&event_tx, "Clipboard history stopped");
    let _ = event_tx.send(HistoryEvent::Stopped).await;
    Ok(())
}
