use anyhow::{Context, Result};
use clipshelf_clipboard::ClipboardPort;
use clipshelf_core::config::PasteConfig;
use clipshelf_core::{paste_gesture, payload, ClipboardEntry, EntryKind, KeyEvent};
use clipshelf_input::InputSink;
use tokio::time::Instant;

/// Puts a stored entry back on the clipboard and, after a short delay,
/// types the paste shortcut into the focused window.
///
/// The two halves are separate calls: [`set_clipboard`](Self::set_clipboard)
/// and [`inject_paste_gesture`](Self::inject_paste_gesture). [`restore`](Self::restore)
/// does the first and schedules the second; the caller's loop fires it.
pub struct PasteEngine {
    sink: Option<Box<dyn InputSink>>,
    config: PasteConfig,
    pending: Option<Instant>,
    warned_missing_sink: bool,
}

impl PasteEngine {
    pub fn new(sink: Option<Box<dyn InputSink>>, config: PasteConfig) -> Self {
        Self {
            sink,
            config,
            pending: None,
            warned_missing_sink: false,
        }
    }

    pub fn has_input(&self) -> bool {
        self.sink.is_some()
    }

    pub fn auto_paste(&self) -> bool {
        self.config.auto_paste
    }

    pub fn try_set_clipboard(&self, port: &dyn ClipboardPort, entry: &ClipboardEntry) -> Result<()> {
        match entry.kind {
            EntryKind::Text => {
                port.write_text(&entry.content).context("Failed to set clipboard text")?;
                if let Err(e) = port.write_primary_text(&entry.content) {
                    tracing::warn!("Failed to set primary selection: {:#}", e);
                }
            }
            EntryKind::Image => {
                // Decode fully before touching the clipboard
                let png = payload::decode_png_data_url(&entry.content)?;
                port.write_image(&png).context("Failed to set clipboard image")?;
            }
        }
        Ok(())
    }

    /// Returns false when the entry could not be written; the clipboard is
    /// left as it was.
    pub fn set_clipboard(&self, port: &dyn ClipboardPort, entry: &ClipboardEntry) -> bool {
        match self.try_set_clipboard(port, entry) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to restore entry {}: {:#}", entry.id, e);
                false
            }
        }
    }

    /// Best effort; a host without virtual input is reported once and then
    /// skipped silently.
    pub fn inject_paste_gesture(&mut self) -> bool {
        let Some(sink) = &self.sink else {
            if !self.warned_missing_sink {
                self.warned_missing_sink = true;
                tracing::warn!("No virtual keyboard available; auto-paste skipped");
            }
            return false;
        };

        let modifier = self.config.modifier;
        for event in paste_gesture(modifier) {
            if let Err(e) = sink.inject_key(event) {
                tracing::error!("Failed to inject {:?}: {:#}", event, e);
                let _ = sink.inject_key(KeyEvent::up(modifier));
                return false;
            }
        }
        true
    }

    /// Sets the clipboard and, when auto-paste is on, schedules the gesture
    /// `delay` after `now`. Nothing is scheduled if the clipboard write failed.
    pub fn restore(&mut self, port: &dyn ClipboardPort, entry: &ClipboardEntry, now: Instant) -> bool {
        if !self.set_clipboard(port, entry) {
            return false;
        }
        if self.config.auto_paste {
            self.pending = Some(now + self.config.delay());
        }
        true
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending
    }

    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(deadline) if deadline <= now => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
