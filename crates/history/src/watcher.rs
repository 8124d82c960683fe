//! Clipboard change detection.
//!
//! Host notifications re-arm a trailing-edge [`Debouncer`]; when it expires
//! the service reads text and image independently and hands each result to
//! [`ChangeWatcher::on_read`], in whatever order the reads complete. Each
//! path keeps its own last-seen value so a host that repeats notifications
//! for an unchanged clipboard does not re-add anything.

use crate::store::HistoryStore;
use anyhow::Result;
use clipshelf_core::config::WatcherConfig;
use clipshelf_core::payload;
use clipshelf_core::{EntryId, EntryKind};
use std::time::Duration;
use tokio::time::Instant;

/// Single pending deadline; arming again replaces it.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, deadline: None }
    }

    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarms and returns true once the quiet period has elapsed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Outcome of one clipboard read within a capture pass.
#[derive(Debug)]
pub enum ClipboardRead {
    Text(Result<Option<String>>),
    /// Raw image bytes as delivered by the port
    Image(Result<Option<Vec<u8>>>),
}

pub struct ChangeWatcher {
    debouncer: Debouncer,
    capture_images: bool,
    last_text: Option<String>,
    last_image: Option<String>,
    passes: u64,
}

impl ChangeWatcher {
    pub fn new(config: &WatcherConfig) -> Self {
        Self {
            debouncer: Debouncer::new(config.debounce()),
            capture_images: config.capture_images,
            last_text: None,
            last_image: None,
            passes: 0,
        }
    }

    pub fn on_change(&mut self, now: Instant) {
        self.debouncer.arm(now);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// True when a capture pass should run now.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        let due = self.debouncer.fire_if_due(now);
        if due {
            self.passes += 1;
        }
        due
    }

    pub fn cancel(&mut self) {
        self.debouncer.cancel();
    }

    pub fn captures_images(&self) -> bool {
        self.capture_images
    }

    /// Capture passes started so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Accepts text that is non-blank and differs from the last accepted text.
    pub fn accept_text(&mut self, text: &str) -> bool {
        if text.trim().is_empty() || self.last_text.as_deref() == Some(text) {
            return false;
        }
        self.last_text = Some(text.to_string());
        true
    }

    /// Converts raw image bytes to the stored representation, or `None` when
    /// the payload is empty, undecodable, or the same as the last one.
    pub fn accept_image(&mut self, raw: &[u8]) -> Option<String> {
        if raw.is_empty() {
            return None;
        }
        let content = match payload::encode_png_data_url(raw) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Ignoring clipboard image: {:#}", e);
                return None;
            }
        };
        if self.last_image.as_deref() == Some(content.as_str()) {
            return None;
        }
        self.last_image = Some(content.clone());
        Some(content)
    }

    /// Gates one read result and forwards an accepted candidate to the store.
    pub fn on_read(&mut self, read: ClipboardRead, store: &mut HistoryStore) -> Option<EntryId> {
        match read {
            ClipboardRead::Text(Ok(Some(text))) => {
                if !self.accept_text(&text) {
                    return None;
                }
                Some(store.add(text, EntryKind::Text))
            }
            ClipboardRead::Image(Ok(Some(raw))) => {
                let content = self.accept_image(&raw)?;
                Some(store.add(content, EntryKind::Image))
            }
            ClipboardRead::Text(Ok(None)) | ClipboardRead::Image(Ok(None)) => None,
            ClipboardRead::Text(Err(e)) => {
                tracing::warn!("Clipboard text read failed: {:#}", e);
                None
            }
            ClipboardRead::Image(Err(e)) => {
                tracing::warn!("Clipboard image read failed: {:#}", e);
                None
            }
        }
    }
}
