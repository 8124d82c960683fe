use crate::input::Key;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const MAX_HISTORY_ITEMS: usize = 50;
pub const CLIPBOARD_SAVE_TIMEOUT_MS: u64 = 500;
pub const PASTE_DELAY_MS: u64 = 100;
pub const APP_NAMESPACE: &str = "clipshelf";
pub const HISTORY_STORAGE_FILE: &str = "clipboard-history.json";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub history: HistoryConfig,
    pub watcher: WatcherConfig,
    pub paste: PasteConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HistoryConfig {
    /// Cap on stored entries, favorites included. Favorites are never
    /// evicted, so the cap only bites on plain history.
    pub max_items: usize,
    pub storage_path: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_items: MAX_HISTORY_ITEMS,
            storage_path: default_storage_path(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatcherConfig {
    pub debounce_ms: u64,
    pub capture_images: bool,
}

impl WatcherConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: CLIPBOARD_SAVE_TIMEOUT_MS,
            capture_images: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PasteConfig {
    pub auto_paste: bool,
    pub delay_ms: u64,
    pub modifier: Key,
}

impl PasteConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            auto_paste: true,
            delay_ms: PASTE_DELAY_MS,
            modifier: if cfg!(target_os = "macos") { Key::Command } else { Key::Control },
        }
    }
}

/// `<user-data-dir>/clipshelf/clipboard-history.json`, falling back to the
/// working directory when the platform reports no home.
pub fn default_storage_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(APP_NAMESPACE).join(HISTORY_STORAGE_FILE)
}
