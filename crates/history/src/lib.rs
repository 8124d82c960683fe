pub mod events;
pub mod commands;
pub mod logging;
pub mod persistence;
pub mod store;
pub mod watcher;
pub mod paste;
pub mod service;

pub use events::{HistoryEvent, LogLevel};
pub use commands::HistoryCommand;
pub use persistence::HistoryFile;
pub use store::{HistoryStore, HistoryView};
pub use watcher::{ChangeWatcher, ClipboardRead, Debouncer};
pub use paste::PasteEngine;
pub use service::{run_history_service, HistoryService};
