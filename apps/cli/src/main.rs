use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use clipshelf_clipboard::{ClipboardPort, SystemClipboard};
use clipshelf_core::config::{AppConfig, CLIPBOARD_SAVE_TIMEOUT_MS, MAX_HISTORY_ITEMS};
use clipshelf_core::EntryId;
use clipshelf_history::{
    run_history_service, HistoryCommand, HistoryEvent, HistoryFile, HistoryService, HistoryStore,
    HistoryView, PasteEngine,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Clipboard history with favorites and paste-back", long_about = None)]
struct Cli {
    /// History file (defaults to the per-user data directory)
    #[arg(long, global = true)]
    history_file: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = MAX_HISTORY_ITEMS)]
    max_items: usize,
    /// Also write a daily rolling log file into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the clipboard and accept commands on stdin
    Watch {
        #[arg(long, default_value_t = CLIPBOARD_SAVE_TIMEOUT_MS)]
        debounce_ms: u64,
        #[arg(long)]
        no_auto_paste: bool,
        /// Record text only
        #[arg(long)]
        no_images: bool,
    },
    /// Print favorites and history
    List,
    /// Put an entry back on the clipboard and paste it
    Paste {
        id: u64,
        #[arg(long)]
        no_auto_paste: bool,
    },
    /// Toggle the favorite flag of an entry
    Favorite { id: u64 },
    /// Delete a single entry
    Remove { id: u64 },
    /// Delete all non-favorite entries
    Clear,
    /// Delete everything, favorites included
    ClearAll,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.log_dir.as_deref());

    let mut config = AppConfig::default();
    config.history.max_items = cli.max_items;
    if let Some(path) = cli.history_file {
        config.history.storage_path = path;
    }

    match cli.command {
        Commands::Watch {
            debounce_ms,
            no_auto_paste,
            no_images,
        } => {
            config.watcher.debounce_ms = debounce_ms;
            config.watcher.capture_images = !no_images;
            config.paste.auto_paste = !no_auto_paste;
            run_watch(config).await
        }
        Commands::List => {
            print_view(&open_store(&config).list());
            Ok(())
        }
        Commands::Paste { id, no_auto_paste } => {
            config.paste.auto_paste = !no_auto_paste;
            run_paste(config, EntryId(id)).await
        }
        Commands::Favorite { id } => {
            let mut store = open_store(&config);
            let favorite = store
                .toggle_favorite(EntryId(id))
                .ok_or_else(|| anyhow!("No clipboard entry with id {}", id))?;
            println!("Entry {} is {}", id, if favorite { "a favorite" } else { "no longer a favorite" });
            Ok(())
        }
        Commands::Remove { id } => {
            let mut store = open_store(&config);
            store
                .remove(EntryId(id))
                .ok_or_else(|| anyhow!("No clipboard entry with id {}", id))?;
            println!("Removed entry {}", id);
            Ok(())
        }
        Commands::Clear => {
            let mut store = open_store(&config);
            store.clear_history();
            println!("Cleared history, kept {} favorites", store.len());
            Ok(())
        }
        Commands::ClearAll => {
            open_store(&config).clear_all();
            println!("Cleared all entries");
            Ok(())
        }
    }
}

fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "clipshelf.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

fn open_store(config: &AppConfig) -> HistoryStore {
    HistoryStore::open(HistoryFile::new(&config.history.storage_path), config.history.max_items)
}

fn print_view(view: &HistoryView) {
    if view.is_empty() {
        println!("Clipboard history is empty");
        return;
    }
    if !view.favorites.is_empty() {
        println!("Favorites");
        for entry in &view.favorites {
            println!("  {:>4}  {}", entry.id, entry.preview());
        }
    }
    if !view.history.is_empty() {
        println!("History");
        for entry in &view.history {
            println!("  {:>4}  {}", entry.id, entry.preview());
        }
    }
}

async fn run_paste(config: AppConfig, id: EntryId) -> Result<()> {
    let store = open_store(&config);
    let entry = store
        .get(id)
        .cloned()
        .ok_or_else(|| anyhow!("No clipboard entry with id {}", id))?;

    let clipboard = SystemClipboard::new();
    let mut paste = PasteEngine::new(clipshelf_input::default_sink(), config.paste.clone());
    if !paste.restore(&clipboard, &entry, Instant::now()) {
        bail!("Failed to restore entry {}", id);
    }

    if let Some(deadline) = paste.pending_deadline() {
        tokio::time::sleep_until(deadline).await;
        if paste.fire_if_due(Instant::now()) && paste.inject_paste_gesture() {
            info!("Pasted entry {}", id);
        }
    }
    Ok(())
}

async fn run_watch(config: AppConfig) -> Result<()> {
    let clipboard: Arc<dyn ClipboardPort> = Arc::new(SystemClipboard::new());
    let service = HistoryService::open(&config, clipboard, clipshelf_input::default_sink());
    if service.paste.auto_paste() && !service.paste.has_input() {
        warn!("No virtual keyboard on this host; entries will be restored without pasting");
    }

    let (event_tx, mut event_rx) = mpsc::channel(100);
    let (cmd_tx, cmd_rx) = mpsc::channel(32);

    let service_task = tokio::spawn(run_history_service(service, cmd_rx, event_tx));

    let ctrl_c_tx = cmd_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, saving history");
            let _ = ctrl_c_tx.send(HistoryCommand::Shutdown).await;
        }
    });

    tokio::spawn(read_stdin_commands(cmd_tx));

    println!("Commands: list, paste <id>, copy <id>, fav <id>, rm <id>, clear, clear-all, quit");

    // Log events are already written by the tracing subscriber
    while let Some(event) = event_rx.recv().await {
        match event {
            HistoryEvent::Updated(view) => print_view(&view),
            HistoryEvent::Restored(id) => println!("Restored entry {}", id),
            HistoryEvent::Stopped => break,
            HistoryEvent::Log { .. } | HistoryEvent::Captured { .. } | HistoryEvent::PasteInjected => {}
        }
    }

    service_task.await.context("History service task panicked")?
}

async fn read_stdin_commands(cmd_tx: mpsc::Sender<HistoryCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            // Stdin closed: keep watching until Ctrl+C
            Ok(None) => return,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                return;
            }
        };

        let cmd = match parse_line(&line) {
            Ok(Some(ReplCommand::List)) => {
                let (reply_tx, reply_rx) = oneshot::channel();
                if cmd_tx.send(HistoryCommand::List(reply_tx)).await.is_err() {
                    return;
                }
                if let Ok(view) = reply_rx.await {
                    print_view(&view);
                }
                continue;
            }
            Ok(Some(ReplCommand::Send(cmd))) => cmd,
            Ok(None) => continue,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        let quit = matches!(cmd, HistoryCommand::Shutdown);
        if cmd_tx.send(cmd).await.is_err() || quit {
            return;
        }
    }
}

enum ReplCommand {
    List,
    Send(HistoryCommand),
}

fn parse_line(line: &str) -> Result<Option<ReplCommand>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let mut id = || -> Result<EntryId> {
        let raw = words.next().ok_or_else(|| anyhow!("'{}' needs an entry id", verb))?;
        let value = raw.parse::<u64>().with_context(|| format!("Invalid entry id '{}'", raw))?;
        Ok(EntryId(value))
    };

    let cmd = match verb {
        "list" | "ls" => return Ok(Some(ReplCommand::List)),
        "paste" | "p" => HistoryCommand::Paste(id()?),
        "copy" | "c" => HistoryCommand::Copy(id()?),
        "fav" | "favorite" | "f" => HistoryCommand::ToggleFavorite(id()?),
        "rm" | "remove" => HistoryCommand::Remove(id()?),
        "clear" => HistoryCommand::ClearHistory,
        "clear-all" => HistoryCommand::ClearAll,
        "quit" | "exit" | "q" => HistoryCommand::Shutdown,
        other => bail!("Unknown command '{}'", other),
    };
    Ok(Some(ReplCommand::Send(cmd)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sent(line: &str) -> HistoryCommand {
        match parse_line(line).unwrap() {
            Some(ReplCommand::Send(cmd)) => cmd,
            _ => panic!("expected a command for {:?}", line),
        }
    }

    #[test]
    fn parses_commands_with_ids() {
        assert!(matches!(sent("paste 3"), HistoryCommand::Paste(EntryId(3))));
        assert!(matches!(sent("  fav 12 "), HistoryCommand::ToggleFavorite(EntryId(12))));
        assert!(matches!(sent("rm 1"), HistoryCommand::Remove(EntryId(1))));
        assert!(matches!(sent("clear-all"), HistoryCommand::ClearAll));
        assert!(matches!(sent("q"), HistoryCommand::Shutdown));
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert!(parse_line("   ").unwrap().is_none());
    }

    #[test]
    fn list_is_handled_locally() {
        assert!(matches!(parse_line("ls").unwrap(), Some(ReplCommand::List)));
    }

    #[test]
    fn bad_input_is_an_error() {
        assert!(parse_line("paste").is_err());
        assert!(parse_line("paste abc").is_err());
        assert!(parse_line("frobnicate").is_err());
    }
}
