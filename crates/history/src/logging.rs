//! Log records for the history loop go to two places: the `tracing`
//! subscriber, and the presentation channel as [`HistoryEvent::Log`].
//! Debug records are diagnostics for the log file only; the presentation
//! layer sees `Info` and above.

use crate::events::{HistoryEvent, LogLevel};
use tokio::sync::mpsc::Sender;

impl LogLevel {
    /// Whether records at this level are forwarded to the presentation layer.
    pub fn is_user_facing(self) -> bool {
        self != LogLevel::Debug
    }
}

pub async fn emit_log(tx: &Sender<HistoryEvent>, level: LogLevel, message: String) {
    match level {
        LogLevel::Debug => tracing::debug!(target: "clipshelf::history", "{}", message),
        LogLevel::Info => tracing::info!(target: "clipshelf::history", "{}", message),
        LogLevel::Warn => tracing::warn!(target: "clipshelf::history", "{}", message),
        LogLevel::Error => tracing::error!(target: "clipshelf::history", "{}", message),
    }

    if level.is_user_facing() {
        let _ = tx.send(HistoryEvent::Log { level, message }).await;
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! history_log {
    ($tx:expr, $level:ident, $($arg:tt)*) => {
        $crate::logging::emit_log($tx, $crate::events::LogLevel::$level, format!($($arg)*)).await
    };
}

#[macro_export]
macro_rules! log_info {
    ($tx:expr, $($arg:tt)*) => { $crate::history_log!($tx, Info, $($arg)*) };
}

#[macro_export]
macro_rules! log_error {
    ($tx:expr, $($arg:tt)*) => { $crate::history_log!($tx, Error, $($arg)*) };
}

#[macro_export]
macro_rules! log_debug {
    ($tx:expr, $($arg:tt)*) => { $crate::history_log!($tx, Debug, $($arg)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($tx:expr, $($arg:tt)*) => { $crate::history_log!($tx, Warn, $($arg)*) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn debug_stays_out_of_presentation_channel() {
        let (tx, mut rx) = mpsc::channel(8);
        crate::log_debug!(&tx, "evicted {}", 3);
        crate::log_warn!(&tx, "no entry {}", 7);
        drop(tx);

        let mut forwarded = Vec::new();
        while let Some(event) = rx.recv().await {
            if let HistoryEvent::Log { level, message } = event {
                forwarded.push((level, message));
            }
        }
        assert_eq!(forwarded, vec![(LogLevel::Warn, "no entry 7".to_string())]);
    }

    #[tokio::test]
    async fn closed_channel_is_ignored() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        crate::log_error!(&tx, "nobody listening");
    }
}
