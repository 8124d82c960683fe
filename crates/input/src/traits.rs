use anyhow::Result;
use clipshelf_core::KeyEvent;

pub trait InputSink: Send + Sync {
    /// Inject a synthetic key press or release into the focused application.
    fn inject_key(&self, event: KeyEvent) -> Result<()>;
}
