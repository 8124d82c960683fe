use anyhow::Result;

/// Narrow view of the host clipboard. Everything above this trait is
/// host-agnostic and can be driven by [`crate::MemoryClipboard`] in tests.
pub trait ClipboardPort: Send + Sync {
    /// `Ok(None)` when the clipboard holds no text representation.
    fn read_text(&self) -> Result<Option<String>>;
    /// Returns PNG bytes, `Ok(None)` when no image is on the clipboard.
    fn read_image(&self) -> Result<Option<Vec<u8>>>;
    fn write_text(&self, text: &str) -> Result<()>;
    /// Hosts without a primary selection ignore this.
    fn write_primary_text(&self, _text: &str) -> Result<()> {
        Ok(())
    }
    fn write_image(&self, png_data: &[u8]) -> Result<()>;

    // Callback is invoked when the clipboard selection changes
    fn start_listener(&self, callback: Box<dyn Fn() + Send + Sync>) -> Result<ListenerHandle>;
}

/// Keeps a change listener alive; dropping it unsubscribes.
pub struct ListenerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}
