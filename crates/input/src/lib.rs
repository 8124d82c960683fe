pub mod traits;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "macos")]
pub mod macos;

pub use traits::*;

/// Virtual keyboard for this host, or `None` when the host offers no way to
/// synthesize key events (or the process lacks permission to).
pub fn default_sink() -> Option<Box<dyn InputSink>> {
    #[cfg(target_os = "windows")]
    {
        Some(Box::new(windows::WindowsInputSink::new()))
    }
    #[cfg(target_os = "macos")]
    {
        if !macos::permissions::check_accessibility_trusted() {
            tracing::warn!("{}", macos::permissions::ACCESSIBILITY_GUIDANCE);
            return None;
        }
        Some(Box::new(macos::MacosInputSink::new()))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        None
    }
}
