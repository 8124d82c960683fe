use crate::traits::{ClipboardPort, ListenerHandle};
use anyhow::{anyhow, Result};
use arboard::{Clipboard, ImageData};
use image::ImageOutputFormat;
use std::borrow::Cow;

/// Host clipboard backed by `arboard`, with a platform-specific change listener.
///
/// On X11 and Wayland the clipboard contents live in the owning process, so
/// one `arboard` handle is kept open for the lifetime of this value and what
/// was written stays available to other applications. Other hosts keep the
/// data themselves and get a fresh handle per call.
pub struct SystemClipboard {
    #[cfg(all(unix, not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))))]
    held: std::sync::Mutex<Option<Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self {
            #[cfg(all(unix, not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))))]
            held: std::sync::Mutex::new(None),
        }
    }

    #[cfg(all(unix, not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))))]
    fn with_clipboard<R>(&self, f: impl FnOnce(&mut Clipboard) -> Result<R>) -> Result<R> {
        let mut held = self.held.lock().map_err(|_| anyhow!("Clipboard handle poisoned"))?;
        if held.is_none() {
            *held = Some(open()?);
        }
        let Some(clipboard) = held.as_mut() else {
            return Err(anyhow!("Clipboard unavailable"));
        };
        f(clipboard)
    }

    #[cfg(not(all(unix, not(any(target_os = "macos", target_os = "android", target_os = "emscripten")))))]
    fn with_clipboard<R>(&self, f: impl FnOnce(&mut Clipboard) -> Result<R>) -> Result<R> {
        f(&mut open()?)
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn open() -> Result<Clipboard> {
    Clipboard::new().map_err(|e| anyhow!("Failed to init clipboard: {}", e))
}

impl ClipboardPort for SystemClipboard {
    fn read_text(&self) -> Result<Option<String>> {
        self.with_clipboard(|clipboard| match clipboard.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(anyhow!("Failed to get text: {}", e)),
        })
    }

    fn read_image(&self) -> Result<Option<Vec<u8>>> {
        let image = match self.with_clipboard(|clipboard| match clipboard.get_image() {
            Ok(image) => Ok(Some(image)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(anyhow!("Failed to get image: {}", e)),
        })? {
            Some(image) => image,
            None => return Ok(None),
        };

        // arboard hands out raw RGBA; the rest of the pipeline speaks PNG
        let rgba = image::ImageBuffer::<image::Rgba<u8>, _>::from_raw(
            image.width as u32,
            image.height as u32,
            image.bytes.into_owned(),
        )
        .ok_or(anyhow!("Invalid image buffer"))?;

        let mut buf = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buf);
        rgba.write_to(&mut cursor, ImageOutputFormat::Png)?;
        Ok(Some(buf))
    }

    fn write_text(&self, text: &str) -> Result<()> {
        self.with_clipboard(|clipboard| {
            clipboard
                .set_text(text.to_owned())
                .map_err(|e| anyhow!("Failed to set text: {}", e))
        })
    }

    #[cfg(all(
        unix,
        not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))
    ))]
    fn write_primary_text(&self, text: &str) -> Result<()> {
        use arboard::{LinuxClipboardKind, SetExtLinux};

        self.with_clipboard(|clipboard| {
            clipboard
                .set()
                .clipboard(LinuxClipboardKind::Primary)
                .text(text.to_owned())
                .map_err(|e| anyhow!("Failed to set primary selection: {}", e))
        })
    }

    fn write_image(&self, png_data: &[u8]) -> Result<()> {
        let img = image::load_from_memory(png_data)?.to_rgba8();
        let width = img.width() as usize;
        let height = img.height() as usize;
        let raw = img.into_raw();

        let image_data = ImageData {
            width,
            height,
            bytes: Cow::from(raw),
        };
        self.with_clipboard(|clipboard| {
            clipboard
                .set_image(image_data)
                .map_err(|e| anyhow!("Set image failed: {}", e))
        })
    }

    fn start_listener(&self, callback: Box<dyn Fn() + Send + Sync>) -> Result<ListenerHandle> {
        #[cfg(target_os = "windows")]
        {
            crate::windows::start_listener(callback)
        }
        #[cfg(target_os = "macos")]
        {
            crate::macos::start_listener(callback)
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            crate::poll::start_listener(callback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_port<T: ClipboardPort + Send + Sync + 'static>() {}

    // The held handle must not cost the port its thread-safety
    #[test]
    fn system_clipboard_is_a_shareable_port() {
        assert_port::<SystemClipboard>();
        let _shared: std::sync::Arc<dyn ClipboardPort> = std::sync::Arc::new(SystemClipboard::new());
    }
}
