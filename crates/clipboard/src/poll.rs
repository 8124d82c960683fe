//! Change detection for hosts without a usable clipboard notification
//! (X11 and Wayland through arboard). The listener thread samples both
//! representations and fires when their combined hash moves.

use crate::traits::ListenerHandle;
use anyhow::Result;
use arboard::{Clipboard, ImageData};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

// Raw RGBA is hashed as delivered; no PNG encoding on the polling path
fn content_hash(text: Option<&str>, image: Option<&ImageData<'_>>) -> u64 {
    let mut s = DefaultHasher::new();
    text.hash(&mut s);
    if let Some(image) = image {
        (image.width, image.height).hash(&mut s);
        image.bytes.hash(&mut s);
    }
    s.finish()
}

fn snapshot_hash(clipboard: &mut Clipboard) -> u64 {
    let text = clipboard.get_text().ok();
    let image = clipboard.get_image().ok();
    content_hash(text.as_deref(), image.as_ref())
}

pub fn start_listener(callback: Box<dyn Fn() + Send + Sync>) -> Result<ListenerHandle> {
    let running = Arc::new(AtomicBool::new(true));
    let thread_running = running.clone();

    std::thread::Builder::new()
        .name("clipboard-listener".into())
        .spawn(move || {
            let mut clipboard = match crate::system::open() {
                Ok(clipboard) => clipboard,
                Err(e) => {
                    tracing::error!("Clipboard listener disabled: {:#}", e);
                    return;
                }
            };
            let mut last = snapshot_hash(&mut clipboard);
            while thread_running.load(Ordering::Acquire) {
                std::thread::sleep(POLL_INTERVAL);
                let current = snapshot_hash(&mut clipboard);
                if current != last {
                    last = current;
                    callback();
                }
            }
            tracing::debug!("clipboard listener stopped");
        })?;

    Ok(ListenerHandle::new(move || running.store(false, Ordering::Release)))
}
