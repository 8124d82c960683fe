use crate::traits::ListenerHandle;
use anyhow::Result;
use cocoa::base::{id, nil};
use cocoa::foundation::NSAutoreleasePool;
use objc::{msg_send, sel, sel_impl};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn change_count() -> isize {
    unsafe {
        let pool = NSAutoreleasePool::new(nil);
        let ns_pasteboard: id = msg_send![objc::class!(NSPasteboard), generalPasteboard];
        let count: isize = msg_send![ns_pasteboard, changeCount];
        pool.drain();
        count
    }
}

/// NSPasteboard has no change notification; poll its change counter instead.
pub fn start_listener(callback: Box<dyn Fn() + Send + Sync>) -> Result<ListenerHandle> {
    let running = Arc::new(AtomicBool::new(true));
    let thread_running = running.clone();

    std::thread::Builder::new()
        .name("clipboard-listener".into())
        .spawn(move || {
            let mut last_count = change_count();
            while thread_running.load(Ordering::Acquire) {
                let count = change_count();
                if count != last_count {
                    last_count = count;
                    callback();
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            tracing::debug!("clipboard listener stopped");
        })?;

    Ok(ListenerHandle::new(move || running.store(false, Ordering::Release)))
}
