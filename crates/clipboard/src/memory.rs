//! In-process clipboard for tests and headless runs. Copies are explicit
//! calls, and change notifications fire only when the caller asks for them,
//! so bursts and quiet periods can be scripted exactly.

use crate::traits::{ClipboardPort, ListenerHandle};
use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct MemoryState {
    text: Option<String>,
    primary: Option<String>,
    image: Option<Vec<u8>>,
    fail_reads: bool,
}

#[derive(Default)]
pub struct MemoryClipboard {
    state: Mutex<MemoryState>,
    listeners: Arc<Mutex<Vec<(usize, Listener)>>>,
    next_listener: AtomicUsize,
    text_reads: AtomicUsize,
    image_reads: AtomicUsize,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Simulates another application copying text, then notifies listeners.
    pub fn copy_text(&self, text: &str) {
        {
            let mut state = self.state();
            state.text = Some(text.to_string());
            state.image = None;
        }
        self.notify();
    }

    /// Simulates another application copying an image (PNG bytes).
    pub fn copy_image(&self, png: Vec<u8>) {
        {
            let mut state = self.state();
            state.text = None;
            state.image = Some(png);
        }
        self.notify();
    }

    /// Replaces both representations without notifying.
    pub fn set_contents(&self, text: Option<String>, image: Option<Vec<u8>>) {
        let mut state = self.state();
        state.text = text;
        state.image = image;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state().fail_reads = fail;
    }

    pub fn notify(&self) {
        let listeners: Vec<Listener> = match self.listeners.lock() {
            Ok(guard) => guard.iter().map(|(_, cb)| cb.clone()).collect(),
            Err(_) => return,
        };
        for cb in listeners {
            cb();
        }
    }

    pub fn text(&self) -> Option<String> {
        self.state().text.clone()
    }

    pub fn primary_text(&self) -> Option<String> {
        self.state().primary.clone()
    }

    pub fn image(&self) -> Option<Vec<u8>> {
        self.state().image.clone()
    }

    /// Number of `read_text` calls so far, one per capture pass.
    pub fn text_reads(&self) -> usize {
        self.text_reads.load(Ordering::SeqCst)
    }

    pub fn image_reads(&self) -> usize {
        self.image_reads.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

impl ClipboardPort for MemoryClipboard {
    fn read_text(&self) -> Result<Option<String>> {
        self.text_reads.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if state.fail_reads {
            return Err(anyhow!("clipboard unavailable"));
        }
        Ok(state.text.clone())
    }

    fn read_image(&self) -> Result<Option<Vec<u8>>> {
        self.image_reads.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if state.fail_reads {
            return Err(anyhow!("clipboard unavailable"));
        }
        Ok(state.image.clone())
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let mut state = self.state();
        state.text = Some(text.to_string());
        state.image = None;
        Ok(())
    }

    fn write_primary_text(&self, text: &str) -> Result<()> {
        self.state().primary = Some(text.to_string());
        Ok(())
    }

    fn write_image(&self, png_data: &[u8]) -> Result<()> {
        let mut state = self.state();
        state.text = None;
        state.image = Some(png_data.to_vec());
        Ok(())
    }

    fn start_listener(&self, callback: Box<dyn Fn() + Send + Sync>) -> Result<ListenerHandle> {
        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        self.listeners
            .lock()
            .map_err(|_| anyhow!("listener registry poisoned"))?
            .push((id, Arc::from(callback)));

        let listeners = self.listeners.clone();
        Ok(ListenerHandle::new(move || {
            if let Ok(mut guard) = listeners.lock() {
                guard.retain(|(other, _)| *other != id);
            }
        }))
    }
}
