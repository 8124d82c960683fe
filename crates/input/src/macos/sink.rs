use crate::InputSink;
use anyhow::{anyhow, Result};
use clipshelf_core::{Key, KeyEvent};
use core_graphics::event::{CGEvent, CGEventFlags, CGEventTapLocation};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use std::sync::Mutex;

// Virtual key codes from HIToolbox/Events.h
fn keycode(key: Key) -> u16 {
    match key {
        Key::Control => 59,
        Key::Command => 55,
        Key::V => 9,
    }
}

fn modifier_flag(key: Key) -> Option<CGEventFlags> {
    match key {
        Key::Control => Some(CGEventFlags::CGEventFlagControl),
        Key::Command => Some(CGEventFlags::CGEventFlagCommand),
        Key::V => None,
    }
}

/// Posts keyboard events at the HID tap. Modifier state is tracked so the
/// V events carry the held modifier flag, which apps check instead of
/// replaying the modifier key events.
pub struct MacosInputSink {
    held: Mutex<CGEventFlags>,
}

impl MacosInputSink {
    pub fn new() -> Self {
        Self {
            held: Mutex::new(CGEventFlags::CGEventFlagNull),
        }
    }
}

impl InputSink for MacosInputSink {
    fn inject_key(&self, event: KeyEvent) -> Result<()> {
        let source = CGEventSource::new(CGEventSourceStateID::Private)
            .map_err(|_| anyhow!("Failed to create event source"))?;

        let flags = {
            let mut held = self.held.lock().map_err(|_| anyhow!("Modifier state poisoned"))?;
            if let Some(flag) = modifier_flag(event.key) {
                if event.is_down {
                    held.insert(flag);
                } else {
                    held.remove(flag);
                }
            }
            *held
        };

        let cg_event = CGEvent::new_keyboard_event(source, keycode(event.key), event.is_down)
            .map_err(|_| anyhow!("Failed to create keyboard event"))?;
        cg_event.set_flags(flags);
        cg_event.post(CGEventTapLocation::HID);
        Ok(())
    }
}
