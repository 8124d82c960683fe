use crate::InputSink;
use anyhow::{anyhow, Result};
use clipshelf_core::{Key, KeyEvent};
use std::mem::size_of;
use windows::Win32::UI::Input::KeyboardAndMouse::*;

pub struct WindowsInputSink;

impl WindowsInputSink {
    pub fn new() -> Self {
        Self
    }
}

fn virtual_key(key: Key) -> VIRTUAL_KEY {
    match key {
        Key::Control => VK_CONTROL,
        Key::Command => VK_LWIN,
        Key::V => VIRTUAL_KEY(0x56),
    }
}

impl InputSink for WindowsInputSink {
    fn inject_key(&self, event: KeyEvent) -> Result<()> {
        let mut input = INPUT::default();
        input.r#type = INPUT_KEYBOARD;
        let mut flags = Default::default();
        if !event.is_down {
            flags |= KEYEVENTF_KEYUP;
        }
        input.Anonymous.ki = KEYBDINPUT {
            wVk: virtual_key(event.key),
            wScan: 0,
            dwFlags: flags,
            time: 0,
            dwExtraInfo: 0,
        };

        unsafe {
            if SendInput(&[input], size_of::<INPUT>() as i32) == 0 {
                return Err(anyhow!("SendInput failed"));
            }
        }
        Ok(())
    }
}
