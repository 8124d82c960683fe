use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Control,
    /// Command on macOS, the Windows key elsewhere
    Command,
    V,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub is_down: bool,
}

impl KeyEvent {
    pub fn down(key: Key) -> Self {
        Self { key, is_down: true }
    }

    pub fn up(key: Key) -> Self {
        Self { key, is_down: false }
    }
}

/// Key sequence for a paste: a release of the modifier first (clears one
/// left held by the shortcut that opened the picker), then modifier-down,
/// V-down, V-up, modifier-up.
pub fn paste_gesture(modifier: Key) -> [KeyEvent; 5] {
    [
        KeyEvent::up(modifier),
        KeyEvent::down(modifier),
        KeyEvent::down(Key::V),
        KeyEvent::up(Key::V),
        KeyEvent::up(modifier),
    ]
}
