use crate::entry::EntryKind;
use sha2::{Digest, Sha256};
use std::fmt;

/// Digest of an entry's identity `(kind, content)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentFingerprint([u8; 32]);

impl ContentFingerprint {
    pub fn of(kind: EntryKind, content: &str) -> Self {
        let mut hasher = Sha256::new();
        match kind {
            EntryKind::Text => hasher.update(b"text:"),
            EntryKind::Image => hasher.update(b"image:"),
        }
        hasher.update(content.as_bytes());
        Self(hasher.finalize().into())
    }
}

impl fmt::Debug for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentFingerprint({})", self)
    }
}

// Short form for log lines
impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..6] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
