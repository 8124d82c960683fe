pub mod traits;
pub mod system;
pub mod memory;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub mod poll;

pub use traits::*;
pub use system::SystemClipboard;
pub use memory::MemoryClipboard;
