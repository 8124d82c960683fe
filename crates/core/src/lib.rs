pub mod entry;
pub mod fingerprint;
pub mod payload;
pub mod input;
pub mod config;

pub use entry::*;
pub use fingerprint::*;
pub use input::*;
pub use config::*;
