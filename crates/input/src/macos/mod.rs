pub mod sink;
pub mod permissions;

pub use sink::MacosInputSink;
