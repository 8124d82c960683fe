mod sink;

pub use sink::WindowsInputSink;
