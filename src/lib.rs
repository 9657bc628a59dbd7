pub mod audio;
pub mod tone;

pub use audio::{AudioSink, OpenError, SinkParams, WriteStatus};
