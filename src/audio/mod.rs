//! audio - ALSA playback sink for decoded PCM frames
//!
//! Negotiates sample format, rate, channel count and buffer depth with an ALSA
//! playback device, then writes interleaved S8/S16_LE frames with blocking,
//! rate-paced semantics. `PlaybackWorker` moves a sink onto its own thread for
//! async callers.

mod alsa_device;
mod device;
mod error;
mod format;
#[cfg(test)]
mod mock;
mod playback;
mod sink;

pub use alsa_device::{AlsaDevice, AlsaHwSpace};
pub use device::{HwSpace, PcmDevice};
pub use error::{DeviceError, OpenError, Stage};
pub use format::{DEFAULT_DEVICE, PERIODS_PER_BUFFER, SampleFormat, SinkParams};
pub use playback::{PlaybackStats, PlaybackWorker, WorkerOptions};
pub use sink::{AudioSink, Negotiated, WriteStatus};
