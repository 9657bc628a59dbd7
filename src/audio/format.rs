//! Sample encodings and the parameters requested when opening a sink.

use crate::audio::error::OpenError;

/// ALSA device used when the caller leaves the device name empty.
pub const DEFAULT_DEVICE: &str = "default";

/// Periods (fragments) requested per hardware buffer.
pub const PERIODS_PER_BUFFER: u32 = 4;

/// Signed PCM encodings the sink can negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Signed 8-bit
    S8,
    /// Signed 16-bit little-endian
    S16LE,
}

impl SampleFormat {
    /// Bytes per sample for one channel.
    pub fn bytes(self) -> usize {
        match self {
            SampleFormat::S8 => 1,
            SampleFormat::S16LE => 2,
        }
    }

    pub fn bits(self) -> u8 {
        (self.bytes() * 8) as u8
    }
}

impl TryFrom<u8> for SampleFormat {
    type Error = OpenError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(SampleFormat::S8),
            16 => Ok(SampleFormat::S16LE),
            other => Err(OpenError::UnsupportedBits(other)),
        }
    }
}

/// Playback parameters requested from the device.
#[derive(Debug, Clone)]
pub struct SinkParams {
    /// ALSA device name (e.g. "default", "plughw:0,0"); empty means "default"
    pub device: String,
    /// Sample bit depth, 8 or 16
    pub bits: u8,
    /// Interleaved channel count
    pub channels: u32,
    /// Desired sample rate in Hz (the hardware may pick the nearest one)
    pub rate: u32,
    /// Desired hardware buffer depth in frames
    pub buffer_frames: usize,
    /// Log the negotiated hardware setup after the parameters are applied
    pub dump_setup: bool,
}

impl SinkParams {
    /// Device name actually handed to ALSA.
    pub fn device_name(&self) -> &str {
        if self.device.is_empty() {
            DEFAULT_DEVICE
        } else {
            &self.device
        }
    }
}

impl Default for SinkParams {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            bits: 16,
            channels: 2,
            rate: 44100,
            buffer_frames: 4096,
            dump_setup: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_depth_selects_encoding() {
        assert_eq!(SampleFormat::try_from(16).unwrap(), SampleFormat::S16LE);
        assert_eq!(SampleFormat::try_from(8).unwrap(), SampleFormat::S8);
        assert!(matches!(
            SampleFormat::try_from(24),
            Err(OpenError::UnsupportedBits(24))
        ));
    }

    #[test]
    fn empty_device_means_default() {
        let params = SinkParams {
            device: String::new(),
            ..Default::default()
        };
        assert_eq!(params.device_name(), "default");

        let params = SinkParams {
            device: "plughw:1,0".into(),
            ..Default::default()
        };
        assert_eq!(params.device_name(), "plughw:1,0");
    }
}
