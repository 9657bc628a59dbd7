//! Driver-facing traits the sink negotiates and writes through.
//!
//! [`AlsaDevice`](super::alsa_device::AlsaDevice) is the production implementation;
//! anything else that can be opened exclusively for playback can stand in for it.

use super::error::DeviceError;
use super::format::SampleFormat;

/// A hardware configuration space obtained from an open device.
///
/// Setters narrow the space; nothing reaches the hardware until [`HwSpace::commit`].
pub trait HwSpace {
    fn set_access_interleaved(&self) -> Result<(), DeviceError>;
    fn set_format(&self, format: SampleFormat) -> Result<(), DeviceError>;
    /// Returns the rate the device settled on, which may differ from `rate`.
    fn set_rate_near(&self, rate: u32) -> Result<u32, DeviceError>;
    fn set_channels(&self, channels: u32) -> Result<(), DeviceError>;
    fn set_periods(&self, periods: u32) -> Result<(), DeviceError>;
    fn set_buffer_size(&self, frames: usize) -> Result<(), DeviceError>;
    /// Buffer depth, in frames, currently selected in the space.
    fn buffer_size(&self) -> Result<usize, DeviceError>;
    /// Apply the accumulated parameters and leave the device prepared.
    fn commit(&self) -> Result<(), DeviceError>;
}

/// An exclusively opened playback device.
pub trait PcmDevice {
    type Space<'a>: HwSpace
    where
        Self: 'a;

    /// Full configuration space of the device.
    fn hw_space(&self) -> Result<Self::Space<'_>, DeviceError>;

    /// Blocking interleaved write of whole frames. Returns the frames accepted.
    fn writei(&mut self, data: &[u8]) -> Result<usize, DeviceError>;

    /// Return the device to a ready-to-write state after an error.
    fn prepare(&mut self) -> Result<(), DeviceError>;

    /// Stop immediately, discarding queued frames.
    fn drop_pending(&mut self) -> Result<(), DeviceError>;

    /// Human-readable dump of the applied hardware setup.
    fn dump_setup(&self) -> Result<String, DeviceError>;
}
