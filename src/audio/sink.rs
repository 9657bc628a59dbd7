//! Blocking PCM playback sink.
//!
//! An [`AudioSink`] owns one playback device. Opening it walks the hardware
//! negotiation in a fixed order and fails with the [`Stage`](super::error::Stage)
//! that went wrong; afterwards [`AudioSink::write`] hands whole interleaved frames to
//! the driver, blocking until they are queued. Runtime problems (short writes, xruns)
//! are logged and reported in the returned [`WriteStatus`], never escalated.

use super::alsa_device::AlsaDevice;
use super::device::{HwSpace, PcmDevice};
use super::error::{DeviceError, OpenError};
use super::format::{PERIODS_PER_BUFFER, SampleFormat, SinkParams};

/// Parameters the hardware actually accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    pub device: String,
    pub format: SampleFormat,
    pub channels: u32,
    pub requested_rate: u32,
    pub rate: u32,
    pub requested_buffer_frames: usize,
    pub buffer_frames: usize,
}

impl Negotiated {
    /// Bytes per interleaved frame.
    pub fn frame_size(&self) -> usize {
        self.channels as usize * self.format.bytes()
    }

    pub fn rate_substituted(&self) -> bool {
        self.rate != self.requested_rate
    }

    pub fn buffer_substituted(&self) -> bool {
        self.buffer_frames != self.requested_buffer_frames
    }
}

/// Result of a single [`AudioSink::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    /// Every frame was accepted
    Complete { frames: usize },
    /// The device took fewer frames than offered
    Short { requested: usize, written: usize },
    /// The driver rejected the write; `recovered` tells whether re-preparing worked
    Failed {
        requested: usize,
        error: DeviceError,
        recovered: bool,
    },
}

impl WriteStatus {
    pub fn frames_written(&self) -> usize {
        match self {
            WriteStatus::Complete { frames } => *frames,
            WriteStatus::Short { written, .. } => *written,
            WriteStatus::Failed { .. } => 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, WriteStatus::Complete { .. })
    }
}

/// Exclusive playback handle with negotiated hardware parameters.
pub struct AudioSink<D: PcmDevice = AlsaDevice> {
    device: D,
    negotiated: Negotiated,
}

impl AudioSink<AlsaDevice> {
    /// Open and configure an ALSA playback device.
    pub fn open(params: &SinkParams) -> Result<Self, OpenError> {
        Self::open_with(params, AlsaDevice::open)
    }
}

impl<D: PcmDevice> AudioSink<D> {
    /// Open a device through `opener` and negotiate `params` with it.
    pub fn open_with<F>(params: &SinkParams, opener: F) -> Result<Self, OpenError>
    where
        F: FnOnce(&str) -> Result<D, DeviceError>,
    {
        let format = SampleFormat::try_from(params.bits)?;
        if params.channels == 0 {
            return Err(OpenError::NoChannels);
        }
        let name = params.device_name();

        let device = opener(name).map_err(|source| OpenError::Open {
            device: name.to_string(),
            source,
        })?;

        let (rate, buffer_frames) = negotiate(&device, name, format, params)?;

        let negotiated = Negotiated {
            device: name.to_string(),
            format,
            channels: params.channels,
            requested_rate: params.rate,
            rate,
            requested_buffer_frames: params.buffer_frames,
            buffer_frames,
        };

        if params.dump_setup {
            match device.dump_setup() {
                Ok(dump) => {
                    log::info!("ALSA HW PCM info:");
                    for line in dump.lines() {
                        log::info!("  {}", line);
                    }
                }
                Err(e) => log::warn!("Failed to dump ALSA hardware setup: {}", e),
            }
        }

        log::info!(
            "ALSA Playback: device={}, format={:?}, rate={}, channels={}, buffer={} frames",
            negotiated.device,
            negotiated.format,
            negotiated.rate,
            negotiated.channels,
            negotiated.buffer_frames,
        );

        Ok(Self { device, negotiated })
    }

    pub fn negotiated(&self) -> &Negotiated {
        &self.negotiated
    }

    /// Hardware buffer depth in frames actually allocated.
    pub fn negotiated_buffer_size(&self) -> usize {
        self.negotiated.buffer_frames
    }

    pub fn rate(&self) -> u32 {
        self.negotiated.rate
    }

    pub fn frame_size(&self) -> usize {
        self.negotiated.frame_size()
    }

    /// Write interleaved frames, blocking until the driver has queued them.
    ///
    /// `data` should hold whole frames; trailing bytes of a partial frame are not
    /// written. Nothing is retried: on a short write the caller decides whether to
    /// resubmit the tail.
    pub fn write(&mut self, data: &[u8]) -> WriteStatus {
        let frame_size = self.frame_size();
        let frames = data.len() / frame_size;
        let tail = data.len() % frame_size;

        if tail != 0 {
            log::warn!(
                "ALSA ignoring {} trailing bytes of a partial frame (frame size {})",
                tail,
                frame_size
            );
        }
        if frames == 0 {
            return WriteStatus::Complete { frames: 0 };
        }
        if frames > self.negotiated.buffer_frames {
            log::warn!(
                "ALSA trying to push more frames ({}) than buffer size ({})",
                frames,
                self.negotiated.buffer_frames
            );
        }

        match self.device.writei(&data[..frames * frame_size]) {
            Ok(written) if written == frames => WriteStatus::Complete { frames },
            Ok(written) => {
                log::warn!(
                    "ALSA buffer underrun? to write {} frames (frame size {}) written {}",
                    frames,
                    frame_size,
                    written
                );
                WriteStatus::Short {
                    requested: frames,
                    written,
                }
            }
            Err(error) => {
                let recovered = match self.device.prepare() {
                    Ok(()) => true,
                    Err(e) => {
                        log::error!("Failed to recover PCM playback: {}", e);
                        false
                    }
                };
                log::warn!("ALSA write error: {}", error);
                WriteStatus::Failed {
                    requested: frames,
                    error,
                    recovered,
                }
            }
        }
    }

    /// Stop playback immediately and release the device.
    pub fn close(self) {}
}

impl<D: PcmDevice> Drop for AudioSink<D> {
    fn drop(&mut self) {
        if let Err(e) = self.device.drop_pending() {
            log::warn!("Failed to drop pending ALSA frames: {}", e);
        }
        log::info!("ALSA stream dropped & closed");
    }
}

/// Configure the hardware in order, returning the negotiated rate and buffer depth.
fn negotiate<D: PcmDevice>(
    device: &D,
    name: &str,
    format: SampleFormat,
    params: &SinkParams,
) -> Result<(u32, usize), OpenError> {
    let hwp = device
        .hw_space()
        .map_err(|source| OpenError::QueryCapabilities {
            device: name.to_string(),
            source,
        })?;

    hwp.set_access_interleaved().map_err(OpenError::Access)?;

    hwp.set_format(format).map_err(|source| OpenError::Format {
        bits: format.bits(),
        source,
    })?;

    let rate = hwp
        .set_rate_near(params.rate)
        .map_err(|source| OpenError::Rate {
            rate: params.rate,
            source,
        })?;
    if rate != params.rate {
        log::info!(
            "{} Hz sample rate not supported by your hardware, using {} Hz instead",
            params.rate,
            rate
        );
    }

    hwp.set_channels(params.channels)
        .map_err(|source| OpenError::Channels {
            channels: params.channels,
            source,
        })?;

    hwp.set_periods(PERIODS_PER_BUFFER)
        .map_err(|source| OpenError::Periods {
            periods: PERIODS_PER_BUFFER,
            source,
        })?;

    log::info!(
        "ALSA: sample/frame size {} (bytes)",
        params.channels as usize * format.bytes()
    );
    log::info!("ALSA: buffer size {} (frames)", params.buffer_frames);

    let buffer_frames = match hwp.set_buffer_size(params.buffer_frames) {
        Ok(()) => params.buffer_frames,
        Err(_) => {
            let actual = hwp.buffer_size().map_err(|source| OpenError::BufferSize {
                requested: params.buffer_frames,
                source,
            })?;
            log::info!(
                "couldn't set buffer size to {}, using default of {} instead",
                params.buffer_frames,
                actual
            );
            actual
        }
    };

    hwp.commit().map_err(OpenError::Commit)?;

    Ok((rate, buffer_frames))
}
