//! ALSA PCM device wrapper for playback.

use alsa::pcm::{Access, Format, Frames, HwParams, PCM};
use alsa::{Direction, Output, ValueOr};

use super::device::{HwSpace, PcmDevice};
use super::error::DeviceError;
use super::format::SampleFormat;

const EINVAL: i32 = 22;

/// An ALSA PCM handle opened for blocking playback.
pub struct AlsaDevice {
    pcm: PCM,
}

impl AlsaDevice {
    /// Open `device` for playback in blocking mode.
    pub fn open(device: &str) -> Result<Self, DeviceError> {
        let pcm = PCM::new(device, Direction::Playback, false)?;
        Ok(Self { pcm })
    }
}

/// Convert to ALSA's signed `Frames`; counts that do not fit are EINVAL.
fn to_frames(func: &'static str, frames: usize) -> Result<Frames, DeviceError> {
    Frames::try_from(frames).map_err(|_| DeviceError::new(func, EINVAL))
}

/// Hardware parameters bound to the PCM they were queried from.
pub struct AlsaHwSpace<'a> {
    pcm: &'a PCM,
    hwp: HwParams<'a>,
}

impl HwSpace for AlsaHwSpace<'_> {
    fn set_access_interleaved(&self) -> Result<(), DeviceError> {
        Ok(self.hwp.set_access(Access::RWInterleaved)?)
    }

    fn set_format(&self, format: SampleFormat) -> Result<(), DeviceError> {
        let format = match format {
            SampleFormat::S8 => Format::S8,
            SampleFormat::S16LE => Format::S16LE,
        };
        Ok(self.hwp.set_format(format)?)
    }

    fn set_rate_near(&self, rate: u32) -> Result<u32, DeviceError> {
        Ok(self.hwp.set_rate_near(rate, ValueOr::Nearest)?)
    }

    fn set_channels(&self, channels: u32) -> Result<(), DeviceError> {
        Ok(self.hwp.set_channels(channels)?)
    }

    fn set_periods(&self, periods: u32) -> Result<(), DeviceError> {
        // ValueOr::Nearest maps to dir 0, i.e. exactly `periods`
        Ok(self.hwp.set_periods(periods, ValueOr::Nearest)?)
    }

    fn set_buffer_size(&self, frames: usize) -> Result<(), DeviceError> {
        let frames = to_frames("snd_pcm_hw_params_set_buffer_size", frames)?;
        Ok(self.hwp.set_buffer_size(frames)?)
    }

    fn buffer_size(&self) -> Result<usize, DeviceError> {
        Ok(self.hwp.get_buffer_size()? as usize)
    }

    fn commit(&self) -> Result<(), DeviceError> {
        Ok(self.pcm.hw_params(&self.hwp)?)
    }
}

impl PcmDevice for AlsaDevice {
    type Space<'a> = AlsaHwSpace<'a>;

    fn hw_space(&self) -> Result<AlsaHwSpace<'_>, DeviceError> {
        let hwp = HwParams::any(&self.pcm)?;
        Ok(AlsaHwSpace {
            pcm: &self.pcm,
            hwp,
        })
    }

    fn writei(&mut self, data: &[u8]) -> Result<usize, DeviceError> {
        // io_bytes converts the byte length to frames with snd_pcm_bytes_to_frames
        let io = self.pcm.io_bytes();
        Ok(io.writei(data)?)
    }

    fn prepare(&mut self) -> Result<(), DeviceError> {
        Ok(self.pcm.prepare()?)
    }

    fn drop_pending(&mut self) -> Result<(), DeviceError> {
        Ok(self.pcm.drop()?)
    }

    fn dump_setup(&self) -> Result<String, DeviceError> {
        let mut out = Output::buffer_open()?;
        self.pcm.dump_hw_setup(&mut out)?;
        Ok(out.buffer_string(|b| String::from_utf8_lossy(b).into_owned()))
    }
}
