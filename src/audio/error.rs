use std::fmt;

use thiserror::Error;

/// A failed call into the sound driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{func} failed: {desc} (errno {errno})")]
pub struct DeviceError {
    pub func: &'static str,
    pub errno: i32,
    pub desc: String,
}

impl DeviceError {
    pub fn new(func: &'static str, errno: i32) -> Self {
        Self {
            func,
            errno,
            desc: std::io::Error::from_raw_os_error(errno).to_string(),
        }
    }
}

impl From<alsa::Error> for DeviceError {
    fn from(e: alsa::Error) -> Self {
        Self::new(e.func(), e.errno())
    }
}

/// Negotiation step at which opening a sink failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Open,
    QueryCapabilities,
    Access,
    Format,
    Rate,
    Channels,
    Periods,
    BufferSize,
    Commit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validate => "parameter validation",
            Stage::Open => "device open",
            Stage::QueryCapabilities => "capability query",
            Stage::Access => "access type",
            Stage::Format => "sample format",
            Stage::Rate => "sample rate",
            Stage::Channels => "channel count",
            Stage::Periods => "period count",
            Stage::BufferSize => "buffer size",
            Stage::Commit => "hardware parameter commit",
        };
        f.write_str(name)
    }
}

/// Fatal failure while opening and configuring a playback device.
#[derive(Debug, Clone, Error)]
pub enum OpenError {
    #[error("unsupported sample size: {0} bits (expected 8 or 16)")]
    UnsupportedBits(u8),
    #[error("channel count must be positive")]
    NoChannels,
    #[error("error opening PCM device -- {device}")]
    Open {
        device: String,
        #[source]
        source: DeviceError,
    },
    #[error("cannot configure this PCM device -- {device}")]
    QueryCapabilities {
        device: String,
        #[source]
        source: DeviceError,
    },
    #[error("error setting access type")]
    Access(#[source] DeviceError),
    #[error("error setting format ({bits}-bit)")]
    Format {
        bits: u8,
        #[source]
        source: DeviceError,
    },
    #[error("error setting sample rate ({rate} Hz)")]
    Rate {
        rate: u32,
        #[source]
        source: DeviceError,
    },
    #[error("error setting channels ({channels})")]
    Channels {
        channels: u32,
        #[source]
        source: DeviceError,
    },
    #[error("error setting periods ({periods})")]
    Periods {
        periods: u32,
        #[source]
        source: DeviceError,
    },
    #[error("error setting and getting buffer size ({requested} frames requested)")]
    BufferSize {
        requested: usize,
        #[source]
        source: DeviceError,
    },
    #[error("error setting HW params")]
    Commit(#[source] DeviceError),
}

impl OpenError {
    pub fn stage(&self) -> Stage {
        match self {
            OpenError::UnsupportedBits(_) | OpenError::NoChannels => Stage::Validate,
            OpenError::Open { .. } => Stage::Open,
            OpenError::QueryCapabilities { .. } => Stage::QueryCapabilities,
            OpenError::Access(_) => Stage::Access,
            OpenError::Format { .. } => Stage::Format,
            OpenError::Rate { .. } => Stage::Rate,
            OpenError::Channels { .. } => Stage::Channels,
            OpenError::Periods { .. } => Stage::Periods,
            OpenError::BufferSize { .. } => Stage::BufferSize,
            OpenError::Commit(_) => Stage::Commit,
        }
    }

    /// Driver error behind the failure, if the failure came from the device.
    pub fn device_error(&self) -> Option<&DeviceError> {
        match self {
            OpenError::UnsupportedBits(_) | OpenError::NoChannels => None,
            OpenError::Open { source, .. }
            | OpenError::QueryCapabilities { source, .. }
            | OpenError::Format { source, .. }
            | OpenError::Rate { source, .. }
            | OpenError::Channels { source, .. }
            | OpenError::Periods { source, .. }
            | OpenError::BufferSize { source, .. } => Some(source),
            OpenError::Access(source) | OpenError::Commit(source) => Some(source),
        }
    }
}
