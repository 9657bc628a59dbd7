//! Scripted in-memory device and a per-thread log capture for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::thread::{self, ThreadId};

use log::{Level, LevelFilter, Log, Metadata, Record};

use super::device::{HwSpace, PcmDevice};
use super::error::DeviceError;
use super::error::Stage;
use super::format::SampleFormat;

const EIO: i32 = 5;
const EINVAL: i32 = 22;
const EPIPE: i32 = 32;

/// Outcome of one scripted `writei` call.
#[derive(Debug, Clone, Copy)]
pub enum MockWrite {
    /// Accept at most this many frames
    Accept(usize),
    /// Fail with this errno
    Fail(i32),
}

impl MockWrite {
    pub fn underrun() -> Self {
        MockWrite::Fail(EPIPE)
    }
}

#[derive(Debug, Default)]
pub struct MockState {
    /// Stage whose driver call fails
    pub fail_at: Option<Stage>,
    /// Rate the hardware settles on instead of the request
    pub nearest_rate: Option<u32>,
    /// Reject set_buffer_size and report this depth instead
    pub fallback_buffer: Option<usize>,
    /// Reject both set_buffer_size and the fallback query
    pub buffer_query_fails: bool,
    /// snd_pcm_prepare fails, leaving the device unprepared
    pub prepare_fails: bool,
    /// snd_pcm_drop fails
    pub drop_fails: bool,
    pub frame_size: usize,
    pub writes: VecDeque<MockWrite>,

    pub calls: Vec<&'static str>,
    pub buffer_frames: usize,
    pub written_frames: Vec<usize>,
    pub prepares: usize,
    pub drops: usize,
    pub releases: usize,
    pub prepared: bool,
}

#[derive(Clone, Default)]
pub struct MockHandle(Arc<Mutex<MockState>>);

impl MockHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.0.lock().unwrap()
    }

    /// Opener closure for `AudioSink::open_with`.
    pub fn opener(&self) -> Box<dyn FnOnce(&str) -> Result<MockDevice, DeviceError> + Send> {
        let handle = self.clone();
        Box::new(move |_device: &str| {
            let mut state = handle.state();
            state.calls.push("open");
            if state.fail_at == Some(Stage::Open) {
                return Err(DeviceError::new("snd_pcm_open", 16));
            }
            drop(state);
            Ok(MockDevice { handle })
        })
    }
}

pub struct MockDevice {
    handle: MockHandle,
}

pub struct MockSpace<'a> {
    device: &'a MockDevice,
}

impl MockSpace<'_> {
    fn step(&self, call: &'static str, stage: Stage) -> Result<(), DeviceError> {
        let mut state = self.device.handle.state();
        state.calls.push(call);
        if state.fail_at == Some(stage) {
            return Err(DeviceError::new(call, EINVAL));
        }
        Ok(())
    }
}

impl HwSpace for MockSpace<'_> {
    fn set_access_interleaved(&self) -> Result<(), DeviceError> {
        self.step("access", Stage::Access)
    }

    fn set_format(&self, format: SampleFormat) -> Result<(), DeviceError> {
        self.step("format", Stage::Format)?;
        self.device.handle.state().frame_size = format.bytes();
        Ok(())
    }

    fn set_rate_near(&self, rate: u32) -> Result<u32, DeviceError> {
        self.step("rate", Stage::Rate)?;
        Ok(self.device.handle.state().nearest_rate.unwrap_or(rate))
    }

    fn set_channels(&self, channels: u32) -> Result<(), DeviceError> {
        self.step("channels", Stage::Channels)?;
        self.device.handle.state().frame_size *= channels as usize;
        Ok(())
    }

    fn set_periods(&self, _periods: u32) -> Result<(), DeviceError> {
        self.step("periods", Stage::Periods)
    }

    fn set_buffer_size(&self, frames: usize) -> Result<(), DeviceError> {
        self.step("buffer_size", Stage::BufferSize)?;
        let mut state = self.device.handle.state();
        if state.fallback_buffer.is_some() || state.buffer_query_fails {
            return Err(DeviceError::new("snd_pcm_hw_params_set_buffer_size", EINVAL));
        }
        state.buffer_frames = frames;
        Ok(())
    }

    fn buffer_size(&self) -> Result<usize, DeviceError> {
        let mut state = self.device.handle.state();
        state.calls.push("get_buffer_size");
        if state.buffer_query_fails {
            return Err(DeviceError::new("snd_pcm_hw_params_get_buffer_size", EINVAL));
        }
        let frames = state.fallback_buffer.unwrap_or(state.buffer_frames);
        state.buffer_frames = frames;
        Ok(frames)
    }

    fn commit(&self) -> Result<(), DeviceError> {
        self.step("commit", Stage::Commit)?;
        self.device.handle.state().prepared = true;
        Ok(())
    }
}

impl PcmDevice for MockDevice {
    type Space<'a> = MockSpace<'a>;

    fn hw_space(&self) -> Result<MockSpace<'_>, DeviceError> {
        let mut state = self.handle.state();
        state.calls.push("any");
        if state.fail_at == Some(Stage::QueryCapabilities) {
            return Err(DeviceError::new("snd_pcm_hw_params_any", EIO));
        }
        Ok(MockSpace { device: self })
    }

    fn writei(&mut self, data: &[u8]) -> Result<usize, DeviceError> {
        let mut state = self.handle.state();
        if !state.prepared {
            return Err(DeviceError::new("snd_pcm_writei", EPIPE));
        }
        let frames = data.len() / state.frame_size;
        let accepted = match state.writes.pop_front() {
            None => frames,
            Some(MockWrite::Accept(n)) => frames.min(n),
            Some(MockWrite::Fail(errno)) => {
                state.prepared = false;
                return Err(DeviceError::new("snd_pcm_writei", errno));
            }
        };
        state.written_frames.push(accepted);
        Ok(accepted)
    }

    fn prepare(&mut self) -> Result<(), DeviceError> {
        let mut state = self.handle.state();
        state.prepares += 1;
        if state.prepare_fails {
            return Err(DeviceError::new("snd_pcm_prepare", EIO));
        }
        state.prepared = true;
        Ok(())
    }

    fn drop_pending(&mut self) -> Result<(), DeviceError> {
        let mut state = self.handle.state();
        state.drops += 1;
        if state.drop_fails {
            return Err(DeviceError::new("snd_pcm_drop", EIO));
        }
        state.prepared = false;
        Ok(())
    }

    fn dump_setup(&self) -> Result<String, DeviceError> {
        let state = self.handle.state();
        Ok(format!(
            "frame size : {}\nbuffer_size  : {}\n",
            state.frame_size, state.buffer_frames
        ))
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.handle.state().releases += 1;
    }
}

struct CaptureLogger {
    records: Mutex<Vec<(ThreadId, Level, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records.lock().unwrap().push((
            thread::current().id(),
            record.level(),
            record.args().to_string(),
        ));
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<&'static CaptureLogger> = OnceLock::new();

fn logger() -> &'static CaptureLogger {
    LOGGER.get_or_init(|| {
        let logger: &'static CaptureLogger = Box::leak(Box::new(CaptureLogger {
            records: Mutex::new(Vec::new()),
        }));
        log::set_logger(logger).expect("logger already installed");
        log::set_max_level(LevelFilter::Trace);
        logger
    })
}

/// Start capturing log records emitted on the current thread.
pub fn capture_logs() {
    let logger = logger();
    let me = thread::current().id();
    logger.records.lock().unwrap().retain(|(id, _, _)| *id != me);
}

/// Records logged on the current thread since [`capture_logs`].
pub fn captured(level: Level) -> Vec<String> {
    let me = thread::current().id();
    logger()
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|(id, lvl, _)| *id == me && *lvl == level)
        .map(|(_, _, msg)| msg.clone())
        .collect()
}
