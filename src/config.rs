use alsa_out::audio::{SinkParams, WorkerOptions};

#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: &'static str,
    pub app_version: &'static str,

    // Playback device
    pub playback_device: &'static str,
    pub playback_bits: u8,
    pub playback_channels: u32,
    pub playback_sample_rate: u32,
    pub playback_buffer_frames: usize,
    pub playback_dump_hw_setup: bool,

    // Playback thread policy
    pub worker_queue_depth: usize,
    pub worker_max_resubmits: u32,

    // Test tone
    pub tone_frequency: f32,
    pub tone_amplitude: f32,
    pub tone_duration_secs: u64,
}

impl Config {
    /// Build the configuration from the environment variables set by build.rs,
    /// which reads them from config.toml at compile time.
    pub fn new() -> Result<Self, &'static str> {
        Ok(Self {
            app_name: env!("APP_NAME"),
            app_version: env!("APP_VERSION"),

            playback_device: env!("PLAYBACK_DEVICE"),
            playback_bits: env!("PLAYBACK_BITS").parse()
                .map_err(|_| "Failed to parse PLAYBACK_BITS")?,
            playback_channels: env!("PLAYBACK_CHANNELS").parse()
                .map_err(|_| "Failed to parse PLAYBACK_CHANNELS")?,
            playback_sample_rate: env!("PLAYBACK_SAMPLE_RATE").parse()
                .map_err(|_| "Failed to parse PLAYBACK_SAMPLE_RATE")?,
            playback_buffer_frames: env!("PLAYBACK_BUFFER_FRAMES").parse()
                .map_err(|_| "Failed to parse PLAYBACK_BUFFER_FRAMES")?,
            playback_dump_hw_setup: env!("PLAYBACK_DUMP_HW_SETUP").parse()
                .map_err(|_| "Failed to parse PLAYBACK_DUMP_HW_SETUP")?,

            worker_queue_depth: env!("WORKER_QUEUE_DEPTH").parse()
                .map_err(|_| "Failed to parse WORKER_QUEUE_DEPTH")?,
            worker_max_resubmits: env!("WORKER_MAX_RESUBMITS").parse()
                .map_err(|_| "Failed to parse WORKER_MAX_RESUBMITS")?,

            tone_frequency: env!("TONE_FREQUENCY").parse()
                .map_err(|_| "Failed to parse TONE_FREQUENCY")?,
            tone_amplitude: env!("TONE_AMPLITUDE").parse()
                .map_err(|_| "Failed to parse TONE_AMPLITUDE")?,
            tone_duration_secs: env!("TONE_DURATION_SECS").parse()
                .map_err(|_| "Failed to parse TONE_DURATION_SECS")?,
        })
    }

    pub fn sink_params(&self) -> SinkParams {
        SinkParams {
            device: self.playback_device.to_string(),
            bits: self.playback_bits,
            channels: self.playback_channels,
            rate: self.playback_sample_rate,
            buffer_frames: self.playback_buffer_frames,
            dump_setup: self.playback_dump_hw_setup,
        }
    }

    pub fn worker_options(&self) -> WorkerOptions {
        WorkerOptions {
            queue_depth: self.worker_queue_depth,
            max_resubmits: self.worker_max_resubmits,
        }
    }
}
