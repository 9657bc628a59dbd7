use std::fs;
use std::path::Path;
use serde::Deserialize;

#[derive(Deserialize)]
struct Config {
    application: Application,
    playback: Playback,
    worker: Worker,
    tone: Tone,
}

#[derive(Deserialize)]
struct Application {
    name: String,
    version: String,
}

#[derive(Deserialize)]
struct Playback {
    device: String,
    bits: u8,
    channels: u32,
    sample_rate: u32,
    buffer_frames: usize,
    dump_hw_setup: bool,
}

#[derive(Deserialize)]
struct Worker {
    queue_depth: usize,
    max_resubmits: u32,
}

#[derive(Deserialize)]
struct Tone {
    frequency: f32,
    amplitude: f32,
    duration_secs: u64,
}

// Read config.toml at build time and export it as rustc environment variables
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        panic!("config.toml not found!");
    }

    let config_str = fs::read_to_string(config_path).expect("Failed to read config.toml");
    let config: Config = toml::from_str(&config_str).expect("Failed to parse config.toml");

    println!("cargo:rustc-env=APP_NAME={}", config.application.name);
    println!("cargo:rustc-env=APP_VERSION={}", config.application.version);

    // Playback device
    println!("cargo:rustc-env=PLAYBACK_DEVICE={}", config.playback.device);
    println!("cargo:rustc-env=PLAYBACK_BITS={}", config.playback.bits);
    println!("cargo:rustc-env=PLAYBACK_CHANNELS={}", config.playback.channels);
    println!("cargo:rustc-env=PLAYBACK_SAMPLE_RATE={}", config.playback.sample_rate);
    println!("cargo:rustc-env=PLAYBACK_BUFFER_FRAMES={}", config.playback.buffer_frames);
    println!("cargo:rustc-env=PLAYBACK_DUMP_HW_SETUP={}", config.playback.dump_hw_setup);

    // Worker policy
    println!("cargo:rustc-env=WORKER_QUEUE_DEPTH={}", config.worker.queue_depth);
    println!("cargo:rustc-env=WORKER_MAX_RESUBMITS={}", config.worker.max_resubmits);

    // Test tone
    println!("cargo:rustc-env=TONE_FREQUENCY={}", config.tone.frequency);
    println!("cargo:rustc-env=TONE_AMPLITUDE={}", config.tone.amplitude);
    println!("cargo:rustc-env=TONE_DURATION_SECS={}", config.tone.duration_secs);
}
