mod config;

use alsa_out::audio::{PERIODS_PER_BUFFER, PlaybackWorker};
use alsa_out::tone::SquareWave;
use config::Config;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::new().map_err(anyhow::Error::msg)?;
    log::info!("{} {}", config.app_name, config.app_version);

    let started = PlaybackWorker::start(config.sink_params(), config.worker_options()).await;
    let mut worker = match started {
        Ok(worker) => worker,
        Err(e) => {
            log::error!("{:#}", e);
            return Err(e);
        }
    };

    let negotiated = worker.negotiated().clone();
    let mut tone = SquareWave::new(
        negotiated.format,
        negotiated.channels,
        negotiated.rate,
        config.tone_frequency,
        config.tone_amplitude,
    );

    // One period per buffer keeps the hardware queue topped up without overfilling it
    let chunk_frames = (negotiated.buffer_frames / PERIODS_PER_BUFFER as usize).max(1);
    let total_frames = negotiated.rate as u64 * config.tone_duration_secs;
    let Some(tx) = worker.sender() else {
        anyhow::bail!("Playback worker has no queue");
    };

    let feed = async move {
        let mut sent = 0u64;
        while sent < total_frames {
            let frames = chunk_frames.min((total_frames - sent) as usize);
            if tx.send(tone.next_frames(frames)).await.is_err() {
                log::warn!("Playback thread closed its queue");
                break;
            }
            sent += frames as u64;
        }
    };

    tokio::select! {
        _ = feed => {
            log::info!("Tone finished after {} s", config.tone_duration_secs);
        }
        _ = signal::ctrl_c() => {
            log::info!("Interrupted, stopping playback");
        }
    }

    let stats = worker.stats();
    // Let the queued tail play out before the sink drops pending frames
    tokio::task::spawn_blocking(move || worker.stop()).await?;

    log::info!(
        "Played {} frames ({} short writes, {} write errors, {} frames dropped)",
        stats.frames_written(),
        stats.short_writes(),
        stats.write_errors(),
        stats.dropped_frames(),
    );

    Ok(())
}
