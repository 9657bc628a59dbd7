//! Dedicated playback thread around a blocking [`AudioSink`].
//!
//! Uses std::thread (NOT tokio tasks) so the blocking ALSA write never stalls the
//! async runtime. PCM buffers arrive over a bounded channel, which also paces the
//! producer once the queue fills. Stopping the worker closes the queue even while
//! producers still hold senders; buffers already queued are played out first.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};

use super::alsa_device::AlsaDevice;
use super::device::PcmDevice;
use super::error::{DeviceError, OpenError};
use super::format::SinkParams;
use super::sink::{AudioSink, Negotiated, WriteStatus};

/// Playback thread policy.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Buffers queued between producer and playback thread
    pub queue_depth: usize,
    /// How often the unwritten tail of a buffer is resubmitted after a short or
    /// failed write before it is dropped (0 = never)
    pub max_resubmits: u32,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            queue_depth: 8,
            max_resubmits: 3,
        }
    }
}

/// Counters shared with the playback thread.
#[derive(Debug, Default)]
pub struct PlaybackStats {
    frames_written: AtomicU64,
    short_writes: AtomicU64,
    write_errors: AtomicU64,
    dropped_frames: AtomicU64,
}

impl PlaybackStats {
    pub fn frames_written(&self) -> u64 {
        self.frames_written.load(Ordering::Relaxed)
    }

    pub fn short_writes(&self) -> u64 {
        self.short_writes.load(Ordering::Relaxed)
    }

    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }
}

/// Owns the playback thread and the sending half of its queue.
pub struct PlaybackWorker {
    tx: Option<mpsc::Sender<Vec<u8>>>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    negotiated: Negotiated,
    stats: Arc<PlaybackStats>,
}

impl PlaybackWorker {
    /// Open the ALSA device on a new playback thread.
    pub async fn start(params: SinkParams, options: WorkerOptions) -> Result<Self> {
        Self::start_with(params, options, AlsaDevice::open).await
    }

    /// Open a device through `opener` on a new playback thread.
    ///
    /// Resolves once the device is configured, or with the open error.
    pub async fn start_with<D, F>(
        params: SinkParams,
        options: WorkerOptions,
        opener: F,
    ) -> Result<Self>
    where
        D: PcmDevice + 'static,
        F: FnOnce(&str) -> Result<D, DeviceError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Vec<u8>>(options.queue_depth.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (ready_tx, ready_rx) = oneshot::channel::<Result<Negotiated, OpenError>>();
        let stats = Arc::new(PlaybackStats::default());

        log::info!(
            "PlaybackWorker starting: device: \"{}\", {}-bit, rate: {}Hz, ch: {}, buffer: {}",
            params.device_name(),
            params.bits,
            params.rate,
            params.channels,
            params.buffer_frames,
        );

        let handle = {
            let stats = stats.clone();
            thread::Builder::new()
                .name("audio-play".into())
                .spawn(move || {
                    let sink = match AudioSink::open_with(&params, opener) {
                        Ok(sink) => {
                            let _ = ready_tx.send(Ok(sink.negotiated().clone()));
                            sink
                        }
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };
                    if let Err(e) =
                        play_thread(sink, rx, shutdown_rx, options.max_resubmits, &stats)
                    {
                        log::error!("Playback thread error: {}", e);
                    }
                })?
        };

        let negotiated = match ready_rx.await {
            Ok(Ok(negotiated)) => negotiated,
            Ok(Err(e)) => {
                let _ = handle.join();
                let stage = e.stage();
                return Err(e).with_context(|| format!("Playback device failed at {}", stage));
            }
            Err(_) => {
                let _ = handle.join();
                anyhow::bail!("Playback thread exited before opening the device");
            }
        };

        Ok(Self {
            tx: Some(tx),
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
            negotiated,
            stats,
        })
    }

    pub fn negotiated(&self) -> &Negotiated {
        &self.negotiated
    }

    pub fn stats(&self) -> Arc<PlaybackStats> {
        self.stats.clone()
    }

    /// Sender for PCM buffers; cloned so producers can run in their own tasks.
    ///
    /// Sends start failing once the worker is stopped.
    pub fn sender(&self) -> Option<mpsc::Sender<Vec<u8>>> {
        self.tx.clone()
    }

    /// Queue one buffer of interleaved frames, waiting while the queue is full.
    pub async fn submit(&self, pcm: Vec<u8>) -> Result<()> {
        let tx = self.tx.as_ref().context("Playback worker stopped")?;
        tx.send(pcm)
            .await
            .map_err(|_| anyhow::anyhow!("Playback thread is gone"))
    }

    /// Close the queue, let the thread play out what is queued, and join it.
    pub fn stop(&mut self) {
        self.tx.take();
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(h) = self.handle.take() {
            if h.join().is_err() {
                log::error!("Playback thread panicked");
            }
        }
    }
}

impl Drop for PlaybackWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn play_thread<D: PcmDevice>(
    mut sink: AudioSink<D>,
    mut rx: mpsc::Receiver<Vec<u8>>,
    mut shutdown: oneshot::Receiver<()>,
    max_resubmits: u32,
    stats: &PlaybackStats,
) -> Result<()> {
    // Only drives the channel waits; writes run on this thread outside block_on
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("Failed to build playback wait runtime")?;

    log::info!(
        "Playback started: rate={}, ch={}, buffer={}",
        sink.rate(),
        sink.negotiated().channels,
        sink.negotiated_buffer_size(),
    );

    loop {
        let next = rt.block_on(async {
            tokio::select! {
                biased;
                _ = &mut shutdown => None,
                pcm = rx.recv() => Some(pcm),
            }
        });
        match next {
            Some(Some(pcm)) => play_buffer(&mut sink, &pcm, max_resubmits, stats),
            // Every sender dropped
            Some(None) => {
                log::info!("Playback channel closed");
                return Ok(());
            }
            None => break,
        }
    }

    // Stop requested: refuse new buffers, play out what is already queued
    rx.close();
    while let Ok(pcm) = rx.try_recv() {
        play_buffer(&mut sink, &pcm, max_resubmits, stats);
    }
    log::info!("Playback stopped");
    Ok(())
}

/// Write one buffer, resubmitting the unwritten tail up to `max_resubmits` times.
fn play_buffer<D: PcmDevice>(
    sink: &mut AudioSink<D>,
    pcm: &[u8],
    max_resubmits: u32,
    stats: &PlaybackStats,
) {
    let frame_size = sink.frame_size();
    let total_frames = pcm.len() / frame_size;
    let mut frames_written = 0;
    let mut retry_count = 0u32;

    while frames_written < total_frames {
        let status = sink.write(&pcm[frames_written * frame_size..]);
        let n = status.frames_written();
        frames_written += n;
        stats.frames_written.fetch_add(n as u64, Ordering::Relaxed);

        match status {
            WriteStatus::Complete { .. } => break,
            WriteStatus::Short { .. } => {
                stats.short_writes.fetch_add(1, Ordering::Relaxed);
            }
            WriteStatus::Failed { recovered, .. } => {
                stats.write_errors.fetch_add(1, Ordering::Relaxed);
                if !recovered {
                    retry_count = max_resubmits;
                }
            }
        }

        if retry_count >= max_resubmits {
            let dropped = total_frames - frames_written;
            stats
                .dropped_frames
                .fetch_add(dropped as u64, Ordering::Relaxed);
            if max_resubmits > 0 {
                log::error!(
                    "Max resubmits ({}) reached. Dropping {} unwritten frames.",
                    max_resubmits,
                    dropped
                );
            }
            break;
        }
        retry_count += 1;
    }
}
