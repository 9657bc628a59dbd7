//! Square-wave test tone in the negotiated sample format.

use crate::audio::SampleFormat;

/// Interleaved square-wave generator; every channel carries the same signal.
pub struct SquareWave {
    format: SampleFormat,
    channels: usize,
    /// Phase in cycles, kept in [0, 1)
    phase: f32,
    step: f32,
    level: i16,
}

impl SquareWave {
    /// `amplitude` is a fraction of full scale and is clamped to [0, 1].
    pub fn new(
        format: SampleFormat,
        channels: u32,
        rate: u32,
        frequency: f32,
        amplitude: f32,
    ) -> Self {
        let full_scale = match format {
            SampleFormat::S8 => i8::MAX as f32,
            SampleFormat::S16LE => i16::MAX as f32,
        };
        Self {
            format,
            channels: channels as usize,
            phase: 0.0,
            step: frequency / rate.max(1) as f32,
            level: (amplitude.clamp(0.0, 1.0) * full_scale) as i16,
        }
    }

    pub fn frame_size(&self) -> usize {
        self.channels * self.format.bytes()
    }

    /// Render the next `frames` frames.
    pub fn next_frames(&mut self, frames: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(frames * self.frame_size());
        for _ in 0..frames {
            let sample = if self.phase < 0.5 { self.level } else { -self.level };
            for _ in 0..self.channels {
                match self.format {
                    SampleFormat::S8 => out.push(sample as i8 as u8),
                    SampleFormat::S16LE => out.extend_from_slice(&sample.to_le_bytes()),
                }
            }
            self.phase = (self.phase + self.step).fract();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_whole_frames() {
        let mut tone = SquareWave::new(SampleFormat::S16LE, 2, 44100, 440.0, 0.5);
        assert_eq!(tone.next_frames(4096).len(), 4096 * 4);

        let mut tone = SquareWave::new(SampleFormat::S8, 1, 8000, 1000.0, 1.0);
        assert_eq!(tone.next_frames(100).len(), 100);
    }

    #[test]
    fn s16_square_alternates_every_half_period() {
        // 4 frames per cycle: two high, two low
        let mut tone = SquareWave::new(SampleFormat::S16LE, 1, 4, 1.0, 1.0);
        let pcm = tone.next_frames(4);
        let samples: Vec<i16> = pcm
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(samples, vec![i16::MAX, i16::MAX, -i16::MAX, -i16::MAX]);
    }

    #[test]
    fn s8_channels_are_duplicated() {
        let mut tone = SquareWave::new(SampleFormat::S8, 2, 2, 1.0, 1.0);
        let pcm = tone.next_frames(2);
        assert_eq!(pcm, vec![127, 127, (-127i8) as u8, (-127i8) as u8]);
    }

    #[test]
    fn silent_when_amplitude_is_zero() {
        let mut tone = SquareWave::new(SampleFormat::S16LE, 2, 44100, 440.0, 0.0);
        assert!(tone.next_frames(64).iter().all(|&b| b == 0));
    }
}
