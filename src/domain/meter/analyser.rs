//! Frequency-domain loudness analyser
//!
//! Behaves like a 256-point FFT analyser node: Blackman-windowed input,
//! magnitude spectrum smoothed over time, decibels mapped onto 0..255.

use std::f32::consts::PI;

/// Analysis window length in samples
pub const FFT_SIZE: usize = 256;

/// Number of frequency bins produced per frame
pub const BIN_COUNT: usize = FFT_SIZE / 2;

const SMOOTHING_TIME_CONSTANT: f32 = 0.8;
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

/// Map averaged byte energy onto a 0..100 level (gain 1.5, capped)
pub fn normalize_level(bins: &[u8]) -> u8 {
    if bins.is_empty() {
        return 0;
    }
    let sum: u32 = bins.iter().map(|b| u32::from(*b)).sum();
    let average = sum as f64 / bins.len() as f64;
    (average / 255.0 * 100.0 * 1.5).round().min(100.0) as u8
}

/// Stateful spectrum analyser. State is the smoothed spectrum only.
pub struct VolumeAnalyser {
    window: Vec<f32>,
    cos_table: Vec<f32>,
    sin_table: Vec<f32>,
    smoothed: Vec<f32>,
}

impl VolumeAnalyser {
    pub fn new() -> Self {
        let n = FFT_SIZE as f32;
        let window = (0..FFT_SIZE)
            .map(|i| {
                let x = i as f32 / n;
                0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
            })
            .collect();
        let cos_table = (0..FFT_SIZE).map(|i| (2.0 * PI * i as f32 / n).cos()).collect();
        let sin_table = (0..FFT_SIZE).map(|i| (2.0 * PI * i as f32 / n).sin()).collect();

        Self {
            window,
            cos_table,
            sin_table,
            smoothed: vec![0.0; BIN_COUNT],
        }
    }

    /// Compute byte frequency data from the most recent samples.
    /// Short input is zero-padded at the front; long input keeps the tail.
    pub fn byte_frequency_data(&mut self, samples: &[f32]) -> [u8; BIN_COUNT] {
        let mut frame = [0.0f32; FFT_SIZE];
        let take = samples.len().min(FFT_SIZE);
        frame[FFT_SIZE - take..].copy_from_slice(&samples[samples.len() - take..]);
        for (s, w) in frame.iter_mut().zip(&self.window) {
            *s *= w;
        }

        let mut out = [0u8; BIN_COUNT];
        let scale = 255.0 / (MAX_DECIBELS - MIN_DECIBELS);
        for (k, byte) in out.iter_mut().enumerate() {
            let (mut re, mut im) = (0.0f32, 0.0f32);
            for (i, s) in frame.iter().enumerate() {
                let idx = (k * i) % FFT_SIZE;
                re += s * self.cos_table[idx];
                im -= s * self.sin_table[idx];
            }
            let magnitude = (re * re + im * im).sqrt() / FFT_SIZE as f32;

            let smoothed = SMOOTHING_TIME_CONSTANT * self.smoothed[k]
                + (1.0 - SMOOTHING_TIME_CONSTANT) * magnitude;
            self.smoothed[k] = if smoothed.is_finite() { smoothed } else { 0.0 };

            let db = 20.0 * self.smoothed[k].log10();
            *byte = if db.is_finite() {
                (scale * (db - MIN_DECIBELS)).clamp(0.0, 255.0) as u8
            } else {
                0
            };
        }
        out
    }

    /// Loudness level 0..100 of the most recent samples
    pub fn level(&mut self, samples: &[f32]) -> u8 {
        normalize_level(&self.byte_frequency_data(samples))
    }
}

impl Default for VolumeAnalyser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(bin: usize, amplitude: f32) -> Vec<f32> {
        (0..FFT_SIZE)
            .map(|i| amplitude * (2.0 * PI * bin as f32 * i as f32 / FFT_SIZE as f32).sin())
            .collect()
    }

    #[test]
    fn normalize_matches_formula() {
        assert_eq!(normalize_level(&[]), 0);
        assert_eq!(normalize_level(&[0; 128]), 0);
        assert_eq!(normalize_level(&[255; 128]), 100);
        // avg 100 -> 100/255*150 = 58.8
        assert_eq!(normalize_level(&[100; 128]), 59);
        // gain saturates at 100
        assert_eq!(normalize_level(&[200; 128]), 100);
    }

    #[test]
    fn silence_is_zero() {
        let mut analyser = VolumeAnalyser::new();
        assert_eq!(analyser.level(&[0.0; FFT_SIZE]), 0);
        assert_eq!(analyser.level(&[]), 0);
    }

    #[test]
    fn tone_raises_level() {
        let mut analyser = VolumeAnalyser::new();
        let tone = sine(8, 1.0);
        let mut level = 0;
        for _ in 0..10 {
            level = analyser.level(&tone);
        }
        assert!(level > 0);

        let bins = analyser.byte_frequency_data(&tone);
        assert!(bins[8] > bins[64]);
    }

    #[test]
    fn smoothing_decays_after_signal_stops() {
        let mut analyser = VolumeAnalyser::new();
        let tone = sine(8, 0.01);
        for _ in 0..10 {
            analyser.level(&tone);
        }
        let loud = analyser.byte_frequency_data(&tone)[8];
        let mut quiet = loud;
        for _ in 0..5 {
            quiet = analyser.byte_frequency_data(&[0.0; FFT_SIZE])[8];
        }
        assert!(quiet < loud);
    }
}
