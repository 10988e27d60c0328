use anyhow::Result;
use matra_domain::OnsetFrames;
use ndarray::Array1;
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct OnsetConfig {
    /// FFT window length in samples.
    pub window_size: usize,
    /// Analysis hop in samples; one frame index spans this many samples.
    pub hop_size: usize,
    /// Peaks must exceed mean + this many standard deviations of the flux.
    pub threshold_factor: f32,
    /// Minimum spacing between reported onsets, in milliseconds.
    pub min_gap_ms: f64,
}

impl Default for OnsetConfig {
    fn default() -> Self {
        Self {
            window_size: 2048,
            hop_size: 512,
            threshold_factor: 1.5,
            min_gap_ms: 30.0,
        }
    }
}

pub struct OnsetDetector {
    config: OnsetConfig,
}

impl OnsetDetector {
    pub fn new(config: OnsetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OnsetConfig {
        &self.config
    }

    /// Detects onsets in a mono signal, returned as analysis frame indices.
    pub fn detect(&self, samples: &[f32], sample_rate: u32) -> Result<OnsetFrames> {
        let flux = self.spectral_flux(samples)?;
        let frames = self.pick_peaks(&flux, sample_rate);
        debug!(
            onsets = frames.len(),
            frames_scanned = flux.len(),
            "onset detection finished"
        );
        Ok(OnsetFrames::new(frames)?)
    }

    fn spectral_flux(&self, samples: &[f32]) -> Result<Vec<f32>> {
        let window = self.config.window_size;
        let hop = self.config.hop_size;
        if samples.len() < window {
            return Ok(Vec::new());
        }
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(window);
        let hann: Vec<f32> = (0..window)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / window as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect();

        let frame_count = (samples.len() - window) / hop + 1;
        let mut input = fft.make_input_vec();
        let mut spectrum = fft.make_output_vec();
        let mut previous: Option<Array1<f32>> = None;
        let mut flux = Vec::with_capacity(frame_count);
        for frame in 0..frame_count {
            let start = frame * hop;
            for (slot, (&sample, &coeff)) in input
                .iter_mut()
                .zip(samples[start..start + window].iter().zip(hann.iter()))
            {
                *slot = sample * coeff;
            }
            fft.process(&mut input, &mut spectrum)?;
            let magnitudes = Array1::from_iter(spectrum.iter().map(|bin| bin.norm()));
            flux.push(match &previous {
                // Rising spectral energy only; decay does not mark an onset.
                Some(prev) => (&magnitudes - prev).mapv(|diff| diff.max(0.0)).sum(),
                None => 0.0,
            });
            previous = Some(magnitudes);
        }
        Ok(flux)
    }

    fn pick_peaks(&self, flux: &[f32], sample_rate: u32) -> Vec<u64> {
        if flux.len() < 3 {
            return Vec::new();
        }
        let mean = flux.iter().sum::<f32>() / flux.len() as f32;
        let variance = flux.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / flux.len() as f32;
        let threshold = mean + self.config.threshold_factor * variance.sqrt();
        let min_gap = (self.config.min_gap_ms / 1000.0 * sample_rate as f64
            / self.config.hop_size as f64)
            .ceil() as u64;
        let min_gap = min_gap.max(1);

        let mut onsets = Vec::new();
        for i in 1..flux.len() - 1 {
            if flux[i] > threshold && flux[i] > flux[i - 1] && flux[i] > flux[i + 1] {
                let frame = i as u64;
                if onsets.last().map_or(true, |&last| frame - last >= min_gap) {
                    onsets.push(frame);
                }
            }
        }
        onsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::generate_kick_pattern;

    #[test]
    fn silence_has_no_onsets() {
        let detector = OnsetDetector::new(OnsetConfig::default());
        let frames = detector.detect(&vec![0.0; 44100], 44100).unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn short_input_has_no_onsets() {
        let detector = OnsetDetector::new(OnsetConfig::default());
        let frames = detector.detect(&[0.1; 256], 44100).unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn finds_regular_kicks() {
        let sample_rate = 22050;
        let samples = generate_kick_pattern(sample_rate, 120.0, 8);
        let detector = OnsetDetector::new(OnsetConfig::default());
        let frames = detector.detect(&samples, sample_rate).unwrap();

        assert!(frames.len() >= 6, "found {} onsets", frames.len());
        assert!(frames.len() <= 9, "found {} onsets", frames.len());
        // 120 BPM at hop 512 puts consecutive kicks 21-22 frames apart.
        let mut gaps = frames.gaps();
        gaps.sort_unstable();
        let median_gap = gaps[gaps.len() / 2];
        assert!(
            (20..=23).contains(&median_gap),
            "median gap {median_gap} frames"
        );
    }

    #[test]
    fn respects_min_gap() {
        let sample_rate = 22050;
        let samples = generate_kick_pattern(sample_rate, 120.0, 8);
        let config = OnsetConfig {
            // A one-second floor keeps roughly every third half-second kick.
            min_gap_ms: 1000.0,
            ..OnsetConfig::default()
        };
        let frames = OnsetDetector::new(config).detect(&samples, sample_rate).unwrap();
        assert!(frames.len() >= 2, "found {} onsets", frames.len());
        assert!(frames.len() <= 4, "found {} onsets", frames.len());
    }
}
