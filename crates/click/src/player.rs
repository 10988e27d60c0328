use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use matra_audio::{resample_linear, AudioDecoder};
use ringbuf::HeapRb;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::schedule::ClickSchedule;
use crate::sound::ClickSound;

/// Capacity of the trigger queue feeding the audio callback.
const TRIGGER_QUEUE: usize = 64;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlayerConfig {
    /// Gain applied to the decoded track so clicks sit on top of it.
    pub track_gain: f32,
    /// Gain applied to the click itself.
    pub click_gain: f32,
    /// How often the scheduling loop checks the playback clock.
    pub poll_interval: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            track_gain: 0.5,
            click_gain: 1.0,
            poll_interval: Duration::from_millis(1),
        }
    }
}

pub struct ClickPlayer {
    config: PlayerConfig,
}

impl ClickPlayer {
    pub fn new() -> Self {
        Self::with_config(PlayerConfig::default())
    }

    pub fn with_config(config: PlayerConfig) -> Self {
        Self { config }
    }

    /// Blocks until the track has played to its end.
    pub fn play(&self, path: &Path, schedule: &ClickSchedule) -> Result<()> {
        let decoded = AudioDecoder::open(path)?;

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("no audio output device available"))?;
        let supported = device
            .default_output_config()
            .context("querying default output config")?;
        let device_rate = supported.sample_rate().0;

        let track = if device_rate == decoded.sample_rate {
            decoded.samples
        } else {
            let target = (decoded.samples.len() as f64 * device_rate as f64
                / decoded.sample_rate as f64)
                .round() as usize;
            debug!(
                from = decoded.sample_rate,
                to = device_rate,
                "resampling track to the device rate"
            );
            resample_linear(&decoded.samples, target)
        };

        let mixer = Mixer::new(
            track,
            self.config.track_gain,
            ClickSound::standard(device_rate),
            self.config.click_gain,
        );

        match supported.sample_format() {
            cpal::SampleFormat::F32 => {
                self.run::<f32>(&device, &supported.config(), mixer, schedule, device_rate)
            }
            cpal::SampleFormat::I16 => {
                self.run::<i16>(&device, &supported.config(), mixer, schedule, device_rate)
            }
            cpal::SampleFormat::U16 => {
                self.run::<u16>(&device, &supported.config(), mixer, schedule, device_rate)
            }
            format => Err(anyhow!("unsupported output sample format {format}")),
        }
    }

    fn run<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        mut mixer: Mixer,
        schedule: &ClickSchedule,
        sample_rate: u32,
    ) -> Result<()>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = config.channels as usize;
        let frames_played = Arc::new(AtomicU64::new(0));
        let finished = Arc::new(AtomicBool::new(false));
        let (mut trigger_tx, mut trigger_rx) = HeapRb::<()>::new(TRIGGER_QUEUE).split();

        let clock = frames_played.clone();
        let done = finished.clone();
        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let mut retrigger = false;
                    while trigger_rx.pop().is_some() {
                        retrigger = true;
                    }
                    if retrigger {
                        mixer.restart_click();
                    }
                    let frames = write_frames(data, channels, &mut mixer);
                    clock.fetch_add(frames, Ordering::Relaxed);
                    if mixer.track_done() {
                        done.store(true, Ordering::Relaxed);
                    }
                },
                |err| warn!(%err, "output stream error"),
                None,
            )
            .context("building output stream")?;
        stream.play().context("starting output stream")?;
        info!(sample_rate, "playback started");

        let mut upcoming = schedule.times();
        let mut next_click = upcoming.next();
        while !finished.load(Ordering::Relaxed) {
            let elapsed = frames_played.load(Ordering::Relaxed) as f64 / sample_rate as f64;
            while let Some(at) = next_click {
                if at > elapsed {
                    break;
                }
                if trigger_tx.push(()).is_err() {
                    warn!("click trigger queue full, dropping click");
                }
                next_click = upcoming.next();
            }
            std::thread::sleep(self.config.poll_interval);
        }
        drop(stream);
        info!("playback finished");
        Ok(())
    }
}

impl Default for ClickPlayer {
    fn default() -> Self {
        Self::new()
    }
}

fn write_frames<T>(output: &mut [T], channels: usize, mixer: &mut Mixer) -> u64
where
    T: Sample + FromSample<f32>,
{
    let mut produced = 0;
    for frame in output.chunks_mut(channels) {
        let value: T = T::from_sample(mixer.next_sample());
        for sample in frame.iter_mut() {
            *sample = value;
        }
        produced += 1;
    }
    produced
}

struct Mixer {
    track: Vec<f32>,
    track_gain: f32,
    position: usize,
    click: Vec<f32>,
    click_gain: f32,
    click_position: usize,
}

impl Mixer {
    fn new(track: Vec<f32>, track_gain: f32, click: ClickSound, click_gain: f32) -> Self {
        let click = click.samples().to_vec();
        // Start past the end so nothing sounds before the first trigger.
        let click_position = click.len();
        Self {
            track,
            track_gain,
            position: 0,
            click,
            click_gain,
            click_position,
        }
    }

    fn restart_click(&mut self) {
        self.click_position = 0;
    }

    fn track_done(&self) -> bool {
        self.position >= self.track.len()
    }

    fn next_sample(&mut self) -> f32 {
        let mut sample = 0.0;
        if self.position < self.track.len() {
            sample += self.track[self.position] * self.track_gain;
            self.position += 1;
        }
        if self.click_position < self.click.len() {
            sample += self.click[self.click_position] * self.click_gain;
            self.click_position += 1;
        }
        sample
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn silent_click() -> ClickSound {
        ClickSound::generate(1000, 1000.0, 0.0)
    }

    #[test]
    fn track_plays_at_reduced_gain() {
        let mut mixer = Mixer::new(vec![1.0, 1.0, 1.0], 0.5, silent_click(), 1.0);
        assert_relative_eq!(mixer.next_sample(), 0.5);
        assert_relative_eq!(mixer.next_sample(), 0.5);
        assert!(!mixer.track_done());
        assert_relative_eq!(mixer.next_sample(), 0.5);
        assert!(mixer.track_done());
        assert_relative_eq!(mixer.next_sample(), 0.0);
    }

    #[test]
    fn click_is_silent_until_triggered() {
        let click = ClickSound::standard(48_000);
        let mut mixer = Mixer::new(vec![0.0; 8], 0.5, click, 1.0);
        for _ in 0..8 {
            assert_relative_eq!(mixer.next_sample(), 0.0);
        }
    }

    #[test]
    fn trigger_mixes_click_over_track() {
        let click = ClickSound::standard(48_000);
        let second = click.samples()[1];
        let mut mixer = Mixer::new(vec![0.2; 8], 0.5, click, 1.0);
        mixer.restart_click();
        // First click sample is sin(0) = 0; the second is audible.
        assert_relative_eq!(mixer.next_sample(), 0.1);
        assert_relative_eq!(mixer.next_sample(), 0.1 + second);
    }

    #[test]
    fn retrigger_restarts_the_click() {
        let click = ClickSound::standard(48_000);
        let second = click.samples()[1];
        let mut mixer = Mixer::new(vec![0.0; 32], 1.0, click, 1.0);
        mixer.restart_click();
        mixer.next_sample();
        mixer.next_sample();
        mixer.restart_click();
        mixer.next_sample();
        assert_relative_eq!(mixer.next_sample(), second);
    }

    #[test]
    fn click_gain_scales_the_click() {
        let click = ClickSound::standard(48_000);
        let second = click.samples()[1];
        let mut mixer = Mixer::new(vec![0.0; 8], 1.0, click, 0.25);
        mixer.restart_click();
        mixer.next_sample();
        assert_relative_eq!(mixer.next_sample(), second * 0.25);
    }
}
