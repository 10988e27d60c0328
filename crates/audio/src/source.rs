use std::path::Path;

use anyhow::{Context, Result};
use matra_domain::{OnsetFrames, OnsetSequence};
use tracing::{debug, info};

use crate::cache::{BeatmapStore, FsBeatmapStore};
use crate::io::{probe_sample_rate, AudioDecoder};
use crate::onset::{OnsetConfig, OnsetDetector};

/// Produces onset frames, consulting the beatmap store before detection.
pub struct OnsetSource {
    config: OnsetConfig,
    store: Box<dyn BeatmapStore>,
    write_back: bool,
}

impl OnsetSource {
    pub fn new() -> Self {
        Self::with_store(OnsetConfig::default(), Box::new(FsBeatmapStore))
    }

    pub fn with_store(config: OnsetConfig, store: Box<dyn BeatmapStore>) -> Self {
        Self {
            config,
            store,
            write_back: false,
        }
    }

    pub fn write_back(mut self, enabled: bool) -> Self {
        self.write_back = enabled;
        self
    }

    pub fn hop_size(&self) -> usize {
        self.config.hop_size
    }

    /// Sample rate from the container header; never decodes.
    pub fn sample_rate(&self, path: &Path) -> Result<u32> {
        probe_sample_rate(path)
    }

    pub fn onset_frames(&self, path: &Path) -> Result<OnsetFrames> {
        if let Some(frames) = self.store.read(path)? {
            debug!(onsets = frames.len(), "using stored beatmap for {:?}", path);
            return Ok(frames);
        }
        info!("detecting onsets in {:?}", path);
        let audio = AudioDecoder::open(path)?;
        let detector = OnsetDetector::new(self.config);
        let frames = detector.detect(&audio.samples, audio.sample_rate)?;
        if self.write_back {
            self.store
                .write(path, &frames)
                .with_context(|| format!("store beatmap for {:?}", path))?;
            debug!(onsets = frames.len(), "stored beatmap for {:?}", path);
        }
        Ok(frames)
    }

    pub fn onset_times(&self, path: &Path) -> Result<OnsetSequence> {
        let sample_rate = self.sample_rate(path)?;
        let frames = self.onset_frames(path)?;
        Ok(frames.to_times(sample_rate, self.config.hop_size)?)
    }

    pub fn invalidate(&self, path: &Path) -> Result<()> {
        self.store.invalidate(path)?;
        Ok(())
    }
}

impl Default for OnsetSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use matra_domain::OnsetFrames;

    use super::*;
    use crate::cache::MemoryBeatmapStore;
    use crate::testutil::{generate_kick_pattern, write_wav};

    #[test]
    fn stored_beatmap_skips_decoding() {
        let store = MemoryBeatmapStore::new();
        let key = PathBuf::from("never-decoded.mp3");
        store
            .write(&key, &OnsetFrames::new(vec![10, 31, 52]).unwrap())
            .unwrap();

        let source = OnsetSource::with_store(OnsetConfig::default(), Box::new(store));
        // The audio file does not exist; only the store is consulted.
        let frames = source.onset_frames(&key).unwrap();
        assert_eq!(frames.frames(), &[10, 31, 52]);
    }

    #[test]
    fn corrupt_beatmap_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("track.wav");
        write_wav(&key, 22050, &generate_kick_pattern(22050, 120.0, 4));
        std::fs::write(FsBeatmapStore::sidecar_path(&key), "garbage\n").unwrap();

        let source = OnsetSource::new();
        assert!(source.onset_frames(&key).is_err());
    }

    #[test]
    fn detection_runs_on_store_miss() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("kicks.wav");
        write_wav(&key, 22050, &generate_kick_pattern(22050, 120.0, 8));

        let source = OnsetSource::new();
        let frames = source.onset_frames(&key).unwrap();
        assert!(frames.len() >= 6);
        // Write-back defaults off: no sidecar appears.
        assert!(!FsBeatmapStore::sidecar_path(&key).exists());
    }

    #[test]
    fn write_back_persists_detected_onsets() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("kicks.wav");
        write_wav(&key, 22050, &generate_kick_pattern(22050, 120.0, 8));

        let source = OnsetSource::new().write_back(true);
        let detected = source.onset_frames(&key).unwrap();
        let stored = FsBeatmapStore.read(&key).unwrap().unwrap();
        assert_eq!(stored, detected);

        source.invalidate(&key).unwrap();
        assert!(FsBeatmapStore.read(&key).unwrap().is_none());
    }

    #[test]
    fn onset_times_use_header_rate_and_hop() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("track.wav");
        write_wav(&key, 22050, &[0.0; 4096]);

        let store = MemoryBeatmapStore::new();
        store
            .write(&key, &OnsetFrames::new(vec![43, 86]).unwrap())
            .unwrap();
        let source = OnsetSource::with_store(OnsetConfig::default(), Box::new(store));
        let times = source.onset_times(&key).unwrap();
        assert!((times.times()[0] - 43.0 * 512.0 / 22050.0).abs() < 1e-9);
        assert!((times.times()[1] - 86.0 * 512.0 / 22050.0).abs() < 1e-9);
    }
}
