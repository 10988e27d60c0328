use std::path::Path;

use anyhow::Result;
use matra_audio::OnsetSource;
use matra_domain::{OnsetSequence, TempoEstimate};
use tracing::{info, instrument};

use crate::estimator::TempoEstimator;

pub struct TempoPipeline {
    source: OnsetSource,
    estimator: TempoEstimator,
}

impl TempoPipeline {
    pub fn new() -> Self {
        Self::with_parts(OnsetSource::new(), TempoEstimator::new())
    }

    pub fn with_parts(source: OnsetSource, estimator: TempoEstimator) -> Self {
        Self { source, estimator }
    }

    #[instrument(skip(self))]
    pub fn find_bpm(&self, path: &Path) -> Result<TempoEstimate> {
        info!("locating onsets");
        let sample_rate = self.source.sample_rate(path)?;
        let frames = self.source.onset_frames(path)?;
        info!(onsets = frames.len(), sample_rate, "scoring candidates");
        let estimate = self
            .estimator
            .estimate(&frames, sample_rate, self.source.hop_size())?;
        info!(bpm = estimate.bpm, offset = estimate.offset, "estimate ready");
        Ok(estimate)
    }

    pub fn onset_times(&self, path: &Path) -> Result<OnsetSequence> {
        self.source.onset_times(path)
    }

    pub fn invalidate(&self, path: &Path) -> Result<()> {
        self.source.invalidate(path)
    }
}

impl Default for TempoPipeline {
    fn default() -> Self {
        Self::new()
    }
}
