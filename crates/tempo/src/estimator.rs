use matra_domain::{DomainError, OnsetFrames, TempoEstimate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::grid::{GridMatcher, DEFAULT_TOLERANCE};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct EstimatorConfig {
    /// Matching window around each grid line, in seconds.
    pub tolerance: f64,
    /// Candidates span the initial estimate plus or minus this many BPM.
    pub search_radius: i64,
    /// Fractional step between swing candidates.
    pub swing_step: f64,
    /// Score bonus per matched onset for integer candidates.
    pub straight_boost: f64,
    /// Initial estimates above this are halved before the search.
    pub max_initial_bpm: i64,
    /// Final results below this are doubled once.
    pub min_final_bpm: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            search_radius: 50,
            swing_step: 2.0 / 3.0,
            straight_boost: 0.05,
            max_initial_bpm: 300,
            min_final_bpm: 100.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    score: f64,
    bpm: f64,
    offset: f64,
}

pub struct TempoEstimator {
    config: EstimatorConfig,
    matcher: GridMatcher,
}

impl TempoEstimator {
    pub fn new() -> Self {
        Self::with_config(EstimatorConfig::default())
    }

    pub fn with_config(config: EstimatorConfig) -> Self {
        Self {
            config,
            matcher: GridMatcher::new(config.tolerance),
        }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn estimate(
        &self,
        frames: &OnsetFrames,
        sample_rate: u32,
        hop_size: usize,
    ) -> Result<TempoEstimate, DomainError> {
        if frames.len() < 2 {
            return Err(DomainError::InsufficientOnsets {
                found: frames.len(),
                needed: 2,
            });
        }
        let times = frames.to_times(sample_rate, hop_size)?;
        let times = times.times();
        let initial = self.initial_estimate(frames, sample_rate, hop_size);
        debug!(initial, onsets = times.len(), "searching tempo candidates");

        let radius = self.config.search_radius;
        let seed = Candidate {
            score: f64::NEG_INFINITY,
            bpm: (initial / 2) as f64,
            offset: 0.0,
        };
        // Integer candidates carry the boost and drop an octave the moment
        // they take the lead. Even winners halve cleanly; odd winners keep
        // the half-BPM fraction.
        let best = (-radius..radius)
            .map(|delta| initial + delta)
            .filter(|&bpm| bpm > 0)
            .fold(seed, |best, bpm| {
                let result =
                    self.matcher
                        .score(times, 60.0 / bpm as f64, self.config.straight_boost);
                if result.score > best.score {
                    Candidate {
                        score: result.score,
                        bpm: if bpm % 2 == 0 {
                            (bpm / 2) as f64
                        } else {
                            bpm as f64 / 2.0
                        },
                        offset: result.offset,
                    }
                } else {
                    best
                }
            });
        // Swing candidates score without the boost and are kept unhalved.
        let best = (-radius..radius)
            .map(|delta| initial as f64 + delta as f64 * self.config.swing_step)
            .filter(|&bpm| bpm > 0.0)
            .fold(best, |best, bpm| {
                let result = self.matcher.score(times, 60.0 / bpm, 0.0);
                if result.score > best.score {
                    Candidate {
                        score: result.score,
                        bpm,
                        offset: result.offset,
                    }
                } else {
                    best
                }
            });

        if best.score <= 0.0 {
            warn!("no candidate grid matched any onsets");
        }
        let mut bpm = best.bpm;
        if bpm < self.config.min_final_bpm {
            bpm *= 2.0;
        }
        debug!(bpm, offset = best.offset, score = best.score, "candidate selected");
        TempoEstimate::new(bpm, round_to_millis(best.offset))
    }

    fn initial_estimate(&self, frames: &OnsetFrames, sample_rate: u32, hop_size: usize) -> i64 {
        let gaps = frames.gaps();
        let median_gap = median_gap_frames(&gaps);
        let estimate =
            (60.0 / median_gap as f64 * sample_rate as f64 / hop_size as f64).round() as i64;
        if estimate > self.config.max_initial_bpm {
            estimate / 2
        } else {
            estimate
        }
    }
}

impl Default for TempoEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Median gap in whole frames; even counts truncate toward zero.
fn median_gap_frames(gaps: &[u64]) -> u64 {
    let mut sorted = gaps.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        // Halves first, so huge stored frame gaps cannot overflow the sum.
        let (a, b) = (sorted[mid - 1], sorted[mid]);
        a / 2 + b / 2 + (a & b & 1)
    }
}

fn round_to_millis(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
