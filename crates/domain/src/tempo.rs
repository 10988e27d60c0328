use serde::{Deserialize, Serialize};

use crate::DomainError;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct TempoEstimate {
    /// Beats per minute.
    pub bpm: f64,
    /// Seconds from the start of the recording to the first beat.
    pub offset: f64,
}

impl TempoEstimate {
    pub fn new(bpm: f64, offset: f64) -> Result<Self, DomainError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(DomainError::validation("bpm must be finite and positive"));
        }
        if !offset.is_finite() {
            return Err(DomainError::validation("beat offset must be finite"));
        }
        Ok(Self { bpm, offset })
    }

    pub fn beat_interval(&self) -> f64 {
        60.0 / self.bpm
    }

    pub fn beat_time(&self, beat: u64) -> f64 {
        self.offset + beat as f64 * self.beat_interval()
    }

    /// Whether this agrees with `target` up to a factor-of-two error.
    pub fn matches_octave(&self, target: f64) -> bool {
        const EPSILON: f64 = 1e-6;
        [self.bpm, self.bpm * 2.0, self.bpm / 2.0]
            .iter()
            .any(|candidate| (candidate - target).abs() < EPSILON)
    }
}
