use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Onset positions in analysis-frame units.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OnsetFrames {
    frames: Vec<u64>,
}

impl OnsetFrames {
    pub fn new(frames: Vec<u64>) -> Result<Self, DomainError> {
        if frames.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(DomainError::validation(
                "onset frames must be strictly increasing",
            ));
        }
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[u64] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn gaps(&self) -> Vec<u64> {
        self.frames.windows(2).map(|pair| pair[1] - pair[0]).collect()
    }

    /// Converts frame indices to seconds for the given analysis hop.
    pub fn to_times(&self, sample_rate: u32, hop_size: usize) -> Result<OnsetSequence, DomainError> {
        if sample_rate == 0 {
            return Err(DomainError::validation("sample rate must be positive"));
        }
        if hop_size == 0 {
            return Err(DomainError::validation("hop size must be positive"));
        }
        let frame_duration = hop_size as f64 / sample_rate as f64;
        OnsetSequence::new(
            self.frames
                .iter()
                .map(|&frame| frame as f64 * frame_duration)
                .collect(),
        )
    }
}

/// Onset times in seconds from the start of the recording.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct OnsetSequence {
    times: Vec<f64>,
}

impl OnsetSequence {
    pub fn new(times: Vec<f64>) -> Result<Self, DomainError> {
        if times.iter().any(|time| !time.is_finite()) {
            return Err(DomainError::validation("onset times must be finite"));
        }
        if times.first().is_some_and(|&time| time < 0.0) {
            return Err(DomainError::validation("onset times cannot be negative"));
        }
        if times.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(DomainError::validation(
                "onset times must be strictly increasing",
            ));
        }
        Ok(Self { times })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn frames_must_increase() {
        assert!(OnsetFrames::new(vec![3, 3]).is_err());
        assert!(OnsetFrames::new(vec![5, 2]).is_err());
        assert!(OnsetFrames::new(vec![]).is_ok());
        assert!(OnsetFrames::new(vec![0, 1, 10]).is_ok());
    }

    #[test]
    fn gaps_are_consecutive_differences() {
        let frames = OnsetFrames::new(vec![10, 20, 35, 50]).unwrap();
        assert_eq!(frames.gaps(), vec![10, 15, 15]);
    }

    #[test]
    fn frames_convert_to_seconds() {
        let frames = OnsetFrames::new(vec![0, 43, 86]).unwrap();
        let times = frames.to_times(22050, 512).unwrap();
        assert_relative_eq!(times.times()[1], 43.0 * 512.0 / 22050.0);
        assert_relative_eq!(times.times()[2], 86.0 * 512.0 / 22050.0);
    }

    #[test]
    fn conversion_rejects_zero_rate_or_hop() {
        let frames = OnsetFrames::new(vec![1, 2]).unwrap();
        assert!(frames.to_times(0, 512).is_err());
        assert!(frames.to_times(22050, 0).is_err());
    }

    #[test]
    fn times_must_be_ordered_and_finite() {
        assert!(OnsetSequence::new(vec![0.5, 0.5]).is_err());
        assert!(OnsetSequence::new(vec![-0.1, 0.5]).is_err());
        assert!(OnsetSequence::new(vec![0.0, f64::NAN]).is_err());
        assert!(OnsetSequence::new(vec![0.5, 1.0, 1.5]).is_ok());
    }
}
