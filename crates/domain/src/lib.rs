pub mod error;
pub mod onsets;
pub mod tempo;

pub use crate::error::DomainError;
pub use crate::onsets::{OnsetFrames, OnsetSequence};
pub use crate::tempo::TempoEstimate;
