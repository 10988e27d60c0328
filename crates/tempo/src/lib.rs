pub mod estimator;
pub mod grid;
pub mod pipeline;

pub use estimator::{EstimatorConfig, TempoEstimator};
pub use grid::{GridMatch, GridMatcher, DEFAULT_TOLERANCE};
pub use pipeline::TempoPipeline;
