pub mod cache;
pub mod dsp;
pub mod io;
pub mod onset;
pub mod source;
#[cfg(test)]
pub(crate) mod testutil;

pub use cache::{BeatmapStore, CacheError, FsBeatmapStore, MemoryBeatmapStore};
pub use dsp::{mix_to_mono, resample_linear};
pub use io::{probe_sample_rate, AudioDecoder, DecodedAudio};
pub use onset::{OnsetConfig, OnsetDetector};
pub use source::OnsetSource;
