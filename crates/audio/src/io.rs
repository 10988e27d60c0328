use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::dsp::mix_to_mono;

/// A fully decoded recording, downmixed to mono.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl DecodedAudio {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

pub struct AudioDecoder;

impl AudioDecoder {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<DecodedAudio> {
        let path_ref = path.as_ref();
        let file =
            File::open(path_ref).with_context(|| format!("open audio file {:?}", path_ref))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());
        let mut hint = Hint::new();
        if let Some(ext) = path_ref.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format = probed.format;
        let track = format
            .default_track()
            .ok_or_else(|| anyhow::anyhow!("no default track found"))?;
        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| anyhow::anyhow!("track is missing a sample rate"))?;
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())?;

        let mut samples = Vec::new();
        loop {
            match format.next_packet() {
                Ok(packet) => {
                    if packet.track_id() != track_id {
                        continue;
                    }
                    let buffer = decoder.decode(&packet)?;
                    let spec = *buffer.spec();
                    let frames = buffer.frames() as u64;
                    if frames == 0 {
                        continue;
                    }
                    let mut interleaved = SampleBuffer::<f32>::new(frames, spec);
                    interleaved.copy_interleaved_ref(buffer);
                    samples.extend(mix_to_mono(
                        interleaved.samples(),
                        spec.channels.count(),
                    ));
                }
                Err(err) => {
                    use symphonia::core::errors::Error as SymphError;
                    match err {
                        SymphError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                            break;
                        }
                        SymphError::DecodeError(_) => {
                            // skip undecodable packet
                        }
                        _ => return Err(err.into()),
                    }
                }
            }
        }
        debug!(sample_rate, samples = samples.len(), "decoded {:?}", path_ref);

        Ok(DecodedAudio {
            sample_rate,
            samples,
        })
    }
}

/// Reads the sample rate from the container header without decoding audio.
pub fn probe_sample_rate<P: AsRef<Path>>(path: P) -> Result<u32> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref).with_context(|| format!("open audio file {:?}", path_ref))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path_ref.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }
    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    probed
        .format
        .default_track()
        .ok_or_else(|| anyhow::anyhow!("no default track found"))?
        .codec_params
        .sample_rate
        .ok_or_else(|| anyhow::anyhow!("track is missing a sample rate"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::write_wav;

    #[test]
    fn missing_file_is_an_error() {
        assert!(AudioDecoder::open("does-not-exist.wav").is_err());
        assert!(probe_sample_rate("does-not-exist.wav").is_err());
    }

    #[test]
    fn decodes_generated_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<f32> = (0..22050)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 22050.0).sin() * 0.5)
            .collect();
        write_wav(&path, 22050, &samples);

        let decoded = AudioDecoder::open(&path).unwrap();
        assert_eq!(decoded.sample_rate, 22050);
        assert_eq!(decoded.samples.len(), samples.len());
        assert!((decoded.duration_seconds() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn probe_reads_header_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.wav");
        write_wav(&path, 44100, &[0.0; 512]);
        assert_eq!(probe_sample_rate(&path).unwrap(), 44100);
    }
}
