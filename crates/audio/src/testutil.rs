use std::path::Path;

pub fn write_wav(path: &Path, sample_rate: u32, samples: &[f32]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(value).unwrap();
    }
    writer.finalize().unwrap();
}

/// Decaying 150 Hz bursts on a steady beat, with leading silence so the
/// first burst produces a spectral rise.
pub fn generate_kick_pattern(sample_rate: u32, bpm: f64, beats: usize) -> Vec<f32> {
    let interval = (60.0 / bpm * sample_rate as f64) as usize;
    let lead_in = 4096;
    let mut samples = vec![0.0f32; lead_in + interval * beats + sample_rate as usize / 2];
    for beat in 0..beats {
        let start = lead_in + beat * interval;
        let burst = 2048.min(samples.len() - start);
        for i in 0..burst {
            let t = i as f32 / sample_rate as f32;
            let envelope = (-t * 60.0).exp();
            samples[start + i] += (2.0 * std::f32::consts::PI * 150.0 * t).sin() * envelope * 0.9;
        }
    }
    samples
}
