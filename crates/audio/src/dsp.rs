/// Averages interleaved channel frames into a single mono channel.
pub fn mix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Linear-interpolation resampling to an exact output length.
pub fn resample_linear(input: &[f32], output_len: usize) -> Vec<f32> {
    if output_len == 0 || input.is_empty() {
        return Vec::new();
    }
    if input.len() == 1 || output_len == 1 {
        return vec![input[0]; output_len];
    }
    let step = (input.len() - 1) as f64 / (output_len - 1) as f64;
    let mut output = Vec::with_capacity(output_len);
    for i in 0..output_len {
        let pos = i as f64 * step;
        let base = pos as usize;
        let next = (base + 1).min(input.len() - 1);
        let frac = (pos - base as f64) as f32;
        output.push(input[base] + (input[next] - input[base]) * frac);
    }
    output
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn stereo_mixes_to_average() {
        let interleaved = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(mix_to_mono(&interleaved, 2), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn mono_passes_through() {
        let samples = [0.1, 0.2, 0.3];
        assert_eq!(mix_to_mono(&samples, 1), samples.to_vec());
    }

    #[test]
    fn resample_preserves_endpoints() {
        let input = [0.0, 1.0, 2.0, 3.0];
        let output = resample_linear(&input, 7);
        assert_eq!(output.len(), 7);
        assert_relative_eq!(output[0], 0.0);
        assert_relative_eq!(output[6], 3.0);
        assert_relative_eq!(output[3], 1.5);
    }

    #[test]
    fn resample_handles_degenerate_lengths() {
        assert!(resample_linear(&[], 8).is_empty());
        assert!(resample_linear(&[1.0, 2.0], 0).is_empty());
        assert_eq!(resample_linear(&[0.25], 3), vec![0.25, 0.25, 0.25]);
    }
}
