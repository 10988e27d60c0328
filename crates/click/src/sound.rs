#[derive(Clone, Debug)]
pub struct ClickSound {
    samples: Vec<f32>,
}

impl ClickSound {
    /// The stock click: a 1 kHz burst, 15 ms long.
    pub fn standard(sample_rate: u32) -> Self {
        Self::generate(sample_rate, 1000.0, 0.015)
    }

    pub fn generate(sample_rate: u32, frequency: f32, duration: f32) -> Self {
        let count = (sample_rate as f32 * duration) as usize;
        let samples = (0..count)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (t * frequency * std::f32::consts::TAU).sin() * (-t * 40.0).exp()
            })
            .collect();
        Self { samples }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
