/// Default matching window around each grid line, in seconds.
pub const DEFAULT_TOLERANCE: f64 = 0.03;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GridMatch {
    /// Matched-onset count weighted by interval plus boost.
    pub score: f64,
    /// Anchor time plus the median signed residual, wrapped into range.
    pub offset: f64,
}

impl GridMatch {
    pub const NONE: GridMatch = GridMatch {
        score: 0.0,
        offset: 0.0,
    };

    pub fn is_match(&self) -> bool {
        self.score > 0.0
    }
}

#[derive(Clone, Copy, Debug)]
pub struct GridMatcher {
    tolerance: f64,
}

impl Default for GridMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl GridMatcher {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn score(&self, times: &[f64], beat_interval: f64, score_boost: f64) -> GridMatch {
        self.score_from(times, beat_interval, score_boost, 0)
    }

    /// Scores a grid anchored on `times[anchor]`. The grid is never
    /// re-seeded between onsets, so a slightly wrong interval drifts
    /// out of the tolerance window as its error accumulates.
    pub fn score_from(
        &self,
        times: &[f64],
        beat_interval: f64,
        score_boost: f64,
        anchor: usize,
    ) -> GridMatch {
        if beat_interval <= 0.0 || anchor + 1 >= times.len() {
            return GridMatch::NONE;
        }
        let mut grid_time = times[anchor];
        let mut residuals = Vec::new();
        for &onset in &times[anchor + 1..] {
            while grid_time < onset {
                grid_time += beat_interval;
            }
            let ahead = grid_time - onset;
            let behind = onset - (grid_time - beat_interval);
            let distance = ahead.min(behind);
            if distance < self.tolerance {
                // Sign comes from the forward grid line: positive when it
                // is within tolerance, negative when only the line behind is.
                residuals.push(if ahead < self.tolerance {
                    distance
                } else {
                    -distance
                });
            }
        }
        if residuals.is_empty() {
            return GridMatch::NONE;
        }
        let score = residuals.len() as f64 * (beat_interval + score_boost);
        let mut offset = times[anchor] + median(&mut residuals);
        // Strictly greater: an offset landing exactly on the interval stays.
        while offset > beat_interval {
            offset -= beat_interval;
        }
        GridMatch { score, offset }
    }
}

/// Median with even-length inputs averaging the middle pair.
fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}
