use matra_domain::{OnsetSequence, TempoEstimate};

/// Where clicks fall: on the estimated beat grid or on the raw onsets.
#[derive(Clone, Debug)]
pub enum ClickSchedule {
    Grid(TempoEstimate),
    Onsets(OnsetSequence),
}

impl ClickSchedule {
    /// Click times in seconds; unbounded for a grid schedule.
    pub fn times(&self) -> ScheduleTimes<'_> {
        let inner = match self {
            ClickSchedule::Grid(estimate) => TimesInner::Grid {
                estimate: *estimate,
                next_beat: 0,
            },
            ClickSchedule::Onsets(onsets) => TimesInner::Onsets(onsets.times().iter()),
        };
        ScheduleTimes { inner }
    }
}

pub struct ScheduleTimes<'a> {
    inner: TimesInner<'a>,
}

enum TimesInner<'a> {
    Grid {
        estimate: TempoEstimate,
        next_beat: u64,
    },
    Onsets(std::slice::Iter<'a, f64>),
}

impl Iterator for ScheduleTimes<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        match &mut self.inner {
            TimesInner::Grid { estimate, next_beat } => {
                let time = estimate.beat_time(*next_beat);
                *next_beat += 1;
                Some(time)
            }
            TimesInner::Onsets(iter) => iter.next().copied(),
        }
    }
}
