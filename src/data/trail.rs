//! Trail window: the fading trace of segments behind the playback cursor.
//!
//! For a current index `i`, segment `k` (for `k` in `1..=i`) joins samples
//! `k-1` and `k`. Its age is `i - k` and its opacity decays with age down to
//! the series floor. When playback sits on the dataset's final date every
//! segment is pinned to a single settled opacity instead.

use std::ops::RangeInclusive;

use crate::data::sample::SeriesRef;
use crate::data::series::{OpacityDecay, SeriesDefinition};

#[derive(Debug, Clone, PartialEq)]
pub struct TrailSegment {
    /// Sample index where this segment ends (`k`).
    pub end: usize,
    /// Sample index where this segment starts (`max(0, k-1)`).
    pub start: usize,
    /// Neighbouring samples a smoothing curve may use as control points.
    pub context: RangeInclusive<usize>,
    pub age: usize,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrailWindow {
    pub index: usize,
    pub segments: Vec<TrailSegment>,
    /// `true` when opacities were pinned to the settled value.
    pub settled: bool,
}

impl TrailWindow {
    /// Compute the window for `index`. `settled` carries the pinned opacity
    /// when the current sample is on the final calendar date.
    pub fn compute(index: usize, decay: &OpacityDecay, settled: Option<f64>) -> Self {
        let segments = (1..=index)
            .map(|k| {
                let age = index - k;
                let opacity = match settled {
                    Some(pinned) => pinned,
                    None => decay.opacity_for_age(age),
                };
                TrailSegment {
                    end: k,
                    start: k.saturating_sub(1),
                    context: k.saturating_sub(2)..=(k + 1).min(index),
                    age,
                    opacity,
                }
            })
            .collect();
        Self {
            index,
            segments,
            settled: settled.is_some(),
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment(&self, end: usize) -> Option<&TrailSegment> {
        end.checked_sub(1).and_then(|i| self.segments.get(i))
    }
}

/// Trail window of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTrail {
    pub series: SeriesRef,
    pub window: TrailWindow,
}

/// Trail windows for every configured series at `index`.
pub fn compute_trails(
    index: usize,
    series: &[SeriesDefinition],
    settled: Option<f64>,
) -> Vec<SeriesTrail> {
    series
        .iter()
        .map(|def| SeriesTrail {
            series: def.key.clone(),
            window: TrailWindow::compute(index, &def.decay, settled),
        })
        .collect()
}
