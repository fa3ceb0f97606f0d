//! Daily samples: one BTC close plus named search-interest readings per day.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier of an interest series by its field key (e.g. `"nft"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct SeriesRef(pub String);

impl SeriesRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SeriesRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for SeriesRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One daily observation.
///
/// `interest` values are `None` when the source field was absent or not a
/// finite number. Renderers treat `None` as a gap, never as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub date: NaiveDate,
    pub price: f64,
    pub interest: HashMap<SeriesRef, Option<f64>>,
}

impl Sample {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self {
            date,
            price,
            interest: HashMap::new(),
        }
    }

    /// Builder-style helper used by tests and synthetic datasets.
    pub fn with_interest(mut self, key: impl Into<String>, value: Option<f64>) -> Self {
        self.interest.insert(SeriesRef(key.into()), value);
        self
    }

    /// Interest reading for `series`, `None` when missing.
    pub fn interest(&self, series: &SeriesRef) -> Option<f64> {
        self.interest.get(series).copied().flatten()
    }

    /// `[price, interest]` plot pair for `series`, `None` when the reading is missing.
    pub fn point(&self, series: &SeriesRef) -> Option<[f64; 2]> {
        self.interest(series).map(|v| [self.price, v])
    }
}

/// Strictly date-ordered, non-empty sample sequence.
///
/// Only the loader constructs this type, so the ordering and non-emptiness
/// invariants hold for every instance.
#[derive(Debug, Clone)]
pub struct Dataset {
    samples: Vec<Sample>,
}

impl Dataset {
    pub(crate) fn from_sorted(samples: Vec<Sample>) -> Self {
        debug_assert!(!samples.is_empty());
        debug_assert!(samples.windows(2).all(|w| w[0].date < w[1].date));
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Index of the last sample.
    pub fn last_index(&self) -> usize {
        self.samples.len() - 1
    }

    pub fn first_date(&self) -> NaiveDate {
        self.samples[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.samples[self.last_index()].date
    }

    /// Clamp an arbitrary (possibly negative) position into `[0, len-1]`.
    pub fn clamp_index(&self, index: i64) -> usize {
        index.clamp(0, self.last_index() as i64) as usize
    }

    /// Index of the first sample whose date is `>= date`.
    pub fn index_at_or_after(&self, date: NaiveDate) -> Option<usize> {
        let idx = self.samples.partition_point(|s| s.date < date);
        (idx < self.samples.len()).then_some(idx)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.samples.iter().map(|s| s.date)
    }
}
