//! Scale provider: value → plot-coordinate mapping with date-dependent domains.
//!
//! Axis floors are fixed per [`ScaleMode`] (log domains cannot include zero),
//! while ceilings come from a [`DomainRuleTable`] keyed by calendar date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TrendError};

// ─────────────────────────────────────────────────────────────────────────────
// ScaleMode / Domain / AxisScale
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ScaleMode {
    Linear,
    #[default]
    Logarithmic,
}

impl ScaleMode {
    pub fn toggled(self) -> Self {
        match self {
            ScaleMode::Linear => ScaleMode::Logarithmic,
            ScaleMode::Logarithmic => ScaleMode::Linear,
        }
    }
}

impl std::fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleMode::Linear => write!(f, "linear"),
            ScaleMode::Logarithmic => write!(f, "log"),
        }
    }
}

/// Closed value range `[min, max]` of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.min.min(self.max), self.max.max(self.min))
    }
}

/// Maps a value from `domain` to `range` using a linear or log10 transform.
///
/// In logarithmic mode the input is always clamped to the domain first, so
/// zero and negative values land on the floor instead of producing NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisScale {
    pub domain: Domain,
    pub range: (f64, f64),
    pub mode: ScaleMode,
    /// Clamp linear projections to the range as well.
    pub clamp: bool,
}

impl AxisScale {
    pub fn new(domain: Domain, range: (f64, f64), mode: ScaleMode) -> Self {
        Self {
            domain,
            range,
            mode,
            clamp: true,
        }
    }

    pub fn project(&self, value: f64) -> f64 {
        let t = match self.mode {
            ScaleMode::Linear => {
                let span = self.domain.max - self.domain.min;
                if span == 0.0 {
                    0.5
                } else {
                    let t = (value - self.domain.min) / span;
                    if self.clamp {
                        t.clamp(0.0, 1.0)
                    } else {
                        t
                    }
                }
            }
            ScaleMode::Logarithmic => {
                let (lo, hi) = log_bounds(self.domain);
                let v = value.clamp(lo, hi).log10();
                let span = hi.log10() - lo.log10();
                if span == 0.0 {
                    0.5
                } else {
                    (v - lo.log10()) / span
                }
            }
        };
        self.range.0 + t * (self.range.1 - self.range.0)
    }

    /// Inverse of [`project`](Self::project) (ignores clamping).
    pub fn invert(&self, coord: f64) -> f64 {
        let span_r = self.range.1 - self.range.0;
        let t = if span_r == 0.0 { 0.0 } else { (coord - self.range.0) / span_r };
        match self.mode {
            ScaleMode::Linear => self.domain.min + t * (self.domain.max - self.domain.min),
            ScaleMode::Logarithmic => {
                let (lo, hi) = log_bounds(self.domain);
                10f64.powf(lo.log10() + t * (hi.log10() - lo.log10()))
            }
        }
    }

    /// Tick values inside the domain suitable for grid lines and labels.
    pub fn ticks(&self, approx_count: usize) -> Vec<f64> {
        match self.mode {
            ScaleMode::Linear => linear_ticks(self.domain, approx_count),
            ScaleMode::Logarithmic => log_ticks(self.domain),
        }
    }
}

/// Free-function form of [`AxisScale::project`].
pub fn project(value: f64, domain: Domain, range: (f64, f64), mode: ScaleMode) -> f64 {
    AxisScale::new(domain, range, mode).project(value)
}

fn log_bounds(domain: Domain) -> (f64, f64) {
    let lo = domain.min.max(f64::MIN_POSITIVE);
    let hi = domain.max.max(lo);
    (lo, hi)
}

/// Decade ticks plus 2× and 5× sub-decade marks inside `domain`.
pub fn log_ticks(domain: Domain) -> Vec<f64> {
    let (lo, hi) = log_bounds(domain);
    let first = lo.log10().floor() as i32;
    let last = hi.log10().ceil() as i32;
    let mut out = Vec::new();
    for exp in first..=last {
        let decade = 10f64.powi(exp);
        for m in [1.0, 2.0, 5.0] {
            let v = m * decade;
            if v >= lo * (1.0 - 1e-9) && v <= hi * (1.0 + 1e-9) {
                out.push(v);
            }
        }
    }
    out
}

/// Upper bound on the number of linear ticks handed out.
const MAX_TICKS: usize = 1000;

/// 1/2/5 × 10^k step giving roughly `approx_count` intervals over `span`.
fn nice_step(span: f64, approx_count: usize) -> f64 {
    let raw = span / approx_count as f64;
    let mag = 10f64.powf(raw.log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| m * mag)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * mag)
}

/// "Nice" 1/2/5 stepped ticks covering `domain`.
///
/// Ticks are computed by index, so a step below the float spacing at
/// `domain.min` yields duplicates (removed) rather than a stuck loop.
pub fn linear_ticks(domain: Domain, approx_count: usize) -> Vec<f64> {
    let span = domain.max - domain.min;
    if !(span > 0.0) || approx_count == 0 {
        return vec![domain.min];
    }
    let step = nice_step(span, approx_count);
    let first = (domain.min / step).ceil() * step;
    let count = ((domain.max - first) / step + 1e-9).floor();
    if !(count >= 0.0) {
        return vec![domain.min];
    }
    let count = (count as usize).min(MAX_TICKS);
    let mut out: Vec<f64> = (0..=count).map(|i| first + i as f64 * step).collect();
    out.dedup();
    out
}

/// Widen `[min, max]` outwards to the nearest ticks, like a "nice" axis.
/// A degenerate range is padded by one unit either side.
pub fn nice_domain(min: f64, max: f64, approx_count: usize) -> Domain {
    if !(max > min) {
        return Domain::new(min - 1.0, min + 1.0);
    }
    let step = nice_step(max - min, approx_count.max(1));
    Domain::new((min / step).floor() * step, (max / step).ceil() * step)
}

// ─────────────────────────────────────────────────────────────────────────────
// Date-range rule table
// ─────────────────────────────────────────────────────────────────────────────

/// Axis ceilings supplied by a domain rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ceilings {
    pub x_max: f64,
    pub y_max: f64,
}

/// `[start, end]` (inclusive) date interval with the ceilings to use inside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainRule {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub x_max: f64,
    pub y_max: f64,
}

impl DomainRule {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn ceilings(&self) -> Ceilings {
        Ceilings {
            x_max: self.x_max,
            y_max: self.y_max,
        }
    }
}

/// Ordered, non-overlapping list of [`DomainRule`]s.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DomainRuleTable {
    rules: Vec<DomainRule>,
}

impl DomainRuleTable {
    /// Build a table, sorting by start date and rejecting inverted or
    /// overlapping intervals.
    pub fn new(mut rules: Vec<DomainRule>) -> Result<Self> {
        rules.sort_by_key(|r| r.start);
        for r in &rules {
            if r.end < r.start {
                return Err(TrendError::Configuration(format!(
                    "domain rule {}..{} ends before it starts",
                    r.start, r.end
                )));
            }
        }
        for w in rules.windows(2) {
            if w[1].start <= w[0].end {
                return Err(TrendError::Configuration(format!(
                    "domain rules {}..{} and {}..{} overlap",
                    w[0].start, w[0].end, w[1].start, w[1].end
                )));
            }
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[DomainRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule whose interval contains `date` (binary search).
    pub fn lookup(&self, date: NaiveDate) -> Option<&DomainRule> {
        let idx = self.rules.partition_point(|r| r.end < date);
        self.rules.get(idx).filter(|r| r.contains(date))
    }

    /// Verify every date is covered by some rule.
    pub fn validate_coverage<I>(&self, dates: I) -> Result<()>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        for d in dates {
            if self.lookup(d).is_none() {
                return Err(TrendError::Configuration(format!(
                    "no domain rule covers {d}"
                )));
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ScaleProvider
// ─────────────────────────────────────────────────────────────────────────────

/// Axis floors per scale mode, as `[x_min, y_min]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisFloors {
    pub linear: [f64; 2],
    pub logarithmic: [f64; 2],
}

impl Default for AxisFloors {
    fn default() -> Self {
        Self {
            linear: [0.0, 0.0],
            logarithmic: [100.0, 0.1],
        }
    }
}

impl AxisFloors {
    pub fn for_mode(&self, mode: ScaleMode) -> [f64; 2] {
        match mode {
            ScaleMode::Linear => self.linear,
            ScaleMode::Logarithmic => self.logarithmic,
        }
    }
}

/// Both axis domains for one moment of playback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisDomains {
    /// X carries the BTC price.
    pub x: Domain,
    /// Y carries the normalized search interest.
    pub y: Domain,
    pub mode: ScaleMode,
}

impl AxisDomains {
    pub fn x_scale(&self, range: (f64, f64)) -> AxisScale {
        AxisScale::new(self.x, range, self.mode)
    }

    pub fn y_scale(&self, range: (f64, f64)) -> AxisScale {
        AxisScale::new(self.y, range, self.mode)
    }

    pub fn ceilings(&self) -> Ceilings {
        Ceilings {
            x_max: self.x.max,
            y_max: self.y.max,
        }
    }
}

/// Owns the rule table, floors and the current [`ScaleMode`].
#[derive(Debug, Clone)]
pub struct ScaleProvider {
    rules: DomainRuleTable,
    floors: AxisFloors,
    fallback: Ceilings,
    mode: ScaleMode,
}

impl ScaleProvider {
    pub fn new(
        rules: DomainRuleTable,
        floors: AxisFloors,
        fallback: Ceilings,
        mode: ScaleMode,
    ) -> Self {
        Self {
            rules,
            floors,
            fallback,
            mode,
        }
    }

    /// Static domain: no rules, the fallback ceilings always apply.
    pub fn fixed(floors: AxisFloors, ceilings: Ceilings, mode: ScaleMode) -> Self {
        Self::new(DomainRuleTable::default(), floors, ceilings, mode)
    }

    pub fn mode(&self) -> ScaleMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ScaleMode) {
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) -> ScaleMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    pub fn rules(&self) -> &DomainRuleTable {
        &self.rules
    }

    pub fn fallback(&self) -> Ceilings {
        self.fallback
    }

    /// Ceilings for `date`: the matching rule, else the fallback.
    pub fn resolve_domain(&self, date: NaiveDate) -> Ceilings {
        match self.rules.lookup(date) {
            Some(rule) => rule.ceilings(),
            None => {
                if !self.rules.is_empty() {
                    debug!(%date, "no domain rule matches; using fallback");
                }
                self.fallback
            }
        }
    }

    /// Full axis domains for `date` under the current mode.
    pub fn domains_for(&self, date: NaiveDate) -> AxisDomains {
        let c = self.resolve_domain(date);
        let [x_min, y_min] = self.floors.for_mode(self.mode);
        AxisDomains {
            x: Domain::new(x_min, c.x_max),
            y: Domain::new(y_min, c.y_max),
            mode: self.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn linear_ticks_terminate_below_float_spacing() {
        // Float spacing at 1e16 is 2.0, larger than the 1.0 step.
        let ticks = linear_ticks(Domain::new(1e16, 1e16 + 4.0), 6);
        assert!(!ticks.is_empty() && ticks.len() <= 5);
        assert!(ticks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn linear_ticks_use_nice_steps() {
        assert_eq!(linear_ticks(Domain::new(0.0, 80.0), 4), vec![0.0, 20.0, 40.0, 60.0, 80.0]);
        assert_eq!(nice_domain(3.2, 47.0, 6), Domain::new(0.0, 50.0));
        assert_eq!(nice_domain(5.0, 5.0, 6), Domain::new(4.0, 6.0));
    }

    #[test]
    fn log_projection_clamps_below_domain() {
        let dom = Domain::new(100.0, 1000.0);
        let mode = ScaleMode::Logarithmic;
        assert!((project(100.0, dom, (0.0, 400.0), mode) - 0.0).abs() < 1e-9);
        assert!((project(1000.0, dom, (0.0, 400.0), mode) - 400.0).abs() < 1e-9);
        assert!((project(10.0, dom, (0.0, 400.0), mode) - 0.0).abs() < 1e-9);
        assert!((project(0.0, dom, (0.0, 400.0), mode) - 0.0).abs() < 1e-9);
        assert!((project(-5.0, dom, (0.0, 400.0), mode) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn linear_projection_and_inverse() {
        let s = AxisScale::new(Domain::new(0.0, 10.0), (0.0, 100.0), ScaleMode::Linear);
        assert!((s.project(2.5) - 25.0).abs() < 1e-12);
        assert!((s.invert(25.0) - 2.5).abs() < 1e-12);
        assert_eq!(s.project(20.0), 100.0);
    }

    #[test]
    fn inverted_range_projects_top_down() {
        let s = AxisScale::new(Domain::new(0.1, 3.0), (400.0, 0.0), ScaleMode::Logarithmic);
        assert!((s.project(3.0) - 0.0).abs() < 1e-9);
        assert!((s.project(0.1) - 400.0).abs() < 1e-9);
    }

    #[test]
    fn log_ticks_cover_decades() {
        let t = log_ticks(Domain::new(100.0, 1000.0));
        assert_eq!(t, vec![100.0, 200.0, 500.0, 1000.0]);
    }

    #[test]
    fn linear_ticks_are_nice() {
        let t = linear_ticks(Domain::new(0.0, 100.0), 5);
        assert_eq!(t, vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
    }

    #[test]
    fn rule_table_rejects_overlap() {
        let rules = vec![
            DomainRule { start: d(2015, 1, 1), end: d(2016, 12, 31), x_max: 1.0, y_max: 1.0 },
            DomainRule { start: d(2016, 6, 1), end: d(2017, 12, 31), x_max: 1.0, y_max: 1.0 },
        ];
        assert!(DomainRuleTable::new(rules).is_err());
    }

    #[test]
    fn lookup_finds_containing_rule() {
        let table = DomainRuleTable::new(vec![
            DomainRule { start: d(2017, 1, 1), end: d(2017, 12, 31), x_max: 20_000.0, y_max: 80.0 },
            DomainRule { start: d(2015, 1, 1), end: d(2016, 12, 31), x_max: 1_000.0, y_max: 3.0 },
        ])
        .unwrap();
        assert_eq!(table.lookup(d(2016, 12, 31)).unwrap().x_max, 1_000.0);
        assert_eq!(table.lookup(d(2017, 1, 1)).unwrap().x_max, 20_000.0);
        assert!(table.lookup(d(2018, 1, 1)).is_none());
        assert!(table.lookup(d(2014, 12, 31)).is_none());
    }

    #[test]
    fn provider_floors_follow_mode() {
        let mut p = ScaleProvider::fixed(
            AxisFloors::default(),
            Ceilings { x_max: 1000.0, y_max: 3.0 },
            ScaleMode::Logarithmic,
        );
        let dom = p.domains_for(d(2016, 1, 1));
        assert_eq!(dom.x, Domain::new(100.0, 1000.0));
        assert_eq!(dom.y, Domain::new(0.1, 3.0));
        p.toggle_mode();
        let dom = p.domains_for(d(2016, 1, 1));
        assert_eq!(dom.x.min, 0.0);
        assert_eq!(dom.mode, ScaleMode::Linear);
    }
}
