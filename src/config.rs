//! Configuration for a story: what is traced, how axes rescale, where the
//! narrative pauses, and how the viewer looks.

use std::path::Path;

use chrono::NaiveDate;
use egui::Color32;

use crate::controllers::{PlaybackController, WheelSettings};
use crate::data::hotkeys::Hotkeys;
use crate::data::loader::{load_csv_path, LoaderColumns};
use crate::data::sample::Dataset;
use crate::data::scale::{
    AxisFloors, Ceilings, DomainRule, DomainRuleTable, ScaleMode, ScaleProvider,
};
use crate::data::series::SeriesDefinition;
use crate::data::story::{StorySection, StoryTable};
use crate::error::{Result, TrendError};
use crate::events::EventController;
use crate::playback::{PlaybackSession, PlaybackTiming};

// ─────────────────────────────────────────────────────────────────────────────
// Feature flags
// ─────────────────────────────────────────────────────────────────────────────

/// Toggle individual viewer features. All default to `true`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Show the story side panel.
    pub narrative_panel: bool,
    /// Draw series labels next to the cursors.
    pub cursor_labels: bool,
    pub legend: bool,
    pub grid: bool,
    /// Scrub with the mouse wheel over the chart.
    pub wheel_scrub: bool,
    /// Space / L / arrow keys.
    pub hotkeys: bool,
    /// Offer the full-history overview page next to the story.
    pub overview: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            narrative_panel: true,
            cursor_labels: true,
            legend: true,
            grid: true,
            wheel_scrub: true,
            hotkeys: true,
            overview: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Controllers sub-config
// ─────────────────────────────────────────────────────────────────────────────

/// Optional programmatic handles attached to the viewer.
#[derive(Clone, Default)]
pub struct Controllers {
    pub playback: Option<PlaybackController>,
    pub event: Option<EventController>,
}

// ─────────────────────────────────────────────────────────────────────────────
// StoryConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration of a story.
///
/// | Field            | Purpose |
/// |------------------|---------|
/// | `series`         | Interest columns to trace |
/// | `domain_rules`   | Date-range → axis ceilings |
/// | `sections`       | Narrative table, also the milestone source |
/// | `timing`         | Tick, dwell and tween periods |
/// | `features`       | Viewer toggles |
/// | `controllers`    | Programmatic interaction handles |
pub struct StoryConfig {
    // ── Window / chrome ──────────────────────────────────────────────────────
    pub title: String,
    pub headline: Option<String>,
    pub native_options: Option<eframe::NativeOptions>,

    // ── Data ─────────────────────────────────────────────────────────────────
    pub columns: LoaderColumns,
    pub series: Vec<SeriesDefinition>,

    // ── Scales ───────────────────────────────────────────────────────────────
    pub domain_rules: Vec<DomainRule>,
    pub floors: AxisFloors,
    /// Ceilings used when no rule matches.
    pub fallback: Ceilings,
    pub initial_scale: ScaleMode,
    /// Refuse datasets with dates outside every domain rule.
    pub require_domain_coverage: bool,

    // ── Story / playback ─────────────────────────────────────────────────────
    pub sections: Vec<StorySection>,
    pub timing: PlaybackTiming,
    /// Opacity pinned on every trail segment at the final date.
    pub settled_opacity: Option<f64>,

    // ── Input / UI ───────────────────────────────────────────────────────────
    pub wheel: WheelSettings,
    pub hotkeys: Hotkeys,
    pub features: FeatureFlags,

    // ── Programmatic controllers ─────────────────────────────────────────────
    pub controllers: Controllers,
}

impl Clone for StoryConfig {
    fn clone(&self) -> Self {
        Self {
            title: self.title.clone(),
            headline: self.headline.clone(),
            native_options: self.native_options.clone(),
            columns: self.columns.clone(),
            series: self.series.clone(),
            domain_rules: self.domain_rules.clone(),
            floors: self.floors,
            fallback: self.fallback,
            initial_scale: self.initial_scale,
            require_domain_coverage: self.require_domain_coverage,
            sections: self.sections.clone(),
            timing: self.timing,
            settled_opacity: self.settled_opacity,
            wheel: self.wheel,
            hotkeys: self.hotkeys.clone(),
            features: self.features.clone(),
            controllers: self.controllers.clone(),
        }
    }
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self::bitcoin()
    }
}

impl StoryConfig {
    /// BTC price against "bitcoin price", "nft" and "blockchain" search
    /// interest, 2015–2024.
    pub fn bitcoin() -> Self {
        Self {
            title: "Bitcoin vs. search interest".to_string(),
            headline: Some("Does attention follow the price?".to_string()),
            native_options: None,

            columns: LoaderColumns::default(),
            series: bitcoin_series(),

            domain_rules: bitcoin_domain_rules(),
            floors: AxisFloors::default(),
            fallback: Ceilings {
                x_max: 1000.0,
                y_max: 3.0,
            },
            initial_scale: ScaleMode::Logarithmic,
            require_domain_coverage: false,

            sections: bitcoin_sections(),
            timing: PlaybackTiming::default(),
            settled_opacity: Some(0.2),

            wheel: WheelSettings::default(),
            hotkeys: Hotkeys::default(),
            features: FeatureFlags::default(),
            controllers: Controllers::default(),
        }
    }

    pub fn scale_provider(&self) -> Result<ScaleProvider> {
        let rules = DomainRuleTable::new(self.domain_rules.clone())?;
        Ok(ScaleProvider::new(rules, self.floors, self.fallback, self.initial_scale))
    }

    pub fn story_table(&self) -> Result<StoryTable> {
        StoryTable::new(self.sections.clone())
    }

    pub fn load_dataset<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        load_csv_path(path, &self.columns, &self.series)
    }

    /// Build a session for `dataset` wired to the configured event controller.
    pub fn build_session(&self, dataset: Dataset) -> Result<PlaybackSession> {
        let scales = self.scale_provider()?;
        if self.require_domain_coverage {
            if scales.rules().is_empty() {
                return Err(TrendError::Configuration("no domain rules configured".into()));
            }
            scales.rules().validate_coverage(dataset.dates())?;
        }
        let story = self.story_table()?;
        let mut session = PlaybackSession::new(dataset, self.series.clone(), scales, story)?
            .with_timing(self.timing)
            .with_settled_opacity(self.settled_opacity);
        if let Some(events) = self.controllers.event.clone() {
            session = session.with_events(events);
        }
        Ok(session)
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Raw search volumes in the bundled CSV are divided by this to bring them
/// onto the interest axis.
pub const SEARCH_VOLUME_DIVISOR: f64 = 98.053525;

fn bitcoin_series() -> Vec<SeriesDefinition> {
    [
        ("bitcoin_price", "bitcoin price", Color32::from_rgb(0x00, 0xc2, 0xff)),
        ("nft", "nft", Color32::from_rgb(0xff, 0x4d, 0x9d)),
        ("blockchain", "blockchain", Color32::from_rgb(0x9c, 0xff, 0x57)),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (key, label, color))| {
        SeriesDefinition::new(key, label, i)
            .with_color(color)
            .with_scale_divisor(SEARCH_VOLUME_DIVISOR)
    })
    .collect()
}

fn bitcoin_domain_rules() -> Vec<DomainRule> {
    let rule = |start: NaiveDate, end: NaiveDate, x_max: f64, y_max: f64| DomainRule {
        start,
        end,
        x_max,
        y_max,
    };
    vec![
        rule(date(2015, 1, 1), date(2016, 12, 31), 1000.0, 3.0),
        rule(date(2017, 1, 1), date(2017, 12, 31), 20_000.0, 80.0),
        rule(date(2018, 1, 1), date(2020, 12, 31), 30_000.0, 80.0),
        rule(date(2021, 1, 1), date(2022, 12, 31), 70_000.0, 100.0),
        rule(date(2023, 1, 1), date(2024, 12, 31), 100_000.0, 100.0),
    ]
}

fn bitcoin_sections() -> Vec<StorySection> {
    vec![
        StorySection::new("phase1-intro", "Phase 1: a niche curiosity", date(2015, 1, 1), false)
            .with_body(
                "Bitcoin trades in the hundreds of dollars and almost nobody searches for it. \
                 Each trace follows one search term against the BTC close.",
            ),
        StorySection::new("2016-05-25", "Blockchain enters the vocabulary", date(2016, 5, 25), true)
            .with_body("Interest in \"blockchain\" starts to move while the price is still flat."),
        StorySection::new("2017-11-30", "The 2017 mania", date(2017, 11, 30), true)
            .with_body("BTC crosses $10,000 and searches for the price spike with it."),
        StorySection::new("phase2-intro", "Phase 2: the long winter", date(2019, 1, 1), false)
            .with_body("After the crash, price and attention drift down together."),
        StorySection::new("2020-12-16", "Breaking the old high", date(2020, 12, 16), true)
            .with_body("BTC passes its 2017 peak; search interest lags behind."),
        StorySection::new("phase3-intro", "Phase 3: tokens everywhere", date(2021, 1, 1), true)
            .with_body("A new bull run, and a new word in the headlines."),
        StorySection::new("2021-03-11", "The NFT moment", date(2021, 3, 11), true)
            .with_body("A digital artwork sells for $69 million and \"nft\" searches explode."),
        StorySection::new("phase4-intro", "Phase 4: the hangover", date(2022, 9, 1), true)
            .with_body(
                "Prices fall, NFT interest collapses, blockchain fades into the background.",
            ),
        StorySection::new("2024-12-17", "$100,000", date(2024, 12, 17), true)
            .with_body("BTC reaches six figures. Attention returns, but not to where it was."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitcoin_defaults_are_valid() {
        let cfg = StoryConfig::bitcoin();
        assert!(cfg.scale_provider().is_ok());
        let table = cfg.story_table().unwrap();
        assert_eq!(table.milestones().count(), 7);
        assert_eq!(cfg.series.len(), 3);
    }

    #[test]
    fn bitcoin_rules_resolve_by_year() {
        let scales = StoryConfig::bitcoin().scale_provider().unwrap();
        let c = scales.resolve_domain(date(2017, 6, 1));
        assert_eq!((c.x_max, c.y_max), (20_000.0, 80.0));
        let c = scales.resolve_domain(date(2022, 12, 31));
        assert_eq!((c.x_max, c.y_max), (70_000.0, 100.0));
        // Outside the table: fallback.
        let c = scales.resolve_domain(date(2030, 1, 1));
        assert_eq!((c.x_max, c.y_max), (1000.0, 3.0));
    }
}
