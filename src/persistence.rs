//! Story files: save and load a [`StoryConfig`] as YAML or JSON.
//!
//! Serializable mirror types stand in for config parts that cannot derive
//! serde traits directly (egui's `Color32` inside series looks). Missing
//! fields fall back to the built-in Bitcoin story.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{FeatureFlags, StoryConfig};
use crate::controllers::WheelSettings;
use crate::data::hotkeys::Hotkeys;
use crate::data::loader::LoaderColumns;
use crate::data::sample::SeriesRef;
use crate::data::scale::{AxisFloors, Ceilings, DomainRule, ScaleMode};
use crate::data::series::{OpacityDecay, SeriesDefinition, SeriesLook};
use crate::data::story::StorySection;
use crate::error::Result;
use crate::playback::PlaybackTiming;

// ---------- Serializable mirror types ----------

/// Serializable version of [`SeriesDefinition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSerde {
    pub key: String,
    pub label: String,
    pub color_rgba: [u8; 4],
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_cursor_radius")]
    pub cursor_radius: f32,
    #[serde(default)]
    pub decay: OpacityDecaySerde,
    #[serde(default)]
    pub scale_divisor: Option<f64>,
}

fn default_width() -> f32 {
    SeriesLook::default().width
}

fn default_cursor_radius() -> f32 {
    SeriesLook::default().cursor_radius
}

/// Serializable version of [`OpacityDecay`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpacityDecaySerde {
    pub base_opacity: f64,
    pub floor_opacity: f64,
    pub decay_per_step: f64,
}

impl Default for OpacityDecaySerde {
    fn default() -> Self {
        OpacityDecay::default().into()
    }
}

impl From<OpacityDecay> for OpacityDecaySerde {
    fn from(d: OpacityDecay) -> Self {
        Self {
            base_opacity: d.base_opacity,
            floor_opacity: d.floor_opacity,
            decay_per_step: d.decay_per_step,
        }
    }
}

impl From<OpacityDecaySerde> for OpacityDecay {
    fn from(d: OpacityDecaySerde) -> Self {
        Self {
            base_opacity: d.base_opacity,
            floor_opacity: d.floor_opacity,
            decay_per_step: d.decay_per_step,
        }
    }
}

impl From<&SeriesDefinition> for SeriesSerde {
    fn from(s: &SeriesDefinition) -> Self {
        let c = s.look.color;
        Self {
            key: s.key.0.clone(),
            label: s.label.clone(),
            color_rgba: [c.r(), c.g(), c.b(), c.a()],
            width: s.look.width,
            cursor_radius: s.look.cursor_radius,
            decay: s.decay.into(),
            scale_divisor: s.scale_divisor,
        }
    }
}

impl SeriesSerde {
    /// Convert back to a [`SeriesDefinition`].
    pub fn into_definition(self) -> SeriesDefinition {
        use egui::Color32;
        SeriesDefinition {
            key: SeriesRef(self.key),
            label: self.label,
            decay: self.decay.into(),
            look: SeriesLook {
                color: Color32::from_rgba_unmultiplied(
                    self.color_rgba[0],
                    self.color_rgba[1],
                    self.color_rgba[2],
                    self.color_rgba[3],
                ),
                width: self.width,
                cursor_radius: self.cursor_radius,
            },
            scale_divisor: self.scale_divisor,
        }
    }
}

/// Everything in a [`StoryConfig`] that can live in a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryFileSerde {
    pub title: String,
    pub headline: Option<String>,
    pub columns: LoaderColumns,
    pub series: Vec<SeriesSerde>,
    pub domain_rules: Vec<DomainRule>,
    pub floors: AxisFloors,
    pub fallback: Ceilings,
    pub initial_scale: ScaleMode,
    pub require_domain_coverage: bool,
    pub sections: Vec<StorySection>,
    pub timing: PlaybackTiming,
    pub settled_opacity: Option<f64>,
    pub wheel: WheelSettings,
    pub hotkeys: Hotkeys,
    pub features: FeatureFlags,
}

impl Default for StoryFileSerde {
    fn default() -> Self {
        Self::from(&StoryConfig::bitcoin())
    }
}

impl From<&StoryConfig> for StoryFileSerde {
    fn from(c: &StoryConfig) -> Self {
        Self {
            title: c.title.clone(),
            headline: c.headline.clone(),
            columns: c.columns.clone(),
            series: c.series.iter().map(SeriesSerde::from).collect(),
            domain_rules: c.domain_rules.clone(),
            floors: c.floors,
            fallback: c.fallback,
            initial_scale: c.initial_scale,
            require_domain_coverage: c.require_domain_coverage,
            sections: c.sections.clone(),
            timing: c.timing,
            settled_opacity: c.settled_opacity,
            wheel: c.wheel,
            hotkeys: c.hotkeys.clone(),
            features: c.features.clone(),
        }
    }
}

impl StoryFileSerde {
    /// Apply stored settings; window options and controllers are untouched.
    pub fn apply_to(self, c: &mut StoryConfig) {
        c.title = self.title;
        c.headline = self.headline;
        c.columns = self.columns;
        c.series = self.series.into_iter().map(SeriesSerde::into_definition).collect();
        c.domain_rules = self.domain_rules;
        c.floors = self.floors;
        c.fallback = self.fallback;
        c.initial_scale = self.initial_scale;
        c.require_domain_coverage = self.require_domain_coverage;
        c.sections = self.sections;
        c.timing = self.timing;
        c.settled_opacity = self.settled_opacity;
        c.wheel = self.wheel;
        c.hotkeys = self.hotkeys;
        c.features = self.features;
    }

    pub fn into_config(self) -> StoryConfig {
        let mut c = StoryConfig::bitcoin();
        self.apply_to(&mut c);
        c
    }
}

// ---------- Public API ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    /// `.yaml`/`.yml` are YAML; everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase) {
            Some(ext) if ext == "yaml" || ext == "yml" => FileFormat::Yaml,
            _ => FileFormat::Json,
        }
    }
}

pub fn story_to_string(cfg: &StoryConfig, format: FileFormat) -> Result<String> {
    let file = StoryFileSerde::from(cfg);
    Ok(match format {
        FileFormat::Yaml => serde_yaml::to_string(&file)?,
        FileFormat::Json => serde_json::to_string_pretty(&file)?,
    })
}

pub fn story_from_str(text: &str, format: FileFormat) -> Result<StoryConfig> {
    let file: StoryFileSerde = match format {
        FileFormat::Yaml => serde_yaml::from_str(text)?,
        FileFormat::Json => serde_json::from_str(text)?,
    };
    Ok(file.into_config())
}

/// Save the story to `path`, format chosen by extension.
pub fn save_story_to_path(cfg: &StoryConfig, path: &Path) -> Result<()> {
    let text = story_to_string(cfg, FileFormat::from_path(path))?;
    std::fs::write(path, text)?;
    info!(?path, "story saved");
    Ok(())
}

/// Load a story from `path`, format chosen by extension.
pub fn load_story_from_path(path: &Path) -> Result<StoryConfig> {
    let text = std::fs::read_to_string(path)?;
    let cfg = story_from_str(&text, FileFormat::from_path(path))?;
    info!(?path, sections = cfg.sections.len(), series = cfg.series.len(), "story loaded");
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("story.YML")), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path(Path::new("story.yaml")), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path(Path::new("story.json")), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("story")), FileFormat::Json);
    }

    #[test]
    fn yaml_keeps_series_colors_and_sections() {
        let cfg = StoryConfig::bitcoin();
        let text = story_to_string(&cfg, FileFormat::Yaml).unwrap();
        let back = story_from_str(&text, FileFormat::Yaml).unwrap();
        assert_eq!(back.series, cfg.series);
        assert_eq!(back.sections, cfg.sections);
        assert_eq!(back.domain_rules, cfg.domain_rules);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let text = r#"{ "title": "Mine", "timing": { "tick_period_ms": 10 } }"#;
        let cfg = story_from_str(text, FileFormat::Json).unwrap();
        assert_eq!(cfg.title, "Mine");
        assert_eq!(cfg.timing.tick_period_ms, 10);
        assert_eq!(cfg.timing.milestone_dwell_ms, 8000);
        assert_eq!(cfg.series.len(), 3);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(story_from_str("series: [[[", FileFormat::Yaml).is_err());
    }
}
