//! Series definitions: which interest columns are traced and how they look.

use egui::Color32;

use crate::data::sample::SeriesRef;

/// Per-series trail opacity parameters.
///
/// The opacity of a trail segment of age `a` is
/// `max(floor_opacity, base_opacity - a * decay_per_step)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpacityDecay {
    pub base_opacity: f64,
    pub floor_opacity: f64,
    pub decay_per_step: f64,
}

impl Default for OpacityDecay {
    fn default() -> Self {
        Self {
            base_opacity: 0.5,
            floor_opacity: 0.05,
            decay_per_step: 0.002,
        }
    }
}

impl OpacityDecay {
    pub fn opacity_for_age(&self, age: usize) -> f64 {
        (self.base_opacity - age as f64 * self.decay_per_step).max(self.floor_opacity)
    }
}

/// Visual style token of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesLook {
    pub color: Color32,
    pub width: f32,
    pub cursor_radius: f32,
}

impl Default for SeriesLook {
    fn default() -> Self {
        Self {
            color: Color32::GRAY,
            width: 1.5,
            cursor_radius: 4.5,
        }
    }
}

impl SeriesLook {
    /// Look with a palette color chosen by series position.
    pub fn new(index: usize) -> Self {
        Self {
            color: Self::alloc_color(index),
            ..Default::default()
        }
    }

    pub fn alloc_color(index: usize) -> Color32 {
        const PALETTE: [Color32; 6] = [
            Color32::from_rgb(0, 194, 255),
            Color32::from_rgb(255, 77, 157),
            Color32::from_rgb(156, 255, 87),
            Color32::from_rgb(255, 127, 14),
            Color32::from_rgb(148, 103, 189),
            Color32::from_rgb(227, 119, 194),
        ];
        PALETTE[index % PALETTE.len()]
    }
}

/// Static metadata of one interest series. Immutable once the session starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesDefinition {
    /// CSV column / sample field key.
    pub key: SeriesRef,
    /// Label drawn next to the cursor and in the legend.
    pub label: String,
    pub decay: OpacityDecay,
    pub look: SeriesLook,
    /// Raw column values are divided by this at load time (normalization).
    pub scale_divisor: Option<f64>,
}

impl SeriesDefinition {
    pub fn new(key: impl Into<String>, label: impl Into<String>, index: usize) -> Self {
        Self {
            key: SeriesRef(key.into()),
            label: label.into(),
            decay: OpacityDecay::default(),
            look: SeriesLook::new(index),
            scale_divisor: None,
        }
    }

    pub fn with_decay(mut self, decay: OpacityDecay) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_color(mut self, color: Color32) -> Self {
        self.look.color = color;
        self
    }

    pub fn with_scale_divisor(mut self, divisor: f64) -> Self {
        self.scale_divisor = Some(divisor);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_decays_linearly_then_floors() {
        let d = OpacityDecay::default();
        assert!((d.opacity_for_age(0) - 0.5).abs() < 1e-12);
        assert!((d.opacity_for_age(100) - 0.3).abs() < 1e-12);
        assert!((d.opacity_for_age(10_000) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn zero_floor_is_respected() {
        let d = OpacityDecay {
            base_opacity: 0.4,
            floor_opacity: 0.0,
            decay_per_step: 0.1,
        };
        assert_eq!(d.opacity_for_age(10), 0.0);
    }
}
