//! Data model: samples and their loader, scales, trails, the story table,
//! tweens and keyboard bindings.

pub mod hotkeys;
pub mod loader;
pub mod sample;
pub mod scale;
pub mod series;
pub mod story;
pub mod trail;
pub mod tween;
