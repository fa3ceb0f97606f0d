//! trendtrace crate root: re-exports and module wiring.
//!
//! A scrollytelling trace chart of Bitcoin's price against search interest.
//! The crate is split into:
//! - `data`: samples, loader, scales, trails, story table, tweens, hotkeys
//! - `playback`: the milestone-aware playback state machine and its session
//! - `scheduler`: cooperative timer queue driven by the host clock
//! - `render`: the frame contract between playback and drawing
//! - `events`: bitflag story events and subscriptions
//! - `controllers`: wheel scrubbing and the external playback handle
//! - `config` / `persistence`: story configuration and YAML/JSON files
//! - `app`: the egui/eframe viewer

pub mod app;
pub mod config;
pub mod controllers;
pub mod data;
pub mod error;
pub mod events;
pub mod persistence;
pub mod playback;
pub mod render;
pub mod scheduler;

// Public re-exports for a compact external API
pub use app::{run_trendtrace, TrendTraceApp};
pub use config::{FeatureFlags, StoryConfig};
pub use controllers::{PlaybackController, PlaybackInfo, WheelScrubber, WheelSettings};
pub use data::loader::{load_csv_path, load_csv_reader, load_rows, LoaderColumns, RawRow, RawValue};
pub use data::sample::{Dataset, Sample, SeriesRef};
pub use data::scale::{
    AxisDomains, AxisScale, Ceilings, Domain, DomainRule, ScaleMode, ScaleProvider,
};
pub use data::series::{OpacityDecay, SeriesDefinition, SeriesLook};
pub use data::story::{NarrativeController, NarrativeView, SectionId, StorySection, StoryTable};
pub use error::{Result, TrendError};
pub use events::{EventController, EventFilter, EventKind, StoryEvent};
pub use playback::{PlaybackPhase, PlaybackSession, PlaybackState, PlaybackTiming};
pub use render::{LatestFrame, RenderFrame, Renderer};
