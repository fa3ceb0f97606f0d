//! The egui viewer.
//!
//! | Sub-module      | Responsibility |
//! | --------------- | -------------- |
//! | [`view`]        | Renderer + narrative view state shared with the session, tweens |
//! | [`chart`]       | `egui_plot` trace chart: trails, cursors, scale-aware axes |
//! | [`overview`]    | Static full-history price and keyword plots |
//! | [`story_panel`] | Side panel with the story sections |
//! | [`story_app`]   | [`TrendTraceApp`] (eframe) frame loop, controls and input |
//! | [`run`]         | [`run_trendtrace()`] native window entry point |

mod chart;
mod overview;
mod story_app;
mod story_panel;
mod run;
pub mod view;

pub use run::run_trendtrace;
pub use story_app::TrendTraceApp;
pub use view::ViewState;
