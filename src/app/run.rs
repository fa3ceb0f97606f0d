//! Top-level entry point for running the viewer as a native window.

use std::path::PathBuf;

use eframe::egui;

use crate::config::StoryConfig;

use super::story_app::TrendTraceApp;

/// Open the viewer for `cfg`, loading `csv` first when given.
///
/// Blocks until the window is closed.
pub fn run_trendtrace(mut cfg: StoryConfig, csv: Option<PathBuf>) -> eframe::Result<()> {
    let title = cfg.title.clone();
    let mut opts = cfg
        .native_options
        .take()
        .unwrap_or_else(eframe::NativeOptions::default);

    // Set a bigger default window size if one is not provided by config.
    if opts.viewport.inner_size.is_none() {
        opts.viewport = opts
            .viewport
            .clone()
            .with_inner_size(egui::vec2(1400.0, 900.0))
            .with_title(title.clone());
    }

    let mut app = TrendTraceApp::new(cfg);
    if let Some(path) = csv {
        app.load_csv(&path);
    }

    eframe::run_native(
        &title,
        opts,
        Box::new(|cc| {
            // Install Phosphor icon font before creating the app.
            let mut fonts = egui::FontDefinitions::default();
            egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
            cc.egui_ctx.set_fonts(fonts);
            Ok(Box::new(app))
        }),
    )
}
