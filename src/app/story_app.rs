//! Standalone [`TrendTraceApp`] (eframe) wrapper around a [`PlaybackSession`].

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use chrono::NaiveDate;
use eframe::egui;
use egui_phosphor::regular as icons;
use tracing::{error, info, warn};

use crate::config::StoryConfig;
use crate::controllers::{PlaybackController, PlaybackInfo, WheelScrubber};
use crate::data::hotkeys::{detect_hotkey_actions, HotkeyName};
use crate::data::sample::Dataset;
use crate::error::{Result, TrendError};
use crate::playback::{PlaybackPhase, PlaybackSession};

use super::chart::{show_chart, ChartStyle};
use super::overview::show_overview;
use super::story_panel::show_story_panel;
use super::view::{scale_label, ViewState};

/// Samples moved by Shift+Arrow.
const JUMP_STEP: i64 = 30;
/// Repaint interval while cursors or axes are tweening.
const ANIMATION_FRAME: Duration = Duration::from_millis(16);

/// What the central panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Story,
    Overview,
}

pub struct TrendTraceApp {
    config: StoryConfig,
    session: Option<PlaybackSession>,
    view: Rc<RefCell<ViewState>>,
    wheel: WheelScrubber,
    playback_ctrl: Option<PlaybackController>,
    /// Shown instead of the chart when no session could be built.
    status: Option<String>,
    source: Option<PathBuf>,
    clock: Duration,
    page: Page,
}

impl TrendTraceApp {
    pub fn new(mut config: StoryConfig) -> Self {
        let playback_ctrl = config.controllers.playback.take();
        Self {
            view: Rc::new(RefCell::new(ViewState::new(config.timing.transition()))),
            wheel: WheelScrubber::new(config.wheel),
            session: None,
            playback_ctrl,
            status: Some("Open a CSV file to start.".to_string()),
            source: None,
            clock: Duration::ZERO,
            page: Page::Story,
            config,
        }
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Load `path` with the configured columns and replace the session.
    pub fn load_csv(&mut self, path: &Path) {
        info!(?path, "loading dataset");
        self.source = Some(path.to_path_buf());
        let dataset = self.config.load_dataset(path);
        self.set_dataset(dataset);
    }

    /// Replace the current session. Errors leave the viewer empty with a
    /// message and disabled controls.
    pub fn set_dataset(&mut self, dataset: Result<Dataset>) {
        if let Some(mut old) = self.session.take() {
            old.dispose();
        }
        self.view.borrow_mut().clear();
        self.wheel.reset();

        match dataset.and_then(|d| self.config.build_session(d)) {
            Ok(mut session) => {
                session.advance_clock(self.clock);
                session.attach_renderer(Box::new(self.view.clone()));
                session.attach_narrative_view(Box::new(self.view.clone()));
                let ds = session.dataset();
                info!(
                    samples = ds.len(),
                    first = %ds.first_date(),
                    last = %ds.last_date(),
                    "dataset ready"
                );
                self.status = None;
                self.session = Some(session);
            }
            Err(TrendError::EmptyDataset) => {
                warn!("dataset has no usable rows");
                self.status = Some("The dataset has no usable rows.".to_string());
            }
            Err(e) => {
                error!(error = %e, "failed to load dataset");
                self.status = Some(format!("Could not load data: {}", e));
            }
        }
    }

    fn pick_csv(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("CSV", &["csv"]);
        if let Some(dir) = self.source.as_deref().and_then(Path::parent) {
            dialog = dialog.set_directory(dir);
        }
        if let Some(path) = dialog.pick_file() {
            self.load_csv(&path);
        }
    }

    fn jump_to(&mut self, date: NaiveDate) {
        let Some(session) = self.session.as_mut() else { return };
        let index = session
            .dataset()
            .index_at_or_after(date)
            .unwrap_or_else(|| session.dataset().last_index());
        session.scrub_to(index as i64);
    }

    fn handle_hotkeys(&mut self, ctx: &egui::Context) {
        for action in detect_hotkey_actions(&self.config.hotkeys, ctx) {
            if action == HotkeyName::OpenCsv {
                self.pick_csv();
                continue;
            }
            let Some(session) = self.session.as_mut() else { continue };
            match action {
                HotkeyName::PlayPause => session.toggle(),
                HotkeyName::ToggleScale => session.toggle_scale_mode(),
                HotkeyName::StepBack => session.step(-1),
                HotkeyName::StepForward => session.step(1),
                HotkeyName::JumpBack => session.step(-JUMP_STEP),
                HotkeyName::JumpForward => session.step(JUMP_STEP),
                HotkeyName::OpenCsv => {}
            }
        }
    }

    fn hotkey_hint(&self, name: HotkeyName) -> String {
        self.config
            .hotkeys
            .binding(name)
            .map(|hk| format!(" ({})", hk))
            .unwrap_or_default()
    }

    fn top_bar(&mut self, ui: &mut egui::Ui) {
        let mut open_clicked = false;
        ui.horizontal(|ui| {
            if ui
                .button(format!("{} Open CSV…", icons::FOLDER_OPEN))
                .on_hover_text(format!("Load a dataset{}", self.hotkey_hint(HotkeyName::OpenCsv)))
                .clicked()
            {
                open_clicked = true;
            }
            ui.separator();

            if self.config.features.overview {
                let story = format!("{} Story", icons::BOOK_OPEN);
                let overview = format!("{} Overview", icons::CHART_LINE);
                ui.selectable_value(&mut self.page, Page::Story, story);
                ui.selectable_value(&mut self.page, Page::Overview, overview);
                ui.separator();
            }

            let enabled = self.session.is_some();
            let play_hint = self.hotkey_hint(HotkeyName::PlayPause);
            let scale_hint = self.hotkey_hint(HotkeyName::ToggleScale);
            ui.add_enabled_ui(enabled, |ui| {
                let (phase, index, last, mode, date, remaining) = match self.session.as_ref() {
                    Some(s) => (
                        s.phase(),
                        s.current_index(),
                        s.dataset().last_index(),
                        s.state().scale_mode,
                        s.dataset().get(s.current_index()).map(|x| x.date),
                        s.resume_remaining(),
                    ),
                    None => (PlaybackPhase::Idle, 0, 0, self.config.initial_scale, None, None),
                };

                let play_label = if phase == PlaybackPhase::Idle {
                    format!("{} Play", icons::PLAY)
                } else {
                    format!("{} Pause", icons::PAUSE)
                };
                if ui
                    .button(play_label)
                    .on_hover_text(format!("Play / pause{}", play_hint))
                    .clicked()
                {
                    if let Some(s) = self.session.as_mut() {
                        s.toggle();
                    }
                }

                let mut pos = index;
                let slider = egui::Slider::new(&mut pos, 0..=last).show_value(false);
                if ui.add(slider).changed() {
                    if let Some(s) = self.session.as_mut() {
                        s.scrub_to(pos as i64);
                    }
                }
                let date_text = date.map(|d| d.format("%b %d, %Y").to_string()).unwrap_or_default();
                ui.monospace(date_text);

                if ui
                    .button(format!("{} {}", icons::CHART_LINE_UP, scale_label(mode)))
                    .on_hover_text(format!("Toggle log / linear{}", scale_hint))
                    .clicked()
                {
                    if let Some(s) = self.session.as_mut() {
                        s.toggle_scale_mode();
                    }
                }

                if let Some(left) = remaining {
                    let secs = left.as_secs_f64().ceil();
                    ui.label(format!("{} resuming in {:.0}s", icons::HOURGLASS, secs));
                }
            });
        });
        if open_clicked {
            self.pick_csv();
        }
    }

    fn central(&mut self, ui: &mut egui::Ui) -> bool {
        let Some(session) = self.session.as_ref() else {
            ui.centered_and_justified(|ui| {
                ui.label(self.status.as_deref().unwrap_or("No data loaded."));
            });
            return false;
        };
        let style = ChartStyle {
            legend: self.config.features.legend,
            grid: self.config.features.grid,
            cursor_labels: self.config.features.cursor_labels,
        };
        if self.page == Page::Overview {
            show_overview(ui, session.series(), session.dataset().samples(), style);
            return false;
        }
        let view = self.view.borrow();
        let resp = show_chart(ui, &view, session.series(), session.dataset().samples(), style);
        ui.rect_contains_pointer(resp.rect)
    }

    fn wheel_scrub(&mut self, ctx: &egui::Context) {
        // egui reports wheel-up as positive; forward in time is wheel-down.
        let dy = ctx.input(|i| i.raw_scroll_delta.y);
        if dy == 0.0 {
            return;
        }
        let steps = self.wheel.feed(-dy);
        if steps != 0 {
            if let Some(s) = self.session.as_mut() {
                s.step(steps);
            }
        }
    }

    fn schedule_repaint(&self, ctx: &egui::Context) {
        let mut wait = self
            .session
            .as_ref()
            .and_then(PlaybackSession::next_deadline)
            .map(|due| due.saturating_sub(self.clock));
        if self.view.borrow().is_animating() {
            wait = Some(wait.map_or(ANIMATION_FRAME, |w| w.min(ANIMATION_FRAME)));
        }
        if let Some(w) = wait {
            ctx.request_repaint_after(w);
        }
    }
}

impl eframe::App for TrendTraceApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.clock = Duration::from_secs_f64(ctx.input(|i| i.time).max(0.0));
        self.view.borrow_mut().set_clock(self.clock);
        if let Some(session) = self.session.as_mut() {
            session.advance_clock(self.clock);
            if let Some(ctrl) = self.playback_ctrl.as_ref() {
                ctrl.apply_to(session);
            }
        }

        if self.config.features.hotkeys {
            self.handle_hotkeys(ctx);
        }

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            self.top_bar(ui);
        });

        if self.config.features.narrative_panel && self.page == Page::Story {
            let mut jump = None;
            egui::SidePanel::right("story")
                .resizable(true)
                .default_width(340.0)
                .show(ctx, |ui| {
                    let sections = match self.session.as_ref() {
                        Some(s) => s.narrative().table().sections(),
                        None => self.config.sections.as_slice(),
                    };
                    let mut view = self.view.borrow_mut();
                    let headline = self.config.headline.as_deref();
                    jump = show_story_panel(ui, headline, sections, &mut view);
                });
            if let Some(date) = jump {
                self.jump_to(date);
            }
        }

        let mut chart_hovered = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            chart_hovered = self.central(ui);
        });
        if chart_hovered && self.config.features.wheel_scrub {
            self.wheel_scrub(ctx);
        }

        if let Some(ctrl) = self.playback_ctrl.as_ref() {
            if let Some(session) = self.session.as_ref() {
                ctrl.publish(PlaybackInfo::from_session(session));
            }
        }

        self.schedule_repaint(ctx);
    }
}
