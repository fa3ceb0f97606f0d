//! View-side state shared between the playback session and the egui widgets.
//!
//! The session owns an `Rc<RefCell<ViewState>>` as both its [`Renderer`] and
//! its [`NarrativeView`]; the app keeps another handle and reads it while
//! painting. Everything here is single-threaded, like the egui frame loop.

use std::collections::HashMap;
use std::time::Duration;

use crate::data::sample::SeriesRef;
use crate::data::scale::{AxisDomains, Ceilings, Domain, ScaleMode};
use crate::data::story::{NarrativeView, SectionId};
use crate::data::tween::{CursorTween, DomainTransition};
use crate::render::{RenderFrame, Renderer};

pub struct ViewState {
    /// Host clock, set by the app at the top of every frame.
    now: Duration,
    transition: Duration,
    frame: Option<RenderFrame>,
    domain: Option<DomainTransition>,
    cursors: HashMap<SeriesRef, CursorTween>,
    visible: HashMap<SectionId, bool>,
    scroll_request: Option<SectionId>,
}

impl ViewState {
    pub fn new(transition: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            transition,
            frame: None,
            domain: None,
            cursors: HashMap::new(),
            visible: HashMap::new(),
            scroll_request: None,
        }
    }

    pub fn set_clock(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn frame(&self) -> Option<&RenderFrame> {
        self.frame.as_ref()
    }

    /// Forget the previous dataset: frame, tweens and section visibility.
    pub fn clear(&mut self) {
        self.frame = None;
        self.domain = None;
        self.cursors.clear();
        self.visible.clear();
        self.scroll_request = None;
    }

    /// Domains to draw right now: floors from the frame, ceilings mid-tween.
    pub fn domains_now(&self) -> Option<AxisDomains> {
        let frame = self.frame.as_ref()?;
        let target = frame.domains;
        let Ceilings { x_max, y_max } = self
            .domain
            .map(|d| d.ceilings_at(self.now))
            .unwrap_or_else(|| target.ceilings());
        Some(AxisDomains {
            x: Domain::new(target.x.min, x_max),
            y: Domain::new(target.y.min, y_max),
            mode: target.mode,
        })
    }

    /// Animated cursor position in data space, `None` when the current sample
    /// has no value for `series`.
    pub fn cursor(&self, series: &SeriesRef) -> Option<[f64; 2]> {
        let frame = self.frame.as_ref()?;
        frame.sample.point(series)?;
        self.cursors.get(series).map(|c| c.position(self.now))
    }

    pub fn is_animating(&self) -> bool {
        self.domain.is_some_and(|d| d.is_animating(self.now))
            || self.cursors.values().any(|c| !c.is_finished(self.now))
    }

    /// Sections not yet reported default to hidden.
    pub fn is_visible(&self, section: &SectionId) -> bool {
        self.visible.get(section).copied().unwrap_or(false)
    }

    /// Section the panel should scroll to, handed out once.
    pub fn take_scroll_request(&mut self) -> Option<SectionId> {
        self.scroll_request.take()
    }

    fn update_domain(&mut self, frame: &RenderFrame, mode_changed: bool) {
        let resolved = frame.domains.ceilings();
        match self.domain.as_mut() {
            Some(d) if mode_changed => d.snap(resolved),
            Some(d) => {
                d.update(self.now, resolved, self.transition);
            }
            None => self.domain = Some(DomainTransition::new(resolved)),
        }
    }

    fn update_cursors(&mut self, frame: &RenderFrame) {
        for series in frame.sample.interest.keys() {
            let Some(target) = frame.sample.point(series) else {
                continue;
            };
            match self.cursors.get_mut(series) {
                Some(c) if c.target() != target => c.retarget(self.now, target, self.transition),
                Some(_) => {}
                None => {
                    self.cursors.insert(series.clone(), CursorTween::at(target));
                }
            }
        }
    }
}

impl Renderer for ViewState {
    fn render(&mut self, frame: &RenderFrame) {
        let mode_changed = self
            .frame
            .as_ref()
            .is_some_and(|prev| prev.scale_mode != frame.scale_mode);
        self.update_domain(frame, mode_changed);
        self.update_cursors(frame);
        self.frame = Some(frame.clone());
    }
}

impl NarrativeView for ViewState {
    fn set_visible(&mut self, section: &SectionId, visible: bool) {
        self.visible.insert(section.clone(), visible);
    }

    fn scroll_into_view(&mut self, section: &SectionId) {
        self.scroll_request = Some(section.clone());
    }
}

/// Label for the scale toggle button.
pub fn scale_label(mode: ScaleMode) -> &'static str {
    match mode {
        ScaleMode::Logarithmic => "Log scale",
        ScaleMode::Linear => "Linear scale",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::Sample;
    use crate::playback::PlaybackPhase;
    use chrono::NaiveDate;

    fn frame(day: u32, price: f64, interest: f64, domains: AxisDomains) -> RenderFrame {
        let date = NaiveDate::from_ymd_opt(2021, 1, day).unwrap();
        RenderFrame {
            index: day as usize,
            date,
            sample: Sample::new(date, price).with_interest("nft", Some(interest)),
            trails: Vec::new(),
            domains,
            scale_mode: domains.mode,
            phase: PlaybackPhase::Playing,
            section: None,
            at_end: false,
        }
    }

    fn domains(x_max: f64, y_max: f64, mode: ScaleMode) -> AxisDomains {
        AxisDomains {
            x: Domain::new(1.0, x_max),
            y: Domain::new(0.1, y_max),
            mode,
        }
    }

    #[test]
    fn first_frame_places_cursor_without_tween() {
        let mut view = ViewState::new(Duration::from_millis(1000));
        view.render(&frame(1, 100.0, 5.0, domains(1000.0, 10.0, ScaleMode::Linear)));
        assert_eq!(view.cursor(&"nft".into()), Some([100.0, 5.0]));
        assert!(!view.is_animating());
    }

    #[test]
    fn cursor_and_domain_tween_toward_new_targets() {
        let mut view = ViewState::new(Duration::from_millis(1000));
        view.render(&frame(1, 100.0, 5.0, domains(1000.0, 10.0, ScaleMode::Linear)));
        view.render(&frame(2, 200.0, 5.0, domains(2000.0, 10.0, ScaleMode::Linear)));
        assert!(view.is_animating());
        view.set_clock(Duration::from_millis(500));
        let [x, _] = view.cursor(&"nft".into()).unwrap();
        assert!(x > 100.0 && x < 200.0);
        let d = view.domains_now().unwrap();
        assert!(d.x.max > 1000.0 && d.x.max < 2000.0);
        view.set_clock(Duration::from_millis(1000));
        assert_eq!(view.cursor(&"nft".into()), Some([200.0, 5.0]));
        assert!(!view.is_animating());
    }

    #[test]
    fn scale_mode_change_snaps_domain() {
        let mut view = ViewState::new(Duration::from_millis(1000));
        view.render(&frame(1, 100.0, 5.0, domains(1000.0, 10.0, ScaleMode::Linear)));
        view.render(&frame(1, 100.0, 5.0, domains(2000.0, 10.0, ScaleMode::Logarithmic)));
        assert_eq!(view.domains_now().unwrap().x.max, 2000.0);
        assert_eq!(view.domains_now().unwrap().mode, ScaleMode::Logarithmic);
    }

    #[test]
    fn missing_value_hides_cursor() {
        let mut view = ViewState::new(Duration::ZERO);
        view.render(&frame(1, 100.0, 5.0, domains(1000.0, 10.0, ScaleMode::Linear)));
        let mut f = frame(2, 150.0, 5.0, domains(1000.0, 10.0, ScaleMode::Linear));
        f.sample.interest.insert("nft".into(), None);
        view.render(&f);
        assert_eq!(view.cursor(&"nft".into()), None);
    }

    #[test]
    fn narrative_requests_are_recorded() {
        let mut view = ViewState::new(Duration::ZERO);
        let a = SectionId::from("a");
        assert!(!view.is_visible(&a));
        view.set_visible(&a, true);
        view.scroll_into_view(&a);
        assert!(view.is_visible(&a));
        assert_eq!(view.take_scroll_request(), Some(a));
        assert_eq!(view.take_scroll_request(), None);
    }
}
