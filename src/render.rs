//! Render contract between the playback engine and whatever draws the chart.

use chrono::NaiveDate;

use crate::data::sample::Sample;
use crate::data::scale::{AxisDomains, ScaleMode};
use crate::data::story::SectionId;
use crate::data::trail::SeriesTrail;
use crate::playback::PlaybackPhase;

/// Everything a renderer needs to paint one moment of playback.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub index: usize,
    pub date: NaiveDate,
    pub sample: Sample,
    pub trails: Vec<SeriesTrail>,
    /// Target domains resolved for `date`; renderers tween toward them.
    pub domains: AxisDomains,
    pub scale_mode: ScaleMode,
    pub phase: PlaybackPhase,
    pub section: Option<SectionId>,
    /// `true` when `index` is the last sample.
    pub at_end: bool,
}

/// Invoked by the playback engine after every state-affecting transition.
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame);
}

/// Keeps only the most recent frame. Handy for hosts that paint on their own
/// schedule, and for tests.
#[derive(Debug, Default, Clone)]
pub struct LatestFrame {
    pub frame: Option<RenderFrame>,
    pub renders: usize,
}

impl Renderer for LatestFrame {
    fn render(&mut self, frame: &RenderFrame) {
        self.frame = Some(frame.clone());
        self.renders += 1;
    }
}

impl<R: Renderer + ?Sized> Renderer for std::rc::Rc<std::cell::RefCell<R>> {
    fn render(&mut self, frame: &RenderFrame) {
        self.borrow_mut().render(frame);
    }
}
