//! Controllers for driving playback from input devices and external code.
//!
//! [`WheelScrubber`] turns raw wheel deltas into index steps.
//! [`PlaybackController`] is a cloneable handle that non-UI code can use to
//! queue play/pause/scrub/scale requests and observe the playback position;
//! the viewer applies queued requests on its next frame.

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::scale::ScaleMode;
use crate::playback::{PlaybackPhase, PlaybackSession};

// ─────────────────────────────────────────────────────────────────────────────
// Wheel scrubbing
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelSettings {
    pub enabled: bool,
    /// Pixels of accumulated wheel delta per step.
    pub threshold_px: f32,
    /// Samples moved per step.
    pub samples_per_step: i64,
}

impl Default for WheelSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_px: 36.0,
            samples_per_step: 2,
        }
    }
}

/// Accumulates wheel deltas and emits whole index steps, carrying the
/// remainder over to the next event.
#[derive(Debug, Clone, Default)]
pub struct WheelScrubber {
    settings: WheelSettings,
    accumulated: f32,
}

impl WheelScrubber {
    pub fn new(settings: WheelSettings) -> Self {
        Self {
            settings,
            accumulated: 0.0,
        }
    }

    pub fn settings(&self) -> WheelSettings {
        self.settings
    }

    /// Feed a wheel delta in pixels (positive = toward later dates) and get
    /// the index delta to apply, `0` until a threshold is crossed.
    pub fn feed(&mut self, delta_px: f32) -> i64 {
        if !self.settings.enabled || !delta_px.is_finite() || self.settings.threshold_px <= 0.0 {
            return 0;
        }
        self.accumulated += delta_px;
        let crosses = (self.accumulated / self.settings.threshold_px).trunc();
        if crosses == 0.0 {
            return 0;
        }
        self.accumulated -= crosses * self.settings.threshold_px;
        crosses as i64 * self.settings.samples_per_step
    }

    pub fn remainder(&self) -> f32 {
        self.accumulated
    }

    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PlaybackController
// ─────────────────────────────────────────────────────────────────────────────

/// A queued request from external code.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackRequest {
    Play,
    Pause,
    Toggle,
    ScrubTo(i64),
    Step(i64),
    SetScaleMode(ScaleMode),
    ToggleScaleMode,
}

/// Published playback position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackInfo {
    pub index: usize,
    pub len: usize,
    pub date: Option<NaiveDate>,
    pub phase: PlaybackPhase,
    pub scale_mode: ScaleMode,
}

impl PlaybackInfo {
    pub fn from_session(session: &PlaybackSession) -> Self {
        let index = session.current_index();
        Self {
            index,
            len: session.dataset().len(),
            date: session.dataset().get(index).map(|s| s.date),
            phase: session.phase(),
            scale_mode: session.state().scale_mode,
        }
    }
}

/// Handle for requesting playback changes from outside the UI.
#[derive(Clone)]
pub struct PlaybackController {
    pub(crate) inner: Arc<Mutex<PlaybackCtrlInner>>,
}

pub(crate) struct PlaybackCtrlInner {
    pub(crate) requests: VecDeque<PlaybackRequest>,
    pub(crate) last_info: Option<PlaybackInfo>,
    pub(crate) listeners: Vec<Sender<PlaybackInfo>>,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(PlaybackCtrlInner {
                requests: VecDeque::new(),
                last_info: None,
                listeners: Vec::new(),
            })),
        }
    }

    fn push(&self, request: PlaybackRequest) {
        self.inner.lock().unwrap().requests.push_back(request);
    }

    pub fn play(&self) {
        self.push(PlaybackRequest::Play);
    }

    pub fn pause(&self) {
        self.push(PlaybackRequest::Pause);
    }

    pub fn toggle(&self) {
        self.push(PlaybackRequest::Toggle);
    }

    pub fn scrub_to(&self, index: i64) {
        self.push(PlaybackRequest::ScrubTo(index));
    }

    pub fn step(&self, delta: i64) {
        self.push(PlaybackRequest::Step(delta));
    }

    pub fn set_scale_mode(&self, mode: ScaleMode) {
        self.push(PlaybackRequest::SetScaleMode(mode));
    }

    pub fn toggle_scale_mode(&self) {
        self.push(PlaybackRequest::ToggleScaleMode);
    }

    /// Last published playback position (if the UI has published one yet).
    pub fn info(&self) -> Option<PlaybackInfo> {
        self.inner.lock().unwrap().last_info.clone()
    }

    /// Receive a [`PlaybackInfo`] every time the published position changes.
    pub fn subscribe(&self) -> Receiver<PlaybackInfo> {
        let (tx, rx) = std::sync::mpsc::channel();
        self.inner.lock().unwrap().listeners.push(tx);
        rx
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }

    /// Apply every queued request to `session` in order, then publish the
    /// resulting position. Returns the number of requests applied.
    pub fn apply_to(&self, session: &mut PlaybackSession) -> usize {
        let requests: Vec<PlaybackRequest> =
            self.inner.lock().unwrap().requests.drain(..).collect();
        let applied = requests.len();
        for request in requests {
            match request {
                PlaybackRequest::Play => session.play(),
                PlaybackRequest::Pause => session.pause(),
                PlaybackRequest::Toggle => session.toggle(),
                PlaybackRequest::ScrubTo(i) => session.scrub_to(i),
                PlaybackRequest::Step(d) => session.step(d),
                PlaybackRequest::SetScaleMode(m) => session.set_scale_mode(m),
                PlaybackRequest::ToggleScaleMode => session.toggle_scale_mode(),
            }
        }
        self.publish(PlaybackInfo::from_session(session));
        applied
    }

    /// Record `info`; listeners are notified only when it changed.
    pub fn publish(&self, info: PlaybackInfo) {
        let mut inner = self.inner.lock().unwrap();
        if inner.last_info.as_ref() == Some(&info) {
            return;
        }
        inner.listeners.retain(|s| s.send(info.clone()).is_ok());
        inner.last_info = Some(info);
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_needs_full_threshold() {
        let mut w = WheelScrubber::new(WheelSettings::default());
        assert_eq!(w.feed(20.0), 0);
        assert_eq!(w.feed(20.0), 2);
        assert!((w.remainder() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn wheel_handles_large_and_negative_deltas() {
        let mut w = WheelScrubber::new(WheelSettings::default());
        assert_eq!(w.feed(100.0), 4);
        assert!((w.remainder() - 28.0).abs() < 1e-6);
        assert_eq!(w.feed(-100.0), -4);
        assert!(w.remainder().abs() < 1e-6);
    }

    #[test]
    fn disabled_wheel_ignores_input() {
        let mut w = WheelScrubber::new(WheelSettings {
            enabled: false,
            ..Default::default()
        });
        assert_eq!(w.feed(1000.0), 0);
        assert_eq!(w.remainder(), 0.0);
    }

    #[test]
    fn requests_queue_in_order() {
        let ctrl = PlaybackController::new();
        let clone = ctrl.clone();
        clone.play();
        clone.step(3);
        assert_eq!(ctrl.pending(), 2);
        let queued: Vec<_> = ctrl.inner.lock().unwrap().requests.iter().cloned().collect();
        assert_eq!(queued, vec![PlaybackRequest::Play, PlaybackRequest::Step(3)]);
    }

    #[test]
    fn publish_notifies_only_on_change() {
        let ctrl = PlaybackController::new();
        let rx = ctrl.subscribe();
        let info = PlaybackInfo {
            index: 1,
            len: 10,
            date: None,
            phase: PlaybackPhase::Idle,
            scale_mode: ScaleMode::Logarithmic,
        };
        ctrl.publish(info.clone());
        ctrl.publish(info.clone());
        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(ctrl.info(), Some(info));
    }
}
