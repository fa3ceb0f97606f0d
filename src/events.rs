//! Playback event stream.
//!
//! Hosts subscribe to story events via [`EventController`]. Each event
//! carries a set of [`EventKind`] flags so that one occurrence can match
//! multiple categories (a milestone pause is *also* a `PAUSE`).
//!
//! Subscribers pass an [`EventFilter`]; an event is delivered when
//! `(event.kinds & filter) != 0`.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::data::scale::ScaleMode;
use crate::data::story::SectionId;

// ─────────────────────────────────────────────────────────────────────────────
// EventKind – bitflags
// ─────────────────────────────────────────────────────────────────────────────

/// Bitflags describing the categories a [`StoryEvent`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventKind(pub u64);

impl EventKind {
    // ── Playback ────────────────────────────────────────────────────────
    /// Auto-play started (user play or auto-resume).
    pub const PLAY: Self = Self(1 << 0);
    /// Auto-play stopped.
    pub const PAUSE: Self = Self(1 << 1);
    /// The ticker advanced the cursor by one sample.
    pub const TICK: Self = Self(1 << 2);
    /// The cursor was moved by the user (slider, wheel, keys).
    pub const SCRUB: Self = Self(1 << 3);
    /// Playback reached the last sample and went idle.
    pub const FINISHED: Self = Self(1 << 4);

    // ── Story ───────────────────────────────────────────────────────────
    /// Playback paused on entering a milestone section.
    pub const MILESTONE_PAUSE: Self = Self(1 << 5);
    /// The milestone dwell elapsed and playback resumed on its own.
    pub const AUTO_RESUME: Self = Self(1 << 6);
    /// A different story section became active.
    pub const SECTION_CHANGED: Self = Self(1 << 7);

    // ── View ────────────────────────────────────────────────────────────
    /// Linear/logarithmic mode was switched.
    pub const SCALE_MODE_CHANGED: Self = Self(1 << 8);
    /// The session was disposed; no further events follow.
    pub const DISPOSED: Self = Self(1 << 9);

    /// Wildcard: matches every event kind.
    pub const ALL: Self = Self(u64::MAX);

    /// Check whether `self` contains all bits in `other`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// At least one bit in common.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for EventKind {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for EventKind {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for EventKind {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "EMPTY");
        }
        if *self == EventKind::ALL {
            return write!(f, "ALL");
        }

        let pairs: &[(EventKind, &str)] = &[
            (EventKind::PLAY, "PLAY"),
            (EventKind::PAUSE, "PAUSE"),
            (EventKind::TICK, "TICK"),
            (EventKind::SCRUB, "SCRUB"),
            (EventKind::FINISHED, "FINISHED"),
            (EventKind::MILESTONE_PAUSE, "MILESTONE_PAUSE"),
            (EventKind::AUTO_RESUME, "AUTO_RESUME"),
            (EventKind::SECTION_CHANGED, "SECTION_CHANGED"),
            (EventKind::SCALE_MODE_CHANGED, "SCALE_MODE_CHANGED"),
            (EventKind::DISPOSED, "DISPOSED"),
        ];

        let mut names = Vec::new();
        let mut known_bits: u64 = 0;
        for (kind, name) in pairs {
            known_bits |= kind.0;
            if self.contains(*kind) {
                names.push((*name).to_string());
            }
        }
        let extra = self.0 & !known_bits;
        if extra != 0 {
            names.push(format!("0x{:x}", extra));
        }
        write!(f, "{}", names.join("|"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StoryEvent
// ─────────────────────────────────────────────────────────────────────────────

/// Metadata for section changes.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionMeta {
    pub previous: Option<SectionId>,
    pub active: SectionId,
}

/// An event emitted by a playback session.
#[derive(Debug, Clone)]
pub struct StoryEvent {
    pub kinds: EventKind,
    /// Seconds since the controller was created.
    pub timestamp: f64,
    /// Cursor position after the change.
    pub index: usize,
    pub date: Option<NaiveDate>,

    pub section: Option<SectionMeta>,
    pub milestone: Option<SectionId>,
    pub scale_mode: Option<ScaleMode>,
}

impl StoryEvent {
    pub fn new(kinds: EventKind, index: usize, date: Option<NaiveDate>) -> Self {
        Self {
            kinds,
            timestamp: 0.0, // set by the controller
            index,
            date,
            section: None,
            milestone: None,
            scale_mode: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventFilter
// ─────────────────────────────────────────────────────────────────────────────

/// OR-mask selecting which event categories a subscriber receives.
#[derive(Debug, Clone, Copy)]
pub struct EventFilter {
    pub mask: EventKind,
}

impl EventFilter {
    pub const fn all() -> Self {
        Self { mask: EventKind::ALL }
    }

    pub const fn only(mask: EventKind) -> Self {
        Self { mask }
    }

    #[inline]
    pub fn matches(&self, event: &StoryEvent) -> bool {
        event.kinds.intersects(self.mask)
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventController
// ─────────────────────────────────────────────────────────────────────────────

struct Subscriber {
    filter: EventFilter,
    sender: Sender<StoryEvent>,
}

/// Collects story events and fans them out to `mpsc` subscribers.
///
/// Cloning shares the subscriber list, so a host can keep one handle and give
/// another to the session.
#[derive(Clone)]
pub struct EventController {
    inner: Arc<Mutex<EventCtrlInner>>,
}

struct EventCtrlInner {
    subscribers: Vec<Subscriber>,
    start_instant: std::time::Instant,
}

impl EventController {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventCtrlInner {
                subscribers: Vec::new(),
                start_instant: std::time::Instant::now(),
            })),
        }
    }

    /// Receive every event whose kinds intersect `filter`.
    pub fn subscribe(&self, filter: EventFilter) -> Receiver<StoryEvent> {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut inner = self.inner.lock().unwrap();
        inner.subscribers.push(Subscriber { filter, sender: tx });
        rx
    }

    pub fn subscribe_all(&self) -> Receiver<StoryEvent> {
        self.subscribe(EventFilter::all())
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().unwrap().subscribers.len()
    }

    /// Stamp and deliver `event`. Subscribers whose receiver was dropped are
    /// pruned the next time a matching event is sent to them.
    pub fn emit(&self, mut event: StoryEvent) {
        let mut inner = self.inner.lock().unwrap();
        event.timestamp = inner.start_instant.elapsed().as_secs_f64();
        inner.subscribers.retain(|sub| {
            if sub.filter.matches(&event) {
                sub.sender.send(event.clone()).is_ok()
            } else {
                true
            }
        });
    }
}

impl Default for EventController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn milestone_pause_is_also_a_pause() {
        let kinds = EventKind::PAUSE | EventKind::MILESTONE_PAUSE;
        assert!(kinds.contains(EventKind::PAUSE));
        assert!(EventFilter::only(EventKind::PAUSE).matches(&StoryEvent::new(kinds, 0, None)));
        assert!(!EventFilter::only(EventKind::TICK).matches(&StoryEvent::new(kinds, 0, None)));
    }

    #[test]
    fn controller_filters_per_subscriber() {
        let ctrl = EventController::new();
        let rx_all = ctrl.subscribe_all();
        let rx_ticks = ctrl.subscribe(EventFilter::only(EventKind::TICK));
        let rx_scale = ctrl.subscribe(EventFilter::only(EventKind::SCALE_MODE_CHANGED));

        ctrl.emit(StoryEvent::new(EventKind::TICK, 3, None));

        assert_eq!(rx_all.try_recv().unwrap().index, 3);
        assert!(rx_ticks.try_recv().is_ok());
        assert!(rx_scale.try_recv().is_err());
    }

    #[test]
    fn dropped_receiver_is_pruned() {
        let ctrl = EventController::new();
        let rx1 = ctrl.subscribe_all();
        let rx2 = ctrl.subscribe_all();
        drop(rx1);
        ctrl.emit(StoryEvent::new(EventKind::PLAY, 0, None));
        assert!(rx2.try_recv().is_ok());
        assert_eq!(ctrl.subscriber_count(), 1);
    }

    #[test]
    fn display_joins_names() {
        assert_eq!(EventKind::TICK.to_string(), "TICK");
        let both = EventKind::PAUSE | EventKind::MILESTONE_PAUSE;
        assert_eq!(both.to_string(), "PAUSE|MILESTONE_PAUSE");
        assert_eq!(EventKind::ALL.to_string(), "ALL");
        assert!(EventKind(1 << 63).to_string().starts_with("0x"));
    }

    #[test]
    fn kinds_do_not_overlap() {
        let all = [
            EventKind::PLAY,
            EventKind::PAUSE,
            EventKind::TICK,
            EventKind::SCRUB,
            EventKind::FINISHED,
            EventKind::MILESTONE_PAUSE,
            EventKind::AUTO_RESUME,
            EventKind::SECTION_CHANGED,
            EventKind::SCALE_MODE_CHANGED,
            EventKind::DISPOSED,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert!(!a.intersects(*b), "{a} overlaps {b}");
            }
        }
    }
}
