//! Playback engine: the temporal state machine behind the trace chart.
//!
//! [`PlaybackState`] is plain data. The free functions [`play`], [`pause`],
//! [`toggle`], [`tick`], [`scrub_to`], [`step`], [`resume_after_dwell`] and
//! [`set_scale_mode`] take a state and return a [`Transition`]: the next state
//! plus the [`Effect`]s the host must carry out. [`PlaybackSession`] is that
//! host: it owns the timers, the narrative controller, the renderer and the
//! event stream, and interprets effects.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::sample::Dataset;
use crate::data::scale::{ScaleMode, ScaleProvider};
use crate::data::series::SeriesDefinition;
use crate::data::story::{Milestone, MilestoneId, NarrativeController, NarrativeView, StoryTable};
use crate::data::trail::compute_trails;
use crate::error::{Result, TrendError};
use crate::events::{EventController, EventKind, SectionMeta, StoryEvent};
use crate::render::{RenderFrame, Renderer};
use crate::scheduler::{Scheduler, TimerId};

// ─────────────────────────────────────────────────────────────────────────────
// State
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlaybackPhase {
    #[default]
    Idle,
    /// Auto-advancing on the recurring tick.
    Playing,
    /// Auto-advance suspended after a milestone fired; a resume is scheduled.
    PausedForMilestone,
}

impl std::fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackPhase::Idle => write!(f, "idle"),
            PlaybackPhase::Playing => write!(f, "playing"),
            PlaybackPhase::PausedForMilestone => write!(f, "paused for milestone"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub current_index: usize,
    pub phase: PlaybackPhase,
    pub scale_mode: ScaleMode,
    /// Milestones that already paused playback. Never shrinks.
    pub fired: BTreeSet<MilestoneId>,
    /// Milestone whose auto-resume is scheduled and has not fired yet.
    pub resume_pending: Option<MilestoneId>,
}

impl PlaybackState {
    pub fn new(scale_mode: ScaleMode) -> Self {
        Self {
            current_index: 0,
            phase: PlaybackPhase::Idle,
            scale_mode,
            fired: BTreeSet::new(),
            resume_pending: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }
}

/// Read-only inputs the transitions consult.
#[derive(Debug, Clone, Copy)]
pub struct Timeline<'a> {
    pub dataset: &'a Dataset,
    pub story: &'a StoryTable,
}

/// Why the cursor moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCause {
    Tick,
    Scrub,
    /// `play()` from the last sample rewound to the start.
    Restart,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartTicker,
    StopTicker,
    ScheduleResume(MilestoneId),
    CancelResume,
    IndexChanged { from: usize, to: usize, cause: IndexCause },
    PhaseChanged { from: PlaybackPhase, to: PlaybackPhase },
    MilestoneFired(Milestone),
    ScaleModeChanged(ScaleMode),
    Finished,
    Render,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: PlaybackState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: PlaybackState) -> Self {
        Self { state, effects: Vec::new() }
    }

    pub fn is_noop(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn has(&self, effect: &Effect) -> bool {
        self.effects.contains(effect)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transitions
// ─────────────────────────────────────────────────────────────────────────────

/// `Idle → Playing`. No-op while playing or while a milestone resume is
/// pending (the pending resume stays scheduled). From the last sample the
/// cursor rewinds to the start first.
pub fn play(mut state: PlaybackState, timeline: &Timeline<'_>) -> Transition {
    let from = state.phase;
    match from {
        PlaybackPhase::Playing => return Transition::unchanged(state),
        PlaybackPhase::PausedForMilestone if state.resume_pending.is_some() => {
            return Transition::unchanged(state)
        }
        _ => {}
    }

    let mut effects = Vec::new();
    let last = timeline.dataset.last_index();
    if from == PlaybackPhase::Idle && last > 0 && state.current_index >= last {
        effects.push(Effect::IndexChanged {
            from: state.current_index,
            to: 0,
            cause: IndexCause::Restart,
        });
        state.current_index = 0;
    }
    state.phase = PlaybackPhase::Playing;
    effects.push(Effect::PhaseChanged {
        from,
        to: PlaybackPhase::Playing,
    });
    effects.push(Effect::StartTicker);
    effects.push(Effect::Render);
    Transition { state, effects }
}

/// Any phase → `Idle`, cancelling the ticker and a pending milestone resume.
pub fn pause(mut state: PlaybackState) -> Transition {
    let from = state.phase;
    if from == PlaybackPhase::Idle {
        return Transition::unchanged(state);
    }
    let mut effects = Vec::new();
    if from == PlaybackPhase::Playing {
        effects.push(Effect::StopTicker);
    }
    if state.resume_pending.take().is_some() {
        effects.push(Effect::CancelResume);
    }
    state.phase = PlaybackPhase::Idle;
    effects.push(Effect::PhaseChanged {
        from,
        to: PlaybackPhase::Idle,
    });
    effects.push(Effect::Render);
    Transition { state, effects }
}

/// Play/pause button semantics.
pub fn toggle(state: PlaybackState, timeline: &Timeline<'_>) -> Transition {
    match state.phase {
        PlaybackPhase::Idle => play(state, timeline),
        PlaybackPhase::Playing | PlaybackPhase::PausedForMilestone => pause(state),
    }
}

/// One auto-advance step. Stale ticks (not `Playing`) are ignored.
///
/// Index increment, milestone evaluation and the render request form one
/// transition; nothing observes the state in between.
pub fn tick(mut state: PlaybackState, timeline: &Timeline<'_>) -> Transition {
    if state.phase != PlaybackPhase::Playing {
        return Transition::unchanged(state);
    }

    if state.current_index >= timeline.dataset.last_index() {
        state.phase = PlaybackPhase::Idle;
        return Transition {
            state,
            effects: vec![
                Effect::StopTicker,
                Effect::PhaseChanged {
                    from: PlaybackPhase::Playing,
                    to: PlaybackPhase::Idle,
                },
                Effect::Finished,
                Effect::Render,
            ],
        };
    }

    let from = state.current_index;
    state.current_index += 1;
    let mut effects = vec![Effect::IndexChanged {
        from,
        to: state.current_index,
        cause: IndexCause::Tick,
    }];

    if let Some(sample) = timeline.dataset.get(state.current_index) {
        if let Some(milestone) = timeline.story.milestone_due(sample.date, &state.fired) {
            state.fired.insert(milestone.id.clone());
            state.phase = PlaybackPhase::PausedForMilestone;
            state.resume_pending = Some(milestone.id.clone());
            effects.push(Effect::StopTicker);
            effects.push(Effect::PhaseChanged {
                from: PlaybackPhase::Playing,
                to: PlaybackPhase::PausedForMilestone,
            });
            effects.push(Effect::ScheduleResume(milestone.id.clone()));
            effects.push(Effect::MilestoneFired(milestone));
        }
    }
    effects.push(Effect::Render);
    Transition { state, effects }
}

/// Move the cursor to `target`, clamped into the dataset. Never fires
/// milestones and leaves the phase alone.
pub fn scrub_to(mut state: PlaybackState, timeline: &Timeline<'_>, target: i64) -> Transition {
    let to = timeline.dataset.clamp_index(target);
    let from = state.current_index;
    state.current_index = to;
    let mut effects = Vec::with_capacity(2);
    if from != to {
        effects.push(Effect::IndexChanged {
            from,
            to,
            cause: IndexCause::Scrub,
        });
    }
    effects.push(Effect::Render);
    Transition { state, effects }
}

/// Relative scrub.
pub fn step(state: PlaybackState, timeline: &Timeline<'_>, delta: i64) -> Transition {
    let target = (state.current_index as i64).saturating_add(delta);
    scrub_to(state, timeline, target)
}

/// Dwell elapsed for `milestone`. Resumes only if playback is still paused
/// for that same milestone.
pub fn resume_after_dwell(mut state: PlaybackState, milestone: &MilestoneId) -> Transition {
    if state.phase != PlaybackPhase::PausedForMilestone
        || state.resume_pending.as_ref() != Some(milestone)
    {
        return Transition::unchanged(state);
    }
    state.resume_pending = None;
    state.phase = PlaybackPhase::Playing;
    Transition {
        state,
        effects: vec![
            Effect::PhaseChanged {
                from: PlaybackPhase::PausedForMilestone,
                to: PlaybackPhase::Playing,
            },
            Effect::StartTicker,
            Effect::Render,
        ],
    }
}

pub fn set_scale_mode(mut state: PlaybackState, mode: ScaleMode) -> Transition {
    if state.scale_mode == mode {
        return Transition::unchanged(state);
    }
    state.scale_mode = mode;
    Transition {
        state,
        effects: vec![Effect::ScaleModeChanged(mode), Effect::Render],
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Timer periods and the settled opacity pinned on the final date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackTiming {
    pub tick_period_ms: u64,
    pub milestone_dwell_ms: u64,
    /// Cursor, label and axis tween length.
    pub transition_ms: u64,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        Self {
            tick_period_ms: 40,
            milestone_dwell_ms: 8000,
            transition_ms: 1000,
        }
    }
}

impl PlaybackTiming {
    /// Never zero, so a recurring tick cannot re-fire within one poll.
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms.max(1))
    }

    pub fn milestone_dwell(&self) -> Duration {
        Duration::from_millis(self.milestone_dwell_ms)
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SessionTimer {
    Tick,
    Resume(MilestoneId),
}

/// Owns one run of the story: dataset, state, timers and collaborators.
///
/// The host drives time with [`advance_clock`](Self::advance_clock) and
/// forwards user input to the control methods. Dropping the session disposes
/// it.
pub struct PlaybackSession {
    dataset: Dataset,
    series: Vec<SeriesDefinition>,
    scales: ScaleProvider,
    narrative: NarrativeController,
    state: PlaybackState,
    timing: PlaybackTiming,
    settled_opacity: Option<f64>,

    scheduler: Scheduler<SessionTimer>,
    tick_timer: Option<TimerId>,
    resume_timer: Option<TimerId>,
    now: Duration,

    renderer: Option<Box<dyn Renderer>>,
    view: Option<Box<dyn NarrativeView>>,
    events: Option<EventController>,
    disposed: bool,
}

impl PlaybackSession {
    pub fn new(
        dataset: Dataset,
        series: Vec<SeriesDefinition>,
        scales: ScaleProvider,
        story: StoryTable,
    ) -> Result<Self> {
        if dataset.is_empty() {
            return Err(TrendError::EmptyDataset);
        }
        let mut narrative = NarrativeController::new(story);
        narrative.on_index_changed(dataset.first_date());
        let state = PlaybackState::new(scales.mode());
        debug!(samples = dataset.len(), series = series.len(), "playback session created");
        Ok(Self {
            dataset,
            series,
            scales,
            narrative,
            state,
            timing: PlaybackTiming::default(),
            settled_opacity: Some(0.2),
            scheduler: Scheduler::new(),
            tick_timer: None,
            resume_timer: None,
            now: Duration::ZERO,
            renderer: None,
            view: None,
            events: None,
            disposed: false,
        })
    }

    pub fn with_timing(mut self, timing: PlaybackTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Opacity pinned on every segment at the final date; `None` keeps the
    /// age-based decay there too.
    pub fn with_settled_opacity(mut self, settled: Option<f64>) -> Self {
        self.settled_opacity = settled;
        self
    }

    pub fn with_events(mut self, events: EventController) -> Self {
        self.events = Some(events);
        self
    }

    /// Attach the renderer and paint the current frame.
    pub fn attach_renderer(&mut self, renderer: Box<dyn Renderer>) {
        if self.disposed {
            return;
        }
        self.renderer = Some(renderer);
        self.render_now();
    }

    /// Attach the narrative view and bring it in sync with the active section.
    pub fn attach_narrative_view(&mut self, mut view: Box<dyn NarrativeView>) {
        if self.disposed {
            return;
        }
        if let Some(t) = self.narrative.snapshot() {
            t.apply(view.as_mut());
        }
        self.view = Some(view);
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.state.phase
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn series(&self) -> &[SeriesDefinition] {
        &self.series
    }

    pub fn scales(&self) -> &ScaleProvider {
        &self.scales
    }

    pub fn narrative(&self) -> &NarrativeController {
        &self.narrative
    }

    pub fn timing(&self) -> PlaybackTiming {
        self.timing
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Earliest armed timer deadline, for scheduling the next repaint.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    pub fn has_pending_resume(&self) -> bool {
        self.resume_timer.is_some_and(|id| self.scheduler.is_armed(id))
    }

    /// Time left before a milestone dwell ends and playback resumes.
    pub fn resume_remaining(&self) -> Option<Duration> {
        let due = self.resume_timer.and_then(|id| self.scheduler.due_of(id))?;
        Some(due.saturating_sub(self.now))
    }

    // ── Controls ─────────────────────────────────────────────────────────

    pub fn play(&mut self) {
        self.run(|state, tl| play(state, tl));
    }

    pub fn pause(&mut self) {
        self.run(|state, _| pause(state));
    }

    pub fn toggle(&mut self) {
        self.run(|state, tl| toggle(state, tl));
    }

    pub fn scrub_to(&mut self, target: i64) {
        self.run(|state, tl| scrub_to(state, tl, target));
    }

    pub fn step(&mut self, delta: i64) {
        self.run(|state, tl| step(state, tl, delta));
    }

    pub fn set_scale_mode(&mut self, mode: ScaleMode) {
        self.run(|state, _| set_scale_mode(state, mode));
    }

    pub fn toggle_scale_mode(&mut self) {
        let mode = self.state.scale_mode.toggled();
        self.set_scale_mode(mode);
    }

    /// Advance the session clock to `now` and run every timer that came due.
    /// Times earlier than the current clock are ignored.
    pub fn advance_clock(&mut self, now: Duration) {
        if self.disposed {
            return;
        }
        self.now = self.now.max(now);
        while let Some(fired) = self.scheduler.pop_due(self.now) {
            match fired.tag {
                SessionTimer::Tick => {
                    if self.tick_timer == Some(fired.id) {
                        self.run(|state, tl| tick(state, tl));
                    }
                }
                SessionTimer::Resume(milestone) => {
                    if self.resume_timer == Some(fired.id) {
                        self.resume_timer = None;
                        self.run(|state, _| resume_after_dwell(state, &milestone));
                    }
                }
            }
        }
    }

    /// Cancel all timers and drop the collaborators. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.scheduler.cancel_all();
        self.tick_timer = None;
        self.resume_timer = None;
        self.state.phase = PlaybackPhase::Idle;
        self.state.resume_pending = None;
        self.emit(EventKind::DISPOSED, |_| {});
        self.disposed = true;
        self.renderer = None;
        self.view = None;
        self.events = None;
        debug!("playback session disposed");
    }

    // ── Rendering ────────────────────────────────────────────────────────

    /// Snapshot of the current state for a renderer.
    pub fn frame(&self) -> RenderFrame {
        let index = self.state.current_index;
        let sample = &self.dataset.samples()[index];
        let at_final_date = sample.date == self.dataset.last_date();
        let settled = self.settled_opacity.filter(|_| at_final_date);
        RenderFrame {
            index,
            date: sample.date,
            sample: sample.clone(),
            trails: compute_trails(index, &self.series, settled),
            domains: self.scales.domains_for(sample.date),
            scale_mode: self.state.scale_mode,
            phase: self.state.phase,
            section: self.narrative.active().map(|s| s.id.clone()),
            at_end: index == self.dataset.last_index(),
        }
    }

    fn render_now(&mut self) {
        if self.renderer.is_none() {
            return;
        }
        let frame = self.frame();
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.render(&frame);
        }
    }

    // ── Effect interpretation ────────────────────────────────────────────

    fn run<F>(&mut self, f: F)
    where
        F: FnOnce(PlaybackState, &Timeline<'_>) -> Transition,
    {
        if self.disposed {
            return;
        }
        let transition = {
            let timeline = Timeline {
                dataset: &self.dataset,
                story: self.narrative.table(),
            };
            f(self.state.clone(), &timeline)
        };
        self.apply(transition);
    }

    fn apply(&mut self, transition: Transition) {
        let Transition { state, effects } = transition;
        self.state = state;
        let mut render = false;
        for effect in effects {
            match effect {
                Effect::StartTicker => {
                    if let Some(id) = self.tick_timer.take() {
                        self.scheduler.cancel(id);
                    }
                    let id = self
                        .scheduler
                        .schedule_every(self.now, self.timing.tick_period(), SessionTimer::Tick);
                    self.tick_timer = Some(id);
                }
                Effect::StopTicker => {
                    if let Some(id) = self.tick_timer.take() {
                        self.scheduler.cancel(id);
                    }
                }
                Effect::ScheduleResume(milestone) => {
                    if let Some(id) = self.resume_timer.take() {
                        self.scheduler.cancel(id);
                    }
                    let id = self.scheduler.schedule_once(
                        self.now,
                        self.timing.milestone_dwell(),
                        SessionTimer::Resume(milestone),
                    );
                    self.resume_timer = Some(id);
                }
                Effect::CancelResume => {
                    if let Some(id) = self.resume_timer.take() {
                        self.scheduler.cancel(id);
                    }
                }
                Effect::IndexChanged { from, to, cause } => self.on_index_changed(from, to, cause),
                Effect::PhaseChanged { from, to } => self.on_phase_changed(from, to),
                Effect::MilestoneFired(milestone) => {
                    info!(
                        milestone = %milestone.id,
                        date = %milestone.date,
                        "milestone reached; pausing"
                    );
                    self.emit(EventKind::PAUSE | EventKind::MILESTONE_PAUSE, |e| {
                        e.milestone = Some(milestone.id.clone())
                    });
                }
                Effect::ScaleModeChanged(mode) => {
                    self.scales.set_mode(mode);
                    debug!(%mode, "scale mode changed");
                    self.emit(EventKind::SCALE_MODE_CHANGED, |e| e.scale_mode = Some(mode));
                }
                Effect::Finished => {
                    info!(index = self.state.current_index, "playback finished");
                    self.emit(EventKind::FINISHED, |_| {});
                }
                Effect::Render => render = true,
            }
        }
        if render {
            self.render_now();
        }
    }

    fn on_index_changed(&mut self, from: usize, to: usize, cause: IndexCause) {
        let kind = match cause {
            IndexCause::Tick => EventKind::TICK,
            IndexCause::Scrub | IndexCause::Restart => EventKind::SCRUB,
        };
        if cause != IndexCause::Tick {
            debug!(from, to, ?cause, "cursor moved");
        }
        self.emit(kind, |_| {});

        let date = self.dataset.samples()[to].date;
        if let Some(transition) = self.narrative.on_index_changed(date) {
            debug!(section = %transition.active, "story section changed");
            if let Some(view) = self.view.as_mut() {
                transition.apply(view.as_mut());
            }
            self.emit(EventKind::SECTION_CHANGED, |e| {
                e.section = Some(SectionMeta {
                    previous: transition.previous.clone(),
                    active: transition.active.clone(),
                })
            });
        }
    }

    fn on_phase_changed(&mut self, from: PlaybackPhase, to: PlaybackPhase) {
        debug!(%from, %to, "playback phase changed");
        let kinds = match (from, to) {
            (PlaybackPhase::PausedForMilestone, PlaybackPhase::Playing) => {
                EventKind::PLAY | EventKind::AUTO_RESUME
            }
            (_, PlaybackPhase::Playing) => EventKind::PLAY,
            (_, PlaybackPhase::Idle) => EventKind::PAUSE,
            // Reported with its milestone by `MilestoneFired`.
            (_, PlaybackPhase::PausedForMilestone) => return,
        };
        self.emit(kinds, |_| {});
    }

    fn emit(&self, kinds: EventKind, fill: impl FnOnce(&mut StoryEvent)) {
        let Some(events) = self.events.as_ref() else {
            return;
        };
        let index = self.state.current_index;
        let date = self.dataset.get(index).map(|s| s.date);
        let mut event = StoryEvent::new(kinds, index, date);
        fill(&mut event);
        events.emit(event);
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load_rows, LoaderColumns, RawRow, RawValue};
    use crate::data::story::StorySection;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dataset(dates: &[NaiveDate]) -> Dataset {
        let rows = dates.iter().map(|date| {
            let mut row = RawRow::new();
            row.insert("date".into(), RawValue::from(date.to_string().as_str()));
            row.insert("close".into(), RawValue::from(500.0));
            row
        });
        load_rows(rows, &LoaderColumns::default(), &[]).unwrap()
    }

    fn story() -> StoryTable {
        StoryTable::new(vec![
            StorySection::new("intro", "Intro", d(2016, 1, 1), false),
            StorySection::new("news", "News", d(2016, 5, 25), true),
        ])
        .unwrap()
    }

    fn playing() -> PlaybackState {
        PlaybackState {
            phase: PlaybackPhase::Playing,
            ..PlaybackState::new(ScaleMode::Logarithmic)
        }
    }

    #[test]
    fn tick_into_milestone_pauses_once() {
        let ds = dataset(&[d(2016, 5, 24), d(2016, 5, 25)]);
        let st = story();
        let tl = Timeline { dataset: &ds, story: &st };

        let t = tick(playing(), &tl);
        assert_eq!(t.state.current_index, 1);
        assert_eq!(t.state.phase, PlaybackPhase::PausedForMilestone);
        assert!(t.has(&Effect::ScheduleResume("news".into())));
        assert!(t.has(&Effect::StopTicker));

        // After resuming and rewinding, the same milestone stays fired.
        let resumed = resume_after_dwell(t.state, &"news".into()).state;
        assert!(resumed.is_playing());
        let rewound = scrub_to(resumed, &tl, 0).state;
        let again = tick(rewound, &tl);
        assert_eq!(again.state.phase, PlaybackPhase::Playing);
    }

    #[test]
    fn scrub_never_fires_milestones() {
        let ds = dataset(&[d(2016, 5, 24), d(2016, 5, 25)]);
        let st = story();
        let tl = Timeline { dataset: &ds, story: &st };
        let t = scrub_to(PlaybackState::new(ScaleMode::Linear), &tl, 1);
        assert_eq!(t.state.current_index, 1);
        assert!(t.state.fired.is_empty());
        assert_eq!(t.state.phase, PlaybackPhase::Idle);
    }

    #[test]
    fn scrub_clamps_out_of_range_targets() {
        let ds = dataset(&[d(2016, 1, 1), d(2016, 1, 2), d(2016, 1, 3)]);
        let st = story();
        let tl = Timeline { dataset: &ds, story: &st };
        assert_eq!(scrub_to(playing(), &tl, 99).state.current_index, 2);
        assert_eq!(scrub_to(playing(), &tl, -5).state.current_index, 0);
        assert_eq!(step(playing(), &tl, -1).state.current_index, 0);
    }

    #[test]
    fn tick_at_last_sample_finishes() {
        let ds = dataset(&[d(2016, 1, 1)]);
        let st = story();
        let tl = Timeline { dataset: &ds, story: &st };
        let t = tick(playing(), &tl);
        assert_eq!(t.state.phase, PlaybackPhase::Idle);
        assert!(t.has(&Effect::Finished));
    }

    #[test]
    fn play_is_noop_while_resume_pending() {
        let ds = dataset(&[d(2016, 5, 24), d(2016, 5, 25)]);
        let st = story();
        let tl = Timeline { dataset: &ds, story: &st };
        let paused = tick(playing(), &tl).state;
        let t = play(paused.clone(), &tl);
        assert!(t.is_noop());
        assert_eq!(t.state, paused);
    }

    #[test]
    fn pause_during_dwell_cancels_resume() {
        let ds = dataset(&[d(2016, 5, 24), d(2016, 5, 25)]);
        let st = story();
        let tl = Timeline { dataset: &ds, story: &st };
        let paused = tick(playing(), &tl).state;
        let t = pause(paused);
        assert!(t.has(&Effect::CancelResume));
        assert_eq!(t.state.phase, PlaybackPhase::Idle);
        // A late resume callback is harmless.
        assert!(resume_after_dwell(t.state, &"news".into()).is_noop());
    }

    #[test]
    fn play_from_end_restarts() {
        let ds = dataset(&[d(2016, 1, 1), d(2016, 1, 2)]);
        let st = story();
        let tl = Timeline { dataset: &ds, story: &st };
        let at_end = scrub_to(PlaybackState::new(ScaleMode::Linear), &tl, 1).state;
        let t = play(at_end, &tl);
        assert_eq!(t.state.current_index, 0);
        assert!(t.state.is_playing());
    }

    #[test]
    fn same_scale_mode_is_noop() {
        let s = PlaybackState::new(ScaleMode::Linear);
        assert!(set_scale_mode(s.clone(), ScaleMode::Linear).is_noop());
        let to_log = set_scale_mode(s, ScaleMode::Logarithmic);
        assert!(to_log.has(&Effect::ScaleModeChanged(ScaleMode::Logarithmic)));
    }
}
