//! Cooperative timer queue for the single-threaded playback loop.
//!
//! The host owns the clock: it passes a monotonic `now` (offset from session
//! start) and drains due timers with [`Scheduler::pop_due`]. Nothing runs on
//! another thread; a timer "fires" only when the host asks.

use std::time::Duration;

/// Handle of a scheduled timer. Ids are never reused, so a handle kept after
/// cancellation can never match a newer timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repeat {
    Once,
    Every(Duration),
}

#[derive(Debug, Clone)]
struct Timer<T> {
    id: TimerId,
    due: Duration,
    repeat: Repeat,
    tag: T,
}

/// A timer that came due.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<T> {
    pub id: TimerId,
    pub due: Duration,
    pub tag: T,
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    timers: Vec<Timer<T>>,
    next_id: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, due: Duration, repeat: Repeat, tag: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer { id, due, repeat, tag });
        id
    }

    /// Fire every `period`, first at `now + period`.
    pub fn schedule_every(&mut self, now: Duration, period: Duration, tag: T) -> TimerId {
        self.push(now + period, Repeat::Every(period), tag)
    }

    /// Fire once at `now + delay`.
    pub fn schedule_once(&mut self, now: Duration, delay: Duration, tag: T) -> TimerId {
        self.push(now + delay, Repeat::Once, tag)
    }

    /// Returns `true` if the timer was still armed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    /// Deadline of an armed timer.
    pub fn due_of(&self, id: TimerId) -> Option<Duration> {
        self.timers.iter().find(|t| t.id == id).map(|t| t.due)
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Earliest pending deadline.
    pub fn next_due(&self) -> Option<Duration> {
        self.timers.iter().map(|t| t.due).min()
    }

    /// Remove and return the earliest timer due at or before `now`.
    ///
    /// Recurring timers keep their cadence: the next deadline is the first
    /// multiple of `period` after the missed one that lies past `now`, so a
    /// late host neither drifts nor gets a burst of catch-up ticks.
    pub fn pop_due(&mut self, now: Duration) -> Option<Fired<T>> {
        let pos = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(i, _)| i)?;
        let timer = &mut self.timers[pos];
        let fired = Fired {
            id: timer.id,
            due: timer.due,
            tag: timer.tag.clone(),
        };
        match timer.repeat {
            Repeat::Every(period) => timer.due = next_boundary(timer.due, period, now),
            Repeat::Once => {
                self.timers.remove(pos);
            }
        }
        Some(fired)
    }
}

/// First `due + k * period` (k >= 1) strictly after `now`.
fn next_boundary(due: Duration, period: Duration, now: Duration) -> Duration {
    let next = due + period;
    if next > now {
        return next;
    }
    if period.is_zero() {
        return now;
    }
    let behind = (now - next).as_nanos() / period.as_nanos();
    let skip = u32::try_from(behind + 1).unwrap_or(u32::MAX);
    next + period * skip
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn once_fires_once() {
        let mut s = Scheduler::new();
        let id = s.schedule_once(ms(0), ms(100), "resume");
        assert!(s.pop_due(ms(99)).is_none());
        let f = s.pop_due(ms(100)).unwrap();
        assert_eq!((f.id, f.tag), (id, "resume"));
        assert!(s.pop_due(ms(1000)).is_none());
        assert!(!s.is_armed(id));
    }

    #[test]
    fn recurring_skips_missed_periods_without_burst() {
        let mut s = Scheduler::new();
        s.schedule_every(ms(0), ms(40), "tick");
        assert!(s.pop_due(ms(500)).is_some());
        assert!(s.pop_due(ms(500)).is_none());
        assert_eq!(s.next_due(), Some(ms(520)));
    }

    #[test]
    fn recurring_keeps_cadence_with_late_polls() {
        let mut s = Scheduler::new();
        s.schedule_every(ms(0), ms(40), "tick");
        let mut fired = 0;
        let mut now = 0;
        while now <= 1008 {
            while s.pop_due(ms(now)).is_some() {
                fired += 1;
            }
            now += 16;
        }
        // Deadlines at 40, 80, .., 1000.
        assert_eq!(fired, 25);
        assert_eq!(s.next_due(), Some(ms(1040)));
    }

    #[test]
    fn on_time_poll_rearms_one_period_later() {
        let mut s = Scheduler::new();
        s.schedule_every(ms(10), ms(40), "tick");
        assert_eq!(s.pop_due(ms(50)).map(|f| f.due), Some(ms(50)));
        assert_eq!(s.next_due(), Some(ms(90)));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut s = Scheduler::new();
        let id = s.schedule_once(ms(0), ms(10), ());
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(s.pop_due(ms(100)).is_none());
    }

    #[test]
    fn earliest_due_first() {
        let mut s = Scheduler::new();
        s.schedule_once(ms(0), ms(50), "late");
        s.schedule_once(ms(0), ms(10), "early");
        assert_eq!(s.pop_due(ms(100)).unwrap().tag, "early");
        assert_eq!(s.pop_due(ms(100)).unwrap().tag, "late");
    }
}
