//! Eased interpolation for cursors, labels and axis ceilings.
//!
//! Times are offsets on the host's monotonic playback clock.

use std::time::Duration;

use crate::data::scale::Ceilings;

/// Cubic ease-out: fast start, gentle settle.
pub fn ease_cubic_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    pub started_at: Duration,
    pub duration: Duration,
}

impl Tween {
    /// A tween that is already at rest on `value`.
    pub fn settled(value: f64) -> Self {
        Self {
            from: value,
            to: value,
            started_at: Duration::ZERO,
            duration: Duration::ZERO,
        }
    }

    pub fn progress(&self, now: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at).as_secs_f64();
        (elapsed / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn value_at(&self, now: Duration) -> f64 {
        let p = self.progress(now);
        if p >= 1.0 {
            return self.to;
        }
        let e = ease_cubic_out(p);
        self.from + (self.to - self.from) * e
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        self.progress(now) >= 1.0
    }

    /// Start a new tween toward `to` from wherever this one currently is.
    pub fn retarget(&mut self, now: Duration, to: f64, duration: Duration) {
        let from = self.value_at(now);
        *self = Self {
            from,
            to,
            started_at: now,
            duration,
        };
    }
}

/// Animated 2-D position of a cursor marker and its label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorTween {
    x: Tween,
    y: Tween,
}

impl CursorTween {
    pub fn at(pos: [f64; 2]) -> Self {
        Self {
            x: Tween::settled(pos[0]),
            y: Tween::settled(pos[1]),
        }
    }

    pub fn retarget(&mut self, now: Duration, to: [f64; 2], duration: Duration) {
        self.x.retarget(now, to[0], duration);
        self.y.retarget(now, to[1], duration);
    }

    pub fn position(&self, now: Duration) -> [f64; 2] {
        [self.x.value_at(now), self.y.value_at(now)]
    }

    pub fn target(&self) -> [f64; 2] {
        [self.x.to, self.y.to]
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        self.x.is_finished(now) && self.y.is_finished(now)
    }
}

/// Animates axis ceilings, but only when the resolved domain actually changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainTransition {
    target: Ceilings,
    x: Tween,
    y: Tween,
}

impl DomainTransition {
    pub fn new(initial: Ceilings) -> Self {
        Self {
            target: initial,
            x: Tween::settled(initial.x_max),
            y: Tween::settled(initial.y_max),
        }
    }

    /// Feed the ceilings resolved for the current frame. Returns `true` when a
    /// new transition was started.
    pub fn update(&mut self, now: Duration, resolved: Ceilings, duration: Duration) -> bool {
        if resolved == self.target {
            return false;
        }
        self.target = resolved;
        self.x.retarget(now, resolved.x_max, duration);
        self.y.retarget(now, resolved.y_max, duration);
        true
    }

    /// Jump straight to `ceilings` (used on discrete scale-mode changes).
    pub fn snap(&mut self, ceilings: Ceilings) {
        *self = Self::new(ceilings);
    }

    pub fn ceilings_at(&self, now: Duration) -> Ceilings {
        Ceilings {
            x_max: self.x.value_at(now),
            y_max: self.y.value_at(now),
        }
    }

    pub fn target(&self) -> Ceilings {
        self.target
    }

    pub fn is_animating(&self, now: Duration) -> bool {
        !(self.x.is_finished(now) && self.y.is_finished(now))
    }
}
